//! C2: embedded-KV item catalogue, gzip-compressed at rest
//! (spec.md Section 4.2).

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rocksdb::{IteratorMode, Options, DB};
use sotah_model::{ItemId, ItemRecord};
use tracing::warn;

const ITEMS_CF: &str = "items";
const KEY_PREFIX: &str = "item-";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("rocksdb error: {0}")]
    Rocks(#[from] rocksdb::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalogue key: {0}")]
    MalformedKey(String),
}

/// Output of `FilterToSync`: ids with no catalogue entry or an empty
/// `normalized_name`, and icon basenames that need syncing grouped by
/// the item ids that reference them (spec.md Section 4.2, and the
/// original's `itemsMap.getItemIconsMap` icon-basename grouping).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncFilter {
    pub ids_to_sync: Vec<ItemId>,
    pub icons_to_sync: HashMap<String, Vec<ItemId>>,
}

pub struct ItemCatalogue {
    db: DB,
}

impl ItemCatalogue {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let db = DB::open_cf(&opts, path, [ITEMS_CF])?;
        Ok(ItemCatalogue { db })
    }

    fn cf(&self) -> &rocksdb::ColumnFamily {
        self.db.cf_handle(ITEMS_CF).expect("items column family must exist")
    }

    fn key(id: ItemId) -> String {
        format!("{KEY_PREFIX}{id}")
    }

    fn parse_key(key: &[u8]) -> Result<ItemId, Error> {
        let s = std::str::from_utf8(key).map_err(|_| Error::MalformedKey("non-utf8".into()))?;
        let digits = s
            .strip_prefix(KEY_PREFIX)
            .ok_or_else(|| Error::MalformedKey(s.to_string()))?;
        digits
            .parse::<ItemId>()
            .map_err(|_| Error::MalformedKey(s.to_string()))
    }

    fn encode(item: &ItemRecord) -> Result<Vec<u8>, Error> {
        let json = serde_json::to_vec(item)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    fn decode(bytes: &[u8]) -> Result<ItemRecord, Error> {
        let mut decoder = GzDecoder::new(bytes);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Returns only the ids that were found; missing ids are absent from
    /// the result rather than erroring.
    pub fn get(&self, ids: &[ItemId]) -> Result<HashMap<ItemId, ItemRecord>, Error> {
        let cf = self.cf();
        let mut out = HashMap::with_capacity(ids.len());
        for &id in ids {
            if let Some(bytes) = self.db.get_cf(cf, Self::key(id))? {
                out.insert(id, Self::decode(&bytes)?);
            }
        }
        Ok(out)
    }

    pub fn get_all(&self) -> Result<HashMap<ItemId, ItemRecord>, Error> {
        let cf = self.cf();
        let mut out = HashMap::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = entry?;
            match Self::parse_key(&key) {
                Ok(id) => {
                    out.insert(id, Self::decode(&value)?);
                }
                Err(err) => warn!(?err, "skipping malformed catalogue key"),
            }
        }
        Ok(out)
    }

    /// Writes all items in one batched transaction; prior values for the
    /// same id are overwritten.
    pub fn put(&self, items: &HashMap<ItemId, ItemRecord>) -> Result<(), Error> {
        let cf = self.cf();
        let mut batch = rocksdb::WriteBatch::default();
        for (id, item) in items {
            batch.put_cf(cf, Self::key(*id), Self::encode(item)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Streamed batched write of pre-gzip-encoded item bytes, terminating
    /// when the iterator is exhausted (spec.md Section 4.2, `PutEncoded`).
    pub fn put_encoded<I>(&self, stream: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (ItemId, Vec<u8>)>,
    {
        let cf = self.cf();
        let mut batch = rocksdb::WriteBatch::default();
        for (id, gz_bytes) in stream {
            batch.put_cf(cf, Self::key(id), gz_bytes);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// An id needs sync if it is absent from the catalogue or has an
    /// empty `normalized_name`. An icon needs sync if any holder of a
    /// non-empty `icon` has an empty `icon_url` or `icon_object_name`.
    pub fn filter_to_sync(&self, ids: &[ItemId]) -> Result<SyncFilter, Error> {
        let found = self.get(ids)?;
        let mut ids_to_sync = Vec::new();
        let mut icons_to_sync: HashMap<String, Vec<ItemId>> = HashMap::new();

        let wanted: HashSet<ItemId> = ids.iter().copied().collect();
        for &id in &wanted {
            match found.get(&id) {
                None => ids_to_sync.push(id),
                Some(item) => {
                    if item.needs_name_sync() {
                        ids_to_sync.push(id);
                    }
                    if item.needs_icon_sync() {
                        icons_to_sync.entry(item.icon.clone()).or_default().push(id);
                    }
                }
            }
        }
        ids_to_sync.sort_unstable();
        for holders in icons_to_sync.values_mut() {
            holders.sort_unstable();
        }

        Ok(SyncFilter {
            ids_to_sync,
            icons_to_sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: ItemId, name: &str, normalized: &str, icon: &str, icon_url: &str) -> ItemRecord {
        ItemRecord {
            id,
            name: name.to_string(),
            icon: icon.to_string(),
            icon_url: icon_url.to_string(),
            normalized_name: normalized.to_string(),
            icon_object_name: String::new(),
            last_modified: 0,
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cat = ItemCatalogue::open(dir.path().join("items.db")).unwrap();
        let mut items = HashMap::new();
        items.insert(1, item(1, "Sword", "sword", "inv_sword", "http://x/inv_sword.jpg"));
        cat.put(&items).unwrap();

        let got = cat.get(&[1, 2]).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[&1].name, "Sword");
    }

    #[test]
    fn filter_to_sync_groups_icons_by_basename() {
        let dir = tempfile::tempdir().unwrap();
        let cat = ItemCatalogue::open(dir.path().join("items.db")).unwrap();
        let mut items = HashMap::new();
        items.insert(5, item(5, "Sword", "sword", "inv_sword", ""));
        cat.put(&items).unwrap();

        let filter = cat.filter_to_sync(&[5, 6]).unwrap();
        assert_eq!(filter.ids_to_sync, vec![6]);
        assert_eq!(filter.icons_to_sync.get("inv_sword"), Some(&vec![5]));
    }

    #[test]
    fn get_all_on_empty_store_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let cat = ItemCatalogue::open(dir.path().join("items.db")).unwrap();
        assert!(cat.get_all().unwrap().is_empty());
    }
}
