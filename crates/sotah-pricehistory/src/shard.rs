use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rocksdb::{Options, DB};
use sotah_model::{ItemId, PriceStats, UnixTimestamp};

use crate::Error;

/// Logical bucket name, kept for fidelity to spec.md Section 6's external
/// interface description even though RocksDB's flat keyspace collapses
/// the original embedded KV's per-item bucket into a single column
/// family with a per-item key prefix.
pub const ITEM_PRICES_CF: &str = "item-prices";

/// One embedded-KV file covering a single (region, realm, week-start)
/// bucket.
pub struct Shard {
    pub week_start: UnixTimestamp,
    path: PathBuf,
    db: DB,
}

impl Shard {
    pub fn open(path: impl Into<PathBuf>, week_start: UnixTimestamp) -> Result<Self, Error> {
        let path = path.into();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let db = DB::open_cf(&opts, &path, [ITEM_PRICES_CF])?;
        Ok(Shard { week_start, path, db })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cf(&self) -> &rocksdb::ColumnFamily {
        self.db
            .cf_handle(ITEM_PRICES_CF)
            .expect("item-prices column family must exist")
    }

    fn key(item: ItemId) -> Vec<u8> {
        format!("item-prices/{item}").into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<BTreeMap<UnixTimestamp, PriceStats>, Error> {
        let mut decoder = GzDecoder::new(bytes);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;
        Ok(serde_json::from_slice(&json)?)
    }

    fn encode(map: &BTreeMap<UnixTimestamp, PriceStats>) -> Result<Vec<u8>, Error> {
        let json = serde_json::to_vec(map)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    /// Reads the full timestamp -> PriceStats map for one item, or an
    /// empty map if the item has never been written in this shard.
    pub fn read_item(&self, item: ItemId) -> Result<BTreeMap<UnixTimestamp, PriceStats>, Error> {
        let cf = self.cf();
        match self.db.get_cf(cf, Self::key(item))? {
            Some(bytes) => Self::decode(&bytes),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Merges `t -> stats` into every touched item's map in one batched
    /// transaction; either all items are visible or none are.
    pub fn append(
        &self,
        t: UnixTimestamp,
        stats_by_item: &std::collections::HashMap<ItemId, PriceStats>,
    ) -> Result<(), Error> {
        debug_assert!(
            t >= self.week_start && t < self.week_start + sotah_model::WEEK_SECONDS,
            "timestamp {t} out of range for shard starting {}",
            self.week_start
        );

        let cf = self.cf();
        let mut batch = rocksdb::WriteBatch::default();
        for (&item, stats) in stats_by_item {
            let mut existing = self.read_item(item)?;
            existing.insert(t, *stats);
            batch.put_cf(cf, Self::key(item), Self::encode(&existing)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Returns `(timestamp, stats)` entries for `item` with
    /// `from <= ts <= to`, in ascending timestamp order.
    pub fn query_item(
        &self,
        item: ItemId,
        from: UnixTimestamp,
        to: UnixTimestamp,
    ) -> Result<Vec<(UnixTimestamp, PriceStats)>, Error> {
        Ok(self
            .read_item(item)?
            .into_iter()
            .filter(|(ts, _)| *ts >= from && *ts <= to)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotah_model::week_start;
    use std::collections::HashMap;

    #[test]
    fn append_then_query_returns_exact_stats() {
        let dir = tempfile::tempdir().unwrap();
        let ws = week_start(1_710_604_800);
        let shard = Shard::open(dir.path().join("shard.db"), ws).unwrap();

        let mut stats = HashMap::new();
        stats.insert(
            1,
            PriceStats {
                min_buyout: 20,
                avg_buyout: 20.0,
                volume: 3,
                listing_count: 1,
            },
        );
        shard.append(1_710_604_800, &stats).unwrap();

        let got = shard.query_item(1, 0, 2_000_000_000).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, 1_710_604_800);
        assert_eq!(got[0].1.min_buyout, 20);
    }

    #[test]
    fn keys_decode_within_shard_range() {
        let dir = tempfile::tempdir().unwrap();
        let ws = week_start(1_710_604_800);
        let shard = Shard::open(dir.path().join("shard.db"), ws).unwrap();
        let mut stats = HashMap::new();
        stats.insert(7, PriceStats::default());
        shard.append(ws + 120, &stats).unwrap();

        let map = shard.read_item(7).unwrap();
        for ts in map.keys() {
            assert!(*ts >= ws && *ts < ws + sotah_model::WEEK_SECONDS);
        }
    }
}
