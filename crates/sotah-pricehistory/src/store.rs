use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sotah_model::{week_start, ItemId, MiniAuction, PriceStats, UnixTimestamp, DAY_SECONDS, RETENTION_DAYS, WEEK_SECONDS};
use tracing::{info, warn};

use crate::shard::Shard;
use crate::Error;

/// Directory-level façade over per-(region, realm, week-start) shard
/// files, rooted at `<dir>/pricelist-histories/<region>/<slug>/`.
pub struct PriceHistoryStore {
    root: PathBuf,
}

impl PriceHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PriceHistoryStore { root: root.into() }
    }

    fn realm_dir(&self, region: &str, slug: &str) -> PathBuf {
        self.root.join("pricelist-histories").join(region).join(slug)
    }

    fn shard_path(&self, region: &str, slug: &str, ws: UnixTimestamp) -> PathBuf {
        self.realm_dir(region, slug).join(format!("{ws}.db"))
    }

    fn open_shard(&self, region: &str, slug: &str, ws: UnixTimestamp) -> Result<Shard, Error> {
        let dir = self.realm_dir(region, slug);
        std::fs::create_dir_all(&dir)?;
        let path = self.shard_path(region, slug, ws);
        let filename = path.file_name().and_then(|f| f.to_str()).unwrap_or("");
        match parse_shard_filename(filename) {
            Some(parsed) if parsed == ws => {}
            _ => panic!(
                "{}",
                Error::MalformedShardName(format!("shard filename {filename} does not round-trip to {ws}"))
            ),
        }
        Shard::open(path, ws)
    }

    /// Derives per-item price stats from `rows` and appends them to the
    /// shard for `week_start(t)` (spec.md Section 4.3, `Append`).
    pub fn append(
        &self,
        region: &str,
        slug: &str,
        t: UnixTimestamp,
        rows: &[MiniAuction],
    ) -> Result<(), Error> {
        let stats = sotah_auctions::item_prices(rows);
        let ws = week_start(t);
        let shard = self.open_shard(region, slug, ws)?;
        shard.append(t, &stats)?;
        info!(region, slug, ws, items = stats.len(), "appended price-history snapshot");
        Ok(())
    }

    /// Opens every shard whose bucket falls in `[week_start(from),
    /// week_start(to)]` and merges matching entries in ascending
    /// timestamp order (spec.md Section 4.3, `Query`).
    pub fn query(
        &self,
        region: &str,
        slug: &str,
        item_ids: &[ItemId],
        from: UnixTimestamp,
        to: UnixTimestamp,
    ) -> Result<HashMap<ItemId, Vec<(UnixTimestamp, PriceStats)>>, Error> {
        let mut out: HashMap<ItemId, Vec<(UnixTimestamp, PriceStats)>> =
            item_ids.iter().map(|&id| (id, Vec::new())).collect();

        let start = week_start(from);
        let end = week_start(to);
        let mut ws = start;
        while ws <= end {
            let path = self.shard_path(region, slug, ws);
            if path.exists() {
                let shard = Shard::open(&path, ws)?;
                for &item in item_ids {
                    let mut entries = shard.query_item(item, from, to)?;
                    out.get_mut(&item).unwrap().append(&mut entries);
                }
            }
            ws += WEEK_SECONDS;
        }

        for entries in out.values_mut() {
            entries.sort_by_key(|(ts, _)| *ts);
        }
        Ok(out)
    }

    /// Scans the realm's directory for shard files, recognising both the
    /// legacy `next-<epoch>.db` naming and the current `<epoch>.db`
    /// naming. Files with any other name are ignored, not fatal
    /// (spec.md Section 4.3, `ListShards`).
    pub fn list_shards(&self, region: &str, slug: &str) -> Result<Vec<UnixTimestamp>, Error> {
        let dir = self.realm_dir(region, slug);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let filename = entry.file_name();
            let filename = filename.to_string_lossy();

            match parse_shard_filename(&filename) {
                Some(ts) => out.push(ts),
                None => warn!(filename = %filename, "ignoring unparseable shard filename"),
            }
        }
        out.sort_unstable();
        Ok(out)
    }

    /// Deletes shards whose bucket start is older than the 14-day
    /// retention window, inclusive of the boundary (spec.md Section 4.3
    /// `Expire`, Section 8 boundary behaviour).
    pub fn expire(&self, region: &str, slug: &str, now: UnixTimestamp) -> Result<Vec<UnixTimestamp>, Error> {
        let limit = week_start(now) - RETENTION_DAYS * DAY_SECONDS;
        let mut removed = Vec::new();
        for ws in self.list_shards(region, slug)? {
            if ws <= limit {
                let path = self.shard_path(region, slug, ws);
                if path.exists() {
                    std::fs::remove_dir_all(&path).or_else(|_| std::fs::remove_file(&path))?;
                }
                removed.push(ws);
            }
        }
        Ok(removed)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Recognises both the legacy `next-<epoch>.db` naming and the current
/// `<epoch>.db` naming, returning `None` for anything else.
fn parse_shard_filename(filename: &str) -> Option<UnixTimestamp> {
    let stem = filename
        .strip_suffix(".db")
        .and_then(|s| s.strip_prefix("next-").or(Some(s)))?;
    stem.parse::<UnixTimestamp>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotah_model::TimeLeft;

    fn mini(item: ItemId, owner: &str, buyout: u64, quantity: u32) -> MiniAuction {
        MiniAuction {
            item,
            owner: owner.to_string(),
            bid: 0,
            buyout,
            quantity,
            time_left: TimeLeft::Long,
            rand: 0,
            seed: 0,
            count: 1,
            auc_list: vec![1],
        }
    }

    #[test]
    fn first_intake_creates_shard_and_answers_query() {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceHistoryStore::new(dir.path());
        let rows = vec![mini(1, "A", 20, 1), mini(1, "A", 20, 1), mini(1, "A", 20, 1)];
        store.append("us", "area52", 1_710_604_800, &rows).unwrap();

        let shard_path = store.shard_path("us", "area52", week_start(1_710_604_800));
        assert!(shard_path.exists());
        assert_eq!(week_start(1_710_604_800), 1_710_374_400);

        let result = store.query("us", "area52", &[1], 0, 2_000_000_000).unwrap();
        let entries = &result[&1];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, 1_710_604_800);
    }

    #[test]
    fn cross_shard_query_merges_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceHistoryStore::new(dir.path());
        let rows = vec![mini(1, "A", 20, 1)];
        store.append("us", "area52", 1_710_604_800, &rows).unwrap();
        store.append("us", "area52", 1_711_209_600, &rows).unwrap();

        let result = store
            .query("us", "area52", &[1], 1_710_000_000, 1_712_000_000)
            .unwrap();
        let entries = &result[&1];
        assert_eq!(entries.len(), 2);
        assert!(entries[0].0 < entries[1].0);
    }

    #[test]
    fn expire_is_inclusive_at_exact_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceHistoryStore::new(dir.path());
        let now = 2_000_000_000i64;
        let old_ws = week_start(now) - RETENTION_DAYS * DAY_SECONDS;
        let kept_ws = week_start(now) - (RETENTION_DAYS - 1) * DAY_SECONDS;

        store.open_shard("us", "area52", old_ws).unwrap();
        store.open_shard("us", "area52", kept_ws).unwrap();

        let removed = store.expire("us", "area52", now).unwrap();
        assert_eq!(removed, vec![old_ws]);

        let remaining = store.list_shards("us", "area52").unwrap();
        assert_eq!(remaining, vec![kept_ws]);
    }

    #[test]
    fn list_shards_recognises_legacy_and_current_names() {
        let dir = tempfile::tempdir().unwrap();
        let realm_dir = dir.path().join("pricelist-histories").join("us").join("area52");
        std::fs::create_dir_all(&realm_dir).unwrap();
        std::fs::write(realm_dir.join("next-100.db"), b"").unwrap();
        std::fs::write(realm_dir.join("200.db"), b"").unwrap();
        std::fs::write(realm_dir.join("ignored.txt"), b"").unwrap();

        let store = PriceHistoryStore::new(dir.path());
        let shards = store.list_shards("us", "area52").unwrap();
        assert_eq!(shards, vec![100, 200]);
    }
}
