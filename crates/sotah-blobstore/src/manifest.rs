use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sotah_model::{week_start, UnixTimestamp, DAY_SECONDS, RETENTION_DAYS};
use tracing::info;

use crate::capability::{ObjectMeta, ObjectStore};
use crate::names::{manifest_object_name, raw_auctions_object_name};
use crate::Error;

/// Per (region, realm, week-start): the ordered list of snapshot
/// timestamps whose raw blobs exist (spec.md Section 3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionManifest {
    pub timestamps: Vec<UnixTimestamp>,
}

/// A cleanup job enqueued by `check_expired`; deletion of an already-
/// absent object is a no-op, so re-enqueuing after a partial failure is
/// always safe (spec.md Section 4.4, "Expiry invariant").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupExpiredManifestJob {
    pub region: String,
    pub slug: String,
    pub target_timestamp: UnixTimestamp,
}

pub struct ManifestStore {
    store: Arc<dyn ObjectStore>,
}

impl ManifestStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        ManifestStore { store }
    }

    /// Idempotent write of a raw gzip-encoded auction snapshot.
    pub async fn write_raw_auctions(
        &self,
        region: &str,
        slug: &str,
        t: UnixTimestamp,
        gzip_body: Bytes,
    ) -> Result<(), Error> {
        self.store
            .write_object(
                ObjectMeta {
                    name: raw_auctions_object_name(region, slug, t),
                    content_type: "application/json",
                    content_encoding: Some("gzip"),
                },
                gzip_body,
            )
            .await
    }

    /// Enumerates raw-auction objects under the realm prefix, buckets
    /// them by week-start, and writes a manifest for every bucket whose
    /// start is not in the future (spec.md Section 4.4, `RebuildManifest`).
    pub async fn rebuild_manifest(
        &self,
        region: &str,
        slug: &str,
        now: UnixTimestamp,
    ) -> Result<Vec<UnixTimestamp>, Error> {
        let prefix = format!("{region}/{slug}/");
        let names = self.store.list(&prefix).await?;

        let mut buckets: BTreeMap<UnixTimestamp, Vec<UnixTimestamp>> = BTreeMap::new();
        for name in names {
            let Some(epoch) = parse_raw_auction_epoch(&prefix, &name) else {
                continue;
            };
            buckets.entry(week_start(epoch)).or_default().push(epoch);
        }

        let now_bucket = week_start(now);
        let mut written = Vec::new();
        for (week_start, mut timestamps) in buckets {
            if week_start > now_bucket {
                continue;
            }
            timestamps.sort_unstable();
            let manifest = AuctionManifest { timestamps };
            let body = serde_json::to_vec(&manifest)?;
            self.store
                .write_object(
                    ObjectMeta {
                        name: manifest_object_name(region, slug, week_start),
                        content_type: "application/json",
                        content_encoding: None,
                    },
                    Bytes::from(body),
                )
                .await?;
            written.push(week_start);
        }

        info!(region, slug, buckets = written.len(), "rebuilt manifests");
        Ok(written)
    }

    pub async fn read_manifest(
        &self,
        region: &str,
        slug: &str,
        week_start: UnixTimestamp,
    ) -> Result<Option<AuctionManifest>, Error> {
        match self
            .store
            .read_object(&manifest_object_name(region, slug, week_start))
            .await?
        {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// For every manifest older than the 14-day retention window,
    /// returns a cleanup job; the caller is responsible for publishing
    /// it to the `cleanupExpiredManifest` bus topic (spec.md Section 4.4,
    /// `CheckExpired`).
    pub async fn check_expired(
        &self,
        region: &str,
        slug: &str,
        now: UnixTimestamp,
    ) -> Result<Vec<CleanupExpiredManifestJob>, Error> {
        let limit = week_start(now) - RETENTION_DAYS * DAY_SECONDS;
        let prefix = format!("{region}/{slug}/");
        let names = self.store.list(&prefix).await?;

        let mut jobs = Vec::new();
        for name in names {
            let Some(ts) = parse_manifest_epoch(&prefix, &name) else {
                continue;
            };
            if ts <= limit {
                jobs.push(CleanupExpiredManifestJob {
                    region: region.to_string(),
                    slug: slug.to_string(),
                    target_timestamp: ts,
                });
            }
        }
        Ok(jobs)
    }

    /// Deletes a manifest and every raw object it lists; missing objects
    /// are treated as already-deleted (spec.md Section 4.4).
    pub async fn cleanup_expired(&self, job: &CleanupExpiredManifestJob) -> Result<(), Error> {
        if let Some(manifest) = self.read_manifest(&job.region, &job.slug, job.target_timestamp).await? {
            for ts in manifest.timestamps {
                self.store
                    .delete_object(&raw_auctions_object_name(&job.region, &job.slug, ts))
                    .await?;
            }
        }
        self.store
            .delete_object(&manifest_object_name(&job.region, &job.slug, job.target_timestamp))
            .await?;
        Ok(())
    }
}

fn parse_raw_auction_epoch(prefix: &str, name: &str) -> Option<UnixTimestamp> {
    name.strip_prefix(prefix)?
        .strip_suffix(".json.gz")?
        .parse()
        .ok()
}

fn parse_manifest_epoch(prefix: &str, name: &str) -> Option<UnixTimestamp> {
    name.strip_prefix(prefix)?.strip_suffix(".json")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalObjectStore;

    #[tokio::test]
    async fn rebuild_manifest_buckets_by_week_and_skips_future() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(dir.path()));
        let manifests = ManifestStore::new(store.clone());

        manifests
            .write_raw_auctions("us", "area52", 1_710_604_800, Bytes::from_static(b"x"))
            .await
            .unwrap();
        manifests
            .write_raw_auctions("us", "area52", 1_710_608_400, Bytes::from_static(b"x"))
            .await
            .unwrap();

        let written = manifests.rebuild_manifest("us", "area52", 2_000_000_000).await.unwrap();
        assert_eq!(written.len(), 1);

        let manifest = manifests
            .read_manifest("us", "area52", written[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(manifest.timestamps, vec![1_710_604_800, 1_710_608_400]);
    }

    #[tokio::test]
    async fn check_expired_and_cleanup_is_reentrant() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(dir.path()));
        let manifests = ManifestStore::new(store.clone());

        let now = 2_000_000_000i64;
        let old_ts = week_start(now) - (RETENTION_DAYS + 1) * DAY_SECONDS;
        manifests
            .write_raw_auctions("us", "area52", old_ts, Bytes::from_static(b"x"))
            .await
            .unwrap();
        manifests.rebuild_manifest("us", "area52", now).await.unwrap();

        let jobs = manifests.check_expired("us", "area52", now).await.unwrap();
        assert_eq!(jobs.len(), 1);

        manifests.cleanup_expired(&jobs[0]).await.unwrap();
        // re-running cleanup on the same (now-deleted) job must not error.
        manifests.cleanup_expired(&jobs[0]).await.unwrap();

        assert!(manifests
            .read_manifest("us", "area52", jobs[0].target_timestamp)
            .await
            .unwrap()
            .is_none());
    }
}
