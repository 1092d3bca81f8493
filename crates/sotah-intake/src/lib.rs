//! C6: intake pipeline — wires the mini-auction codec (C1), price-history
//! shard store (C3), and item catalogue (C2) for one crawler result, and
//! reports the set of new item ids for the catalogue sync worker
//! (spec.md Section 4.6).

use std::sync::Arc;

use sotah_auctions::MiniAuctionBatch;
use sotah_bus::{Bus, SyncItemsJob, TOPIC_SYNC_ITEMS};
use sotah_catalog::ItemCatalogue;
use sotah_crawler::DownloadResult;
use sotah_model::{ItemId, UnixTimestamp};
use sotah_pricehistory::PriceHistoryStore;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("price history store error: {0}")]
    PriceHistory(#[from] sotah_pricehistory::Error),
    #[error("catalogue error: {0}")]
    Catalogue(#[from] sotah_catalog::Error),
}

pub struct IntakeDeps {
    pub catalogue: Arc<ItemCatalogue>,
    pub price_history: Arc<PriceHistoryStore>,
    pub bus: Option<Arc<Bus>>,
}

/// Everything intake produced for a realm that completed every step
/// (spec.md Section 4.6 steps 1-5). The caller (C8 state) installs
/// `mini_auctions` as the realm's table and bumps its
/// `RealmModificationDates`.
#[derive(Debug)]
pub struct IntakeReport {
    pub region: String,
    pub slug: String,
    pub last_modified: UnixTimestamp,
    pub mini_auctions: MiniAuctionBatch,
    pub new_item_ids: Vec<ItemId>,
}

/// Result of running one `DownloadResult` through the pipeline. A
/// `PartialFailure` means step 2 (shard append) failed: steps 4 and 5 are
/// skipped and the raw blob C5 already wrote is left for the next
/// rebuild-manifest pass to pick up (spec.md Section 4.6, "Partial failure").
#[derive(Debug)]
pub enum IntakeOutcome {
    Complete(IntakeReport),
    PartialFailure {
        region: String,
        slug: String,
        error: String,
    },
}

/// Runs one realm's downloaded snapshot through the full intake pipeline.
pub async fn intake(deps: &IntakeDeps, result: DownloadResult) -> IntakeOutcome {
    let mini_auctions = sotah_auctions::from_raw(&result.auctions);

    if let Err(error) = deps.price_history.append(
        &result.region,
        &result.slug,
        result.last_modified,
        &mini_auctions.rows,
    ) {
        warn!(
            region = %result.region,
            slug = %result.slug,
            %error,
            "shard append failed, skipping mini-auction table swap and modification-date bump"
        );
        return IntakeOutcome::PartialFailure {
            region: result.region,
            slug: result.slug,
            error: error.to_string(),
        };
    }

    let touched_ids: Vec<ItemId> = {
        let mut ids: Vec<ItemId> = mini_auctions.rows.iter().map(|row| row.item).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    };

    let new_item_ids = match deps.catalogue.filter_to_sync(&touched_ids) {
        Ok(filter) => filter.ids_to_sync,
        Err(error) => {
            warn!(region = %result.region, slug = %result.slug, %error, "catalogue sync filter failed");
            Vec::new()
        }
    };

    if let (Some(bus), false) = (&deps.bus, new_item_ids.is_empty()) {
        if let Err(error) = publish_sync_items(bus, &new_item_ids).await {
            warn!(region = %result.region, slug = %result.slug, %error, "failed to publish syncItems job");
        }
    }

    info!(
        region = %result.region,
        slug = %result.slug,
        rows = mini_auctions.rows.len(),
        discarded = mini_auctions.discarded,
        new_items = new_item_ids.len(),
        "intake complete"
    );

    IntakeOutcome::Complete(IntakeReport {
        region: result.region,
        slug: result.slug,
        last_modified: result.last_modified,
        mini_auctions,
        new_item_ids,
    })
}

async fn publish_sync_items(bus: &Bus, item_ids: &[ItemId]) -> Result<(), sotah_bus::Error> {
    for chunk in item_ids.chunks(sotah_model::MAX_TOPIC_BATCH) {
        let job = SyncItemsJob {
            item_ids: chunk.to_vec(),
        };
        let body = serde_json::to_vec(&job).map_err(sotah_bus::Error::Decode)?;
        bus.publish(TOPIC_SYNC_ITEMS, body.into()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotah_model::{RawAuction, TimeLeft};

    fn raw(auc: u64, item: u32, owner: &str, buyout: i64) -> RawAuction {
        RawAuction {
            auc,
            item,
            owner: owner.to_string(),
            bid: 0,
            buyout,
            quantity: 1,
            time_left: TimeLeft::Long,
            rand: 0,
            seed: 0,
        }
    }

    fn deps() -> (IntakeDeps, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let catalogue = ItemCatalogue::open(dir.path().join("items.db")).unwrap();
        let price_history = PriceHistoryStore::new(dir.path());
        (
            IntakeDeps {
                catalogue: Arc::new(catalogue),
                price_history: Arc::new(price_history),
                bus: None,
            },
            dir,
        )
    }

    #[tokio::test]
    async fn complete_intake_reports_new_item_ids() {
        let (deps, _dir) = deps();
        let result = DownloadResult {
            region: "us".to_string(),
            slug: "area52".to_string(),
            last_modified: 1_710_604_800,
            auctions: vec![raw(1, 42, "A", 20), raw(2, 42, "A", 20)],
        };

        match intake(&deps, result).await {
            IntakeOutcome::Complete(report) => {
                assert_eq!(report.new_item_ids, vec![42]);
                assert_eq!(report.mini_auctions.rows.len(), 1);
                assert_eq!(report.mini_auctions.rows[0].count, 2);
            }
            IntakeOutcome::PartialFailure { error, .. } => panic!("unexpected failure: {error}"),
        }
    }

    #[tokio::test]
    async fn already_catalogued_items_are_not_reported_for_sync() {
        let (deps, _dir) = deps();
        let mut items = std::collections::HashMap::new();
        items.insert(
            42,
            sotah_model::ItemRecord {
                id: 42,
                name: "Sword".to_string(),
                icon: "inv_sword".to_string(),
                icon_url: "http://x/inv_sword.jpg".to_string(),
                normalized_name: "sword".to_string(),
                icon_object_name: "inv_sword.jpg".to_string(),
                last_modified: 0,
            },
        );
        deps.catalogue.put(&items).unwrap();

        let result = DownloadResult {
            region: "us".to_string(),
            slug: "area52".to_string(),
            last_modified: 1_710_604_800,
            auctions: vec![raw(1, 42, "A", 20)],
        };

        match intake(&deps, result).await {
            IntakeOutcome::Complete(report) => assert!(report.new_item_ids.is_empty()),
            IntakeOutcome::PartialFailure { error, .. } => panic!("unexpected failure: {error}"),
        }
    }
}
