use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sotah_crawler::{download_realms, CrawlDeps};
use sotah_intake::{intake, IntakeDeps, IntakeOutcome};
use sotah_model::{Realm, Region};
use sotah_state::State;
use tracing::{info, warn};

pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64
}

/// Runs one `collectRegions` pass (spec.md Section 4.8): crawls every
/// configured realm, then runs each downloaded snapshot through intake,
/// installing the result into `state`.
pub async fn run_collection_pass(
    state: Arc<State>,
    crawl_deps: Arc<CrawlDeps>,
    intake_deps: Arc<IntakeDeps>,
    region_realms: Arc<Vec<(Region, Vec<Realm>)>>,
    workers: usize,
) {
    let mut last_downloaded = HashMap::new();
    for (region, realms) in region_realms.iter() {
        for realm in realms {
            let dates = state.modification_dates(&region.name, &realm.slug).await;
            last_downloaded.insert((region.name.clone(), realm.slug.clone()), dates.downloaded);
        }
    }

    let report = match download_realms(crawl_deps, &region_realms, last_downloaded, workers).await {
        Ok(report) => report,
        Err(error) => {
            warn!(%error, "collection pass aborted");
            return;
        }
    };

    info!(
        downloaded = report.downloaded.len(),
        already_checked = report.already_checked,
        "collection pass fetched snapshots"
    );

    for result in report.downloaded {
        match intake(&intake_deps, result).await {
            IntakeOutcome::Complete(intake_report) => {
                let now = now_epoch();
                state
                    .replace_mini_auctions(&intake_report.region, &intake_report.slug, intake_report.mini_auctions)
                    .await;
                state
                    .bump_modification_dates(&intake_report.region, &intake_report.slug, |dates| {
                        dates.bump_downloaded(intake_report.last_modified);
                        dates.bump_pricelist_histories(now);
                    })
                    .await;
            }
            IntakeOutcome::PartialFailure { region, slug, error } => {
                warn!(region, slug, error, "intake partial failure, raw blob left for next rebuild pass");
            }
        }
    }
}
