use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use sotah_model::{Realm, Region, UnixTimestamp};
use tracing::info;

use crate::realm::{crawl_realm, CrawlDeps, CrawlOutcome, DownloadResult};

#[derive(Debug, thiserror::Error)]
pub enum DownloadRealmsError {
    #[error("realm {region}/{slug} failed: {error}")]
    RealmFailed {
        region: String,
        slug: String,
        error: String,
    },
}

#[derive(Debug, Default)]
pub struct DownloadRealmsReport {
    pub downloaded: Vec<DownloadResult>,
    pub already_checked: usize,
}

/// `DownloadRealms` (spec.md Section 4.5): interleaves realms
/// round-robin across regions so a slow region does not starve others,
/// fans out over a bounded worker pool, and aborts the whole pass the
/// instant any realm returns a fatal error — matching the original's
/// `Queue.DownloadRealms`, which returns on the first non-nil error from
/// its result channel.
pub async fn download_realms(
    deps: Arc<CrawlDeps>,
    region_realms: &[(Region, Vec<Realm>)],
    last_downloaded: HashMap<(String, String), UnixTimestamp>,
    workers: usize,
) -> Result<DownloadRealmsReport, DownloadRealmsError> {
    let interleaved = interleave(region_realms);
    let total = interleaved.len();
    let last_downloaded = Arc::new(last_downloaded);

    let mut stream = stream::iter(interleaved)
        .map(|(region, realm)| {
            let deps = deps.clone();
            let last_downloaded = last_downloaded.clone();
            async move {
                let since = last_downloaded
                    .get(&(region.name.clone(), realm.slug.clone()))
                    .copied()
                    .unwrap_or(0);
                crawl_realm(&deps, &region, &realm, since).await
            }
        })
        .buffer_unordered(workers.max(1));

    let mut report = DownloadRealmsReport::default();
    let mut seen = 0usize;
    while let Some(outcome) = stream.next().await {
        seen += 1;
        match outcome {
            CrawlOutcome::AlreadyChecked { .. } => report.already_checked += 1,
            CrawlOutcome::Downloaded(result) => report.downloaded.push(result),
            CrawlOutcome::Failed { region, slug, error } => {
                return Err(DownloadRealmsError::RealmFailed { region, slug, error });
            }
        }
    }

    info!(total, seen, downloaded = report.downloaded.len(), "download pass complete");
    Ok(report)
}

/// Round-robins realms by ordinal index within each region, e.g. for
/// regions `[us: [a, b, c], eu: [x, y]]` produces
/// `[us/a, eu/x, us/b, eu/y, us/c]`.
fn interleave(region_realms: &[(Region, Vec<Realm>)]) -> Vec<(Region, Realm)> {
    let max_len = region_realms.iter().map(|(_, r)| r.len()).max().unwrap_or(0);
    let mut out = Vec::new();
    for i in 0..max_len {
        for (region, realms) in region_realms {
            if let Some(realm) = realms.get(i) {
                out.push((region.clone(), realm.clone()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str) -> Region {
        Region {
            name: name.to_string(),
            hostname: format!("{name}.example.com"),
            primary: name == "us",
        }
    }

    fn realm(region_name: &str, slug: &str) -> Realm {
        Realm {
            region_name: region_name.to_string(),
            slug: slug.to_string(),
            name: slug.to_string(),
            timezone: "UTC".to_string(),
            connected_realms: vec![],
        }
    }

    #[test]
    fn interleave_round_robins_across_regions() {
        let us = region("us");
        let eu = region("eu");
        let region_realms = vec![
            (us.clone(), vec![realm("us", "a"), realm("us", "b"), realm("us", "c")]),
            (eu.clone(), vec![realm("eu", "x"), realm("eu", "y")]),
        ];

        let out = interleave(&region_realms);
        let slugs: Vec<&str> = out.iter().map(|(_, r)| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "x", "b", "y", "c"]);
    }
}
