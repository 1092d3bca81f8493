use std::io::Write;
use std::sync::Arc;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use sotah_blobstore::ManifestStore;
use sotah_model::{RawAuction, Realm, Region, UnixTimestamp};
use sotah_upstream::UpstreamClient;
use tracing::{info, warn};

use crate::Error;

/// Result of a successful `BLOB_OK` transition: a decoded snapshot ready
/// for the intake pipeline (spec.md Section 4.5, Section 4.6).
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub region: String,
    pub slug: String,
    pub last_modified: UnixTimestamp,
    pub auctions: Vec<RawAuction>,
}

/// Every terminal state the crawler's per-realm state machine can reach
/// (spec.md Section 4.5 diagram).
#[derive(Debug, Clone)]
pub enum CrawlOutcome {
    AlreadyChecked { region: String, slug: String },
    Downloaded(DownloadResult),
    Failed { region: String, slug: String, error: String },
}

pub struct CrawlDeps {
    pub upstream: Arc<UpstreamClient>,
    pub blobs: Arc<ManifestStore>,
}

/// Runs one realm through `IDLE -> fetch-info -> {UNCHANGED | BLOB_OK |
/// FAILED} -> IDLE` (spec.md Section 4.5). `last_downloaded` is the
/// realm's stored `LastDownloaded` epoch.
pub async fn crawl_realm(
    deps: &CrawlDeps,
    region: &Region,
    realm: &Realm,
    last_downloaded: UnixTimestamp,
) -> CrawlOutcome {
    match crawl_realm_inner(deps, region, realm, last_downloaded).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(region = %region.name, slug = %realm.slug, error = %err, "realm crawl failed");
            CrawlOutcome::Failed {
                region: region.name.clone(),
                slug: realm.slug.clone(),
                error: err.to_string(),
            }
        }
    }
}

async fn crawl_realm_inner(
    deps: &CrawlDeps,
    region: &Region,
    realm: &Realm,
    last_downloaded: UnixTimestamp,
) -> Result<CrawlOutcome, Error> {
    let info_resp = deps.upstream.fetch_auction_info(&region.hostname, &realm.slug).await?;

    let Some(file) = info_resp.files.first() else {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "auction-info returned no files",
        )));
    };

    let last_modified = file.last_modified / 1000;

    if last_downloaded >= last_modified {
        return Ok(CrawlOutcome::AlreadyChecked {
            region: region.name.clone(),
            slug: realm.slug.clone(),
        });
    }

    let auctions_resp = deps.upstream.fetch_auctions(&file.url).await?;

    let raw_json = serde_json::to_vec(&auctions_resp)?;
    let gzip_body = gzip_encode(&raw_json)?;
    deps.blobs
        .write_raw_auctions(&region.name, &realm.slug, last_modified, Bytes::from(gzip_body))
        .await?;

    info!(
        region = %region.name,
        slug = %realm.slug,
        last_modified,
        auctions = auctions_resp.auctions.len(),
        "downloaded realm snapshot"
    );

    Ok(CrawlOutcome::Downloaded(DownloadResult {
        region: region.name.clone(),
        slug: realm.slug.clone(),
        last_modified,
        auctions: auctions_resp.auctions,
    }))
}

fn gzip_encode(bytes: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}
