//! C5: realm crawler — the fetch-info/check-lm/fetch-blob state machine
//! per realm, plus bounded-concurrency fan-out across regions (spec.md
//! Section 4.5).

mod fanout;
mod orchestrate;
mod realm;

pub use fanout::fan_out;
pub use orchestrate::{download_realms, DownloadRealmsError, DownloadRealmsReport};
pub use realm::{crawl_realm, CrawlDeps, CrawlOutcome, DownloadResult};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("upstream error: {0}")]
    Upstream(#[from] sotah_upstream::Error),
    #[error("blob store error: {0}")]
    Blobstore(#[from] sotah_blobstore::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
