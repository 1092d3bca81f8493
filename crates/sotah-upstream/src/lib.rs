//! Blizzard API client. Named as a collaborator in spec.md Section 1
//! ("out of scope ... beyond the fields the core consumes"); kept thin
//! and isolated so the crawler only depends on the handful of response
//! shapes §6 documents.

mod client;
mod responses;

pub use client::{QuotaObserver, UpstreamClient};
pub use responses::{AuctionInfoFile, AuctionInfoResponse, AuctionsResponse, UpstreamItem};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),
}
