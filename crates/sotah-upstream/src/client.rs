use std::sync::Arc;

use reqwest::Response;
use tracing::debug;

use crate::responses::{AuctionInfoResponse, AuctionsResponse, UpstreamItem};
use crate::Error;

/// Invoked after every upstream HTTP response so a caller can observe
/// rate-limit headers without the client itself depending on a metrics
/// backend (spec.md Section 4.5/Section 9 "plan-meta" supplement, see
/// SPEC_FULL.md).
pub trait QuotaObserver: Send + Sync {
    fn observe(&self, response: &Response);
}

pub struct NoopQuotaObserver;
impl QuotaObserver for NoopQuotaObserver {
    fn observe(&self, _response: &Response) {}
}

pub struct UpstreamClient {
    http: reqwest::Client,
    observer: Arc<dyn QuotaObserver>,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client) -> Self {
        UpstreamClient {
            http,
            observer: Arc::new(NoopQuotaObserver),
        }
    }

    pub fn with_observer(http: reqwest::Client, observer: Arc<dyn QuotaObserver>) -> Self {
        UpstreamClient { http, observer }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let resp = self.http.get(url).send().await?;
        self.observer.observe(&resp);
        if !resp.status().is_success() {
            return Err(Error::Status(resp.status()));
        }
        Ok(resp.json::<T>().await?)
    }

    /// `fetch-info` of the crawler state machine (spec.md Section 4.5).
    pub async fn fetch_auction_info(&self, hostname: &str, slug: &str) -> Result<AuctionInfoResponse, Error> {
        let url = format!("https://{hostname}/auction-data/{slug}/auctions.json");
        debug!(url, "fetching auction info");
        self.get(&url).await
    }

    pub async fn fetch_auctions(&self, file_url: &str) -> Result<AuctionsResponse, Error> {
        debug!(url = file_url, "fetching auctions blob");
        self.get(file_url).await
    }

    pub async fn fetch_item(&self, hostname: &str, item_id: u32) -> Result<UpstreamItem, Error> {
        let url = format!("https://{hostname}/wow/item/{item_id}");
        self.get(&url).await
    }
}
