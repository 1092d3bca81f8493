use serde::{Deserialize, Serialize};
use sotah_model::RawAuction;

/// `{files: [{url, lastModified}]}` (spec.md Section 6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuctionInfoResponse {
    pub files: Vec<AuctionInfoFile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuctionInfoFile {
    pub url: String,
    #[serde(rename = "lastModified")]
    pub last_modified: i64,
}

/// `{realms: [...], auctions: [...]}` (spec.md Section 6). Realm metadata
/// in the auctions payload is not consumed by the core; only the
/// `auctions` array is.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuctionsResponse {
    #[serde(default)]
    pub realms: Vec<serde_json::Value>,
    pub auctions: Vec<RawAuction>,
}

/// Standard game-item JSON, extended in our own catalogue with
/// `icon_url`/`icon_object_name`/`normalized_name` (spec.md Section 6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamItem {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub icon: String,
}
