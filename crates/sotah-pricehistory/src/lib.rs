//! C3: price-history shard store. One embedded-KV file per
//! (region, realm, day-start bucket), holding item id -> (timestamp ->
//! PriceStats) (spec.md Section 3, Section 4.3).

mod shard;
mod store;

pub use shard::{Shard, ITEM_PRICES_CF};
pub use store::PriceHistoryStore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("rocksdb error: {0}")]
    Rocks(#[from] rocksdb::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("shard filename cannot be parsed: {0}")]
    MalformedShardName(String),
}
