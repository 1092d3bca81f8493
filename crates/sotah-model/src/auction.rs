use serde::{Deserialize, Serialize};

pub type ItemId = u32;
pub type AuctionId = u64;

/// Upstream time-left bucket, as reported by the auction API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeLeft {
    Short,
    Medium,
    Long,
    VeryLong,
}

/// One upstream auction record. Not persisted verbatim; grouped into
/// `MiniAuction` rows before anything touches disk (spec.md Section 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAuction {
    pub auc: AuctionId,
    pub item: ItemId,
    pub owner: String,
    pub bid: i64,
    pub buyout: i64,
    pub quantity: u32,
    pub time_left: TimeLeft,
    pub rand: i64,
    pub seed: i64,
}

/// Deduplicated row derived from one or more `RawAuction`s sharing every
/// price/item/ownership attribute. Invariant: the multiset-sum of
/// `count` across rows from one `FromRaw` call equals the raw auction
/// count (spec.md Section 4.1, Section 8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniAuction {
    pub item: ItemId,
    pub owner: String,
    pub bid: u64,
    pub buyout: u64,
    pub quantity: u32,
    pub time_left: TimeLeft,
    pub rand: i64,
    pub seed: i64,
    pub count: u64,
    pub auc_list: Vec<AuctionId>,
}

/// Per (realm, item, snapshot-time) summary (spec.md Section 3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub min_buyout: u64,
    pub avg_buyout: f64,
    pub volume: u64,
    pub listing_count: u64,
}

impl Default for PriceStats {
    fn default() -> Self {
        PriceStats {
            min_buyout: 0,
            avg_buyout: 0.0,
            volume: 0,
            listing_count: 0,
        }
    }
}
