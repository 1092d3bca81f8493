//! Request/reply subjects and topic names (spec.md Section 6).

pub const SUBJECT_STATUS: &str = "status";
pub const SUBJECT_BOOT: &str = "boot";
pub const SUBJECT_ITEMS: &str = "items";
pub const SUBJECT_ITEMS_QUERY: &str = "itemsQuery";
pub const SUBJECT_SESSION_SECRET: &str = "sessionSecret";
pub const SUBJECT_PRICE_LIST_HISTORY: &str = "priceListHistory";
pub const SUBJECT_OWNERS_QUERY_BY_ITEMS: &str = "ownersQueryByItems";
pub const SUBJECT_AUCTIONS: &str = "auctions";
pub const SUBJECT_REALM_MODIFICATION_DATES: &str = "realmModificationDates";
pub const SUBJECT_GENERIC_TEST_ERRORS: &str = "genericTestErrors";

pub const TOPIC_SYNC_ITEMS: &str = "syncItems";
pub const TOPIC_FILTER_IN_ITEMS_TO_SYNC: &str = "filterInItemsToSync";
pub const TOPIC_CLEANUP_EXPIRED_MANIFEST: &str = "cleanupExpiredManifest";
pub const TOPIC_COMPUTE_PRICELIST_HISTORIES: &str = "computePricelistHistories";
pub const TOPIC_RECEIVE_COMPUTED_PRICELIST_HISTORIES: &str = "receiveComputedPricelistHistories";

/// Payload published to the `syncItems` topic: item ids the catalogue
/// has no entry for, or whose `normalized_name`/icon fields are still
/// unpopulated (spec.md Section 4.6 step 3, Section 4.2 `FilterToSync`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SyncItemsJob {
    pub item_ids: Vec<sotah_model::ItemId>,
}

/// Payload for `computePricelistHistories` jobs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ComputePricelistHistoriesJob {
    pub region_name: String,
    pub realm_slug: String,
    pub item_ids: Vec<sotah_model::ItemId>,
}

/// Payload recovered from the consumer side of
/// `receiveComputedPricelistHistories` (Open Question 3): the computed
/// per-item price-history mapping for one realm.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReceiveComputedPricelistHistories {
    pub region_name: String,
    pub realm_slug: String,
    pub item_ids: Vec<sotah_model::ItemId>,
    pub histories: std::collections::HashMap<
        sotah_model::ItemId,
        std::collections::BTreeMap<sotah_model::UnixTimestamp, sotah_model::PriceStats>,
    >,
}
