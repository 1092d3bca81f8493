use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use sotah_bus::Bus;
use sotah_catalog::ItemCatalogue;
use sotah_model::{ItemId, RealmModificationDates, RealmSlug, Region, RegionName, Status};
use sotah_pricehistory::PriceHistoryStore;
use sotah_auctions::MiniAuctionBatch;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::listeners::Listeners;

type RealmKey = (RegionName, RealmSlug);

/// Long-lived process state: region list, per-region statuses, item-class
/// taxonomy, blacklist, session secret, the transports, and the
/// per-realm mini-auction tables (spec.md Section 4.8).
pub struct State {
    pub run_id: Uuid,
    pub session_secret: Uuid,
    pub regions: Vec<Region>,
    pub catalogue: Arc<ItemCatalogue>,
    pub price_history: Arc<PriceHistoryStore>,
    pub bus: Arc<Bus>,
    pub listeners: Listeners,

    statuses: RwLock<HashMap<RegionName, Status>>,
    item_classes: RwLock<Value>,
    expansions: RwLock<Value>,
    professions: RwLock<Value>,
    item_blacklist: RwLock<HashSet<ItemId>>,
    mini_auctions: RwLock<HashMap<RealmKey, MiniAuctionBatch>>,
    modification_dates: RwLock<HashMap<RealmKey, RealmModificationDates>>,
}

impl State {
    pub fn new(
        regions: Vec<Region>,
        catalogue: Arc<ItemCatalogue>,
        price_history: Arc<PriceHistoryStore>,
        bus: Arc<Bus>,
    ) -> Self {
        State {
            run_id: Uuid::new_v4(),
            session_secret: Uuid::new_v4(),
            regions,
            catalogue,
            price_history,
            bus,
            listeners: Listeners::new(),
            statuses: RwLock::new(HashMap::new()),
            item_classes: RwLock::new(Value::Null),
            expansions: RwLock::new(Value::Null),
            professions: RwLock::new(Value::Null),
            item_blacklist: RwLock::new(HashSet::new()),
            mini_auctions: RwLock::new(HashMap::new()),
            modification_dates: RwLock::new(HashMap::new()),
        }
    }

    /// Installs region-agnostic taxonomy data fetched once from the
    /// primary region at boot (spec.md Section 4.8, the original's
    /// region-primary-only item-class fetch).
    pub async fn set_item_taxonomy(&self, item_classes: Value, expansions: Value, professions: Value) {
        *self.item_classes.write().await = item_classes;
        *self.expansions.write().await = expansions;
        *self.professions.write().await = professions;
    }

    pub async fn item_taxonomy(&self) -> (Value, Value, Value) {
        (
            self.item_classes.read().await.clone(),
            self.expansions.read().await.clone(),
            self.professions.read().await.clone(),
        )
    }

    pub async fn set_status(&self, region_name: impl Into<RegionName>, status: Status) {
        self.statuses.write().await.insert(region_name.into(), status);
    }

    pub async fn status(&self, region_name: &str) -> Option<Status> {
        self.statuses.read().await.get(region_name).cloned()
    }

    pub async fn set_item_blacklist(&self, ids: HashSet<ItemId>) {
        *self.item_blacklist.write().await = ids;
    }

    pub async fn is_blacklisted(&self, id: ItemId) -> bool {
        self.item_blacklist.read().await.contains(&id)
    }

    /// Atomically replaces the mini-auction table for (region, slug)
    /// (spec.md Section 4.6 step 4, Section 3 ownership notes).
    pub async fn replace_mini_auctions(&self, region: &str, slug: &str, batch: MiniAuctionBatch) {
        self.mini_auctions
            .write()
            .await
            .insert((region.to_string(), slug.to_string()), batch);
    }

    pub async fn mini_auctions(&self, region: &str, slug: &str) -> Option<Arc<MiniAuctionBatch>> {
        self.mini_auctions
            .read()
            .await
            .get(&(region.to_string(), slug.to_string()))
            .cloned()
            .map(Arc::new)
    }

    pub async fn bump_modification_dates(&self, region: &str, slug: &str, f: impl FnOnce(&mut RealmModificationDates)) {
        let mut dates = self.modification_dates.write().await;
        let entry = dates.entry((region.to_string(), slug.to_string())).or_default();
        f(entry);
    }

    pub async fn modification_dates(&self, region: &str, slug: &str) -> RealmModificationDates {
        self.modification_dates
            .read()
            .await
            .get(&(region.to_string(), slug.to_string()))
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn modification_dates_are_monotonic_and_per_realm() {
        let dates_map: RwLock<HashMap<RealmKey, RealmModificationDates>> = RwLock::new(HashMap::new());
        {
            let mut dates = dates_map.write().await;
            let entry = dates.entry(("us".to_string(), "area52".to_string())).or_default();
            entry.bump_downloaded(100);
            entry.bump_downloaded(50);
        }
        let dates = dates_map.read().await;
        assert_eq!(dates[&("us".to_string(), "area52".to_string())].downloaded, 100);
    }
}
