use serde::{Deserialize, Serialize};

use crate::time::UnixTimestamp;

pub type RegionName = String;
pub type RealmSlug = String;

/// Immutable configuration for one upstream region. The region list is
/// ordered and exactly one entry has `primary = true`; the primary region
/// is used to fetch item-class taxonomy and other region-agnostic
/// reference data (spec.md Section 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: RegionName,
    pub hostname: String,
    pub primary: bool,
}

impl Region {
    pub fn primary(regions: &[Region]) -> Option<&Region> {
        regions.iter().find(|r| r.primary)
    }
}

/// Immutable per-(region, slug) realm record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    pub region_name: RegionName,
    pub slug: RealmSlug,
    pub name: String,
    pub timezone: String,
    /// Slugs of connected-realm siblings, excluding this realm.
    pub connected_realms: Vec<RealmSlug>,
}

impl Realm {
    pub fn key(&self) -> (RegionName, RealmSlug) {
        (self.region_name.clone(), self.slug.clone())
    }
}

/// Per-region: realms as last reported by upstream, refreshed on boot and
/// on demand (spec.md Section 3, `Status`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    pub region_name: RegionName,
    pub realms: Vec<Realm>,
}

/// Three monotonically non-decreasing epochs tracked per (region, slug).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmModificationDates {
    pub downloaded: UnixTimestamp,
    pub live_auctions_received: UnixTimestamp,
    pub pricelist_histories_received: UnixTimestamp,
}

impl RealmModificationDates {
    pub fn bump_downloaded(&mut self, at: UnixTimestamp) {
        self.downloaded = self.downloaded.max(at);
    }

    pub fn bump_live_auctions(&mut self, at: UnixTimestamp) {
        self.live_auctions_received = self.live_auctions_received.max(at);
    }

    pub fn bump_pricelist_histories(&mut self, at: UnixTimestamp) {
        self.pricelist_histories_received = self.pricelist_histories_received.max(at);
    }
}
