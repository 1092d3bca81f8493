mod auction;
mod item;
mod realm;
mod time;

pub use auction::{AuctionId, ItemId, MiniAuction, PriceStats, RawAuction, TimeLeft};
pub use item::ItemRecord;
pub use realm::{Realm, RealmModificationDates, Region, RegionName, RealmSlug, Status};
pub use time::{normalize_name, week_start, UnixTimestamp, DAY_SECONDS, RETENTION_DAYS, WEEK_SECONDS};

/// Upper bound on a single bulk topic publish, per spec Section 4.7.
pub const MAX_TOPIC_BATCH: usize = 1000;
