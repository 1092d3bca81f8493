use serde::{Deserialize, Serialize};

use crate::auction::ItemId;
use crate::time::UnixTimestamp;

/// Enriched item-catalogue record. `normalized_name == ""` and
/// `icon_url == ""` / `icon_object_name == ""` both mean "needs sync"
/// (spec.md Section 3, Section 4.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub icon: String,
    pub icon_url: String,
    pub normalized_name: String,
    pub icon_object_name: String,
    pub last_modified: UnixTimestamp,
}

impl ItemRecord {
    pub fn needs_name_sync(&self) -> bool {
        self.normalized_name.is_empty()
    }

    pub fn needs_icon_sync(&self) -> bool {
        !self.icon.is_empty() && (self.icon_url.is_empty() || self.icon_object_name.is_empty())
    }
}
