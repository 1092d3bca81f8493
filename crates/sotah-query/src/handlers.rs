use serde::{Deserialize, Serialize};
use sotah_bus::{Code, Envelope};
use sotah_model::{ItemId, RealmModificationDates, UnixTimestamp};
use sotah_state::State;
use std::collections::HashMap;
use tracing::warn;

use crate::request::decode_request;

fn parse_error_envelope(context: &str) -> Envelope {
    Envelope::error(Code::MsgJsonParseError, format!("malformed {context} request"))
}

/// `boot` (spec.md Section 4.9): empty request, replies with the
/// region-agnostic taxonomy fetched at boot from the primary region.
#[derive(Debug, Serialize)]
struct BootResponse {
    regions: Vec<sotah_model::Region>,
    item_classes: serde_json::Value,
    expansions: serde_json::Value,
    professions: serde_json::Value,
}

pub async fn boot(state: &State, _payload: &[u8]) -> Envelope {
    let (item_classes, expansions, professions) = state.item_taxonomy().await;
    let response = BootResponse {
        regions: state.regions.clone(),
        item_classes,
        expansions,
        professions,
    };
    match Envelope::ok_gzipped(&response) {
        Ok(envelope) => envelope,
        Err(error) => Envelope::error(Code::GenericError, error.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    region_name: String,
}

/// `status` (spec.md Section 4.9).
pub async fn status(state: &State, payload: &[u8]) -> Envelope {
    let request: StatusRequest = match decode_request(payload) {
        Ok(r) => r,
        Err(_) => return parse_error_envelope("status"),
    };

    match state.status(&request.region_name).await {
        Some(status) => Envelope::ok_gzipped(&status).unwrap_or_else(|e| Envelope::error(Code::GenericError, e.to_string())),
        None => Envelope::error(Code::NotFound, format!("no status for region {}", request.region_name)),
    }
}

#[derive(Debug, Deserialize)]
struct ItemsRequest {
    item_ids: Vec<ItemId>,
}

/// `items` (spec.md Section 4.9).
pub async fn items(state: &State, payload: &[u8]) -> Envelope {
    let request: ItemsRequest = match decode_request(payload) {
        Ok(r) => r,
        Err(_) => return parse_error_envelope("items"),
    };

    match state.catalogue.get(&request.item_ids) {
        Ok(found) => Envelope::ok_gzipped(&found).unwrap_or_else(|e| Envelope::error(Code::GenericError, e.to_string())),
        Err(error) => {
            warn!(%error, "catalogue lookup failed");
            Envelope::error(Code::GenericError, error.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceListHistoryRequest {
    region_name: String,
    realm_slug: String,
    item_ids: Vec<ItemId>,
    #[serde(default)]
    from: UnixTimestamp,
    #[serde(default = "default_to")]
    to: UnixTimestamp,
}

fn default_to() -> UnixTimestamp {
    i64::MAX / 2
}

/// `priceListHistory` (spec.md Section 4.9).
pub async fn price_list_history(state: &State, payload: &[u8]) -> Envelope {
    let request: PriceListHistoryRequest = match decode_request(payload) {
        Ok(r) => r,
        Err(_) => return parse_error_envelope("priceListHistory"),
    };

    match state.price_history.query(
        &request.region_name,
        &request.realm_slug,
        &request.item_ids,
        request.from,
        request.to,
    ) {
        Ok(series) => Envelope::ok_gzipped(&series).unwrap_or_else(|e| Envelope::error(Code::GenericError, e.to_string())),
        Err(error) => {
            warn!(%error, "price history query failed");
            Envelope::error(Code::GenericError, error.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwnersQueryByItemsRequest {
    region_name: String,
    realm_slug: String,
    items: Vec<ItemId>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct OwnerStat {
    owner: String,
    volume: u64,
    value: u64,
}

/// `ownersQueryByItems` (spec.md Section 4.9): ranks owners of the
/// requested items in the realm's current mini-auction table by volume.
pub async fn owners_query_by_items(state: &State, payload: &[u8]) -> Envelope {
    let request: OwnersQueryByItemsRequest = match decode_request(payload) {
        Ok(r) => r,
        Err(_) => return parse_error_envelope("ownersQueryByItems"),
    };

    let Some(batch) = state.mini_auctions(&request.region_name, &request.realm_slug).await else {
        return Envelope::error(
            Code::NotFound,
            format!("no auction table for {}/{}", request.region_name, request.realm_slug),
        );
    };

    let wanted: std::collections::HashSet<ItemId> = request.items.iter().copied().collect();
    let ranked = rank_owners(&batch.rows, &wanted);

    Envelope::ok_gzipped(&ranked).unwrap_or_else(|e| Envelope::error(Code::GenericError, e.to_string()))
}

/// Aggregates volume/value per owner across the rows that touch a wanted
/// item, ranked descending by volume.
fn rank_owners(rows: &[sotah_model::MiniAuction], wanted: &std::collections::HashSet<ItemId>) -> Vec<OwnerStat> {
    let mut by_owner: HashMap<String, OwnerStat> = HashMap::new();
    for row in rows.iter().filter(|row| wanted.contains(&row.item)) {
        let stat = by_owner.entry(row.owner.clone()).or_insert_with(|| OwnerStat {
            owner: row.owner.clone(),
            ..Default::default()
        });
        let units = row.quantity as u64 * row.count;
        stat.volume += units;
        stat.value += row.buyout * units;
    }

    let mut ranked: Vec<OwnerStat> = by_owner.into_values().collect();
    ranked.sort_by(|a, b| b.volume.cmp(&a.volume));
    ranked
}

/// `sessionSecret` (spec.md Section 4.9): empty request, small response.
pub async fn session_secret(state: &State, _payload: &[u8]) -> Envelope {
    Envelope::ok(state.session_secret.to_string())
}

#[derive(Debug, Deserialize)]
struct RealmModificationDatesRequest {
    region_name: String,
    realm_slug: String,
}

/// `realmModificationDates` (spec.md Section 4.9).
pub async fn realm_modification_dates(state: &State, payload: &[u8]) -> Envelope {
    let request: RealmModificationDatesRequest = match decode_request(payload) {
        Ok(r) => r,
        Err(_) => return parse_error_envelope("realmModificationDates"),
    };

    let dates: RealmModificationDates = state
        .modification_dates(&request.region_name, &request.realm_slug)
        .await;
    match serde_json::to_string(&dates) {
        Ok(json) => Envelope::ok(json),
        Err(error) => Envelope::error(Code::GenericError, error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotah_model::TimeLeft;
    use std::collections::HashSet;

    fn row(item: ItemId, owner: &str, buyout: u64, quantity: u32, count: u64) -> sotah_model::MiniAuction {
        sotah_model::MiniAuction {
            item,
            owner: owner.to_string(),
            bid: 0,
            buyout,
            quantity,
            time_left: TimeLeft::Long,
            rand: 0,
            seed: 0,
            count,
            auc_list: vec![1],
        }
    }

    #[test]
    fn rank_owners_sums_volume_and_value_and_sorts_descending() {
        let rows = vec![
            row(1, "A", 10, 2, 1),
            row(1, "B", 5, 10, 1),
            row(2, "A", 20, 1, 1), // item not requested, excluded
        ];
        let wanted: HashSet<ItemId> = [1].into_iter().collect();

        let ranked = rank_owners(&rows, &wanted);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].owner, "B");
        assert_eq!(ranked[0].volume, 10);
        assert_eq!(ranked[1].owner, "A");
        assert_eq!(ranked[1].volume, 2);
        assert_eq!(ranked[1].value, 20);
    }

    #[test]
    fn rank_owners_ignores_items_not_requested() {
        let rows = vec![row(9, "C", 1, 1, 1)];
        let wanted: HashSet<ItemId> = [1].into_iter().collect();
        assert!(rank_owners(&rows, &wanted).is_empty());
    }

    #[test]
    fn parse_error_envelope_carries_msg_json_parse_code() {
        let envelope = parse_error_envelope("items");
        assert_eq!(envelope.code, Code::MsgJsonParseError);
        assert!(!envelope.is_ok());
    }
}
