//! C1: collapses raw auction arrays into deduplicated mini-auction rows
//! and derives per-item price statistics (spec.md Section 4.1).

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use sotah_model::{ItemId, MiniAuction, PriceStats, RawAuction};

/// Result of grouping a batch of raw auctions, plus a content hash over
/// the canonically-ordered rows and a count of rows dropped for being
/// ill-formed (spec.md Section 4.1, "Failure").
#[derive(Debug, Clone)]
pub struct MiniAuctionBatch {
    pub rows: Vec<MiniAuction>,
    pub fingerprint: [u8; 32],
    pub discarded: usize,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct GroupKey {
    item: ItemId,
    owner: String,
    bid: u64,
    buyout: u64,
    quantity: u32,
    time_left: sotah_model::TimeLeft,
    rand: i64,
    seed: i64,
}

/// Groups raw auctions by the tuple (item, owner, bid, buyout, quantity,
/// time-left bucket, rand-seed), dropping auctions with a negative
/// buyout, and returns one `MiniAuction` per group ordered by ascending
/// auction id within the group.
pub fn from_raw(raws: &[RawAuction]) -> MiniAuctionBatch {
    let mut groups: HashMap<GroupKey, Vec<u64>> = HashMap::new();
    let mut discarded = 0usize;

    for raw in raws {
        if raw.buyout < 0 || raw.bid < 0 {
            discarded += 1;
            continue;
        }

        let key = GroupKey {
            item: raw.item,
            owner: raw.owner.clone(),
            bid: raw.bid as u64,
            buyout: raw.buyout as u64,
            quantity: raw.quantity,
            time_left: raw.time_left,
            rand: raw.rand,
            seed: raw.seed,
        };
        groups.entry(key).or_default().push(raw.auc);
    }

    let mut rows: Vec<MiniAuction> = groups
        .into_iter()
        .map(|(key, mut auc_list)| {
            auc_list.sort_unstable();
            MiniAuction {
                item: key.item,
                owner: key.owner,
                bid: key.bid,
                buyout: key.buyout,
                quantity: key.quantity,
                time_left: key.time_left,
                rand: key.rand,
                seed: key.seed,
                count: auc_list.len() as u64,
                auc_list,
            }
        })
        .collect();

    // canonical order: item asc, then owner asc, then bid asc.
    rows.sort_by(|a, b| {
        a.item
            .cmp(&b.item)
            .then_with(|| a.owner.cmp(&b.owner))
            .then_with(|| a.bid.cmp(&b.bid))
    });

    let fingerprint = fingerprint_rows(&rows);

    MiniAuctionBatch {
        rows,
        fingerprint,
        discarded,
    }
}

fn fingerprint_rows(rows: &[MiniAuction]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(row.item.to_le_bytes());
        hasher.update(row.owner.as_bytes());
        hasher.update(row.bid.to_le_bytes());
        hasher.update(row.buyout.to_le_bytes());
        hasher.update(row.quantity.to_le_bytes());
        hasher.update(row.count.to_le_bytes());
    }
    hasher.finalize().into()
}

/// Derives per-item price statistics over a set of mini-auction rows
/// (spec.md Section 4.1). Min buyout ignores zero-buyout (bid-only) rows.
pub fn item_prices(rows: &[MiniAuction]) -> HashMap<ItemId, PriceStats> {
    struct Acc {
        min_buyout: Option<u64>,
        buyout_weighted_sum: f64,
        buyout_weight: u64,
        volume: u64,
        listing_count: u64,
    }

    let mut accs: HashMap<ItemId, Acc> = HashMap::new();

    for row in rows {
        let acc = accs.entry(row.item).or_insert(Acc {
            min_buyout: None,
            buyout_weighted_sum: 0.0,
            buyout_weight: 0,
            volume: 0,
            listing_count: 0,
        });

        if row.buyout > 0 {
            acc.min_buyout = Some(acc.min_buyout.map_or(row.buyout, |m| m.min(row.buyout)));
            let weight = row.quantity as u64 * row.count;
            acc.buyout_weighted_sum += row.buyout as f64 * weight as f64;
            acc.buyout_weight += weight;
        }

        acc.volume += row.quantity as u64 * row.count;
        acc.listing_count += 1;
    }

    accs.into_iter()
        .map(|(item, acc)| {
            let avg_buyout = if acc.buyout_weight > 0 {
                acc.buyout_weighted_sum / acc.buyout_weight as f64
            } else {
                0.0
            };

            (
                item,
                PriceStats {
                    min_buyout: acc.min_buyout.unwrap_or(0),
                    avg_buyout,
                    volume: acc.volume,
                    listing_count: acc.listing_count,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotah_model::TimeLeft;

    fn raw(auc: u64, item: u32, owner: &str, bid: i64, buyout: i64, quantity: u32) -> RawAuction {
        RawAuction {
            auc,
            item,
            owner: owner.to_string(),
            bid,
            buyout,
            quantity,
            time_left: TimeLeft::Long,
            rand: 0,
            seed: 0,
        }
    }

    #[test]
    fn groups_identical_rows_and_preserves_count_invariant() {
        let raws = vec![
            raw(1, 1, "A", 10, 20, 1),
            raw(2, 1, "A", 10, 20, 1),
            raw(3, 1, "A", 10, 20, 1),
        ];
        let batch = from_raw(&raws);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].count, 3);
        let total: u64 = batch.rows.iter().map(|r| r.count).sum();
        assert_eq!(total as usize, raws.len());
    }

    #[test]
    fn drops_negative_buyout_and_reports_discard() {
        let raws = vec![raw(1, 1, "A", 10, -5, 1), raw(2, 1, "A", 10, 20, 1)];
        let batch = from_raw(&raws);
        assert_eq!(batch.discarded, 1);
        assert_eq!(batch.rows.len(), 1);
    }

    #[test]
    fn item_prices_computes_min_and_weighted_average() {
        let raws = vec![
            raw(1, 1, "A", 0, 20, 2),
            raw(2, 1, "B", 0, 10, 1),
            raw(3, 1, "C", 0, 0, 5), // bid-only, excluded from buyout stats
        ];
        let batch = from_raw(&raws);
        let prices = item_prices(&batch.rows);
        let stats = prices.get(&1).unwrap();
        assert_eq!(stats.min_buyout, 10);
        // weighted average: (20*2 + 10*1) / (2+1) = 50/3
        assert!((stats.avg_buyout - 50.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.volume, 2 + 1 + 5);
        assert_eq!(stats.listing_count, 3);
    }

    #[test]
    fn item_prices_counts_distinct_rows_not_raw_multiplicity() {
        // Three duplicate postings collapse into one MiniAuction with
        // count=3; listing_count reflects the one distinct row, not the
        // three underlying raw auctions it summarises.
        let raws = vec![
            raw(1, 1, "A", 10, 20, 1),
            raw(2, 1, "A", 10, 20, 1),
            raw(3, 1, "A", 10, 20, 1),
        ];
        let batch = from_raw(&raws);
        let prices = item_prices(&batch.rows);
        let stats = prices.get(&1).unwrap();
        assert_eq!(stats.min_buyout, 20);
        assert_eq!(stats.avg_buyout, 20.0);
        assert_eq!(stats.volume, 3);
        assert_eq!(stats.listing_count, 1);
    }

    #[test]
    fn fingerprint_is_stable_for_same_input() {
        let raws = vec![raw(1, 1, "A", 10, 20, 1)];
        let a = from_raw(&raws);
        let b = from_raw(&raws);
        assert_eq!(a.fingerprint, b.fingerprint);
    }
}
