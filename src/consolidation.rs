//! Sale-order consolidation.
//!
//! Orders sharing a consolidation key (delivery region + date) may be
//! packed jointly. A merge is accepted only when the joint recommendation
//! scores strictly better than the per-order recommendations combined; the
//! merged arena carries provenance so every placement maps back to its
//! source order.

use serde::{Deserialize, Serialize};

use crate::packer::{build_arena, PackItem};
use crate::types::ItemSnapshot;

/// One sale-order's carton demand plus its delivery constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub delivery_region: String,
    /// Delivery date as an opaque calendar string (e.g. "2026-08-01").
    pub delivery_date: String,
    pub items: Vec<(ItemSnapshot, u32)>,
}

impl OrderSnapshot {
    pub fn key(&self) -> ConsolidationKey {
        ConsolidationKey {
            region: self.delivery_region.clone(),
            date: self.delivery_date.clone(),
        }
    }
}

/// Orders grouped under the same key are merge candidates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsolidationKey {
    pub region: String,
    pub date: String,
}

/// Orders sharing one consolidation key, in stable order-id order.
#[derive(Debug, Clone)]
pub struct OrderGroup {
    pub key: ConsolidationKey,
    pub orders: Vec<OrderSnapshot>,
}

/// Maps one merged-arena entry back to its source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProvenance {
    /// Index into the merged arena (and thus `Placement.item_index`).
    pub arena_index: usize,
    pub order_id: String,
    pub item_id: String,
}

/// Group orders by consolidation key. Groups come out key-sorted and the
/// orders inside each group id-sorted, so grouping is deterministic.
pub fn group_orders(orders: &[OrderSnapshot]) -> Vec<OrderGroup> {
    let mut groups: std::collections::BTreeMap<ConsolidationKey, Vec<OrderSnapshot>> =
        std::collections::BTreeMap::new();
    for order in orders {
        groups.entry(order.key()).or_default().push(order.clone());
    }
    groups
        .into_iter()
        .map(|(key, mut orders)| {
            orders.sort_by(|a, b| a.order_id.cmp(&b.order_id));
            OrderGroup { key, orders }
        })
        .collect()
}

/// Expand a group's orders into one joint arena plus per-unit provenance.
pub fn merged_arena(group: &OrderGroup) -> (Vec<PackItem>, Vec<ItemProvenance>) {
    let mut multiset: Vec<(ItemSnapshot, u32)> = Vec::new();
    let mut owners: Vec<&str> = Vec::new();
    for order in &group.orders {
        for (item, count) in &order.items {
            multiset.push((item.clone(), *count));
            for _ in 0..*count {
                owners.push(&order.order_id);
            }
        }
    }
    let arena = build_arena(&multiset);
    let provenance = arena
        .iter()
        .zip(owners)
        .map(|(entry, order_id)| ItemProvenance {
            arena_index: entry.arena_index,
            order_id: order_id.to_string(),
            item_id: entry.item.id.clone(),
        })
        .collect();
    (arena, provenance)
}

/// Merge acceptance rule: the joint score must be strictly lower than the
/// per-order scores combined. An order with no feasible plan of its own
/// counts as infinitely expensive, so any feasible merge beats it.
pub fn merge_accepted(merged_score: Option<f64>, individual_scores: &[Option<f64>]) -> bool {
    let Some(merged) = merged_score else {
        return false;
    };
    let combined: f64 = individual_scores
        .iter()
        .map(|s| s.unwrap_or(f64::INFINITY))
        .sum();
    merged < combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(id: &str) -> ItemSnapshot {
        ItemSnapshot {
            id: id.into(),
            name: id.into(),
            length_cm: 50.0,
            width_cm: 50.0,
            height_cm: 50.0,
            weight_kg: 5.0,
            can_rotate: true,
            fragile: false,
            stackable: true,
            max_stack_height: None,
            priority: 0,
            value: 0.0,
        }
    }

    fn make_order(order_id: &str, region: &str, date: &str, count: u32) -> OrderSnapshot {
        OrderSnapshot {
            order_id: order_id.into(),
            delivery_region: region.into(),
            delivery_date: date.into(),
            items: vec![(make_item("CRT"), count)],
        }
    }

    #[test]
    fn orders_group_by_region_and_date() {
        let orders = vec![
            make_order("SO-3", "North", "2026-08-02", 1),
            make_order("SO-1", "North", "2026-08-01", 2),
            make_order("SO-2", "North", "2026-08-01", 3),
            make_order("SO-4", "South", "2026-08-01", 1),
        ];
        let groups = group_orders(&orders);
        assert_eq!(groups.len(), 3);
        let north_first = &groups[0];
        assert_eq!(north_first.key.region, "North");
        assert_eq!(north_first.key.date, "2026-08-01");
        assert_eq!(
            north_first
                .orders
                .iter()
                .map(|o| o.order_id.as_str())
                .collect::<Vec<_>>(),
            vec!["SO-1", "SO-2"]
        );
    }

    #[test]
    fn provenance_attributes_every_arena_entry() {
        let groups = group_orders(&[
            make_order("SO-1", "North", "2026-08-01", 2),
            make_order("SO-2", "North", "2026-08-01", 3),
        ]);
        let (arena, provenance) = merged_arena(&groups[0]);
        assert_eq!(arena.len(), 5);
        assert_eq!(provenance.len(), 5);
        assert!(provenance[..2].iter().all(|p| p.order_id == "SO-1"));
        assert!(provenance[2..].iter().all(|p| p.order_id == "SO-2"));
        for (i, p) in provenance.iter().enumerate() {
            assert_eq!(p.arena_index, i);
        }
    }

    #[test]
    fn merge_requires_strictly_lower_score() {
        assert!(merge_accepted(Some(900.0), &[Some(500.0), Some(500.0)]));
        assert!(!merge_accepted(Some(1000.0), &[Some(500.0), Some(500.0)]));
        assert!(!merge_accepted(Some(1100.0), &[Some(500.0), Some(500.0)]));
    }

    #[test]
    fn infeasible_individual_order_always_merges() {
        assert!(merge_accepted(Some(5_000.0), &[Some(500.0), None]));
    }

    #[test]
    fn infeasible_merge_never_accepted() {
        assert!(!merge_accepted(None, &[Some(500.0), Some(500.0)]));
    }

    #[test]
    fn grouping_is_deterministic() {
        let orders = vec![
            make_order("SO-2", "North", "2026-08-01", 1),
            make_order("SO-1", "North", "2026-08-01", 1),
        ];
        let a = group_orders(&orders);
        let b = group_orders(&orders);
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].orders, b[0].orders);
    }
}
