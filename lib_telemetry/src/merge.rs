//! Keyed join of world inventory against production statistics.
//!
//! The inventory side owns the key set: every inventory item appears in the
//! output exactly once, joined with its production record when one exists
//! and zero-filled otherwise. Production records without a matching
//! inventory item are dropped; an item that is produced and consumed but
//! never held anywhere has no row in the merged view.

use std::collections::HashMap;

use crate::models::fm::{ProductionStatFm, StorageItemFm, WorldInvFm, format_per_minute};

/// Left-joins `inventory` with `stats`, keyed by item `name`.
pub fn merge_storage(inventory: &[WorldInvFm], stats: &[ProductionStatFm]) -> Vec<StorageItemFm> {
    let by_name: HashMap<&str, &ProductionStatFm> =
        stats.iter().map(|s| (s.name.as_str(), s)).collect();

    inventory
        .iter()
        .map(|item| match by_name.get(item.name.as_str()) {
            Some(stat) => StorageItemFm {
                class_name: stat.class_name.clone(),
                name: stat.name.clone(),
                amount: item.amount,
                current_production: stat.current_production,
                current_consumption: stat.current_consumption,
                max_production: stat.max_production,
                max_consumption: stat.max_consumption,
                percent_production: stat.percent_production,
                percent_consumption: stat.percent_consumption,
                production_per_minute: stat.production_per_minute.clone(),
            },
            None => StorageItemFm {
                class_name: item.class_name.clone(),
                name: item.name.clone(),
                amount: item.amount,
                current_production: 0.0,
                current_consumption: 0.0,
                max_production: 0.0,
                max_consumption: 0.0,
                percent_production: 0.0,
                percent_consumption: 0.0,
                production_per_minute: format_per_minute(0.0, 0.0),
            },
        })
        .collect()
}
