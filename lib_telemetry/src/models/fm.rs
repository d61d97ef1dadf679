//! Normalized, render-ready view records.
//!
//! Derived fields are computed once from the wire record and never mutated
//! independently. All derived numbers are finite: a zero (or degenerate)
//! denominator yields `0.0`, never NaN or infinity.

/// Depot inventory item, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudInvFm {
    pub class_name: String,
    pub name: String,
    pub amount: i64,
}

/// World inventory item, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldInvFm {
    pub class_name: String,
    pub name: String,
    pub amount: i64,
}

/// Production statistics with derived utilization fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionStatFm {
    pub class_name: String,
    pub name: String,
    pub current_production: f64,
    pub current_consumption: f64,
    pub max_production: f64,
    pub max_consumption: f64,
    /// Production as a percentage of capacity, `0.0` when capacity is zero.
    pub percent_production: f64,
    /// Consumption as a percentage of capacity, `0.0` when capacity is zero.
    pub percent_consumption: f64,
    /// Pre-formatted rate line, e.g. `"P:12.5/min - C: 30.0/min"`.
    pub production_per_minute: String,
}

/// Merged storage record: world inventory joined with production statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageItemFm {
    pub class_name: String,
    pub name: String,
    pub amount: i64,
    pub current_production: f64,
    pub current_consumption: f64,
    pub max_production: f64,
    pub max_consumption: f64,
    pub percent_production: f64,
    pub percent_consumption: f64,
    pub production_per_minute: String,
}

impl CloudInvFm {
    pub fn display_name(&self) -> String {
        clean_name(&self.name)
    }
}

impl WorldInvFm {
    pub fn display_name(&self) -> String {
        clean_name(&self.name)
    }
}

impl StorageItemFm {
    pub fn display_name(&self) -> String {
        clean_name(&self.name)
    }
}

/// Backend item names use underscores where the UI shows spaces.
fn clean_name(name: &str) -> String {
    name.replace('_', " ")
}

/// `current / max * 100`, clamped to `0.0` when `max` is not positive.
pub(crate) fn percent_of_max(current: f64, max: f64) -> f64 {
    if max > 0.0 { current / max * 100.0 } else { 0.0 }
}

/// Formats a production/consumption pair, truncating each rate to one
/// decimal place. Truncation, not rounding: the UI historically showed
/// `12.39` as `12.3`.
pub(crate) fn format_per_minute(production: f64, consumption: f64) -> String {
    format!(
        "P:{:.1}/min - C: {:.1}/min",
        truncate_one_decimal(production),
        truncate_one_decimal(consumption)
    )
}

fn truncate_one_decimal(value: f64) -> f64 {
    (value * 10.0).trunc() / 10.0
}
