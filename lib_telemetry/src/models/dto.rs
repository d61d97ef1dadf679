//! Backend-shaped wire records.
//!
//! Field names follow the backend's camelCase JSON; every record carries the
//! internal class identifier plus a human-readable name.

use serde::{Deserialize, Serialize};

/// One item stack in the dimensional depot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudInvDto {
    pub class_name: String,
    pub name: String,
    pub amount: i64,
}

/// One item total across the world (containers, belts, machines).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldInvDto {
    pub class_name: String,
    pub name: String,
    pub amount: i64,
}

/// Production statistics for one item, in units per minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProdStatsDto {
    pub class_name: String,
    pub name: String,
    pub current_production: f64,
    pub current_consumption: f64,
    pub max_production: f64,
    pub max_consumption: f64,
}
