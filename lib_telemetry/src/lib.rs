//! # lib_telemetry
//!
//! Data-synchronization core for the factory telemetry collector. The game
//! backend exposes read-only REST endpoints returning JSON arrays; this crate
//! polls them on a fixed interval, maps wire records into view records, and
//! publishes the latest snapshot to any number of consumers through shared,
//! reference-counted subscriptions.

// Declare the modules to re-export
pub mod classify;
pub mod endpoints;
pub mod merge;
pub mod models;
pub mod retrieve;
pub mod sync;

// Re-export the consumer-facing surface
pub use classify::{Balance, classify};
pub use endpoints::Endpoint;
pub use merge::merge_storage;
pub use models::dto::{CloudInvDto, ProdStatsDto, WorldInvDto};
pub use models::fm::{CloudInvFm, ProductionStatFm, StorageItemFm, WorldInvFm};
pub use models::mapping::{CloudInvModel, EndpointModel, ProdStatsModel, WorldInvModel};
pub use retrieve::http::{ApiClient, FetchError};
pub use sync::engine::{Snapshot, Subscription, SyncEngine};
