//! Typed binding between an endpoint and its wire/view record pair.
//!
//! A subscription is one (endpoint, mapping) unit; the engine is generic
//! over implementations of [`EndpointModel`], so each feed gets a strongly
//! typed snapshot without any runtime dispatch on record shape.

use serde::de::DeserializeOwned;

use crate::endpoints::Endpoint;
use crate::models::dto::{CloudInvDto, ProdStatsDto, WorldInvDto};
use crate::models::fm::{
    CloudInvFm, ProductionStatFm, WorldInvFm, format_per_minute, percent_of_max,
};

/// One pollable feed: the endpoint it lives at, the wire shape it returns,
/// and the pure per-record transform into the view shape.
pub trait EndpointModel: Send + Sync + 'static {
    /// The feed this model binds to.
    const ENDPOINT: Endpoint;

    /// Backend-shaped record, as transmitted.
    type Dto: DeserializeOwned + Send + 'static;

    /// Normalized, render-ready record.
    type Fm: Clone + Send + Sync + 'static;

    /// Pure per-record transform. Must not fail: every decoded wire record
    /// maps to exactly one view record.
    fn map(dto: Self::Dto) -> Self::Fm;
}

/// Dimensional depot inventory.
pub struct CloudInvModel;

impl EndpointModel for CloudInvModel {
    const ENDPOINT: Endpoint = Endpoint::CloudInv;
    type Dto = CloudInvDto;
    type Fm = CloudInvFm;

    fn map(dto: CloudInvDto) -> CloudInvFm {
        CloudInvFm {
            class_name: dto.class_name,
            name: dto.name,
            amount: dto.amount,
        }
    }
}

/// World inventory.
pub struct WorldInvModel;

impl EndpointModel for WorldInvModel {
    const ENDPOINT: Endpoint = Endpoint::WorldInv;
    type Dto = WorldInvDto;
    type Fm = WorldInvFm;

    fn map(dto: WorldInvDto) -> WorldInvFm {
        WorldInvFm {
            class_name: dto.class_name,
            name: dto.name,
            amount: dto.amount,
        }
    }
}

/// Production statistics, with utilization percentages and the formatted
/// rate line derived at map time.
pub struct ProdStatsModel;

impl EndpointModel for ProdStatsModel {
    const ENDPOINT: Endpoint = Endpoint::ProdStats;
    type Dto = ProdStatsDto;
    type Fm = ProductionStatFm;

    fn map(dto: ProdStatsDto) -> ProductionStatFm {
        let percent_production = percent_of_max(dto.current_production, dto.max_production);
        let percent_consumption = percent_of_max(dto.current_consumption, dto.max_consumption);
        let production_per_minute =
            format_per_minute(dto.current_production, dto.current_consumption);

        ProductionStatFm {
            class_name: dto.class_name,
            name: dto.name,
            current_production: dto.current_production,
            current_consumption: dto.current_consumption,
            max_production: dto.max_production,
            max_consumption: dto.max_consumption,
            percent_production,
            percent_consumption,
            production_per_minute,
        }
    }
}
