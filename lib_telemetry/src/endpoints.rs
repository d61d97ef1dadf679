//! Logical endpoint identifiers and their resource paths.
//!
//! The backend enumerates its telemetry feeds as fixed REST resources; the
//! mapping is defined at compile time, so an unknown identifier cannot exist
//! at runtime.

use std::fmt;

/// A telemetry feed exposed by the game backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Items stored in the dimensional depot.
    CloudInv,
    /// Items stored anywhere in the world (containers, belts, machines).
    WorldInv,
    /// Per-item production and consumption statistics.
    ProdStats,
}

impl Endpoint {
    /// Resource path relative to the backend base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::CloudInv => "getCloudInv",
            Endpoint::WorldInv => "getWorldInv",
            Endpoint::ProdStats => "getProdStats",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
