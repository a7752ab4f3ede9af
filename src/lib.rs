//! Gridpoint - Geodesy and Nearest-Marker Queries for the British Isles
//!
//! This library converts coordinates between WGS84 latitude/longitude and the
//! Ordnance Survey National Grid (OSGB36 datum, Transverse Mercator
//! projection, lettered grid references), and ranks survey markers by
//! great-circle distance from a moving or pinned anchor point.
//!
//! # Architecture
//!
//! - **[`GeographicCoordinate`]** / **[`GridCoordinate`]**: Immutable value
//!   types for the two coordinate worlds, with conversions between them
//! - **[`gridref`]**: Parse and format lettered grid references (`NY341151`)
//! - **[`datum`]** / **[`projection`]**: Helmert datum shift and Transverse
//!   Mercator series behind the coordinate conversions
//! - **[`greatcircle`]**: Haversine distance, initial bearing, display units
//! - **[`PointStore`]**: Async source of filterable survey markers, with an
//!   in-memory implementation for tests and embedding
//! - **[`NearestSession`]**: Stateful query engine with live/pinned anchors
//!   and last-result-wins concurrency
//!
//! # Accuracy Characteristics
//!
//! - **Datum shift**: Single Helmert transform, ~5 m against OSTN15
//! - **Projection**: Sub-millimetre round-trip within the grid's extent
//! - **Distance**: Spherical earth (R = 6371 km), ~0.5% vs ellipsoidal

pub mod coord;
pub mod datum;
pub mod greatcircle;
pub mod gridref;
pub mod point;
pub mod projection;
pub mod query;
pub mod store;

// Public API exports
pub use coord::{GeographicCoordinate, GridCoordinate};
pub use greatcircle::Unit;
pub use point::{Category, Condition, FilterCriteria, PointOfInterest, StatusFilter, TypeFilter};
pub use query::{
    AnchorState, LocationFix, NearestSession, RankedResult, ResultsSnapshot, SnapshotState, rank,
};
pub use store::{MemoryStore, PointStore, StoreError};

/// Error types for coordinate handling and queries
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid grid reference {text:?}: {reason}")]
    InvalidGridReference { text: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
