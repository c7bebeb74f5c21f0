//! Route Tiles Library - Relation Aggregation for Route Line Layers
//!
//! This library turns OpenStreetMap hiking and cycling route relations and their member
//! ways into vector-tile line features. Every way contributes to a shared, relation-keyed
//! aggregate (bounding extent and distance estimate) that is read back when each tile is
//! finalized and its lines are merged.
//!
//! # Architecture
//!
//! - **[`RouteRelationMeta`]**: Immutable metadata extracted once per qualifying relation
//! - **[`NetworkClass`]**: Ordinal importance tier derived from the `network` tag
//! - **[`RelationAccumulator`]**: Concurrent relation-keyed extent and distance aggregates
//! - **[`attributor`]**: Per-way representative selection, min zoom and attributes
//! - **[`finalizer`]**: Per-tile attribute reconciliation followed by line merging
//! - **[`RouteLayer`]**: High-level driver tying the three host call sites together
//!
//! # Processing Order
//!
//! 1. Relations are preprocessed before any way (metadata is read-only afterwards)
//! 2. Ways are processed in parallel, each observing the accumulator
//! 3. Tiles are finalized once all ways have been observed

mod accumulator;
pub mod attributor;
mod feature;
pub mod finalizer;
mod layer;
mod membership;
mod merge;
mod network;
pub mod osm;
mod relation;
pub mod utils;

// Public API exports
pub use accumulator::{RelationAccumulator, RelationAggregate};
pub use feature::{AttrValue, Attributes, TileFeature};
pub use layer::{Config, RouteLayer, RunStats};
pub use membership::MembershipIndex;
pub use merge::{GeoLineMerger, LineMerger, MergeOptions};
pub use network::{NetworkClass, classify};
pub use osm::{OsmRelation, OsmWay, Tags};
pub use relation::RouteRelationMeta;

/// Error types for the route layer
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Invalid geometry for way {way_id}: {reason}")]
    InvalidGeometry { way_id: i64, reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid tile coordinate {z}/{x}/{y}")]
    InvalidTile { z: u8, x: u32, y: u32 },
}

pub type Result<T> = std::result::Result<T, RouteError>;
