//! RouteLayer - Top-level driver for the route tile layer
//!
//! This module exposes the three call sites a tile-building host drives, in order:
//! relation preprocessing, (parallel) way processing and per-tile finalization.

use crate::attributor::{self, WayOutcome};
use crate::finalizer::{self, FinalizeSettings};
use crate::{
    GeoLineMerger, LineMerger, MembershipIndex, OsmRelation, OsmWay, RelationAccumulator, Result,
    RouteError, RouteRelationMeta, TileFeature, utils,
};

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Configuration for the route layer
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// `route` tag values that qualify a relation.
    /// Default: bicycle, hiking, foot
    pub route_kinds: Vec<String>,
    /// Highest zoom level of the tileset (default 14)
    pub max_zoom: u8,
    /// Simplification tolerance in pixels below `max_zoom` (default 0.1)
    pub simplify_tolerance: f64,
    /// Simplification tolerance in pixels at `max_zoom` (default 0.0625)
    pub simplify_tolerance_at_max_zoom: f64,
    /// Factor applied to the zoom tolerance when merging lines (default 0.8)
    pub merge_tolerance_factor: f64,
    /// Pixels rendered beyond the tile edge (default 4)
    pub buffer_pixels: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            route_kinds: ["bicycle", "hiking", "foot"].map(String::from).to_vec(),
            max_zoom: 14,
            simplify_tolerance: 0.1,
            simplify_tolerance_at_max_zoom: 0.0625,
            merge_tolerance_factor: 0.8,
            buffer_pixels: 4.0,
        }
    }
}

impl Config {
    /// Simplification tolerance in pixels for a zoom level
    #[inline]
    pub fn tolerance(&self, zoom: u8) -> f64 {
        if zoom >= self.max_zoom {
            self.simplify_tolerance_at_max_zoom
        } else {
            self.simplify_tolerance
        }
    }

    /// Reject settings the layer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.route_kinds.is_empty() {
            return Err(RouteError::InvalidConfig {
                reason: "at least one route kind is required".to_string(),
            });
        }
        if self.max_zoom > 24 {
            return Err(RouteError::InvalidConfig {
                reason: format!("max zoom {} is above 24", self.max_zoom),
            });
        }
        let non_negative = [
            ("simplify_tolerance", self.simplify_tolerance),
            (
                "simplify_tolerance_at_max_zoom",
                self.simplify_tolerance_at_max_zoom,
            ),
            ("merge_tolerance_factor", self.merge_tolerance_factor),
            ("buffer_pixels", self.buffer_pixels),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RouteError::InvalidConfig {
                    reason: format!("{name} must be a finite non-negative number, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Counters collected over one processing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStats {
    /// Relations that qualified as routes
    pub route_relations: usize,
    /// Ways handed to the layer
    pub ways_processed: usize,
    /// Line features emitted
    pub features_emitted: usize,
    /// Ways whose length could not be measured
    pub geometry_failures: usize,
}

#[derive(Debug, Default)]
struct Counters {
    route_relations: AtomicUsize,
    ways_processed: AtomicUsize,
    features_emitted: AtomicUsize,
    geometry_failures: AtomicUsize,
}

/// Route layer state for one processing run
pub struct RouteLayer {
    config: Config,
    memberships: MembershipIndex,
    accumulator: RelationAccumulator,
    merger: Box<dyn LineMerger>,
    counters: Counters,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteLayer {
    /// Create a layer using the default [`GeoLineMerger`]
    pub fn new(config: Config) -> Result<Self> {
        Self::with_merger(config, Box::new(GeoLineMerger))
    }

    /// Create a layer with a custom line merger
    pub fn with_merger(config: Config, merger: Box<dyn LineMerger>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            memberships: MembershipIndex::new(),
            accumulator: RelationAccumulator::new(),
            merger,
            counters: Counters::default(),
        })
    }

    /// Extract route metadata from a relation without registering it
    pub fn preprocess_relation(&self, relation: &OsmRelation) -> Option<Arc<RouteRelationMeta>> {
        RouteRelationMeta::extract(relation, &self.config.route_kinds)
    }

    /// Extract route metadata and register the relation's way members
    ///
    /// Must be called for every relation before any of its ways is processed.
    pub fn register_relation(&mut self, relation: &OsmRelation) -> Option<Arc<RouteRelationMeta>> {
        let meta = self.preprocess_relation(relation)?;
        self.memberships.insert(&meta, &relation.members);
        self.counters.route_relations.fetch_add(1, Ordering::Relaxed);
        Some(meta)
    }

    /// Attribute a way to one of the given route relations
    ///
    /// Records the way in the relation accumulator and returns the emitted feature,
    /// or `None` when the way has no route relation or is not a line.
    pub fn process_way(
        &self,
        way: &OsmWay,
        relations: &[Arc<RouteRelationMeta>],
    ) -> Option<TileFeature> {
        self.counters.ways_processed.fetch_add(1, Ordering::Relaxed);
        let outcome =
            attributor::attribute_way(way, relations, &self.accumulator, self.config.buffer_pixels);
        match &outcome {
            WayOutcome::Emitted(_) => {
                self.counters.features_emitted.fetch_add(1, Ordering::Relaxed);
            }
            WayOutcome::EmittedWithoutLength(_) => {
                self.counters.features_emitted.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .geometry_failures
                    .fetch_add(1, Ordering::Relaxed);
            }
            WayOutcome::Skipped => {}
        }
        outcome.into_feature()
    }

    /// Process a way using the memberships registered through [`Self::register_relation`]
    #[inline]
    pub fn process_registered_way(&self, way: &OsmWay) -> Option<TileFeature> {
        self.process_way(way, self.memberships.relations_for(way.id))
    }

    /// Process many ways in parallel
    ///
    /// The output order follows the input order.
    pub fn process_ways_parallel(&self, ways: &[OsmWay]) -> Vec<TileFeature> {
        #[cfg(feature = "profiling")]
        profiling::scope!("layer::process_ways_parallel");

        let features: Vec<TileFeature> = ways
            .par_iter()
            .filter_map(|way| self.process_registered_way(way))
            .collect();

        tracing::info!(
            ways = ways.len(),
            features = features.len(),
            relations = self.accumulator.len(),
            "Processed route ways"
        );
        features
    }

    /// Finalize the features of one tile at `zoom`
    ///
    /// Must only be called once all ways of the run have been processed.
    pub fn finalize_tile(&self, zoom: u8, features: Vec<TileFeature>) -> Vec<TileFeature> {
        finalizer::finalize_tile(
            &self.accumulator,
            self.merger.as_ref(),
            self.finalize_settings(zoom),
            zoom,
            None,
            features,
        )
    }

    /// Finalize the features of tile `z/x/y`, clipping merged lines to the tile
    /// plus its buffer
    pub fn finalize_tile_clipped(
        &self,
        z: u8,
        x: u32,
        y: u32,
        features: Vec<TileFeature>,
    ) -> Result<Vec<TileFeature>> {
        let bounds = utils::tile_bounds(z, x, y)?;
        Ok(finalizer::finalize_tile(
            &self.accumulator,
            self.merger.as_ref(),
            self.finalize_settings(z),
            z,
            Some(bounds),
            features,
        ))
    }

    fn finalize_settings(&self, zoom: u8) -> FinalizeSettings {
        FinalizeSettings {
            tolerance_px: self.config.tolerance(zoom),
            tolerance_factor: self.config.merge_tolerance_factor,
            buffer_px: self.config.buffer_pixels,
        }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn accumulator(&self) -> &RelationAccumulator {
        &self.accumulator
    }

    #[inline]
    pub fn memberships(&self) -> &MembershipIndex {
        &self.memberships
    }

    /// Snapshot of the run counters
    pub fn stats(&self) -> RunStats {
        RunStats {
            route_relations: self.counters.route_relations.load(Ordering::Relaxed),
            ways_processed: self.counters.ways_processed.load(Ordering::Relaxed),
            features_emitted: self.counters.features_emitted.load(Ordering::Relaxed),
            geometry_failures: self.counters.geometry_failures.load(Ordering::Relaxed),
        }
    }
}
