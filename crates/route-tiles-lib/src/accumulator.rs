//! Relation-keyed aggregation shared by all way workers
//!
//! Every way that belongs to a route relation contributes its envelope and, when the
//! relation has no tagged distance, its length. Ways of one relation can be processed
//! on different threads in any order, so entries live in a sharded concurrent map and
//! each observation holds the entry lock for the duration of the update.

use crate::utils;
use dashmap::DashMap;
use geo::Rect;

/// Aggregated state of one route relation
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RelationAggregate {
    /// Sum of member way lengths in meters (only when the distance is untagged)
    pub computed_distance: f64,
    /// Union of member way envelopes in Web Mercator meters (None until observed)
    pub extent: Option<Rect<f64>>,
}

impl RelationAggregate {
    #[inline]
    fn expand(&mut self, envelope: Rect<f64>) {
        self.extent = Some(match self.extent {
            Some(extent) => utils::union_rect(extent, envelope),
            None => envelope,
        });
    }

    /// Extent formatted as `[minLon,minLat,maxLon,maxLat]` with three decimals
    pub fn formatted_extent(&self) -> Option<String> {
        let extent = self.extent?;
        let (min_lat, min_lon) = utils::mercator_to_wgs84(extent.min().x, extent.min().y);
        let (max_lat, max_lon) = utils::mercator_to_wgs84(extent.max().x, extent.max().y);
        Some(format!(
            "[{:.3},{:.3},{:.3},{:.3}]",
            utils::round3(min_lon),
            utils::round3(min_lat),
            utils::round3(max_lon),
            utils::round3(max_lat)
        ))
    }

    /// Computed distance rounded to whole meters, `None` when it rounds to zero
    #[inline]
    pub fn rounded_distance(&self) -> Option<i64> {
        let rounded = self.computed_distance.round() as i64;
        (rounded != 0).then_some(rounded)
    }
}

/// Concurrent store of [`RelationAggregate`]s keyed by relation id
#[derive(Debug, Default)]
pub struct RelationAccumulator {
    entries: DashMap<i64, RelationAggregate>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RelationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one member way of `relation_id`
    ///
    /// The envelope is always merged into the extent. The length is only added when
    /// the relation has no tagged distance.
    pub fn observe(
        &self,
        relation_id: i64,
        way_length_m: f64,
        way_envelope: Rect<f64>,
        relation_has_tagged_distance: bool,
    ) {
        let mut entry = self.entries.entry(relation_id).or_default();
        entry.expand(way_envelope);
        if !relation_has_tagged_distance {
            entry.computed_distance += way_length_m;
        }
    }

    /// Record only the envelope of a member way whose length could not be measured
    pub fn observe_envelope(&self, relation_id: i64, way_envelope: Rect<f64>) {
        self.entries
            .entry(relation_id)
            .or_default()
            .expand(way_envelope);
    }

    /// Snapshot of the aggregate for `relation_id`
    #[inline]
    pub fn get(&self, relation_id: i64) -> Option<RelationAggregate> {
        self.entries.get(&relation_id).map(|entry| *entry)
    }

    /// Number of relations observed so far
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
