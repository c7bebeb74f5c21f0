//! Per-way attribution of route relations
//!
//! Each way belonging to at least one route relation is emitted as exactly one line
//! feature that carries the attributes of a single representative relation and its id
//! as the `osmid` join key. Before emitting, the way's length and envelope are recorded
//! in the [`RelationAccumulator`] for every relation it belongs to.

use crate::{NetworkClass, OsmWay, RelationAccumulator, RouteRelationMeta, TileFeature, utils};
use std::sync::Arc;

/// Outcome of processing one way
#[derive(Debug)]
pub enum WayOutcome {
    /// The way was attributed to a relation and emitted
    Emitted(TileFeature),
    /// The way has no route relation or cannot be drawn as a line
    Skipped,
    /// The way was emitted but its length could not be measured
    EmittedWithoutLength(TileFeature),
}

impl WayOutcome {
    pub fn into_feature(self) -> Option<TileFeature> {
        match self {
            WayOutcome::Emitted(f) | WayOutcome::EmittedWithoutLength(f) => Some(f),
            WayOutcome::Skipped => None,
        }
    }
}

/// Pick the relation a shared way is attributed to
///
/// The relation with the lowest id wins, independently of index order.
pub fn select_representative(
    relations: &[Arc<RouteRelationMeta>],
) -> Option<&Arc<RouteRelationMeta>> {
    relations.iter().min_by_key(|r| r.id)
}

/// Lowest zoom at which a route of the given class is shown
pub fn min_zoom(network: NetworkClass, has_name: bool) -> u8 {
    match network {
        NetworkClass::International if has_name => 5,
        NetworkClass::International => 6,
        NetworkClass::National => 8,
        NetworkClass::Regional => 9,
        NetworkClass::Other => 10,
    }
}

/// Attribute a way to its representative route relation
///
/// Every relation the way belongs to records it in `accumulator`; only the
/// representative one is emitted. A way needs at least two finite coordinates to be
/// drawn. Geometry that is drawable but cannot be measured is logged and only its
/// envelope is recorded.
pub fn attribute_way(
    way: &OsmWay,
    relations: &[Arc<RouteRelationMeta>],
    accumulator: &RelationAccumulator,
    buffer_pixels: f64,
) -> WayOutcome {
    #[cfg(feature = "profiling")]
    profiling::scope!("attributor::attribute_way");

    let Some(relation) = select_representative(relations) else {
        return WayOutcome::Skipped;
    };
    if !way.can_be_line() {
        return WayOutcome::Skipped;
    }
    let geometry = utils::line_to_mercator(&way.coordinates);
    if geometry.0.len() < 2 {
        tracing::debug!(way_id = way.id, "Skipping way without drawable coordinates");
        return WayOutcome::Skipped;
    }
    // Two finite coordinates always yield an envelope
    let Some(envelope) = utils::mercator_envelope(&way.coordinates) else {
        return WayOutcome::Skipped;
    };

    let length = match utils::haversine_length(way.id, &way.coordinates) {
        Ok(length) => Some(length),
        Err(err) => {
            tracing::warn!(
                way_id = way.id,
                relation_id = relation.id,
                "Unable to get route length: {err}"
            );
            None
        }
    };

    for (i, member) in relations.iter().enumerate() {
        if relations[..i].iter().any(|earlier| earlier.id == member.id) {
            continue;
        }
        match length {
            Some(length) => accumulator.observe(
                member.id,
                length,
                envelope,
                member.has_tagged_distance(),
            ),
            None => accumulator.observe_envelope(member.id, envelope),
        }
    }

    let feature = build_feature(geometry, relation, buffer_pixels);
    match length {
        Some(_) => WayOutcome::Emitted(feature),
        None => WayOutcome::EmittedWithoutLength(feature),
    }
}

/// Build the tile feature carrying the attributes of `relation`
fn build_feature(
    geometry: geo::LineString<f64>,
    relation: &RouteRelationMeta,
    buffer_pixels: f64,
) -> TileFeature {
    let mut feature = TileFeature::new(geometry);
    feature
        .set_attr("osmid", Some(relation.id))
        .set_attr("network", Some(i64::from(relation.network.ordinal())))
        .set_attr("ref", non_empty(&relation.reference))
        .set_attr("name", relation.name.as_deref().and_then(non_empty))
        .set_attr("ascent", relation.ascent.and_then(non_zero_meters))
        .set_attr("descent", relation.descent.and_then(non_zero_meters))
        .set_attr("distance", relation.distance.and_then(non_zero_meters))
        .set_attr("symbol", relation.symbol.as_deref().and_then(non_empty))
        .set_attr("class", Some(relation.route.as_str()));

    feature.min_zoom = min_zoom(relation.network, relation.has_name());
    feature.min_pixel_size = 0.0;
    feature.buffer_pixels = buffer_pixels;
    feature
}

#[inline]
fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Whole meters, with zero treated as no data
#[inline]
fn non_zero_meters(value: f64) -> Option<i64> {
    let rounded = value.round() as i64;
    (rounded != 0).then_some(rounded)
}
