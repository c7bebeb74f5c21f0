//! Route relation metadata
//!
//! This module provides [`RouteRelationMeta`], the immutable record extracted once from
//! every qualifying route relation and shared by all of its member ways.

use crate::osm::{OsmRelation, parse_meters};
use crate::{NetworkClass, classify};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Information extracted from a route relation, used when processing its ways
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteRelationMeta {
    /// OSM relation id
    pub id: i64,
    /// `name`, falling back to `alt_name`
    pub name: Option<String>,
    /// Value of the `route` tag (e.g. `hiking`)
    pub route: String,
    /// Value of the `ref` tag, empty when untagged
    pub reference: String,
    /// Importance class derived from the `network` tag
    pub network: NetworkClass,
    /// Total ascent in meters
    pub ascent: Option<f64>,
    /// Total descent in meters
    pub descent: Option<f64>,
    /// Tagged route length in meters
    pub distance: Option<f64>,
    /// Raw `osmc:symbol` style hint
    pub symbol: Option<String>,
}

impl RouteRelationMeta {
    /// Extract route metadata from a relation
    ///
    /// Returns `None` unless the relation is tagged `type=route` with a `route` value
    /// in `route_kinds`.
    pub fn extract(relation: &OsmRelation, route_kinds: &[String]) -> Option<Arc<Self>> {
        let tags = &relation.tags;
        if tags.get("type") != Some("route") || !tags.has_any("route", route_kinds) {
            return None;
        }

        let meters = |key: &str| tags.get(key).and_then(parse_meters);

        Some(Arc::new(Self {
            id: relation.id,
            name: tags
                .get_non_empty("name")
                .or_else(|| tags.get_non_empty("alt_name"))
                .map(str::to_owned),
            route: tags.get("route").unwrap_or_default().to_owned(),
            reference: tags.get("ref").unwrap_or_default().to_owned(),
            network: classify(tags.get("network")),
            ascent: meters("ascent"),
            descent: meters("descent"),
            distance: meters("distance"),
            symbol: tags.get("osmc:symbol").map(str::to_owned),
        }))
    }

    #[inline]
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Whether the relation carries an authoritative tagged distance
    #[inline]
    pub fn has_tagged_distance(&self) -> bool {
        self.distance.is_some()
    }
}
