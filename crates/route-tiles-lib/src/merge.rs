//! Line merging for finalized tile features
//!
//! The [`LineMerger`] trait is the contract under which the finalizer hands a tile's
//! features over for merging. [`GeoLineMerger`] is the default implementation: it joins
//! features with identical attributes end to end, optionally clips them to the tile,
//! simplifies them and drops lines that are too short to matter.

use crate::{Attributes, TileFeature, utils};
use geo::{Coord, Intersects, Line, LineString, Rect, Simplify};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Parameters of a single merge pass
pub struct MergeOptions<'a> {
    /// Zoom level of the tile, used to convert pixels to meters
    pub zoom: u8,
    /// Maximum deviation introduced by simplification, in pixels
    pub tolerance_px: f64,
    /// Margin around the tile kept when clipping, in pixels
    pub buffer_px: f64,
    /// Minimum length in pixels of a merged line, per attribute set
    pub min_length_px: &'a (dyn Fn(&Attributes) -> f64 + Sync),
    /// Tile bounds in Web Mercator meters; no clipping when `None`
    pub tile_bounds: Option<Rect<f64>>,
}

/// Merges the line features of one tile into fewer, longer lines
pub trait LineMerger: Send + Sync {
    fn merge(&self, features: Vec<TileFeature>, options: &MergeOptions<'_>) -> Vec<TileFeature>;
}

/// Endpoint-stitching merger built on `geo` simplification
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoLineMerger;

/// Features sharing one attribute set
struct Group {
    attributes: Attributes,
    min_zoom: u8,
    min_pixel_size: f64,
    buffer_pixels: f64,
    lines: Vec<LineString<f64>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LineMerger for GeoLineMerger {
    fn merge(&self, features: Vec<TileFeature>, options: &MergeOptions<'_>) -> Vec<TileFeature> {
        let meters_per_px = utils::meters_per_pixel(options.zoom);
        let tolerance_m = options.tolerance_px * meters_per_px;
        let clip = options.tile_bounds.map(|bounds| {
            let margin = options.buffer_px * meters_per_px;
            Rect::new(
                Coord {
                    x: bounds.min().x - margin,
                    y: bounds.min().y - margin,
                },
                Coord {
                    x: bounds.max().x + margin,
                    y: bounds.max().y + margin,
                },
            )
        });

        let input_count = features.len();
        let groups = group_by_attributes(features);

        let mut merged = Vec::with_capacity(groups.len());
        for group in groups {
            let min_length_m = (options.min_length_px)(&group.attributes) * meters_per_px;

            let mut lines = stitch(group.lines);
            if let Some(clip) = clip {
                lines = lines
                    .iter()
                    .flat_map(|line| clip_to_runs(line, clip))
                    .collect();
            }

            for line in lines {
                let line = if tolerance_m > 0.0 && line.0.len() > 2 {
                    line.simplify(tolerance_m)
                } else {
                    line
                };
                if line.0.len() < 2 || planar_length(&line) < min_length_m {
                    continue;
                }
                merged.push(TileFeature {
                    geometry: line,
                    attributes: group.attributes.clone(),
                    min_zoom: group.min_zoom,
                    min_pixel_size: group.min_pixel_size,
                    buffer_pixels: group.buffer_pixels,
                });
            }
        }

        tracing::debug!(
            zoom = options.zoom,
            "Merged {} line features into {}",
            input_count,
            merged.len()
        );
        merged
    }
}

/// Group features by attribute set, in order of first appearance
fn group_by_attributes(features: Vec<TileFeature>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    // Features of different relations never share attributes, so the join key
    // narrows the search to a handful of candidates.
    let mut by_osmid: HashMap<Option<i64>, SmallVec<[usize; 2]>> = HashMap::new();

    for feature in features {
        let osmid = feature.attr("osmid").and_then(|v| v.as_i64());
        let candidates = by_osmid.entry(osmid).or_default();
        let existing = candidates
            .iter()
            .copied()
            .find(|&i| groups[i].attributes == feature.attributes);

        match existing {
            Some(i) => {
                let group = &mut groups[i];
                group.min_zoom = group.min_zoom.min(feature.min_zoom);
                group.min_pixel_size = group.min_pixel_size.min(feature.min_pixel_size);
                group.buffer_pixels = group.buffer_pixels.max(feature.buffer_pixels);
                group.lines.push(feature.geometry);
            }
            None => {
                candidates.push(groups.len());
                groups.push(Group {
                    attributes: feature.attributes,
                    min_zoom: feature.min_zoom,
                    min_pixel_size: feature.min_pixel_size,
                    buffer_pixels: feature.buffer_pixels,
                    lines: vec![feature.geometry],
                });
            }
        }
    }
    groups
}

/// Endpoint key with millimeter resolution
type NodeKey = (i64, i64);

#[inline]
fn node_key(coord: Coord<f64>) -> NodeKey {
    ((coord.x * 1000.0).round() as i64, (coord.y * 1000.0).round() as i64)
}

/// Join lines end to end through nodes shared by exactly two line ends
///
/// Lines are reversed as needed. Nodes where three or more lines meet stay split.
fn stitch(lines: Vec<LineString<f64>>) -> Vec<LineString<f64>> {
    let lines: Vec<Vec<Coord<f64>>> = lines
        .into_iter()
        .map(|l| l.0)
        .filter(|c| c.len() >= 2)
        .collect();

    let mut ends: HashMap<NodeKey, SmallVec<[usize; 2]>> = HashMap::new();
    for (i, coords) in lines.iter().enumerate() {
        ends.entry(node_key(coords[0])).or_default().push(i);
        ends.entry(node_key(coords[coords.len() - 1]))
            .or_default()
            .push(i);
    }

    let next_at = |key: NodeKey, used: &[bool]| -> Option<usize> {
        let touching = ends.get(&key)?;
        if touching.len() != 2 {
            return None;
        }
        touching.iter().copied().find(|&j| !used[j])
    };

    let mut used = vec![false; lines.len()];
    let mut result = Vec::new();
    for start in 0..lines.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut coords = lines[start].clone();

        // Extend forward from the last coordinate
        while let Some(j) = next_at(node_key(coords[coords.len() - 1]), &used) {
            used[j] = true;
            let mut next = lines[j].clone();
            if node_key(next[0]) != node_key(coords[coords.len() - 1]) {
                next.reverse();
            }
            coords.extend(next.into_iter().skip(1));
        }

        // Extend backward from the first coordinate
        while let Some(j) = next_at(node_key(coords[0]), &used) {
            used[j] = true;
            let mut prev = lines[j].clone();
            if node_key(prev[prev.len() - 1]) != node_key(coords[0]) {
                prev.reverse();
            }
            prev.pop();
            prev.extend(coords);
            coords = prev;
        }

        result.push(LineString::new(coords));
    }
    result
}

/// Split a line into the runs of consecutive segments touching `clip`
fn clip_to_runs(line: &LineString<f64>, clip: Rect<f64>) -> Vec<LineString<f64>> {
    let mut runs = Vec::new();
    let mut current: Vec<Coord<f64>> = Vec::new();

    for segment in line.lines() {
        if segment.intersects(&clip) {
            if current.is_empty() {
                current.push(segment.start);
            }
            current.push(segment.end);
        } else if !current.is_empty() {
            runs.push(LineString::new(std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        runs.push(LineString::new(current));
    }
    runs
}

#[inline]
fn planar_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment: Line<f64>| segment.dx().hypot(segment.dy()))
        .sum()
}
