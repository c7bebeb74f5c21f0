//! Per-tile reconciliation of relation aggregates
//!
//! Once every way has been observed, each tile's features are joined back to their
//! relation through the `osmid` attribute: the aggregated extent is attached and a
//! missing distance is filled in from the computed estimate. The features are then
//! handed to the [`LineMerger`].

use crate::{Attributes, LineMerger, MergeOptions, RelationAccumulator, TileFeature};
use geo::Rect;

/// Fixed settings of the merge pass
#[derive(Debug, Clone, Copy)]
pub struct FinalizeSettings {
    /// Simplification tolerance at this zoom, in pixels
    pub tolerance_px: f64,
    /// Scale applied to `tolerance_px` before merging
    pub tolerance_factor: f64,
    /// Margin around the tile in pixels
    pub buffer_px: f64,
}

/// Fill in `extent` and fallback `distance` from the accumulator
///
/// Features without an `osmid`, or whose relation was never observed, are left as is.
/// An existing `distance` is never overwritten.
pub fn reconcile_attributes(accumulator: &RelationAccumulator, features: &mut [TileFeature]) {
    for feature in features.iter_mut() {
        let Some(relation_id) = feature.attr("osmid").and_then(|v| v.as_i64()) else {
            continue;
        };
        let Some(aggregate) = accumulator.get(relation_id) else {
            continue;
        };

        if let Some(extent) = aggregate.formatted_extent() {
            feature.set_attr("extent", Some(extent));
        }
        if !feature.has_attr("distance") {
            feature.set_attr("distance", aggregate.rounded_distance());
        }
    }
}

/// Reconcile attributes, then merge the tile's lines
///
/// Every feature gets the same merge weight, so no line is dropped for being short.
pub fn finalize_tile(
    accumulator: &RelationAccumulator,
    merger: &dyn LineMerger,
    settings: FinalizeSettings,
    zoom: u8,
    tile_bounds: Option<Rect<f64>>,
    mut features: Vec<TileFeature>,
) -> Vec<TileFeature> {
    #[cfg(feature = "profiling")]
    profiling::scope!("finalizer::finalize_tile");

    reconcile_attributes(accumulator, &mut features);

    let equal_weight = |_: &Attributes| 0.0;
    let options = MergeOptions {
        zoom,
        tolerance_px: settings.tolerance_px * settings.tolerance_factor,
        buffer_px: settings.buffer_px,
        min_length_px: &equal_weight,
        tile_bounds,
    };
    merger.merge(features, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttrValue, GeoLineMerger, utils};
    use geo::{Coord, LineString};
    use std::sync::Mutex;

    fn feature(osmid: Option<i64>, distance: Option<i64>) -> TileFeature {
        let mut f = TileFeature::new(LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]));
        f.set_attr("osmid", osmid).set_attr("distance", distance);
        f
    }

    fn envelope() -> Rect<f64> {
        let sw = utils::wgs84_to_mercator(10.0, 20.0);
        let ne = utils::wgs84_to_mercator(11.0, 21.5);
        Rect::new(sw.0, ne.0)
    }

    fn settings() -> FinalizeSettings {
        FinalizeSettings {
            tolerance_px: 0.1,
            tolerance_factor: 0.8,
            buffer_px: 4.0,
        }
    }

    #[test]
    fn test_reconcile_fills_extent_and_distance() {
        let acc = RelationAccumulator::new();
        acc.observe(1, 4499.7, envelope(), false);

        let mut features = vec![feature(Some(1), None)];
        reconcile_attributes(&acc, &mut features);

        assert_eq!(features[0].attr("distance"), Some(&AttrValue::Int(4500)));
        assert_eq!(
            features[0].attr("extent"),
            Some(&AttrValue::from("[20.000,10.000,21.500,11.000]"))
        );
    }

    #[test]
    fn test_reconcile_keeps_tagged_distance() {
        let acc = RelationAccumulator::new();
        acc.observe(1, 500.0, envelope(), false);

        let mut features = vec![feature(Some(1), Some(10_000))];
        reconcile_attributes(&acc, &mut features);
        assert_eq!(features[0].attr("distance"), Some(&AttrValue::Int(10_000)));
    }

    #[test]
    fn test_reconcile_zero_distance_stays_null() {
        let acc = RelationAccumulator::new();
        acc.observe(1, 0.3, envelope(), false);

        let mut features = vec![feature(Some(1), None)];
        reconcile_attributes(&acc, &mut features);
        assert!(!features[0].has_attr("distance"));
        assert!(features[0].has_attr("extent"));
    }

    #[test]
    fn test_reconcile_unknown_relation_is_noop() {
        let acc = RelationAccumulator::new();
        acc.observe(1, 100.0, envelope(), false);

        let mut features = vec![feature(Some(2), None), feature(None, None)];
        let before = features.clone();
        reconcile_attributes(&acc, &mut features);
        assert_eq!(features, before);
    }

    /// Records the options it was called with and returns the input unchanged
    struct RecordingMerger {
        seen: Mutex<Vec<(u8, f64, f64, f64, usize)>>,
    }

    impl LineMerger for RecordingMerger {
        fn merge(&self, features: Vec<TileFeature>, options: &MergeOptions<'_>) -> Vec<TileFeature> {
            let weight = features
                .first()
                .map_or(0.0, |f| (options.min_length_px)(&f.attributes));
            self.seen.lock().unwrap().push((
                options.zoom,
                options.tolerance_px,
                options.buffer_px,
                weight,
                features.len(),
            ));
            features
        }
    }

    #[test]
    fn test_finalize_invokes_merger_with_scaled_tolerance() {
        let acc = RelationAccumulator::new();
        let merger = RecordingMerger {
            seen: Mutex::new(Vec::new()),
        };

        let out = finalize_tile(
            &acc,
            &merger,
            settings(),
            12,
            None,
            vec![feature(Some(1), None), feature(Some(2), None)],
        );

        assert_eq!(out.len(), 2);
        let seen = merger.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (zoom, tolerance, buffer, weight, count) = seen[0];
        assert_eq!(zoom, 12);
        assert!((tolerance - 0.08).abs() < 1e-12);
        assert_eq!(buffer, 4.0);
        assert_eq!(weight, 0.0);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_finalize_twice_is_stable() {
        let acc = RelationAccumulator::new();
        acc.observe(1, 1234.4, envelope(), false);

        let mut first_input = feature(Some(1), None);
        first_input.geometry = LineString::new(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 500.0, y: 0.0 },
        ]);

        let once = finalize_tile(&acc, &GeoLineMerger, settings(), 14, None, vec![first_input]);
        let twice = finalize_tile(&acc, &GeoLineMerger, settings(), 14, None, once.clone());

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.attributes, b.attributes);
        }
        assert_eq!(once[0].attr("distance"), Some(&AttrValue::Int(1234)));
    }
}
