//! Utility functions for coordinate conversions, measurement and tile math

use crate::{Result, RouteError};
use geo::{Coord, LineString, Point, Rect};

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;
pub const EARTH_SIZE_METERS: f64 = EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Mean Earth radius in meters used for great-circle lengths
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Width of a tile in pixels, the unit in which tolerances are expressed
pub const TILE_SIZE_PX: f64 = 256.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// # Arguments
/// * `lat` - Latitude in degrees (-85.05 to 85.05)
/// * `lon` - Longitude in degrees (-180 to 180)
///
/// # Returns
/// A `Point<f64>` with x (easting) and y (northing) in meters
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    // Clamp latitude to valid Web Mercator range
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;

    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters to WGS84 (lat, lon)
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    (lat, lon)
}

/// Check if a lon/lat coordinate is usable for measurement
#[inline(always)]
pub fn is_finite_coord(coord: &Coord<f64>) -> bool {
    coord.x.is_finite() && coord.y.is_finite()
}

/// Project a lon/lat line into Web Mercator meters, skipping non-finite coordinates
pub fn line_to_mercator(line: &LineString<f64>) -> LineString<f64> {
    line.coords()
        .filter(|c| is_finite_coord(c))
        .map(|c| wgs84_to_mercator(c.y, c.x).0)
        .collect()
}

/// Bounding rectangle of a lon/lat line in Web Mercator meters
///
/// Only finite coordinates are considered. Returns `None` when there are none.
pub fn mercator_envelope(line: &LineString<f64>) -> Option<Rect<f64>> {
    line.coords()
        .filter(|c| is_finite_coord(c))
        .map(|c| {
            let p = wgs84_to_mercator(c.y, c.x);
            Rect::new(p.0, p.0)
        })
        .reduce(union_rect)
}

/// Smallest rectangle containing both inputs
#[inline]
pub fn union_rect(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Great-circle length of a lon/lat line in meters
///
/// Fails when the line has fewer than two coordinates or contains a non-finite one.
pub fn haversine_length(way_id: i64, line: &LineString<f64>) -> Result<f64> {
    if line.0.len() < 2 {
        return Err(RouteError::InvalidGeometry {
            way_id,
            reason: format!("{} coordinate(s), need at least 2", line.0.len()),
        });
    }
    if let Some(bad) = line.coords().find(|c| !is_finite_coord(c)) {
        return Err(RouteError::InvalidGeometry {
            way_id,
            reason: format!("non-finite coordinate ({}, {})", bad.x, bad.y),
        });
    }

    Ok(line
        .0
        .windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]))
        .sum())
}

/// Calculate the Haversine distance between two lon/lat coordinates in meters
#[inline]
pub fn haversine_distance(p1: Coord<f64>, p2: Coord<f64>) -> f64 {
    let lat1 = p1.y.to_radians();
    let lat2 = p2.y.to_radians();
    let delta_lat = (p2.y - p1.y).to_radians();
    let delta_lon = (p2.x - p1.x).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Size of one tile pixel in Web Mercator meters at the given zoom
#[inline]
pub fn meters_per_pixel(zoom: u8) -> f64 {
    EARTH_SIZE_METERS / (TILE_SIZE_PX * f64::from(1u32 << zoom.min(31)))
}

/// Web Mercator bounds of the tile `z/x/y` (XYZ scheme, y grows southwards)
pub fn tile_bounds(z: u8, x: u32, y: u32) -> Result<Rect<f64>> {
    let tiles = 1u64 << z.min(31);
    if z > 31 || u64::from(x) >= tiles || u64::from(y) >= tiles {
        return Err(RouteError::InvalidTile { z, x, y });
    }
    let size = EARTH_SIZE_METERS / tiles as f64;
    let min_x = EARTH_MERCATOR_MIN + f64::from(x) * size;
    let max_y = EARTH_MERCATOR_MAX - f64::from(y) * size;
    Ok(Rect::new(
        Coord { x: min_x, y: max_y - size },
        Coord { x: min_x + size, y: max_y },
    ))
}

/// Round to three decimals without producing a negative zero
#[inline]
pub fn round3(value: f64) -> f64 {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_to_mercator_origin() {
        let point = wgs84_to_mercator(0.0, 0.0);
        assert!((point.x() - 0.0).abs() < 0.01);
        assert!((point.y() - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_mercator_to_wgs84_roundtrip() {
        let lat = 51.5074;
        let lon = -0.1278;

        let mercator = wgs84_to_mercator(lat, lon);
        let (lat2, lon2) = mercator_to_wgs84(mercator.x(), mercator.y());

        assert!((lat - lat2).abs() < 0.0001);
        assert!((lon - lon2).abs() < 0.0001);
    }

    #[test]
    fn test_haversine_length_along_equator() {
        // One degree of longitude on the equator
        let line = LineString::from(vec![(0.0, 0.0), (0.5, 0.0), (1.0, 0.0)]);
        let length = haversine_length(1, &line).unwrap();
        let expected = EARTH_RADIUS_M * 1f64.to_radians();
        assert!((length - expected).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_length_rejects_bad_geometry() {
        let single = LineString::from(vec![(0.0, 0.0)]);
        assert!(haversine_length(1, &single).is_err());

        let nan = LineString::from(vec![(0.0, 0.0), (f64::NAN, 1.0)]);
        match haversine_length(9, &nan) {
            Err(RouteError::InvalidGeometry { way_id, .. }) => assert_eq!(way_id, 9),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_mercator_envelope_skips_non_finite() {
        let line = LineString::from(vec![(1.0, 1.0), (f64::NAN, 5.0), (2.0, 2.0)]);
        let env = mercator_envelope(&line).unwrap();
        let min = wgs84_to_mercator(1.0, 1.0);
        let max = wgs84_to_mercator(2.0, 2.0);
        assert!((env.min().x - min.x()).abs() < 1e-6);
        assert!((env.max().y - max.y()).abs() < 1e-6);

        let empty = LineString::from(vec![(f64::NAN, f64::NAN)]);
        assert!(mercator_envelope(&empty).is_none());
    }

    #[test]
    fn test_union_rect() {
        let a = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let b = Rect::new(Coord { x: -1.0, y: 0.5 }, Coord { x: 0.5, y: 3.0 });
        let u = union_rect(a, b);
        assert_eq!(u.min(), Coord { x: -1.0, y: 0.0 });
        assert_eq!(u.max(), Coord { x: 1.0, y: 3.0 });
    }

    #[test]
    fn test_meters_per_pixel_halves_per_zoom() {
        let z0 = meters_per_pixel(0);
        let z1 = meters_per_pixel(1);
        assert!((z0 - EARTH_SIZE_METERS / 256.0).abs() < 1e-6);
        assert!((z0 / z1 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tile_bounds() {
        let world = tile_bounds(0, 0, 0).unwrap();
        assert!((world.min().x - EARTH_MERCATOR_MIN).abs() < 1e-6);
        assert!((world.max().y - EARTH_MERCATOR_MAX).abs() < 1e-6);

        let north_west = tile_bounds(1, 0, 0).unwrap();
        assert!((north_west.max().x - 0.0).abs() < 1e-6);
        assert!((north_west.min().y - 0.0).abs() < 1e-6);

        assert!(tile_bounds(1, 2, 0).is_err());
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(-0.0001), 0.0);
        assert!(round3(-0.0001).is_sign_positive());
    }
}
