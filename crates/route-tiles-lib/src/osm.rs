//! Raw OpenStreetMap elements as handed over by the host reader
//!
//! Coordinates are WGS84 with `x` = longitude and `y` = latitude.

use geo::LineString;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tag set of an OSM element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tags(HashMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of a tag
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of a tag, treating an empty string as missing
    #[inline]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Whether the tag is present with one of the given values
    pub fn has_any(&self, key: &str, values: &[impl AsRef<str>]) -> bool {
        self.get(key)
            .is_some_and(|v| values.iter().any(|candidate| candidate.as_ref() == v))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A relation with the ids of its way members
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OsmRelation {
    pub id: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Tags,
    /// Way members, in relation order
    #[cfg_attr(feature = "serde", serde(default))]
    pub members: Vec<i64>,
}

/// A way with its resolved node coordinates
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OsmWay {
    pub id: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Tags,
    pub coordinates: LineString<f64>,
}

impl OsmWay {
    pub fn new(id: i64, coordinates: LineString<f64>) -> Self {
        Self {
            id,
            tags: Tags::new(),
            coordinates,
        }
    }

    /// A way can be rendered as a line when it has at least two nodes
    #[inline]
    pub fn can_be_line(&self) -> bool {
        self.coordinates.0.len() >= 2
    }
}

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.344;
const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;
const METERS_PER_FOOT: f64 = 0.3048;
const METERS_PER_INCH: f64 = 0.0254;

/// Parse a length tag value into meters
///
/// Plain numbers are meters. Recognised unit suffixes are `m`, `km`, `mi`, `nmi`
/// and `ft`, plus the feet/inches notation `6'` and `6'2"`. A comma is accepted as
/// decimal separator. Anything else yields `None`.
pub fn parse_meters(value: &str) -> Option<f64> {
    let value = value.trim().replace(',', ".");
    if value.is_empty() {
        return None;
    }

    if let Some((feet, rest)) = value.split_once('\'') {
        let feet: f64 = feet.trim().parse().ok()?;
        let rest = rest.trim();
        let inches = if rest.is_empty() {
            0.0
        } else {
            rest.strip_suffix('"')?.trim().parse::<f64>().ok()?
        };
        return finite(feet * METERS_PER_FOOT + inches * METERS_PER_INCH);
    }

    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.parse().ok()?;
    let factor = match unit.trim() {
        "" | "m" => 1.0,
        "km" => METERS_PER_KILOMETER,
        "mi" => METERS_PER_MILE,
        "nmi" => METERS_PER_NAUTICAL_MILE,
        "ft" => METERS_PER_FOOT,
        _ => return None,
    };
    finite(number * factor)
}

#[inline]
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_lookup() {
        let tags: Tags = [("type", "route"), ("name", ""), ("route", "hiking")]
            .into_iter()
            .collect();

        assert_eq!(tags.get("type"), Some("route"));
        assert_eq!(tags.get("name"), Some(""));
        assert_eq!(tags.get_non_empty("name"), None);
        assert!(tags.has_any("route", &["bicycle", "hiking"]));
        assert!(!tags.has_any("route", &["foot"]));
        assert!(!tags.has_any("missing", &["foot"]));
    }

    #[test]
    fn test_parse_meters_plain_and_units() {
        assert_eq!(parse_meters("1200"), Some(1200.0));
        assert_eq!(parse_meters(" 12.5 m"), Some(12.5));
        assert_eq!(parse_meters("3,5 km"), Some(3500.0));
        assert_eq!(parse_meters("2km"), Some(2000.0));
        assert_eq!(parse_meters("1 nmi"), Some(1852.0));
        assert!((parse_meters("1 mi").unwrap() - 1609.344).abs() < 1e-9);
        assert!((parse_meters("10 ft").unwrap() - 3.048).abs() < 1e-9);
    }

    #[test]
    fn test_parse_meters_feet_and_inches() {
        assert!((parse_meters("6'").unwrap() - 1.8288).abs() < 1e-9);
        assert!((parse_meters("6'2\"").unwrap() - 1.8796).abs() < 1e-9);
    }

    #[test]
    fn test_parse_meters_malformed() {
        assert_eq!(parse_meters(""), None);
        assert_eq!(parse_meters("about 5 km"), None);
        assert_eq!(parse_meters("5 parsecs"), None);
        assert_eq!(parse_meters("6'2"), None);
        assert_eq!(parse_meters("NaN"), None);
    }

    #[test]
    fn test_can_be_line() {
        let point = OsmWay::new(1, LineString::from(vec![(0.0, 0.0)]));
        let line = OsmWay::new(2, LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        assert!(!point.can_be_line());
        assert!(line.can_be_line());
    }
}
