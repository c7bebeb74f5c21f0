//! Tile line features and their attribute values

use geo::LineString;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single attribute value of a tile feature
///
/// A null attribute is represented by the key being absent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    String(String),
}

impl AttrValue {
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_owned())
    }
}

/// Feature attributes, ordered by key for stable output
pub type Attributes = BTreeMap<String, AttrValue>;

/// A line feature emitted into a tile layer
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileFeature {
    /// Line geometry in Web Mercator meters
    pub geometry: LineString<f64>,
    pub attributes: Attributes,
    /// Lowest zoom at which the feature is emitted
    pub min_zoom: u8,
    /// Features smaller than this many pixels are dropped at their minimum zoom
    pub min_pixel_size: f64,
    /// Extra pixels rendered beyond the tile edge
    pub buffer_pixels: f64,
}

impl TileFeature {
    pub fn new(geometry: LineString<f64>) -> Self {
        Self {
            geometry,
            attributes: Attributes::new(),
            min_zoom: 0,
            min_pixel_size: 1.0,
            buffer_pixels: 0.0,
        }
    }

    /// Set an attribute, or remove it when `value` is `None`
    pub fn set_attr(&mut self, key: &str, value: Option<impl Into<AttrValue>>) -> &mut Self {
        match value {
            Some(v) => {
                self.attributes.insert(key.to_owned(), v.into());
            }
            None => {
                self.attributes.remove(key);
            }
        }
        self
    }

    #[inline]
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    #[inline]
    pub fn has_attr(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }
}
