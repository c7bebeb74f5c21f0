//! JSON documents read and written by the command line tool
//!
//! Input coordinates are `[lon, lat]` pairs in WGS84. Output geometry is projected
//! back from Web Mercator to the same `[lon, lat]` form.

use crate::CliError;
use geo::LineString;
use route_tiles_lib::{Attributes, OsmRelation, OsmWay, RunStats, Tags, TileFeature, utils};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Relations and ways of one run
#[derive(Debug, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub relations: Vec<OsmRelation>,
    #[serde(default)]
    pub ways: Vec<WayRecord>,
}

/// A way as stored in the input document
#[derive(Debug, Clone, Deserialize)]
pub struct WayRecord {
    pub id: i64,
    #[serde(default)]
    pub tags: Tags,
    /// Node coordinates as `[lon, lat]`
    pub coordinates: Vec<[f64; 2]>,
}

impl From<WayRecord> for OsmWay {
    fn from(record: WayRecord) -> Self {
        let coordinates: LineString<f64> = record
            .coordinates
            .into_iter()
            .map(|[lon, lat]| (lon, lat))
            .collect();
        OsmWay {
            id: record.id,
            tags: record.tags,
            coordinates,
        }
    }
}

impl Dataset {
    /// Read a dataset from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let file = File::open(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, CliError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Split into relations and ways ready for the route layer
    pub fn into_parts(self) -> (Vec<OsmRelation>, Vec<OsmWay>) {
        let ways = self.ways.into_iter().map(OsmWay::from).collect();
        (self.relations, ways)
    }
}

/// A finalized line feature
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRecord {
    pub min_zoom: u8,
    pub attributes: Attributes,
    /// Line vertices as `[lon, lat]`
    pub coordinates: Vec<[f64; 2]>,
}

impl From<TileFeature> for FeatureRecord {
    fn from(feature: TileFeature) -> Self {
        let coordinates = feature
            .geometry
            .coords()
            .map(|c| {
                let (lat, lon) = utils::mercator_to_wgs84(c.x, c.y);
                [lon, lat]
            })
            .collect();
        FeatureRecord {
            min_zoom: feature.min_zoom,
            attributes: feature.attributes,
            coordinates,
        }
    }
}

/// Features of one zoom level, or of one tile when `tile` is set
#[derive(Debug, Clone, Serialize)]
pub struct ZoomOutput {
    pub zoom: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile: Option<String>,
    pub features: Vec<FeatureRecord>,
}

/// Output document of one run
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub stats: RunStats,
    pub zooms: Vec<ZoomOutput>,
}

impl Output {
    /// Write the document as pretty JSON
    pub fn write_to(&self, writer: impl Write) -> Result<(), CliError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
