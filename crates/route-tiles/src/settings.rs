use clap::Parser;
use route_tiles_lib::Config;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Route Tiles - Builds merged hiking and cycling route lines for vector tiles
pub struct Settings {
    /// JSON dataset with route relations and their member ways
    #[clap(value_name = "FILE")]
    pub input: PathBuf,

    /// Where to write the resulting features (stdout when omitted)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Lowest zoom level to finalize
    #[clap(long, default_value = "5")]
    pub min_zoom: u8,

    /// Highest zoom level of the tileset
    #[clap(long, default_value = "14")]
    pub max_zoom: u8,

    /// Only finalize this tile, clipping lines to it (format: z/x/y)
    #[clap(long, value_name = "Z/X/Y")]
    pub tile: Option<TileId>,

    /// Route kinds to include, comma separated
    #[clap(long, value_delimiter = ',', default_value = "bicycle,hiking,foot")]
    pub route_kinds: Vec<String>,

    /// Simplification tolerance in pixels below the max zoom
    #[clap(long, default_value = "0.1")]
    pub simplify_tolerance: f64,

    /// Simplification tolerance in pixels at the max zoom
    #[clap(long, default_value = "0.0625")]
    pub simplify_tolerance_at_max_zoom: f64,

    /// Scale applied to the simplification tolerance when merging lines
    #[clap(long, default_value = "0.8")]
    pub merge_tolerance_factor: f64,

    /// Margin kept around each tile in pixels
    #[clap(long, default_value = "4.0")]
    pub buffer_pixels: f64,

    /// Worker threads for way processing (all cores when omitted)
    #[clap(short = 'j', long)]
    pub threads: Option<usize>,
}

impl Settings {
    /// Parse settings from the process arguments, exiting on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Route layer configuration described by these settings
    pub fn to_config(&self) -> Config {
        Config {
            route_kinds: self.route_kinds.clone(),
            max_zoom: self.max_zoom,
            simplify_tolerance: self.simplify_tolerance,
            simplify_tolerance_at_max_zoom: self.simplify_tolerance_at_max_zoom,
            merge_tolerance_factor: self.merge_tolerance_factor,
            buffer_pixels: self.buffer_pixels,
        }
    }
}

/// Tile address in the `z/x/y` scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl FromStr for TileId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        let [z, x, y] = parts.as_slice() else {
            return Err(format!("expected z/x/y, got '{s}'"));
        };
        let z = z.parse().map_err(|e| format!("invalid zoom '{z}': {e}"))?;
        let x = x.parse().map_err(|e| format!("invalid column '{x}': {e}"))?;
        let y = y.parse().map_err(|e| format!("invalid row '{y}': {e}"))?;
        Ok(TileId { z, x, y })
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
