use crate::CliError;
use crate::dataset::{Dataset, FeatureRecord, Output, ZoomOutput};
use crate::settings::{Settings, TileId};
use rayon::prelude::*;
use route_tiles_lib::{RouteLayer, TileFeature};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Read the input, build every requested zoom level and write the result
pub fn run(settings: &Settings) -> Result<(), CliError> {
    if let Some(threads) = settings.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let dataset = Dataset::from_path(&settings.input)?;
    let output = build_output(settings, dataset)?;

    match &settings.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            output.write_to(&mut writer)?;
            writer.flush()?;
            tracing::info!("Wrote {} zoom level(s) to {}", output.zooms.len(), path.display());
        }
        None => {
            let mut writer = BufWriter::new(std::io::stdout().lock());
            output.write_to(&mut writer)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Run the route layer over `dataset`
///
/// All ways are processed before any zoom level is finalized.
pub fn build_output(settings: &Settings, dataset: Dataset) -> Result<Output, CliError> {
    let targets = zoom_targets(settings)?;

    let mut layer = RouteLayer::new(settings.to_config())?;
    let (relations, ways) = dataset.into_parts();
    for relation in &relations {
        layer.register_relation(relation);
    }
    tracing::info!(
        "Indexed {} route relation(s) covering {} way(s)",
        layer.stats().route_relations,
        layer.memberships().way_count()
    );

    let features = layer.process_ways_parallel(&ways);

    let zooms = targets
        .into_par_iter()
        .map(|(zoom, tile)| finalize_zoom(&layer, zoom, tile, &features))
        .collect::<Result<Vec<_>, CliError>>()?;

    let stats = layer.stats();
    tracing::info!(
        "Processed {} way(s) into {} feature(s), {} geometry failure(s)",
        stats.ways_processed,
        stats.features_emitted,
        stats.geometry_failures
    );

    Ok(Output { stats, zooms })
}

/// Zoom levels to finalize, each with the tile to clip to if any
fn zoom_targets(settings: &Settings) -> Result<Vec<(u8, Option<TileId>)>, CliError> {
    if let Some(tile) = settings.tile {
        if tile.z > settings.max_zoom {
            return Err(CliError::InvalidArgs(format!(
                "tile {tile} is above max zoom {}",
                settings.max_zoom
            )));
        }
        return Ok(vec![(tile.z, Some(tile))]);
    }
    if settings.min_zoom > settings.max_zoom {
        return Err(CliError::InvalidArgs(format!(
            "min zoom {} is above max zoom {}",
            settings.min_zoom, settings.max_zoom
        )));
    }
    Ok((settings.min_zoom..=settings.max_zoom)
        .map(|zoom| (zoom, None))
        .collect())
}

fn finalize_zoom(
    layer: &RouteLayer,
    zoom: u8,
    tile: Option<TileId>,
    features: &[TileFeature],
) -> Result<ZoomOutput, CliError> {
    let visible: Vec<TileFeature> = features
        .iter()
        .filter(|f| f.min_zoom <= zoom)
        .cloned()
        .collect();
    let input_count = visible.len();

    let merged = match tile {
        Some(t) => layer.finalize_tile_clipped(t.z, t.x, t.y, visible)?,
        None => layer.finalize_tile(zoom, visible),
    };
    tracing::debug!(zoom, "Merged {input_count} feature(s) into {}", merged.len());

    Ok(ZoomOutput {
        zoom,
        tile: tile.map(|t| t.to_string()),
        features: merged.into_iter().map(FeatureRecord::from).collect(),
    })
}
