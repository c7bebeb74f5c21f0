//! Performance benchmarks for route-tiles-lib
//!
//! Run with: cargo bench --package route-tiles-lib

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use geo::LineString;
use route_tiles_lib::{Config, OsmRelation, OsmWay, RouteLayer, Tags};

/// Generate a wiggly way with the specified number of nodes
fn generate_way(id: i64, num_points: usize, base_lat: f64, base_lon: f64) -> OsmWay {
    let coords: Vec<(f64, f64)> = (0..num_points)
        .map(|i| {
            let t = i as f64 / num_points as f64;
            let lat = base_lat + t * 0.01 + (t * 50.0).sin() * 0.0001;
            let lon = base_lon + t * 0.01 + (t * 30.0).cos() * 0.0001;
            (lon, lat)
        })
        .collect();
    OsmWay::new(id, LineString::from(coords))
}

/// Generate `num_relations` routes, each made of `ways_per_relation` chained ways
fn generate_dataset(
    num_relations: usize,
    ways_per_relation: usize,
    points_per_way: usize,
) -> (Vec<OsmRelation>, Vec<OsmWay>) {
    let networks = ["icn", "ncn", "rcn", "lcn"];
    let mut relations = Vec::with_capacity(num_relations);
    let mut ways = Vec::with_capacity(num_relations * ways_per_relation);

    for r in 0..num_relations {
        let tags: Tags = [
            ("type", "route"),
            ("route", "bicycle"),
            ("network", networks[r % networks.len()]),
        ]
        .into_iter()
        .collect();

        let first_way = (r * ways_per_relation) as i64;
        let members: Vec<i64> = (first_way..first_way + ways_per_relation as i64).collect();
        for (i, &way_id) in members.iter().enumerate() {
            ways.push(generate_way(
                way_id,
                points_per_way,
                45.0 + (r % 10) as f64 * 0.1,
                5.0 + (r / 10) as f64 * 0.1 + i as f64 * 0.01,
            ));
        }
        relations.push(OsmRelation {
            id: r as i64,
            tags,
            members,
        });
    }
    (relations, ways)
}

fn build_layer(relations: &[OsmRelation]) -> RouteLayer {
    let mut layer = RouteLayer::new(Config::default()).unwrap();
    for relation in relations {
        layer.register_relation(relation);
    }
    layer
}

fn bench_process_ways(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_ways");
    group.sample_size(20);

    let (relations, ways) = generate_dataset(100, 50, 100);
    group.throughput(Throughput::Elements(ways.len() as u64));
    group.bench_function("parallel_100x50", |b| {
        b.iter(|| {
            let layer = build_layer(&relations);
            layer.process_ways_parallel(&ways)
        });
    });

    group.finish();
}

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize");
    group.sample_size(20);

    let (relations, ways) = generate_dataset(100, 50, 100);
    let layer = build_layer(&relations);
    let features = layer.process_ways_parallel(&ways);

    group.throughput(Throughput::Elements(features.len() as u64));
    for zoom in [8u8, 14] {
        group.bench_function(format!("z{zoom}_5k_features"), |b| {
            b.iter(|| layer.finalize_tile(zoom, features.clone()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_process_ways, bench_finalize);

criterion_main!(benches);
