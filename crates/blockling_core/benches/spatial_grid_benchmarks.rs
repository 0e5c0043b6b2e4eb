use blockling_core::spatial_grid::SpatialGrid;
use blockling_data::Vec3;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn lattice_positions(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let x = (i % 10) as f64 * 2.0;
            let y = ((i / 10) % 10) as f64 * 2.0;
            let z = (i / 100) as f64 * 2.0;
            Vec3::new(x, y, z)
        })
        .collect()
}

fn bench_grid_build(c: &mut Criterion) {
    let positions = lattice_positions(1000);

    c.bench_function("spatial_grid_build_1000", |b| {
        b.iter(|| black_box(SpatialGrid::from_positions(&positions, 2.0)))
    });
}

fn bench_grid_neighbors(c: &mut Criterion) {
    let positions = lattice_positions(1000);
    let grid = SpatialGrid::from_positions(&positions, 2.0).unwrap();

    c.bench_function("spatial_grid_neighbors_1000", |b| {
        b.iter(|| {
            let mut total = 0;
            for idx in 0..positions.len() {
                grid.for_each_neighbor(idx, |_| total += 1);
            }
            black_box(total)
        })
    });
}

fn bench_grid_query(c: &mut Criterion) {
    let positions = lattice_positions(1000);
    let grid = SpatialGrid::from_positions(&positions, 2.0).unwrap();

    c.bench_function("spatial_grid_query_radius_4", |b| {
        let mut results = Vec::new();
        b.iter(|| {
            grid.query_into(Vec3::splat(9.0), 4.0, &mut results);
            black_box(results.len())
        })
    });
}

criterion_group!(benches, bench_grid_build, bench_grid_neighbors, bench_grid_query);
criterion_main!(benches);
