use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fluvial::{AxialCoord, TerrainGenerator, WorldConfig};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("region-generation");
    group.sample_size(10);

    let config = WorldConfig {
        landform_scale: 0.25,
        region_size: 128,
        ..Default::default()
    };

    group.bench_function("drainage network", |b| {
        b.iter(|| {
            // Fresh generator each time so the cache doesn't hide the build
            let generator = TerrainGenerator::new(config.clone()).unwrap();
            generator.drainage_network(black_box(AxialCoord::new(0, 0)))
        })
    });

    let generator = TerrainGenerator::new(config.clone()).unwrap();
    group.bench_function("region gen", |b| {
        b.iter(|| generator.generate_region(black_box(0), black_box(0)))
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
