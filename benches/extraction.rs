use criterion::{black_box, criterion_group, criterion_main, Criterion};
use era5_basin::{
    DateRange, Geometry, GridCatalog, GridSpec, LonLat, Polygon, Reducer, SeriesQuery,
};
use polars::prelude::*;

const SIDE: usize = 40;
const DAYS: usize = 120;

fn synthetic_catalog() -> GridCatalog {
    let start = DateRange::parse("2020-01-01", "2021-01-01").unwrap().start();
    let mut dates = Vec::with_capacity(SIDE * SIDE * DAYS);
    let mut lons = Vec::with_capacity(SIDE * SIDE * DAYS);
    let mut lats = Vec::with_capacity(SIDE * SIDE * DAYS);
    let mut precip = Vec::with_capacity(SIDE * SIDE * DAYS);
    for (day, date) in start.iter_days().take(DAYS).enumerate() {
        for iy in 0..SIDE {
            for ix in 0..SIDE {
                dates.push(date);
                lons.push(ix as f64 + 0.5);
                lats.push(iy as f64 + 0.5);
                precip.push(((day + ix + iy) % 7) as f64 * 0.001);
            }
        }
    }
    let frame = df!(
        "date" => dates,
        "lon" => lons,
        "lat" => lats,
        "total_precipitation_sum" => precip
    )
    .unwrap()
    .lazy();
    let grid = GridSpec::new(LonLat(0.0, 0.0), 1.0, SIDE as u32, SIDE as u32).unwrap();
    GridCatalog::from_lazyframe("synthetic", grid, frame).unwrap()
}

fn basin() -> Geometry {
    Geometry::Polygon(Polygon::new(
        vec![
            LonLat(2.0, 3.0),
            LonLat(35.0, 5.0),
            LonLat(30.0, 36.0),
            LonLat(4.0, 30.0),
            LonLat(2.0, 3.0),
        ],
        vec![],
    ))
}

fn query(geometry: Geometry, reducer: Reducer, max_pixels: u64) -> SeriesQuery {
    SeriesQuery::builder()
        .geometry(geometry)
        .dates(DateRange::parse("2020-01-01", "2020-04-01").unwrap())
        .variables(vec!["total_precipitation_sum".to_string()])
        .reducer(reducer)
        .scale_m(9000.0)
        .best_effort(true)
        .max_pixels(max_pixels)
        .build()
        .unwrap()
}

fn bench_extraction(c: &mut Criterion) {
    let catalog = synthetic_catalog();
    let station = query(Geometry::Point(LonLat(20.3, 20.7)), Reducer::First, 1);
    let basin_exact = query(basin(), Reducer::Sum, u64::MAX);
    let basin_coarse = query(basin(), Reducer::Sum, 100);

    c.bench_function("station_first", |b| {
        b.iter(|| station.materialize(black_box(&catalog)).unwrap().collect().unwrap())
    });
    c.bench_function("basin_sum", |b| {
        b.iter(|| basin_exact.materialize(black_box(&catalog)).unwrap().collect().unwrap())
    });
    c.bench_function("basin_sum_best_effort", |b| {
        b.iter(|| basin_coarse.materialize(black_box(&catalog)).unwrap().collect().unwrap())
    });
}

criterion_group!(benches, bench_extraction);
criterion_main!(benches);
