//! Reference run: Anabar river at Saskylakh (GRDC 2999150), 1950 through 2023.
//!
//! Usage: `cargo run --example anabar_saskylakh -- <basins.geojson> <era5_land_extract.csv.gz url>`
//!
//! The extract is a gzipped long-format CSV (`date,lon,lat,<band>...`) covering the
//! basin; it is cached as parquet after the first download.

use era5_basin::{
    CatalogLoader, DateRange, Era5Error, Era5LandPipeline, GeoJsonFeatureCatalog, GridSpec,
    JobStatus, LocalCsvSink, LonLat, QueryParameters,
};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Era5Error> {
    let mut args = env::args().skip(1);
    let (Some(basins_path), Some(extract_url)) = (args.next(), args.next()) else {
        eprintln!("usage: anabar_saskylakh <basins.geojson> <era5_land_extract.csv.gz url>");
        return Ok(());
    };

    let params = QueryParameters::builder()
        .river("Anabar")
        .station("Saskylakh")
        .gauge_id(2999150u64)
        .station_point(LonLat(114.08, 71.97))
        .dates(DateRange::parse("1950-01-01", "2024-01-01")?)
        .build()?;

    let basins = GeoJsonFeatureCatalog::from_path(&basins_path).await?;
    let images = CatalogLoader::with_default_cache_dir()?
        .load_catalog(&extract_url, "anabar_era5_land_daily", GridSpec::era5_land())
        .await?;
    let sink = LocalCsvSink::with_default_root().unwrap_or_else(|| LocalCsvSink::new("exports"));

    let pipeline = Era5LandPipeline::new(params, &basins, &images, &sink);
    let jobs = pipeline.run()?;
    println!("Submitted {} and {}", jobs.station.id(), jobs.basin.id());

    for job in [&jobs.station, &jobs.basin] {
        match sink.wait(&job.id()).await {
            Some(JobStatus::Completed { path, rows }) => {
                println!("{}: {} rows written to {}", job.description(), rows, path.display())
            }
            other => println!("{}: {:?}", job.description(), other),
        }
    }
    Ok(())
}
