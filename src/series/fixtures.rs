//! Small in-memory catalog shared by the extraction and pipeline tests.

use crate::series::catalog::GridCatalog;
use crate::series::error::ExtractError;
use crate::series::grid::GridSpec;
use crate::types::geometry::{Geometry, LonLat, Polygon};
use polars::prelude::*;

/// 10x10 grid of one-degree cells anchored at the origin.
pub(crate) fn unit_grid() -> GridSpec {
    GridSpec::new(LonLat(0.0, 0.0), 1.0, 10, 10).unwrap()
}

/// Square covering cells (1, 1), (2, 1), (1, 2) and (2, 2) of [`unit_grid`].
pub(crate) fn basin_polygon() -> Geometry {
    Geometry::Polygon(Polygon::new(
        vec![
            LonLat(1.0, 1.0),
            LonLat(3.0, 1.0),
            LonLat(3.0, 3.0),
            LonLat(1.0, 3.0),
            LonLat(1.0, 1.0),
        ],
        vec![],
    ))
}

/// Two in-range days over the four basin cells plus one day outside 2020-01-01..03.
/// Cell (2, 1) has no precipitation on 2020-01-02.
pub(crate) fn test_catalog() -> Result<GridCatalog, ExtractError> {
    let frame = df!(
        "date" => [
            "2020-01-01", "2020-01-01", "2020-01-01", "2020-01-01",
            "2020-01-02", "2020-01-02", "2020-01-02", "2020-01-02",
            "2020-01-05",
        ],
        "lon" => [1.5, 2.5, 1.5, 2.5, 1.5, 2.5, 1.5, 2.5, 1.5],
        "lat" => [1.5, 1.5, 2.5, 2.5, 1.5, 1.5, 2.5, 2.5, 1.5],
        "temperature_2m" => [11.0, 21.0, 12.0, 22.0, 111.0, 121.0, 112.0, 122.0, 511.0],
        "total_precipitation_sum" => [
            Some(1.0), Some(1.0), Some(1.0), Some(1.0),
            Some(1.0), None, Some(1.0), Some(1.0),
            Some(9.0),
        ]
    )?
    .lazy();
    GridCatalog::from_lazyframe("test_grid", unit_grid(), frame)
}
