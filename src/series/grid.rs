//! Regular longitude/latitude grid underlying a gridded image catalog.

use crate::series::error::ExtractError;
use crate::types::geometry::{Geometry, LonLat, METERS_PER_DEGREE};

/// A regular grid of `columns` x `rows` square cells of `resolution_deg` degrees.
///
/// `origin` is the south-west corner of cell `(0, 0)`; cell `(ix, iy)` is centred at
/// `origin + ((ix + 0.5) * res, (iy + 0.5) * res)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    origin: LonLat,
    resolution_deg: f64,
    columns: u32,
    rows: u32,
}

pub type Cell = (i64, i64);

impl GridSpec {
    pub fn new(
        origin: LonLat,
        resolution_deg: f64,
        columns: u32,
        rows: u32,
    ) -> Result<Self, ExtractError> {
        if !(resolution_deg.is_finite() && resolution_deg > 0.0) {
            return Err(ExtractError::InvalidGrid(format!(
                "resolution must be positive, got {}",
                resolution_deg
            )));
        }
        if columns == 0 || rows == 0 {
            return Err(ExtractError::InvalidGrid(format!(
                "grid must have cells, got {}x{}",
                columns, rows
            )));
        }
        Ok(Self {
            origin,
            resolution_deg,
            columns,
            rows,
        })
    }

    /// The global ERA5-Land grid: 0.1 degree cells centred on whole tenths.
    pub fn era5_land() -> Self {
        Self {
            origin: LonLat(-180.05, -90.05),
            resolution_deg: 0.1,
            columns: 3600,
            rows: 1801,
        }
    }

    pub fn origin(&self) -> LonLat {
        self.origin
    }

    pub fn resolution_deg(&self) -> f64 {
        self.resolution_deg
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Nominal cell size in meters (north-south extent).
    pub fn native_scale_m(&self) -> f64 {
        self.resolution_deg * METERS_PER_DEGREE
    }

    pub fn cell_of(&self, p: LonLat) -> Option<Cell> {
        let ix = ((p.lon() - self.origin.lon()) / self.resolution_deg).floor();
        let iy = ((p.lat() - self.origin.lat()) / self.resolution_deg).floor();
        let inside = ix >= 0.0
            && iy >= 0.0
            && ix < f64::from(self.columns)
            && iy < f64::from(self.rows);
        inside.then_some((ix as i64, iy as i64))
    }

    pub fn cell_center(&self, (ix, iy): Cell) -> LonLat {
        LonLat(
            self.origin.lon() + (ix as f64 + 0.5) * self.resolution_deg,
            self.origin.lat() + (iy as f64 + 0.5) * self.resolution_deg,
        )
    }

    /// Cells a geometry touches, in row-major order (south to north, west to east).
    ///
    /// A point covers the cell containing it. An areal geometry covers every cell whose
    /// centre lies inside it.
    pub fn covered_cells(&self, geometry: &Geometry) -> Vec<Cell> {
        if let Geometry::Point(p) = geometry {
            return self.cell_of(*p).into_iter().collect();
        }
        let Some(bounds) = geometry.bounds() else {
            return Vec::new();
        };
        let clamp_x = |v: f64| v.clamp(0.0, f64::from(self.columns) - 1.0) as i64;
        let clamp_y = |v: f64| v.clamp(0.0, f64::from(self.rows) - 1.0) as i64;
        let to_index = |v: f64, o: f64| ((v - o) / self.resolution_deg).floor();
        let (x0, x1) = (
            clamp_x(to_index(bounds.min_lon, self.origin.lon())),
            clamp_x(to_index(bounds.max_lon, self.origin.lon())),
        );
        let (y0, y1) = (
            clamp_y(to_index(bounds.min_lat, self.origin.lat())),
            clamp_y(to_index(bounds.max_lat, self.origin.lat())),
        );

        (y0..=y1)
            .flat_map(|iy| (x0..=x1).map(move |ix| (ix, iy)))
            .filter(|cell| geometry.contains(self.cell_center(*cell)))
            .collect()
    }

    /// Pixels a reduction over `cells` native cells costs at `scale_m`.
    ///
    /// Scales finer than the native resolution cost one pixel per cell.
    pub fn pixel_count(&self, cells: usize, scale_m: f64) -> u64 {
        let ratio = (self.native_scale_m() / scale_m.max(self.native_scale_m())).powi(2);
        (cells as f64 * ratio).ceil() as u64
    }
}
