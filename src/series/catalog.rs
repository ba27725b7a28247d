//! Gridded image catalogs and the per-time-step reductions they evaluate.

use crate::series::error::ExtractError;
use crate::series::grid::{Cell, GridSpec};
use crate::series::query::{Reducer, SeriesQuery};
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;

pub(crate) const DATE_COL: &str = "date";
const LON_COL: &str = "lon";
const LAT_COL: &str = "lat";
const IX_COL: &str = "__ix";
const IY_COL: &str = "__iy";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A collection of dated images that can reduce a geometry at every time step.
pub trait ImageCatalog {
    /// Identifier used in logs and errors.
    fn id(&self) -> &str;

    /// Band names available in the catalog.
    fn variables(&self) -> &[String];

    /// Builds the lazy plan of `query`: one row per time step in its date range, a
    /// `date` column followed by one column per requested variable.
    fn reduce(&self, query: &SeriesQuery) -> Result<LazyFrame, ExtractError>;
}

/// An image catalog stored in long format: one row per (date, cell) with columns
/// `date`, `lon`, `lat` (cell centre) and one column per band.
///
/// Reductions are evaluated at the grid's native resolution. A query's scale only
/// sets how many pixels a [`Reducer::Sum`] is charged against its pixel budget.
#[derive(Clone)]
pub struct GridCatalog {
    id: String,
    grid: GridSpec,
    frame: LazyFrame,
    variables: Vec<String>,
}

impl GridCatalog {
    /// Wraps a long-format frame. `date` may be a `Date`, a `Datetime` or a
    /// `YYYY-MM-DD` string; every column other than `date`, `lon` and `lat` is a band.
    pub fn from_lazyframe(
        id: impl Into<String>,
        grid: GridSpec,
        mut frame: LazyFrame,
    ) -> Result<Self, ExtractError> {
        let id = id.into();
        let schema = frame.collect_schema()?;
        let missing = |column: &str| ExtractError::MissingColumn {
            catalog: id.clone(),
            column: column.to_string(),
        };
        schema.get(LON_COL).ok_or_else(|| missing(LON_COL))?;
        schema.get(LAT_COL).ok_or_else(|| missing(LAT_COL))?;
        let date = match schema.get(DATE_COL).ok_or_else(|| missing(DATE_COL))? {
            DataType::Date => col(DATE_COL),
            DataType::Datetime(..) => col(DATE_COL).cast(DataType::Date),
            DataType::String => col(DATE_COL).str().to_date(StrptimeOptions {
                format: Some(DATE_FORMAT.into()),
                ..Default::default()
            }),
            other => {
                return Err(ExtractError::UnsupportedColumnType {
                    catalog: id,
                    column: DATE_COL.to_string(),
                    dtype: other.to_string(),
                })
            }
        };

        let variables: Vec<String> = schema
            .iter_names()
            .map(|name| name.to_string())
            .filter(|name| ![DATE_COL, LON_COL, LAT_COL].contains(&name.as_str()))
            .collect();

        let frame = frame.with_columns([
            date.alias(DATE_COL),
            cell_index(LON_COL, grid.origin().lon(), grid.resolution_deg()).alias(IX_COL),
            cell_index(LAT_COL, grid.origin().lat(), grid.resolution_deg()).alias(IY_COL),
        ]);

        info!(
            "Opened catalog '{}' with {} band(s) on a {}x{} grid at {} degrees",
            id,
            variables.len(),
            grid.columns(),
            grid.rows(),
            grid.resolution_deg()
        );
        Ok(Self {
            id,
            grid,
            frame,
            variables,
        })
    }

    /// Scans a long-format CSV file with a header row.
    pub fn from_csv(
        id: impl Into<String>,
        grid: GridSpec,
        path: impl AsRef<Path>,
    ) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let frame = LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .map_err(|e| ExtractError::CsvScan(path.to_path_buf(), e))?;
        Self::from_lazyframe(id, grid, frame)
    }

    /// Scans a long-format parquet file.
    pub fn from_parquet(
        id: impl Into<String>,
        grid: GridSpec,
        path: impl AsRef<Path>,
    ) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let frame = LazyFrame::scan_parquet(path, Default::default())
            .map_err(|e| ExtractError::ParquetScan(path.to_path_buf(), e))?;
        Self::from_lazyframe(id, grid, frame)
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Cells the query reduces over and the weight applied to each sum.
    ///
    /// A sum over more pixels than the budget either fails or, in best-effort mode, keeps
    /// one cell per `k` x `k` block of the covered cells and scales the sum by the ratio of
    /// covered to kept cells.
    fn select_cells(&self, query: &SeriesQuery) -> Result<(Vec<Cell>, f64), ExtractError> {
        let cells = self.grid.covered_cells(query.geometry());
        if query.reducer() != Reducer::Sum {
            return Ok((cells, 1.0));
        }

        let pixels = self.grid.pixel_count(cells.len(), query.scale_m());
        if pixels <= query.max_pixels() {
            return Ok((cells, 1.0));
        }
        if !query.best_effort() {
            return Err(ExtractError::PixelBudgetExceeded {
                pixels,
                max_pixels: query.max_pixels(),
            });
        }

        let stride = (pixels as f64 / query.max_pixels() as f64)
            .sqrt()
            .ceil()
            .max(2.0) as i64;
        let sampled = sample_blocks(&cells, stride);
        let weight = cells.len() as f64 / sampled.len().max(1) as f64;
        warn!(
            "Catalog '{}': {} pixels exceed the budget of {}, summing one cell per {}x{} block ({} of {} cells) and scaling by {:.3}",
            self.id,
            pixels,
            query.max_pixels(),
            stride,
            stride,
            sampled.len(),
            cells.len(),
            weight
        );
        Ok((sampled, weight))
    }
}

impl ImageCatalog for GridCatalog {
    fn id(&self) -> &str {
        &self.id
    }

    fn variables(&self) -> &[String] {
        &self.variables
    }

    fn reduce(&self, query: &SeriesQuery) -> Result<LazyFrame, ExtractError> {
        if let Some(unknown) = query
            .variables()
            .iter()
            .find(|v| !self.variables.contains(*v))
        {
            return Err(ExtractError::UnknownVariable {
                variable: unknown.clone(),
                catalog: self.id.clone(),
            });
        }

        let (cells, weight) = self.select_cells(query)?;
        debug!(
            "Catalog '{}': {} over {} cell(s) of a {} for {}",
            self.id,
            query.reducer(),
            cells.len(),
            query.geometry().kind(),
            query.dates()
        );

        let dates = query.dates();
        let in_range = self.frame.clone().filter(
            col(DATE_COL)
                .gt_eq(lit(dates.start()))
                .and(col(DATE_COL).lt(lit(dates.end()))),
        );
        let steps = in_range
            .clone()
            .select([col(DATE_COL)])
            .unique_stable(None, UniqueKeepStrategy::First);

        let (ix, iy): (Vec<i64>, Vec<i64>) = cells.into_iter().unzip();
        let mask = df!(IX_COL => ix, IY_COL => iy)?.lazy();

        let reductions: Vec<Expr> = query
            .variables()
            .iter()
            .map(|v| reduction(v, query.reducer(), weight))
            .collect();
        let reduced = in_range
            .join(
                mask,
                [col(IX_COL), col(IY_COL)],
                [col(IX_COL), col(IY_COL)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort([DATE_COL, IY_COL, IX_COL], SortMultipleOptions::default())
            .group_by([col(DATE_COL)])
            .agg(reductions);

        let mut output = vec![col(DATE_COL).dt().strftime(DATE_FORMAT).alias(DATE_COL)];
        output.extend(query.variables().iter().map(|v| col(v.as_str())));

        Ok(steps
            .left_join(reduced, col(DATE_COL), col(DATE_COL))
            .sort([DATE_COL], SortMultipleOptions::default())
            .select(output))
    }
}

/// First cell, in row-major order, of every `stride` x `stride` block anchored at the
/// covered set's south-west corner. Non-empty whenever `cells` is.
fn sample_blocks(cells: &[Cell], stride: i64) -> Vec<Cell> {
    let Some(min_ix) = cells.iter().map(|(ix, _)| *ix).min() else {
        return Vec::new();
    };
    let min_iy = cells.iter().map(|(_, iy)| *iy).min().unwrap_or(min_ix);
    let mut blocks = HashSet::new();
    cells
        .iter()
        .copied()
        .filter(|(ix, iy)| blocks.insert(((ix - min_ix) / stride, (iy - min_iy) / stride)))
        .collect()
}

fn cell_index(column: &str, origin: f64, resolution: f64) -> Expr {
    ((col(column).cast(DataType::Float64) - lit(origin)) / lit(resolution))
        .floor()
        .cast(DataType::Int64)
}

// Sums over cells without a single valid value stay null instead of becoming zero.
fn reduction(variable: &str, reducer: Reducer, weight: f64) -> Expr {
    let value = col(variable).cast(DataType::Float64);
    match reducer {
        Reducer::First => value.first().alias(variable),
        Reducer::Sum => when(value.clone().count().gt(lit(0)))
            .then(value.sum() * lit(weight))
            .otherwise(lit(NULL).cast(DataType::Float64))
            .alias(variable),
    }
}
