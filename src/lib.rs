//! Extract ERA5-Land daily series at a river gauge and over its drainage basin.
//!
//! A run resolves the gauge's basin polygon from a [`FeatureCatalog`], samples the
//! station point with [`Reducer::First`], sums the basin with [`Reducer::Sum`], prefixes
//! both sets of columns and hands the two tables to a [`TableSink`] as background jobs.

mod basin;
mod error;
mod export;
mod pipeline;
mod series;
mod types;
mod utils;

pub use error::Era5Error;
pub use pipeline::*;

pub use types::date_range::{DatePeriod, DateRange, Year};
pub use types::error::ParameterError;
pub use types::geometry::{Bounds, Geometry, LonLat, Polygon};
pub use types::parameters::*;
pub use types::variable::{Era5LandVariable, ERA5_LAND_DAILY};

pub use basin::error::{CatalogError, ResolveError};
pub use basin::feature_catalog::{Feature, FeatureCatalog, GeoJsonFeatureCatalog};
pub use basin::resolver::{resolve_basin, BasinResolver, DEFAULT_GAUGE_PROPERTY};

pub use series::catalog::{GridCatalog, ImageCatalog};
pub use series::error::ExtractError;
pub use series::grid::{Cell, GridSpec};
pub use series::loader::CatalogLoader;
pub use series::query::{Reducer, SeriesQuery, DEFAULT_MAX_PIXELS};
pub use series::rename::{rename, renamed_columns};

pub use export::error::ExportError;
pub use export::local_csv::LocalCsvSink;
pub use export::sink::{ExportTable, JobHandle, JobId, JobStatus, TableFormat, TableSink};

pub use utils::{get_cache_dir, get_export_dir};
