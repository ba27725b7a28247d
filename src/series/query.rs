//! Declarative description of a per-time-step spatial reduction.
//!
//! A [`SeriesQuery`] is a plain value: building one performs no work. Calling
//! [`SeriesQuery::materialize`] hands it to an [`ImageCatalog`], which returns a polars
//! lazy plan. Rows are only computed when that plan is collected, typically by an
//! export job.

use crate::series::catalog::ImageCatalog;
use crate::series::error::ExtractError;
use crate::types::date_range::DateRange;
use crate::types::geometry::Geometry;
use bon::bon;
use polars::prelude::LazyFrame;
use std::fmt;

/// Default pixel budget of a reduction when none is given.
pub const DEFAULT_MAX_PIXELS: u64 = 10_000_000;

/// Spatial reducer applied to the cells a geometry covers at each time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reducer {
    /// Value of the first covered cell. Used for point sampling, where a point falls in
    /// exactly one native cell.
    First,
    /// Sum over all covered cells, for flux-like bands conserved under summation.
    Sum,
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::First => write!(f, "first"),
            Reducer::Sum => write!(f, "sum"),
        }
    }
}

/// One extraction: which cells, which bands, which dates and how to reduce them.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuery {
    geometry: Geometry,
    dates: DateRange,
    variables: Vec<String>,
    reducer: Reducer,
    scale_m: f64,
    best_effort: bool,
    max_pixels: u64,
}

#[bon]
impl SeriesQuery {
    /// Builds a query.
    ///
    /// * `.geometry(Geometry)`: **Required.** Point or polygon to reduce over.
    /// * `.dates(DateRange)`: **Required.** Half-open range of time steps.
    /// * `.variables(Vec<String>)`: **Required.** Ordered, non-empty band list.
    /// * `.reducer(Reducer)`: **Required.**
    /// * `.scale_m(f64)`: **Required.** Nominal resolution in meters.
    /// * `.best_effort(bool)`: Optional, defaults to `false`. Only affects [`Reducer::Sum`].
    /// * `.max_pixels(u64)`: Optional, defaults to [`DEFAULT_MAX_PIXELS`]. Only affects [`Reducer::Sum`].
    ///
    /// # Errors
    ///
    /// [`ExtractError::EmptyVariables`], [`ExtractError::InvalidScale`] or
    /// [`ExtractError::EmptyGeometry`] for unusable inputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use era5_basin::{DateRange, Geometry, LonLat, Reducer, SeriesQuery};
    ///
    /// let query = SeriesQuery::builder()
    ///     .geometry(Geometry::Point(LonLat(114.08, 71.97)))
    ///     .dates(DateRange::parse("2020-01-01", "2020-01-03").unwrap())
    ///     .variables(vec!["temperature_2m".to_string()])
    ///     .reducer(Reducer::First)
    ///     .scale_m(1000.0)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(query.reducer(), Reducer::First);
    /// assert!(!query.best_effort());
    /// ```
    #[builder]
    pub fn new(
        geometry: Geometry,
        dates: DateRange,
        variables: Vec<String>,
        reducer: Reducer,
        scale_m: f64,
        best_effort: Option<bool>,
        max_pixels: Option<u64>,
    ) -> Result<Self, ExtractError> {
        if variables.is_empty() {
            return Err(ExtractError::EmptyVariables);
        }
        if !(scale_m.is_finite() && scale_m > 0.0) {
            return Err(ExtractError::InvalidScale(scale_m));
        }
        if geometry.is_empty() {
            return Err(ExtractError::EmptyGeometry(geometry.kind()));
        }
        Ok(Self {
            geometry,
            dates,
            variables,
            reducer,
            scale_m,
            best_effort: best_effort.unwrap_or(false),
            max_pixels: max_pixels.unwrap_or(DEFAULT_MAX_PIXELS),
        })
    }
}

impl SeriesQuery {
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn dates(&self) -> DateRange {
        self.dates
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }

    pub fn scale_m(&self) -> f64 {
        self.scale_m
    }

    pub fn best_effort(&self) -> bool {
        self.best_effort
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    /// Turns the description into a lazy plan against `catalog`.
    ///
    /// The resulting frame has a `date` column (`YYYY-MM-DD`) followed by one `Float64`
    /// column per variable, one row per time step in the date range.
    pub fn materialize<C: ImageCatalog + ?Sized>(
        &self,
        catalog: &C,
    ) -> Result<LazyFrame, ExtractError> {
        catalog.reduce(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::geometry::{LonLat, Polygon};

    fn dates() -> DateRange {
        DateRange::parse("2020-01-01", "2020-01-03").unwrap()
    }

    #[test]
    fn test_defaults() -> Result<(), ExtractError> {
        let q = SeriesQuery::builder()
            .geometry(Geometry::Point(LonLat(1.0, 1.0)))
            .dates(dates())
            .variables(vec!["total_precipitation_sum".into()])
            .reducer(Reducer::Sum)
            .scale_m(9000.0)
            .build()?;
        assert!(!q.best_effort());
        assert_eq!(q.max_pixels(), DEFAULT_MAX_PIXELS);
        assert_eq!(q.reducer().to_string(), "sum");
        Ok(())
    }

    #[test]
    fn test_rejects_unusable_inputs() {
        let empty_vars = SeriesQuery::builder()
            .geometry(Geometry::Point(LonLat(1.0, 1.0)))
            .dates(dates())
            .variables(vec![])
            .reducer(Reducer::First)
            .scale_m(1000.0)
            .build();
        assert!(matches!(empty_vars, Err(ExtractError::EmptyVariables)));

        let bad_scale = SeriesQuery::builder()
            .geometry(Geometry::Point(LonLat(1.0, 1.0)))
            .dates(dates())
            .variables(vec!["temperature_2m".into()])
            .reducer(Reducer::First)
            .scale_m(-1.0)
            .build();
        assert!(matches!(bad_scale, Err(ExtractError::InvalidScale(_))));

        let empty_polygon = SeriesQuery::builder()
            .geometry(Geometry::Polygon(Polygon::new(vec![], vec![])))
            .dates(dates())
            .variables(vec!["temperature_2m".into()])
            .reducer(Reducer::Sum)
            .scale_m(1000.0)
            .build();
        assert!(matches!(
            empty_polygon,
            Err(ExtractError::EmptyGeometry("Polygon"))
        ));
    }

    #[test]
    fn test_identical_queries_compare_equal() -> Result<(), ExtractError> {
        let build = || {
            SeriesQuery::builder()
                .geometry(Geometry::Point(LonLat(1.0, 1.0)))
                .dates(dates())
                .variables(vec!["temperature_2m".into()])
                .reducer(Reducer::First)
                .scale_m(1000.0)
                .build()
        };
        assert_eq!(build()?, build()?);
        Ok(())
    }
}
