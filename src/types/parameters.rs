//! The immutable parameter block describing one station/basin extraction run.

use crate::types::date_range::DateRange;
use crate::types::error::ParameterError;
use crate::types::geometry::LonLat;
use crate::types::variable::Era5LandVariable;
use bon::bon;
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_STATION_PREFIX: &str = "p1_";
pub const DEFAULT_BASIN_PREFIX: &str = "basin_";
pub const DEFAULT_FOLDER: &str = "GEE";
pub const DEFAULT_SIMPLIFY_TOLERANCE_M: f64 = 1000.0;
pub const DEFAULT_STATION_SCALE_M: f64 = 1000.0;
pub const DEFAULT_BASIN_SCALE_M: f64 = 9000.0;
pub const DEFAULT_BASIN_MAX_PIXELS: u64 = 10_000_000_000_000;

/// Opaque key of a gauge in the basin feature catalog (e.g. a GRDC number).
///
/// ```
/// use era5_basin::GaugeId;
///
/// assert_eq!(GaugeId::from(2999150u64), GaugeId::from("2999150"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GaugeId(String);

impl GaugeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GaugeId {
    fn from(value: &str) -> Self {
        GaugeId(value.to_string())
    }
}

impl From<String> for GaugeId {
    fn from(value: String) -> Self {
        GaugeId(value)
    }
}

impl From<u64> for GaugeId {
    fn from(value: u64) -> Self {
        GaugeId(value.to_string())
    }
}

impl fmt::Display for GaugeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a run needs, validated once on construction and read-only afterwards.
///
/// Build it with [`QueryParameters::builder`]. Only the river, station, gauge, point and
/// date range are required; the rest default to the reference ERA5-Land run:
///
/// | setting | default |
/// |---|---|
/// | `variables` | all 14 of [`Era5LandVariable::ALL`] |
/// | `station_prefix` / `basin_prefix` | `p1_` / `basin_` |
/// | `folder` | `GEE` |
/// | `simplify_tolerance_m` | 1000 |
/// | `station_scale_m` / `basin_scale_m` | 1000 / 9000 |
/// | `best_effort` | `true` |
/// | `max_pixels` | 1e13 |
///
/// # Examples
///
/// ```
/// use era5_basin::{DatePeriod, LonLat, QueryParameters, Year};
///
/// let params = QueryParameters::builder()
///     .river("Anabar")
///     .station("Saskylakh")
///     .gauge_id(2999150u64)
///     .station_point(LonLat(114.08, 71.97))
///     .dates((Year(1950), Year(2023)).date_range().unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(params.station_description(), "Anabar__Saskylakh__Station_ERA5_Land");
/// assert_eq!(params.basin_description(), "Anabar__Saskylakh__Basin_ERA5_Land");
/// assert_eq!(params.variables().len(), 14);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameters {
    river: String,
    station: String,
    gauge_id: GaugeId,
    station_point: LonLat,
    dates: DateRange,
    variables: Vec<String>,
    station_prefix: String,
    basin_prefix: String,
    folder: String,
    simplify_tolerance_m: f64,
    station_scale_m: f64,
    basin_scale_m: f64,
    best_effort: bool,
    max_pixels: u64,
}

#[bon]
impl QueryParameters {
    /// Validates and assembles the parameter block.
    ///
    /// # Errors
    ///
    /// * [`ParameterError::EmptyVariables`] / [`ParameterError::DuplicateVariable`] for a bad variable list.
    /// * [`ParameterError::PrefixCollision`] if both prefixes are equal.
    /// * [`ParameterError::InvalidMeters`] for a non-positive scale or a negative tolerance.
    /// * [`ParameterError::ZeroPixelBudget`] if `max_pixels` is zero.
    #[builder]
    pub fn new(
        #[builder(into)] river: String,
        #[builder(into)] station: String,
        #[builder(into)] gauge_id: GaugeId,
        station_point: LonLat,
        dates: DateRange,
        variables: Option<Vec<String>>,
        #[builder(into)] station_prefix: Option<String>,
        #[builder(into)] basin_prefix: Option<String>,
        #[builder(into)] folder: Option<String>,
        simplify_tolerance_m: Option<f64>,
        station_scale_m: Option<f64>,
        basin_scale_m: Option<f64>,
        best_effort: Option<bool>,
        max_pixels: Option<u64>,
    ) -> Result<Self, ParameterError> {
        let variables = variables.unwrap_or_else(Era5LandVariable::all_names);
        validate_variables(&variables)?;

        let station_prefix = station_prefix.unwrap_or_else(|| DEFAULT_STATION_PREFIX.into());
        let basin_prefix = basin_prefix.unwrap_or_else(|| DEFAULT_BASIN_PREFIX.into());
        if station_prefix == basin_prefix {
            return Err(ParameterError::PrefixCollision(station_prefix));
        }

        let simplify_tolerance_m = simplify_tolerance_m.unwrap_or(DEFAULT_SIMPLIFY_TOLERANCE_M);
        if !simplify_tolerance_m.is_finite() || simplify_tolerance_m < 0.0 {
            return Err(ParameterError::InvalidMeters {
                name: "simplify_tolerance_m",
                value: simplify_tolerance_m,
            });
        }
        let station_scale_m =
            positive_meters("station_scale_m", station_scale_m.unwrap_or(DEFAULT_STATION_SCALE_M))?;
        let basin_scale_m =
            positive_meters("basin_scale_m", basin_scale_m.unwrap_or(DEFAULT_BASIN_SCALE_M))?;

        let max_pixels = max_pixels.unwrap_or(DEFAULT_BASIN_MAX_PIXELS);
        if max_pixels == 0 {
            return Err(ParameterError::ZeroPixelBudget);
        }

        Ok(Self {
            river,
            station,
            gauge_id,
            station_point,
            dates,
            variables,
            station_prefix,
            basin_prefix,
            folder: folder.unwrap_or_else(|| DEFAULT_FOLDER.into()),
            simplify_tolerance_m,
            station_scale_m,
            basin_scale_m,
            best_effort: best_effort.unwrap_or(true),
            max_pixels,
        })
    }
}

impl QueryParameters {
    pub fn river(&self) -> &str {
        &self.river
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn gauge_id(&self) -> &GaugeId {
        &self.gauge_id
    }

    pub fn station_point(&self) -> LonLat {
        self.station_point
    }

    pub fn dates(&self) -> DateRange {
        self.dates
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn station_prefix(&self) -> &str {
        &self.station_prefix
    }

    pub fn basin_prefix(&self) -> &str {
        &self.basin_prefix
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn simplify_tolerance_m(&self) -> f64 {
        self.simplify_tolerance_m
    }

    pub fn station_scale_m(&self) -> f64 {
        self.station_scale_m
    }

    pub fn basin_scale_m(&self) -> f64 {
        self.basin_scale_m
    }

    pub fn best_effort(&self) -> bool {
        self.best_effort
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    /// Export table name of the station series: `{river}__{station}__Station_ERA5_Land`.
    pub fn station_description(&self) -> String {
        format!("{}__{}__Station_ERA5_Land", self.river, self.station)
    }

    /// Export table name of the basin series: `{river}__{station}__Basin_ERA5_Land`.
    pub fn basin_description(&self) -> String {
        format!("{}__{}__Basin_ERA5_Land", self.river, self.station)
    }
}

fn validate_variables(variables: &[String]) -> Result<(), ParameterError> {
    if variables.is_empty() {
        return Err(ParameterError::EmptyVariables);
    }
    let mut seen = HashSet::new();
    for v in variables {
        if !seen.insert(v.as_str()) {
            return Err(ParameterError::DuplicateVariable(v.clone()));
        }
    }
    Ok(())
}

pub(crate) fn positive_meters(name: &'static str, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::InvalidMeters { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::date_range::{DatePeriod, Year};

    macro_rules! anabar {
        () => {
            QueryParameters::builder()
                .river("Anabar")
                .station("Saskylakh")
                .gauge_id(2999150u64)
                .station_point(LonLat(114.08, 71.97))
                .dates((Year(1950), Year(2023)).date_range().unwrap())
        };
    }

    #[test]
    fn test_defaults_follow_reference_run() -> Result<(), ParameterError> {
        let params = anabar!().build()?;
        assert_eq!(params.station_prefix(), "p1_");
        assert_eq!(params.basin_prefix(), "basin_");
        assert_eq!(params.folder(), "GEE");
        assert_eq!(params.simplify_tolerance_m(), 1000.0);
        assert_eq!(params.station_scale_m(), 1000.0);
        assert_eq!(params.basin_scale_m(), 9000.0);
        assert!(params.best_effort());
        assert_eq!(params.max_pixels(), 10_000_000_000_000);
        assert_eq!(params.gauge_id().as_str(), "2999150");
        assert_eq!(params.dates().to_string(), "[1950-01-01, 2024-01-01)");
        assert_eq!(params.variables(), Era5LandVariable::all_names().as_slice());
        Ok(())
    }

    #[test]
    fn test_rejects_bad_variable_lists() {
        assert!(matches!(
            anabar!().variables(vec![]).build(),
            Err(ParameterError::EmptyVariables)
        ));
        assert!(matches!(
            anabar!()
                .variables(vec!["snowfall_sum".into(), "snowfall_sum".into()])
                .build(),
            Err(ParameterError::DuplicateVariable(v)) if v == "snowfall_sum"
        ));
    }

    #[test]
    fn test_rejects_colliding_prefixes_and_bad_scales() {
        assert!(matches!(
            anabar!().station_prefix("x_").basin_prefix("x_").build(),
            Err(ParameterError::PrefixCollision(_))
        ));
        assert!(matches!(
            anabar!().basin_scale_m(0.0).build(),
            Err(ParameterError::InvalidMeters { name: "basin_scale_m", .. })
        ));
        assert!(matches!(
            anabar!().simplify_tolerance_m(f64::NAN).build(),
            Err(ParameterError::InvalidMeters { .. })
        ));
        assert!(matches!(
            anabar!().max_pixels(0).build(),
            Err(ParameterError::ZeroPixelBudget)
        ));
    }

    #[test]
    fn test_overrides_are_kept() -> Result<(), ParameterError> {
        let params = anabar!()
            .variables(vec!["temperature_2m".into()])
            .folder("exports")
            .best_effort(false)
            .build()?;
        assert_eq!(params.variables(), ["temperature_2m".to_string()]);
        assert_eq!(params.folder(), "exports");
        assert!(!params.best_effort());
        Ok(())
    }
}
