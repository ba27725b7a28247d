//! The ERA5-Land daily aggregate bands requested by default.

use std::fmt;

/// Catalog identifier of the ERA5-Land daily aggregated collection.
pub const ERA5_LAND_DAILY: &str = "ECMWF/ERA5_LAND/DAILY_AGGR";

/// A band of the ERA5-Land daily aggregate collection.
///
/// `_sum` bands are daily accumulations (fluxes) and are meaningful under spatial
/// summation. The others are daily means of state variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Era5LandVariable {
    Temperature2m,
    DewpointTemperature2m,
    SoilTemperatureLevel1,
    SnowDepthWaterEquivalent,
    SnowfallSum,
    SnowmeltSum,
    TotalEvaporationSum,
    TotalPrecipitationSum,
    SubSurfaceRunoffSum,
    SurfaceRunoffSum,
    UComponentOfWind10m,
    VComponentOfWind10m,
    SurfaceNetSolarRadiationSum,
    SurfaceNetThermalRadiationSum,
}

impl Era5LandVariable {
    /// All variables, in export column order.
    pub const ALL: [Era5LandVariable; 14] = [
        Era5LandVariable::Temperature2m,
        Era5LandVariable::DewpointTemperature2m,
        Era5LandVariable::SoilTemperatureLevel1,
        Era5LandVariable::SnowDepthWaterEquivalent,
        Era5LandVariable::SnowfallSum,
        Era5LandVariable::SnowmeltSum,
        Era5LandVariable::TotalEvaporationSum,
        Era5LandVariable::TotalPrecipitationSum,
        Era5LandVariable::SubSurfaceRunoffSum,
        Era5LandVariable::SurfaceRunoffSum,
        Era5LandVariable::UComponentOfWind10m,
        Era5LandVariable::VComponentOfWind10m,
        Era5LandVariable::SurfaceNetSolarRadiationSum,
        Era5LandVariable::SurfaceNetThermalRadiationSum,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Era5LandVariable::Temperature2m => "temperature_2m",
            Era5LandVariable::DewpointTemperature2m => "dewpoint_temperature_2m",
            Era5LandVariable::SoilTemperatureLevel1 => "soil_temperature_level_1",
            Era5LandVariable::SnowDepthWaterEquivalent => "snow_depth_water_equivalent",
            Era5LandVariable::SnowfallSum => "snowfall_sum",
            Era5LandVariable::SnowmeltSum => "snowmelt_sum",
            Era5LandVariable::TotalEvaporationSum => "total_evaporation_sum",
            Era5LandVariable::TotalPrecipitationSum => "total_precipitation_sum",
            Era5LandVariable::SubSurfaceRunoffSum => "sub_surface_runoff_sum",
            Era5LandVariable::SurfaceRunoffSum => "surface_runoff_sum",
            Era5LandVariable::UComponentOfWind10m => "u_component_of_wind_10m",
            Era5LandVariable::VComponentOfWind10m => "v_component_of_wind_10m",
            Era5LandVariable::SurfaceNetSolarRadiationSum => "surface_net_solar_radiation_sum",
            Era5LandVariable::SurfaceNetThermalRadiationSum => {
                "surface_net_thermal_radiation_sum"
            }
        }
    }

    pub fn is_accumulated(&self) -> bool {
        self.name().ends_with("_sum")
    }

    /// Band names of [`Era5LandVariable::ALL`], ready for a parameter block.
    pub fn all_names() -> Vec<String> {
        Self::ALL.iter().map(|v| v.name().to_string()).collect()
    }
}

/// Formats the variable as its catalog band name.
///
/// ```
/// use era5_basin::Era5LandVariable;
///
/// assert_eq!(Era5LandVariable::SnowmeltSum.to_string(), "snowmelt_sum");
/// ```
impl fmt::Display for Era5LandVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_names_unique_and_ordered() {
        let names = Era5LandVariable::all_names();
        assert_eq!(names.len(), 14);
        assert_eq!(names[0], "temperature_2m");
        assert_eq!(names[13], "surface_net_thermal_radiation_sum");
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_accumulated_bands() {
        assert!(Era5LandVariable::TotalPrecipitationSum.is_accumulated());
        assert!(!Era5LandVariable::Temperature2m.is_accumulated());
        assert_eq!(
            Era5LandVariable::ALL
                .iter()
                .filter(|v| v.is_accumulated())
                .count(),
            8
        );
    }
}
