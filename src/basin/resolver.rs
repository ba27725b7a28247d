//! Resolves a gauge identifier to its simplified drainage-basin polygon.

use crate::basin::error::ResolveError;
use crate::basin::feature_catalog::FeatureCatalog;
use crate::types::geometry::Geometry;
use crate::types::parameters::GaugeId;
use log::info;

/// Catalog property holding the gauge key (GRDC station number).
pub const DEFAULT_GAUGE_PROPERTY: &str = "grdc_no";

/// Looks up basin records in a [`FeatureCatalog`] and checks there is exactly one.
pub struct BasinResolver<'a, C: FeatureCatalog + ?Sized> {
    catalog: &'a C,
    property: String,
}

impl<'a, C: FeatureCatalog + ?Sized> BasinResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self::with_property(catalog, DEFAULT_GAUGE_PROPERTY)
    }

    pub fn with_property(catalog: &'a C, property: impl Into<String>) -> Self {
        Self {
            catalog,
            property: property.into(),
        }
    }

    /// Returns the basin of `gauge_id`, simplified to `simplify_tolerance_m` meters.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::NoMatch`] if no record carries the gauge id.
    /// * [`ResolveError::Ambiguous`] if more than one does.
    /// * [`ResolveError::NotAPolygon`] if the record has no polygon geometry.
    /// * [`ResolveError::Catalog`] if the catalog query itself fails.
    pub fn resolve(
        &self,
        gauge_id: &GaugeId,
        simplify_tolerance_m: f64,
    ) -> Result<Geometry, ResolveError> {
        let mut matches = self.catalog.filter_eq(&self.property, gauge_id)?;
        let feature = match matches.len() {
            0 => {
                return Err(ResolveError::NoMatch {
                    property: self.property.clone(),
                    gauge_id: gauge_id.clone(),
                })
            }
            1 => matches.remove(0),
            count => {
                return Err(ResolveError::Ambiguous {
                    property: self.property.clone(),
                    gauge_id: gauge_id.clone(),
                    count,
                })
            }
        };

        let geometry = match feature.geometry {
            Some(g) if g.is_areal() && !g.is_empty() => g,
            other => {
                return Err(ResolveError::NotAPolygon {
                    gauge_id: gauge_id.clone(),
                    found: other.as_ref().map_or("no geometry", Geometry::kind),
                })
            }
        };

        let simplified = geometry.simplify(simplify_tolerance_m);
        info!(
            "Resolved basin of gauge {} from '{}': {} vertices, {} after simplifying at {} m",
            gauge_id,
            self.catalog.id(),
            geometry.vertex_count(),
            simplified.vertex_count(),
            simplify_tolerance_m
        );
        Ok(simplified)
    }
}

/// Shorthand for [`BasinResolver::resolve`] with the default `grdc_no` property.
pub fn resolve_basin<C: FeatureCatalog + ?Sized>(
    catalog: &C,
    gauge_id: &GaugeId,
    simplify_tolerance_m: f64,
) -> Result<Geometry, ResolveError> {
    BasinResolver::new(catalog).resolve(gauge_id, simplify_tolerance_m)
}
