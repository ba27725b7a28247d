use crate::types::parameters::GaugeId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read feature catalog '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse feature catalog '{0}'")]
    Parse(String, #[source] geojson::Error),

    #[error("Feature catalog '{catalog}' is not a FeatureCollection (found type '{found}')")]
    NotAFeatureCollection { catalog: String, found: String },

    #[error("Invalid {kind} geometry in feature {index} of catalog '{catalog}': {message}")]
    InvalidGeometry {
        catalog: String,
        index: usize,
        kind: String,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("No basin record has {property} = {gauge_id}")]
    NoMatch { property: String, gauge_id: GaugeId },

    #[error("{count} basin records have {property} = {gauge_id}, expected exactly one")]
    Ambiguous {
        property: String,
        gauge_id: GaugeId,
        count: usize,
    },

    #[error("Basin record for gauge {gauge_id} has no usable polygon (found {found})")]
    NotAPolygon {
        gauge_id: GaugeId,
        found: &'static str,
    },
}
