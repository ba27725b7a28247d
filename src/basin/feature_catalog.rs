//! Vector feature catalogs holding drainage-basin records keyed by gauge.
//!
//! [`FeatureCatalog`] is the seam to whatever hosts the basin boundaries.
//! [`GeoJsonFeatureCatalog`] is the local implementation reading a GeoJSON
//! `FeatureCollection`; Polygon and MultiPolygon geometries are kept, any other
//! geometry type is loaded without a geometry so the resolver can report it.

use crate::basin::error::CatalogError;
use crate::types::geometry::{Geometry, LonLat, Polygon};
use crate::types::parameters::GaugeId;
use log::{debug, info};
use geojson::{GeoJson, Value as GeoJsonValue};
use serde_json::{Map, Value};
use std::path::Path;

/// A single catalog record: free-form properties plus an optional geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// `true` if `key` holds the gauge id, compared on its textual or numeric form.
    pub fn matches(&self, key: &str, gauge_id: &GaugeId) -> bool {
        self.property(key)
            .is_some_and(|value| value_matches(value, gauge_id))
    }
}

fn value_matches(value: &Value, gauge_id: &GaugeId) -> bool {
    match value {
        Value::String(s) => s == gauge_id.as_str(),
        Value::Number(n) => {
            n.to_string() == gauge_id.as_str()
                || matches!(
                    (n.as_f64(), gauge_id.as_str().parse::<f64>()),
                    (Some(a), Ok(b)) if a == b
                )
        }
        _ => false,
    }
}

/// Source of basin features filterable by property equality.
pub trait FeatureCatalog {
    /// Identifier used in logs and errors.
    fn id(&self) -> &str;

    /// Every feature whose `property` equals `value`, in catalog order.
    fn filter_eq(&self, property: &str, value: &GaugeId) -> Result<Vec<Feature>, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct GeoJsonFeatureCatalog {
    id: String,
    features: Vec<Feature>,
}

impl GeoJsonFeatureCatalog {
    pub fn from_features(id: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            id: id.into(),
            features,
        }
    }

    /// Parses a GeoJSON `FeatureCollection` document.
    pub fn from_geojson_str(id: impl Into<String>, json: &str) -> Result<Self, CatalogError> {
        let id = id.into();
        let collection = match json.parse::<GeoJson>() {
            Ok(GeoJson::FeatureCollection(collection)) => collection,
            Ok(GeoJson::Feature(_)) => return Err(not_a_collection(id, "Feature")),
            Ok(GeoJson::Geometry(_)) => return Err(not_a_collection(id, "Geometry")),
            Err(e) => return Err(CatalogError::Parse(id, e)),
        };

        let features = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, f)| {
                let geometry = match f.geometry {
                    Some(g) => convert_geometry(&id, index, g.value)?,
                    None => None,
                };
                Ok(Feature {
                    properties: f.properties.unwrap_or_default(),
                    geometry,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        info!("Loaded {} features into catalog '{}'", features.len(), id);
        Ok(Self { id, features })
    }

    /// Reads and parses a GeoJSON file. The catalog id is the file path.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Read(path.to_path_buf(), e))?;
        Self::from_geojson_str(path.display().to_string(), &json)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureCatalog for GeoJsonFeatureCatalog {
    fn id(&self) -> &str {
        &self.id
    }

    fn filter_eq(&self, property: &str, value: &GaugeId) -> Result<Vec<Feature>, CatalogError> {
        let matched: Vec<Feature> = self
            .features
            .iter()
            .filter(|f| f.matches(property, value))
            .cloned()
            .collect();
        debug!(
            "Catalog '{}': {} feature(s) with {} = {}",
            self.id,
            matched.len(),
            property,
            value
        );
        Ok(matched)
    }
}

fn not_a_collection(catalog: String, found: &str) -> CatalogError {
    CatalogError::NotAFeatureCollection {
        catalog,
        found: found.to_string(),
    }
}

fn convert_geometry(
    catalog: &str,
    index: usize,
    value: GeoJsonValue,
) -> Result<Option<Geometry>, CatalogError> {
    let invalid = |kind: &str| CatalogError::InvalidGeometry {
        catalog: catalog.to_string(),
        index,
        kind: kind.to_string(),
        message: "position has fewer than two coordinates".to_string(),
    };
    let geometry = match value {
        GeoJsonValue::Point(pos) => Some(Geometry::Point(
            position(&pos).ok_or_else(|| invalid("Point"))?,
        )),
        GeoJsonValue::Polygon(rings) => Some(Geometry::Polygon(
            polygon_from_rings(rings).ok_or_else(|| invalid("Polygon"))?,
        )),
        GeoJsonValue::MultiPolygon(polygons) => Some(Geometry::MultiPolygon(
            polygons
                .into_iter()
                .map(polygon_from_rings)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| invalid("MultiPolygon"))?,
        )),
        other => {
            debug!(
                "Feature {} of '{}' has unsupported geometry {}",
                index,
                catalog,
                kind_of(&other)
            );
            None
        }
    };
    Ok(geometry)
}

fn kind_of(value: &GeoJsonValue) -> &'static str {
    match value {
        GeoJsonValue::Point(_) => "Point",
        GeoJsonValue::MultiPoint(_) => "MultiPoint",
        GeoJsonValue::LineString(_) => "LineString",
        GeoJsonValue::MultiLineString(_) => "MultiLineString",
        GeoJsonValue::Polygon(_) => "Polygon",
        GeoJsonValue::MultiPolygon(_) => "MultiPolygon",
        GeoJsonValue::GeometryCollection(_) => "GeometryCollection",
    }
}

fn position(coords: &[f64]) -> Option<LonLat> {
    match coords {
        [lon, lat, ..] => Some(LonLat(*lon, *lat)),
        _ => None,
    }
}

fn polygon_from_rings(rings: Vec<Vec<Vec<f64>>>) -> Option<Polygon> {
    let mut rings = rings
        .iter()
        .map(|ring| ring.iter().map(|c| position(c)).collect::<Option<Vec<_>>>());
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => Vec::new(),
    };
    let holes = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, holes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASINS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "grdc_no": 2999150, "river": "Anabar" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[110.0, 68.0], [118.0, 68.0], [118.0, 73.0], [110.0, 73.0], [110.0, 68.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "grdc_no": "2903430", "river": "Lena" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[120.0, 60.0], [130.0, 60.0], [130.0, 70.0], [120.0, 60.0]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "grdc_no": 1 },
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] }
            }
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() -> Result<(), CatalogError> {
        let catalog = GeoJsonFeatureCatalog::from_geojson_str("arctic_rivers", BASINS)?;
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.id(), "arctic_rivers");
        assert!(catalog.features[2].geometry.is_none());
        assert!(matches!(
            catalog.features[1].geometry,
            Some(Geometry::MultiPolygon(ref ps)) if ps.len() == 1
        ));
        Ok(())
    }

    #[test]
    fn test_filter_matches_numeric_and_string_ids() -> Result<(), CatalogError> {
        let catalog = GeoJsonFeatureCatalog::from_geojson_str("arctic_rivers", BASINS)?;
        let anabar = catalog.filter_eq("grdc_no", &GaugeId::from(2999150u64))?;
        assert_eq!(anabar.len(), 1);
        assert_eq!(anabar[0].property("river"), Some(&Value::from("Anabar")));

        let lena = catalog.filter_eq("grdc_no", &GaugeId::from("2903430"))?;
        assert_eq!(lena.len(), 1);

        assert!(catalog.filter_eq("grdc_no", &GaugeId::from("42"))?.is_empty());
        assert!(catalog.filter_eq("missing", &GaugeId::from("1"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_non_collections_and_bad_coordinates() {
        let not_collection = r#"{"type": "Feature", "properties": {}, "geometry": null}"#;
        assert!(matches!(
            GeoJsonFeatureCatalog::from_geojson_str("x", not_collection),
            Err(CatalogError::NotAFeatureCollection { .. })
        ));

        let bad = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon", "coordinates": "nope"}}
        ]}"#;
        assert!(matches!(
            GeoJsonFeatureCatalog::from_geojson_str("x", bad),
            Err(CatalogError::Parse(..))
        ));
    }

    #[test]
    fn test_short_positions_are_invalid() {
        assert!(matches!(
            convert_geometry("x", 3, GeoJsonValue::Point(vec![1.0])),
            Err(CatalogError::InvalidGeometry { index: 3, .. })
        ));
        let ring = vec![vec![0.0, 0.0], vec![1.0], vec![1.0, 1.0], vec![0.0, 0.0]];
        assert!(matches!(
            convert_geometry("x", 0, GeoJsonValue::Polygon(vec![ring])),
            Err(CatalogError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            convert_geometry("x", 0, GeoJsonValue::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]])),
            Ok(None)
        ));
    }

    #[tokio::test]
    async fn test_from_path_reads_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("basins.geojson");
        tokio::fs::write(&path, BASINS).await?;
        let catalog = GeoJsonFeatureCatalog::from_path(&path).await?;
        assert_eq!(catalog.len(), 3);

        let missing = GeoJsonFeatureCatalog::from_path(dir.path().join("nope.geojson")).await;
        assert!(matches!(missing, Err(CatalogError::Read(..))));
        Ok(())
    }
}
