use serde_json::Value;

use crate::geojson::{FeatureCollection, GeoJsonError};
use crate::topojson::{TopoJsonError, Topology};

#[derive(Debug)]
pub enum BoundaryError {
    Json(serde_json::Error),
    TopoJson(TopoJsonError),
    GeoJson(GeoJsonError),
    /// A topology with several objects and no object name to pick one.
    AmbiguousObject { available: Vec<String> },
    UnsupportedType { found: Option<String> },
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryError::Json(e) => write!(f, "boundary JSON parse error: {e}"),
            BoundaryError::TopoJson(e) => write!(f, "{e}"),
            BoundaryError::GeoJson(e) => write!(f, "{e}"),
            BoundaryError::AmbiguousObject { available } => write!(
                f,
                "topology has {} objects, name one of {available:?}",
                available.len()
            ),
            BoundaryError::UnsupportedType { found } => match found {
                Some(t) => write!(f, "unsupported boundary document type {t:?}"),
                None => write!(f, "boundary document has no type"),
            },
        }
    }
}

impl std::error::Error for BoundaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoundaryError::Json(e) => Some(e),
            BoundaryError::TopoJson(e) => Some(e),
            BoundaryError::GeoJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TopoJsonError> for BoundaryError {
    fn from(e: TopoJsonError) -> Self {
        BoundaryError::TopoJson(e)
    }
}

impl From<GeoJsonError> for BoundaryError {
    fn from(e: GeoJsonError) -> Self {
        BoundaryError::GeoJson(e)
    }
}

/// Decodes a boundary document into features.
///
/// Topologies use `object` when given; without it a single-object topology
/// decodes that object. GeoJSON collections and bare features pass through.
pub fn decode_boundaries(
    text: &str,
    object: Option<&str>,
) -> Result<FeatureCollection, BoundaryError> {
    let value: Value = serde_json::from_str(text).map_err(BoundaryError::Json)?;
    let ty = value.get("type").and_then(Value::as_str).map(str::to_string);

    match ty.as_deref() {
        Some("Topology") => {
            let topology = Topology::from_json_value(value)?;
            let name = match object {
                Some(name) => name.to_string(),
                None => {
                    let mut names = topology.object_names();
                    if names.len() != 1 {
                        return Err(BoundaryError::AmbiguousObject { available: names });
                    }
                    names.remove(0)
                }
            };
            let features = topology.feature(&name)?;
            tracing::debug!(
                object = %name,
                arcs = topology.arc_count(),
                features = features.features.len(),
                "decoded topology"
            );
            Ok(features)
        }
        Some("FeatureCollection") | Some("Feature") => {
            Ok(FeatureCollection::from_geojson_value(&value)?)
        }
        _ => Err(BoundaryError::UnsupportedType { found: ty }),
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundaryError, decode_boundaries};

    const TOPO: &str = r#"{
        "type": "Topology",
        "arcs": [[[0,0],[1,0],[1,1],[0,0]]],
        "objects": {"test-msoa": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "arcs": [[0]], "properties": {"msoa11nm": "A"}}
        ]}}
    }"#;

    #[test]
    fn single_object_topology_needs_no_name() {
        let fc = decode_boundaries(TOPO, None).unwrap();
        assert_eq!(fc.features.len(), 1);
        let fc = decode_boundaries(TOPO, Some("test-msoa")).unwrap();
        assert_eq!(fc.features[0].property_text("msoa11nm").as_deref(), Some("A"));
    }

    #[test]
    fn wrong_object_name_is_reported() {
        assert!(matches!(
            decode_boundaries(TOPO, Some("lsoa")),
            Err(BoundaryError::TopoJson(_))
        ));
    }

    #[test]
    fn multi_object_topology_requires_name() {
        let payload = r#"{"type": "Topology", "arcs": [], "objects": {"a": {"type": null}, "b": {"type": null}}}"#;
        match decode_boundaries(payload, None) {
            Err(BoundaryError::AmbiguousObject { available }) => {
                assert_eq!(available, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn geojson_passes_through() {
        let payload = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(decode_boundaries(payload, Some("ignored")).unwrap().features.is_empty());
    }

    #[test]
    fn other_documents_are_rejected() {
        assert!(matches!(
            decode_boundaries(r#"{"type": "Point", "coordinates": [0, 0]}"#, None),
            Err(BoundaryError::UnsupportedType { .. })
        ));
        assert!(matches!(decode_boundaries("not json", None), Err(BoundaryError::Json(_))));
    }
}
