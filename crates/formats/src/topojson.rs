//! TopoJSON decoding into GeoJSON-style features.
//!
//! Arcs are shared polylines. A geometry references them by index; a negative
//! index `~i` means arc `i` traversed backwards. Quantized topologies store
//! arcs delta-encoded in integer units and carry a `transform` mapping them
//! back to coordinates.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use scene::GeoPoint;

use crate::geojson::{Feature, FeatureCollection, Geometry};

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    fn apply(&self, qx: f64, qy: f64) -> GeoPoint {
        GeoPoint::new(
            qx * self.scale[0] + self.translate[0],
            qy * self.scale[1] + self.translate[1],
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawTopology {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: BTreeMap<String, Value>,
}

/// A decoded topology: arcs are absolute coordinates, objects still raw.
#[derive(Debug, Clone)]
pub struct Topology {
    transform: Option<Transform>,
    arcs: Vec<Vec<GeoPoint>>,
    objects: BTreeMap<String, Value>,
}

#[derive(Debug)]
pub enum TopoJsonError {
    Json(serde_json::Error),
    NotATopology { found: String },
    MissingObject { name: String, available: Vec<String> },
    InvalidArc { index: usize, reason: String },
    ArcOutOfRange { arc: i64, arc_count: usize },
    InvalidGeometry { reason: String },
}

impl std::fmt::Display for TopoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopoJsonError::Json(e) => write!(f, "TopoJSON parse error: {e}"),
            TopoJsonError::NotATopology { found } => {
                write!(f, "expected type \"Topology\", found {found:?}")
            }
            TopoJsonError::MissingObject { name, available } => {
                write!(f, "topology has no object {name:?} (available: {available:?})")
            }
            TopoJsonError::InvalidArc { index, reason } => {
                write!(f, "invalid arc {index}: {reason}")
            }
            TopoJsonError::ArcOutOfRange { arc, arc_count } => {
                write!(f, "arc reference {arc} out of range ({arc_count} arcs)")
            }
            TopoJsonError::InvalidGeometry { reason } => write!(f, "invalid geometry: {reason}"),
        }
    }
}

impl std::error::Error for TopoJsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TopoJsonError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl Topology {
    pub fn from_json_str(payload: &str) -> Result<Self, TopoJsonError> {
        let raw: RawTopology = serde_json::from_str(payload).map_err(TopoJsonError::Json)?;
        Self::from_raw(raw)
    }

    pub fn from_json_value(value: Value) -> Result<Self, TopoJsonError> {
        let raw: RawTopology = serde_json::from_value(value).map_err(TopoJsonError::Json)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTopology) -> Result<Self, TopoJsonError> {
        if raw.kind != "Topology" {
            return Err(TopoJsonError::NotATopology { found: raw.kind });
        }
        let arcs = decode_arcs(&raw.arcs, raw.transform.as_ref())?;
        Ok(Self {
            transform: raw.transform,
            arcs,
            objects: raw.objects,
        })
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects.keys().cloned().collect()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Converts the named object to features.
    ///
    /// A `GeometryCollection` object yields one feature per member geometry;
    /// any other object yields a single feature.
    pub fn feature(&self, object_name: &str) -> Result<FeatureCollection, TopoJsonError> {
        let object = self
            .objects
            .get(object_name)
            .ok_or_else(|| TopoJsonError::MissingObject {
                name: object_name.to_string(),
                available: self.object_names(),
            })?;

        let is_collection = object.get("type").and_then(Value::as_str) == Some("GeometryCollection");
        let features = if is_collection {
            object
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| TopoJsonError::InvalidGeometry {
                    reason: "GeometryCollection missing geometries".to_string(),
                })?
                .iter()
                .map(|g| self.to_feature(g))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![self.to_feature(object)?]
        };
        Ok(FeatureCollection { features })
    }

    fn to_feature(&self, object: &Value) -> Result<Feature, TopoJsonError> {
        let id = match object.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let properties = object
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_else(Map::new);
        Ok(Feature {
            id,
            properties,
            geometry: self.to_geometry(object)?,
        })
    }

    fn to_geometry(&self, object: &Value) -> Result<Option<Geometry>, TopoJsonError> {
        let ty = match object.get("type") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(TopoJsonError::InvalidGeometry {
                    reason: format!("geometry type must be a string, found {other}"),
                });
            }
        };

        let geometry = match ty {
            "GeometryCollection" => {
                let parts = object
                    .get("geometries")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid("GeometryCollection missing geometries"))?;
                let mut out = Vec::with_capacity(parts.len());
                for part in parts {
                    if let Some(g) = self.to_geometry(part)? {
                        out.push(g);
                    }
                }
                Geometry::GeometryCollection(out)
            }
            "Point" => Geometry::Point(self.position(coordinates(object)?)?),
            "MultiPoint" => Geometry::MultiPoint(
                as_array(coordinates(object)?)?
                    .iter()
                    .map(|p| self.position(p))
                    .collect::<Result<_, _>>()?,
            ),
            "LineString" => Geometry::LineString(self.line(&arc_refs(arcs(object)?)?)?),
            "MultiLineString" => Geometry::MultiLineString(
                as_array(arcs(object)?)?
                    .iter()
                    .map(|l| self.line(&arc_refs(l)?))
                    .collect::<Result<_, _>>()?,
            ),
            "Polygon" => Geometry::Polygon(self.polygon(arcs(object)?)?),
            "MultiPolygon" => Geometry::MultiPolygon(
                as_array(arcs(object)?)?
                    .iter()
                    .map(|p| self.polygon(p))
                    .collect::<Result<_, _>>()?,
            ),
            other => {
                return Err(TopoJsonError::InvalidGeometry {
                    reason: format!("unsupported geometry type: {other}"),
                });
            }
        };
        Ok(Some(geometry))
    }

    fn position(&self, value: &Value) -> Result<GeoPoint, TopoJsonError> {
        let arr = as_array(value)?;
        let (Some(x), Some(y)) = (
            arr.first().and_then(Value::as_f64),
            arr.get(1).and_then(Value::as_f64),
        ) else {
            return Err(invalid("position must start with two numbers"));
        };
        Ok(match &self.transform {
            Some(t) => t.apply(x, y),
            None => GeoPoint::new(x, y),
        })
    }

    fn polygon(&self, rings: &Value) -> Result<Vec<Vec<GeoPoint>>, TopoJsonError> {
        as_array(rings)?
            .iter()
            .map(|r| self.ring(&arc_refs(r)?))
            .collect()
    }

    /// Stitches arcs into one polyline, dropping each joint's duplicated point.
    fn stitch(&self, refs: &[i64]) -> Result<Vec<GeoPoint>, TopoJsonError> {
        let mut points: Vec<GeoPoint> = Vec::new();
        for &r in refs {
            let index = if r < 0 { !r } else { r };
            let arc = usize::try_from(index)
                .ok()
                .and_then(|i| self.arcs.get(i))
                .ok_or(TopoJsonError::ArcOutOfRange {
                    arc: r,
                    arc_count: self.arcs.len(),
                })?;

            points.pop();
            let start = points.len();
            points.extend_from_slice(arc);
            if r < 0 {
                points[start..].reverse();
            }
        }
        Ok(points)
    }

    fn line(&self, refs: &[i64]) -> Result<Vec<GeoPoint>, TopoJsonError> {
        let mut points = self.stitch(refs)?;
        if points.len() == 1 {
            points.push(points[0]);
        }
        Ok(points)
    }

    fn ring(&self, refs: &[i64]) -> Result<Vec<GeoPoint>, TopoJsonError> {
        let mut points = self.line(refs)?;
        // Degenerate rings (e.g. a single two-point arc) are padded to a closed ring.
        if let Some(&first) = points.first() {
            while points.len() < 4 {
                points.push(first);
            }
        }
        Ok(points)
    }
}

fn decode_arcs(
    raw: &[Vec<Vec<f64>>],
    transform: Option<&Transform>,
) -> Result<Vec<Vec<GeoPoint>>, TopoJsonError> {
    let mut out = Vec::with_capacity(raw.len());
    for (index, arc) in raw.iter().enumerate() {
        let mut points = Vec::with_capacity(arc.len());
        let (mut x, mut y) = (0.0, 0.0);
        for pos in arc {
            let (Some(&dx), Some(&dy)) = (pos.first(), pos.get(1)) else {
                return Err(TopoJsonError::InvalidArc {
                    index,
                    reason: "position must have two numbers".to_string(),
                });
            };
            match transform {
                Some(t) => {
                    x += dx;
                    y += dy;
                    points.push(t.apply(x, y));
                }
                None => points.push(GeoPoint::new(dx, dy)),
            }
        }
        out.push(points);
    }
    Ok(out)
}

fn invalid(reason: &str) -> TopoJsonError {
    TopoJsonError::InvalidGeometry {
        reason: reason.to_string(),
    }
}

fn coordinates(object: &Value) -> Result<&Value, TopoJsonError> {
    object
        .get("coordinates")
        .ok_or_else(|| invalid("geometry missing coordinates"))
}

fn arcs(object: &Value) -> Result<&Value, TopoJsonError> {
    object.get("arcs").ok_or_else(|| invalid("geometry missing arcs"))
}

fn as_array(value: &Value) -> Result<&Vec<Value>, TopoJsonError> {
    value.as_array().ok_or_else(|| invalid("expected an array"))
}

fn arc_refs(value: &Value) -> Result<Vec<i64>, TopoJsonError> {
    as_array(value)?
        .iter()
        .map(|v| v.as_i64().ok_or_else(|| invalid("arc reference must be an integer")))
        .collect()
}
