use serde_json::{Map, Value};

use scene::{GeoPoint, Polygon};

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    LineString(Vec<GeoPoint>),
    MultiLineString(Vec<Vec<GeoPoint>>),
    Polygon(Vec<Vec<GeoPoint>>),
    MultiPolygon(Vec<Vec<Vec<GeoPoint>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Areal parts of the geometry; points and lines contribute nothing.
    pub fn polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        self.collect_polygons(&mut out);
        out
    }

    fn collect_polygons(&self, out: &mut Vec<Polygon>) {
        match self {
            Geometry::Polygon(rings) => out.push(Polygon::new(rings.clone())),
            Geometry::MultiPolygon(polys) => {
                out.extend(polys.iter().map(|rings| Polygon::new(rings.clone())));
            }
            Geometry::GeometryCollection(parts) => {
                for part in parts {
                    part.collect_polygons(out);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    /// `None` for GeoJSON `"geometry": null`.
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Property as text. Numbers are rendered the way JSON prints them.
    pub fn property_text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug)]
pub enum GeoJsonError {
    Json(serde_json::Error),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Json(e) => write!(f, "JSON parse error: {e}"),
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeoJsonError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl FeatureCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value = serde_json::from_str(payload).map_err(GeoJsonError::Json)?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        let obj = value.as_object().ok_or(GeoJsonError::NotAFeatureCollection)?;
        match obj.get("type").and_then(|v| v.as_str()) {
            Some("FeatureCollection") => {}
            // A bare Feature is accepted as a one-element collection.
            Some("Feature") => {
                return Ok(Self {
                    features: vec![parse_feature(0, value)?],
                });
            }
            _ => return Err(GeoJsonError::NotAFeatureCollection),
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            features.push(parse_feature(index, feat_val)?);
        }
        Ok(Self { features })
    }

    pub fn to_geojson_value(&self) -> Value {
        let features = self
            .features
            .iter()
            .map(|feat| {
                let mut fobj = Map::new();
                fobj.insert("type".to_string(), Value::from("Feature"));
                if let Some(id) = &feat.id {
                    fobj.insert("id".to_string(), Value::from(id.as_str()));
                }
                fobj.insert(
                    "properties".to_string(),
                    Value::Object(feat.properties.clone()),
                );
                fobj.insert(
                    "geometry".to_string(),
                    feat.geometry.as_ref().map_or(Value::Null, geometry_to_value),
                );
                Value::Object(fobj)
            })
            .collect();

        let mut root = Map::new();
        root.insert("type".to_string(), Value::from("FeatureCollection"));
        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }

    pub fn to_geojson_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_geojson_value())
    }
}

fn parse_feature(index: usize, value: &Value) -> Result<Feature, GeoJsonError> {
    let invalid = |reason: String| GeoJsonError::InvalidFeature { index, reason };

    let obj = value
        .as_object()
        .ok_or_else(|| invalid("feature must be an object".to_string()))?;
    match obj.get("type").and_then(|v| v.as_str()) {
        Some("Feature") => {}
        Some(other) => return Err(invalid(format!("unexpected feature type: {other}"))),
        None => return Err(invalid("feature missing type".to_string())),
    }

    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let properties = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    let geometry = match obj.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => Some(parse_geometry(g).map_err(invalid)?),
    };

    Ok(Feature {
        id,
        properties,
        geometry,
    })
}

pub(crate) fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    if ty == "GeometryCollection" {
        let parts = obj
            .get("geometries")
            .and_then(|v| v.as_array())
            .ok_or("GeometryCollection missing geometries".to_string())?;
        return parts
            .iter()
            .map(parse_geometry)
            .collect::<Result<Vec<_>, _>>()
            .map(Geometry::GeometryCollection);
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;
    match ty {
        "Point" => Ok(Geometry::Point(parse_position(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_positions(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_positions(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_rings(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_rings(coords)?)),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            polys
                .iter()
                .map(parse_rings)
                .collect::<Result<Vec<_>, _>>()
                .map(Geometry::MultiPolygon)
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_position(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    let (Some(lon), Some(lat)) = (
        arr.first().and_then(Value::as_f64),
        arr.get(1).and_then(Value::as_f64),
    ) else {
        return Err("position must start with numeric [lon, lat]".to_string());
    };
    Ok(GeoPoint::new(lon, lat))
}

fn parse_positions(coords: &Value) -> Result<Vec<GeoPoint>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    arr.iter().map(parse_position).collect()
}

fn parse_rings(coords: &Value) -> Result<Vec<Vec<GeoPoint>>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array of rings".to_string())?;
    arr.iter().map(parse_positions).collect()
}

fn positions_value(points: &[GeoPoint]) -> Value {
    Value::Array(
        points
            .iter()
            .map(|p| Value::Array(vec![Value::from(p.lon_deg), Value::from(p.lat_deg)]))
            .collect(),
    )
}

fn rings_value(rings: &[Vec<GeoPoint>]) -> Value {
    Value::Array(rings.iter().map(|r| positions_value(r)).collect())
}

fn geometry_to_value(geom: &Geometry) -> Value {
    let (ty, key, payload) = match geom {
        Geometry::Point(p) => (
            "Point",
            "coordinates",
            Value::Array(vec![Value::from(p.lon_deg), Value::from(p.lat_deg)]),
        ),
        Geometry::MultiPoint(ps) => ("MultiPoint", "coordinates", positions_value(ps)),
        Geometry::LineString(ps) => ("LineString", "coordinates", positions_value(ps)),
        Geometry::MultiLineString(lines) => ("MultiLineString", "coordinates", rings_value(lines)),
        Geometry::Polygon(rings) => ("Polygon", "coordinates", rings_value(rings)),
        Geometry::MultiPolygon(polys) => (
            "MultiPolygon",
            "coordinates",
            Value::Array(polys.iter().map(|p| rings_value(p)).collect()),
        ),
        Geometry::GeometryCollection(parts) => (
            "GeometryCollection",
            "geometries",
            Value::Array(parts.iter().map(geometry_to_value).collect()),
        ),
    };
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::from(ty));
    obj.insert(key.to_string(), payload);
    Value::Object(obj)
}
