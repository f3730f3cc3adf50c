use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::region_join::DEFAULT_NAME_PROPERTY;
use crate::table::DEFAULT_KEY_COLUMN;

pub const DEFAULT_BOUNDARY_URL: &str =
    "https://raw.githubusercontent.com/jPeach-Stantec/flow-map-test/main/test-msoa.json";
pub const DEFAULT_TABLE_URL: &str =
    "https://raw.githubusercontent.com/jPeach-Stantec/flow-map-test/main/test-msoa.csv";

/// Everything the map needs besides the data itself.
///
/// Every field has a default, so `{}` is a complete config; unknown keys are
/// rejected at every level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub source: SourceConfig,
    pub playback: PlaybackConfig,
    pub view: ViewConfig,
    pub style: StyleConfig,
    pub lighting: LightingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub boundary_url: String,
    pub table_url: String,
    /// Topology object holding the regions. `None` takes the only object.
    pub topology_object: Option<String>,
    /// Feature property carrying the region name.
    pub name_property: String,
    /// Table column carrying the region name.
    pub key_column: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            boundary_url: DEFAULT_BOUNDARY_URL.to_string(),
            table_url: DEFAULT_TABLE_URL.to_string(),
            topology_object: Some("test-msoa".to_string()),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    pub initial_scenario: Option<String>,
    pub auto_advance: bool,
    pub interval_ms: u64,
    pub transition_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_scenario: None,
            auto_advance: true,
            interval_ms: 3000,
            transition_ms: 300,
        }
    }
}

impl PlaybackConfig {
    pub fn interval_s(&self) -> f64 {
        self.interval_ms as f64 / 1000.0
    }

    pub fn transition_s(&self) -> f64 {
        self.transition_ms as f64 / 1000.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub max_zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            latitude: 53.0,
            longitude: -0.5,
            zoom: 6.0,
            max_zoom: 16.0,
            pitch: 45.0,
            bearing: 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Elevation in meters for the low and high ends of the value domain.
    pub elevation_range: [f64; 2],
    pub opacity: f32,
    pub wireframe: bool,
    pub line_color: [u8; 3],
    pub highlight_color: [u8; 4],
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            elevation_range: [0.0, 100_000.0],
            opacity: 0.8,
            wireframe: true,
            line_color: [255, 255, 255],
            highlight_color: [100, 100, 100, 100],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightingConfig {
    pub ambient_intensity: f32,
    pub sun_intensity: f32,
    /// Sun position time, milliseconds since the Unix epoch (UTC).
    pub sun_timestamp_ms: f64,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 1.0,
            sun_intensity: 1.0,
            // 2019-08-01T08:00:00Z
            sun_timestamp_ms: 1_564_646_400_000.0,
        }
    }
}

#[derive(Debug)]
pub enum MapConfigError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for MapConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapConfigError::Io { path, source } => write!(f, "read {path}: {source}"),
            MapConfigError::Json(e) => write!(f, "map config: {e}"),
            MapConfigError::Invalid(reason) => write!(f, "map config: {reason}"),
        }
    }
}

impl std::error::Error for MapConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapConfigError::Io { source, .. } => Some(source),
            MapConfigError::Json(e) => Some(e),
            MapConfigError::Invalid(_) => None,
        }
    }
}

impl MapConfig {
    pub fn from_json_str(text: &str) -> Result<Self, MapConfigError> {
        let config: MapConfig = serde_json::from_str(text).map_err(MapConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MapConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), MapConfigError> {
        if !(0.0..=1.0).contains(&self.style.opacity) {
            return Err(MapConfigError::Invalid(format!(
                "style.opacity must be within [0, 1], got {}",
                self.style.opacity
            )));
        }
        if self.style.elevation_range.iter().any(|v| !v.is_finite()) {
            return Err(MapConfigError::Invalid(
                "style.elevation_range must be finite".to_string(),
            ));
        }
        if self.view.max_zoom < self.view.zoom {
            return Err(MapConfigError::Invalid(format!(
                "view.zoom {} exceeds view.max_zoom {}",
                self.view.zoom, self.view.max_zoom
            )));
        }
        if self.source.key_column.is_empty() {
            return Err(MapConfigError::Invalid(
                "source.key_column must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MapConfig, MapConfigError};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_the_default_map() {
        let config = MapConfig::from_json_str("{}").unwrap();
        assert_eq!(config, MapConfig::default());
        assert_eq!(config.source.topology_object.as_deref(), Some("test-msoa"));
        assert_eq!(config.source.name_property, "msoa11nm");
        assert_eq!(config.source.key_column, "ReturnName");
        assert_eq!(config.playback.initial_scenario, None);
        assert_eq!(config.playback.interval_s(), 3.0);
        assert_eq!(config.playback.transition_s(), 0.3);
        assert_eq!(config.view.pitch, 45.0);
        assert_eq!(config.style.elevation_range, [0.0, 100_000.0]);
        assert_eq!(config.style.highlight_color, [100, 100, 100, 100]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = MapConfig::from_json_str(
            r#"{"playback": {"auto_advance": false}, "view": {"zoom": 8}}"#,
        )
        .unwrap();
        assert!(!config.playback.auto_advance);
        assert_eq!(config.playback.interval_ms, 3000);
        assert_eq!(config.view.zoom, 8.0);
        assert_eq!(config.view.latitude, 53.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            MapConfig::from_json_str(r#"{"style": {"opacity": 0.5, "colour": 1}}"#),
            Err(MapConfigError::Json(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            MapConfig::from_json_str(r#"{"style": {"opacity": 1.5}}"#),
            Err(MapConfigError::Invalid(_))
        ));
        assert!(matches!(
            MapConfig::from_json_str(r#"{"view": {"zoom": 18}}"#),
            Err(MapConfigError::Invalid(_))
        ));
    }

    #[test]
    fn serialized_config_reads_back() {
        let mut config = MapConfig::default();
        config.source.topology_object = None;
        let text = config.to_json_string_pretty().unwrap();
        assert_eq!(MapConfig::from_json_str(&text).unwrap(), config);
    }
}
