//! Offline inspection of a demand map: fetch and join the two sources, then
//! report scenarios, the value domain, per-region styling and the
//! auto-advance sequence.

use std::io::Write;
use std::path::PathBuf;

use formats::{LoadError, LoadedDataset, MapConfig, PlaybackConfig, SourceConfig, load_regions};
use foundation::time::Time;
use layers::{ChoroplethLayer, Scales};
use scene::{RegionSet, ScenarioSelection};
use tracing::{debug, info};

#[derive(Debug)]
pub enum ToolError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Http {
        url: String,
        source: reqwest::Error,
    },
    HttpStatus {
        url: String,
        status: u16,
    },
    Load(LoadError),
    Csv(csv::Error),
    Json(serde_json::Error),
    UnknownScenario {
        name: String,
        available: Vec<String>,
    },
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            ToolError::Http { url, source } => write!(f, "{url}: {source}"),
            ToolError::HttpStatus { url, status } => write!(f, "{url}: HTTP {status}"),
            ToolError::Load(e) => write!(f, "{e}"),
            ToolError::Csv(e) => write!(f, "csv: {e}"),
            ToolError::Json(e) => write!(f, "json: {e}"),
            ToolError::UnknownScenario { name, available } => write!(
                f,
                "unknown scenario {name:?} (available: {})",
                available.join(", ")
            ),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Io { source, .. } => Some(source),
            ToolError::Http { source, .. } => Some(source),
            ToolError::Load(e) => Some(e),
            ToolError::Csv(e) => Some(e),
            ToolError::Json(e) => Some(e),
            ToolError::HttpStatus { .. } | ToolError::UnknownScenario { .. } => None,
        }
    }
}

impl From<LoadError> for ToolError {
    fn from(e: LoadError) -> Self {
        ToolError::Load(e)
    }
}

impl From<csv::Error> for ToolError {
    fn from(e: csv::Error) -> Self {
        ToolError::Csv(e)
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Json(e)
    }
}

pub fn is_url(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Text of a file path or an http(s) URL.
pub async fn read_source(client: &reqwest::Client, src: &str) -> Result<String, ToolError> {
    if !is_url(src) {
        return tokio::fs::read_to_string(src)
            .await
            .map_err(|source| ToolError::Io {
                path: PathBuf::from(src),
                source,
            });
    }

    let http = |source| ToolError::Http {
        url: src.to_string(),
        source,
    };
    let resp = client.get(src).send().await.map_err(http)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ToolError::HttpStatus {
            url: src.to_string(),
            status: status.as_u16(),
        });
    }
    let text = resp.text().await.map_err(http)?;
    debug!(url = src, bytes = text.len(), "fetched");
    Ok(text)
}

/// Reads both sources concurrently and joins them.
pub async fn fetch_dataset(
    client: &reqwest::Client,
    source: &SourceConfig,
) -> Result<LoadedDataset, ToolError> {
    let (boundaries, table) = tokio::join!(
        read_source(client, &source.boundary_url),
        read_source(client, &source.table_url),
    );
    let loaded = load_regions(&boundaries?, &table?, source)?;
    info!(
        regions = loaded.regions.len(),
        scenarios = loaded.regions.scenarios().len(),
        "dataset ready"
    );
    Ok(loaded)
}

pub fn scenario_index(set: &RegionSet, name: &str) -> Result<usize, ToolError> {
    set.scenario_index(name)
        .ok_or_else(|| ToolError::UnknownScenario {
            name: name.to_string(),
            available: set.scenarios().names().to_vec(),
        })
}

/// One line per scenario: index, name and the non-zero extent of its column.
pub fn scenario_lines(set: &RegionSet) -> Vec<String> {
    set.scenarios()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let nonzero = set.values_for(i).filter(|v| *v != 0.0);
            match layers::Domain::extent(nonzero) {
                Some(d) => format!("{i}\t{name}\t{}..{}", d.min, d.max),
                None => format!("{i}\t{name}\t(all zero)"),
            }
        })
        .collect()
}

pub fn domain_line(scales: &Scales) -> String {
    match (scales.domain, scales.elevation) {
        (Some(d), Some(e)) => format!(
            "domain {}..{} -> elevation {}..{} m",
            d.min, d.max, e.range[0], e.range[1]
        ),
        _ => "domain empty: every value is zero, map renders flat".to_string(),
    }
}

/// Per-region elevation and fill for one scenario as CSV.
pub fn write_styles<W: Write>(
    writer: W,
    set: &RegionSet,
    layer: &ChoroplethLayer,
    scales: &Scales,
    scenario_index: usize,
) -> Result<(), ToolError> {
    let snapshot = layer.extract(set, scales, Some(scenario_index));
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["region", "value", "elevation_m", "fill"])?;
    for ((region, elevation), fill) in set
        .regions()
        .iter()
        .zip(&snapshot.elevations_m)
        .zip(&snapshot.fills)
    {
        let value = region.value(scenario_index).unwrap_or(0.0);
        out.write_record([
            region.name.clone(),
            value.to_string(),
            elevation.to_string(),
            fill.to_css_hex(),
        ])?;
    }
    out.flush().map_err(|source| ToolError::Io {
        path: PathBuf::from("<styles>"),
        source,
    })?;
    Ok(())
}

/// One auto-advance firing in a simulated run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayStep {
    pub at_s: f64,
    pub index: usize,
    pub scenario: String,
}

/// Renders and lets every auto-advance callback fire on time, `steps` times.
///
/// The first entry is the opening scenario at t = 0.
pub fn simulate_play(set: &RegionSet, playback: &PlaybackConfig, steps: usize) -> Vec<PlayStep> {
    let mut selection = ScenarioSelection::new(
        set.scenarios().clone(),
        playback.initial_scenario.as_deref(),
        true,
        playback.interval_s(),
    );

    let mut now = Time::ZERO;
    let mut out = Vec::with_capacity(steps + 1);
    let record = |selection: &ScenarioSelection, now: Time, out: &mut Vec<PlayStep>| {
        if let (Some(index), Some(name)) = (selection.selected_index(), selection.selected_name()) {
            out.push(PlayStep {
                at_s: now.0,
                index,
                scenario: name.to_string(),
            });
        }
    };
    record(&selection, now, &mut out);

    for _ in 0..steps {
        if selection.after_render(now).is_none() {
            break;
        }
        let Some(deadline) = selection.timer_deadline() else {
            break;
        };
        now = deadline;
        if selection.poll(now).is_some() {
            record(&selection, now, &mut out);
        }
    }
    out
}

/// Config file when given, defaults otherwise, with source overrides applied.
pub fn resolve_config(
    path: Option<&std::path::Path>,
    boundaries: Option<String>,
    table: Option<String>,
) -> Result<MapConfig, formats::MapConfigError> {
    let mut config = match path {
        Some(p) => MapConfig::load(p)?,
        None => MapConfig::default(),
    };
    if let Some(b) = boundaries {
        config.source.boundary_url = b;
    }
    if let Some(t) = table {
        config.source.table_url = t;
    }
    config.validate()?;
    Ok(config)
}
