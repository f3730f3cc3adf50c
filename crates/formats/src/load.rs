use scene::{RegionSet, RegionSetError};

use crate::boundaries::{BoundaryError, decode_boundaries};
use crate::map_config::SourceConfig;
use crate::region_join::{JoinReport, join_regions};
use crate::table::{DemandTable, TableError};

/// Joined regions plus what the join observed.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub regions: RegionSet,
    pub report: JoinReport,
}

#[derive(Debug)]
pub enum LoadError {
    Boundaries(BoundaryError),
    Table(TableError),
    Join(RegionSetError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Boundaries(e) => write!(f, "boundaries: {e}"),
            LoadError::Table(e) => write!(f, "demand table: {e}"),
            LoadError::Join(e) => write!(f, "join: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Boundaries(e) => Some(e),
            LoadError::Table(e) => Some(e),
            LoadError::Join(e) => Some(e),
        }
    }
}

impl From<BoundaryError> for LoadError {
    fn from(e: BoundaryError) -> Self {
        LoadError::Boundaries(e)
    }
}

impl From<TableError> for LoadError {
    fn from(e: TableError) -> Self {
        LoadError::Table(e)
    }
}

impl From<RegionSetError> for LoadError {
    fn from(e: RegionSetError) -> Self {
        LoadError::Join(e)
    }
}

/// Decodes both fetched payloads and joins them.
pub fn load_regions(
    boundary_text: &str,
    table_text: &str,
    source: &SourceConfig,
) -> Result<LoadedDataset, LoadError> {
    let features = decode_boundaries(boundary_text, source.topology_object.as_deref())?;
    let table = DemandTable::from_csv_str(table_text, &source.key_column)?;
    let (regions, report) = join_regions(&features, &table, &source.name_property)?;
    Ok(LoadedDataset { regions, report })
}

#[cfg(test)]
mod tests {
    use super::{LoadError, load_regions};
    use crate::map_config::SourceConfig;

    const TOPO: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [0.001, 0.001], "translate": [-1, 53]},
        "arcs": [
            [[1000,0],[0,1000]],
            [[1000,1000],[-1000,0],[0,-1000],[1000,0]],
            [[1000,0],[1000,0],[0,1000],[-1000,0]]
        ],
        "objects": {"test-msoa": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "arcs": [[0, 1]], "properties": {"msoa11nm": "West"}},
            {"type": "Polygon", "arcs": [[2, -1]], "properties": {"msoa11nm": "East"}}
        ]}}
    }"#;

    const CSV: &str = "ReturnName,Core,High\nWest,5,0\n";

    #[test]
    fn loads_topology_and_table_with_defaults() {
        let loaded = load_regions(TOPO, CSV, &SourceConfig::default()).unwrap();
        let set = &loaded.regions;
        assert_eq!(set.len(), 2);
        assert_eq!(set.scenarios().names(), &["Core", "High"]);
        assert_eq!(set.regions()[0].values, vec![5.0, 0.0]);
        assert_eq!(set.regions()[1].values, vec![0.0, 0.0]);
        assert_eq!(loaded.report.matched, 1);

        let east = &set.regions()[1].bounds;
        assert!((east.min[0] - 0.0).abs() < 1e-9);
        assert!((east.max[0] - 1.0).abs() < 1e-9);
        assert!((east.max[1] - 54.0).abs() < 1e-9);
    }

    #[test]
    fn table_errors_surface() {
        let source = SourceConfig {
            key_column: "Zone".to_string(),
            ..SourceConfig::default()
        };
        assert!(matches!(load_regions(TOPO, CSV, &source), Err(LoadError::Table(_))));
    }
}
