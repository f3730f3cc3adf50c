use serde_json::{Map, Value};

use scene::{Region, RegionSet, RegionSetError, ScenarioList};

use crate::geojson::{Feature, FeatureCollection, Geometry};
use crate::table::DemandTable;

pub const DEFAULT_NAME_PROPERTY: &str = "msoa11nm";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Regions that found a table row.
    pub matched: usize,
    /// Regions that got all-zero values.
    pub unmatched: usize,
    /// Features dropped for having no polygon geometry.
    pub skipped: usize,
    /// Table rows no region referenced.
    pub unused_rows: usize,
    /// Non-numeric cells the table read as zero.
    pub bad_cells: usize,
}

/// Joins boundary features to table rows by region name.
///
/// Each polygonal feature becomes a region carrying one value per table
/// scenario. A feature whose name has no row, or has no name at all, gets
/// zero for every scenario.
pub fn join_regions(
    features: &FeatureCollection,
    table: &DemandTable,
    name_property: &str,
) -> Result<(RegionSet, JoinReport), RegionSetError> {
    let scenarios = ScenarioList::new(table.scenarios().iter().cloned());
    let mut report = JoinReport {
        bad_cells: table.bad_cells(),
        ..JoinReport::default()
    };
    let mut used_rows = std::collections::HashSet::new();
    let mut regions = Vec::with_capacity(features.features.len());

    for (index, feature) in features.features.iter().enumerate() {
        let polygons = feature
            .geometry
            .as_ref()
            .map(Geometry::polygons)
            .unwrap_or_default();
        if polygons.is_empty() {
            tracing::debug!(index, "feature without polygon geometry skipped");
            report.skipped += 1;
            continue;
        }

        let name = feature.property_text(name_property).unwrap_or_default();
        let values = match table.row(&name) {
            Some(row) => {
                report.matched += 1;
                used_rows.insert(name.clone());
                row.to_vec()
            }
            None => {
                tracing::debug!(region = %name, "no table row; values default to 0");
                report.unmatched += 1;
                vec![0.0; scenarios.len()]
            }
        };
        regions.push(Region::new(name, polygons, values));
    }

    report.unused_rows = table.len().saturating_sub(used_rows.len());
    let set = RegionSet::new(scenarios, regions)?;
    tracing::info!(
        regions = set.len(),
        scenarios = set.scenarios().len(),
        matched = report.matched,
        unmatched = report.unmatched,
        skipped = report.skipped,
        unused_rows = report.unused_rows,
        bad_cells = report.bad_cells,
        "joined boundaries to demand table"
    );
    Ok((set, report))
}

/// Joined regions as GeoJSON, scenario values written into each feature's
/// properties next to the name.
pub fn regions_to_feature_collection(set: &RegionSet, name_property: &str) -> FeatureCollection {
    let features = set
        .regions()
        .iter()
        .map(|region| {
            let mut properties = Map::new();
            properties.insert(name_property.to_string(), Value::from(region.name.as_str()));
            for (scenario, value) in set.scenarios().iter().zip(&region.values) {
                properties.insert(scenario.to_string(), Value::from(*value));
            }
            let geometry = match region.polygons.as_slice() {
                [single] => Geometry::Polygon(single.rings.clone()),
                many => Geometry::MultiPolygon(many.iter().map(|p| p.rings.clone()).collect()),
            };
            Feature {
                id: None,
                properties,
                geometry: Some(geometry),
            }
        })
        .collect();
    FeatureCollection { features }
}

#[cfg(test)]
mod tests {
    use super::{JoinReport, join_regions, regions_to_feature_collection};
    use crate::geojson::FeatureCollection;
    use crate::table::DemandTable;
    use pretty_assertions::assert_eq;

    const BOUNDARIES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"msoa11nm": "Leeds 001"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,50],[1,50],[1,51],[0,50]]]}},
        {"type": "Feature", "properties": {"msoa11nm": "York 001"},
         "geometry": {"type": "Polygon", "coordinates": [[[2,50],[3,50],[3,51],[2,50]]]}},
        {"type": "Feature", "properties": {"msoa11nm": "Pin"},
         "geometry": {"type": "Point", "coordinates": [0, 0]}}
    ]}"#;

    const TABLE: &str = "ReturnName,Core,High\nLeeds 001,10,20\nHull 001,1,2\n";

    fn joined() -> (scene::RegionSet, JoinReport) {
        let fc = FeatureCollection::from_geojson_str(BOUNDARIES).unwrap();
        let table = DemandTable::from_csv_str(TABLE, "ReturnName").unwrap();
        join_regions(&fc, &table, "msoa11nm").unwrap()
    }

    #[test]
    fn matched_regions_take_table_values() {
        let (set, _) = joined();
        assert_eq!(set.value(0, "Core"), Some(10.0));
        assert_eq!(set.value(0, "High"), Some(20.0));
    }

    #[test]
    fn unmatched_regions_are_zero_for_every_scenario() {
        let (set, _) = joined();
        assert_eq!(set.regions()[1].name, "York 001");
        assert_eq!(set.regions()[1].values, vec![0.0, 0.0]);
    }

    #[test]
    fn report_counts_each_outcome() {
        let (set, report) = joined();
        assert_eq!(set.len(), 2);
        assert_eq!(
            report,
            JoinReport {
                matched: 1,
                unmatched: 1,
                skipped: 1,
                unused_rows: 1,
                bad_cells: 0,
            }
        );
    }

    #[test]
    fn export_carries_values_as_properties() {
        let (set, _) = joined();
        let fc = regions_to_feature_collection(&set, "msoa11nm");
        assert_eq!(fc.features.len(), 2);
        let props = &fc.features[0].properties;
        assert_eq!(props["msoa11nm"], "Leeds 001");
        assert_eq!(props["Core"], 10.0);
        assert_eq!(props["High"], 20.0);
    }
}
