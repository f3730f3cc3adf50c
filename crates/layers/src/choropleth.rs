use scene::RegionSet;

use crate::layer::{ExtrusionStyle, Layer, LayerId};
use crate::symbology::{ColorRamp, Domain, LinearScale, Rgba8, SequentialScale};

/// Elevation and colour scales shared by every scenario of a dataset.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Scales {
    pub domain: Option<Domain>,
    pub elevation: Option<LinearScale>,
    pub color: Option<SequentialScale>,
}

impl Scales {
    /// Builds both scales over the zero-excluding domain of every scenario.
    ///
    /// With no domain (every value zero) the scales are absent and regions
    /// render flat at the low end of the elevation range, coloured with the
    /// start of the ramp.
    pub fn from_regions(set: &RegionSet, elevation_range: [f64; 2], ramp: ColorRamp) -> Self {
        let domain = Domain::from_regions(set);
        match domain {
            Some(d) => tracing::debug!(min = d.min, max = d.max, "value domain"),
            None => tracing::warn!(regions = set.len(), "no non-zero values; map renders flat"),
        }
        Self {
            domain,
            elevation: domain.map(|d| LinearScale::new(d, elevation_range)),
            color: domain.map(|d| SequentialScale::new(d, ramp)),
        }
    }

    fn elevation_m(&self, value: f64, fallback: f64) -> f64 {
        self.elevation.map_or(fallback, |s| s.apply(value))
    }

    fn fill(&self, value: f64, fallback: Rgba8) -> Rgba8 {
        self.color.map_or(fallback, |s| s.apply(value))
    }
}

/// Per-region styling for one scenario, in region order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChoroplethSnapshot {
    pub scenario_index: Option<usize>,
    pub elevations_m: Vec<f64>,
    pub fills: Vec<Rgba8>,
}

impl ChoroplethSnapshot {
    pub fn len(&self) -> usize {
        self.elevations_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elevations_m.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethLayer {
    id: LayerId,
    pub style: ExtrusionStyle,
    pub ramp: ColorRamp,
}

impl ChoroplethLayer {
    pub fn new(id: u64, style: ExtrusionStyle) -> Self {
        Self {
            id: LayerId(id),
            style,
            ramp: ColorRamp::INFERNO,
        }
    }

    pub fn scales(&self, set: &RegionSet) -> Scales {
        Scales::from_regions(set, self.style.elevation_range, self.ramp)
    }

    /// Elevation and fill of every region for `scenario_index`.
    ///
    /// An out-of-range or absent scenario styles every region as if its
    /// value were zero.
    pub fn extract(
        &self,
        set: &RegionSet,
        scales: &Scales,
        scenario_index: Option<usize>,
    ) -> ChoroplethSnapshot {
        let alpha = self.style.fill_alpha();
        let flat_elevation = self.style.elevation_range[0];
        let flat_fill = self.ramp.sample(0.0);

        let mut elevations_m = Vec::with_capacity(set.len());
        let mut fills = Vec::with_capacity(set.len());
        for region in set.regions() {
            let value = scenario_index
                .and_then(|i| region.value(i))
                .unwrap_or(0.0);
            elevations_m.push(scales.elevation_m(value, flat_elevation));
            fills.push(scales.fill(value, flat_fill).with_alpha(alpha));
        }

        ChoroplethSnapshot {
            scenario_index,
            elevations_m,
            fills,
        }
    }
}

impl Layer for ChoroplethLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::ChoroplethLayer;
    use crate::layer::ExtrusionStyle;
    use crate::symbology::Rgba8;
    use pretty_assertions::assert_eq;
    use scene::{GeoPoint, Polygon, Region, RegionSet, ScenarioList};

    fn square(x0: f64) -> Polygon {
        Polygon::new(vec![vec![
            GeoPoint::new(x0, 50.0),
            GeoPoint::new(x0 + 1.0, 50.0),
            GeoPoint::new(x0 + 1.0, 51.0),
            GeoPoint::new(x0, 50.0),
        ]])
    }

    fn regions(values: [[f64; 2]; 3]) -> RegionSet {
        RegionSet::new(
            ScenarioList::new(["Core", "High"]),
            values
                .iter()
                .enumerate()
                .map(|(i, v)| Region::new(format!("R{i}"), vec![square(i as f64)], v.to_vec()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn elevation_and_colour_follow_the_selected_scenario() {
        let set = regions([[10.0, 20.0], [20.0, 30.0], [0.0, 0.0]]);
        let layer = ChoroplethLayer::new(1, ExtrusionStyle::default());
        let scales = layer.scales(&set);

        let core = layer.extract(&set, &scales, Some(0));
        // Domain is [10, 30].
        assert_eq!(core.elevations_m, vec![0.0, 50_000.0, -50_000.0]);
        assert_eq!(core.fills[0], Rgba8::new(0, 0, 4, 204));

        let high = layer.extract(&set, &scales, Some(1));
        assert_eq!(high.elevations_m[1], 100_000.0);
        assert_eq!(high.fills[1], Rgba8::new(0xfc, 0xff, 0xa4, 204));
    }

    #[test]
    fn all_zero_dataset_renders_flat() {
        let set = regions([[0.0, 0.0]; 3]);
        let layer = ChoroplethLayer::new(1, ExtrusionStyle::default());
        let scales = layer.scales(&set);
        assert!(scales.domain.is_none());

        let snap = layer.extract(&set, &scales, Some(0));
        assert_eq!(snap.elevations_m, vec![0.0; 3]);
        assert!(snap.fills.iter().all(|c| *c == Rgba8::new(0, 0, 4, 204)));
    }

    #[test]
    fn styles_a_loaded_topology() {
        let topo = r#"{
            "type": "Topology",
            "arcs": [[[0,50],[1,50],[1,51],[0,50]], [[2,50],[3,50],[3,51],[2,50]]],
            "objects": {"zones": {"type": "GeometryCollection", "geometries": [
                {"type": "Polygon", "arcs": [[0]], "properties": {"msoa11nm": "A"}},
                {"type": "Polygon", "arcs": [[1]], "properties": {"msoa11nm": "B"}}
            ]}}
        }"#;
        let csv = "ReturnName,Core,High\nA,4,8\n";
        let source = formats::SourceConfig {
            topology_object: Some("zones".to_string()),
            ..formats::SourceConfig::default()
        };
        let loaded = formats::load_regions(topo, csv, &source).unwrap();

        let layer = ChoroplethLayer::new(1, ExtrusionStyle::default());
        let scales = layer.scales(&loaded.regions);
        let snap = layer.extract(&loaded.regions, &scales, Some(1));
        // Domain [4, 8]; B has no row and sits one domain-width below the floor.
        assert_eq!(snap.elevations_m, vec![100_000.0, -100_000.0]);
    }

    #[test]
    fn missing_scenario_reads_as_zero() {
        let set = regions([[10.0, 20.0], [20.0, 30.0], [5.0, 5.0]]);
        let layer = ChoroplethLayer::new(1, ExtrusionStyle::default());
        let scales = layer.scales(&set);
        let none = layer.extract(&set, &scales, None);
        let bogus = layer.extract(&set, &scales, Some(9));
        assert_eq!(none.elevations_m, bogus.elevations_m);
        assert_eq!(none.len(), 3);
    }
}
