use std::collections::HashMap;

use foundation::bounds::Aabb2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

/// One polygon: `rings[0]` is the outer boundary, the rest are holes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub rings: Vec<Vec<GeoPoint>>,
}

impl Polygon {
    pub fn new(rings: Vec<Vec<GeoPoint>>) -> Self {
        Self { rings }
    }

    pub fn outer(&self) -> Option<&[GeoPoint]> {
        self.rings.first().map(|r| r.as_slice())
    }

    pub fn holes(&self) -> &[Vec<GeoPoint>] {
        self.rings.get(1..).unwrap_or(&[])
    }
}

/// Ordered scenario (column) names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioList {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ScenarioList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // Duplicate headers resolve to the first column, as a lookup by name would.
            positions.entry(name.clone()).or_insert(i);
        }
        Self { names, positions }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

/// A boundary polygon joined to its per-scenario demand values.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub polygons: Vec<Polygon>,
    /// `values[i]` belongs to scenario `i` of the owning [`RegionSet`].
    pub values: Vec<f64>,
    pub bounds: Aabb2,
}

impl Region {
    pub fn new(name: impl Into<String>, polygons: Vec<Polygon>, values: Vec<f64>) -> Self {
        let mut bounds = Aabb2::empty();
        for poly in &polygons {
            for p in poly.rings.iter().flatten() {
                bounds.extend(p.lon_deg, p.lat_deg);
            }
        }
        Self {
            name: name.into(),
            polygons,
            values,
            bounds,
        }
    }

    pub fn value(&self, scenario_index: usize) -> Option<f64> {
        self.values.get(scenario_index).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegionSetError {
    ValueCountMismatch {
        region: String,
        expected: usize,
        found: usize,
    },
}

impl std::fmt::Display for RegionSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionSetError::ValueCountMismatch {
                region,
                expected,
                found,
            } => write!(
                f,
                "region {region:?} has {found} values but there are {expected} scenarios"
            ),
        }
    }
}

impl std::error::Error for RegionSetError {}

/// All regions of a session plus the scenario list they are keyed by.
///
/// Built once at load time; afterwards only read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionSet {
    scenarios: ScenarioList,
    regions: Vec<Region>,
    bounds: Aabb2,
}

impl RegionSet {
    /// Every region must carry exactly one value per scenario.
    pub fn new(scenarios: ScenarioList, regions: Vec<Region>) -> Result<Self, RegionSetError> {
        let mut bounds = Aabb2::empty();
        for region in &regions {
            if region.values.len() != scenarios.len() {
                return Err(RegionSetError::ValueCountMismatch {
                    region: region.name.clone(),
                    expected: scenarios.len(),
                    found: region.values.len(),
                });
            }
            bounds = bounds.union(&region.bounds);
        }
        Ok(Self {
            scenarios,
            regions,
            bounds,
        })
    }

    pub fn scenarios(&self) -> &ScenarioList {
        &self.scenarios
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Lon/lat extent of every region.
    pub fn bounds(&self) -> Aabb2 {
        self.bounds
    }

    pub fn scenario_index(&self, name: &str) -> Option<usize> {
        self.scenarios.position(name)
    }

    pub fn value(&self, region_index: usize, scenario: &str) -> Option<f64> {
        let col = self.scenario_index(scenario)?;
        self.regions.get(region_index)?.value(col)
    }

    /// Values of one scenario, in region order.
    pub fn values_for(&self, scenario_index: usize) -> impl Iterator<Item = f64> + '_ {
        self.regions
            .iter()
            .map(move |r| r.value(scenario_index).unwrap_or(0.0))
    }
}
