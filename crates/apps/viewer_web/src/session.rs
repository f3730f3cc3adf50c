use foundation::math::Vec3;
use foundation::time::Time;
use formats::{LoadedDataset, MapConfig};
use layers::{
    ChoroplethLayer, ExtrusionMesh, ExtrusionStyle, Lighting, MeshBuffers, Scales,
    Tooltip, Transitions, region_tooltip,
};
use runtime::{Stamped, TimerToken};
use scene::picking::{Ray, pick_ray};
use scene::{RegionSet, ScenarioSelection, SelectionEvent};
use serde::Serialize;

/// One slider stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioMark {
    pub value: usize,
    pub label: String,
}

/// Geometry to upload for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGeometry {
    pub mesh: MeshBuffers,
    /// Line-list points, absent when the wireframe is off.
    pub wireframe: Option<Vec<[f32; 3]>>,
}

/// Everything the map shows once the data has loaded: regions, scales,
/// the scenario selection and the eased per-region styling.
#[derive(Debug)]
pub struct ViewerSession {
    regions: RegionSet,
    selection: ScenarioSelection,
    layer: ChoroplethLayer,
    scales: Scales,
    mesh: ExtrusionMesh,
    transitions: Transitions,
    lighting: Lighting,
    hovered: Option<usize>,
    geometry_dirty: bool,
}

impl ViewerSession {
    pub fn new(config: &MapConfig, loaded: LoadedDataset, now: Time) -> Self {
        let regions = loaded.regions;
        let selection = ScenarioSelection::new(
            regions.scenarios().clone(),
            config.playback.initial_scenario.as_deref(),
            config.playback.auto_advance,
            config.playback.interval_s(),
        );
        let layer = ChoroplethLayer::new(1, ExtrusionStyle::from(&config.style));
        let scales = layer.scales(&regions);
        let mesh = ExtrusionMesh::new(&regions);
        let lighting = Lighting::at(
            config.lighting.ambient_intensity,
            config.lighting.sun_intensity,
            config.lighting.sun_timestamp_ms,
            config.view.longitude,
            config.view.latitude,
        );

        let mut session = Self {
            regions,
            selection,
            layer,
            scales,
            mesh,
            transitions: Transitions::new(config.playback.transition_s()),
            lighting,
            hovered: None,
            geometry_dirty: true,
        };
        session.retarget(now);
        session
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn selection(&self) -> &ScenarioSelection {
        &self.selection
    }

    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn style(&self) -> &ExtrusionStyle {
        &self.layer.style
    }

    pub fn mesh_origin(&self) -> Vec3 {
        self.mesh.origin()
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn scenario_marks(&self) -> Vec<ScenarioMark> {
        self.regions
            .scenarios()
            .iter()
            .enumerate()
            .map(|(value, label)| ScenarioMark {
                value,
                label: label.to_string(),
            })
            .collect()
    }

    /// Slider or dropdown selection. Turns auto-advance off.
    pub fn select_index(&mut self, now: Time, index: usize) -> bool {
        let before = self.selection.selected_index();
        if !self.selection.select_index(now, index) {
            return false;
        }
        if self.selection.selected_index() != before {
            self.retarget(now);
        }
        true
    }

    pub fn set_auto_advance(&mut self, now: Time, enabled: bool) {
        self.selection.set_auto_advance(now, enabled);
    }

    /// Call once a frame has been drawn; returns a callback to schedule.
    pub fn after_render(&mut self, now: Time) -> Option<TimerToken> {
        self.selection.after_render(now)
    }

    /// A scheduled callback fired. Returns `true` when the scenario moved.
    pub fn on_timer(&mut self, now: Time, token: TimerToken) -> bool {
        let moved = self.selection.fire(now, token).is_some();
        if moved {
            self.retarget(now);
        }
        moved
    }

    /// Clock-driven alternative to [`Self::on_timer`].
    pub fn poll_timer(&mut self, now: Time) -> bool {
        let moved = self.selection.poll(now).is_some();
        if moved {
            self.retarget(now);
        }
        moved
    }

    pub fn is_animating(&self, now: Time) -> bool {
        self.transitions.is_active(now)
    }

    /// Geometry for `now` when anything changed since the last upload.
    pub fn take_geometry(&mut self, now: Time) -> Option<FrameGeometry> {
        let animating = self.transitions.is_active(now);
        if !self.geometry_dirty && !animating {
            return None;
        }
        self.geometry_dirty = animating;
        Some(self.geometry(now))
    }

    pub fn geometry(&self, now: Time) -> FrameGeometry {
        let (elevations, fills) = self.transitions.sample(now);
        let style = &self.layer.style;
        let highlight = self
            .hovered
            .and_then(|i| fills.get(i).map(|fill| (i, style.highlighted(*fill))));
        FrameGeometry {
            mesh: self.mesh.build(&elevations, &fills, highlight),
            wireframe: style.wireframe.then(|| self.mesh.wireframe(&elevations)),
        }
    }

    /// Region under `ray` against the heights displayed at `now`.
    pub fn pick(&self, now: Time, ray: Ray) -> Option<usize> {
        let (elevations, _) = self.transitions.sample(now);
        let heights = self.mesh.heights_units(&elevations);
        pick_ray(&self.regions, &heights, ray).map(|hit| hit.region)
    }

    /// Returns `true` when the highlighted region changed.
    pub fn set_hovered(&mut self, region: Option<usize>) -> bool {
        if self.hovered == region {
            return false;
        }
        self.hovered = region;
        self.geometry_dirty = true;
        true
    }

    pub fn tooltip(&self, region: usize) -> Option<Tooltip> {
        region_tooltip(&self.regions, region, self.selection.selected_index())
    }

    pub fn drain_events(&mut self) -> Vec<Stamped<SelectionEvent>> {
        self.selection.drain_events()
    }

    fn retarget(&mut self, now: Time) {
        let snapshot = self
            .layer
            .extract(&self.regions, &self.scales, self.selection.selected_index());
        self.transitions
            .set_targets(now, snapshot.elevations_m, snapshot.fills);
        self.geometry_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::ViewerSession;
    use foundation::math::Vec3;
    use foundation::time::Time;
    use formats::{LoadedDataset, MapConfig, SourceConfig, load_regions};
    use scene::SelectionEvent;
    use scene::picking::{Ray, world_point};

    const TOPO: &str = r#"{
        "type": "Topology",
        "arcs": [[[0,50],[1,50],[1,51],[0,51],[0,50]], [[2,50],[3,50],[3,51],[2,51],[2,50]]],
        "objects": {"zones": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "arcs": [[0]], "properties": {"msoa11nm": "West"}},
            {"type": "Polygon", "arcs": [[1]], "properties": {"msoa11nm": "East"}}
        ]}}
    }"#;
    const CSV: &str = "ReturnName,Low,Core,High\nWest,1,2,3\nEast,4,5,6\n";

    fn loaded() -> LoadedDataset {
        let source = SourceConfig {
            topology_object: Some("zones".to_string()),
            ..SourceConfig::default()
        };
        load_regions(TOPO, CSV, &source).unwrap()
    }

    fn session() -> ViewerSession {
        ViewerSession::new(&MapConfig::default(), loaded(), Time::ZERO)
    }

    #[test]
    fn opens_on_first_column_with_slider_marks() {
        let s = session();
        assert_eq!(s.selection().selected_name(), Some("Low"));
        assert_eq!(s.selection().selected_index(), Some(0));
        let labels: Vec<_> = s.scenario_marks().into_iter().map(|m| m.label).collect();
        assert_eq!(labels, vec!["Low", "Core", "High"]);
        assert_eq!(
            serde_json::to_string(&s.scenario_marks()[0]).unwrap(),
            r#"{"value":0,"label":"Low"}"#
        );
    }

    #[test]
    fn auto_advance_cycles_and_wraps_after_renders() {
        let mut s = session();
        let mut now = Time::ZERO;
        let mut seen = Vec::new();
        for _ in 0..3 {
            let token = s.after_render(now).unwrap();
            now = now.after(3.0);
            assert!(s.on_timer(now, token));
            seen.push(s.selection().selected_index().unwrap());
        }
        assert_eq!(seen, vec![1, 2, 0]);
    }

    #[test]
    fn configured_initial_scenario_overrides_first_column() {
        let mut config = MapConfig::default();
        config.playback.initial_scenario = Some("High".to_string());
        let s = ViewerSession::new(&config, loaded(), Time::ZERO);
        assert_eq!(s.selection().selected_name(), Some("High"));

        config.playback.initial_scenario = Some("Mid".to_string());
        let s = ViewerSession::new(&config, loaded(), Time::ZERO);
        assert_eq!(s.selection().selected_name(), Some("Low"));
    }

    #[test]
    fn manual_selection_stops_the_cycle() {
        let mut s = session();
        let token = s.after_render(Time::ZERO).unwrap();
        assert!(s.select_index(Time(1.0), 2));
        assert!(!s.on_timer(Time(3.0), token));
        assert!(s.after_render(Time(3.0)).is_none());
        assert_eq!(s.selection().selected_index(), Some(2));
        assert!(!s.select_index(Time(3.0), 7));
    }

    #[test]
    fn geometry_is_offered_only_when_something_changed() {
        let mut s = session();
        assert!(s.take_geometry(Time::ZERO).is_some());
        assert!(s.take_geometry(Time::ZERO).is_none());

        s.select_index(Time(1.0), 2);
        assert!(s.is_animating(Time(1.1)));
        assert!(s.take_geometry(Time(1.1)).is_some());
        assert!(s.take_geometry(Time(1.2)).is_some());
        assert!(s.take_geometry(Time(2.0)).is_some());
        assert!(s.take_geometry(Time(2.0)).is_none());

        assert!(s.set_hovered(Some(1)));
        assert!(!s.set_hovered(Some(1)));
        assert!(s.take_geometry(Time(2.0)).is_some());
    }

    #[test]
    fn wireframe_follows_the_style() {
        let mut config = MapConfig::default();
        let s = ViewerSession::new(&config, loaded(), Time::ZERO);
        assert!(s.geometry(Time::ZERO).wireframe.is_some());
        config.style.wireframe = false;
        let s = ViewerSession::new(&config, loaded(), Time::ZERO);
        assert!(s.geometry(Time::ZERO).wireframe.is_none());
    }

    #[test]
    fn picks_the_tallest_prism_from_above() {
        let s = session();
        let above_east = world_point(2.5, 50.5, 1.0e9);
        let ray = Ray::new(above_east, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(s.pick(Time::ZERO, ray), Some(1));

        let tip = s.tooltip(1).unwrap();
        assert_eq!(tip.name, "East");
        assert_eq!(tip.value, 5.0);
    }

    #[test]
    fn selection_events_are_drained_once() {
        let mut s = session();
        s.select_index(Time(1.0), 2);
        let events = s.drain_events();
        assert!(events.iter().any(|e| matches!(
            e.event,
            SelectionEvent::Selected { index: 2, .. }
        )));
        assert!(s.drain_events().is_empty());
    }
}
