use foundation::time::{Time, TimeSpan};

use crate::symbology::Rgba8;

/// Per-region elevation and colour easing towards the latest targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Transitions {
    duration_s: f64,
    from_elevations: Vec<f64>,
    from_fills: Vec<Rgba8>,
    to_elevations: Vec<f64>,
    to_fills: Vec<Rgba8>,
    span: Option<TimeSpan>,
}

impl Transitions {
    pub fn new(duration_s: f64) -> Self {
        Self {
            duration_s: duration_s.max(0.0),
            from_elevations: Vec::new(),
            from_fills: Vec::new(),
            to_elevations: Vec::new(),
            to_fills: Vec::new(),
            span: None,
        }
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// Starts easing from whatever is displayed at `now` towards the targets.
    ///
    /// The first targets, or targets for a different region count, are shown
    /// immediately.
    pub fn set_targets(&mut self, now: Time, elevations_m: Vec<f64>, fills: Vec<Rgba8>) {
        if self.to_elevations.len() != elevations_m.len() || self.to_fills.len() != fills.len() {
            self.from_elevations = elevations_m.clone();
            self.from_fills = fills.clone();
            self.to_elevations = elevations_m;
            self.to_fills = fills;
            self.span = None;
            return;
        }

        let (elevations, colours) = self.sample(now);
        self.from_elevations = elevations;
        self.from_fills = colours;
        self.to_elevations = elevations_m;
        self.to_fills = fills;
        self.span = Some(TimeSpan::starting_at(now, self.duration_s));
    }

    pub fn is_active(&self, now: Time) -> bool {
        self.span.is_some_and(|s| s.progress(now) < 1.0)
    }

    /// Interpolated elevations and fills at `now`.
    pub fn sample(&self, now: Time) -> (Vec<f64>, Vec<Rgba8>) {
        let t = self.span.map_or(1.0, |s| s.progress(now));
        if t >= 1.0 {
            return (self.to_elevations.clone(), self.to_fills.clone());
        }
        let elevations = self
            .from_elevations
            .iter()
            .zip(&self.to_elevations)
            .map(|(a, b)| a + (b - a) * t)
            .collect();
        let fills = self
            .from_fills
            .iter()
            .zip(&self.to_fills)
            .map(|(a, b)| a.lerp(*b, t))
            .collect();
        (elevations, fills)
    }
}
