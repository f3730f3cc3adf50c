use scene::RegionSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Channel-wise interpolation, rounded to the nearest integer.
    pub fn lerp(self, other: Rgba8, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    pub fn to_css_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Evenly spaced colour stops sampled by linear interpolation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorRamp {
    stops: &'static [Rgba8],
}

impl ColorRamp {
    /// Perceptually uniform black → purple → orange → pale yellow ramp.
    pub const INFERNO: ColorRamp = ColorRamp {
        stops: &[
            Rgba8::rgb(0x00, 0x00, 0x04),
            Rgba8::rgb(0x16, 0x0b, 0x39),
            Rgba8::rgb(0x42, 0x0a, 0x68),
            Rgba8::rgb(0x6a, 0x17, 0x6e),
            Rgba8::rgb(0x93, 0x26, 0x67),
            Rgba8::rgb(0xbc, 0x37, 0x54),
            Rgba8::rgb(0xdd, 0x51, 0x3a),
            Rgba8::rgb(0xf3, 0x78, 0x19),
            Rgba8::rgb(0xfc, 0xa5, 0x0a),
            Rgba8::rgb(0xf6, 0xd7, 0x46),
            Rgba8::rgb(0xfc, 0xff, 0xa4),
        ],
    };

    pub const fn new(stops: &'static [Rgba8]) -> Self {
        Self { stops }
    }

    /// Colour at `t`, clamped to `[0, 1]`. NaN samples the start.
    pub fn sample(&self, t: f64) -> Rgba8 {
        let Some(&first) = self.stops.first() else {
            return Rgba8::default();
        };
        if self.stops.len() == 1 {
            return first;
        }
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (self.stops.len() - 1) as f64;
        let i = (scaled.floor() as usize).min(self.stops.len() - 2);
        self.stops[i].lerp(self.stops[i + 1], scaled - i as f64)
    }
}

/// Value extent used by both scales.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Extent of every region's largest and smallest value, ignoring zeros.
    ///
    /// Only per-region extremes take part: a region whose minimum is zero
    /// contributes just its maximum. `None` when nothing non-zero remains.
    pub fn from_regions(set: &RegionSet) -> Option<Domain> {
        let mut extremes = Vec::with_capacity(set.len() * 2);
        for region in set.regions() {
            let values = region.values.iter().copied().filter(|v| !v.is_nan());
            let (lo, hi) = values.fold((None::<f64>, None::<f64>), |(lo, hi), v| {
                (
                    Some(lo.map_or(v, |l| l.min(v))),
                    Some(hi.map_or(v, |h| h.max(v))),
                )
            });
            extremes.extend(hi);
            extremes.extend(lo);
        }
        Self::extent(extremes.into_iter().filter(|&v| v != 0.0))
    }

    pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<Domain> {
        values
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<Domain>, v| {
                Some(match acc {
                    None => Domain::new(v, v),
                    Some(d) => Domain::new(d.min.min(v), d.max.max(v)),
                })
            })
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Position of `value` within the domain; 0.5 for a single-value domain.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.5
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }
}

/// Linear map from a domain to an output range, unclamped unless asked.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearScale {
    pub domain: Domain,
    pub range: [f64; 2],
    pub clamp: bool,
}

impl LinearScale {
    pub fn new(domain: Domain, range: [f64; 2]) -> Self {
        Self {
            domain,
            range,
            clamp: false,
        }
    }

    pub fn clamped(self, clamp: bool) -> Self {
        Self { clamp, ..self }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let mut t = self.domain.normalize(value);
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        self.range[0] + t * (self.range[1] - self.range[0])
    }
}

/// Domain mapped onto `[0, 1]` and fed to a colour ramp.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SequentialScale {
    pub domain: Domain,
    pub ramp: ColorRamp,
}

impl SequentialScale {
    pub fn new(domain: Domain, ramp: ColorRamp) -> Self {
        Self { domain, ramp }
    }

    pub fn apply(&self, value: f64) -> Rgba8 {
        self.ramp.sample(self.domain.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorRamp, Domain, LinearScale, Rgba8, SequentialScale};
    use pretty_assertions::assert_eq;
    use scene::{GeoPoint, Polygon, Region, RegionSet, ScenarioList};

    fn set(values: &[&[f64]]) -> RegionSet {
        let square = Polygon::new(vec![vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 0.0),
        ]]);
        let n = values.first().map_or(0, |v| v.len());
        let scenarios = ScenarioList::new((0..n).map(|i| format!("S{i}")));
        let regions = values
            .iter()
            .enumerate()
            .map(|(i, v)| Region::new(format!("R{i}"), vec![square.clone()], v.to_vec()))
            .collect();
        RegionSet::new(scenarios, regions).unwrap()
    }

    #[test]
    fn domain_ignores_zero_extremes() {
        let d = Domain::from_regions(&set(&[&[0.0, 5.0], &[10.0, 20.0], &[0.0, 0.0]])).unwrap();
        assert_eq!(d, Domain::new(5.0, 20.0));
    }

    #[test]
    fn domain_uses_only_per_region_extremes() {
        // The first region's min is 0 and drops out, so its 5 never takes part.
        let d = Domain::from_regions(&set(&[&[0.0, 5.0, 10.0], &[20.0, 30.0, 25.0]])).unwrap();
        assert_eq!(d, Domain::new(10.0, 30.0));
    }

    #[test]
    fn negative_values_widen_the_domain() {
        let d = Domain::from_regions(&set(&[&[-4.0, 0.0, 2.0]])).unwrap();
        assert_eq!(d, Domain::new(-4.0, 2.0));
    }

    #[test]
    fn all_zero_or_empty_has_no_domain() {
        assert_eq!(Domain::from_regions(&set(&[&[0.0, 0.0], &[0.0, 0.0]])), None);
        assert_eq!(Domain::from_regions(&set(&[])), None);
    }

    #[test]
    fn linear_scale_is_unclamped_by_default() {
        let s = LinearScale::new(Domain::new(10.0, 20.0), [0.0, 100_000.0]);
        assert_eq!(s.apply(10.0), 0.0);
        assert_eq!(s.apply(15.0), 50_000.0);
        assert_eq!(s.apply(0.0), -100_000.0);
        assert_eq!(s.clamped(true).apply(0.0), 0.0);
    }

    #[test]
    fn degenerate_domain_maps_to_range_middle() {
        let s = LinearScale::new(Domain::new(4.0, 4.0), [0.0, 100_000.0]);
        assert_eq!(s.apply(4.0), 50_000.0);
        assert_eq!(s.apply(-1.0), 50_000.0);
        let c = SequentialScale::new(Domain::new(4.0, 4.0), ColorRamp::INFERNO);
        assert_eq!(c.apply(4.0), Rgba8::rgb(0xbc, 0x37, 0x54));
    }

    #[test]
    fn inferno_endpoints_and_clamping() {
        let c = SequentialScale::new(Domain::new(0.0, 1.0), ColorRamp::INFERNO);
        assert_eq!(c.apply(0.0), Rgba8::rgb(0, 0, 4));
        assert_eq!(c.apply(1.0), Rgba8::rgb(0xfc, 0xff, 0xa4));
        assert_eq!(c.apply(-3.0), c.apply(0.0));
        assert_eq!(c.apply(7.0), c.apply(1.0));
        assert_eq!(c.apply(1.0).to_css_hex(), "#fcffa4");
    }

    #[test]
    fn ramp_interpolates_between_stops() {
        const STOPS: &[Rgba8] = &[Rgba8::rgb(0, 0, 0), Rgba8::rgb(200, 100, 50), Rgba8::WHITE];
        let ramp = ColorRamp::new(STOPS);
        assert_eq!(ramp.sample(0.25), Rgba8::rgb(100, 50, 25));
        assert_eq!(ramp.sample(0.5), Rgba8::rgb(200, 100, 50));
        assert_eq!(ramp.sample(f64::NAN), Rgba8::rgb(0, 0, 0));
    }
}
