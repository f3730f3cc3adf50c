use formats::StyleConfig;

use crate::symbology::Rgba8;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;
}

/// Look of an extruded polygon layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExtrusionStyle {
    pub visible: bool,
    /// Elevation in meters at the low and high ends of the value domain.
    pub elevation_range: [f64; 2],
    /// Whole-layer opacity applied to every fill.
    pub opacity: f32,
    pub wireframe: bool,
    pub line_color: Rgba8,
    /// Blended over the fill of the hovered region.
    pub highlight_color: Rgba8,
}

impl Default for ExtrusionStyle {
    fn default() -> Self {
        Self {
            visible: true,
            elevation_range: [0.0, 100_000.0],
            opacity: 0.8,
            wireframe: true,
            line_color: Rgba8::WHITE,
            highlight_color: Rgba8::new(100, 100, 100, 100),
        }
    }
}

impl ExtrusionStyle {
    pub fn fill_alpha(&self) -> u8 {
        (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// `fill` with the highlight colour composited over it.
    pub fn highlighted(&self, fill: Rgba8) -> Rgba8 {
        let t = self.highlight_color.a as f64 / 255.0;
        fill.lerp(self.highlight_color.with_alpha(fill.a), t)
    }
}

impl From<&StyleConfig> for ExtrusionStyle {
    fn from(style: &StyleConfig) -> Self {
        let [r, g, b] = style.line_color;
        let [hr, hg, hb, ha] = style.highlight_color;
        Self {
            visible: true,
            elevation_range: style.elevation_range,
            opacity: style.opacity,
            wireframe: style.wireframe,
            line_color: Rgba8::rgb(r, g, b),
            highlight_color: Rgba8::new(hr, hg, hb, ha),
        }
    }
}
