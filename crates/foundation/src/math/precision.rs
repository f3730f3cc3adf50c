//! Float handling shared by the CPU side and the GPU upload path.
//!
//! - `stable_total_cmp_f64`: deterministic ordering for picking distances.
//! - `CameraRelative`: projected mercator coordinates are ~10^6 in magnitude,
//!   so vertices are uploaded as `f32` offsets from an `f64` origin.

use core::cmp::Ordering;

use super::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraRelative {
    pub origin: Vec3,
}

impl CameraRelative {
    pub fn new(origin: Vec3) -> Self {
        Self { origin }
    }

    #[inline]
    pub fn to_f32(self, world: Vec3) -> [f32; 3] {
        let d = world - self.origin;
        [d.x as f32, d.y as f32, d.z as f32]
    }
}

/// `-0.0` becomes `0.0`; every NaN becomes the canonical NaN.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

#[cfg(test)]
mod tests {
    use super::{CameraRelative, canonical_f64, stable_total_cmp_f64};
    use core::cmp::Ordering;

    use crate::math::Vec3;

    #[test]
    fn negative_zero_sorts_with_zero() {
        assert_eq!(canonical_f64(-0.0), 0.0);
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn camera_relative_keeps_metre_offsets_at_mercator_scale() {
        let origin = Vec3::new(-55_659.75, 6_982_997.92, 0.0);
        let world = Vec3::new(-55_658.5, 6_982_999.42, 12.0);
        assert_eq!(CameraRelative::new(origin).to_f32(world), [1.25, 1.5, 12.0]);
    }
}
