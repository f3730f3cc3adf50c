//! Spherical Web Mercator.
//!
//! Projected units are "mercator meters": true meters at the equator, growing
//! by `1 / cos(lat)` towards the poles. Extrusion heights given in real meters
//! must be scaled with [`units_per_meter`] before being mixed with projected
//! coordinates.

use super::Vec2;

/// Sphere radius used by Web Mercator (the WGS84 semi-major axis, meters).
pub const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude where Web Mercator becomes square.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_78;

/// Pixel width of the whole world at zoom 0 (deck.gl / MapLibre convention).
pub const TILE_SIZE_PX: f64 = 512.0;

pub fn clamp_lat_deg(lat_deg: f64) -> f64 {
    lat_deg.clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
}

pub fn lon_lat_to_mercator(lon_deg: f64, lat_deg: f64) -> Vec2 {
    let x = MERCATOR_RADIUS_M * lon_deg.to_radians();
    let lat = clamp_lat_deg(lat_deg).to_radians();
    let y = MERCATOR_RADIUS_M * (0.5 * (std::f64::consts::FRAC_PI_2 + lat)).tan().ln();
    Vec2::new(x, y)
}

pub fn mercator_to_lon_lat(p: Vec2) -> (f64, f64) {
    let lon = (p.x / MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (p.y / MERCATOR_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    (lon, lat)
}

/// Mercator units covering one real meter at `lat_deg`.
pub fn units_per_meter(lat_deg: f64) -> f64 {
    let c = clamp_lat_deg(lat_deg).to_radians().cos();
    if c <= 1e-12 { 1.0 } else { 1.0 / c }
}

/// Mercator units covered by one screen pixel at `zoom`.
pub fn units_per_pixel(zoom: f64) -> f64 {
    let world = 2.0 * std::f64::consts::PI * MERCATOR_RADIUS_M;
    world / (TILE_SIZE_PX * 2f64.powf(zoom))
}

#[cfg(test)]
mod tests {
    use super::{
        MERCATOR_RADIUS_M, lon_lat_to_mercator, mercator_to_lon_lat, units_per_meter,
        units_per_pixel,
    };

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_zero() {
        let p = lon_lat_to_mercator(0.0, 0.0);
        assert_close(p.x, 0.0, 1e-9);
        assert_close(p.y, 0.0, 1e-9);
    }

    #[test]
    fn antimeridian_is_half_circumference() {
        let p = lon_lat_to_mercator(180.0, 0.0);
        assert_close(p.x, std::f64::consts::PI * MERCATOR_RADIUS_M, 1e-6);
    }

    #[test]
    fn round_trip_in_britain() {
        let p = lon_lat_to_mercator(-0.5, 53.0);
        let (lon, lat) = mercator_to_lon_lat(p);
        assert_close(lon, -0.5, 1e-9);
        assert_close(lat, 53.0, 1e-9);
    }

    #[test]
    fn scale_factor_grows_with_latitude() {
        assert_close(units_per_meter(0.0), 1.0, 1e-12);
        assert_close(units_per_meter(60.0), 2.0, 1e-9);
    }

    #[test]
    fn zoom_halves_units_per_pixel() {
        assert_close(units_per_pixel(1.0) * 2.0, units_per_pixel(0.0), 1e-6);
    }
}
