use foundation::math::Vec3;

/// Material response matching deck.gl's default lighting material.
pub const AMBIENT_REFLECTANCE: f32 = 0.35;
pub const DIFFUSE_REFLECTANCE: f32 = 0.6;

/// Ambient light plus one directional sun.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Lighting {
    pub ambient_intensity: f32,
    pub sun_intensity: f32,
    /// Unit vector towards the sun in local East-North-Up.
    pub sun_dir: Vec3,
}

impl Lighting {
    /// Sun placed for `timestamp_ms` (Unix epoch, UTC) as seen from the
    /// view centre.
    pub fn at(
        ambient_intensity: f32,
        sun_intensity: f32,
        timestamp_ms: f64,
        lon_deg: f64,
        lat_deg: f64,
    ) -> Self {
        let sun_dir = subsolar_point(timestamp_ms)
            .map(|(slon, slat)| sun_direction_enu(slon, slat, lon_deg, lat_deg))
            .unwrap_or(Vec3::UNIT_Z);
        Self {
            ambient_intensity,
            sun_intensity,
            sun_dir,
        }
    }

    /// Brightness factor for a surface with unit `normal`.
    pub fn shade(&self, normal: Vec3) -> f32 {
        let lambert = normal.dot(self.sun_dir).max(0.0) as f32;
        AMBIENT_REFLECTANCE * self.ambient_intensity
            + DIFFUSE_REFLECTANCE * self.sun_intensity * lambert
    }

    /// `[sun_x, sun_y, sun_z, 0]`, `[ambient, diffuse, 0, 0]` for a uniform.
    pub fn to_uniform(&self) -> [[f32; 4]; 2] {
        let d = self.sun_dir.to_f32();
        [
            [d[0], d[1], d[2], 0.0],
            [
                AMBIENT_REFLECTANCE * self.ambient_intensity,
                DIFFUSE_REFLECTANCE * self.sun_intensity,
                0.0,
                0.0,
            ],
        ]
    }
}

fn wrap_360(mut d: f64) -> f64 {
    d %= 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    d
}

fn wrap_180(d: f64) -> f64 {
    let d = wrap_360(d);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Low-cost solar ephemeris: `(lon, lat)` in degrees of the point where the
/// sun is overhead at `timestamp_ms`.
pub fn subsolar_point(timestamp_ms: f64) -> Option<(f64, f64)> {
    if !timestamp_ms.is_finite() {
        return None;
    }

    // Julian Day from Unix epoch (1970-01-01T00:00:00Z) == 2440587.5
    let jd = 2440587.5 + timestamp_ms / 86_400_000.0;
    let n = jd - 2451545.0; // days since J2000

    // Mean longitude and anomaly (degrees)
    let l = wrap_360(280.46 + 0.9856474 * n);
    let g = wrap_360(357.528 + 0.9856003 * n);

    // Ecliptic longitude and obliquity (degrees)
    let lambda = wrap_360(l + 1.915 * g.to_radians().sin() + 0.020 * (2.0 * g).to_radians().sin());
    let epsilon = 23.439 - 0.0000004 * n;

    let lambda_rad = lambda.to_radians();
    let eps_rad = epsilon.to_radians();
    let alpha = (eps_rad.cos() * lambda_rad.sin())
        .atan2(lambda_rad.cos())
        .to_degrees();
    let delta = (eps_rad.sin() * lambda_rad.sin()).asin().to_degrees();

    // Greenwich Mean Sidereal Time (degrees)
    let t = n / 36525.0;
    let gmst = wrap_360(
        280.46061837 + 360.98564736629 * n + 0.000387933 * t * t - (t * t * t) / 38710000.0,
    );

    Some((wrap_180(alpha - gmst), delta))
}

/// Direction to a sun overhead at `(sun_lon, sun_lat)`, expressed in the
/// East-North-Up frame at `(lon, lat)`.
pub fn sun_direction_enu(sun_lon_deg: f64, sun_lat_deg: f64, lon_deg: f64, lat_deg: f64) -> Vec3 {
    let (slon, slat) = (sun_lon_deg.to_radians(), sun_lat_deg.to_radians());
    let s = Vec3::new(slat.cos() * slon.cos(), slat.cos() * slon.sin(), slat.sin());

    let (lon, lat) = (lon_deg.to_radians(), lat_deg.to_radians());
    let east = Vec3::new(-lon.sin(), lon.cos(), 0.0);
    let north = Vec3::new(-lat.sin() * lon.cos(), -lat.sin() * lon.sin(), lat.cos());
    let up = Vec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());

    Vec3::new(s.dot(east), s.dot(north), s.dot(up)).normalize()
}

#[cfg(test)]
mod tests {
    use super::{Lighting, subsolar_point, sun_direction_enu};
    use foundation::math::Vec3;

    // 2019-08-01T08:00:00Z
    const MORNING_MS: f64 = 1_564_646_400_000.0;

    #[test]
    fn subsolar_point_on_an_august_morning() {
        let (lon, lat) = subsolar_point(MORNING_MS).unwrap();
        // Local apparent noon is four hours east of Greenwich, give or take
        // the equation of time; declination is about +18 degrees.
        assert!((55.0..65.0).contains(&lon), "lon {lon}");
        assert!((17.0..19.0).contains(&lat), "lat {lat}");
        assert!(subsolar_point(f64::NAN).is_none());
    }

    #[test]
    fn morning_sun_over_england_is_up_and_east() {
        let l = Lighting::at(1.0, 1.0, MORNING_MS, -0.5, 53.0);
        assert!(l.sun_dir.z > 0.3, "{:?}", l.sun_dir);
        assert!(l.sun_dir.x > 0.5, "{:?}", l.sun_dir);
        assert!((l.sun_dir.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn overhead_sun_is_straight_up() {
        let d = sun_direction_enu(10.0, 20.0, 10.0, 20.0);
        assert!((d.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn shading_adds_diffuse_only_on_lit_faces() {
        let l = Lighting {
            ambient_intensity: 1.0,
            sun_intensity: 1.0,
            sun_dir: Vec3::UNIT_Z,
        };
        assert!((l.shade(Vec3::UNIT_Z) - 0.95).abs() < 1e-6);
        assert!((l.shade(-Vec3::UNIT_Z) - 0.35).abs() < 1e-6);
    }
}
