use foundation::math::{Vec2, Vec3, lon_lat_to_mercator, mercator_to_lon_lat, units_per_pixel};
use formats::ViewConfig;
use scene::picking::Ray;

/// Camera height above the target, in viewport heights.
const ALTITUDE: f64 = 1.5;
const MAX_PITCH_DEG: f64 = 60.0;
const MIN_ZOOM: f64 = 0.0;

/// Map-style view state: where the camera looks and how it is tilted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub max_zoom: f64,
    /// Degrees from straight down.
    pub pitch: f64,
    /// Degrees clockwise from north.
    pub bearing: f64,
}

impl From<ViewConfig> for MapView {
    fn from(v: ViewConfig) -> Self {
        Self {
            longitude: v.longitude,
            latitude: v.latitude,
            zoom: v.zoom.clamp(MIN_ZOOM, v.max_zoom.max(MIN_ZOOM)),
            max_zoom: v.max_zoom,
            pitch: v.pitch.clamp(0.0, MAX_PITCH_DEG),
            bearing: v.bearing,
        }
    }
}

/// Per-frame camera derived from a [`MapView`] and a viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraFrame {
    /// Column-major view-projection for positions relative to `origin`.
    pub view_proj: [[f32; 4]; 4],
    pub origin: Vec3,
    /// Eye position in world (mercator) units.
    pub eye: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub tan_half_fovy: f64,
    pub aspect: f64,
}

impl CameraFrame {
    /// World-space ray through the pixel at `(x_px, y_px)`, origin top-left.
    pub fn ray(&self, x_px: f64, y_px: f64, width: f64, height: f64) -> Ray {
        let ndc_x = 2.0 * x_px / width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * y_px / height.max(1.0);
        let dir = self.forward
            + self.right * (ndc_x * self.tan_half_fovy * self.aspect)
            + self.up * (ndc_y * self.tan_half_fovy);
        Ray::new(self.eye, dir.normalize())
    }
}

impl MapView {
    fn target(&self) -> Vec2 {
        lon_lat_to_mercator(self.longitude, self.latitude)
    }

    /// Camera looking at the view centre from `ALTITUDE` viewport heights,
    /// matching the usual 512 px web map tile scale.
    pub fn camera(&self, width: f64, height: f64, origin: Vec3) -> CameraFrame {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let aspect = width / height;
        let tan_half_fovy = 0.5 / ALTITUDE;
        let fovy = 2.0 * tan_half_fovy.atan();

        let distance = ALTITUDE * height * units_per_pixel(self.zoom);
        let pitch = self.pitch.to_radians();
        let bearing = self.bearing.to_radians();
        let heading = Vec3::new(bearing.sin(), bearing.cos(), 0.0);

        let t = self.target();
        let target = Vec3::new(t.x, t.y, 0.0);
        let eye = target - heading * (distance * pitch.sin()) + Vec3::UNIT_Z * (distance * pitch.cos());
        let forward = (target - eye).normalize();
        let right = forward.cross(heading).normalize();
        let up = right.cross(forward);

        let view = look_at(eye - origin, forward, right, up);
        let proj = perspective(fovy, aspect, distance * 0.01, distance * 100.0);
        CameraFrame {
            view_proj: to_f32(mat4_mul(proj, view)),
            origin,
            eye,
            forward,
            right,
            up,
            tan_half_fovy,
            aspect,
        }
    }

    /// Rotate by pointer drag: horizontal turns the bearing, vertical tilts.
    pub fn orbit(&mut self, delta_x_px: f64, delta_y_px: f64) {
        let speed = 0.25;
        self.bearing = (self.bearing + delta_x_px * speed).rem_euclid(360.0);
        self.pitch = (self.pitch - delta_y_px * speed).clamp(0.0, MAX_PITCH_DEG);
    }

    /// Drag the map under the pointer.
    pub fn pan(&mut self, delta_x_px: f64, delta_y_px: f64) {
        let upp = units_per_pixel(self.zoom);
        let b = self.bearing.to_radians();
        let right = Vec2::new(b.cos(), -b.sin());
        let ahead = Vec2::new(b.sin(), b.cos());
        let t = self.target();
        let moved = Vec2::new(
            t.x + upp * (-delta_x_px * right.x + delta_y_px * ahead.x),
            t.y + upp * (-delta_x_px * right.y + delta_y_px * ahead.y),
        );
        let (lon, lat) = mercator_to_lon_lat(moved);
        self.longitude = lon;
        self.latitude = lat;
    }

    /// Wheel zoom; positive `wheel_delta_y` zooms out.
    pub fn zoom_by(&mut self, wheel_delta_y: f64) {
        self.zoom = (self.zoom - wheel_delta_y * 0.0025).clamp(MIN_ZOOM, self.max_zoom);
    }
}

type Mat4 = [[f64; 4]; 4];

fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    // Column-major: c = a * b
    let mut c = [[0.0f64; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

fn perspective(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    // RH, depth range [0, 1].
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far / (near - far), -1.0],
        [0.0, 0.0, (near * far) / (near - far), 0.0],
    ]
}

fn look_at(eye: Vec3, forward: Vec3, right: Vec3, up: Vec3) -> Mat4 {
    [
        [right.x, up.x, -forward.x, 0.0],
        [right.y, up.y, -forward.y, 0.0],
        [right.z, up.z, -forward.z, 0.0],
        [-right.dot(eye), -up.dot(eye), forward.dot(eye), 1.0],
    ]
}

fn to_f32(m: Mat4) -> [[f32; 4]; 4] {
    m.map(|col| col.map(|v| v as f32))
}
