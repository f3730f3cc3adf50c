use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Vec2, Vec3, lon_lat_to_mercator, mercator_to_lon_lat};

use crate::region::{GeoPoint, Polygon, RegionSet};

/// A ray in projected world space (mercator units, z up).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub region: usize,
    pub distance: f64,
    pub point: Vec3,
}

/// Even-odd test over every ring, so holes punch through the outer ring.
pub fn polygon_contains(poly: &Polygon, lon_deg: f64, lat_deg: f64) -> bool {
    let mut inside = false;
    for ring in &poly.rings {
        if ring_crossings_odd(ring, lon_deg, lat_deg) {
            inside = !inside;
        }
    }
    inside
}

fn ring_crossings_odd(ring: &[GeoPoint], x: f64, y: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut odd = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lon_deg, ring[i].lat_deg);
        let (xj, yj) = (ring[j].lon_deg, ring[j].lat_deg);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            odd = !odd;
        }
        j = i;
    }
    odd
}

/// Region whose footprint contains the point. Lower indices win overlaps.
pub fn pick_lon_lat(regions: &RegionSet, lon_deg: f64, lat_deg: f64) -> Option<usize> {
    regions.regions().iter().position(|r| {
        r.bounds.contains(lon_deg, lat_deg)
            && r.polygons.iter().any(|p| polygon_contains(p, lon_deg, lat_deg))
    })
}

/// Nearest extruded region hit by `ray`.
///
/// `heights[i]` is region `i`'s extrusion in mercator units; the top face of a
/// prism sits at `max(height, 0)`. Side walls are not tested, so a ray grazing
/// a wall below the top face picks whatever lies behind it.
///
/// Ordering contract: the smallest distance wins; equal distances go to the
/// lower region index.
pub fn pick_ray(regions: &RegionSet, heights: &[f64], ray: Ray) -> Option<PickHit> {
    let dir = ray.dir.normalize();
    if dir.z.abs() < 1e-12 {
        return None;
    }

    let mut best: Option<PickHit> = None;
    for (index, region) in regions.regions().iter().enumerate() {
        let top = heights.get(index).copied().unwrap_or(0.0).max(0.0);
        let t = (top - ray.origin.z) / dir.z;
        if t < 0.0 || !t.is_finite() {
            continue;
        }
        let point = ray.origin + dir * t;
        let (lon, lat) = mercator_to_lon_lat(Vec2::new(point.x, point.y));
        if !region.bounds.contains(lon, lat) {
            continue;
        }
        if !region.polygons.iter().any(|p| polygon_contains(p, lon, lat)) {
            continue;
        }

        let hit = PickHit {
            region: index,
            distance: t,
            point,
        };
        best = match best {
            None => Some(hit),
            Some(b) => {
                let ord = stable_total_cmp_f64(hit.distance, b.distance)
                    .then_with(|| hit.region.cmp(&b.region));
                if ord.is_lt() { Some(hit) } else { Some(b) }
            }
        };
    }
    best
}

/// World-space position of a lon/lat at height `z` (mercator units).
pub fn world_point(lon_deg: f64, lat_deg: f64, z: f64) -> Vec3 {
    let p = lon_lat_to_mercator(lon_deg, lat_deg);
    Vec3::new(p.x, p.y, z)
}

#[cfg(test)]
mod tests {
    use super::{Ray, pick_lon_lat, pick_ray, polygon_contains, world_point};
    use crate::region::{GeoPoint, Polygon, Region, RegionSet, ScenarioList};
    use foundation::math::Vec3;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(x0, y0),
            GeoPoint::new(x1, y0),
            GeoPoint::new(x1, y1),
            GeoPoint::new(x0, y1),
            GeoPoint::new(x0, y0),
        ]
    }

    fn regions() -> RegionSet {
        let donut = Polygon::new(vec![rect(0.0, 50.0, 1.0, 51.0), rect(0.25, 50.25, 0.75, 50.75)]);
        let east = Polygon::new(vec![rect(1.0, 50.0, 2.0, 51.0)]);
        RegionSet::new(
            ScenarioList::new(["Core"]),
            vec![
                Region::new("donut", vec![donut], vec![1.0]),
                Region::new("east", vec![east], vec![2.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn holes_are_not_inside() {
        let set = regions();
        let donut = &set.regions()[0].polygons[0];
        assert!(polygon_contains(donut, 0.1, 50.1));
        assert!(!polygon_contains(donut, 0.5, 50.5));
    }

    #[test]
    fn lon_lat_pick_finds_region() {
        let set = regions();
        assert_eq!(pick_lon_lat(&set, 0.1, 50.9), Some(0));
        assert_eq!(pick_lon_lat(&set, 1.5, 50.5), Some(1));
        assert_eq!(pick_lon_lat(&set, 0.5, 50.5), None);
        assert_eq!(pick_lon_lat(&set, 5.0, 50.5), None);
    }

    #[test]
    fn ray_hits_top_face_of_taller_prism_first() {
        let set = regions();
        let above = world_point(1.5, 50.5, 10_000.0);
        let ray = Ray::new(above, Vec3::new(0.0, 0.0, -1.0));

        let hit = pick_ray(&set, &[100.0, 500.0], ray).unwrap();
        assert_eq!(hit.region, 1);
        assert!((hit.distance - 9_500.0).abs() < 1e-6);
        assert!((hit.point.z - 500.0).abs() < 1e-6);
    }

    #[test]
    fn ray_through_hole_misses() {
        let set = regions();
        let ray = Ray::new(world_point(0.5, 50.5, 1_000.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(pick_ray(&set, &[100.0, 100.0], ray).is_none());
    }

    #[test]
    fn horizontal_ray_picks_nothing() {
        let set = regions();
        let ray = Ray::new(world_point(0.1, 50.1, 10.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(pick_ray(&set, &[100.0, 100.0], ray).is_none());
    }
}
