//! Extruded prism geometry for region footprints.
//!
//! Footprints are projected to Web Mercator and triangulated once. Vertex
//! buffers are rebuilt from per-region heights and colours whenever those
//! change; positions are `f32` offsets from a fixed origin near the data.

use earcutr::earcut;
use foundation::math::{CameraRelative, Vec2, Vec3, lon_lat_to_mercator, units_per_meter};
use scene::{GeoPoint, RegionSet};

use crate::symbology::Rgba8;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExtrudedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub region: u32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<ExtrudedVertex>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Footprint {
    region: u32,
    /// Rings in mercator units relative to the mesh origin, closing point dropped.
    rings: Vec<Vec<Vec2>>,
    /// Sign that turns each ring edge's right-hand normal into an outward one.
    outward: Vec<f64>,
    /// Cap triangles indexing the rings' points in order.
    triangles: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionMesh {
    origin: Vec3,
    units_per_meter: f64,
    footprints: Vec<Footprint>,
    region_count: usize,
}

impl ExtrusionMesh {
    pub fn new(set: &RegionSet) -> Self {
        let (origin, upm) = match set.bounds().center() {
            Some([lon, lat]) => {
                let p = lon_lat_to_mercator(lon, lat);
                (Vec3::new(p.x, p.y, 0.0), units_per_meter(lat))
            }
            None => (Vec3::ZERO, 1.0),
        };

        let mut footprints = Vec::new();
        let mut dropped = 0usize;
        for (index, region) in set.regions().iter().enumerate() {
            for poly in &region.polygons {
                match Footprint::build(index as u32, &poly.rings, origin) {
                    Some(fp) => footprints.push(fp),
                    None => dropped += 1,
                }
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "polygons failed to triangulate");
        }

        Self {
            origin,
            units_per_meter: upm,
            footprints,
            region_count: set.len(),
        }
    }

    /// World position (mercator units) that vertex positions are relative to.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn units_per_meter(&self) -> f64 {
        self.units_per_meter
    }

    pub fn region_count(&self) -> usize {
        self.region_count
    }

    /// Elevations converted to mercator units, ready for picking.
    pub fn heights_units(&self, elevations_m: &[f64]) -> Vec<f64> {
        (0..self.region_count)
            .map(|i| elevations_m.get(i).copied().unwrap_or(0.0) * self.units_per_meter)
            .collect()
    }

    /// Top caps and side walls for every footprint.
    ///
    /// Each region is raised from zero to its height; a negative height
    /// extends the prism below the ground plane. `highlight` replaces the
    /// colour of one region.
    pub fn build(
        &self,
        elevations_m: &[f64],
        fills: &[Rgba8],
        highlight: Option<(usize, Rgba8)>,
    ) -> MeshBuffers {
        let rel = CameraRelative::new(self.origin);
        let mut out = MeshBuffers::default();

        for fp in &self.footprints {
            let r = fp.region as usize;
            let h = elevations_m.get(r).copied().unwrap_or(0.0) * self.units_per_meter;
            let fill = match highlight {
                Some((i, c)) if i == r => c,
                _ => fills.get(r).copied().unwrap_or_default(),
            };
            let color = fill.to_f32();
            let vertex = |x: f64, y: f64, z: f64, n: Vec3| ExtrudedVertex {
                position: rel.to_f32(self.origin + Vec3::new(x, y, z)),
                normal: n.to_f32(),
                color,
                region: fp.region,
            };

            // Cap.
            let base = out.vertices.len() as u32;
            for p in fp.rings.iter().flatten() {
                out.vertices.push(vertex(p.x, p.y, h, Vec3::UNIT_Z));
            }
            out.indices.extend(fp.triangles.iter().map(|i| base + i));

            // Walls: one quad per edge with a flat outward normal.
            for (ring, sign) in fp.rings.iter().zip(&fp.outward) {
                for k in 0..ring.len() {
                    let a = ring[k];
                    let b = ring[(k + 1) % ring.len()];
                    let d = b - a;
                    let n = Vec3::new(d.y * sign, -d.x * sign, 0.0).normalize();
                    let q = out.vertices.len() as u32;
                    out.vertices.push(vertex(a.x, a.y, 0.0, n));
                    out.vertices.push(vertex(b.x, b.y, 0.0, n));
                    out.vertices.push(vertex(b.x, b.y, h, n));
                    out.vertices.push(vertex(a.x, a.y, h, n));
                    out.indices.extend([q, q + 1, q + 2, q, q + 2, q + 3]);
                }
            }
        }
        out
    }

    /// Outline segments as point pairs: the top edge of every ring plus a
    /// vertical edge at each ring vertex.
    pub fn wireframe(&self, elevations_m: &[f64]) -> Vec<[f32; 3]> {
        let rel = CameraRelative::new(self.origin);
        let at = |p: Vec2, z: f64| rel.to_f32(self.origin + Vec3::new(p.x, p.y, z));
        let mut out = Vec::new();
        for fp in &self.footprints {
            let h = elevations_m.get(fp.region as usize).copied().unwrap_or(0.0)
                * self.units_per_meter;
            for ring in &fp.rings {
                for k in 0..ring.len() {
                    let a = ring[k];
                    let b = ring[(k + 1) % ring.len()];
                    out.push(at(a, h));
                    out.push(at(b, h));
                    out.push(at(a, 0.0));
                    out.push(at(a, h));
                }
            }
        }
        out
    }
}

impl Footprint {
    fn build(region: u32, rings: &[Vec<GeoPoint>], origin: Vec3) -> Option<Self> {
        let mut projected: Vec<Vec<Vec2>> = Vec::with_capacity(rings.len());
        let mut outward = Vec::with_capacity(rings.len());
        let mut coords: Vec<f64> = Vec::new();
        let mut holes: Vec<usize> = Vec::new();

        for (ring_i, ring) in rings.iter().enumerate() {
            let mut pts: Vec<Vec2> = ring
                .iter()
                .map(|p| {
                    let m = lon_lat_to_mercator(p.lon_deg, p.lat_deg);
                    Vec2::new(m.x - origin.x, m.y - origin.y)
                })
                .collect();
            drop_closing_duplicate(&mut pts);
            if pts.len() < 3 {
                // A hole too small to matter; an outer ring this small means no polygon.
                if ring_i == 0 {
                    return None;
                }
                continue;
            }

            let area = signed_area(&pts);
            // Outer rings face out when counter-clockwise, holes when clockwise.
            let ccw = area > 0.0;
            outward.push(if (ring_i == 0) == ccw { 1.0 } else { -1.0 });

            if ring_i > 0 {
                holes.push(coords.len() / 2);
            }
            for p in &pts {
                coords.push(p.x);
                coords.push(p.y);
            }
            projected.push(pts);
        }

        let triangles = earcut(&coords, &holes, 2).ok()?;
        if triangles.is_empty() {
            return None;
        }
        Some(Self {
            region,
            rings: projected,
            outward,
            triangles: triangles.into_iter().map(|i| i as u32).collect(),
        })
    }
}

fn drop_closing_duplicate(points: &mut Vec<Vec2>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first.x - last.x).abs() < 1e-9 && (first.y - last.y).abs() < 1e-9 {
            points.pop();
        }
    }
}

fn signed_area(ring: &[Vec2]) -> f64 {
    let mut sum = 0.0;
    for k in 0..ring.len() {
        sum += ring[k].perp_dot(ring[(k + 1) % ring.len()]);
    }
    sum * 0.5
}
