//! Primitive solids as closed convex-polygon sets.

use std::f64::consts::PI;

use crate::csg::{Polygon, Vertex};
use crate::math::{Point3, Vec3};

/// Box with one corner at the origin and dimensions `(sx, sy, sz)`.
pub fn make_cube(sx: f64, sy: f64, sz: f64) -> Vec<Polygon> {
    // Corner index bits: 1 → x, 2 → y, 4 → z.
    const FACES: [([usize; 4], [f64; 3]); 6] = [
        ([0, 4, 6, 2], [-1.0, 0.0, 0.0]),
        ([1, 3, 7, 5], [1.0, 0.0, 0.0]),
        ([0, 1, 5, 4], [0.0, -1.0, 0.0]),
        ([2, 6, 7, 3], [0.0, 1.0, 0.0]),
        ([0, 2, 3, 1], [0.0, 0.0, -1.0]),
        ([4, 5, 7, 6], [0.0, 0.0, 1.0]),
    ];

    FACES
        .iter()
        .filter_map(|(corners, n)| {
            let normal = Vec3::new(n[0], n[1], n[2]);
            let vertices = corners
                .iter()
                .map(|&i| {
                    let pos = Point3::new(
                        if i & 1 != 0 { sx } else { 0.0 },
                        if i & 2 != 0 { sy } else { 0.0 },
                        if i & 4 != 0 { sz } else { 0.0 },
                    );
                    Vertex::new(pos, normal)
                })
                .collect();
            Polygon::new(vertices)
        })
        .collect()
}

/// Faceted UV sphere centred at the origin.
///
/// `segments` azimuthal divisions and `segments / 2` latitude bands; every
/// vertex lies on the true sphere, so the facets lie inside it. Poles are on
/// the Z axis.
pub fn make_sphere(radius: f64, segments: u32) -> Vec<Polygon> {
    let slices = segments.max(3);
    let stacks = (segments / 2).max(2);

    let vertex = |i: u32, j: u32| {
        let theta = 2.0 * PI * f64::from(i % slices) / f64::from(slices);
        let phi = PI * f64::from(j) / f64::from(stacks);
        let dir = Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
        Vertex::new(Point3::from(dir * radius), dir)
    };

    let mut polygons = Vec::with_capacity((slices * stacks) as usize);
    for i in 0..slices {
        for j in 0..stacks {
            let mut verts = Vec::with_capacity(4);
            verts.push(vertex(i, j));
            verts.push(vertex(i, j + 1));
            if j + 1 < stacks {
                verts.push(vertex(i + 1, j + 1));
            }
            if j > 0 {
                verts.push(vertex(i + 1, j));
            }
            if let Some(p) = Polygon::new(verts) {
                polygons.push(p);
            }
        }
    }
    polygons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = make_cube(1.0, 2.0, 3.0);
        assert_eq!(cube.len(), 6);
        let center = Point3::new(0.5, 1.0, 1.5);
        for face in &cube {
            assert!(face.plane.distance(&center) < 0.0);
        }
    }

    #[test]
    fn test_sphere_polygon_count() {
        let sphere = make_sphere(1.0, 16);
        assert_eq!(sphere.len(), 16 * 8);
        let caps = sphere.iter().filter(|p| p.vertices.len() == 3).count();
        assert_eq!(caps, 32);
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let sphere = make_sphere(0.7, 16);
        let origin = Point3::origin();
        for face in &sphere {
            assert!(face.plane.distance(&origin) < 0.0);
        }
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        for face in make_sphere(0.65, 16) {
            for v in &face.vertices {
                assert!((v.pos.coords.norm() - 0.65).abs() < 1e-12);
            }
        }
    }
}
