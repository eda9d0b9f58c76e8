//! The [`Solid`] type.

use crate::csg::{boolean, BooleanOp, Polygon, DEFAULT_EPSILON};
use crate::math::Vec3;
use crate::mesh::TriangleMesh;
use crate::primitives;

/// A 3D solid geometry object.
///
/// Solids are closed sets of convex polygons. They are created from
/// primitives, combined with CSG boolean operations, and tessellated to
/// triangle meshes on demand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Solid {
    polygons: Vec<Polygon>,
}

impl Solid {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create an empty solid.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an existing closed polygon set.
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// Create a box (cuboid) with corner at origin and dimensions `(sx, sy, sz)`.
    pub fn cube(sx: f64, sy: f64, sz: f64) -> Self {
        Self::from_polygons(primitives::make_cube(sx, sy, sz))
    }

    /// Create a faceted sphere centered at origin with the given radius.
    pub fn sphere(radius: f64, segments: u32) -> Self {
        Self::from_polygons(primitives::make_sphere(radius, segments))
    }

    // =========================================================================
    // CSG boolean operations
    // =========================================================================

    /// Boolean union (self ∪ other).
    pub fn union(&self, other: &Solid) -> Solid {
        self.boolean(other, BooleanOp::Union, DEFAULT_EPSILON)
    }

    /// Boolean difference (self − other).
    pub fn difference(&self, other: &Solid) -> Solid {
        self.boolean(other, BooleanOp::Difference, DEFAULT_EPSILON)
    }

    /// Boolean intersection (self ∩ other).
    pub fn intersection(&self, other: &Solid) -> Solid {
        self.boolean(other, BooleanOp::Intersection, DEFAULT_EPSILON)
    }

    /// Boolean operation with an explicit coplanarity tolerance.
    pub fn boolean(&self, other: &Solid, op: BooleanOp, eps: f64) -> Solid {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => match op {
                BooleanOp::Union => other.clone(),
                BooleanOp::Difference | BooleanOp::Intersection => Solid::empty(),
            },
            (_, true) => match op {
                BooleanOp::Union | BooleanOp::Difference => self.clone(),
                BooleanOp::Intersection => Solid::empty(),
            },
            _ => Solid::from_polygons(boolean(
                self.polygons.clone(),
                other.polygons.clone(),
                op,
                eps,
            )),
        }
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Translate by `(x, y, z)`.
    pub fn translate(&self, x: f64, y: f64, z: f64) -> Solid {
        let offset = Vec3::new(x, y, z);
        let polygons = self
            .polygons
            .iter()
            .map(|p| {
                let mut p = p.clone();
                for v in &mut p.vertices {
                    v.pos += offset;
                }
                p.plane.w += p.plane.normal.dot(&offset);
                p
            })
            .collect();
        Solid { polygons }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check if the solid is empty.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Boundary polygons.
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Tessellate to a triangle mesh by fanning each convex polygon.
    pub fn to_mesh(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for polygon in &self.polygons {
            let base = mesh.num_vertices() as u32;
            for v in &polygon.vertices {
                let n = if v.normal.norm() > 1e-12 {
                    v.normal.normalize()
                } else {
                    polygon.plane.normal
                };
                mesh.vertices
                    .extend_from_slice(&[v.pos.x as f32, v.pos.y as f32, v.pos.z as f32]);
                mesh.normals
                    .extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
            }
            for k in 1..polygon.vertices.len() as u32 - 1 {
                mesh.indices.extend_from_slice(&[base, base + k, base + k + 1]);
            }
        }
        mesh
    }

    /// Enclosed volume.
    pub fn volume(&self) -> f64 {
        let mut total = 0.0;
        for polygon in &self.polygons {
            let a = polygon.vertices[0].pos.coords;
            for w in polygon.vertices[1..].windows(2) {
                total += a.dot(&w[0].pos.coords.cross(&w[1].pos.coords));
            }
        }
        total / 6.0
    }

    /// Axis-aligned bounding box `(min, max)`.
    pub fn bounding_box(&self) -> ([f64; 3], [f64; 3]) {
        let mut points = self
            .polygons
            .iter()
            .flat_map(|p| p.vertices.iter().map(|v| v.pos));
        let Some(first) = points.next() else {
            return ([0.0; 3], [0.0; 3]);
        };
        let mut min = [first.x, first.y, first.z];
        let mut max = min;
        for p in points {
            for k in 0..3 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        (min, max)
    }

    /// Number of triangles in the tessellated mesh.
    pub fn num_triangles(&self) -> usize {
        self.polygons.iter().map(|p| p.vertices.len() - 2).sum()
    }
}
