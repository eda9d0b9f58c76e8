//! BSP-tree boolean operations on convex polygon sets.
//!
//! Each solid is a closed set of convex polygons. A BSP tree is built from
//! one operand and used to clip the other; the three set operations are
//! compositions of clip and invert.

use crate::math::{Plane, Point3, Vec3};

/// Default plane thickness used to classify points as coplanar.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// A polygon vertex with a shading normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position.
    pub pos: Point3,
    /// Shading normal (unit length for primitives, interpolated on splits).
    pub normal: Vec3,
}

impl Vertex {
    /// Create a vertex.
    pub fn new(pos: Point3, normal: Vec3) -> Self {
        Self { pos, normal }
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
    }

    fn lerp(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            pos: self.pos + (other.pos - self.pos) * t,
            normal: self.normal + (other.normal - self.normal) * t,
        }
    }
}

/// A planar convex polygon with counter-clockwise winding seen from the front.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Boundary vertices.
    pub vertices: Vec<Vertex>,
    /// Supporting plane.
    pub plane: Plane,
}

impl Polygon {
    /// Build a polygon from at least three non-collinear leading vertices.
    pub fn new(vertices: Vec<Vertex>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(&vertices[0].pos, &vertices[1].pos, &vertices[2].pos)?;
        Some(Self { vertices, plane })
    }

    fn with_plane(vertices: Vec<Vertex>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    /// Reverse orientation.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }
}

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Destination buckets for [`split_polygon`].
#[derive(Default)]
struct Split {
    coplanar_front: Vec<Polygon>,
    coplanar_back: Vec<Polygon>,
    front: Vec<Polygon>,
    back: Vec<Polygon>,
}

fn split_polygon(plane: &Plane, polygon: Polygon, eps: f64, out: &mut Split) {
    let types: Vec<u8> = polygon
        .vertices
        .iter()
        .map(|v| {
            let t = plane.distance(&v.pos);
            if t < -eps {
                BACK
            } else if t > eps {
                FRONT
            } else {
                COPLANAR
            }
        })
        .collect();
    let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

    match polygon_type {
        COPLANAR => {
            if plane.normal.dot(&polygon.plane.normal) > 0.0 {
                out.coplanar_front.push(polygon);
            } else {
                out.coplanar_back.push(polygon);
            }
        }
        FRONT => out.front.push(polygon),
        BACK => out.back.push(polygon),
        _ => {
            let n = polygon.vertices.len();
            let mut f = Vec::with_capacity(n + 1);
            let mut b = Vec::with_capacity(n + 1);
            for i in 0..n {
                let j = (i + 1) % n;
                let (ti, tj) = (types[i], types[j]);
                let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                if ti != BACK {
                    f.push(*vi);
                }
                if ti != FRONT {
                    b.push(*vi);
                }
                if (ti | tj) == SPANNING {
                    let denom = plane.normal.dot(&(vj.pos - vi.pos));
                    let t = (plane.w - plane.normal.dot(&vi.pos.coords)) / denom;
                    let v = vi.lerp(vj, t);
                    f.push(v);
                    b.push(v);
                }
            }
            if f.len() >= 3 {
                out.front.push(Polygon::with_plane(f, polygon.plane));
            }
            if b.len() >= 3 {
                out.back.push(Polygon::with_plane(b, polygon.plane));
            }
        }
    }
}

/// A node of the BSP tree.
#[derive(Debug, Clone, Default)]
pub struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<Polygon>,
    eps: f64,
}

impl BspNode {
    /// Build a tree from a polygon set.
    pub fn new(polygons: Vec<Polygon>, eps: f64) -> Self {
        let mut node = Self::empty(eps);
        node.build(polygons);
        node
    }

    fn empty(eps: f64) -> Self {
        Self {
            eps,
            ..Self::default()
        }
    }

    /// Swap solid and empty space.
    pub fn invert(&mut self) {
        for p in &mut self.polygons {
            p.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Remove the parts of `polygons` that lie inside this tree.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = &self.plane else {
            return polygons;
        };
        let mut split = Split::default();
        for p in polygons {
            split_polygon(plane, p, self.eps, &mut split);
        }
        let mut front = split.front;
        front.extend(split.coplanar_front);
        let mut back = split.back;
        back.extend(split.coplanar_back);

        let mut front = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        let back = match &self.back {
            Some(node) => node.clip_polygons(back),
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    /// Remove the parts of this tree's polygons that lie inside `other`.
    pub fn clip_to(&mut self, other: &BspNode) {
        let polygons = std::mem::take(&mut self.polygons);
        self.polygons = other.clip_polygons(polygons);
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    /// Collect every polygon in the tree.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<Polygon>) {
        out.extend(self.polygons.iter().cloned());
        if let Some(front) = &self.front {
            front.collect_into(out);
        }
        if let Some(back) = &self.back {
            back.collect_into(out);
        }
    }

    /// Insert polygons, splitting them by existing node planes.
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        let plane = *self.plane.get_or_insert(polygons[0].plane);
        let mut split = Split::default();
        for p in polygons {
            split_polygon(&plane, p, self.eps, &mut split);
        }
        self.polygons.extend(split.coplanar_front);
        self.polygons.extend(split.coplanar_back);

        let eps = self.eps;
        if !split.front.is_empty() {
            self.front
                .get_or_insert_with(|| Box::new(BspNode::empty(eps)))
                .build(split.front);
        }
        if !split.back.is_empty() {
            self.back
                .get_or_insert_with(|| Box::new(BspNode::empty(eps)))
                .build(split.back);
        }
    }
}

/// Boolean set operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    /// A ∪ B
    Union,
    /// A − B
    Difference,
    /// A ∩ B
    Intersection,
}

/// Apply a boolean operation to two closed polygon sets.
pub fn boolean(a: Vec<Polygon>, b: Vec<Polygon>, op: BooleanOp, eps: f64) -> Vec<Polygon> {
    let mut a = BspNode::new(a, eps);
    let mut b = BspNode::new(b, eps);
    match op {
        BooleanOp::Union => {
            a.clip_to(&b);
            b.clip_to(&a);
            b.invert();
            b.clip_to(&a);
            b.invert();
            a.build(b.all_polygons());
        }
        BooleanOp::Difference => {
            a.invert();
            a.clip_to(&b);
            b.clip_to(&a);
            b.invert();
            b.clip_to(&a);
            b.invert();
            a.build(b.all_polygons());
            a.invert();
        }
        BooleanOp::Intersection => {
            a.invert();
            b.clip_to(&a);
            b.invert();
            a.clip_to(&b);
            b.clip_to(&a);
            a.build(b.all_polygons());
            a.invert();
        }
    }
    a.all_polygons()
}
