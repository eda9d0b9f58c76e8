//! Triangle meshes produced by tessellation.

/// Output triangle mesh for rendering and export.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]` (f32).
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]` (u32).
    pub indices: Vec<u32>,
    /// Flat array of vertex normals: `[nx0, ny0, nz0, ...]` (f32). Same length as vertices.
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            normals: Vec::new(),
        }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// True when the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: usize) -> [f32; 3] {
        [
            self.vertices[i * 3],
            self.vertices[i * 3 + 1],
            self.vertices[i * 3 + 2],
        ]
    }

    /// Iterate triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.vertex(t[0] as usize),
                self.vertex(t[1] as usize),
                self.vertex(t[2] as usize),
            ]
        })
    }

    /// Axis-aligned bounds `(min, max)`. Both are zero for an empty mesh.
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        if self.vertices.is_empty() {
            return ([0.0; 3], [0.0; 3]);
        }
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for v in self.vertices.chunks_exact(3) {
            for k in 0..3 {
                min[k] = min[k].min(v[k]);
                max[k] = max[k].max(v[k]);
            }
        }
        (min, max)
    }

    /// Enclosed volume by the divergence theorem.
    ///
    /// Exact for closed, consistently wound surfaces; T-junctions do not
    /// affect the result.
    pub fn volume(&self) -> f64 {
        let mut total = 0.0;
        for [a, b, c] in self.triangles() {
            let a = a.map(f64::from);
            let b = b.map(f64::from);
            let c = c.map(f64::from);
            total += a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
                + a[2] * (b[0] * c[1] - b[1] * c[0]);
        }
        total / 6.0
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
