//! STL export (binary and ASCII).

use std::fmt;

use carve_kernel::TriangleMesh;

use crate::error::{ExportError, Result};

fn facet_normal(v: &[[f32; 3]; 3]) -> [f32; 3] {
    let [v0, v1, v2] = v;
    let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
    let nx = e1[1] * e2[2] - e1[2] * e2[1];
    let ny = e1[2] * e2[0] - e1[0] * e2[2];
    let nz = e1[0] * e2[1] - e1[1] * e2[0];
    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len > 1e-10 {
        [nx / len, ny / len, nz / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Encode a mesh as binary STL.
pub fn to_stl_binary(mesh: &TriangleMesh) -> Result<Vec<u8>> {
    if mesh.is_empty() {
        return Err(ExportError::EmptyMesh);
    }
    let num_triangles = mesh.num_triangles();
    let mut data = Vec::with_capacity(84 + num_triangles * 50);

    let mut header = [b' '; 80];
    let tag = b"carve STL export";
    header[..tag.len()].copy_from_slice(tag);
    data.extend_from_slice(&header);
    data.extend_from_slice(&(num_triangles as u32).to_le_bytes());

    for tri in mesh.triangles() {
        for c in facet_normal(&tri) {
            data.extend_from_slice(&c.to_le_bytes());
        }
        for v in tri {
            for c in v {
                data.extend_from_slice(&c.to_le_bytes());
            }
        }
        // Attribute byte count
        data.extend_from_slice(&0u16.to_le_bytes());
    }

    Ok(data)
}

/// Encode a mesh as ASCII STL with the given solid name.
pub fn to_stl_ascii(mesh: &TriangleMesh, name: &str) -> Result<String> {
    if mesh.is_empty() {
        return Err(ExportError::EmptyMesh);
    }
    let mut out = String::new();
    write_ascii(&mut out, mesh, name).map_err(|e| ExportError::MalformedMesh(e.to_string()))?;
    Ok(out)
}

fn write_ascii(out: &mut impl fmt::Write, mesh: &TriangleMesh, name: &str) -> fmt::Result {
    writeln!(out, "solid {name}")?;
    for tri in mesh.triangles() {
        let n = facet_normal(&tri);
        writeln!(out, "  facet normal {} {} {}", n[0], n[1], n[2])?;
        writeln!(out, "    outer loop")?;
        for v in tri {
            writeln!(out, "      vertex {} {} {}", v[0], v[1], v[2])?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }
    writeln!(out, "endsolid {name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_kernel::Solid;

    #[test]
    fn test_binary_layout() {
        let mesh = Solid::cube(1.0, 1.0, 1.0).to_mesh();
        let stl = to_stl_binary(&mesh).unwrap();
        assert_eq!(stl.len(), 84 + 12 * 50);
        let count = u32::from_le_bytes(stl[80..84].try_into().unwrap());
        assert_eq!(count, 12);
        assert!(stl.starts_with(b"carve STL export"));
    }

    #[test]
    fn test_ascii_facets() {
        let mesh = Solid::cube(1.0, 1.0, 1.0).to_mesh();
        let stl = to_stl_ascii(&mesh, "cube").unwrap();
        assert!(stl.starts_with("solid cube\n"));
        assert!(stl.trim_end().ends_with("endsolid cube"));
        assert_eq!(stl.matches("facet normal").count(), 12);
        assert_eq!(stl.matches("vertex").count(), 36);
    }

    #[test]
    fn test_ascii_facet_block_shape() {
        let mesh = Solid::cube(1.0, 1.0, 1.0).to_mesh();
        let stl = to_stl_ascii(&mesh, "cube").unwrap();
        let lines: Vec<&str> = stl.lines().collect();
        assert_eq!(lines.len(), 2 + 12 * 7);
        assert!(lines[1].starts_with("  facet normal "));
        assert_eq!(lines[2], "    outer loop");
        assert!(lines[3].starts_with("      vertex "));
        assert_eq!(lines[6], "    endloop");
        assert_eq!(lines[7], "  endfacet");
        assert_eq!(lines[lines.len() - 1], "endsolid cube");
    }

    #[test]
    fn test_facet_normal_follows_winding() {
        let n = facet_normal(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(n, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(to_stl_binary(&TriangleMesh::new()).is_err());
        assert!(to_stl_ascii(&TriangleMesh::new(), "x").is_err());
    }
}
