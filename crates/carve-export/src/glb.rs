//! Binary glTF (GLB) export.
//!
//! Writes a single-mesh, single-node scene with POSITION, NORMAL and u32
//! indices packed in one buffer.

use std::borrow::Cow;
use std::collections::BTreeMap;

use carve_kernel::TriangleMesh;
use gltf::binary::{Glb, Header};
use gltf::json;
use gltf::json::validation::Checked::Valid;
use gltf::json::validation::USize64;

use crate::error::{ExportError, Result};

/// MIME type of binary glTF.
pub const GLB_MIME: &str = "model/gltf-binary";

/// Surface appearance written into the glTF material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlbMaterial {
    /// Linear RGBA base color.
    pub base_color: [f32; 4],
    /// PBR metallic factor.
    pub metallic: f32,
    /// PBR roughness factor.
    pub roughness: f32,
}

impl Default for GlbMaterial {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.82, 1.0],
            metallic: 0.1,
            roughness: 0.6,
        }
    }
}

/// Encode a mesh as GLB with the default material.
pub fn to_glb(mesh: &TriangleMesh) -> Result<Vec<u8>> {
    to_glb_with(mesh, "cut", &GlbMaterial::default())
}

/// Encode a mesh as GLB with an explicit node name and material.
pub fn to_glb_with(mesh: &TriangleMesh, name: &str, material: &GlbMaterial) -> Result<Vec<u8>> {
    validate(mesh)?;

    let mut bin = Vec::with_capacity(
        (mesh.vertices.len() + mesh.normals.len() + mesh.indices.len()) * 4,
    );
    bin.extend(mesh.vertices.iter().flat_map(|v| v.to_le_bytes()));
    let positions_len = bin.len();
    bin.extend(mesh.normals.iter().flat_map(|n| n.to_le_bytes()));
    let normals_len = bin.len() - positions_len;
    bin.extend(mesh.indices.iter().flat_map(|i| i.to_le_bytes()));
    let indices_len = bin.len() - positions_len - normals_len;

    let mut root = json::Root::default();
    root.asset.generator = Some("carve".to_string());

    let buffer = root.push(json::Buffer {
        byte_length: USize64::from(bin.len()),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
    });
    let view = |root: &mut json::Root, offset: usize, length: usize, target| {
        root.push(json::buffer::View {
            buffer,
            byte_length: USize64::from(length),
            byte_offset: Some(USize64::from(offset)),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(target)),
        })
    };
    let positions_view = view(&mut root, 0, positions_len, json::buffer::Target::ArrayBuffer);
    let normals_view = view(
        &mut root,
        positions_len,
        normals_len,
        json::buffer::Target::ArrayBuffer,
    );
    let indices_view = view(
        &mut root,
        positions_len + normals_len,
        indices_len,
        json::buffer::Target::ElementArrayBuffer,
    );

    let (min, max) = mesh.bounds();
    let vertex_count = mesh.num_vertices();
    let accessor = |root: &mut json::Root,
                    view,
                    count: usize,
                    component: json::accessor::ComponentType,
                    type_: json::accessor::Type,
                    bounds: Option<([f32; 3], [f32; 3])>| {
        root.push(json::Accessor {
            buffer_view: Some(view),
            byte_offset: None,
            count: USize64::from(count),
            component_type: Valid(json::accessor::GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min: bounds.map(|(min, _)| json::Value::from(min.to_vec())),
            max: bounds.map(|(_, max)| json::Value::from(max.to_vec())),
            name: None,
            normalized: false,
            sparse: None,
        })
    };
    let positions = accessor(
        &mut root,
        positions_view,
        vertex_count,
        json::accessor::ComponentType::F32,
        json::accessor::Type::Vec3,
        Some((min, max)),
    );
    let normals = accessor(
        &mut root,
        normals_view,
        vertex_count,
        json::accessor::ComponentType::F32,
        json::accessor::Type::Vec3,
        None,
    );
    let indices = accessor(
        &mut root,
        indices_view,
        mesh.indices.len(),
        json::accessor::ComponentType::U32,
        json::accessor::Type::Scalar,
        None,
    );

    let material = root.push(json::Material {
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_factor: json::material::PbrBaseColorFactor(material.base_color),
            metallic_factor: json::material::StrengthFactor(material.metallic),
            roughness_factor: json::material::StrengthFactor(material.roughness),
            ..Default::default()
        },
        ..Default::default()
    });

    let mut attributes = BTreeMap::new();
    attributes.insert(Valid(json::mesh::Semantic::Positions), positions);
    attributes.insert(Valid(json::mesh::Semantic::Normals), normals);
    let mesh_index = root.push(json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(name.to_string()),
        primitives: vec![json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(indices),
            material: Some(material),
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        }],
        weights: None,
    });
    let node = root.push(json::Node {
        mesh: Some(mesh_index),
        name: Some(name.to_string()),
        ..Default::default()
    });
    let scene = root.push(json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        nodes: vec![node],
    });
    root.scene = Some(scene);

    let json_bytes = json::serialize::to_vec(&root)?;
    let length = 12 + 8 + padded(json_bytes.len()) + 8 + padded(bin.len());
    let glb = Glb {
        header: Header {
            magic: *b"glTF",
            version: 2,
            length: u32::try_from(length)
                .map_err(|_| ExportError::MalformedMesh(format!("{length} bytes exceeds GLB limit")))?,
        },
        json: Cow::Owned(json_bytes),
        bin: Some(Cow::Owned(bin)),
    };
    Ok(glb.to_vec()?)
}

fn validate(mesh: &TriangleMesh) -> Result<()> {
    if mesh.is_empty() {
        return Err(ExportError::EmptyMesh);
    }
    if mesh.vertices.len() % 3 != 0 || mesh.normals.len() != mesh.vertices.len() {
        return Err(ExportError::MalformedMesh(format!(
            "{} position floats, {} normal floats",
            mesh.vertices.len(),
            mesh.normals.len()
        )));
    }
    let vertex_count = mesh.num_vertices() as u32;
    if let Some(bad) = mesh.indices.iter().find(|&&i| i >= vertex_count) {
        return Err(ExportError::MalformedMesh(format!(
            "index {bad} out of range for {vertex_count} vertices"
        )));
    }
    Ok(())
}

fn padded(len: usize) -> usize {
    len.div_ceil(4) * 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_kernel::Solid;

    fn cut_mesh() -> TriangleMesh {
        let cube = Solid::cube(1.0, 1.0, 1.0);
        let ball = Solid::sphere(0.65, 16).translate(0.5, 0.5, 0.5);
        cube.difference(&ball).to_mesh()
    }

    #[test]
    fn test_header_and_alignment() {
        let glb = to_glb(&cut_mesh()).unwrap();
        assert_eq!(&glb[0..4], b"glTF");
        let length = u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize;
        assert_eq!(length, glb.len());
        assert_eq!(glb.len() % 4, 0);
        let json_len = u32::from_le_bytes(glb[12..16].try_into().unwrap()) as usize;
        assert_eq!(json_len % 4, 0);
        assert_eq!(&glb[16..20], b"JSON");
    }

    #[test]
    fn test_parses_with_gltf_crate() {
        let mesh = cut_mesh();
        let glb = to_glb(&mesh).unwrap();
        let (doc, buffers, _) = gltf::import_slice(&glb).unwrap();
        assert_eq!(doc.meshes().count(), 1);
        let gltf_mesh = doc.meshes().next().unwrap();
        let primitive = gltf_mesh.primitives().next().unwrap();
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let positions: Vec<[f32; 3]> = reader.read_positions().unwrap().collect();
        assert_eq!(positions.len(), mesh.num_vertices());
        let indices: Vec<u32> = reader.read_indices().unwrap().into_u32().collect();
        assert_eq!(indices, mesh.indices);
    }

    #[test]
    fn test_material_and_bounds_written() {
        let material = GlbMaterial {
            base_color: [1.0, 0.0, 0.0, 1.0],
            ..GlbMaterial::default()
        };
        let glb = to_glb_with(&cut_mesh(), "part", &material).unwrap();
        let (doc, _, _) = gltf::import_slice(&glb).unwrap();
        let node = doc.nodes().next().unwrap();
        assert_eq!(node.name(), Some("part"));
        let primitive = node.mesh().unwrap().primitives().next().unwrap();
        let pbr = primitive.material().pbr_metallic_roughness();
        assert_eq!(pbr.base_color_factor(), [1.0, 0.0, 0.0, 1.0]);
        let bounds = primitive.bounding_box();
        assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        assert!(matches!(
            to_glb(&TriangleMesh::new()),
            Err(ExportError::EmptyMesh)
        ));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let mut mesh = cut_mesh();
        mesh.indices[0] = u32::MAX;
        assert!(matches!(to_glb(&mesh), Err(ExportError::MalformedMesh(_))));
    }
}
