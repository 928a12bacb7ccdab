//! glTF / GLB decoding into entities, meshes and materials
//!
//! Only embedded (GLB) buffer data is read. Documents whose buffers live in
//! external files or data URIs still load their node hierarchy, but any
//! primitive that needs buffer data fails with a decode error.

use crate::entity::Entity;
use crate::error::{AssetKind, LoadError, Result};
use crate::model::{AlphaMode, Material, Mesh, ModelComponent, PrimitiveType, Transform};
use crate::vertex::Vertex;
use glam::Vec3;
use gltf::Gltf;
use std::collections::{BTreeSet, HashMap};

/// Parse a glTF JSON or GLB document
pub(crate) fn parse(bytes: &[u8], kind: AssetKind) -> Result<Gltf> {
    let gltf = Gltf::from_slice(bytes).map_err(|err| {
        log::error!("Failed to parse {kind}: {err}");
        LoadError::from(err)
    })?;

    log::debug!(
        "Parsed glTF with {} nodes, {} meshes, {} materials, {} scenes",
        gltf.nodes().len(),
        gltf.meshes().len(),
        gltf.materials().len(),
        gltf.scenes().len()
    );
    Ok(gltf)
}

/// Read every material in the document
pub(crate) fn read_materials(gltf: &Gltf) -> Vec<Material> {
    gltf.materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let alpha_mode = match material.alpha_mode() {
                gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
                gltf::material::AlphaMode::Mask => AlphaMode::Mask,
                gltf::material::AlphaMode::Blend => AlphaMode::Blend,
            };

            Material {
                name: material.name().map(str::to_string),
                base_color_factor: pbr.base_color_factor(),
                base_color_texture: pbr.base_color_texture().map(|info| info.texture().index()),
                metallic_factor: pbr.metallic_factor(),
                roughness_factor: pbr.roughness_factor(),
                normal_texture: material.normal_texture().map(|info| info.texture().index()),
                emissive_factor: material.emissive_factor(),
                alpha_mode,
                alpha_cutoff: material.alpha_cutoff().unwrap_or(0.5),
                double_sided: material.double_sided(),
            }
        })
        .collect()
}

/// Read every primitive of `mesh`, one [`Mesh`] per primitive
pub(crate) fn read_mesh(gltf: &Gltf, mesh: &gltf::Mesh<'_>) -> Result<Vec<Mesh>> {
    let mesh_idx = mesh.index();
    let blob = gltf.blob.as_deref();
    let mut meshes = Vec::new();

    for (prim_idx, primitive) in mesh.primitives().enumerate() {
        let primitive_type = match primitive.mode() {
            gltf::mesh::Mode::Points => PrimitiveType::Points,
            gltf::mesh::Mode::Lines => PrimitiveType::Lines,
            gltf::mesh::Mode::LineLoop => {
                log::warn!("Line loop primitive mode is not supported, converting to line strip");
                PrimitiveType::LineStrip
            }
            gltf::mesh::Mode::LineStrip => PrimitiveType::LineStrip,
            gltf::mesh::Mode::Triangles => PrimitiveType::Triangles,
            gltf::mesh::Mode::TriangleStrip => PrimitiveType::TriangleStrip,
            gltf::mesh::Mode::TriangleFan => PrimitiveType::TriangleFan,
        };

        let reader = primitive.reader(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => blob,
            gltf::buffer::Source::Uri(_) => None,
        });

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| {
                let err = format!("mesh {mesh_idx} primitive {prim_idx} has no readable positions");
                log::error!("{err}");
                LoadError::decode(AssetKind::Model, err)
            })?
            .collect();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let normals = match reader.read_normals() {
            Some(iter) => iter.collect(),
            None => {
                log::debug!("Generating normals for mesh {mesh_idx} primitive {prim_idx}");
                generate_normals(&positions, &indices)
            }
        };
        let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
            Some(iter) => iter.into_f32().collect(),
            None => vec![[0.0, 0.0]; positions.len()],
        };
        let tangents: Vec<[f32; 4]> = match reader.read_tangents() {
            Some(iter) => iter.collect(),
            None => vec![[1.0, 0.0, 0.0, 1.0]; positions.len()],
        };
        let colors: Vec<[f32; 4]> = match reader.read_colors(0) {
            Some(iter) => iter.into_rgba_f32().collect(),
            None => vec![[1.0; 4]; positions.len()],
        };

        if tex_coords.len() != positions.len() || normals.len() != positions.len() {
            log::warn!(
                "Mismatched vertex attributes in mesh {mesh_idx}: positions ({}), normals ({}), tex_coords ({})",
                positions.len(),
                normals.len(),
                tex_coords.len()
            );
        }

        let vertices = positions
            .into_iter()
            .zip(normals)
            .zip(tex_coords)
            .zip(tangents)
            .zip(colors)
            .map(|((((position, normal), uv), tangent), color)| Vertex {
                position,
                normal,
                uv,
                tangent,
                color,
            })
            .collect();

        meshes.push(Mesh {
            name: mesh.name().map(str::to_string),
            primitive_type,
            vertices,
            indices,
            material_index: primitive.material().index(),
        });
    }

    Ok(meshes)
}

/// Smooth normals from accumulated face normals
fn generate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            log::warn!("Skipping triangle with out-of-range vertex index");
            continue;
        }

        let v0 = Vec3::from(positions[i0]);
        let face = (Vec3::from(positions[i1]) - v0).cross(Vec3::from(positions[i2]) - v0);
        if face.length_squared() > 1e-12 {
            let face = face.normalize();
            normals[i0] += face;
            normals[i1] += face;
            normals[i2] += face;
        }
    }

    normals
        .into_iter()
        .map(|n| {
            if n.length_squared() > 1e-12 {
                n.normalize().into()
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect()
}

/// Build an entity tree rooted at `node`
pub(crate) fn build_entity(
    gltf: &Gltf,
    node: gltf::Node<'_>,
    materials: &[Material],
) -> Result<Entity> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let mut entity = Entity::new(node.name().map(str::to_string));
    entity.transform = Transform {
        translation,
        rotation,
        scale,
    };

    if let Some(mesh) = node.mesh() {
        entity.model = Some(model_component(read_mesh(gltf, &mesh)?, materials));
    }

    entity.children = node
        .children()
        .map(|child| build_entity(gltf, child, materials))
        .collect::<Result<_>>()?;

    Ok(entity)
}

/// Keep only the materials `meshes` reference, renumbering their indices
fn model_component(mut meshes: Vec<Mesh>, materials: &[Material]) -> ModelComponent {
    let used: BTreeSet<usize> = meshes
        .iter()
        .filter_map(|mesh| mesh.material_index)
        .filter(|&index| index < materials.len())
        .collect();
    let remap: HashMap<usize, usize> = used
        .iter()
        .enumerate()
        .map(|(new, &old)| (old, new))
        .collect();

    for mesh in &mut meshes {
        mesh.material_index = mesh.material_index.and_then(|old| remap.get(&old).copied());
    }

    ModelComponent {
        meshes,
        materials: used.into_iter().map(|index| materials[index].clone()).collect(),
    }
}

/// Pick a scene by name, or the default (then first) scene
pub(crate) fn select_scene<'a>(gltf: &'a Gltf, name: Option<&str>) -> Option<gltf::Scene<'a>> {
    match name {
        Some(name) => gltf.scenes().find(|scene| scene.name() == Some(name)),
        None => gltf.default_scene().or_else(|| gltf.scenes().next()),
    }
}

/// Nodes no other node lists as a child
fn parentless_nodes(gltf: &Gltf) -> Vec<gltf::Node<'_>> {
    let children: BTreeSet<usize> = gltf
        .nodes()
        .flat_map(|node| node.children().map(|child| child.index()))
        .collect();
    gltf.nodes()
        .filter(|node| !children.contains(&node.index()))
        .collect()
}

/// Root entity holding the top-level nodes of the selected scene
///
/// Documents without scenes fall back to every parentless node.
pub(crate) fn document_root(gltf: &Gltf, name: Option<String>) -> Result<Entity> {
    let materials = read_materials(gltf);
    let roots = match select_scene(gltf, None) {
        Some(scene) => scene.nodes().collect(),
        None => parentless_nodes(gltf),
    };

    let mut root = Entity::new(name);
    root.children = roots
        .into_iter()
        .map(|node| build_entity(gltf, node, &materials))
        .collect::<Result<_>>()?;
    Ok(root)
}
