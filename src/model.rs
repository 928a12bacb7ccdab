//! Meshes, materials and model entities
//!
//! A [`ModelEntity`] is a document flattened into a single object. Every
//! mesh is baked into the model's space, which suits collision and
//! placement. Use [`Entity`](crate::Entity) to keep the node hierarchy.

use crate::entity::Entity;
use crate::error::{AssetKind, Result};
use crate::loader::{scene_graph, ResourceLoader};
use crate::runtime::run_blocking;
use crate::source::AssetSource;
use crate::{Bundle, Vertex};
use async_trait::async_trait;
use glam::{Mat4, Quat, Vec3};
use uuid::Uuid;

/// Type of primitive to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// How to handle transparency
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaMode {
    Opaque,
    Mask,
    Blend,
}

/// Material properties for PBR rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// Base color factor (RGBA)
    pub base_color_factor: [f32; 4],
    /// Index of the base color texture in the source document
    pub base_color_texture: Option<usize>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub normal_texture: Option<usize>,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0; 4],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            normal_texture: None,
            emissive_factor: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
        }
    }
}

impl Material {
    /// A flat-colored material
    pub fn simple(color: [f32; 4], is_metallic: bool) -> Self {
        Self {
            base_color_factor: color,
            metallic_factor: if is_metallic { 1.0 } else { 0.0 },
            roughness_factor: if is_metallic { 0.2 } else { 0.8 },
            alpha_mode: if color[3] < 1.0 {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            },
            ..Default::default()
        }
    }
}

/// A mesh with vertex data and material index
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitive_type: PrimitiveType,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Index into the owning component's material list
    pub material_index: Option<usize>,
}

impl Mesh {
    /// Get the number of vertices in the mesh
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of indices in the mesh
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Vertex data as bytes
    pub fn vertex_buffer(&self) -> &[u8] {
        crate::vertex::as_bytes(&self.vertices)
    }

    /// Index data as bytes
    pub fn index_buffer(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Axis-aligned bounds of the vertex positions
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }

    fn transformed(&self, matrix: &Mat4, material_offset: usize) -> Self {
        Self {
            name: self.name.clone(),
            primitive_type: self.primitive_type,
            vertices: self.vertices.iter().map(|v| v.transformed(matrix)).collect(),
            indices: self.indices.clone(),
            material_index: self.material_index.map(|index| index + material_offset),
        }
    }
}

/// Spatial transform (translation, rotation, scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: [f32; 3],
    /// Quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    /// Local-to-parent matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_array(self.rotation),
            Vec3::from(self.translation),
        )
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Bounds of a point set, `None` when empty
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self { min: p, max: p },
                Some(b) => Self {
                    min: b.min.min(p),
                    max: b.max.max(p),
                },
            })
        })
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Size along each axis
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Geometry attached to an entity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelComponent {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

/// A loaded model flattened into one object
#[derive(Debug, Clone)]
pub struct ModelEntity {
    /// Unique per load; loading the same file twice yields two ids
    pub id: Uuid,
    pub name: Option<String>,
    pub transform: Transform,
    pub model: ModelComponent,
}

impl ModelEntity {
    /// Wrap a component in a new model entity
    pub fn new(name: Option<String>, model: ModelComponent) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            transform: Transform::default(),
            model,
        }
    }

    /// Bake an entity tree into a single model
    pub fn flatten(entity: &Entity) -> Self {
        let mut flat = ModelComponent::default();
        entity.visit(&mut |node, world| {
            if let Some(model) = &node.model {
                let offset = flat.materials.len();
                flat.materials.extend(model.materials.iter().cloned());
                flat.meshes
                    .extend(model.meshes.iter().map(|mesh| mesh.transformed(world, offset)));
            }
        });
        Self::new(entity.name.clone(), flat)
    }

    /// Bounds of every mesh combined
    pub fn visual_bounds(&self) -> Option<Bounds> {
        self.model
            .meshes
            .iter()
            .filter_map(Mesh::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Total vertex count
    pub fn vertex_count(&self) -> usize {
        self.model.meshes.iter().map(Mesh::vertex_count).sum()
    }
}

/// Loads glTF / GLB documents as flattened [`ModelEntity`] values
#[derive(Debug, Clone)]
pub struct ModelLoader {
    main: Bundle,
    extensions: Vec<String>,
}

impl ModelLoader {
    /// Create a loader that resolves names in `main`
    pub fn new(main: Bundle, extensions: Vec<String>) -> Self {
        Self { main, extensions }
    }

    /// Decode a model from document bytes
    pub fn decode(bytes: &[u8], name: Option<String>) -> Result<ModelEntity> {
        let gltf = scene_graph::parse(bytes, AssetKind::Model)?;
        let root = scene_graph::document_root(&gltf, name)?;
        Ok(ModelEntity::flatten(&root))
    }
}

#[async_trait]
impl ResourceLoader for ModelLoader {
    type Output = ModelEntity;

    fn kind(&self) -> AssetKind {
        AssetKind::Model
    }

    async fn load(&self, source: &AssetSource) -> Result<ModelEntity> {
        let bytes = source.resolve(&self.main, &self.extensions)?.read().await?;
        let name = source.resource_name();
        run_blocking(move || ModelLoader::decode(&bytes, name)).await
    }
}
