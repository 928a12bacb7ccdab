//! Entity hierarchies

use crate::error::{AssetKind, Result};
use crate::loader::{scene_graph, ResourceLoader};
use crate::model::{ModelComponent, Transform};
use crate::runtime::run_blocking;
use crate::source::AssetSource;
use crate::Bundle;
use async_trait::async_trait;
use glam::Mat4;
use uuid::Uuid;

/// A node in a loaded scene graph
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique per load; loading the same file twice yields two ids
    pub id: Uuid,
    pub name: Option<String>,
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Geometry, when the node carries a mesh
    pub model: Option<ModelComponent>,
    pub children: Vec<Entity>,
}

impl Entity {
    /// Create an empty entity
    pub fn new(name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            transform: Transform::default(),
            model: None,
            children: Vec::new(),
        }
    }

    /// Depth-first search for a descendant (or self) called `name`
    pub fn find(&self, name: &str) -> Option<&Entity> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Number of entities below this one
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Walk the tree depth-first, passing each entity its world matrix
    pub fn visit(&self, f: &mut impl FnMut(&Entity, &Mat4)) {
        self.visit_from(&Mat4::IDENTITY, f);
    }

    fn visit_from(&self, parent: &Mat4, f: &mut impl FnMut(&Entity, &Mat4)) {
        let world = *parent * self.transform.matrix();
        f(self, &world);
        for child in &self.children {
            child.visit_from(&world, f);
        }
    }
}

/// Loads glTF / GLB documents as [`Entity`] trees
#[derive(Debug, Clone)]
pub struct EntityLoader {
    main: Bundle,
    extensions: Vec<String>,
}

impl EntityLoader {
    /// Create a loader that resolves names in `main`
    pub fn new(main: Bundle, extensions: Vec<String>) -> Self {
        Self { main, extensions }
    }

    /// Decode an entity tree from document bytes
    pub fn decode(bytes: &[u8], name: Option<String>) -> Result<Entity> {
        let gltf = scene_graph::parse(bytes, AssetKind::Entity)?;
        scene_graph::document_root(&gltf, name)
    }
}

#[async_trait]
impl ResourceLoader for EntityLoader {
    type Output = Entity;

    fn kind(&self) -> AssetKind {
        AssetKind::Entity
    }

    async fn load(&self, source: &AssetSource) -> Result<Entity> {
        let bytes = source.resolve(&self.main, &self.extensions)?.read().await?;
        let name = source.resource_name();
        run_blocking(move || EntityLoader::decode(&bytes, name)).await
    }
}
