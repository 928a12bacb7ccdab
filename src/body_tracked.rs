//! Characters driven by body tracking
//!
//! A body-tracked entity is an ordinary entity tree plus the skeleton that
//! tracking data will pose. Documents without a skin are rejected.

use crate::entity::Entity;
use crate::error::{AssetKind, LoadError, Result};
use crate::loader::{scene_graph, ResourceLoader};
use crate::runtime::run_blocking;
use crate::source::AssetSource;
use crate::Bundle;
use async_trait::async_trait;

/// Joint list of a skinned character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    pub name: Option<String>,
    /// Joint names in skin order; unnamed joints get `joint_<index>`
    pub joints: Vec<String>,
}

impl Skeleton {
    /// Position of `joint` in the skin's joint list
    pub fn joint_index(&self, joint: &str) -> Option<usize> {
        self.joints.iter().position(|name| name == joint)
    }
}

/// A character entity with its skeleton
#[derive(Debug, Clone)]
pub struct BodyTrackedEntity {
    pub entity: Entity,
    pub skeleton: Skeleton,
}

/// Loads skinned glTF / GLB characters
#[derive(Debug, Clone)]
pub struct BodyTrackedLoader {
    main: Bundle,
    extensions: Vec<String>,
}

impl BodyTrackedLoader {
    /// Create a loader that resolves names in `main`
    pub fn new(main: Bundle, extensions: Vec<String>) -> Self {
        Self { main, extensions }
    }

    /// Decode a character; the first skin becomes its skeleton
    pub fn decode(bytes: &[u8], name: Option<String>) -> Result<BodyTrackedEntity> {
        let gltf = scene_graph::parse(bytes, AssetKind::BodyTracked)?;

        let skin = gltf.skins().next().ok_or_else(|| {
            let name = name.clone().unwrap_or_else(|| "<unnamed>".to_string());
            log::error!("'{name}' has no skin; it cannot be body tracked");
            LoadError::MissingSkeleton { name }
        })?;

        let skeleton = Skeleton {
            name: skin.name().map(str::to_string),
            joints: skin
                .joints()
                .map(|joint| {
                    joint
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("joint_{}", joint.index()))
                })
                .collect(),
        };

        Ok(BodyTrackedEntity {
            entity: scene_graph::document_root(&gltf, name)?,
            skeleton,
        })
    }
}

#[async_trait]
impl ResourceLoader for BodyTrackedLoader {
    type Output = BodyTrackedEntity;

    fn kind(&self) -> AssetKind {
        AssetKind::BodyTracked
    }

    async fn load(&self, source: &AssetSource) -> Result<BodyTrackedEntity> {
        let bytes = source.resolve(&self.main, &self.extensions)?.read().await?;
        let name = source.resource_name();
        run_blocking(move || BodyTrackedLoader::decode(&bytes, name)).await
    }
}
