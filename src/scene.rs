//! Anchor scenes
//!
//! A scene file can hold several named scenes. Each loads as an
//! [`AnchorEntity`] whose children are the scene's top-level nodes.

use crate::bundle::SceneLocator;
use crate::entity::Entity;
use crate::error::{AssetKind, LoadError, Result};
use crate::loader::{scene_graph, ResourceLoader};
use crate::runtime::run_blocking;
use crate::source::AssetSource;
use crate::Bundle;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Root of a loaded scene, ready to be anchored by the caller
#[derive(Debug, Clone)]
pub struct AnchorEntity {
    pub id: Uuid,
    /// Name of the scene inside its file
    pub scene: Option<String>,
    pub children: Vec<Entity>,
}

impl AnchorEntity {
    /// Search every child tree for an entity called `name`
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.children.iter().find_map(|child| child.find(name))
    }
}

/// Loads scenes out of glTF scene files
#[derive(Debug, Clone)]
pub struct SceneLoader {
    main: Bundle,
    extension: String,
}

impl SceneLoader {
    /// Create a loader that resolves scene files in `main`
    pub fn new(main: Bundle, extension: impl Into<String>) -> Self {
        Self {
            main,
            extension: extension.into(),
        }
    }

    /// Locate `scene` inside `filename.<extension>` of the main bundle
    pub fn locate(
        &self,
        filename: &str,
        extension: Option<&str>,
        scene: &str,
    ) -> Result<SceneLocator> {
        self.main
            .scene_url(filename, extension.unwrap_or(&self.extension), scene)
    }

    /// Load the scene a locator points at
    pub async fn load_scene(&self, locator: &SceneLocator) -> Result<AnchorEntity> {
        let source = AssetSource::path(locator.file.clone());
        let bytes = source.resolve(&self.main, &[&self.extension])?.read().await?;
        let locator = locator.clone();
        run_blocking(move || {
            SceneLoader::decode(&bytes, locator.scene.as_deref(), &locator.file)
        })
        .await
    }

    /// Decode one scene from document bytes; `None` picks the default scene
    pub fn decode(bytes: &[u8], scene: Option<&str>, file: &Path) -> Result<AnchorEntity> {
        let gltf = scene_graph::parse(bytes, AssetKind::Scene)?;

        let (name, children) = match scene_graph::select_scene(&gltf, scene) {
            Some(selected) => {
                let materials = scene_graph::read_materials(&gltf);
                let children = selected
                    .nodes()
                    .map(|node| scene_graph::build_entity(&gltf, node, &materials))
                    .collect::<Result<Vec<_>>>()?;
                (selected.name().map(str::to_string), children)
            }
            None => match scene {
                Some(missing) => {
                    log::error!("Scene '{missing}' not found in {}", file.display());
                    return Err(LoadError::MissingScene {
                        file: file.to_path_buf(),
                        scene: missing.to_string(),
                    });
                }
                None => (None, scene_graph::document_root(&gltf, None)?.children),
            },
        };

        Ok(AnchorEntity {
            id: Uuid::new_v4(),
            scene: name,
            children,
        })
    }
}

#[async_trait]
impl ResourceLoader for SceneLoader {
    type Output = AnchorEntity;

    fn kind(&self) -> AssetKind {
        AssetKind::Scene
    }

    async fn load(&self, source: &AssetSource) -> Result<AnchorEntity> {
        let resolved = source.resolve(&self.main, &[&self.extension])?;
        let file = resolved
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(source.label()));
        let bytes = resolved.read().await?;
        run_blocking(move || SceneLoader::decode(&bytes, None, &file)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPERIENCE: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 1,
        "scenes": [
            { "name": "Box", "nodes": [0] },
            { "name": "Lamp", "nodes": [1, 2] }
        ],
        "nodes": [ { "name": "crate" }, { "name": "bulb" }, { "name": "shade" } ]
    }"#;

    #[test]
    fn test_decode_named_scene() {
        let anchor =
            SceneLoader::decode(EXPERIENCE.as_bytes(), Some("Box"), Path::new("x.gltf")).unwrap();
        assert_eq!(anchor.scene.as_deref(), Some("Box"));
        assert!(anchor.find("crate").is_some());
        assert!(anchor.find("bulb").is_none());
    }

    #[test]
    fn test_decode_default_scene() {
        let anchor = SceneLoader::decode(EXPERIENCE.as_bytes(), None, Path::new("x.gltf")).unwrap();
        assert_eq!(anchor.scene.as_deref(), Some("Lamp"));
        assert_eq!(anchor.children.len(), 2);
    }

    #[test]
    fn test_decode_missing_scene() {
        let err = SceneLoader::decode(EXPERIENCE.as_bytes(), Some("Ghost"), Path::new("x.gltf"))
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingScene { ref scene, .. } if scene == "Ghost"));
    }

    #[tokio::test]
    async fn test_locate_and_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Experience.gltf"), EXPERIENCE).unwrap();

        let loader = SceneLoader::new(Bundle::at(dir.path()), "gltf");
        let locator = loader.locate("Experience", None, "Box").unwrap();
        let anchor = loader.load_scene(&locator).await.unwrap();
        assert_eq!(anchor.children.len(), 1);

        assert!(loader.locate("Nope", None, "Box").unwrap_err().is_not_found());
    }
}
