//! Resource bundles
//!
//! A bundle is a directory of shipped resources. Name-based loads look up
//! `<root>/<name>.<ext>` for each candidate extension in order.

use crate::error::{LoadError, Result};
use std::path::{Path, PathBuf};

/// A directory of resources addressed by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bundle {
    root: PathBuf,
}

impl Bundle {
    /// Create a bundle rooted at `root`
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The bundle's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `name.ext` inside the bundle, if that file exists
    pub fn url_for_resource(&self, name: &str, extension: &str) -> Option<PathBuf> {
        let path = self.candidate(name, extension);
        path.is_file().then_some(path)
    }

    /// Resolve `name` against each extension in turn
    ///
    /// A name that already carries an extension is looked up verbatim first.
    pub fn resolve<S: AsRef<str>>(&self, name: &str, extensions: &[S]) -> Result<PathBuf> {
        let verbatim = self.root.join(name);
        if Path::new(name).extension().is_some() && verbatim.is_file() {
            return Ok(verbatim);
        }

        for ext in extensions {
            if let Some(path) = self.url_for_resource(name, ext.as_ref()) {
                return Ok(path);
            }
        }

        let path = extensions
            .first()
            .map(|ext| self.candidate(name, ext.as_ref()))
            .unwrap_or(verbatim);
        log::error!("No file exists at path {}", path.display());
        Err(LoadError::NotFound { path })
    }

    /// Locate one scene inside a scene file of this bundle
    pub fn scene_url(&self, filename: &str, extension: &str, scene: &str) -> Result<SceneLocator> {
        let file = self.url_for_resource(filename, extension).ok_or_else(|| {
            let path = self.candidate(filename, extension);
            log::error!("Error finding scene file {}", path.display());
            LoadError::NotFound { path }
        })?;

        Ok(SceneLocator {
            file,
            scene: Some(scene.to_string()),
        })
    }

    fn candidate(&self, name: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{name}.{extension}"))
    }
}

/// A scene file plus an optional scene name within it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLocator {
    pub file: PathBuf,
    /// `None` selects the file's default scene
    pub scene: Option<String>,
}

impl SceneLocator {
    /// Select the default scene of `file`
    pub fn default_scene(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            scene: None,
        }
    }

    /// Select the scene called `scene` in `file`
    pub fn named(file: impl Into<PathBuf>, scene: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            scene: Some(scene.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tries_extensions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("robot.gltf"), b"{}").unwrap();

        let bundle = Bundle::at(dir.path());
        let path = bundle.resolve("robot", &["glb", "gltf"]).unwrap();
        assert_eq!(path, dir.path().join("robot.gltf"));
    }

    #[test]
    fn test_resolve_prefers_first_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("robot.gltf"), b"{}").unwrap();
        std::fs::write(dir.path().join("robot.glb"), b"glTF").unwrap();

        let bundle = Bundle::at(dir.path());
        let path = bundle.resolve("robot", &["glb", "gltf"]).unwrap();
        assert_eq!(path, dir.path().join("robot.glb"));
    }

    #[test]
    fn test_resolve_accepts_explicit_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("robot.gltf"), b"{}").unwrap();

        let bundle = Bundle::at(dir.path());
        let path = bundle.resolve("robot.gltf", &["glb"]).unwrap();
        assert_eq!(path, dir.path().join("robot.gltf"));
    }

    #[test]
    fn test_resolve_missing_reports_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = Bundle::at(dir.path());

        match bundle.resolve("ghost", &["glb", "gltf"]) {
            Err(LoadError::NotFound { path }) => assert_eq!(path, dir.path().join("ghost.glb")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_scene_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Experience.gltf"), b"{}").unwrap();

        let bundle = Bundle::at(dir.path());
        let locator = bundle.scene_url("Experience", "gltf", "Box").unwrap();
        assert_eq!(locator, SceneLocator::named(dir.path().join("Experience.gltf"), "Box"));

        assert!(bundle.scene_url("Missing", "gltf", "Box").is_err());
    }
}
