//! Loader configuration

use crate::audio::{AudioInputMode, LoadingStrategy};
use crate::texture::TextureSemantic;
use std::path::PathBuf;

/// Environment variable that overrides the main bundle directory
pub const BUNDLE_ENV_VAR: &str = "ARCHETYPE_LOADER_BUNDLE";

/// Configuration shared by every loader created from an [`AssetLoader`](crate::AssetLoader)
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Directory searched by name-based loads when no bundle is given
    pub bundle_root: PathBuf,
    /// Extensions tried, in order, when loading an entity or model by name
    pub model_extensions: Vec<String>,
    /// Extensions tried, in order, when loading a texture by name
    pub texture_extensions: Vec<String>,
    /// Extensions tried, in order, when loading audio by name
    pub audio_extensions: Vec<String>,
    /// Default extension of scene files
    pub scene_extension: String,
    /// Semantic applied to textures when the caller doesn't pick one
    pub texture_semantic: TextureSemantic,
    /// Default audio input mode
    pub audio_input_mode: AudioInputMode,
    /// Default audio loading strategy
    pub audio_loading_strategy: LoadingStrategy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let bundle_root = std::env::var_os(BUNDLE_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assets"));

        Self {
            bundle_root,
            model_extensions: vec!["glb".into(), "gltf".into()],
            texture_extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
            audio_extensions: vec!["wav".into(), "mp3".into(), "ogg".into(), "flac".into()],
            scene_extension: "gltf".into(),
            texture_semantic: TextureSemantic::Color,
            audio_input_mode: AudioInputMode::Spatial,
            audio_loading_strategy: LoadingStrategy::Preload,
        }
    }
}

impl LoaderConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the main bundle directory
    pub fn with_bundle_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.bundle_root = root.into();
        self
    }

    /// Replace the extensions tried for named entity/model loads
    pub fn with_model_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default scene file extension
    pub fn with_scene_extension(mut self, extension: impl Into<String>) -> Self {
        self.scene_extension = extension.into();
        self
    }

    /// Set the default texture semantic
    pub fn with_texture_semantic(mut self, semantic: TextureSemantic) -> Self {
        self.texture_semantic = semantic;
        self
    }

    /// Set the default audio input mode and loading strategy
    pub fn with_audio_defaults(mut self, mode: AudioInputMode, strategy: LoadingStrategy) -> Self {
        self.audio_input_mode = mode;
        self.audio_loading_strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extensions() {
        let config = LoaderConfig::default();
        assert_eq!(config.model_extensions, vec!["glb", "gltf"]);
        assert_eq!(config.scene_extension, "gltf");
        assert_eq!(config.texture_semantic, TextureSemantic::Color);
    }

    #[test]
    fn test_builder_overrides() {
        let config = LoaderConfig::new()
            .with_bundle_root("/tmp/bundle")
            .with_model_extensions(["gltf"])
            .with_scene_extension("scene")
            .with_audio_defaults(AudioInputMode::NonSpatial, LoadingStrategy::Stream);

        assert_eq!(config.bundle_root, PathBuf::from("/tmp/bundle"));
        assert_eq!(config.model_extensions, vec!["gltf"]);
        assert_eq!(config.scene_extension, "scene");
        assert_eq!(config.audio_input_mode, AudioInputMode::NonSpatial);
        assert_eq!(config.audio_loading_strategy, LoadingStrategy::Stream);
    }
}
