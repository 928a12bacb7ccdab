//! Error types for archetype_loader

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// The kind of asset a failed load was producing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Entity,
    Model,
    Texture,
    Audio,
    Scene,
    BodyTracked,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Entity => "entity",
            Self::Model => "model",
            Self::Texture => "texture",
            Self::Audio => "audio",
            Self::Scene => "scene",
            Self::BodyTracked => "body-tracked entity",
        };
        f.write_str(name)
    }
}

/// Main error type for load operations
///
/// `Clone` so that the callback surface can hand the same failure to
/// several observers; non-clonable sources are kept behind an `Arc`.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    #[error("No file exists at path {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to decode {kind}: {message}")]
    Decode { kind: AssetKind, message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("GLTF error: {0}")]
    Gltf(Arc<gltf::Error>),

    #[error("Image error: {0}")]
    Image(Arc<image::ImageError>),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Scene '{scene}' not found in {}", file.display())]
    MissingScene { file: PathBuf, scene: String },

    #[error("'{name}' has no skeleton to drive with body tracking")]
    MissingSkeleton { name: String },

    #[error("Load finished without producing a value")]
    FinishedWithoutValue,

    #[error("Batch loads need at least 2 requests, got {len}; use the single-asset loader instead")]
    BatchTooSmall { len: usize },

    #[error("Load was cancelled")]
    Cancelled,
}

impl LoadError {
    /// Shorthand for a decode failure of the given kind
    pub fn decode(kind: AssetKind, message: impl Into<String>) -> Self {
        Self::Decode {
            kind,
            message: message.into(),
        }
    }

    /// Whether this is a resource-not-found failure
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<gltf::Error> for LoadError {
    fn from(err: gltf::Error) -> Self {
        Self::Gltf(Arc::new(err))
    }
}

impl From<image::ImageError> for LoadError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(Arc::new(err))
    }
}

impl From<symphonia::core::errors::Error> for LoadError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        Self::Audio(err.to_string())
    }
}

/// Result type alias for load operations
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_path() {
        let err = LoadError::NotFound {
            path: PathBuf::from("assets/robot.glb"),
        };
        assert!(err.to_string().contains("assets/robot.glb"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_io_not_found_counts_as_not_found() {
        let err: LoadError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(err.is_not_found());

        let err: LoadError = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_clone_keeps_source() {
        let err: LoadError = std::io::Error::other("disk on fire").into();
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }
}
