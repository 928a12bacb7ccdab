//! archetype_loader - Ordered batch loading for 3D scene assets
//!
//! # Features
//! - Concurrent batch loads that return results in request order
//! - Fail-fast batches: the first error observed wins, the rest are dropped
//! - Async and callback entry points over one core
//! - Runtime abstraction (Tokio, or any custom executor)
//! - Loaders for entities, models, textures, audio, scenes and body-tracked
//!   characters, plus generated primitives
//!
//! # Quick Start
//!
//! ```ignore
//! use archetype_loader::{AssetLoader, LoaderConfig};
//!
//! let loader = AssetLoader::tokio(LoaderConfig::default());
//! let entities = loader.load_entities(None, ["robot", "drummer"]).await?;
//! assert_eq!(entities[0].name.as_deref(), Some("robot"));
//! ```
//!
//! # Feature Flags
//!
//! - `runtime-tokio` (default): Tokio spawner, async file reads and
//!   decoding on the blocking pool

// Core modules
pub mod batch;
pub mod loader;
pub mod runtime;
pub mod task;

// Host layer
pub mod bundle;
pub mod config;
pub mod metrics;
pub mod source;

// Asset kinds
pub mod audio;
pub mod body_tracked;
pub mod entity;
pub mod model;
pub mod primitives;
pub mod scene;
pub mod texture;
pub mod vertex;

// Error types
mod error;
pub use error::{AssetKind, LoadError, Result};

// Re-export the batch core
pub use batch::{load_many, load_many_with, load_one_with, MIN_BATCH_SIZE};
pub use task::{Completion, LoadTask};

// Re-export runtime types
pub use runtime::mock::{MockSpawnBehavior, MockSpawner};
#[cfg(feature = "runtime-tokio")]
pub use runtime::tokio_impl::TokioSpawner;
pub use runtime::{AsyncSpawner, TaskHandle};

// Re-export host types
pub use bundle::{Bundle, SceneLocator};
pub use config::{LoaderConfig, BUNDLE_ENV_VAR};
pub use loader::{AssetLoader, ResourceLoader};
pub use metrics::{LoadMetrics, LoadMetricsHandle};
pub use source::AssetSource;

// Re-export asset types
pub use audio::{
    AudioData, AudioFile, AudioFileResource, AudioInputMode, AudioLoader, LoadingStrategy,
};
pub use body_tracked::{BodyTrackedEntity, BodyTrackedLoader, Skeleton};
pub use entity::{Entity, EntityLoader};
pub use model::{
    AlphaMode, Bounds, Material, Mesh, ModelComponent, ModelEntity, ModelLoader, PrimitiveType,
    Transform,
};
pub use primitives::{
    make_box, make_box_with, make_plane, make_plane_with, make_sphere, PrimitiveStyle,
    ShapeOptions, DEFAULT_SPHERE_RADIUS,
};
pub use scene::{AnchorEntity, SceneLoader};
pub use texture::{TextureFormat, TextureLoader, TextureOptions, TextureResource, TextureSemantic};
pub use vertex::Vertex;

// Version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_mock_spawner_available() {
        let spawner = MockSpawner::new();
        assert_eq!(spawner.runtime_name(), "Mock");
    }
}
