//! Resource loaders
//!
//! Every asset kind has a loader implementing [`ResourceLoader`]. The
//! [`AssetLoader`] facade owns one of each and turns requests into
//! [`LoadTask`]s for the single and batched entry points.

mod asset_loader;
pub(crate) mod scene_graph;

pub use asset_loader::AssetLoader;

use crate::error::{AssetKind, Result};
use crate::source::AssetSource;
use crate::task::LoadTask;
use async_trait::async_trait;

/// Loads one kind of asset from an [`AssetSource`]
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// The asset this loader produces
    type Output: Send + 'static;

    /// Kind reported in decode errors
    fn kind(&self) -> AssetKind;

    /// Resolve, read and decode `source`
    async fn load(&self, source: &AssetSource) -> Result<Self::Output>;
}

/// Defer `loader.load(source)` into a task labelled after the source
pub fn task<L>(loader: L, source: impl Into<AssetSource>) -> LoadTask<L::Output>
where
    L: ResourceLoader + 'static,
{
    let source = source.into();
    LoadTask::new(source.label(), move || async move { loader.load(&source).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use futures::executor::block_on;

    struct Echo;

    #[async_trait]
    impl ResourceLoader for Echo {
        type Output = String;

        fn kind(&self) -> AssetKind {
            AssetKind::Entity
        }

        async fn load(&self, source: &AssetSource) -> Result<String> {
            match source {
                AssetSource::Named { name, .. } => Ok(name.to_uppercase()),
                _ => Err(LoadError::decode(self.kind(), "named sources only")),
            }
        }
    }

    #[test]
    fn test_task_is_deferred_and_labelled() {
        let task = task(Echo, "robot");
        assert_eq!(task.label(), "robot");
        assert_eq!(block_on(task.run()).unwrap(), "ROBOT");
    }

    #[test]
    fn test_task_surfaces_loader_errors() {
        let task = task(Echo, std::path::PathBuf::from("robot.glb"));
        let err = block_on(task.run()).unwrap_err();
        assert!(matches!(err, LoadError::Decode { kind: AssetKind::Entity, .. }));
    }
}
