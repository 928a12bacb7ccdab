//! Loader facade
//!
//! [`AssetLoader`] ties the per-kind loaders to a configuration, a spawner
//! for callback delivery and a shared metrics handle. Every entry point
//! builds [`LoadTask`]s and hands them to the same single or batched core,
//! so lookups that fail report [`LoadError::NotFound`] through the returned
//! future or `on_error`, never by returning early.
//!
//! # Example
//! ```ignore
//! let loader = AssetLoader::new(LoaderConfig::default(), TokioSpawner::new());
//! let [robot, drummer]: [Entity; 2] = loader
//!     .load_entities(None, ["robot", "drummer"])
//!     .await?
//!     .try_into()
//!     .unwrap();
//! ```

use super::task;
use crate::audio::{AudioFile, AudioFileResource, AudioLoader};
use crate::batch::{deliver, run_batch, PendingLoads};
use crate::body_tracked::{BodyTrackedEntity, BodyTrackedLoader};
use crate::config::LoaderConfig;
use crate::entity::{Entity, EntityLoader};
use crate::error::{LoadError, Result};
use crate::metrics::LoadMetricsHandle;
use crate::model::{ModelEntity, ModelLoader};
use crate::runtime::{AsyncSpawner, TaskHandle};
use crate::scene::{AnchorEntity, SceneLoader};
use crate::source::AssetSource;
use crate::task::LoadTask;
use crate::texture::{TextureLoader, TextureOptions, TextureResource};
use crate::{Bundle, SceneLocator};
use std::path::PathBuf;
use std::time::Instant;

/// Entry point for loading every asset kind, singly or in batches
#[derive(Debug, Clone)]
pub struct AssetLoader<S: AsyncSpawner> {
    config: LoaderConfig,
    main: Bundle,
    spawner: S,
    metrics: LoadMetricsHandle,
    entities: EntityLoader,
    models: ModelLoader,
    textures: TextureLoader,
    audio: AudioLoader,
    scenes: SceneLoader,
    body_tracked: BodyTrackedLoader,
}

impl<S: AsyncSpawner> AssetLoader<S> {
    /// Create a loader whose callbacks run on `spawner`
    pub fn new(config: LoaderConfig, spawner: S) -> Self {
        let main = Bundle::at(&config.bundle_root);
        log::debug!(
            "Asset loader using bundle {} on {}",
            main.root().display(),
            spawner.runtime_name()
        );

        Self {
            entities: EntityLoader::new(main.clone(), config.model_extensions.clone()),
            models: ModelLoader::new(main.clone(), config.model_extensions.clone()),
            textures: TextureLoader::new(
                main.clone(),
                config.texture_extensions.clone(),
                TextureOptions::new(config.texture_semantic),
            ),
            audio: AudioLoader::new(
                main.clone(),
                config.audio_extensions.clone(),
                config.audio_input_mode,
                config.audio_loading_strategy,
            ),
            scenes: SceneLoader::new(main.clone(), config.scene_extension.clone()),
            body_tracked: BodyTrackedLoader::new(main.clone(), config.model_extensions.clone()),
            metrics: LoadMetricsHandle::new(),
            main,
            spawner,
            config,
        }
    }

    /// Share an existing metrics handle instead of a private one
    pub fn with_metrics(mut self, metrics: LoadMetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Bundle searched when a name-based request gives none
    pub fn main_bundle(&self) -> &Bundle {
        &self.main
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    pub fn metrics(&self) -> &LoadMetricsHandle {
        &self.metrics
    }

    // ---- tasks ----

    pub fn entity_task(&self, source: impl Into<AssetSource>) -> LoadTask<Entity> {
        task(self.entities.clone(), source)
    }

    pub fn model_task(&self, source: impl Into<AssetSource>) -> LoadTask<ModelEntity> {
        task(self.models.clone(), source)
    }

    pub fn texture_task(&self, source: impl Into<AssetSource>) -> LoadTask<TextureResource> {
        task(self.textures.clone(), source)
    }

    /// Texture task with explicit options instead of the configured defaults
    pub fn texture_task_with_options(
        &self,
        source: impl Into<AssetSource>,
        options: TextureOptions,
    ) -> LoadTask<TextureResource> {
        let loader = self.textures.clone();
        let source = source.into();
        LoadTask::new(source.label(), move || async move {
            loader.load_with(&source, options).await
        })
    }

    pub fn body_tracked_task(
        &self,
        source: impl Into<AssetSource>,
    ) -> LoadTask<BodyTrackedEntity> {
        task(self.body_tracked.clone(), source)
    }

    /// Audio task; names in `file` are looked up in `bundle` or the main bundle
    pub fn audio_task(&self, file: AudioFile, bundle: Option<&Bundle>) -> LoadTask<AudioFileResource> {
        let loader = self.audio.clone();
        let bundle = bundle.cloned();
        LoadTask::new(file.resource_name.clone(), move || async move {
            loader.load_file(&file, bundle.as_ref()).await
        })
    }

    /// Task loading `scene` from `filename` in the main bundle
    ///
    /// `extension` overrides the configured scene extension.
    pub fn scene_task(
        &self,
        filename: &str,
        extension: Option<&str>,
        scene: &str,
    ) -> LoadTask<AnchorEntity> {
        let loader = self.scenes.clone();
        let (filename, extension, scene) = (
            filename.to_string(),
            extension.map(str::to_string),
            scene.to_string(),
        );
        LoadTask::new(format!("{filename}#{scene}"), move || async move {
            let locator = loader.locate(&filename, extension.as_deref(), &scene)?;
            loader.load_scene(&locator).await
        })
    }

    /// Task loading the default scene of a scene file
    ///
    /// Named sources are looked up in their own bundle, or the main bundle.
    pub fn anchor_task(&self, source: impl Into<AssetSource>) -> LoadTask<AnchorEntity> {
        task(self.scenes.clone(), source)
    }

    /// Task loading the scene `locator` points at
    pub fn scene_at_task(&self, locator: SceneLocator) -> LoadTask<AnchorEntity> {
        let loader = self.scenes.clone();
        let label = match &locator.scene {
            Some(scene) => format!("{}#{scene}", locator.file.display()),
            None => locator.file.display().to_string(),
        };
        LoadTask::new(label, move || async move { loader.load_scene(&locator).await })
    }

    // ---- core ----

    /// Run one task, recording it in the metrics
    pub async fn load<T: Send + 'static>(&self, task: LoadTask<T>) -> Result<T> {
        run_single(task, &self.metrics).await
    }

    /// Run a batch of two or more tasks, recording it in the metrics
    pub async fn batch<T, I>(&self, tasks: I) -> Result<Vec<T>>
    where
        T: Send + 'static,
        I: IntoIterator<Item = LoadTask<T>>,
    {
        run_batch(tasks.into_iter().collect(), Some(self.metrics.inner())).await
    }

    /// Callback form of [`AssetLoader::load`]
    pub fn load_with<T, OnSuccess, OnError>(
        &self,
        task: LoadTask<T>,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        T: Send + 'static,
        OnSuccess: FnOnce(T) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let metrics = self.metrics.clone();
        self.spawner.spawn(async move {
            deliver(run_single(task, &metrics).await, on_success, on_error)
        })
    }

    /// Callback form of [`AssetLoader::batch`]
    pub fn batch_with<T, I, OnSuccess, OnError>(
        &self,
        tasks: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        T: Send + 'static,
        I: IntoIterator<Item = LoadTask<T>>,
        OnSuccess: FnOnce(Vec<T>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks: Vec<_> = tasks.into_iter().collect();
        let metrics = self.metrics.clone();
        self.spawner.spawn(async move {
            deliver(run_batch(tasks, Some(metrics.inner())).await, on_success, on_error)
        })
    }

    // ---- single loads ----

    pub async fn load_entity(&self, source: impl Into<AssetSource>) -> Result<Entity> {
        self.load(self.entity_task(source)).await
    }

    pub async fn load_model(&self, source: impl Into<AssetSource>) -> Result<ModelEntity> {
        self.load(self.model_task(source)).await
    }

    pub async fn load_texture(&self, source: impl Into<AssetSource>) -> Result<TextureResource> {
        self.load(self.texture_task(source)).await
    }

    pub async fn load_body_tracked(
        &self,
        source: impl Into<AssetSource>,
    ) -> Result<BodyTrackedEntity> {
        self.load(self.body_tracked_task(source)).await
    }

    pub async fn load_audio(&self, file: &AudioFile) -> Result<AudioFileResource> {
        self.load(self.audio_task(file.clone(), None)).await
    }

    /// Load a named scene from a scene file in the main bundle
    pub async fn load_scene(&self, filename: &str, scene: &str) -> Result<AnchorEntity> {
        self.load(self.scene_task(filename, None, scene)).await
    }

    /// Load the default scene of a scene file
    pub async fn load_anchor(&self, source: impl Into<AssetSource>) -> Result<AnchorEntity> {
        self.load(self.anchor_task(source)).await
    }

    /// Load a scene from a locator, e.g. one built by [`Bundle::scene_url`]
    pub async fn load_scene_at(&self, locator: &SceneLocator) -> Result<AnchorEntity> {
        self.load(self.scene_at_task(locator.clone())).await
    }

    pub fn load_entity_with<OnSuccess, OnError>(
        &self,
        source: impl Into<AssetSource>,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        OnSuccess: FnOnce(Entity) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        self.load_with(self.entity_task(source), on_success, on_error)
    }

    pub fn load_model_with<OnSuccess, OnError>(
        &self,
        source: impl Into<AssetSource>,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        OnSuccess: FnOnce(ModelEntity) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        self.load_with(self.model_task(source), on_success, on_error)
    }

    pub fn load_texture_with<OnSuccess, OnError>(
        &self,
        source: impl Into<AssetSource>,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        OnSuccess: FnOnce(TextureResource) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        self.load_with(self.texture_task(source), on_success, on_error)
    }

    pub fn load_body_tracked_with<OnSuccess, OnError>(
        &self,
        source: impl Into<AssetSource>,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        OnSuccess: FnOnce(BodyTrackedEntity) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        self.load_with(self.body_tracked_task(source), on_success, on_error)
    }

    pub fn load_audio_with<OnSuccess, OnError>(
        &self,
        file: &AudioFile,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        OnSuccess: FnOnce(AudioFileResource) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        self.load_with(self.audio_task(file.clone(), None), on_success, on_error)
    }

    pub fn load_scene_with<OnSuccess, OnError>(
        &self,
        filename: &str,
        scene: &str,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        OnSuccess: FnOnce(AnchorEntity) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        self.load_with(self.scene_task(filename, None, scene), on_success, on_error)
    }

    pub fn load_anchor_with<OnSuccess, OnError>(
        &self,
        source: impl Into<AssetSource>,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        OnSuccess: FnOnce(AnchorEntity) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        self.load_with(self.anchor_task(source), on_success, on_error)
    }

    pub fn load_scene_at_with<OnSuccess, OnError>(
        &self,
        locator: &SceneLocator,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        OnSuccess: FnOnce(AnchorEntity) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        self.load_with(self.scene_at_task(locator.clone()), on_success, on_error)
    }

    // ---- batches ----

    /// Load entities by name from `bundle`, or the main bundle
    pub async fn load_entities<I, N>(&self, bundle: Option<&Bundle>, names: I) -> Result<Vec<Entity>>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.batch(named(bundle, names).map(|source| self.entity_task(source)))
            .await
    }

    /// Load entities from files, each with an optional name
    pub async fn load_entities_at<I>(&self, entries: I) -> Result<Vec<Entity>>
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
    {
        self.batch(entries.into_iter().map(|entry| self.entity_task(entry)))
            .await
    }

    /// Load model entities by name from `bundle`, or the main bundle
    pub async fn load_models<I, N>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
    ) -> Result<Vec<ModelEntity>>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.batch(named(bundle, names).map(|source| self.model_task(source)))
            .await
    }

    /// Load model entities from files, each with an optional name
    pub async fn load_models_at<I>(&self, entries: I) -> Result<Vec<ModelEntity>>
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
    {
        self.batch(entries.into_iter().map(|entry| self.model_task(entry)))
            .await
    }

    /// Load textures by name from `bundle`, or the main bundle
    pub async fn load_textures<I, N>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
    ) -> Result<Vec<TextureResource>>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.batch(named(bundle, names).map(|source| self.texture_task(source)))
            .await
    }

    /// Load textures from files, each with an optional name
    pub async fn load_textures_at<I>(&self, entries: I) -> Result<Vec<TextureResource>>
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
    {
        self.batch(entries.into_iter().map(|entry| self.texture_task(entry)))
            .await
    }

    /// Load skeleton-carrying models by name from `bundle`, or the main bundle
    pub async fn load_body_tracked_entities<I, N>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
    ) -> Result<Vec<BodyTrackedEntity>>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.batch(named(bundle, names).map(|source| self.body_tracked_task(source)))
            .await
    }

    pub async fn load_body_tracked_entities_at<I>(
        &self,
        entries: I,
    ) -> Result<Vec<BodyTrackedEntity>>
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
    {
        self.batch(entries.into_iter().map(|entry| self.body_tracked_task(entry)))
            .await
    }

    /// Load the default scene of each named scene file
    pub async fn load_anchors<I, N>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
    ) -> Result<Vec<AnchorEntity>>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.batch(named(bundle, names).map(|source| self.anchor_task(source)))
            .await
    }

    pub async fn load_anchors_at<I>(&self, entries: I) -> Result<Vec<AnchorEntity>>
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
    {
        self.batch(entries.into_iter().map(|entry| self.anchor_task(entry)))
            .await
    }

    /// Load the scenes a list of locators point at
    pub async fn load_scenes_at<I>(&self, locators: I) -> Result<Vec<AnchorEntity>>
    where
        I: IntoIterator<Item = SceneLocator>,
    {
        self.batch(locators.into_iter().map(|locator| self.scene_at_task(locator)))
            .await
    }

    /// Load audio clips; names are looked up in `bundle`, or the main bundle
    pub async fn load_audio_files<I>(
        &self,
        bundle: Option<&Bundle>,
        files: I,
    ) -> Result<Vec<AudioFileResource>>
    where
        I: IntoIterator<Item = AudioFile>,
    {
        self.batch(files.into_iter().map(|file| self.audio_task(file, bundle)))
            .await
    }

    pub fn load_entities_with<I, N, OnSuccess, OnError>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        OnSuccess: FnOnce(Vec<Entity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = named(bundle, names).map(|source| self.entity_task(source));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_entities_at_with<I, OnSuccess, OnError>(
        &self,
        entries: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
        OnSuccess: FnOnce(Vec<Entity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = entries.into_iter().map(|entry| self.entity_task(entry));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_models_with<I, N, OnSuccess, OnError>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        OnSuccess: FnOnce(Vec<ModelEntity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = named(bundle, names).map(|source| self.model_task(source));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_models_at_with<I, OnSuccess, OnError>(
        &self,
        entries: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
        OnSuccess: FnOnce(Vec<ModelEntity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = entries.into_iter().map(|entry| self.model_task(entry));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_audio_files_with<I, OnSuccess, OnError>(
        &self,
        bundle: Option<&Bundle>,
        files: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = AudioFile>,
        OnSuccess: FnOnce(Vec<AudioFileResource>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = files.into_iter().map(|file| self.audio_task(file, bundle));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_textures_with<I, N, OnSuccess, OnError>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        OnSuccess: FnOnce(Vec<TextureResource>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = named(bundle, names).map(|source| self.texture_task(source));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_textures_at_with<I, OnSuccess, OnError>(
        &self,
        entries: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
        OnSuccess: FnOnce(Vec<TextureResource>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = entries.into_iter().map(|entry| self.texture_task(entry));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_body_tracked_entities_with<I, N, OnSuccess, OnError>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        OnSuccess: FnOnce(Vec<BodyTrackedEntity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = named(bundle, names).map(|source| self.body_tracked_task(source));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_body_tracked_entities_at_with<I, OnSuccess, OnError>(
        &self,
        entries: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
        OnSuccess: FnOnce(Vec<BodyTrackedEntity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = entries.into_iter().map(|entry| self.body_tracked_task(entry));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_anchors_with<I, N, OnSuccess, OnError>(
        &self,
        bundle: Option<&Bundle>,
        names: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        OnSuccess: FnOnce(Vec<AnchorEntity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = named(bundle, names).map(|source| self.anchor_task(source));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_anchors_at_with<I, OnSuccess, OnError>(
        &self,
        entries: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = (PathBuf, Option<String>)>,
        OnSuccess: FnOnce(Vec<AnchorEntity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = entries.into_iter().map(|entry| self.anchor_task(entry));
        self.batch_with(tasks, on_success, on_error)
    }

    pub fn load_scenes_at_with<I, OnSuccess, OnError>(
        &self,
        locators: I,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> TaskHandle
    where
        I: IntoIterator<Item = SceneLocator>,
        OnSuccess: FnOnce(Vec<AnchorEntity>) + Send + 'static,
        OnError: FnOnce(LoadError) + Send + 'static,
    {
        let tasks = locators.into_iter().map(|locator| self.scene_at_task(locator));
        self.batch_with(tasks, on_success, on_error)
    }
}

#[cfg(feature = "runtime-tokio")]
impl AssetLoader<crate::runtime::TokioSpawner> {
    /// Loader delivering callbacks on the ambient Tokio runtime
    pub fn tokio(config: LoaderConfig) -> Self {
        Self::new(config, crate::runtime::TokioSpawner::new())
    }
}

fn named<I, N>(bundle: Option<&Bundle>, names: I) -> std::vec::IntoIter<AssetSource>
where
    I: IntoIterator<Item = N>,
    N: Into<String>,
{
    names
        .into_iter()
        .map(|name| AssetSource::Named {
            name: name.into(),
            bundle: bundle.cloned(),
        })
        .collect::<Vec<_>>()
        .into_iter()
}

async fn run_single<T: Send + 'static>(task: LoadTask<T>, metrics: &LoadMetricsHandle) -> Result<T> {
    let label = task.label().to_string();
    metrics.record_load_started();
    let mut pending = PendingLoads::new(Some(metrics.inner()), 1);
    let started = Instant::now();
    let result = task.run().await;
    pending.finished_one();
    metrics.record_load_finished(&label, started.elapsed(), result.is_ok());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockSpawner;
    use futures::executor::block_on;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn loader() -> AssetLoader<MockSpawner> {
        let config = LoaderConfig::new().with_bundle_root("/nonexistent/bundle");
        AssetLoader::new(config, MockSpawner::blocking())
    }

    #[test]
    fn test_missing_entity_is_not_found() {
        let err = block_on(loader().load_entity("ghost")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_single_loads_update_metrics() {
        let loader = loader();
        let value = block_on(loader.load(LoadTask::ready("seven", Ok(7)))).unwrap();
        assert_eq!(value, 7);
        assert_eq!(loader.metrics().loads_succeeded(), 1);
        assert!(loader.metrics().load_time("seven").is_some());
    }

    #[test]
    fn test_batch_of_one_name_is_rejected() {
        let err = block_on(loader().load_entities(None, ["robot"])).unwrap_err();
        assert!(matches!(err, LoadError::BatchTooSmall { len: 1 }));
    }

    #[test]
    fn test_scene_lookup_failure_goes_to_on_error() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        loader().load_scene_with(
            "Experience",
            "Box",
            |_| panic!("scene should not load"),
            move |err| sink.lock().push(err),
        );

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_not_found());
    }

    #[test]
    fn test_anchor_by_locator_failure_goes_to_on_error() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        loader().load_scene_at_with(
            &SceneLocator::default_scene("/nonexistent/bundle/Experience.gltf"),
            |_| panic!("scene should not load"),
            move |err| sink.lock().push(err),
        );

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_not_found());
    }

    #[test]
    fn test_dropped_single_load_counts_cancelled() {
        use futures::FutureExt;

        let loader = loader();
        {
            let task = LoadTask::new("stuck", futures::future::pending::<Result<u32>>);
            let mut load = Box::pin(loader.load(task));
            let waker = futures::task::noop_waker();
            let mut cx = std::task::Context::from_waker(&waker);
            assert!(load.poll_unpin(&mut cx).is_pending());
        }

        assert_eq!(loader.metrics().loads_started(), 1);
        assert_eq!(loader.metrics().loads_cancelled(), 1);
        assert_eq!(loader.metrics().loads_failed(), 0);
    }

    #[test]
    fn test_batch_with_records_batch() {
        let loader = loader();
        let results = Arc::new(Mutex::new(None));
        let sink = results.clone();
        let tasks = vec![LoadTask::ready("a", Ok(1)), LoadTask::ready("b", Ok(2))];
        loader.batch_with(tasks, move |values| *sink.lock() = Some(values), |err| {
            panic!("unexpected error: {err}")
        });

        assert_eq!(*results.lock(), Some(vec![1, 2]));
        assert_eq!(loader.metrics().batches_completed(), 1);
    }
}
