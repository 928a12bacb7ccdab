//! Feature matrix tests - verify the public surface under each feature set

use archetype_loader::{
    make_box, make_plane, make_sphere, AssetLoader, LoaderConfig, MockSpawner, PrimitiveStyle,
};

#[test]
fn test_default_config() {
    let config = LoaderConfig::default();
    assert_eq!(config.model_extensions, vec!["glb", "gltf"]);

    let loader = AssetLoader::new(config.clone(), MockSpawner::new());
    assert_eq!(loader.main_bundle().root(), config.bundle_root.as_path());
}

#[test]
fn test_primitives_available() {
    use glam::Vec3;

    let style = PrimitiveStyle::default();
    assert!(make_sphere(0.5, style).vertex_count() > 0);
    assert_eq!(make_box(Vec3::ONE, style).vertex_count(), 24);
    assert_eq!(make_plane(1.0, 1.0, style).vertex_count(), 4);
}

#[test]
fn test_decoders_reject_garbage() {
    use archetype_loader::{EntityLoader, TextureLoader, TextureOptions};

    assert!(EntityLoader::decode(&[], None).is_err());
    assert!(TextureLoader::decode(&[], None, TextureOptions::default()).is_err());
}

#[cfg(feature = "runtime-tokio")]
#[test]
fn test_tokio_loader_available() {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    runtime.block_on(async {
        let loader = AssetLoader::tokio(LoaderConfig::new().with_bundle_root("/nonexistent"));
        let err = loader.load_entity("robot").await.unwrap_err();
        assert!(err.is_not_found());
    });
}
