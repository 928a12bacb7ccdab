//! Where an asset's bytes come from

use crate::bundle::Bundle;
use crate::error::{LoadError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Location of a single asset
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSource {
    /// A resource looked up by name in a bundle (`None` means the main bundle)
    Named { name: String, bundle: Option<Bundle> },
    /// A file on disk, with an optional resource name to assign
    Path { path: PathBuf, name: Option<String> },
    /// Bytes already in memory; `extension` hints the format
    Memory {
        bytes: Arc<[u8]>,
        name: Option<String>,
        extension: Option<String>,
    },
}

impl AssetSource {
    /// Look up `name` in the main bundle
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            bundle: None,
        }
    }

    /// Look up `name` in a specific bundle
    pub fn named_in(name: impl Into<String>, bundle: Bundle) -> Self {
        Self::Named {
            name: name.into(),
            bundle: Some(bundle),
        }
    }

    /// Load from a file on disk
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path {
            path: path.into(),
            name: None,
        }
    }

    /// Load from a file on disk and assign a resource name
    pub fn path_named(path: impl Into<PathBuf>, name: Option<String>) -> Self {
        Self::Path {
            path: path.into(),
            name,
        }
    }

    /// Load from in-memory bytes
    pub fn memory(bytes: impl Into<Arc<[u8]>>, extension: Option<&str>) -> Self {
        Self::Memory {
            bytes: bytes.into(),
            name: None,
            extension: extension.map(str::to_string),
        }
    }

    /// Name given to the loaded resource
    ///
    /// Named sources use their lookup name; path sources fall back to the
    /// file stem.
    pub fn resource_name(&self) -> Option<String> {
        match self {
            Self::Named { name, .. } => Some(name.clone()),
            Self::Path { path, name } => name.clone().or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            }),
            Self::Memory { name, .. } => name.clone(),
        }
    }

    /// Short description used in logs and metrics
    pub fn label(&self) -> String {
        match self {
            Self::Named { name, .. } => name.clone(),
            Self::Path { path, .. } => path.display().to_string(),
            Self::Memory { name, bytes, .. } => name
                .clone()
                .unwrap_or_else(|| format!("<{} bytes>", bytes.len())),
        }
    }

    /// Resolve to a concrete file or byte buffer
    ///
    /// Missing files are reported as [`LoadError::NotFound`] here, before any
    /// decoding is attempted.
    pub fn resolve<S: AsRef<str>>(&self, main: &Bundle, extensions: &[S]) -> Result<Resolved> {
        match self {
            Self::Named { name, bundle } => {
                let bundle = bundle.as_ref().unwrap_or(main);
                bundle.resolve(name, extensions).map(Resolved::File)
            }
            Self::Path { path, .. } => {
                if path.is_file() {
                    Ok(Resolved::File(path.clone()))
                } else {
                    log::error!("No file exists at path {}", path.display());
                    Err(LoadError::NotFound { path: path.clone() })
                }
            }
            Self::Memory {
                bytes, extension, ..
            } => Ok(Resolved::Memory {
                bytes: Arc::clone(bytes),
                extension: extension.clone(),
            }),
        }
    }
}

impl From<&str> for AssetSource {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for AssetSource {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<PathBuf> for AssetSource {
    fn from(path: PathBuf) -> Self {
        Self::path(path)
    }
}

impl From<(PathBuf, Option<String>)> for AssetSource {
    fn from((path, name): (PathBuf, Option<String>)) -> Self {
        Self::path_named(path, name)
    }
}

/// A source after bundle lookup
#[derive(Debug, Clone)]
pub enum Resolved {
    File(PathBuf),
    Memory {
        bytes: Arc<[u8]>,
        extension: Option<String>,
    },
}

impl Resolved {
    /// Format hint taken from the file extension or the memory source
    pub fn extension(&self) -> Option<String> {
        match self {
            Self::File(path) => path
                .extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase()),
            Self::Memory { extension, .. } => extension.as_deref().map(str::to_ascii_lowercase),
        }
    }

    /// The on-disk path, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Memory { .. } => None,
        }
    }

    /// Read the full contents
    pub async fn read(&self) -> Result<Arc<[u8]>> {
        match self {
            Self::File(path) => read_file(path).await.map(Arc::from),
            Self::Memory { bytes, .. } => Ok(Arc::clone(bytes)),
        }
    }
}

#[cfg(feature = "runtime-tokio")]
async fn read_file(path: &Path) -> Result<Vec<u8>> {
    // tokio::fs needs a runtime; executors such as the mock spawner read inline
    if tokio::runtime::Handle::try_current().is_err() {
        return Ok(std::fs::read(path)?);
    }
    Ok(tokio::fs::read(path).await?)
}

#[cfg(not(feature = "runtime-tokio"))]
async fn read_file(path: &Path) -> Result<Vec<u8>> {
    Ok(std::fs::read(path)?)
}
