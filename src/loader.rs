//! Loading atlas metadata and textures
//!
//! The page cache never touches files or the network itself. It asks an
//! [`AtlasLoader`] for the metadata and the texture and joins the two.
//! [`FsLoader`] is the local-filesystem implementation used by the CLI.

use crate::models::AtlasMetadata;
use crate::page::DefinitionError;
use crate::parser::{parse_metadata, MetadataError};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failure to build a page.
///
/// Cloneable so every caller waiting on one build sees the same error.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Failed to read atlas metadata '{path}': {source}")]
    Metadata {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("Failed to read atlas image '{path}': {source}")]
    Texture {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error(transparent)]
    InvalidMetadata(#[from] MetadataError),
    #[error("Failed to apply definitions to '{identity}': {source}")]
    Definitions {
        identity: String,
        #[source]
        source: DefinitionError,
    },
    /// Failure reported by a custom loader
    #[error("{0}")]
    Other(String),
}

/// Source of metadata and textures for the page cache.
///
/// Both methods may run concurrently for the same page.
#[async_trait]
pub trait AtlasLoader: Send + Sync + 'static {
    /// Opaque image handle stored on the page
    type Texture: Send + Sync + 'static;

    async fn load_metadata(&self, source: &str) -> Result<AtlasMetadata, LoadError>;

    async fn load_texture(&self, identity: &str) -> Result<Self::Texture, LoadError>;
}

/// Undecoded image file contents.
#[derive(Clone, PartialEq, Eq)]
pub struct RawTexture {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for RawTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTexture")
            .field("path", &self.path)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Loads metadata and images from the local filesystem.
///
/// Relative paths are resolved against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    root: Option<PathBuf>,
}

impl FsLoader {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => Path::new(path).to_path_buf(),
        }
    }
}

#[async_trait]
impl AtlasLoader for FsLoader {
    type Texture = RawTexture;

    async fn load_metadata(&self, source: &str) -> Result<AtlasMetadata, LoadError> {
        let path = self.resolve(source);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::Metadata {
                path: path.display().to_string(),
                source: Arc::new(e),
            })?;
        Ok(parse_metadata(&text)?)
    }

    async fn load_texture(&self, identity: &str) -> Result<RawTexture, LoadError> {
        let path = self.resolve(identity);
        let bytes = tokio::fs::read(&path).await.map_err(|e| LoadError::Texture {
            path: path.display().to_string(),
            source: Arc::new(e),
        })?;
        Ok(RawTexture { path, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const META: &str = r#"{"frames": [
        {"name": "walk0", "src": "hero.png", "width": 8, "height": 8, "top": 0, "left": 0},
        {"name": "walk1", "src": "hero.png", "width": 8, "height": 8, "top": 0, "left": 8}
    ]}"#;

    #[tokio::test]
    async fn test_fs_loader_reads_metadata_and_texture() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hero.json"), META).unwrap();
        fs::write(dir.path().join("hero.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let loader = FsLoader::with_root(dir.path());
        let meta = loader.load_metadata("hero.json").await.unwrap();
        assert_eq!(meta.frames.len(), 2);

        let texture = loader.load_texture("hero.png").await.unwrap();
        assert_eq!(texture.bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(texture.path, dir.path().join("hero.png"));
    }

    #[tokio::test]
    async fn test_fs_loader_missing_file() {
        let dir = TempDir::new().unwrap();
        let loader = FsLoader::with_root(dir.path());
        let err = loader.load_metadata("missing.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Metadata { .. }));
        assert!(err.to_string().contains("missing.json"));

        let err = loader.load_texture("missing.png").await.unwrap_err();
        assert!(matches!(err, LoadError::Texture { .. }));
    }

    #[tokio::test]
    async fn test_fs_loader_invalid_metadata() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{frames: [{name: 1}]}").unwrap();
        let loader = FsLoader::with_root(dir.path());
        let err = loader.load_metadata("bad.json").await.unwrap_err();
        assert!(matches!(err, LoadError::InvalidMetadata(_)));
    }

    #[test]
    fn test_raw_texture_debug_hides_bytes() {
        let texture = RawTexture {
            path: PathBuf::from("a.png"),
            bytes: vec![0; 1024],
        };
        let debug = format!("{:?}", texture);
        assert!(debug.contains("1024"));
        assert!(!debug.contains("0, 0"));
    }
}
