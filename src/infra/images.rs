//! Read-only access to the post image directory.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("invalid image path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed image directory.
#[derive(Debug)]
pub struct ImageStorage {
    root: PathBuf,
}

impl ImageStorage {
    /// The directory is not required to exist; missing files surface as `NotFound` on read.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn read(&self, relative_path: &str) -> Result<Bytes, ImageError> {
        let absolute = self.resolve(relative_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn resolve(&self, relative_path: &str) -> Result<PathBuf, ImageError> {
        let relative = Path::new(relative_path);
        if relative_path.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(ImageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}
