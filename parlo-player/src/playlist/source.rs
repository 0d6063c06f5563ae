//! Playlist text sources
//!
//! The engine only needs raw text for a (content, language) pair; where that
//! text lives is the source's business.

use super::PlaylistKey;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Fetch raw playlist text
    async fn fetch(&self, key: &PlaylistKey) -> Result<String>;
}

/// Reads `<root>/<kind dir>/<content>/<lang>.txt`
#[derive(Debug, Clone)]
pub struct FsPlaylistSource {
    root: PathBuf,
}

impl FsPlaylistSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &PlaylistKey) -> Result<PathBuf> {
        for part in [key.content_id.as_str(), key.language.as_str()] {
            if part.is_empty() || part.contains(['/', '\\']) || part.starts_with('.') {
                return Err(Error::BadRequest(format!("invalid playlist component: {:?}", part)));
            }
        }
        Ok(self
            .root
            .join(key.kind.dir_name())
            .join(&key.content_id)
            .join(format!("{}.txt", key.language)))
    }
}

#[async_trait]
impl PlaylistSource for FsPlaylistSource {
    async fn fetch(&self, key: &PlaylistKey) -> Result<String> {
        let path = self.path_for(key)?;
        debug!("Reading playlist text from {}", path.display());
        Ok(tokio::fs::read_to_string(&path).await?)
    }
}
