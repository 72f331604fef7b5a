//! Maps request targets onto files under the document root.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;

use crate::http::mime::content_type_for;

/// Outcome of resolving a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A regular file inside the root, ready to stream.
    File {
        path: PathBuf,
        len: u64,
        content_type: String,
    },
    /// The target escapes the root or names something that is not servable.
    Forbidden,
    NotFound,
}

/// Resolves request targets against a canonicalized document root.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    index_file: String,
}

impl Resolver {
    /// Canonicalizes `root` once, so later containment checks compare
    /// canonical paths with canonical paths.
    pub fn new(root: impl AsRef<Path>, index_file: impl Into<String>) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root)
            .with_context(|| format!("document root {} is not accessible", root.display()))?;

        if !canonical.is_dir() {
            anyhow::bail!("document root {} is not a directory", root.display());
        }

        Ok(Self {
            root: canonical,
            index_file: index_file.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `url` (the raw request target) to a file under the root.
    ///
    /// Only metadata is queried; nothing is opened.
    pub async fn resolve(&self, url: &str) -> Resolution {
        let path = url.split(['?', '#']).next().unwrap_or_default();

        let Ok(decoded) = urlencoding::decode(path) else {
            return Resolution::NotFound;
        };

        let candidate = self.root.join(decoded.trim_start_matches('/'));
        let canonical = match self.contained(&candidate).await {
            Ok(path) => path,
            Err(resolution) => return resolution,
        };

        let metadata = match fs::metadata(&canonical).await {
            Ok(metadata) => metadata,
            Err(e) => return from_io_error(&e),
        };

        let (path, metadata) = if metadata.is_dir() {
            let index = match self.contained(&canonical.join(&self.index_file)).await {
                Ok(path) => path,
                Err(resolution) => return resolution,
            };
            match fs::metadata(&index).await {
                Ok(metadata) => (index, metadata),
                Err(e) => return from_io_error(&e),
            }
        } else {
            (canonical, metadata)
        };

        if !metadata.is_file() {
            return Resolution::Forbidden;
        }

        let content_type = content_type_for(&path);
        Resolution::File {
            path,
            len: metadata.len(),
            content_type,
        }
    }

    /// Canonicalizes `candidate` and checks it is still below the root.
    async fn contained(&self, candidate: &Path) -> Result<PathBuf, Resolution> {
        let canonical = fs::canonicalize(candidate)
            .await
            .map_err(|e| from_io_error(&e))?;

        if !canonical.starts_with(&self.root) {
            tracing::debug!(
                path = %candidate.display(),
                resolved = %canonical.display(),
                "Path escapes document root"
            );
            return Err(Resolution::Forbidden);
        }

        Ok(canonical)
    }
}

fn from_io_error(e: &io::Error) -> Resolution {
    match e.kind() {
        io::ErrorKind::PermissionDenied => Resolution::Forbidden,
        _ => Resolution::NotFound,
    }
}
