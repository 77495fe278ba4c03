//! Repository root and path containment
//!
//! Every path a model hands to a tool is resolved here. A path is accepted
//! only if, after lexical normalization and symlink resolution of the part
//! that already exists, it still lies inside the root.

use super::ToolError;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

const MAX_LINK_HOPS: usize = 40;

/// Canonical directory all tool operations are confined to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRoot {
    path: PathBuf,
}

impl RepoRoot {
    /// Canonicalize `path` and make sure it is a directory
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().canonicalize()?;
        if !path.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Repository path is not a directory: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    /// The canonical root path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a model supplied path against the root
    ///
    /// Empty input means the root itself. The target does not need to exist.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, ToolError> {
        let requested = requested.trim();
        let candidate = Path::new(if requested.is_empty() { "." } else { requested });

        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.path.join(candidate)
        };

        let normalized = normalize(&joined);
        if !normalized.starts_with(&self.path) {
            return Err(self.escape(requested, &normalized));
        }

        // Symlinks inside the tree may still point elsewhere
        let target = follow_links(&normalized)?;
        if !target.starts_with(&self.path) {
            return Err(self.escape(requested, &target));
        }

        Ok(normalized)
    }

    /// Path relative to the root, for display
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.path).unwrap_or(path)
    }

    fn escape(&self, requested: &str, resolved: &Path) -> ToolError {
        warn!(
            requested_path = requested,
            resolved = %resolved.display(),
            repo_root = %self.path.display(),
            "Path outside repository rejected"
        );
        ToolError::PathEscape(requested.to_string())
    }
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Deepest ancestor of `path` that has a directory entry, dangling links included
fn deepest_existing(path: &Path) -> &Path {
    let mut current = path;
    while std::fs::symlink_metadata(current).is_err() {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

/// Where `path` ends up once every symlink on it is followed
///
/// Dangling links are followed through their stored target, so a write
/// through one cannot create a file outside the tree. Link chains longer
/// than [`MAX_LINK_HOPS`] are reported as a loop.
fn follow_links(path: &Path) -> std::io::Result<PathBuf> {
    let mut current = path.to_path_buf();

    for _ in 0..MAX_LINK_HOPS {
        let existing = deepest_existing(&current).to_path_buf();
        let rest = current
            .strip_prefix(&existing)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let is_link = std::fs::symlink_metadata(&existing)?.file_type().is_symlink();
        if !is_link || std::fs::metadata(&existing).is_ok() {
            return Ok(existing.canonicalize()?.join(rest));
        }

        let link_target = std::fs::read_link(&existing)?;
        let base = match existing.parent() {
            Some(parent) => parent.canonicalize()?,
            None => PathBuf::from("/"),
        };
        current = normalize(&base.join(link_target).join(rest));
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("Too many levels of symbolic links: {}", path.display()),
    ))
}
