//! Filesystem access to the dashboard project.
//!
//! Every path the model supplies is resolved under `<root>/src` and must
//! stay there: absolute paths and `..` components are refused, and writes
//! never pass through a symlink inside the tree.

use std::path::{Component, Path, PathBuf};

use pagepilot_core::registry::Registry;

use crate::error::ProxyError;

/// Registry document, relative to `src/`.
pub const REGISTRY_FILE: &str = "registry.json";

/// Page components, relative to `src/`.
pub const PAGES_DIR: &str = "pages";

const PAGE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js"];

#[derive(Debug, Clone)]
pub struct DashboardDir {
    root: PathBuf,
}

impl DashboardDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root, where build and deploy commands run.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Resolve a model-supplied path under `src/`.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ProxyError> {
        let trimmed = relative.trim().trim_start_matches("src/");
        let candidate = Path::new(trimmed);
        if trimmed.is_empty() || candidate.is_absolute() {
            return Err(ProxyError::PathEscape(relative.to_string()));
        }
        let mut resolved = self.src_dir();
        for component in candidate.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ProxyError::PathEscape(relative.to_string()));
                }
            }
        }
        Ok(resolved)
    }

    /// Refuse `path` when any existing entry between `src/` and it is a
    /// symlink. Checked before directories are created, so nothing is made
    /// outside the tree.
    async fn reject_symlinks(&self, relative: &str, path: &Path) -> Result<(), ProxyError> {
        let src = self.src_dir();
        let Ok(rest) = path.strip_prefix(&src) else {
            return Err(ProxyError::PathEscape(relative.to_string()));
        };
        let mut current = src;
        for part in rest.components() {
            current.push(part);
            match tokio::fs::symlink_metadata(&current).await {
                Ok(meta) if meta.file_type().is_symlink() => {
                    tracing::warn!(path = %current.display(), "Refusing write through symlink");
                    return Err(ProxyError::PathEscape(relative.to_string()));
                }
                Ok(_) => {}
                // Nothing deeper exists yet.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Write `content` to `relative`, creating parent directories.
    pub async fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf, ProxyError> {
        let path = self.resolve(relative)?;
        self.reject_symlinks(relative, &path).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Dashboard file written");
        Ok(path)
    }

    /// The registry document, or an empty registry when none exists yet.
    pub async fn load_registry(&self) -> Result<Registry, ProxyError> {
        let path = self.src_dir().join(REGISTRY_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Registry::from_json(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Registry::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the registry document atomically.
    pub async fn save_registry(&self, registry: &Registry) -> Result<(), ProxyError> {
        let src = self.src_dir();
        tokio::fs::create_dir_all(&src).await?;
        let path = src.join(REGISTRY_FILE);
        let tmp = src.join(format!(".{REGISTRY_FILE}.{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, registry.to_json_pretty()).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Page files under `src/pages`, as `src/`-relative paths, sorted.
    pub async fn list_pages(&self) -> Result<Vec<String>, ProxyError> {
        let src = self.src_dir();
        let mut pending = vec![src.join(PAGES_DIR)];
        let mut pages = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let is_page = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| PAGE_EXTENSIONS.contains(&e));
                if !is_page {
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&src) {
                    pages.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }

        pages.sort();
        Ok(pages)
    }
}
