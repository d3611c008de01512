//! Filesystem catalog of bundled detection models.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::CatalogError;

/// How long a browsed folder listing stays cached.
const CACHE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// One entry in a folder listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub name: String,
    pub is_directory: bool,
    pub path: String,
}

struct CachedListing {
    contents: Vec<FolderEntry>,
    fetched_at: Instant,
}

/// Browsable view of the models directory with a per-folder TTL cache.
pub struct ModelCatalog {
    root: PathBuf,
    cache: Mutex<HashMap<String, CachedListing>>,
}

impl ModelCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Top-level model folders. A missing models directory reads as empty.
    pub fn list_folders(&self) -> Result<Vec<String>, CatalogError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                folders.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        folders.sort();
        Ok(folders)
    }

    /// Contents of a folder under the models root.
    ///
    /// Rejects paths that escape the root; results are cached per
    /// requested folder for [`CACHE_TIMEOUT`].
    pub fn browse(&self, folder: &str) -> Result<Vec<FolderEntry>, CatalogError> {
        if let Some(cached) = self.cached(folder) {
            tracing::debug!(folder, "returning cached folder contents");
            return Ok(cached);
        }

        let target = self.resolve(folder)?;
        if !target.is_dir() {
            return Err(CatalogError::NotFound(folder.to_string()));
        }

        let mut contents = Vec::new();
        for entry in std::fs::read_dir(&target)? {
            let entry = entry?;
            contents.push(FolderEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory: entry.file_type()?.is_dir(),
                path: entry.path().display().to_string(),
            });
        }
        contents.sort_by(|a, b| a.name.cmp(&b.name));

        let mut cache = self.cache.lock().expect("catalog lock poisoned");
        cache.insert(
            folder.to_string(),
            CachedListing {
                contents: contents.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(contents)
    }

    fn cached(&self, folder: &str) -> Option<Vec<FolderEntry>> {
        let cache = self.cache.lock().expect("catalog lock poisoned");
        cache
            .get(folder)
            .filter(|listing| listing.fetched_at.elapsed() < CACHE_TIMEOUT)
            .map(|listing| listing.contents.clone())
    }

    /// Join `folder` onto the root, refusing anything that would escape it.
    fn resolve(&self, folder: &str) -> Result<PathBuf, CatalogError> {
        let relative = Path::new(folder);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir));
        if escapes {
            return Err(CatalogError::InvalidPath(folder.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog_with_layout() -> (tempfile::TempDir, ModelCatalog) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("queen-v11/weights")).unwrap();
        std::fs::create_dir(dir.path().join("brood-v8")).unwrap();
        std::fs::write(dir.path().join("queen-v11/model.onnx"), b"stub").unwrap();
        let catalog = ModelCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn test_list_folders_returns_directories_only() {
        let (_dir, catalog) = catalog_with_layout();
        assert_eq!(catalog.list_folders().unwrap(), vec!["brood-v8", "queen-v11"]);
    }

    #[test]
    fn test_missing_root_reads_as_empty() {
        let catalog = ModelCatalog::new("/definitely/not/a/models/dir");
        assert!(catalog.list_folders().unwrap().is_empty());
    }

    #[test]
    fn test_browse_lists_contents() {
        let (_dir, catalog) = catalog_with_layout();
        let contents = catalog.browse("queen-v11").unwrap();

        let names: Vec<&str> = contents.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["model.onnx", "weights"]);
        assert!(!contents[0].is_directory);
        assert!(contents[1].is_directory);
    }

    #[test]
    fn test_browse_rejects_traversal() {
        let (_dir, catalog) = catalog_with_layout();

        assert!(matches!(
            catalog.browse("../outside"),
            Err(CatalogError::InvalidPath(_))
        ));
        assert!(matches!(
            catalog.browse("queen-v11/../../outside"),
            Err(CatalogError::InvalidPath(_))
        ));
        assert!(matches!(
            catalog.browse("/etc"),
            Err(CatalogError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_browse_missing_folder_is_not_found() {
        let (_dir, catalog) = catalog_with_layout();
        assert!(matches!(
            catalog.browse("queen-v99"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_browse_serves_cached_listing() {
        let (dir, catalog) = catalog_with_layout();
        assert_eq!(catalog.browse("brood-v8").unwrap().len(), 0);

        // New files are invisible until the cached listing expires.
        std::fs::write(dir.path().join("brood-v8/model.onnx"), b"stub").unwrap();
        assert_eq!(catalog.browse("brood-v8").unwrap().len(), 0);
    }
}
