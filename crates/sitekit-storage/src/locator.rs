use std::collections::BTreeSet;
use std::path::Path;

use sitekit_core::ModuleStorageLocator;
use tracing::{debug, warn};

use crate::path::PathBuilder;
use crate::{StorageError, StorageResult};

/// Module storage laid out as one directory per module under a root.
///
/// `locate("gallery")` yields `<root>/gallery`, built with the configured
/// [`PathBuilder`].
#[derive(Debug, Clone)]
pub struct StorageModuleLocator {
    paths: PathBuilder,
    root: String,
    modules: BTreeSet<String>,
}

impl StorageModuleLocator {
    /// Create an empty locator rooted at `root`.
    #[must_use]
    pub fn new(paths: PathBuilder, root: &str) -> Self {
        Self {
            root: paths.sanitize(root),
            paths,
            modules: BTreeSet::new(),
        }
    }

    /// Make a module available.
    ///
    /// Names that are empty or contain the separator are ignored.
    #[must_use]
    pub fn with_module(mut self, name: impl AsRef<str>) -> Self {
        self.insert(name.as_ref());
        self
    }

    /// Make several modules available.
    #[must_use]
    pub fn with_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.insert(name.as_ref());
        }
        self
    }

    /// Build a locator from a directory whose subdirectories are modules.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be listed.
    pub fn scan_directory(paths: PathBuilder, root: &str, dir: &Path) -> StorageResult<Self> {
        let io_err = |source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut locator = Self::new(paths, root);
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_dir() {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => locator.insert(name),
                None => warn!(path = %entry.path().display(), "Skipping non UTF-8 module directory"),
            }
        }

        debug!(
            dir = %dir.display(),
            modules = locator.modules.len(),
            "Scanned module storage"
        );
        Ok(locator)
    }

    /// Storage root, sanitized.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Available module names, sorted.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }

    fn insert(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || name.contains(self.paths.separator()) {
            warn!(module = name, "Ignoring invalid module name");
            return;
        }
        self.modules.insert(name.to_owned());
    }
}

impl ModuleStorageLocator for StorageModuleLocator {
    fn locate(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if !self.modules.contains(name) {
            return None;
        }
        Some(
            self.paths
                .build([self.root.as_str(), name], self.paths.is_absolute(&self.root)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate() {
        let locator = StorageModuleLocator::new(PathBuilder::default(), " /modules// ")
            .with_modules(["gallery", "shop"]);

        assert_eq!(locator.root(), "/modules");
        assert_eq!(locator.locate("gallery").as_deref(), Some("/modules/gallery"));
        assert!(locator.contains(" shop "));
        assert_eq!(locator.locate("blog"), None);
    }

    #[test]
    fn test_invalid_names_are_ignored() {
        let locator = StorageModuleLocator::new(PathBuilder::default(), "/modules")
            .with_module("")
            .with_module("nested/module");
        assert_eq!(locator.modules().count(), 0);
    }

    #[test]
    fn test_relative_root() {
        let locator =
            StorageModuleLocator::new(PathBuilder::default(), "modules").with_module("blog");
        assert_eq!(locator.locate("blog").as_deref(), Some("modules/blog"));
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("gallery")).unwrap();
        std::fs::create_dir(dir.path().join("shop")).unwrap();
        std::fs::write(dir.path().join("README"), "not a module").unwrap();

        let locator =
            StorageModuleLocator::scan_directory(PathBuilder::default(), "/modules", dir.path())
                .unwrap();

        assert_eq!(locator.modules().collect::<Vec<_>>(), vec!["gallery", "shop"]);
        assert!(!locator.contains("README"));
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let err = StorageModuleLocator::scan_directory(PathBuilder::default(), "/m", &missing)
            .unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
