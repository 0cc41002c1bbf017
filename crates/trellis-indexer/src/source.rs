//! Access to workspace source files

use crate::error::{ExtractError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Patterns excluded from every filesystem walk unless overridden.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/node_modules/**", "**/target/**", "**/dist/**", "**/out/**"];

/// One source file: workspace-relative path (`/`-separated) and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        SourceFile {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Lower-cased extension of the path, if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.path)
    }
}

pub(crate) fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Random access to the listing and content of a workspace's source files.
pub trait SourceProvider: Send + Sync {
    /// Workspace-relative paths of every candidate source file.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Full text of one file.
    fn read(&self, path: &str) -> Result<String>;
}

/// Walks a directory tree, honouring `.gitignore` and exclude globs.
#[derive(Debug, Clone)]
pub struct FsSourceProvider {
    root: PathBuf,
    exclude: GlobSet,
}

impl FsSourceProvider {
    /// Provider with the default exclude patterns.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_excludes(root, DEFAULT_EXCLUDES.iter().copied())
    }

    pub fn with_excludes<'a>(root: impl AsRef<Path>, patterns: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| ExtractError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|source| ExtractError::Pattern {
            pattern: "<set>".to_string(),
            source,
        })?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = rel.components().filter_map(|c| c.as_os_str().to_str()).collect();
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }
}

impl SourceProvider for FsSourceProvider {
    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // The root itself is unreadable or missing.
                Err(e) if e.depth().unwrap_or(0) == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Some(rel) = self.relative(entry.path()) else {
                continue;
            };
            if self.exclude.is_match(&rel) {
                debug!("Excluded: {}", rel);
                continue;
            }
            files.push(rel);
        }

        files.sort();
        Ok(files)
    }

    fn read(&self, path: &str) -> Result<String> {
        let bytes = std::fs::read(self.root.join(path)).map_err(|source| ExtractError::Io {
            path: path.to_string(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|_| ExtractError::Utf8 { path: path.to_string() })
    }
}

/// In-memory workspace. Clones share the same file map, so edits made through
/// one handle are seen by every other.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceProvider {
    files: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemorySourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<P, T>(files: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: Into<String>,
        T: Into<String>,
    {
        let provider = Self::new();
        for (path, text) in files {
            provider.insert(path, text);
        }
        provider
    }

    /// Add or overwrite a file.
    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(path.into(), text.into());
    }

    pub fn remove(&self, path: &str) -> Option<String> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(path)
    }
}

impl SourceProvider for MemorySourceProvider {
    fn list_files(&self) -> Result<Vec<String>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        Ok(files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(path).cloned().ok_or_else(|| ExtractError::Io {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("src/app.TS"), Some("ts".to_string()));
        assert_eq!(extension_of("lib/mod.rs"), Some("rs".to_string()));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of(".env"), None);
    }

    #[test]
    fn test_fs_provider_lists_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/utils")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/main.ts"), "export function main() {}").unwrap();
        fs::write(root.join("src/utils/helper.ts"), "export const x = 1;").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "module.exports = {}").unwrap();

        let provider = FsSourceProvider::new(root).unwrap();
        let files = provider.list_files().unwrap();
        assert_eq!(files, ["src/main.ts", "src/utils/helper.ts"]);
        assert_eq!(provider.read("src/main.ts").unwrap(), "export function main() {}");
    }

    #[test]
    fn test_fs_provider_reports_bad_utf8() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bad.py"), [0xff, 0xfe, 0x00]).unwrap();

        let provider = FsSourceProvider::new(temp_dir.path()).unwrap();
        let err = provider.read("bad.py").unwrap_err();
        assert!(matches!(err, ExtractError::Utf8 { .. }));
    }

    #[test]
    fn test_fs_provider_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let provider = FsSourceProvider::new(temp_dir.path().join("nope")).unwrap();
        assert!(matches!(provider.list_files(), Err(ExtractError::Walk(_))));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let err = FsSourceProvider::with_excludes(temp_dir.path(), ["a[b"]).unwrap_err();
        assert!(matches!(err, ExtractError::Pattern { .. }));
    }

    #[test]
    fn test_memory_provider_shares_state() {
        let provider = MemorySourceProvider::with_files([("a.ts", "const a = 1;")]);
        let handle = provider.clone();
        handle.insert("b.ts", "const b = 2;");
        assert_eq!(provider.list_files().unwrap(), ["a.ts", "b.ts"]);
        assert!(provider.read("missing.ts").is_err());
    }
}
