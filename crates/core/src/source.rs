//! Import resolver abstraction for filesystem-independent compilation.
//!
//! The [`ImportResolver`] trait is the compilation's only external
//! collaborator: it maps an import path written in a `.bond` file to a
//! canonical path and source text. The default [`FsResolver`] delegates
//! to `std::fs`; [`InMemoryResolver`] backs tests and embedders that
//! compile without touching the filesystem.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// External collaborator that loads imported source files.
///
/// Any failure is passed through to the caller as an `ImportFailure`
/// diagnostic; the core never retries or falls back.
pub trait ImportResolver {
    /// Read the full source text for a path. The file is buffered and
    /// released before semantic analysis proceeds.
    fn read_source(&self, path: &Path) -> io::Result<String>;

    /// Resolve an import string relative to the importing file's
    /// directory.
    fn resolve_import(&self, base_dir: &Path, import: &str) -> io::Result<PathBuf>;

    /// Canonical path used as the identity key for idempotent loading
    /// and cycle termination.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Default filesystem-backed resolver.
pub struct FsResolver;

impl ImportResolver for FsResolver {
    fn read_source(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn resolve_import(&self, base_dir: &Path, import: &str) -> io::Result<PathBuf> {
        Ok(base_dir.join(import))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }
}

/// Resolver over an in-memory map of paths to source text.
///
/// Canonicalization is lexical: `.` and `..` segments are folded without
/// consulting a filesystem, so virtual paths behave the same on every
/// platform.
#[derive(Default)]
pub struct InMemoryResolver {
    files: HashMap<PathBuf, String>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one virtual file, replacing any previous content at the path.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files
            .insert(normalize_path(&path.into()), content.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .insert(normalize_path(&path.into()), content.into());
    }
}

/// Fold `.` and `..` components lexically.
fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

impl ImportResolver for InMemoryResolver {
    fn read_source(&self, path: &Path) -> io::Result<String> {
        let normalized = normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory file at {}", normalized.display()),
            )
        })
    }

    fn resolve_import(&self, base_dir: &Path, import: &str) -> io::Result<PathBuf> {
        Ok(normalize_path(&base_dir.join(import)))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let normalized = normalize_path(path);
        if self.files.contains_key(&normalized)
            || self.files.keys().any(|k| k.starts_with(&normalized))
        {
            Ok(normalized)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory path at {}", normalized.display()),
            ))
        }
    }
}
