//! Backend operations trait.
//!
//! Every storage backend implements [`PathBackend`] for one path value.
//! Operations that produce new paths return [`NativePath`] strings; the
//! facade re-resolves them, so backend types never reach callers.

use async_trait::async_trait;

use crate::backends::{LocalPath, ObjectPath, PlatformPath};
use crate::error::PathResult;
use crate::types::{BackendKind, MkdirOptions, NativePath, OpenMode};

/// Typed view of a backend, for the few places (copy) that need
/// backend-specific access.
#[derive(Debug, Clone, Copy)]
pub enum BackendRef<'a> {
    Local(&'a LocalPath),
    ObjectStore(&'a ObjectPath),
    DataPlatform(&'a PlatformPath),
}

impl BackendRef<'_> {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendRef::Local(_) => BackendKind::Local,
            BackendRef::ObjectStore(_) => BackendKind::ObjectStore,
            BackendRef::DataPlatform(_) => BackendKind::DataPlatform,
        }
    }
}

/// The capability set every backend provides.
///
/// Mutating operations change the referent, never the path string.
#[async_trait]
pub trait PathBackend: Send + Sync + std::fmt::Debug {
    // ========================================================================
    // Identity
    // ========================================================================

    fn kind(&self) -> BackendKind;

    /// Typed view of the concrete backend.
    fn backend_ref(&self) -> BackendRef<'_>;

    /// The backend's own string form of this path.
    fn as_str(&self) -> &str;

    /// String that re-resolves to this same path.
    fn native(&self) -> NativePath {
        NativePath::new(self.as_str())
    }

    // ========================================================================
    // Lexical
    // ========================================================================

    /// `".ext"` of the final component, or `""`.
    fn extension(&self) -> String;

    /// Final component without its extension.
    fn stem(&self) -> String;

    /// Ordered, non-empty tokens of the path.
    fn parts(&self) -> Vec<String>;

    fn join(&self, segments: &[&str]) -> NativePath;

    fn with_suffix(&self, suffix: &str) -> NativePath {
        NativePath::new(format!("{}{}", self.as_str(), suffix))
    }

    fn expanduser(&self) -> NativePath {
        self.native()
    }

    async fn abspath(&self) -> PathResult<NativePath> {
        Ok(self.native())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    async fn exists(&self) -> PathResult<bool>;

    async fn is_dir(&self) -> PathResult<bool>;

    async fn is_file(&self) -> PathResult<bool>;

    /// Immediate children only.
    async fn ls(&self) -> PathResult<Vec<NativePath>>;

    /// Every leaf (file) below this path, at any depth.
    async fn walk(&self) -> PathResult<Vec<NativePath>>;

    /// Shell-style match below this path; duplicates collapsed.
    async fn glob(&self, pattern: &str) -> PathResult<Vec<NativePath>>;

    // ========================================================================
    // Mutation
    // ========================================================================

    async fn touch(&self, exist_ok: bool) -> PathResult<()>;

    async fn mkdir(&self, options: MkdirOptions) -> PathResult<()>;

    async fn rmdir(&self, recursive: bool) -> PathResult<()>;

    async fn remove(&self) -> PathResult<()>;

    // ========================================================================
    // Content
    // ========================================================================

    async fn open(&self, mode: OpenMode) -> PathResult<Box<dyn PathFile>>;

    async fn read_bytes(&self) -> PathResult<Vec<u8>>;

    /// Write `data`, returning the number of bytes written.
    async fn write_bytes(&self, data: &[u8], mode: OpenMode) -> PathResult<usize>;

    async fn read_text(&self) -> PathResult<String> {
        let bytes = self.read_bytes().await?;
        String::from_utf8(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }

    /// Write `text`, returning the number of characters written.
    async fn write_text(&self, text: &str, mode: OpenMode) -> PathResult<usize> {
        let written = self.write_bytes(text.as_bytes(), mode).await?;
        if written == 0 {
            return Ok(0);
        }
        Ok(text.chars().count())
    }
}

/// An open file stream.
///
/// Writes may be buffered until [`PathFile::close`]; dropping a write
/// stream without closing it may lose data on remote backends.
#[async_trait]
pub trait PathFile: Send + std::fmt::Debug {
    fn mode(&self) -> OpenMode;

    async fn read_to_end(&mut self) -> PathResult<Vec<u8>>;

    async fn write(&mut self, data: &[u8]) -> PathResult<usize>;

    /// Flush and release the stream.
    async fn close(&mut self) -> PathResult<()>;
}
