//! The `Path` facade.
//!
//! One type for every backend. Each call forwards to the backend picked at
//! construction. Whenever a backend hands back a path, the facade rebuilds
//! it through the registry ([`Path::to_facade`]), so results can land on a
//! different backend than the receiver and still come back as `Path`.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::copy;
use crate::error::PathResult;
use crate::lexical;
use crate::ops::{PathBackend, PathFile};
use crate::registry::Registry;
use crate::types::{BackendKind, CopyOptions, MkdirOptions, NativePath, OpenMode, PathOptions};

/// A path on any registered backend.
#[derive(Clone)]
pub struct Path {
    repr: String,
    backend: Arc<dyn PathBackend>,
    registry: Arc<Registry>,
    options: PathOptions,
}

impl Path {
    pub(crate) fn from_parts(
        repr: String,
        backend: Arc<dyn PathBackend>,
        registry: Arc<Registry>,
        options: PathOptions,
    ) -> Self {
        Self {
            repr,
            backend,
            registry,
            options,
        }
    }

    /// Construct through `registry` with default options.
    pub async fn new(registry: &Arc<Registry>, path: impl AsRef<str>) -> PathResult<Self> {
        registry.construct(path.as_ref(), PathOptions::new()).await
    }

    /// The backend behind this path.
    pub fn backend(&self) -> &dyn PathBackend {
        self.backend.as_ref()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> &PathOptions {
        &self.options
    }

    /// Rebuild a backend-produced path as a facade.
    ///
    /// Runs the full resolve+construct. The credential profile carries
    /// over; the dataset does not, since native strings already name it.
    pub async fn to_facade(&self, native: NativePath) -> PathResult<Path> {
        let options = PathOptions {
            dataset: None,
            profile: self.options.profile.clone(),
        };
        self.registry.construct(native.as_str(), options).await
    }

    async fn to_facades(&self, natives: Vec<NativePath>) -> PathResult<Vec<Path>> {
        let mut paths = Vec::with_capacity(natives.len());
        for native in natives {
            paths.push(self.to_facade(native).await?);
        }
        Ok(paths)
    }

    // ========================================================================
    // Lexical
    // ========================================================================

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// The string this path was constructed from.
    pub fn as_str(&self) -> &str {
        &self.repr
    }

    pub fn extension(&self) -> String {
        self.backend.extension()
    }

    pub fn stem(&self) -> String {
        self.backend.stem()
    }

    pub fn parts(&self) -> Vec<String> {
        self.backend.parts()
    }

    /// Everything after the last `/`.
    pub fn basename(&self) -> &str {
        lexical::basename(&self.repr)
    }

    /// Everything before the last `/`, as a path.
    pub async fn dirname(&self) -> PathResult<Path> {
        self.to_facade(NativePath::new(lexical::dirname(&self.repr))).await
    }

    pub async fn join(&self, segments: &[&str]) -> PathResult<Path> {
        self.to_facade(self.backend.join(segments)).await
    }

    pub async fn with_suffix(&self, suffix: &str) -> PathResult<Path> {
        self.to_facade(self.backend.with_suffix(suffix)).await
    }

    pub async fn expanduser(&self) -> PathResult<Path> {
        self.to_facade(self.backend.expanduser()).await
    }

    pub async fn abspath(&self) -> PathResult<Path> {
        let native = self.backend.abspath().await?;
        self.to_facade(native).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn exists(&self) -> PathResult<bool> {
        self.backend.exists().await
    }

    pub async fn is_dir(&self) -> PathResult<bool> {
        self.backend.is_dir().await
    }

    pub async fn is_file(&self) -> PathResult<bool> {
        self.backend.is_file().await
    }

    /// Immediate children.
    pub async fn ls(&self) -> PathResult<Vec<Path>> {
        let natives = self.backend.ls().await?;
        self.to_facades(natives).await
    }

    /// Every file below this path. Not `os.walk`: a flat list of paths.
    pub async fn walk(&self) -> PathResult<Vec<Path>> {
        let natives = self.backend.walk().await?;
        self.to_facades(natives).await
    }

    pub async fn glob(&self, pattern: &str) -> PathResult<Vec<Path>> {
        let natives = self.backend.glob(pattern).await?;
        self.to_facades(natives).await
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    pub async fn touch(&self, exist_ok: bool) -> PathResult<()> {
        self.backend.touch(exist_ok).await
    }

    pub async fn mkdir(&self, options: MkdirOptions) -> PathResult<()> {
        self.backend.mkdir(options).await
    }

    /// Remove a directory; `recursive` removes its contents too.
    pub async fn rmdir(&self, recursive: bool) -> PathResult<()> {
        self.backend.rmdir(recursive).await
    }

    /// Remove a file. Directories go through [`Path::rmdir`].
    pub async fn remove(&self) -> PathResult<()> {
        self.backend.remove().await
    }

    // ========================================================================
    // Content
    // ========================================================================

    pub async fn open(&self, mode: OpenMode) -> PathResult<Box<dyn PathFile>> {
        self.backend.open(mode).await
    }

    pub async fn read_bytes(&self) -> PathResult<Vec<u8>> {
        self.backend.read_bytes().await
    }

    pub async fn read_text(&self) -> PathResult<String> {
        self.backend.read_text().await
    }

    /// Replace the content; returns bytes written.
    pub async fn write_bytes(&self, data: &[u8]) -> PathResult<usize> {
        self.backend.write_bytes(data, OpenMode::Write).await
    }

    /// Replace the content; returns characters written.
    pub async fn write_text(&self, text: &str) -> PathResult<usize> {
        self.backend.write_text(text, OpenMode::Write).await
    }

    pub async fn append_bytes(&self, data: &[u8]) -> PathResult<usize> {
        self.backend.write_bytes(data, OpenMode::Append).await
    }

    pub async fn append_text(&self, text: &str) -> PathResult<usize> {
        self.backend.write_text(text, OpenMode::Append).await
    }

    /// Copy this path to `dest`; see [`crate::copy::copy`].
    pub async fn copy_to(&self, dest: &Path, options: &CopyOptions) -> PathResult<()> {
        copy::copy(self, dest, options).await
    }
}

impl std::fmt::Debug for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Path")
            .field("path", &self.repr)
            .field("kind", &self.kind())
            .finish()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repr)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.repr.hash(state);
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.repr
    }
}
