//! Local filesystem backend.
//!
//! A thin adapter over `tokio::fs`. File-vs-directory comes from real
//! metadata here, not from the lexical heuristic the remote backends use.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::warn;

use crate::error::{PathError, PathResult};
use crate::glob::GlobPattern;
use crate::lexical;
use crate::ops::{BackendRef, PathBackend, PathFile};
use crate::registry::BackendFactory;
use crate::types::{BackendKind, MkdirOptions, NativePath, OpenMode, PathOptions};

/// A path on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalPath {
    repr: String,
}

impl LocalPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self { repr: path.into() }
    }

    /// The path as a `std::path::Path`.
    pub fn path(&self) -> &Path {
        Path::new(&self.repr)
    }

    fn err(&self, e: std::io::Error) -> PathError {
        PathError::from_io(e, &self.repr)
    }

    /// Metadata, or `None` when nothing is there.
    async fn metadata(&self) -> PathResult<Option<std::fs::Metadata>> {
        match fs::metadata(self.path()).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.err(e)),
        }
    }

    /// `None` for names that are not valid UTF-8.
    fn render(path: &Path) -> Option<NativePath> {
        match path.to_str() {
            Some(text) => Some(NativePath::new(text)),
            None => {
                warn!(path = %path.display(), "skipping non-UTF-8 path");
                None
            }
        }
    }
}

#[async_trait]
impl PathBackend for LocalPath {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn backend_ref(&self) -> BackendRef<'_> {
        BackendRef::Local(self)
    }

    fn as_str(&self) -> &str {
        &self.repr
    }

    fn extension(&self) -> String {
        lexical::extension(&self.repr).to_string()
    }

    fn stem(&self) -> String {
        lexical::stem(&self.repr)
    }

    fn parts(&self) -> Vec<String> {
        self.path()
            .components()
            .map(|c| match c {
                Component::RootDir => "/".to_string(),
                other => other.as_os_str().to_string_lossy().into_owned(),
            })
            .collect()
    }

    fn join(&self, segments: &[&str]) -> NativePath {
        NativePath::new(lexical::join_native(&self.repr, segments))
    }

    fn expanduser(&self) -> NativePath {
        NativePath::new(shellexpand::tilde(&self.repr).into_owned())
    }

    async fn abspath(&self) -> PathResult<NativePath> {
        let absolute = std::path::absolute(self.path()).map_err(|e| self.err(e))?;
        absolute
            .to_str()
            .map(NativePath::new)
            .ok_or_else(|| PathError::invalid_path(absolute.display().to_string()))
    }

    async fn exists(&self) -> PathResult<bool> {
        fs::try_exists(self.path()).await.map_err(|e| self.err(e))
    }

    async fn is_dir(&self) -> PathResult<bool> {
        Ok(self.metadata().await?.is_some_and(|m| m.is_dir()))
    }

    async fn is_file(&self) -> PathResult<bool> {
        Ok(self.metadata().await?.is_some_and(|m| m.is_file()))
    }

    async fn ls(&self) -> PathResult<Vec<NativePath>> {
        let mut dir = fs::read_dir(self.path()).await.map_err(|e| self.err(e))?;
        let mut children = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| self.err(e))? {
            children.push(self.path().join(entry.file_name()));
        }
        children.sort();
        Ok(children.iter().filter_map(|p| Self::render(p)).collect())
    }

    async fn walk(&self) -> PathResult<Vec<NativePath>> {
        if !self.is_dir().await? {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut stack: Vec<PathBuf> = vec![self.path().to_path_buf()];
        while let Some(current) = stack.pop() {
            let mut dir = fs::read_dir(&current).await.map_err(|e| self.err(e))?;
            let mut entries = Vec::new();
            while let Some(entry) = dir.next_entry().await.map_err(|e| self.err(e))? {
                let file_type = entry.file_type().await.map_err(|e| self.err(e))?;
                entries.push((entry.path(), file_type.is_dir()));
            }
            entries.sort();

            // Reverse so the stack pops subdirectories in name order
            for (path, is_dir) in entries.into_iter().rev() {
                if is_dir {
                    stack.push(path);
                } else {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files.iter().filter_map(|p| Self::render(p)).collect())
    }

    async fn glob(&self, pattern: &str) -> PathResult<Vec<NativePath>> {
        let glob = GlobPattern::new(&lexical::join_native(&self.repr, &[pattern]))?;
        let candidates = self.walk().await?;
        Ok(glob
            .filter(candidates.iter().map(NativePath::as_str))
            .into_iter()
            .map(NativePath::from)
            .collect())
    }

    async fn touch(&self, exist_ok: bool) -> PathResult<()> {
        let result = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path())
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && exist_ok => Ok(()),
            Err(e) => Err(self.err(e)),
        }
    }

    async fn mkdir(&self, options: MkdirOptions) -> PathResult<()> {
        if let Some(meta) = self.metadata().await? {
            if options.exist_ok && meta.is_dir() {
                return Ok(());
            }
            return Err(PathError::already_exists(&self.repr));
        }

        let result = if options.parents {
            fs::create_dir_all(self.path()).await
        } else {
            fs::create_dir(self.path()).await
        };
        result.map_err(|e| self.err(e))
    }

    async fn rmdir(&self, recursive: bool) -> PathResult<()> {
        let result = if recursive {
            fs::remove_dir_all(self.path()).await
        } else {
            fs::remove_dir(self.path()).await
        };
        result.map_err(|e| self.err(e))
    }

    async fn remove(&self) -> PathResult<()> {
        fs::remove_file(self.path()).await.map_err(|e| self.err(e))
    }

    async fn open(&self, mode: OpenMode) -> PathResult<Box<dyn PathFile>> {
        let mut options = fs::OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
        };
        let file = options.open(self.path()).await.map_err(|e| self.err(e))?;
        Ok(Box::new(LocalFile {
            file: Some(file),
            mode,
            repr: self.repr.clone(),
        }))
    }

    async fn read_bytes(&self) -> PathResult<Vec<u8>> {
        fs::read(self.path()).await.map_err(|e| self.err(e))
    }

    async fn write_bytes(&self, data: &[u8], mode: OpenMode) -> PathResult<usize> {
        if !mode.is_write() {
            return Err(PathError::unsupported(format!("write in read mode: {}", self.repr)));
        }
        let mut file = self.open(mode).await?;
        let written = file.write(data).await?;
        file.close().await?;
        Ok(written)
    }
}

/// Open local file.
#[derive(Debug)]
struct LocalFile {
    file: Option<fs::File>,
    mode: OpenMode,
    repr: String,
}

impl LocalFile {
    fn handle(&mut self) -> PathResult<&mut fs::File> {
        self.file
            .as_mut()
            .ok_or_else(|| PathError::unsupported(format!("{} is closed", self.repr)))
    }
}

#[async_trait]
impl PathFile for LocalFile {
    fn mode(&self) -> OpenMode {
        self.mode
    }

    async fn read_to_end(&mut self) -> PathResult<Vec<u8>> {
        if self.mode != OpenMode::Read {
            return Err(PathError::unsupported(format!("{} not open for reading", self.repr)));
        }
        let mut buf = Vec::new();
        self.handle()?.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    async fn write(&mut self, data: &[u8]) -> PathResult<usize> {
        if !self.mode.is_write() {
            return Err(PathError::unsupported(format!("{} not open for writing", self.repr)));
        }
        self.handle()?.write_all(data).await?;
        Ok(data.len())
    }

    async fn close(&mut self) -> PathResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }
}

/// Builds [`LocalPath`]s; the registry's fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFactory;

#[async_trait]
impl BackendFactory for LocalFactory {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn construct(
        &self,
        path: &str,
        _options: &PathOptions,
    ) -> PathResult<Box<dyn PathBackend>> {
        Ok(Box::new(LocalPath::new(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local(dir: &TempDir, rel: &str) -> LocalPath {
        LocalPath::new(dir.path().join(rel).to_string_lossy().into_owned())
    }

    #[tokio::test]
    async fn test_write_read_remove() {
        let dir = TempDir::new().unwrap();
        let path = local(&dir, "hello.txt");

        assert_eq!(path.write_text("hello", OpenMode::Write).await.unwrap(), 5);
        assert_eq!(path.read_text().await.unwrap(), "hello");
        assert!(path.is_file().await.unwrap());
        assert!(!path.is_dir().await.unwrap());

        path.remove().await.unwrap();
        assert!(!path.exists().await.unwrap());
        assert!(matches!(path.remove().await, Err(PathError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_append() {
        let dir = TempDir::new().unwrap();
        let path = local(&dir, "log.txt");
        path.write_bytes(b"one", OpenMode::Write).await.unwrap();
        path.write_bytes(b"two", OpenMode::Append).await.unwrap();
        assert_eq!(path.read_bytes().await.unwrap(), b"onetwo");
    }

    #[tokio::test]
    async fn test_mkdir_flags() {
        let dir = TempDir::new().unwrap();
        let path = local(&dir, "a/b");

        assert!(matches!(
            path.mkdir(MkdirOptions::new()).await,
            Err(PathError::NotFound(_))
        ));
        path.mkdir(MkdirOptions::new().parents(true)).await.unwrap();
        assert!(path.is_dir().await.unwrap());

        assert!(matches!(
            path.mkdir(MkdirOptions::new()).await,
            Err(PathError::AlreadyExists(_))
        ));
        path.mkdir(MkdirOptions::new().exist_ok(true)).await.unwrap();
    }

    #[tokio::test]
    async fn test_rmdir_not_empty() {
        let dir = TempDir::new().unwrap();
        let path = local(&dir, "d");
        path.mkdir(MkdirOptions::new()).await.unwrap();
        local(&dir, "d/f.txt").touch(false).await.unwrap();

        assert!(matches!(path.rmdir(false).await, Err(PathError::NotEmpty(_))));
        path.rmdir(true).await.unwrap();
        assert!(!path.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_exist_ok() {
        let dir = TempDir::new().unwrap();
        let path = local(&dir, "t.txt");
        path.touch(false).await.unwrap();
        path.touch(true).await.unwrap();
        assert!(matches!(path.touch(false).await, Err(PathError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_ls_is_one_level_walk_is_recursive() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/deep")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), "").unwrap();
        std::fs::write(dir.path().join("sub/deep/c.txt"), "").unwrap();

        let root = LocalPath::new(dir.path().to_string_lossy().into_owned());
        let ls: Vec<_> = root.ls().await.unwrap().into_iter().map(|p| p.into_string()).collect();
        assert_eq!(ls.len(), 2);
        assert!(ls[0].ends_with("a.txt"));
        assert!(ls[1].ends_with("sub"));

        let walk = root.walk().await.unwrap();
        assert_eq!(walk.len(), 3);
        assert!(walk.iter().all(|p| p.as_str().ends_with(".txt")));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_non_utf8_names_are_skipped() {
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ok.txt"), "").unwrap();
        std::fs::write(dir.path().join(std::ffi::OsStr::from_bytes(b"bad\xff.txt")), "").unwrap();

        let root = LocalPath::new(dir.path().to_string_lossy().into_owned());
        let ls = root.ls().await.unwrap();
        assert_eq!(ls.len(), 1);
        assert!(ls[0].as_str().ends_with("ok.txt"));

        let walk = root.walk().await.unwrap();
        assert_eq!(walk.len(), 1);
        assert!(walk.iter().all(|p| !p.as_str().contains('\u{FFFD}')));
    }

    #[tokio::test]
    async fn test_walk_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(local(&dir, "nope").walk().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_glob_txt() {
        let dir = TempDir::new().unwrap();
        for name in ["file1.txt", "file2.txt", "other.csv"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let root = LocalPath::new(dir.path().to_string_lossy().into_owned());
        let found = root.glob("*.txt").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.as_str().ends_with(".txt")));
    }

    #[tokio::test]
    async fn test_open_streams() {
        let dir = TempDir::new().unwrap();
        let path = local(&dir, "s.bin");

        let mut w = path.open(OpenMode::Write).await.unwrap();
        w.write(b"abc").await.unwrap();
        w.close().await.unwrap();

        let mut r = path.open(OpenMode::Read).await.unwrap();
        assert_eq!(r.read_to_end().await.unwrap(), b"abc");
        assert!(r.write(b"x").await.is_err());
    }

    #[test]
    fn test_lexical_pieces() {
        let path = LocalPath::new("/a/b/file.tar.gz");
        assert_eq!(path.extension(), ".gz");
        assert_eq!(path.stem(), "file.tar");
        assert_eq!(path.parts(), vec!["/", "a", "b", "file.tar.gz"]);
        assert_eq!(path.join(&["c", "d.txt"]).as_str(), "/a/b/file.tar.gz/c/d.txt");
        assert_eq!(path.join(&["/abs"]).as_str(), "/abs");
    }

    #[test]
    fn test_expanduser() {
        let path = LocalPath::new("~/data");
        assert!(!path.expanduser().as_str().starts_with('~'));
    }
}
