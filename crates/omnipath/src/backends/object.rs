//! Object-store backend.
//!
//! `scheme://bucket/key`. Bucket and key are recomputed from the string on
//! every call. Directories are key prefixes, optionally pinned by an empty
//! `prefix/` marker object, and file-vs-directory is lexical
//! ([`lexical::is_file`]).

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{PathError, PathResult, StoreError};
use crate::lexical;
use crate::ops::{BackendRef, PathBackend, PathFile};
use crate::registry::BackendFactory;
use crate::store::ObjectStore;
use crate::types::{BackendKind, MkdirOptions, NativePath, OpenMode, PathOptions};

/// A path in an object store.
#[derive(Debug, Clone)]
pub struct ObjectPath {
    repr: String,
    scheme: String,
    store: Arc<dyn ObjectStore>,
}

impl ObjectPath {
    pub fn new(path: impl Into<String>, scheme: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            repr: path.into(),
            scheme: scheme.into(),
            store,
        }
    }

    /// The store this path lives in.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn stripped(&self) -> &str {
        self.repr.strip_prefix(self.scheme.as_str()).unwrap_or(&self.repr)
    }

    /// First segment after the scheme.
    pub fn bucket(&self) -> &str {
        let rest = self.stripped();
        rest.split_once('/').map_or(rest, |(bucket, _)| bucket)
    }

    /// Everything after the bucket; `""` at bucket root.
    pub fn key(&self) -> &str {
        self.stripped().split_once('/').map_or("", |(_, key)| key)
    }

    /// The key as a directory prefix: `""` at bucket root, else `key/`.
    fn dir_prefix(&self) -> String {
        let key = self.key().trim_end_matches('/');
        if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        }
    }

    fn native_for(&self, key: &str) -> NativePath {
        NativePath::new(format!("{}{}/{}", self.scheme, self.bucket(), key))
    }

    fn at(&self, e: StoreError) -> PathError {
        e.at(&self.repr)
    }

    /// Key for content operations; the bucket root holds no content.
    fn object_key(&self) -> PathResult<&str> {
        let key = self.key();
        if key.is_empty() || key.ends_with('/') {
            return Err(PathError::invalid_path(format!("{} names no object", self.repr)));
        }
        Ok(key)
    }

    async fn bucket_exists(&self) -> PathResult<bool> {
        self.store
            .bucket_exists(self.bucket())
            .await
            .map_err(|e| self.at(e))
    }

    async fn has_children(&self) -> PathResult<bool> {
        let keys = self
            .store
            .list_objects(self.bucket(), &self.dir_prefix())
            .await
            .map_err(|e| self.at(e))?;
        Ok(!keys.is_empty())
    }
}

#[async_trait]
impl PathBackend for ObjectPath {
    fn kind(&self) -> BackendKind {
        BackendKind::ObjectStore
    }

    fn backend_ref(&self) -> BackendRef<'_> {
        BackendRef::ObjectStore(self)
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
        lexical::split_parts(&self.repr)
    }

    fn join(&self, segments: &[&str]) -> NativePath {
        NativePath::new(lexical::join_native(&self.repr, segments))
    }

    async fn exists(&self) -> PathResult<bool> {
        if !self.bucket_exists().await? {
            return Ok(false);
        }
        let key = self.key();
        if key.is_empty() {
            return Ok(true);
        }
        let exact = self
            .store
            .object_exists(self.bucket(), key)
            .await
            .map_err(|e| self.at(e))?;
        if exact {
            return Ok(true);
        }
        self.has_children().await
    }

    async fn is_dir(&self) -> PathResult<bool> {
        Ok(self.exists().await? && !lexical::is_file(&self.repr))
    }

    async fn is_file(&self) -> PathResult<bool> {
        Ok(self.exists().await? && lexical::is_file(&self.repr))
    }

    async fn ls(&self) -> PathResult<Vec<NativePath>> {
        let entries = self
            .store
            .list_children(self.bucket(), &self.dir_prefix())
            .await
            .map_err(|e| self.at(e))?;

        if entries.is_empty() && !self.key().is_empty() {
            let exact = self
                .store
                .object_exists(self.bucket(), self.key())
                .await
                .map_err(|e| self.at(e))?;
            if exact {
                return Ok(vec![self.native_for(self.key())]);
            }
        }
        Ok(entries.iter().map(|entry| self.native_for(&entry.key)).collect())
    }

    async fn walk(&self) -> PathResult<Vec<NativePath>> {
        if !self.bucket_exists().await? {
            return Ok(Vec::new());
        }
        let keys = self
            .store
            .list_objects(self.bucket(), &self.dir_prefix())
            .await
            .map_err(|e| self.at(e))?;
        Ok(keys
            .iter()
            .filter(|key| !key.ends_with('/'))
            .map(|key| self.native_for(key))
            .collect())
    }

    async fn glob(&self, pattern: &str) -> PathResult<Vec<NativePath>> {
        if !self.bucket_exists().await? {
            return Ok(Vec::new());
        }
        let joined = lexical::join_native(&self.dir_prefix(), &[pattern]);
        let keys = self
            .store
            .glob(self.bucket(), &joined)
            .await
            .map_err(|e| self.at(e))?;
        Ok(keys
            .iter()
            .filter(|key| !key.ends_with('/'))
            .map(|key| self.native_for(key))
            .collect())
    }

    async fn touch(&self, exist_ok: bool) -> PathResult<()> {
        let key = self.object_key()?;
        let exists = self
            .store
            .object_exists(self.bucket(), key)
            .await
            .map_err(|e| self.at(e))?;
        if exists {
            if exist_ok {
                return Ok(());
            }
            return Err(PathError::already_exists(&self.repr));
        }
        self.store
            .put_object(self.bucket(), key, Vec::new())
            .await
            .map_err(|e| self.at(e))
    }

    async fn mkdir(&self, options: MkdirOptions) -> PathResult<()> {
        if self.exists().await? {
            if options.exist_ok {
                return Ok(());
            }
            return Err(PathError::already_exists(&self.repr));
        }

        let bucket = self.bucket();
        let marker = self.dir_prefix();
        if marker.is_empty() {
            return self.store.create_bucket(bucket).await.map_err(|e| self.at(e));
        }

        if !self.bucket_exists().await? {
            if !options.parents {
                return Err(PathError::not_found(format!("{}{bucket}", self.scheme)));
            }
            self.store.create_bucket(bucket).await.map_err(|e| self.at(e))?;
        }
        self.store
            .put_object(bucket, &marker, Vec::new())
            .await
            .map_err(|e| self.at(e))
    }

    async fn rmdir(&self, recursive: bool) -> PathResult<()> {
        let bucket = self.bucket();
        let prefix = self.dir_prefix();
        let keys = self
            .store
            .list_objects(bucket, &prefix)
            .await
            .map_err(|e| self.at(e))?;

        if prefix.is_empty() {
            if recursive {
                for key in &keys {
                    self.store.delete_object(bucket, key).await.map_err(|e| self.at(e))?;
                }
            }
            return self.store.delete_bucket(bucket).await.map_err(|e| self.at(e));
        }

        if keys.is_empty() {
            return Err(PathError::not_found(&self.repr));
        }
        if !recursive && keys.iter().any(|key| *key != prefix) {
            return Err(PathError::not_empty(&self.repr));
        }
        for key in &keys {
            self.store.delete_object(bucket, key).await.map_err(|e| self.at(e))?;
        }
        Ok(())
    }

    async fn remove(&self) -> PathResult<()> {
        let key = self.object_key()?;
        self.store
            .delete_object(self.bucket(), key)
            .await
            .map_err(|e| self.at(e))
    }

    async fn open(&self, mode: OpenMode) -> PathResult<Box<dyn PathFile>> {
        let key = self.object_key()?.to_string();
        let buffer = match mode {
            OpenMode::Read => self.read_bytes().await?,
            OpenMode::Write | OpenMode::Append => Vec::new(),
        };
        Ok(Box::new(ObjectFile {
            store: self.store.clone(),
            bucket: self.bucket().to_string(),
            key,
            repr: self.repr.clone(),
            mode,
            buffer,
            closed: false,
        }))
    }

    async fn read_bytes(&self) -> PathResult<Vec<u8>> {
        let key = self.object_key()?;
        self.store
            .get_object(self.bucket(), key)
            .await
            .map_err(|e| self.at(e))
    }

    async fn write_bytes(&self, data: &[u8], mode: OpenMode) -> PathResult<usize> {
        let key = self.object_key()?;
        let result = match mode {
            OpenMode::Write => self.store.put_object(self.bucket(), key, data.to_vec()).await,
            OpenMode::Append => self.store.append_object(self.bucket(), key, data.to_vec()).await,
            OpenMode::Read => {
                return Err(PathError::unsupported(format!("write in read mode: {}", self.repr)));
            }
        };
        result.map_err(|e| self.at(e))?;
        Ok(data.len())
    }
}

/// Buffered object stream. Writes land on `close`.
#[derive(Debug)]
struct ObjectFile {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key: String,
    repr: String,
    mode: OpenMode,
    buffer: Vec<u8>,
    closed: bool,
}

#[async_trait]
impl PathFile for ObjectFile {
    fn mode(&self) -> OpenMode {
        self.mode
    }

    async fn read_to_end(&mut self) -> PathResult<Vec<u8>> {
        if self.mode != OpenMode::Read {
            return Err(PathError::unsupported(format!("{} not open for reading", self.repr)));
        }
        Ok(std::mem::take(&mut self.buffer))
    }

    async fn write(&mut self, data: &[u8]) -> PathResult<usize> {
        if !self.mode.is_write() || self.closed {
            return Err(PathError::unsupported(format!("{} not open for writing", self.repr)));
        }
        self.buffer.extend_from_slice(data);
        Ok(data.len())
    }

    async fn close(&mut self) -> PathResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let data = std::mem::take(&mut self.buffer);
        let result = match self.mode {
            OpenMode::Read => return Ok(()),
            OpenMode::Write => self.store.put_object(&self.bucket, &self.key, data).await,
            OpenMode::Append => self.store.append_object(&self.bucket, &self.key, data).await,
        };
        result.map_err(|e| e.at(&self.repr))
    }
}

/// Builds [`ObjectPath`]s against one shared store client.
#[derive(Debug, Clone)]
pub struct ObjectFactory {
    scheme: String,
    store: Arc<dyn ObjectStore>,
}

impl ObjectFactory {
    pub fn new(scheme: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            scheme: scheme.into(),
            store,
        }
    }
}

#[async_trait]
impl BackendFactory for ObjectFactory {
    fn kind(&self) -> BackendKind {
        BackendKind::ObjectStore
    }

    async fn construct(
        &self,
        path: &str,
        _options: &PathOptions,
    ) -> PathResult<Box<dyn PathBackend>> {
        Ok(Box::new(ObjectPath::new(path, self.scheme.clone(), self.store.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;

    fn s3(store: &Arc<MemoryObjectStore>, path: &str) -> ObjectPath {
        ObjectPath::new(path, "s3://", store.clone())
    }

    #[test]
    fn test_bucket_and_key() {
        let store = Arc::new(MemoryObjectStore::new());
        let path = s3(&store, "s3://some/dir/");
        assert_eq!(path.bucket(), "some");
        assert_eq!(path.key(), "dir/");

        let path = s3(&store, "s3://bucket");
        assert_eq!(path.bucket(), "bucket");
        assert_eq!(path.key(), "");

        let path = s3(&store, "test-bucket/test.py");
        assert_eq!(path.bucket(), "test-bucket");
        assert_eq!(path.key(), "test.py");
    }

    #[test]
    fn test_lexical_pieces() {
        let store = Arc::new(MemoryObjectStore::new());
        let path = s3(&store, "s3://bucket/file.txt");
        assert_eq!(path.extension(), ".txt");
        assert_eq!(path.stem(), "file");
        assert_eq!(path.parts(), vec!["s3:", "bucket", "file.txt"]);
        assert_eq!(path.join(&["a", "b.csv"]).as_str(), "s3://bucket/file.txt/a/b.csv");
    }

    #[tokio::test]
    async fn test_exists_by_key_or_prefix() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "dir/file.txt", "x");

        assert!(s3(&store, "s3://b").exists().await.unwrap());
        assert!(s3(&store, "s3://b/dir/file.txt").exists().await.unwrap());
        assert!(s3(&store, "s3://b/dir").exists().await.unwrap());
        assert!(s3(&store, "s3://b/dir/").exists().await.unwrap());
        assert!(!s3(&store, "s3://b/di").exists().await.unwrap());
        assert!(!s3(&store, "s3://missing/x.txt").exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_is_dir_is_lexical() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "noext", "actually a file");
        store.insert("b", "data.csv", "a,b");

        let noext = s3(&store, "s3://b/noext");
        assert!(noext.is_dir().await.unwrap());
        assert!(!noext.is_file().await.unwrap());

        let csv = s3(&store, "s3://b/data.csv");
        assert!(csv.is_file().await.unwrap());
        assert!(!csv.is_dir().await.unwrap());
    }

    #[tokio::test]
    async fn test_write_read_remove() {
        let store = Arc::new(MemoryObjectStore::with_bucket("b"));
        let path = s3(&store, "s3://b/hello.txt");
        assert_eq!(path.write_text("hello", OpenMode::Write).await.unwrap(), 5);
        assert_eq!(path.read_text().await.unwrap(), "hello");
        path.remove().await.unwrap();
        assert!(!path.exists().await.unwrap());
        assert!(matches!(path.remove().await, Err(PathError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mkdir_bucket_and_prefix() {
        let store = Arc::new(MemoryObjectStore::new());

        let nested = s3(&store, "s3://fresh/dir");
        assert!(matches!(
            nested.mkdir(MkdirOptions::new()).await,
            Err(PathError::NotFound(_))
        ));
        nested.mkdir(MkdirOptions::new().parents(true)).await.unwrap();
        assert!(nested.is_dir().await.unwrap());

        let bucket = s3(&store, "s3://fresh");
        assert!(matches!(
            bucket.mkdir(MkdirOptions::new()).await,
            Err(PathError::AlreadyExists(_))
        ));
        bucket.mkdir(MkdirOptions::new().exist_ok(true)).await.unwrap();
    }

    #[tokio::test]
    async fn test_rmdir_prefix() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "dir/", "");
        store.insert("b", "dir/a.txt", "");
        let dir = s3(&store, "s3://b/dir");

        assert!(matches!(dir.rmdir(false).await, Err(PathError::NotEmpty(_))));
        dir.rmdir(true).await.unwrap();
        assert!(!dir.exists().await.unwrap());

        store.insert("b", "empty/", "");
        s3(&store, "s3://b/empty").rmdir(false).await.unwrap();
        assert!(store.list_objects("b", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rmdir_bucket() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "k.txt", "");
        let bucket = s3(&store, "s3://b");
        assert!(matches!(bucket.rmdir(false).await, Err(PathError::NotEmpty(_))));
        bucket.rmdir(true).await.unwrap();
        assert!(store.bucket_names().is_empty());
    }

    #[tokio::test]
    async fn test_ls_and_walk() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "dir/", "");
        store.insert("b", "dir/a.txt", "");
        store.insert("b", "dir/sub/b.txt", "");

        let dir = s3(&store, "s3://b/dir");
        let ls: Vec<_> = dir.ls().await.unwrap().into_iter().map(NativePath::into_string).collect();
        assert_eq!(ls, vec!["s3://b/dir/a.txt", "s3://b/dir/sub"]);

        let walk: Vec<_> = dir.walk().await.unwrap().into_iter().map(NativePath::into_string).collect();
        assert_eq!(walk, vec!["s3://b/dir/a.txt", "s3://b/dir/sub/b.txt"]);
    }

    #[tokio::test]
    async fn test_glob() {
        let store = Arc::new(MemoryObjectStore::new());
        for key in ["d/file1.txt", "d/file2.txt", "d/other.csv"] {
            store.insert("b", key, "");
        }
        let found = s3(&store, "s3://b/d").glob("*.txt").await.unwrap();
        let found: Vec<_> = found.into_iter().map(NativePath::into_string).collect();
        assert_eq!(found, vec!["s3://b/d/file1.txt", "s3://b/d/file2.txt"]);
    }

    #[tokio::test]
    async fn test_glob_skips_directory_markers() {
        let store = Arc::new(MemoryObjectStore::with_bucket("b"));
        let dir = s3(&store, "s3://b/d");
        dir.mkdir(MkdirOptions::new()).await.unwrap();
        s3(&store, "s3://b/d/a.txt").write_text("a", OpenMode::Write).await.unwrap();

        let found = dir.glob("*").await.unwrap();
        let found: Vec<_> = found.into_iter().map(NativePath::into_string).collect();
        assert_eq!(found, vec!["s3://b/d/a.txt"]);
        assert_eq!(store.glob("b", "d/*").await.unwrap(), vec!["d/a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_open_buffers_until_close() {
        let store = Arc::new(MemoryObjectStore::with_bucket("b"));
        let path = s3(&store, "s3://b/stream.txt");

        let mut file = path.open(OpenMode::Write).await.unwrap();
        file.write(b"part1 ").await.unwrap();
        file.write(b"part2").await.unwrap();
        assert!(!store.object_exists("b", "stream.txt").await.unwrap());
        file.close().await.unwrap();

        let mut file = path.open(OpenMode::Read).await.unwrap();
        assert_eq!(file.read_to_end().await.unwrap(), b"part1 part2");
    }

    #[tokio::test]
    async fn test_touch() {
        let store = Arc::new(MemoryObjectStore::with_bucket("b"));
        let path = s3(&store, "s3://b/t.txt");
        path.touch(false).await.unwrap();
        path.touch(true).await.unwrap();
        assert!(matches!(path.touch(false).await, Err(PathError::AlreadyExists(_))));
    }
}
