//! Object-store collaborator interface.
//!
//! A flat bucket/key namespace. "Directories" exist only as key prefixes
//! (or as empty `prefix/` marker objects); the backend layers directory
//! semantics on top of these primitives.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{StoreError, StoreResult};
use crate::glob::GlobPattern;
use crate::types::CopyOptions;

/// One entry of a single-level listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectEntry {
    /// Full key, without a trailing `/` for prefixes.
    pub key: String,
    /// True when this entry is a common prefix rather than an object.
    pub is_prefix: bool,
}

impl ObjectEntry {
    pub fn object(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_prefix: false,
        }
    }

    pub fn prefix(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_prefix: true,
        }
    }
}

/// Operations the object-store backend needs from a store client.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    async fn bucket_exists(&self, bucket: &str) -> StoreResult<bool>;

    /// Fails with `AlreadyExists` if the bucket is there.
    async fn create_bucket(&self, bucket: &str) -> StoreResult<()>;

    /// Fails with `NotEmpty` while objects remain.
    async fn delete_bucket(&self, bucket: &str) -> StoreResult<()>;

    /// Exact key lookup.
    async fn object_exists(&self, bucket: &str, key: &str) -> StoreResult<bool>;

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>>;

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> StoreResult<()>;

    /// Append to an object. Most stores cannot.
    async fn append_object(&self, bucket: &str, key: &str, _data: Vec<u8>) -> StoreResult<()> {
        Err(StoreError::unsupported(format!("append to {bucket}/{key}")))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()>;

    /// Every key starting with `prefix`, at any depth, sorted.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<String>>;

    /// One level below `prefix` (which is empty or ends in `/`).
    async fn list_children(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<ObjectEntry>>;

    /// Server-side copy.
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        options: &CopyOptions,
    ) -> StoreResult<()>;

    /// Upload a local file to `bucket/key`.
    async fn upload_file(
        &self,
        local: &Path,
        bucket: &str,
        key: &str,
        _options: &CopyOptions,
    ) -> StoreResult<()> {
        let data = tokio::fs::read(local).await?;
        self.put_object(bucket, key, data).await
    }

    /// Download `bucket/key` into a local file, creating parent directories.
    async fn download_object(&self, bucket: &str, key: &str, local: &Path) -> StoreResult<()> {
        let data = self.get_object(bucket, key).await?;
        if let Some(parent) = local.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(local, data).await?;
        Ok(())
    }

    /// Keys (or captured key prefixes) matching a shell pattern. Directory
    /// markers are not candidates.
    async fn glob(&self, bucket: &str, pattern: &str) -> StoreResult<Vec<String>> {
        let glob = GlobPattern::new(pattern).map_err(|e| {
            StoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))
        })?;
        let keys = self.list_objects(bucket, glob.literal_prefix()).await?;
        Ok(glob.filter(keys.iter().filter(|key| !key.ends_with('/'))))
    }
}
