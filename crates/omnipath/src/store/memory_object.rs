//! In-memory object store.
//!
//! Used for testing and for ephemeral scratch buckets. All data is lost
//! when dropped.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;

use super::object::{ObjectEntry, ObjectStore};
use crate::error::{StoreError, StoreResult};
use crate::types::CopyOptions;

type Bucket = BTreeMap<String, Vec<u8>>;

/// In-memory [`ObjectStore`].
///
/// Thread-safe via internal `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<BTreeMap<String, Bucket>>,
    /// Options passed to the most recent upload or copy.
    last_options: RwLock<Option<CopyOptions>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds an empty bucket.
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::new();
        store.buckets.write().insert(bucket.to_string(), Bucket::new());
        store
    }

    /// Seed an object directly, creating the bucket if needed.
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// Names of all buckets, sorted.
    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.read().keys().cloned().collect()
    }

    /// Options forwarded by the last `upload_file` or `copy_object`.
    pub fn last_options(&self) -> Option<CopyOptions> {
        self.last_options.read().clone()
    }

    fn missing_bucket(bucket: &str) -> StoreError {
        StoreError::not_found(format!("bucket {bucket}"))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> StoreResult<bool> {
        Ok(self.buckets.read().contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> StoreResult<()> {
        let mut buckets = self.buckets.write();
        if buckets.contains_key(bucket) {
            return Err(StoreError::already_exists(format!("bucket {bucket}")));
        }
        buckets.insert(bucket.to_string(), Bucket::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> StoreResult<()> {
        let mut buckets = self.buckets.write();
        match buckets.get(bucket) {
            None => Err(Self::missing_bucket(bucket)),
            Some(objects) if !objects.is_empty() => {
                Err(StoreError::not_empty(format!("bucket {bucket}")))
            }
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        Ok(self
            .buckets
            .read()
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key)))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(|| Self::missing_bucket(bucket))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("{bucket}/{key}")))
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> StoreResult<()> {
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::missing_bucket(bucket))?;
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn append_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> StoreResult<()> {
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::missing_bucket(bucket))?;
        objects.entry(key.to_string()).or_default().extend(data);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::missing_bucket(bucket))?;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(format!("{bucket}/{key}")))
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<String>> {
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(|| Self::missing_bucket(bucket))?;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn list_children(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<ObjectEntry>> {
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(|| Self::missing_bucket(bucket))?;

        let mut children = Vec::new();
        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            // The prefix's own marker object is not a child
            if rest.is_empty() {
                continue;
            }
            let entry = match rest.find('/') {
                Some(i) => ObjectEntry::prefix(format!("{prefix}{}", &rest[..i])),
                None => ObjectEntry::object(key.clone()),
            };
            if children.last() != Some(&entry) {
                children.push(entry);
            }
        }
        children.sort();
        children.dedup();
        Ok(children)
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        options: &CopyOptions,
    ) -> StoreResult<()> {
        let data = self.get_object(src_bucket, src_key).await?;
        self.put_object(dst_bucket, dst_key, data).await?;
        *self.last_options.write() = Some(options.clone());
        Ok(())
    }

    async fn upload_file(
        &self,
        local: &Path,
        bucket: &str,
        key: &str,
        options: &CopyOptions,
    ) -> StoreResult<()> {
        let data = tokio::fs::read(local).await?;
        self.put_object(bucket, key, data).await?;
        *self.last_options.write() = Some(options.clone());
        Ok(())
    }
}
