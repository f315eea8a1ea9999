//! Data-platform collaborator interface.
//!
//! The platform stores a tree per dataset: collections nest, packages are
//! leaves, and each package is backed by one or more content sources
//! reachable through a transfer URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::StoreResult;

/// Remote object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum NodeKind {
    Dataset,
    Collection,
    Package,
}

impl NodeKind {
    /// Datasets and collections hold children and accept uploads.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Dataset | NodeKind::Collection)
    }
}

/// A remote dataset, collection or package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
}

impl RemoteNode {
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }
}

/// One backing file of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSource {
    /// Storage key of the uploaded file; its extension is the package's.
    pub storage_key: String,
    /// Transfer URL for the content bytes.
    pub url: String,
}

/// Operations the platform backend needs from an authenticated client.
#[async_trait]
pub trait DataPlatform: Send + Sync + std::fmt::Debug {
    /// Fails with `NotFound` for an unknown dataset.
    async fn get_dataset(&self, name: &str) -> StoreResult<RemoteNode>;

    /// Immediate children of a dataset or collection.
    async fn list_items(&self, parent: &NodeId) -> StoreResult<Vec<RemoteNode>>;

    async fn create_collection(&self, parent: &NodeId, name: &str) -> StoreResult<RemoteNode>;

    /// Delete a node and everything below it.
    async fn delete(&self, id: &NodeId) -> StoreResult<()>;

    /// Upload a local file into a container; returns the new package's id.
    async fn upload(&self, parent: &NodeId, file: &Path) -> StoreResult<NodeId>;

    async fn get(&self, id: &NodeId) -> StoreResult<RemoteNode>;

    async fn sources(&self, id: &NodeId) -> StoreResult<Vec<ContentSource>>;

    /// Fetch the bytes behind a transfer URL.
    async fn download(&self, url: &str) -> StoreResult<Vec<u8>>;
}

/// Authenticates against the platform with a named credential profile.
#[async_trait]
pub trait DataPlatformConnector: Send + Sync + std::fmt::Debug {
    async fn connect(&self, profile: &str) -> StoreResult<Arc<dyn DataPlatform>>;
}
