//! In-memory data platform.
//!
//! Mirrors how the real platform names uploads: `table.csv` becomes a
//! package called `table` whose single source has a storage key ending in
//! `table.csv`.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::platform::{ContentSource, DataPlatform, DataPlatformConnector, NodeId, NodeKind, RemoteNode};
use crate::error::{StoreError, StoreResult};

const URL_SCHEME: &str = "memory://";

#[derive(Debug, Clone)]
struct Record {
    node: RemoteNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    sources: Vec<ContentSource>,
    content: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Tree {
    records: HashMap<NodeId, Record>,
    datasets: HashMap<String, NodeId>,
}

impl Tree {
    fn record(&self, id: &NodeId) -> StoreResult<&Record> {
        self.records
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("node {id}")))
    }

    fn insert(&mut self, parent: Option<&NodeId>, name: &str, kind: NodeKind) -> StoreResult<RemoteNode> {
        let tag = match kind {
            NodeKind::Dataset => "dataset",
            NodeKind::Collection => "collection",
            NodeKind::Package => "package",
        };
        let node = RemoteNode {
            id: NodeId::new(format!("N:{tag}:{}", Uuid::new_v4())),
            name: name.to_string(),
            kind,
        };
        if let Some(parent) = parent {
            let parent_record = self
                .records
                .get_mut(parent)
                .ok_or_else(|| StoreError::not_found(format!("node {parent}")))?;
            if !parent_record.node.is_container() {
                return Err(StoreError::unsupported(format!("{parent} holds no items")));
            }
            parent_record.children.push(node.id.clone());
        }
        self.records.insert(
            node.id.clone(),
            Record {
                node: node.clone(),
                parent: parent.cloned(),
                children: Vec::new(),
                sources: Vec::new(),
                content: Vec::new(),
            },
        );
        Ok(node)
    }

    fn remove_subtree(&mut self, id: &NodeId) {
        if let Some(record) = self.records.remove(id) {
            for child in record.children {
                self.remove_subtree(&child);
            }
        }
    }
}

/// In-memory [`DataPlatform`].
#[derive(Debug, Default)]
pub struct MemoryDataPlatform {
    tree: RwLock<Tree>,
}

impl MemoryDataPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dataset; an existing dataset of that name is returned as-is.
    pub fn create_dataset(&self, name: &str) -> RemoteNode {
        let mut tree = self.tree.write();
        if let Some(id) = tree.datasets.get(name).cloned() {
            if let Ok(record) = tree.record(&id) {
                return record.node.clone();
            }
        }
        let node = RemoteNode {
            id: NodeId::new(format!("N:dataset:{}", Uuid::new_v4())),
            name: name.to_string(),
            kind: NodeKind::Dataset,
        };
        tree.records.insert(
            node.id.clone(),
            Record {
                node: node.clone(),
                parent: None,
                children: Vec::new(),
                sources: Vec::new(),
                content: Vec::new(),
            },
        );
        tree.datasets.insert(name.to_string(), node.id.clone());
        node
    }

    /// Seed a package with explicit sources: `(storage_key, bytes)` pairs.
    pub fn add_package(
        &self,
        parent: &NodeId,
        name: &str,
        sources: Vec<(String, Vec<u8>)>,
    ) -> StoreResult<RemoteNode> {
        let mut tree = self.tree.write();
        let node = tree.insert(Some(parent), name, NodeKind::Package)?;
        if let Some(record) = tree.records.get_mut(&node.id) {
            for (i, (storage_key, bytes)) in sources.into_iter().enumerate() {
                record.sources.push(ContentSource {
                    storage_key,
                    url: format!("{URL_SCHEME}{}/{i}", node.id),
                });
                record.content.push(bytes);
            }
        }
        Ok(node)
    }

    /// Number of live nodes, datasets included.
    pub fn node_count(&self) -> usize {
        self.tree.read().records.len()
    }
}

#[async_trait]
impl DataPlatform for MemoryDataPlatform {
    async fn get_dataset(&self, name: &str) -> StoreResult<RemoteNode> {
        let tree = self.tree.read();
        let id = tree
            .datasets
            .get(name)
            .ok_or_else(|| StoreError::not_found(format!("dataset {name}")))?;
        Ok(tree.record(id)?.node.clone())
    }

    async fn list_items(&self, parent: &NodeId) -> StoreResult<Vec<RemoteNode>> {
        let tree = self.tree.read();
        let record = tree.record(parent)?;
        Ok(record
            .children
            .iter()
            .filter_map(|id| tree.records.get(id).map(|r| r.node.clone()))
            .collect())
    }

    async fn create_collection(&self, parent: &NodeId, name: &str) -> StoreResult<RemoteNode> {
        self.tree.write().insert(Some(parent), name, NodeKind::Collection)
    }

    async fn delete(&self, id: &NodeId) -> StoreResult<()> {
        let mut tree = self.tree.write();
        let record = tree.record(id)?.clone();
        match &record.parent {
            Some(parent) => {
                if let Some(parent) = tree.records.get_mut(parent) {
                    parent.children.retain(|child| child != id);
                }
            }
            None => {
                tree.datasets.remove(&record.node.name);
            }
        }
        tree.remove_subtree(id);
        Ok(())
    }

    async fn upload(&self, parent: &NodeId, file: &Path) -> StoreResult<NodeId> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StoreError::not_found(file.display().to_string()))?;
        let package_name = file
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());

        let storage_key = format!("{parent}/{}/{file_name}", Uuid::new_v4());
        let node = self.add_package(parent, &package_name, vec![(storage_key, bytes)])?;
        Ok(node.id)
    }

    async fn get(&self, id: &NodeId) -> StoreResult<RemoteNode> {
        Ok(self.tree.read().record(id)?.node.clone())
    }

    async fn sources(&self, id: &NodeId) -> StoreResult<Vec<ContentSource>> {
        Ok(self.tree.read().record(id)?.sources.clone())
    }

    async fn download(&self, url: &str) -> StoreResult<Vec<u8>> {
        let missing = || StoreError::not_found(format!("url {url}"));
        let rest = url.strip_prefix(URL_SCHEME).ok_or_else(missing)?;
        let (id, index) = rest.rsplit_once('/').ok_or_else(missing)?;
        let index: usize = index.parse().map_err(|_| missing())?;

        let tree = self.tree.read();
        let record = tree.record(&NodeId::new(id))?;
        record.content.get(index).cloned().ok_or_else(missing)
    }
}

/// Connector handing out one shared [`MemoryDataPlatform`] for any profile.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    platform: Arc<MemoryDataPlatform>,
    profiles: Arc<Mutex<Vec<String>>>,
}

impl MemoryConnector {
    pub fn new(platform: Arc<MemoryDataPlatform>) -> Self {
        Self {
            platform,
            profiles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn platform(&self) -> &Arc<MemoryDataPlatform> {
        &self.platform
    }

    /// Profiles passed to `connect`, in call order.
    pub fn profiles_seen(&self) -> Vec<String> {
        self.profiles.lock().clone()
    }
}

#[async_trait]
impl DataPlatformConnector for MemoryConnector {
    async fn connect(&self, profile: &str) -> StoreResult<Arc<dyn DataPlatform>> {
        self.profiles.lock().push(profile.to_string());
        Ok(self.platform.clone())
    }
}
