//! Hierarchical data-platform backend.
//!
//! Path form: `scheme://dataset/collection/.../name.ext`. Building a path
//! happens in two phases. [`PlatformLocation::parse`] is pure string work.
//! [`PlatformPath::resolve`] walks the remote tree and may stop early, which
//! leaves the reference absent: the path simply does not exist yet.
//!
//! Packages on the platform carry no extension in their name. The extension
//! of a listed leaf is inferred from the storage key of its first content
//! source.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PathError, PathResult, StoreError};
use crate::glob::GlobPattern;
use crate::lexical;
use crate::ops::{BackendRef, PathBackend, PathFile};
use crate::registry::BackendFactory;
use crate::store::{DataPlatform, DataPlatformConnector, NodeKind, RemoteNode};
use crate::types::{BackendKind, MkdirOptions, NativePath, OpenMode, PathOptions};

/// Default credential profile.
pub const DEFAULT_PROFILE: &str = "default";

/// Parsed, unresolved platform path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformLocation {
    scheme: String,
    stem_path: String,
    extension: String,
    parts: Vec<String>,
}

impl PlatformLocation {
    /// Parse a path string. No I/O.
    ///
    /// The extension runs from the last `.` anywhere in the string. When
    /// `dataset` is given the string omits it and it is spliced in after
    /// the scheme.
    pub fn parse(path: &str, scheme: &str, dataset: Option<&str>) -> PathResult<Self> {
        if !path.starts_with(scheme) {
            return Err(PathError::invalid_path(format!(
                "{path}: data platform paths must begin with {scheme}"
            )));
        }

        let (stem, extension) = match path.rfind('.') {
            Some(dot) => (&path[..dot], &path[dot..]),
            None => (path, ""),
        };

        let stem_path = match dataset {
            Some(dataset) => {
                let rest = &stem[scheme.len()..];
                format!("{scheme}{}", lexical::join_native(dataset, &[rest]))
            }
            None => stem.to_string(),
        };

        let parts = lexical::split_parts(&stem_path);
        if parts.len() < 2 {
            return Err(PathError::invalid_path(format!("{path}: no dataset given")));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            stem_path,
            extension: extension.to_string(),
            parts,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn dataset(&self) -> &str {
        &self.parts[1]
    }

    /// Segments below the dataset.
    pub fn segments(&self) -> &[String] {
        &self.parts[2..]
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The path with its extension stripped.
    pub fn stem_path(&self) -> &str {
        &self.stem_path
    }

    /// Last token of the stem path.
    pub fn stem(&self) -> &str {
        self.parts.last().map_or("", String::as_str)
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Stem path plus extension; parses back to this same location.
    pub fn native(&self) -> String {
        format!("{}{}", self.stem_path, self.extension)
    }

    /// Dataset-relative path, extension included.
    pub fn relative(&self) -> String {
        format!("{}{}", self.segments().join("/"), self.extension)
    }

    /// Stem path of the containing collection or dataset.
    fn parent(&self) -> Option<&str> {
        self.stem_path.rfind('/').map(|i| &self.stem_path[..i])
    }
}

/// A resolved platform path.
#[derive(Debug)]
pub struct PlatformPath {
    location: PlatformLocation,
    client: Arc<dyn DataPlatform>,
    profile: String,
    staging_dir: Option<PathBuf>,
    /// Replaced wholesale after a successful mutation; `None` when the
    /// remote object does not exist.
    resolved: RwLock<Option<RemoteNode>>,
}

impl PlatformPath {
    /// Resolve a parsed location against the remote tree.
    ///
    /// A missing dataset is `NotFound`. A missing collection or package
    /// below it is not an error.
    #[tracing::instrument(skip_all, fields(path = %location.native(), profile = %profile))]
    pub async fn resolve(
        location: PlatformLocation,
        client: Arc<dyn DataPlatform>,
        profile: String,
        staging_dir: Option<PathBuf>,
    ) -> PathResult<Self> {
        let resolved = resolve_node(client.as_ref(), &location).await?;
        debug!(found = resolved.is_some(), "resolved platform path");
        Ok(Self {
            location,
            client,
            profile,
            staging_dir,
            resolved: RwLock::new(resolved),
        })
    }

    pub fn location(&self) -> &PlatformLocation {
        &self.location
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Snapshot of the resolved remote object.
    pub fn node(&self) -> Option<RemoteNode> {
        self.resolved.read().clone()
    }

    fn at(&self, e: StoreError) -> PathError {
        e.at(self.location.native())
    }

    /// Extension of a leaf, taken from its first content source.
    async fn leaf_extension(&self, node: &RemoteNode) -> PathResult<String> {
        if node.kind != NodeKind::Package {
            return Ok(String::new());
        }
        let sources = self.client.sources(&node.id).await.map_err(|e| self.at(e))?;
        if sources.len() > 1 {
            warn!(package = %node.id, count = sources.len(), "package has more than one source, using the first");
        }
        Ok(sources
            .first()
            .map(|s| lexical::extension(&s.storage_key).to_string())
            .unwrap_or_default())
    }

    /// Full path of every leaf below this path, extension included.
    async fn leaves(&self) -> PathResult<Vec<String>> {
        let Some(root) = self.node().filter(RemoteNode::is_container) else {
            return Ok(Vec::new());
        };

        let mut leaves = Vec::new();
        let mut stack = vec![(root, self.location.stem_path().to_string())];
        while let Some((node, path)) = stack.pop() {
            let items = self.client.list_items(&node.id).await.map_err(|e| self.at(e))?;
            for item in items {
                let item_path = lexical::join_native(&path, &[item.name.as_str()]);
                if item.is_container() {
                    stack.push((item, item_path));
                } else {
                    let ext = self.leaf_extension(&item).await?;
                    leaves.push(format!("{item_path}{ext}"));
                }
            }
        }
        Ok(leaves)
    }

    async fn parent_node(&self) -> PathResult<RemoteNode> {
        let missing = || PathError::not_found(format!("parent of {}", self.location.native()));
        let parent = self.location.parent().ok_or_else(missing)?;
        let parent = PlatformLocation::parse(parent, self.location.scheme(), None)
            .map_err(|_| missing())?;
        resolve_node(self.client.as_ref(), &parent)
            .await?
            .filter(RemoteNode::is_container)
            .ok_or_else(missing)
    }

    fn staging(&self) -> PathResult<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("omnipath-");
        let dir = match &self.staging_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

async fn resolve_node(
    client: &dyn DataPlatform,
    location: &PlatformLocation,
) -> PathResult<Option<RemoteNode>> {
    let native = location.native();
    let mut current = client
        .get_dataset(location.dataset())
        .await
        .map_err(|e| e.at(&native))?;

    let segments = location.segments();
    for (i, token) in segments.iter().enumerate() {
        let items = client.list_items(&current.id).await.map_err(|e| e.at(&native))?;
        let collection = items
            .iter()
            .find(|item| item.kind == NodeKind::Collection && item.name == *token);
        let next = match collection {
            Some(collection) => Some(collection.clone()),
            None if i + 1 == segments.len() => items
                .iter()
                .find(|item| item.kind == NodeKind::Package && item.name == *token)
                .cloned(),
            None => None,
        };
        match next {
            Some(node) => current = node,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

#[async_trait]
impl PathBackend for PlatformPath {
    fn kind(&self) -> BackendKind {
        BackendKind::DataPlatform
    }

    fn backend_ref(&self) -> BackendRef<'_> {
        BackendRef::DataPlatform(self)
    }

    fn as_str(&self) -> &str {
        self.location.stem_path()
    }

    fn native(&self) -> NativePath {
        NativePath::new(self.location.native())
    }

    fn extension(&self) -> String {
        self.location.extension().to_string()
    }

    fn stem(&self) -> String {
        self.location.stem().to_string()
    }

    fn parts(&self) -> Vec<String> {
        self.location.parts().to_vec()
    }

    fn join(&self, segments: &[&str]) -> NativePath {
        NativePath::new(lexical::join_native(self.location.stem_path(), segments))
    }

    fn with_suffix(&self, suffix: &str) -> NativePath {
        NativePath::new(format!("{}{suffix}", self.location.stem_path()))
    }

    async fn exists(&self) -> PathResult<bool> {
        Ok(self.resolved.read().is_some())
    }

    async fn is_dir(&self) -> PathResult<bool> {
        Ok(self.resolved.read().as_ref().is_some_and(RemoteNode::is_container))
    }

    async fn is_file(&self) -> PathResult<bool> {
        Ok(self
            .resolved
            .read()
            .as_ref()
            .is_some_and(|node| !node.is_container()))
    }

    async fn ls(&self) -> PathResult<Vec<NativePath>> {
        let Some(node) = self.node().filter(RemoteNode::is_container) else {
            return Ok(Vec::new());
        };
        let items = self.client.list_items(&node.id).await.map_err(|e| self.at(e))?;
        let mut children = Vec::with_capacity(items.len());
        for item in &items {
            let name = format!("{}{}", item.name, self.leaf_extension(item).await?);
            children.push(self.join(&[name.as_str()]));
        }
        Ok(children)
    }

    async fn walk(&self) -> PathResult<Vec<NativePath>> {
        Ok(self.leaves().await?.into_iter().map(NativePath::from).collect())
    }

    async fn glob(&self, pattern: &str) -> PathResult<Vec<NativePath>> {
        let base = format!("{}{}/", self.location.scheme(), self.location.dataset());
        let relative_dir = self.location.segments().join("/");
        let glob = GlobPattern::new(&lexical::join_native(&relative_dir, &[pattern]))?;

        let leaves = self.leaves().await?;
        let relative = leaves
            .iter()
            .map(|leaf| leaf.strip_prefix(base.as_str()).unwrap_or(leaf.as_str()));
        Ok(glob
            .filter(relative)
            .into_iter()
            .map(|captured| NativePath::new(format!("{base}{captured}")))
            .collect())
    }

    async fn touch(&self, exist_ok: bool) -> PathResult<()> {
        if self.exists().await? {
            if exist_ok {
                return Ok(());
            }
            return Err(PathError::already_exists(self.location.native()));
        }
        self.write_bytes(&[], OpenMode::Write).await?;
        Ok(())
    }

    async fn mkdir(&self, options: MkdirOptions) -> PathResult<()> {
        let native = self.location.native();
        if self.exists().await? {
            if options.exist_ok {
                return Ok(());
            }
            return Err(PathError::already_exists(native));
        }

        let mut current = self
            .client
            .get_dataset(self.location.dataset())
            .await
            .map_err(|e| self.at(e))?;
        let segments = self.location.segments();
        for (i, token) in segments.iter().enumerate() {
            let items = self.client.list_items(&current.id).await.map_err(|e| self.at(e))?;
            let existing = items
                .into_iter()
                .find(|item| item.kind == NodeKind::Collection && item.name == *token);
            current = match existing {
                Some(collection) => collection,
                None if i + 1 < segments.len() && !options.parents => {
                    return Err(PathError::not_found(format!(
                        "missing collection {token} in {native}"
                    )));
                }
                None => self
                    .client
                    .create_collection(&current.id, token)
                    .await
                    .map_err(|e| self.at(e))?,
            };
        }

        debug!(path = %native, id = %current.id, "created collection");
        *self.resolved.write() = Some(current);
        Ok(())
    }

    async fn rmdir(&self, _recursive: bool) -> PathResult<()> {
        let Some(node) = self.node().filter(RemoteNode::is_container) else {
            return Ok(());
        };
        self.client.delete(&node.id).await.map_err(|e| self.at(e))?;
        *self.resolved.write() = None;
        Ok(())
    }

    async fn remove(&self) -> PathResult<()> {
        let Some(node) = self.node() else {
            return Ok(());
        };
        self.client.delete(&node.id).await.map_err(|e| self.at(e))?;
        *self.resolved.write() = None;
        Ok(())
    }

    async fn open(&self, _mode: OpenMode) -> PathResult<Box<dyn PathFile>> {
        Err(PathError::unsupported(format!(
            "data platform paths can't be opened: {}",
            self.location.native()
        )))
    }

    async fn read_bytes(&self) -> PathResult<Vec<u8>> {
        let native = self.location.native();
        let Some(node) = self.node().filter(|node| !node.is_container()) else {
            return Err(PathError::not_found(native));
        };

        let sources = self.client.sources(&node.id).await.map_err(|e| self.at(e))?;
        if sources.len() > 1 {
            warn!(package = %node.id, count = sources.len(), "package has more than one source, using the first");
        }
        let source = sources.first().ok_or_else(|| PathError::not_found(&native))?;
        self.client.download(&source.url).await.map_err(|e| self.at(e))
    }

    async fn write_bytes(&self, data: &[u8], mode: OpenMode) -> PathResult<usize> {
        let native = self.location.native();
        match mode {
            OpenMode::Write => {}
            OpenMode::Append => {
                return Err(PathError::unsupported(format!("append to {native}")));
            }
            OpenMode::Read => {
                return Err(PathError::unsupported(format!("write in read mode: {native}")));
            }
        }

        if self.is_dir().await? {
            return Ok(0);
        }
        if let Some(node) = self.node() {
            self.client.delete(&node.id).await.map_err(|e| self.at(e))?;
            *self.resolved.write() = None;
        }

        let parent = self.parent_node().await?;
        let staging = self.staging()?;
        let file = staging
            .path()
            .join(format!("{}{}", self.location.stem(), self.location.extension()));
        tokio::fs::write(&file, data).await?;

        let id = self
            .client
            .upload(&parent.id, &file)
            .await
            .map_err(|e| self.at(e))?;
        let node = self.client.get(&id).await.map_err(|e| self.at(e))?;
        debug!(path = %native, id = %node.id, bytes = data.len(), "uploaded package");
        *self.resolved.write() = Some(node);
        Ok(data.len())
    }
}

/// Builds [`PlatformPath`]s, connecting with the requested profile.
#[derive(Debug, Clone)]
pub struct PlatformFactory {
    scheme: String,
    connector: Arc<dyn DataPlatformConnector>,
    default_profile: String,
    staging_dir: Option<PathBuf>,
}

impl PlatformFactory {
    pub fn new(scheme: impl Into<String>, connector: Arc<dyn DataPlatformConnector>) -> Self {
        Self {
            scheme: scheme.into(),
            connector,
            default_profile: DEFAULT_PROFILE.to_string(),
            staging_dir: None,
        }
    }

    pub fn with_default_profile(mut self, profile: impl Into<String>) -> Self {
        self.default_profile = profile.into();
        self
    }

    /// Directory for temporary upload staging; the system temp dir otherwise.
    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    /// Parse, connect and resolve.
    pub async fn build(&self, path: &str, options: &PathOptions) -> PathResult<PlatformPath> {
        let location = PlatformLocation::parse(path, &self.scheme, options.dataset.as_deref())?;
        let profile = options
            .profile
            .clone()
            .unwrap_or_else(|| self.default_profile.clone());
        let client = self
            .connector
            .connect(&profile)
            .await
            .map_err(|e| e.at(path))?;
        PlatformPath::resolve(location, client, profile, self.staging_dir.clone()).await
    }
}

#[async_trait]
impl BackendFactory for PlatformFactory {
    fn kind(&self) -> BackendKind {
        BackendKind::DataPlatform
    }

    async fn construct(
        &self,
        path: &str,
        options: &PathOptions,
    ) -> PathResult<Box<dyn PathBackend>> {
        Ok(Box::new(self.build(path, options).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::store::{ContentSource, MemoryConnector, MemoryDataPlatform, NodeId};

    struct Fixture {
        platform: Arc<MemoryDataPlatform>,
        connector: Arc<MemoryConnector>,
        factory: PlatformFactory,
    }

    impl Fixture {
        fn new() -> Self {
            let platform = Arc::new(MemoryDataPlatform::new());
            platform.create_dataset("ds");
            let connector = Arc::new(MemoryConnector::new(platform.clone()));
            let factory = PlatformFactory::new("bf://", connector.clone());
            Self {
                platform,
                connector,
                factory,
            }
        }

        async fn path(&self, path: &str) -> PlatformPath {
            self.factory.build(path, &PathOptions::new()).await.unwrap()
        }
    }

    fn strings(paths: Vec<NativePath>) -> Vec<String> {
        paths.into_iter().map(NativePath::into_string).collect()
    }

    #[test]
    fn test_parse_strips_extension() {
        let loc = PlatformLocation::parse("bf://ds/col/file.txt", "bf://", None).unwrap();
        assert_eq!(loc.stem_path(), "bf://ds/col/file");
        assert_eq!(loc.extension(), ".txt");
        assert_eq!(loc.dataset(), "ds");
        assert_eq!(loc.segments(), ["col".to_string(), "file".to_string()]);
        assert_eq!(loc.stem(), "file");
        assert_eq!(loc.native(), "bf://ds/col/file.txt");
        assert_eq!(loc.relative(), "col/file.txt");
    }

    #[test]
    fn test_parse_with_dataset() {
        let loc = PlatformLocation::parse("bf://col/file.csv", "bf://", Some("ds")).unwrap();
        assert_eq!(loc.stem_path(), "bf://ds/col/file");
        assert_eq!(loc.dataset(), "ds");
    }

    #[test]
    fn test_parse_rejects() {
        assert!(matches!(
            PlatformLocation::parse("bf://", "bf://", None),
            Err(PathError::InvalidPath(_))
        ));
        assert!(matches!(
            PlatformLocation::parse("s3://ds/x", "bf://", None),
            Err(PathError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_dataset_is_not_found() {
        let fx = Fixture::new();
        let result = fx.factory.build("bf://nope/file.txt", &PathOptions::new()).await;
        assert!(matches!(result, Err(PathError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_absent_reference_is_not_an_error() {
        let fx = Fixture::new();
        let path = fx.path("bf://ds/not/there.txt").await;
        assert!(!path.exists().await.unwrap());
        assert!(!path.is_dir().await.unwrap());
        assert!(!path.is_file().await.unwrap());
        assert!(path.walk().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_read_remove() {
        let fx = Fixture::new();
        let path = fx.path("bf://ds/hello.txt").await;

        assert_eq!(path.write_text("hello", OpenMode::Write).await.unwrap(), 5);
        assert!(path.exists().await.unwrap());
        assert!(path.is_file().await.unwrap());
        assert_eq!(path.read_text().await.unwrap(), "hello");
        assert_eq!(path.as_str(), "bf://ds/hello");
        assert_eq!(path.native().as_str(), "bf://ds/hello.txt");

        let again = fx.path("bf://ds/hello.txt").await;
        assert!(again.is_file().await.unwrap());

        path.remove().await.unwrap();
        assert!(!path.exists().await.unwrap());
        path.remove().await.unwrap();
    }

    #[tokio::test]
    async fn test_overwrite_replaces_package() {
        let fx = Fixture::new();
        let path = fx.path("bf://ds/data.csv").await;
        path.write_text("one", OpenMode::Write).await.unwrap();
        path.write_text("two", OpenMode::Write).await.unwrap();

        let ds = fx.platform.get_dataset("ds").await.unwrap();
        assert_eq!(fx.platform.list_items(&ds.id).await.unwrap().len(), 1);
        assert_eq!(path.read_text().await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_write_rules() {
        let fx = Fixture::new();
        let dir = fx.path("bf://ds/col").await;
        dir.mkdir(MkdirOptions::new()).await.unwrap();
        assert_eq!(dir.write_bytes(b"x", OpenMode::Write).await.unwrap(), 0);

        let file = fx.path("bf://ds/col/f.txt").await;
        assert!(matches!(
            file.write_bytes(b"x", OpenMode::Append).await,
            Err(PathError::UnsupportedOperation(_))
        ));

        let orphan = fx.path("bf://ds/missing/f.txt").await;
        assert!(matches!(
            orphan.write_bytes(b"x", OpenMode::Write).await,
            Err(PathError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mkdir_parents() {
        let fx = Fixture::new();
        let path = fx.path("bf://ds/a/b").await;

        assert!(matches!(
            path.mkdir(MkdirOptions::new()).await,
            Err(PathError::NotFound(_))
        ));
        path.mkdir(MkdirOptions::new().parents(true)).await.unwrap();
        assert!(path.is_dir().await.unwrap());
        assert!(fx.path("bf://ds/a").await.is_dir().await.unwrap());

        assert!(matches!(
            path.mkdir(MkdirOptions::new()).await,
            Err(PathError::AlreadyExists(_))
        ));
        path.mkdir(MkdirOptions::new().exist_ok(true)).await.unwrap();
    }

    #[tokio::test]
    async fn test_ls_and_walk() {
        let fx = Fixture::new();
        let ds = fx.platform.get_dataset("ds").await.unwrap();
        let outer = fx.platform.create_collection(&ds.id, "outer").await.unwrap();
        let inner = fx.platform.create_collection(&outer.id, "inner").await.unwrap();
        fx.platform
            .add_package(&outer.id, "p1", vec![("x/p1.csv".into(), b"1".to_vec())])
            .unwrap();
        fx.platform
            .add_package(&inner.id, "p2", vec![("y/p2.txt".into(), b"2".to_vec())])
            .unwrap();

        let outer_path = fx.path("bf://ds/outer").await;
        assert_eq!(
            strings(outer_path.ls().await.unwrap()),
            vec!["bf://ds/outer/inner", "bf://ds/outer/p1.csv"]
        );

        let mut walk = strings(outer_path.walk().await.unwrap());
        walk.sort();
        assert_eq!(walk, vec!["bf://ds/outer/inner/p2.txt", "bf://ds/outer/p1.csv"]);
    }

    #[tokio::test]
    async fn test_glob() {
        let fx = Fixture::new();
        for name in ["file1.txt", "file2.txt", "other.csv"] {
            fx.path(&format!("bf://ds/{name}"))
                .await
                .write_text("x", OpenMode::Write)
                .await
                .unwrap();
        }

        let root = fx.path("bf://ds").await;
        let mut found = strings(root.glob("*.txt").await.unwrap());
        found.sort();
        assert_eq!(found, vec!["bf://ds/file1.txt", "bf://ds/file2.txt"]);
    }

    #[tokio::test]
    async fn test_multiple_sources_reads_first() {
        let fx = Fixture::new();
        let ds = fx.platform.get_dataset("ds").await.unwrap();
        fx.platform
            .add_package(
                &ds.id,
                "multi",
                vec![
                    ("a/multi.txt".into(), b"first".to_vec()),
                    ("b/multi.txt".into(), b"second".to_vec()),
                ],
            )
            .unwrap();

        let path = fx.path("bf://ds/multi.txt").await;
        assert_eq!(path.read_bytes().await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_rmdir_on_file_is_noop() {
        let fx = Fixture::new();
        let path = fx.path("bf://ds/keep.txt").await;
        path.write_text("x", OpenMode::Write).await.unwrap();
        path.rmdir(false).await.unwrap();
        assert!(path.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_and_open() {
        let fx = Fixture::new();
        let path = fx.path("bf://ds/t.txt").await;
        path.touch(true).await.unwrap();
        assert!(path.is_file().await.unwrap());
        path.touch(true).await.unwrap();
        assert!(matches!(path.touch(false).await, Err(PathError::AlreadyExists(_))));
        assert!(matches!(
            path.open(OpenMode::Read).await,
            Err(PathError::UnsupportedOperation(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_selection() {
        let fx = Fixture::new();
        fx.path("bf://ds").await;
        fx.factory
            .build("bf://ds", &PathOptions::new().with_profile("lab"))
            .await
            .unwrap();
        assert_eq!(fx.connector.profiles_seen(), vec!["default", "lab"]);
    }

    #[tokio::test]
    async fn test_collection_wins_over_package() {
        let fx = Fixture::new();
        let ds = fx.platform.get_dataset("ds").await.unwrap();
        fx.platform
            .add_package(&ds.id, "shared", vec![("k/shared.csv".to_string(), b"p".to_vec())])
            .unwrap();
        fx.platform.create_collection(&ds.id, "shared").await.unwrap();

        let path = fx.path("bf://ds/shared").await;
        assert_eq!(path.node().map(|n| n.kind), Some(NodeKind::Collection));
        assert!(path.is_dir().await.unwrap());
    }

    #[tokio::test]
    async fn test_package_is_never_traversed() {
        let fx = Fixture::new();
        let ds = fx.platform.get_dataset("ds").await.unwrap();
        fx.platform
            .add_package(&ds.id, "pkg", vec![("k/pkg.txt".to_string(), b"p".to_vec())])
            .unwrap();

        assert!(fx.path("bf://ds/pkg.txt").await.is_file().await.unwrap());
        let below = fx.path("bf://ds/pkg/child.txt").await;
        assert!(below.node().is_none());
        assert!(!below.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_staging_dir_is_cleaned() {
        let staging = tempfile::TempDir::new().unwrap();
        let fx = Fixture::new();
        let factory = fx
            .factory
            .clone()
            .with_staging_dir(Some(staging.path().to_path_buf()));
        let path = factory.build("bf://ds/s.txt", &PathOptions::new()).await.unwrap();
        path.write_text("x", OpenMode::Write).await.unwrap();
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    /// Delegates to a memory platform but rejects every upload.
    #[derive(Debug)]
    struct RejectingUploads(Arc<MemoryDataPlatform>);

    #[async_trait]
    impl DataPlatform for RejectingUploads {
        async fn get_dataset(&self, name: &str) -> StoreResult<RemoteNode> {
            self.0.get_dataset(name).await
        }

        async fn list_items(&self, parent: &NodeId) -> StoreResult<Vec<RemoteNode>> {
            self.0.list_items(parent).await
        }

        async fn create_collection(&self, parent: &NodeId, name: &str) -> StoreResult<RemoteNode> {
            self.0.create_collection(parent, name).await
        }

        async fn delete(&self, id: &NodeId) -> StoreResult<()> {
            self.0.delete(id).await
        }

        async fn upload(&self, _parent: &NodeId, _file: &std::path::Path) -> StoreResult<NodeId> {
            Err(StoreError::unsupported("upload rejected"))
        }

        async fn get(&self, id: &NodeId) -> StoreResult<RemoteNode> {
            self.0.get(id).await
        }

        async fn sources(&self, id: &NodeId) -> StoreResult<Vec<ContentSource>> {
            self.0.sources(id).await
        }

        async fn download(&self, url: &str) -> StoreResult<Vec<u8>> {
            self.0.download(url).await
        }
    }

    #[derive(Debug)]
    struct RejectingConnector(Arc<RejectingUploads>);

    #[async_trait]
    impl DataPlatformConnector for RejectingConnector {
        async fn connect(&self, _profile: &str) -> StoreResult<Arc<dyn DataPlatform>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_staging_dir_is_cleaned_when_upload_fails() {
        let staging = tempfile::TempDir::new().unwrap();
        let platform = Arc::new(MemoryDataPlatform::new());
        platform.create_dataset("ds");
        let connector = RejectingConnector(Arc::new(RejectingUploads(platform.clone())));
        let factory = PlatformFactory::new("bf://", Arc::new(connector))
            .with_staging_dir(Some(staging.path().to_path_buf()));

        let path = factory.build("bf://ds/s.txt", &PathOptions::new()).await.unwrap();
        assert!(path.write_text("x", OpenMode::Write).await.is_err());
        assert!(!path.exists().await.unwrap());
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
        assert_eq!(platform.node_count(), 1);
    }
}
