//! Backend registry with prefix dispatch.
//!
//! Maps a scheme-like prefix (`s3://`, `bf://`) to the factory that builds
//! paths for it. Prefixes are tried in registration order and the first
//! literal string-prefix match wins; anything unmatched goes to the local
//! fallback when one is installed.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::backends::{LocalFactory, ObjectFactory, PlatformFactory};
use crate::config::PathConfig;
use crate::error::{PathError, PathResult};
use crate::ops::PathBackend;
use crate::path::Path;
use crate::store::{DataPlatformConnector, ObjectStore};
use crate::types::{BackendKind, PathOptions};

/// Builds backend instances for one prefix.
#[async_trait]
pub trait BackendFactory: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> BackendKind;

    /// Build a backend for `path`. May perform I/O (remote resolution).
    async fn construct(&self, path: &str, options: &PathOptions)
    -> PathResult<Box<dyn PathBackend>>;
}

/// A registered prefix.
#[derive(Debug, Clone)]
pub struct Registration {
    pub prefix: String,
    pub kind: BackendKind,
}

/// Immutable prefix → backend table.
pub struct Registry {
    entries: Vec<(String, Arc<dyn BackendFactory>)>,
    fallback: Option<Arc<dyn BackendFactory>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("prefixes", &self.prefixes())
            .field("fallback", &self.fallback.as_ref().map(|f| f.kind()))
            .finish()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry for `config`: object store first, then the data platform,
    /// then the local fallback if enabled.
    pub fn from_config(
        config: &PathConfig,
        object_store: Arc<dyn ObjectStore>,
        connector: Arc<dyn DataPlatformConnector>,
    ) -> PathResult<Arc<Self>> {
        let platform = PlatformFactory::new(config.platform_prefix.clone(), connector)
            .with_default_profile(config.default_profile.clone())
            .with_staging_dir(config.staging_dir.clone());
        let fallback: Option<Arc<dyn BackendFactory>> = if config.local_fallback {
            Some(Arc::new(LocalFactory))
        } else {
            None
        };

        Ok(Self::builder()
            .register(
                config.object_store_prefix.clone(),
                ObjectFactory::new(config.object_store_prefix.clone(), object_store),
            )?
            .register(config.platform_prefix.clone(), platform)?
            .fallback(fallback)
            .build())
    }

    fn factory_for(&self, path: &str) -> PathResult<&Arc<dyn BackendFactory>> {
        self.entries
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, factory)| factory)
            .or(self.fallback.as_ref())
            .ok_or_else(|| PathError::unsupported_path_kind(path))
    }

    /// Which backend owns `path`.
    pub fn resolve(&self, path: &str) -> PathResult<BackendKind> {
        let kind = self.factory_for(path)?.kind();
        debug!(path, %kind, "resolved backend");
        Ok(kind)
    }

    /// Build a facade for `path`.
    pub async fn construct(self: &Arc<Self>, path: &str, options: PathOptions) -> PathResult<Path> {
        let factory = self.factory_for(path)?;
        let backend = factory.construct(path, &options).await?;
        debug!(path, kind = %factory.kind(), "constructed path");
        Ok(Path::from_parts(
            path.to_string(),
            Arc::from(backend),
            Arc::clone(self),
            options,
        ))
    }

    /// Registered prefixes, in dispatch order.
    pub fn prefixes(&self) -> Vec<Registration> {
        self.entries
            .iter()
            .map(|(prefix, factory)| Registration {
                prefix: prefix.clone(),
                kind: factory.kind(),
            })
            .collect()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Builder for [`Registry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    entries: Vec<(String, Arc<dyn BackendFactory>)>,
    fallback: Option<Arc<dyn BackendFactory>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Empty table with the local fallback installed.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            fallback: Some(Arc::new(LocalFactory)),
        }
    }

    /// Register `factory` for `prefix`. One factory per prefix.
    pub fn register(
        self,
        prefix: impl Into<String>,
        factory: impl BackendFactory + 'static,
    ) -> PathResult<Self> {
        self.register_arc(prefix, Arc::new(factory))
    }

    /// Register an already shared factory.
    pub fn register_arc(
        mut self,
        prefix: impl Into<String>,
        factory: Arc<dyn BackendFactory>,
    ) -> PathResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(PathError::config("empty prefix"));
        }
        if self.entries.iter().any(|(existing, _)| *existing == prefix) {
            return Err(PathError::config(format!("prefix {prefix} registered twice")));
        }
        self.entries.push((prefix, factory));
        Ok(self)
    }

    /// Replace the fallback; `None` makes unmatched paths an error.
    pub fn fallback(mut self, factory: Option<Arc<dyn BackendFactory>>) -> Self {
        self.fallback = factory;
        self
    }

    pub fn build(self) -> Arc<Registry> {
        Arc::new(Registry {
            entries: self.entries,
            fallback: self.fallback,
        })
    }
}
