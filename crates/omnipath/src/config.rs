//! Registry configuration, stored as RON.
//!
//! ```ron
//! (
//!     object_store_prefix: "s3://",
//!     platform_prefix: "bf://",
//!     default_profile: "default",
//!     local_fallback: true,
//!     staging_dir: Some("/var/tmp/omnipath"),
//! )
//! ```
//!
//! Every field is optional; missing ones take the defaults above (with no
//! staging directory).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backends::DEFAULT_PROFILE;
use crate::error::{PathError, PathResult};

/// Prefixes and defaults for [`crate::Registry::from_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub object_store_prefix: String,
    pub platform_prefix: String,
    /// Credential profile used when a path doesn't name one.
    pub default_profile: String,
    /// Send unmatched paths to the local filesystem.
    pub local_fallback: bool,
    /// Where uploads are staged; the system temp dir when unset.
    pub staging_dir: Option<PathBuf>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            object_store_prefix: "s3://".to_string(),
            platform_prefix: "bf://".to_string(),
            default_profile: DEFAULT_PROFILE.to_string(),
            local_fallback: true,
            staging_dir: None,
        }
    }
}

impl PathConfig {
    pub fn from_ron_str(text: &str) -> PathResult<Self> {
        let config: Self =
            ron::from_str(text).map_err(|e| PathError::config(format!("invalid RON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a RON file.
    pub async fn load(path: impl AsRef<Path>) -> PathResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PathError::from_io(e, path.display().to_string()))?;
        Self::from_ron_str(&text)
    }

    fn validate(&self) -> PathResult<()> {
        if self.object_store_prefix.is_empty() || self.platform_prefix.is_empty() {
            return Err(PathError::config("backend prefixes must not be empty"));
        }
        if self.object_store_prefix == self.platform_prefix {
            return Err(PathError::config(format!(
                "object store and platform share prefix {}",
                self.object_store_prefix
            )));
        }
        Ok(())
    }

    pub fn with_object_store_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_store_prefix = prefix.into();
        self
    }

    pub fn with_platform_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.platform_prefix = prefix.into();
        self
    }

    pub fn with_default_profile(mut self, profile: impl Into<String>) -> Self {
        self.default_profile = profile.into();
        self
    }

    pub fn with_local_fallback(mut self, enabled: bool) -> Self {
        self.local_fallback = enabled;
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }
}
