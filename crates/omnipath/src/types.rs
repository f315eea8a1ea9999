//! Core path types.
//!
//! Small value types shared by the registry, the facade and every backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{PathError, PathResult};

/// Which storage technology a path belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum BackendKind {
    /// Native filesystem; the fallback when no prefix matches.
    Local,
    /// Flat-namespace object store (`s3://bucket/key`).
    #[strum(to_string = "s3")]
    ObjectStore,
    /// Hierarchical data platform (`bf://dataset/collection/package`).
    #[strum(to_string = "bf")]
    DataPlatform,
}

/// A path string produced by a backend.
///
/// Backends never hand out their own path types; they return `NativePath`
/// and the facade turns it back into a [`crate::Path`] with a full
/// resolve+construct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativePath(String);

impl NativePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for NativePath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl From<&str> for NativePath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

impl std::fmt::Display for NativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flags for `mkdir`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MkdirOptions {
    /// Create missing intermediate directories.
    pub parents: bool,
    /// Succeed silently if the directory already exists.
    pub exist_ok: bool,
}

impl MkdirOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parents(mut self, parents: bool) -> Self {
        self.parents = parents;
        self
    }

    pub fn exist_ok(mut self, exist_ok: bool) -> Self {
        self.exist_ok = exist_ok;
        self
    }
}

/// Stream open mode.
///
/// Parsed from the familiar mode strings (`"r"`, `"wb"`, `"a"` …); the
/// text/binary distinction does not change behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
}

impl OpenMode {
    pub fn is_write(&self) -> bool {
        matches!(self, OpenMode::Write | OpenMode::Append)
    }
}

impl FromStr for OpenMode {
    type Err = PathError;

    fn from_str(mode: &str) -> PathResult<Self> {
        match mode {
            "r" | "rb" | "rt" => Ok(OpenMode::Read),
            "w" | "wb" | "wt" => Ok(OpenMode::Write),
            "a" | "ab" | "at" => Ok(OpenMode::Append),
            other => Err(PathError::unsupported(format!("open mode {other:?}"))),
        }
    }
}

/// Construction parameters forwarded to a backend factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOptions {
    /// Data-platform dataset, when the path string omits it.
    pub dataset: Option<String>,
    /// Data-platform credential profile; the registry default applies when unset.
    pub profile: Option<String>,
}

impl PathOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// Extra store options forwarded untouched by the copy orchestrator
/// (e.g. `ContentType`, `ACL`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOptions {
    pub extra: BTreeMap<String, String>,
}

impl CopyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
