//! # omnipath
//!
//! One path type over three kinds of storage:
//!
//! - the local filesystem (any path without a registered prefix)
//! - S3-style object stores (`s3://bucket/key`)
//! - hierarchical data platforms (`bf://dataset/collection/package.ext`)
//!
//! A [`Registry`] maps prefixes to backends. [`Registry::construct`] picks
//! the backend for a string and returns a [`Path`], which forwards every
//! operation to that backend. [`copy()`] moves data between backends where a
//! transfer strategy exists.
//!
//! Remote backends talk to storage through the [`store::ObjectStore`] and
//! [`store::DataPlatform`] traits. In-memory implementations of both ship in
//! [`store`].
//!
//! ## Known quirks
//!
//! - File vs directory on remote backends is lexical: a final component
//!   with an extension is a file. Extension-less objects read as
//!   directories.
//! - Glob patterns are anchored at the start only, so `a/*` matches
//!   `a/b/c` and yields `a/b`.

pub mod backends;
pub mod config;
pub mod copy;
mod error;
pub mod glob;
pub mod lexical;
mod ops;
mod path;
pub mod registry;
pub mod store;
mod types;

pub use config::PathConfig;
pub use copy::copy;
pub use error::{PathError, PathResult, StoreError, StoreResult};
pub use ops::{BackendRef, PathBackend, PathFile};
pub use path::Path;
pub use registry::{BackendFactory, Registration, Registry, RegistryBuilder};
pub use types::{BackendKind, CopyOptions, MkdirOptions, NativePath, OpenMode, PathOptions};
