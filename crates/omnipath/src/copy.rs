//! Cross-backend copy.
//!
//! The transfer strategy depends only on the pair of backend kinds:
//!
//! | from → to | strategy |
//! |---|---|
//! | local → object store | upload the local file |
//! | object store → object store | server-side copy |
//! | object store → local | download one object, or every key under a prefix |
//!
//! Every other pair fails with `UnsupportedCopyOperation`.

use std::path::{Component, Path as StdPath, PathBuf};
use tracing::debug;

use crate::backends::{LocalPath, ObjectPath};
use crate::error::{PathError, PathResult};
use crate::lexical;
use crate::ops::{BackendRef, PathBackend};
use crate::path::Path;
use crate::types::CopyOptions;

/// Copy `src` to `dest`. `options` are forwarded untouched to the store.
#[tracing::instrument(skip_all, fields(src = %src, dest = %dest))]
pub async fn copy(src: &Path, dest: &Path, options: &CopyOptions) -> PathResult<()> {
    match (src.backend().backend_ref(), dest.backend().backend_ref()) {
        (BackendRef::Local(from), BackendRef::ObjectStore(to)) => {
            copy_local_to_object(from, to, options).await
        }
        (BackendRef::ObjectStore(from), BackendRef::ObjectStore(to)) => {
            copy_object_to_object(from, to, options).await
        }
        (BackendRef::ObjectStore(from), BackendRef::Local(to)) => {
            copy_object_to_local(from, to).await
        }
        (from, to) => Err(PathError::UnsupportedCopyOperation {
            from: from.kind(),
            to: to.kind(),
        }),
    }
}

async fn copy_local_to_object(
    from: &LocalPath,
    to: &ObjectPath,
    options: &CopyOptions,
) -> PathResult<()> {
    debug!(bucket = to.bucket(), key = to.key(), "uploading local file");
    to.store()
        .upload_file(from.path(), to.bucket(), to.key(), options)
        .await
        .map_err(|e| e.at(to.as_str()))
}

async fn copy_object_to_object(
    from: &ObjectPath,
    to: &ObjectPath,
    options: &CopyOptions,
) -> PathResult<()> {
    from.store()
        .copy_object(from.bucket(), from.key(), to.bucket(), to.key(), options)
        .await
        .map_err(|e| e.at(from.as_str()))
}

async fn copy_object_to_local(from: &ObjectPath, to: &LocalPath) -> PathResult<()> {
    let store = from.store();
    let bucket = from.bucket();
    let key = from.key().trim_end_matches('/');

    if from.is_dir().await? {
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };
        let keys = store
            .list_objects(bucket, &prefix)
            .await
            .map_err(|e| e.at(from.as_str()))?;

        let mut targets = Vec::new();
        for key in keys.iter().filter(|key| !key.ends_with('/')) {
            let relative = &key[prefix.len()..];
            if !is_contained(relative) {
                return Err(PathError::invalid_path(format!(
                    "{key} in {}: key escapes the destination",
                    from.as_str()
                )));
            }
            targets.push((key, to.path().join(relative)));
        }

        if !targets.is_empty() {
            debug!(count = targets.len(), "downloading prefix");
            for (key, target) in targets {
                store
                    .download_object(bucket, key, &target)
                    .await
                    .map_err(|e| e.at(from.as_str()))?;
            }
            return Ok(());
        }

        // Nothing below the prefix: only an extension-less object is left
        let exact = !key.is_empty()
            && store
                .object_exists(bucket, key)
                .await
                .map_err(|e| e.at(from.as_str()))?;
        if !exact {
            return Err(PathError::not_found(format!(
                "{}: nothing to copy",
                from.as_str()
            )));
        }
    }

    let target: PathBuf = if to.is_dir().await? {
        to.path().join(lexical::basename(key))
    } else {
        to.path().to_path_buf()
    };
    store
        .download_object(bucket, key, &target)
        .await
        .map_err(|e| e.at(from.as_str()))
}

/// A relative key that stays below whatever directory it is joined onto.
fn is_contained(relative: &str) -> bool {
    StdPath::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
