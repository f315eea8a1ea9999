//! Pure string rules shared by every backend.
//!
//! Nothing in here touches storage. File-vs-directory for the object store
//! is decided by [`is_file`] alone: a path whose final component carries an
//! extension is a file, anything else (trailing `/`, no `.`) is a directory.
//! Extension-less objects are therefore reported as directories.

/// Split off the extension of the final `/` component.
///
/// Leading dots of the final component never start an extension, so
/// `".bashrc"` has none. Returns `(rest, extension)` where `extension`
/// includes its dot or is empty.
pub fn split_extension(path: &str) -> (&str, &str) {
    let sep = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let Some(dot) = path.rfind('.') else {
        return (path, "");
    };
    if dot < sep {
        return (path, "");
    }
    if path[sep..dot].bytes().any(|b| b != b'.') {
        (&path[..dot], &path[dot..])
    } else {
        (path, "")
    }
}

/// Extension of the final component (`".txt"`), or `""`.
pub fn extension(path: &str) -> &str {
    split_extension(path).1
}

/// Lexical file heuristic: a path is a file iff it has an extension.
pub fn is_file(path: &str) -> bool {
    !extension(path).is_empty()
}

/// `/`-separated tokens with empty ones dropped.
///
/// `"s3://bucket/file.txt"` → `["s3:", "bucket", "file.txt"]`.
pub fn split_parts(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Last non-empty component without its extension.
pub fn stem(path: &str) -> String {
    let name = path.split('/').rev().find(|part| !part.is_empty()).unwrap_or("");
    split_extension(name).0.to_string()
}

/// Everything after the last `/`.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Everything before the last `/`, with trailing separators trimmed unless
/// the head is nothing but separators.
pub fn dirname(path: &str) -> &str {
    let head = match path.rfind('/') {
        Some(i) => &path[..=i],
        None => return "",
    };
    if head.bytes().all(|b| b == b'/') {
        head
    } else {
        head.trim_end_matches('/')
    }
}

/// Join segments with `/`.
///
/// A segment starting with `/` discards everything before it; a separator
/// is only inserted when the accumulated path does not already end in one.
pub fn join_native<S: AsRef<str>>(base: &str, segments: &[S]) -> String {
    let mut joined = base.to_string();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.starts_with('/') {
            joined = segment.to_string();
        } else if joined.is_empty() || joined.ends_with('/') {
            joined.push_str(segment);
        } else {
            joined.push('/');
            joined.push_str(segment);
        }
    }
    joined
}

/// Rebuild a path string from `parts` tokens. A leading `scheme:` token gets
/// its `//` back and a leading `/` token stays the root.
pub fn join_parts<S: AsRef<str>>(parts: &[S]) -> String {
    let Some((first, rest)) = parts.split_first() else {
        return String::new();
    };
    let first = first.as_ref();
    let tail = rest.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join("/");
    if first.ends_with(':') {
        format!("{first}//{tail}")
    } else if first == "/" {
        format!("/{tail}")
    } else if tail.is_empty() {
        first.to_string()
    } else {
        format!("{first}/{tail}")
    }
}
