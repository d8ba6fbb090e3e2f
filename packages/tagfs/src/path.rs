//! Path normalization and splitting.
//!
//! Filesystem paths are absolute, `/`-separated strings. The normal form
//! starts with `/`, has no empty, `.` or `..` components and no trailing
//! slash, except for the root `/` itself. Directory markers store this
//! form verbatim, so every lookup must normalize first.

use crate::error::{FsError, FsResult};

/// Path separator.
pub const SEPARATOR: char = '/';

/// Characters that may not appear in a path.
pub const INVALID_PATH_CHARS: &str = "\0";

/// Coerce any input to the normal form.
///
/// `..` components that would climb above the root are dropped.
///
/// # Examples
///
/// ```rust
/// use tagfs::path::normalize;
///
/// assert_eq!(normalize("a/b/"), "/a/b");
/// assert_eq!(normalize("//a/./c/../b"), "/a/b");
/// assert_eq!(normalize(""), "/");
/// ```
pub fn normalize(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    for component in path.split(SEPARATOR) {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    format!("{}{}", SEPARATOR, components.join("/"))
}

/// Check a caller-supplied path and return its normal form.
///
/// Rejects forbidden characters and `..` components that lead above the
/// root.
pub fn validate(path: &str) -> FsResult<String> {
    if path.chars().any(|c| INVALID_PATH_CHARS.contains(c)) {
        return Err(FsError::InvalidPath {
            path: path.escape_default().to_string(),
            message: "contains invalid characters".to_string(),
        });
    }

    let mut depth: usize = 0;
    for component in path.split(SEPARATOR) {
        match component {
            "" | "." => {}
            ".." => {
                depth = depth.checked_sub(1).ok_or_else(|| FsError::InvalidPath {
                    path: path.to_string(),
                    message: "back reference above the root".to_string(),
                })?;
            }
            _ => depth += 1,
        }
    }

    Ok(normalize(path))
}

/// Split into `(parent, leaf)`.
///
/// The leaf is empty only for the root, whose parent is the root itself.
///
/// ```rust
/// use tagfs::path::split;
///
/// assert_eq!(split("/a/b/c.txt"), ("/a/b".to_string(), "c.txt".to_string()));
/// assert_eq!(split("a"), ("/".to_string(), "a".to_string()));
/// assert_eq!(split("/"), ("/".to_string(), "".to_string()));
/// ```
pub fn split(path: &str) -> (String, String) {
    let path = normalize(path);
    match path.rsplit_once(SEPARATOR) {
        Some((parent, leaf)) => (normalize(parent), leaf.to_string()),
        None => (path, String::new()),
    }
}

/// The leaf name of a path.
pub fn basename(path: &str) -> String {
    split(path).1
}

/// Resolve `path` relative to `base`.
pub fn join(base: &str, path: &str) -> String {
    normalize(&format!("{}{}{}", base, SEPARATOR, path))
}

/// Whether `path` is the root.
pub fn is_root(path: &str) -> bool {
    normalize(path) == "/"
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "/",
        "//",
        "a",
        "/a",
        "a/",
        "/a/b/",
        "a//b",
        "./a/./b",
        "/a/../b",
        "../../x",
        "/with space/f.txt",
        "/ünïcödé/ß",
    ];

    #[test]
    fn normalize_is_idempotent() {
        for sample in SAMPLES {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "input {:?}", sample);
        }
    }

    #[test]
    fn normal_form_shape() {
        for sample in SAMPLES {
            let n = normalize(sample);
            assert!(n.starts_with('/'), "{:?}", n);
            assert!(n == "/" || !n.ends_with('/'), "{:?}", n);
            assert!(!n.contains("//"), "{:?}", n);
        }
    }

    #[test]
    fn normalize_examples() {
        assert_eq!(normalize("/a/b/"), "/a/b");
        assert_eq!(normalize("a"), "/a");
        assert_eq!(normalize("/a/../b"), "/b");
        assert_eq!(normalize("../../x"), "/x");
    }

    #[test]
    fn validate_rejects_nul() {
        let err = validate("/a\0b").unwrap_err();
        assert!(matches!(err, FsError::InvalidPath { .. }));
    }

    #[test]
    fn validate_rejects_escape_above_root() {
        assert!(matches!(
            validate("/a/../../b"),
            Err(FsError::InvalidPath { .. })
        ));
        assert_eq!(validate("/a/b/../c").unwrap(), "/a/c");
    }

    #[test]
    fn split_paths() {
        assert_eq!(split("/a/b"), ("/a".to_string(), "b".to_string()));
        assert_eq!(split("/a/"), ("/".to_string(), "a".to_string()));
        assert_eq!(split(""), ("/".to_string(), String::new()));
        assert_eq!(basename("/x/y/z.bin"), "z.bin");
    }

    #[test]
    fn join_paths() {
        assert_eq!(join("/a", "b/c"), "/a/b/c");
        assert_eq!(join("/a", "/b"), "/a/b");
        assert_eq!(join("/", ""), "/");
        assert!(is_root("//"));
        assert!(!is_root("/a"));
    }
}
