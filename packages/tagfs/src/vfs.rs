//! The virtual filesystem contract.
//!
//! [`Filesystem`] is the operation set generic tools program against. Paths
//! are `/`-separated strings relative to the filesystem's root. [`SubFs`]
//! is a view of one directory of another filesystem, as returned by
//! `makedir`.
//!
//! # Object Safety
//!
//! `Filesystem` is object-safe; `makedir` is only callable on sized types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};
use crate::handle::FileHandle;
use crate::info::{Info, RawInfo};
use crate::path;

/// What an open mode asks for, before the `+` modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenKind {
    /// `r`: the file must exist.
    Read,
    /// `w`: create if missing, then truncate.
    Write,
    /// `a`: create if missing, position at the end.
    Append,
    /// `x`: the file must not exist.
    Exclusive,
}

/// A parsed binary open mode such as `"rb"`, `"w+"` or `"xb"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    pub kind: OpenKind,
    /// `+`: open for both reading and writing.
    pub update: bool,
}

impl OpenMode {
    /// Parse a mode string. Text mode (`t`) is rejected, `b` is accepted and
    /// ignored.
    pub fn parse(mode: &str) -> FsResult<Self> {
        let invalid = || FsError::InvalidMode {
            mode: mode.to_string(),
        };

        let mut kind = None;
        let mut update = false;
        for c in mode.chars() {
            let next = match c {
                'r' => OpenKind::Read,
                'w' => OpenKind::Write,
                'a' => OpenKind::Append,
                'x' => OpenKind::Exclusive,
                'b' => continue,
                '+' if !update => {
                    update = true;
                    continue;
                }
                _ => return Err(invalid()),
            };
            if kind.replace(next).is_some() {
                return Err(invalid());
            }
        }

        let kind = kind.ok_or_else(invalid)?;
        Ok(Self { kind, update })
    }

    pub fn reading(&self) -> bool {
        self.kind == OpenKind::Read || self.update
    }

    pub fn writing(&self) -> bool {
        self.kind != OpenKind::Read || self.update
    }

    /// Whether opening may create the file.
    pub fn create(&self) -> bool {
        self.kind != OpenKind::Read
    }

    pub fn truncate(&self) -> bool {
        self.kind == OpenKind::Write
    }

    pub fn exclusive(&self) -> bool {
        self.kind == OpenKind::Exclusive
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self.kind {
            OpenKind::Read => 'r',
            OpenKind::Write => 'w',
            OpenKind::Append => 'a',
            OpenKind::Exclusive => 'x',
        };
        write!(f, "{}b{}", c, if self.update { "+" } else { "" })
    }
}

/// Static capabilities of a filesystem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsMeta {
    pub case_insensitive: bool,
    pub invalid_path_chars: String,
    pub max_path_length: Option<usize>,
    pub max_sys_path_length: Option<usize>,
    pub network: bool,
    pub read_only: bool,
    pub supports_rename: bool,
}

/// Operations every filesystem provides.
pub trait Filesystem: Send + Sync {
    /// Information about the file or directory at `path`.
    fn getinfo(&self, path: &str) -> FsResult<Info>;

    /// Names of the entries directly inside the directory at `path`.
    fn listdir(&self, path: &str) -> FsResult<Vec<String>>;

    /// Create a directory. Its parent must exist. With `recreate`, an
    /// existing directory is not an error.
    fn makedir(&self, path: &str, recreate: bool) -> FsResult<SubFs<'_, Self>>
    where
        Self: Sized;

    /// Open a file in a binary mode (see [`OpenMode::parse`]).
    fn openbin(&self, path: &str, mode: &str) -> FsResult<FileHandle>;

    /// Remove a file.
    fn remove(&self, path: &str) -> FsResult<()>;

    /// Remove an empty directory.
    fn removedir(&self, path: &str) -> FsResult<()>;

    /// Update information about a resource.
    fn setinfo(&self, path: &str, info: &RawInfo) -> FsResult<()>;

    fn meta(&self) -> FsMeta;

    /// Release resources. Later calls fail with [`FsError::Closed`].
    fn close(&self) -> FsResult<()>;

    fn exists(&self, path: &str) -> FsResult<bool> {
        match self.getinfo(path) {
            Ok(_) => Ok(true),
            Err(FsError::ResourceNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn isdir(&self, path: &str) -> FsResult<bool> {
        match self.getinfo(path) {
            Ok(info) => Ok(info.is_dir()),
            Err(FsError::ResourceNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn isfile(&self, path: &str) -> FsResult<bool> {
        match self.getinfo(path) {
            Ok(info) => Ok(info.is_file()),
            Err(FsError::ResourceNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whole content of a file.
    fn readbytes(&self, path: &str) -> FsResult<Vec<u8>> {
        let mut handle = self.openbin(path, "rb")?;
        let data = handle.read(None)?;
        handle.close()?;
        Ok(data)
    }

    /// Replace the content of a file, creating it if needed.
    fn writebytes(&self, path: &str, data: &[u8]) -> FsResult<()> {
        let mut handle = self.openbin(path, "wb")?;
        handle.write(data)?;
        handle.close()
    }
}

/// A view of the directory `base` inside another filesystem.
///
/// Paths passed to a `SubFs` are joined onto `base`. The view's own root
/// cannot be removed through it, and closing it leaves the parent open.
pub struct SubFs<'a, F: ?Sized> {
    fs: &'a F,
    base: String,
}

impl<'a, F: Filesystem + ?Sized> SubFs<'a, F> {
    pub fn new(fs: &'a F, base: &str) -> Self {
        Self {
            fs,
            base: path::normalize(base),
        }
    }

    /// Path of this view's root in the parent filesystem.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn parent(&self) -> &'a F {
        self.fs
    }

    /// Map a path of this view to the parent filesystem. Paths that climb
    /// above the view's root are rejected.
    fn delegate(&self, path: &str) -> FsResult<String> {
        let path = path::validate(path)?;
        Ok(path::join(&self.base, &path))
    }
}

impl<F: ?Sized> fmt::Debug for SubFs<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubFs").field("base", &self.base).finish()
    }
}

impl<F: Filesystem> Filesystem for SubFs<'_, F> {
    fn getinfo(&self, path: &str) -> FsResult<Info> {
        self.fs.getinfo(&self.delegate(path)?)
    }

    fn listdir(&self, path: &str) -> FsResult<Vec<String>> {
        self.fs.listdir(&self.delegate(path)?)
    }

    fn makedir(&self, path: &str, recreate: bool) -> FsResult<SubFs<'_, Self>> {
        let path = path::validate(path)?;
        self.fs.makedir(&self.delegate(&path)?, recreate)?;
        Ok(SubFs::new(self, &path))
    }

    fn openbin(&self, path: &str, mode: &str) -> FsResult<FileHandle> {
        self.fs.openbin(&self.delegate(path)?, mode)
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        self.fs.remove(&self.delegate(path)?)
    }

    fn removedir(&self, path: &str) -> FsResult<()> {
        let target = self.delegate(path)?;
        if target == self.base {
            return Err(FsError::RemoveRoot {
                path: self.base.clone(),
            });
        }
        self.fs.removedir(&target)
    }

    fn setinfo(&self, path: &str, info: &RawInfo) -> FsResult<()> {
        self.fs.setinfo(&self.delegate(path)?, info)
    }

    fn meta(&self) -> FsMeta {
        self.fs.meta()
    }

    fn close(&self) -> FsResult<()> {
        Ok(())
    }
}
