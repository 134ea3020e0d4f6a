//! Core VFS value types.
//!
//! These are the shapes that cross the boundary between the adapter and a
//! backend. They carry no behavior beyond small constructors.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Node kind as observed by stat resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Access, modification and change times for a path.
///
/// The default is all three at the Unix epoch, which is what a backend
/// that does not track times reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTimes {
    /// Last access time.
    pub atime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last status change time.
    pub ctime: SystemTime,
}

impl Default for FileTimes {
    fn default() -> Self {
        Self::uniform(SystemTime::UNIX_EPOCH)
    }
}

impl FileTimes {
    /// All three times set to `at`.
    pub fn uniform(at: SystemTime) -> Self {
        Self {
            atime: at,
            mtime: at,
            ctime: at,
        }
    }

    /// All three times set to now.
    pub fn now() -> Self {
        Self::uniform(SystemTime::now())
    }
}

/// File attributes produced by stat resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttr {
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permission bits derived from the backend's predicates.
    pub perm: u32,
    /// Timestamps reported by the backend.
    pub times: FileTimes,
    /// Number of hard links.
    pub nlink: u32,
}

impl FileAttr {
    /// Attributes for a file. `writable` and `executable` come from
    /// `can_write` and `is_executable`.
    pub fn file(size: u64, writable: bool, executable: bool, times: FileTimes) -> Self {
        let mut perm = if writable { 0o666 } else { 0o444 };
        if executable {
            perm |= 0o111;
        }
        Self {
            size,
            kind: FileType::File,
            perm,
            times,
            nlink: 1,
        }
    }

    /// Attributes for a directory. `writable` is the result of the
    /// sentinel-name permission check.
    pub fn directory(writable: bool, times: FileTimes) -> Self {
        Self {
            size: 0,
            kind: FileType::Directory,
            perm: if writable { 0o777 } else { 0o555 },
            times,
            nlink: 2, // . and ..
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Returns true if any write bit is set.
    pub fn is_writable(&self) -> bool {
        self.perm & 0o222 != 0
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Attributes resolved for the entry.
    pub attr: FileAttr,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, attr: FileAttr) -> Self {
        Self {
            name: name.into(),
            attr,
        }
    }
}

/// Filesystem statistics in the fixed
/// `(used_space, used_nodes, total_space, total_nodes)` order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Bytes in use.
    pub used_space: u64,
    /// Inodes in use.
    pub used_nodes: u64,
    /// Total bytes (0 when unbounded or unknown).
    pub total_space: u64,
    /// Total inodes (0 when unbounded or unknown).
    pub total_nodes: u64,
}

impl Statistics {
    /// Free bytes, never negative.
    pub fn free_space(&self) -> u64 {
        self.total_space.saturating_sub(self.used_space)
    }

    /// Free inodes, never negative.
    pub fn free_nodes(&self) -> u64 {
        self.total_nodes.saturating_sub(self.used_nodes)
    }
}

impl From<Statistics> for (u64, u64, u64, u64) {
    fn from(s: Statistics) -> Self {
        (s.used_space, s.used_nodes, s.total_space, s.total_nodes)
    }
}

impl From<(u64, u64, u64, u64)> for Statistics {
    fn from((used_space, used_nodes, total_space, total_nodes): (u64, u64, u64, u64)) -> Self {
        Self {
            used_space,
            used_nodes,
            total_space,
            total_nodes,
        }
    }
}

/// Mode flags passed to `raw_open` and to dispatcher opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    /// Read access requested.
    pub read: bool,
    /// Write access requested.
    pub write: bool,
    /// Append mode.
    pub append: bool,
    /// Create if not exists.
    pub create: bool,
    /// Truncate on open.
    pub truncate: bool,
}

impl Default for OpenMode {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            create: false,
            truncate: false,
        }
    }
}

impl OpenMode {
    /// Read-only access.
    pub fn read() -> Self {
        Self::default()
    }

    /// Write access (also enables read).
    pub fn write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }

    /// Write without read.
    pub fn write_only() -> Self {
        Self {
            read: false,
            write: true,
            ..Default::default()
        }
    }

    /// Append to the end of the existing content.
    pub fn append() -> Self {
        Self {
            read: true,
            write: true,
            append: true,
            ..Default::default()
        }
    }

    /// Create with write access.
    pub fn create() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            ..Default::default()
        }
    }

    /// Write access, discarding existing content.
    pub fn truncate() -> Self {
        Self {
            read: true,
            write: true,
            truncate: true,
            ..Default::default()
        }
    }

    /// Returns true if the session may mutate the file.
    pub fn is_writable(&self) -> bool {
        self.write || self.append || self.create || self.truncate
    }
}
