//! Backend capability contract.
//!
//! Every operation has a default, and a backend that overrides none of them
//! is a valid, empty, read-only filesystem. "Not implemented" is reported
//! structurally (`false`, empty, `None`, `Ok(false)`) and the dispatcher
//! falls back to another strategy; errors are reserved for real failures.
//!
//! Paths are absolute, slash-separated and rooted at `/`.
//!
//! The adapter calls these in fixed sequences (see [`Dispatcher`]): a stat
//! asks `is_directory` first and only asks `is_file` when that is false, a
//! listing only follows a confirmed directory, and so on. Backends may rely
//! on that ordering.
//!
//! [`Dispatcher`]: crate::Dispatcher

use std::time::SystemTime;

use crate::error::VfsResult;
use crate::signal::SignalTable;
use crate::types::{FileTimes, OpenMode, Statistics};
use crate::xattr::Xattrs;

/// Capability interface a backend implements.
///
/// Must be safe to call concurrently for different paths. Backends holding
/// shared counters or persisted attribute maps serialize mutation
/// themselves.
pub trait Filesystem: Send + Sync {
    /// Raw session token returned by [`raw_open`](Self::raw_open).
    ///
    /// Backends without a raw layer use `()`.
    type Handle: Send + 'static;

    // ========================================================================
    // Stat
    // ========================================================================

    /// Checked before any other metadata call.
    fn is_directory(&self, path: &str) -> bool {
        let _ = path;
        false
    }

    /// Only asked when `is_directory` is false.
    fn is_file(&self, path: &str) -> bool {
        let _ = path;
        false
    }

    /// Entry names of a known directory. The adapter stats each one.
    fn contents(&self, path: &str) -> VfsResult<Vec<String>> {
        let _ = path;
        Ok(Vec::new())
    }

    /// Whether a known file is executable.
    fn is_executable(&self, path: &str) -> bool {
        let _ = path;
        false
    }

    /// Size of a known file.
    ///
    /// Defaults to the length of [`read_file`](Self::read_file), so a
    /// backend overriding only `read_file` still reports correct sizes.
    fn size(&self, path: &str) -> VfsResult<u64> {
        Ok(self.read_file(path)?.len() as u64)
    }

    /// Access, modification and change times.
    fn times(&self, path: &str) -> VfsResult<FileTimes> {
        let _ = path;
        Ok(FileTimes::default())
    }

    // ========================================================================
    // Whole-file content
    // ========================================================================

    /// Full content of a known file.
    fn read_file(&self, path: &str) -> VfsResult<Vec<u8>> {
        let _ = path;
        Ok(Vec::new())
    }

    /// Gates write-opens, creates and the rename-by-copy target.
    fn can_write(&self, path: &str) -> bool {
        let _ = path;
        false
    }

    /// Replace the whole content of `path`.
    ///
    /// Called once per flush of a buffered session, never per byte range.
    fn write_to(&self, path: &str, content: &[u8]) -> VfsResult<()> {
        let _ = (path, content);
        Ok(())
    }

    // ========================================================================
    // Namespace
    // ========================================================================

    /// Whether `path` may be deleted.
    fn can_delete(&self, path: &str) -> bool {
        let _ = path;
        false
    }

    /// Delete a file.
    fn delete(&self, path: &str) -> VfsResult<()> {
        let _ = path;
        Ok(())
    }

    /// Whether a directory may be created at `path`.
    ///
    /// Also checked with a reserved child name to decide whether an existing
    /// directory is writable.
    fn can_mkdir(&self, path: &str) -> bool {
        let _ = path;
        false
    }

    /// Create a directory.
    fn mkdir(&self, path: &str) -> VfsResult<()> {
        let _ = path;
        Ok(())
    }

    /// Whether the directory at `path` may be removed.
    fn can_rmdir(&self, path: &str) -> bool {
        let _ = path;
        false
    }

    /// Remove a directory.
    fn rmdir(&self, path: &str) -> VfsResult<()> {
        let _ = path;
        Ok(())
    }

    /// Explicit modification-time update.
    fn touch(&self, path: &str, modtime: SystemTime) -> VfsResult<()> {
        let _ = (path, modtime);
        Ok(())
    }

    /// Native rename. `Ok(false)` declines and the adapter falls back to
    /// copy + delete for files.
    fn rename(&self, from: &str, to: &str) -> VfsResult<bool> {
        let _ = (from, to);
        Ok(false)
    }

    // ========================================================================
    // Raw sessions
    // ========================================================================

    /// Open a raw session. `None` means there is no raw layer and the
    /// adapter uses whole-file `read_file` / `write_to` instead.
    ///
    /// `extensions` reports whether the adapter can pass handle-bound calls
    /// (it always can through the dispatcher).
    fn raw_open(
        &self,
        path: &str,
        mode: OpenMode,
        extensions: bool,
    ) -> VfsResult<Option<Self::Handle>> {
        let _ = (path, mode, extensions);
        Ok(None)
    }

    /// Truncate to `len` bytes. `Ok(true)` means handled.
    ///
    /// Without a handle, any other result makes the adapter truncate by
    /// read-modify-write through `read_file` / `write_to`.
    fn raw_truncate(
        &self,
        path: &str,
        len: u64,
        handle: Option<&mut Self::Handle>,
    ) -> VfsResult<bool> {
        let _ = (path, len, handle);
        Ok(false)
    }

    /// Up to `len` bytes starting at `offset`; shorter at end of file.
    fn raw_read(
        &self,
        path: &str,
        offset: u64,
        len: usize,
        handle: Option<&mut Self::Handle>,
    ) -> VfsResult<Vec<u8>> {
        let _ = (path, offset, len, handle);
        Ok(Vec::new())
    }

    /// Write `buf` at `offset`.
    fn raw_write(
        &self,
        path: &str,
        offset: u64,
        buf: &[u8],
        handle: Option<&mut Self::Handle>,
    ) -> VfsResult<()> {
        let _ = (path, offset, buf, handle);
        Ok(())
    }

    /// Flush a session. `data_only` skips metadata.
    fn raw_sync(
        &self,
        path: &str,
        data_only: bool,
        handle: Option<&mut Self::Handle>,
    ) -> VfsResult<()> {
        let _ = (path, data_only, handle);
        Ok(())
    }

    /// End a session. Called exactly once per successful open.
    fn raw_close(&self, path: &str, handle: Option<Self::Handle>) -> VfsResult<()> {
        let _ = (path, handle);
        Ok(())
    }

    // ========================================================================
    // Metadata & lifecycle
    // ========================================================================

    /// Extended attributes of `path`, mutated in place by the adapter.
    ///
    /// The default is a fresh map each call, so writes are discarded. Return
    /// a clone of a stored [`Xattrs`] to persist them.
    fn xattr(&self, path: &str) -> Xattrs {
        let _ = path;
        Xattrs::new()
    }

    /// `(used_space, used_nodes, total_space, total_nodes)`; see
    /// [`StatsAccounting`](crate::StatsAccounting).
    fn statistics(&self, path: &str) -> VfsResult<Statistics> {
        let _ = path;
        Ok(Statistics::default())
    }

    /// Called once when the filesystem is mounted.
    fn mounted(&self) {}

    /// Called once at teardown.
    fn unmounted(&self) {}

    /// Signal handlers registered by the backend.
    fn signals(&self) -> &SignalTable {
        SignalTable::empty()
    }
}

/// Backend that overrides nothing.
///
/// Used when no custom backend is supplied: an empty, read-only,
/// unbounded filesystem where even `/` reports as neither file nor directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFs;

impl Filesystem for EmptyFs {
    type Handle = ();
}
