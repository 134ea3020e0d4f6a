//! Adapter-side call sequences.
//!
//! [`Dispatcher`] turns each user-visible action into the fixed sequence of
//! [`Filesystem`] calls the contract promises backends. It does no protocol
//! marshaling and keeps no handle table: open sessions are returned to the
//! caller as [`OpenFile`] values and passed back on each call.

use std::sync::Arc;
use std::time::SystemTime;

use crate::error::{VfsError, VfsResult};
use crate::ops::{EmptyFs, Filesystem};
use crate::path;
use crate::rename::rename_fallback;
use crate::signal::{Signal, SignalAction};
use crate::types::{DirEntry, FileAttr, OpenMode, Statistics};

/// Reserved child name used to ask whether a directory is writable.
pub const SENTINEL_NAME: &str = "._tsugite_sentinel_";

#[derive(Debug)]
enum SessionState<H> {
    /// Backend-managed session.
    Raw(H),
    /// Whole-file buffer, written back with `write_to` when dirty.
    Buffered { content: Vec<u8>, dirty: bool },
}

/// An open file session.
///
/// Must be handed back to [`Dispatcher::release`] exactly once.
#[derive(Debug)]
pub struct OpenFile<H> {
    path: String,
    mode: OpenMode,
    state: SessionState<H>,
}

impl<H> OpenFile<H> {
    /// Path the session was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Mode the session was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Returns true if the backend supplied a raw handle.
    pub fn is_raw(&self) -> bool {
        matches!(self.state, SessionState::Raw(_))
    }

    /// Returns true if buffered content has not been written back yet.
    pub fn is_dirty(&self) -> bool {
        matches!(self.state, SessionState::Buffered { dirty: true, .. })
    }
}

/// Runs contract call sequences against a backend.
pub struct Dispatcher<F: ?Sized> {
    fs: Arc<F>,
}

impl<F: ?Sized> Clone for Dispatcher<F> {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
        }
    }
}

impl<F: ?Sized> std::fmt::Debug for Dispatcher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Default for Dispatcher<EmptyFs> {
    fn default() -> Self {
        Self::new(Arc::new(EmptyFs))
    }
}

impl<F: Filesystem + ?Sized> Dispatcher<F> {
    /// Dispatch to `fs`.
    pub fn new(fs: Arc<F>) -> Self {
        Self { fs }
    }

    /// The backend.
    pub fn filesystem(&self) -> &Arc<F> {
        &self.fs
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Mount notification.
    pub fn mount(&self) {
        tracing::debug!("mounting backend");
        self.fs.mounted();
    }

    /// Teardown notification.
    pub fn unmount(&self) {
        tracing::debug!("unmounting backend");
        self.fs.unmounted();
    }

    /// Deliver a signal. The caller begins unmounting on
    /// [`SignalAction::Unmount`].
    pub fn signal(&self, signal: Signal) -> SignalAction {
        let action = self.fs.signals().dispatch(signal);
        tracing::debug!(%signal, ?action, "signal delivered");
        action
    }

    // ========================================================================
    // Stat & listing
    // ========================================================================

    /// Stat resolution.
    ///
    /// `is_directory` first; `is_file` only when that is false; neither
    /// means not found.
    pub fn getattr(&self, path: &str) -> VfsResult<FileAttr> {
        if self.fs.is_directory(path) {
            let sentinel = path::join(path, SENTINEL_NAME);
            let writable = self.fs.can_write(&sentinel) || self.fs.can_mkdir(&sentinel);
            let times = self.fs.times(path)?;
            tracing::trace!(path, writable, "stat: directory");
            return Ok(FileAttr::directory(writable, times));
        }

        if self.fs.is_file(path) {
            let writable = self.fs.can_write(path);
            let executable = self.fs.is_executable(path);
            let size = self.fs.size(path)?;
            let times = self.fs.times(path)?;
            tracing::trace!(path, size, writable, executable, "stat: file");
            return Ok(FileAttr::file(size, writable, executable, times));
        }

        tracing::trace!(path, "stat: not found");
        Err(VfsError::not_found(path))
    }

    /// List a directory, resolving each entry.
    ///
    /// Entries that no longer resolve by the time they are stat'ed are
    /// skipped.
    pub fn readdir(&self, path: &str) -> VfsResult<Vec<DirEntry>> {
        self.require_directory(path)?;

        let names = self.fs.contents(path)?;
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let child = path::join(path, &name);
            match self.getattr(&child) {
                Ok(attr) => entries.push(DirEntry::new(name, attr)),
                Err(VfsError::NotFound(_)) => {
                    tracing::trace!(path = %child, "listed entry vanished");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(entries)
    }

    // ========================================================================
    // File sessions
    // ========================================================================

    /// Open `path`.
    ///
    /// Write modes require the parent to be a directory and `can_write`.
    /// Tries `raw_open` first; without a raw layer the file is buffered
    /// whole through `read_file` and written back with `write_to`.
    pub fn open(&self, path: &str, mode: OpenMode) -> VfsResult<OpenFile<F::Handle>> {
        if self.fs.is_directory(path) {
            return Err(VfsError::is_a_directory(path));
        }
        let exists = self.fs.is_file(path);

        if mode.is_writable() {
            let (parent, _) = path::parent_and_name(path);
            if !self.fs.is_directory(&parent) {
                return Err(VfsError::not_found(parent));
            }
            if !self.fs.can_write(path) {
                return Err(VfsError::permission_denied(path));
            }
        }
        if !exists && !mode.create {
            return Err(VfsError::not_found(path));
        }

        if let Some(mut handle) = self.fs.raw_open(path, mode, true)? {
            tracing::trace!(path, ?mode, "opened raw session");
            if mode.truncate {
                if let Err(e) = self.truncate_handle(path, 0, &mut handle) {
                    self.close_quietly(path, handle);
                    return Err(e);
                }
            }
            return Ok(OpenFile {
                path: path.to_string(),
                mode,
                state: SessionState::Raw(handle),
            });
        }

        let (content, dirty) = if !exists || mode.truncate {
            (Vec::new(), true)
        } else {
            (self.fs.read_file(path)?, false)
        };
        tracing::debug!(path, len = content.len(), dirty, "opened buffered session");
        Ok(OpenFile {
            path: path.to_string(),
            mode,
            state: SessionState::Buffered { content, dirty },
        })
    }

    /// Create (or open) `path` for writing.
    pub fn create(&self, path: &str) -> VfsResult<OpenFile<F::Handle>> {
        self.open(path, OpenMode::create())
    }

    /// Read up to `len` bytes at `offset`.
    pub fn read(
        &self,
        file: &mut OpenFile<F::Handle>,
        offset: u64,
        len: usize,
    ) -> VfsResult<Vec<u8>> {
        match &mut file.state {
            SessionState::Raw(handle) => self.fs.raw_read(&file.path, offset, len, Some(handle)),
            SessionState::Buffered { content, .. } => {
                let start = usize::try_from(offset).unwrap_or(usize::MAX).min(content.len());
                let end = start.saturating_add(len).min(content.len());
                Ok(content[start..end].to_vec())
            }
        }
    }

    /// Write `data` at `offset` (at the end in append mode). Returns the
    /// number of bytes accepted.
    pub fn write(
        &self,
        file: &mut OpenFile<F::Handle>,
        offset: u64,
        data: &[u8],
    ) -> VfsResult<usize> {
        if !file.mode.is_writable() {
            return Err(VfsError::ReadOnly);
        }
        match &mut file.state {
            SessionState::Raw(handle) => {
                self.fs.raw_write(&file.path, offset, data, Some(handle))?;
            }
            SessionState::Buffered { content, dirty } => {
                let start = if file.mode.append {
                    content.len() as u64
                } else {
                    offset
                };
                let end = u64::try_from(data.len())
                    .ok()
                    .and_then(|n| start.checked_add(n))
                    .ok_or_else(|| VfsError::file_too_large(file.path.clone()))?;
                if end > content.len() as u64 {
                    resize_buffer(content, end, &file.path)?;
                }
                // end fits in content.len(), so both bounds fit in usize
                let (start, end) = (start as usize, end as usize);
                content[start..end].copy_from_slice(data);
                *dirty = true;
            }
        }
        Ok(data.len())
    }

    /// Truncate an open session to `len` bytes.
    pub fn ftruncate(&self, file: &mut OpenFile<F::Handle>, len: u64) -> VfsResult<()> {
        if !file.mode.is_writable() {
            return Err(VfsError::ReadOnly);
        }
        match &mut file.state {
            SessionState::Raw(handle) => self.truncate_handle(&file.path, len, handle),
            SessionState::Buffered { content, dirty } => {
                resize_buffer(content, len, &file.path)?;
                *dirty = true;
                Ok(())
            }
        }
    }

    /// Push pending data to the backend.
    ///
    /// Buffered sessions call `write_to` once if dirty; a failed write
    /// leaves the session dirty.
    pub fn flush(&self, file: &mut OpenFile<F::Handle>) -> VfsResult<()> {
        self.sync(file, false)
    }

    /// Like [`flush`](Self::flush); `data_only` is passed to `raw_sync`.
    pub fn fsync(&self, file: &mut OpenFile<F::Handle>, data_only: bool) -> VfsResult<()> {
        self.sync(file, data_only)
    }

    /// Flush and close. Raw sessions get exactly one `raw_close`, even if
    /// the final sync fails.
    pub fn release(&self, mut file: OpenFile<F::Handle>) -> VfsResult<()> {
        let synced = if file.mode.is_writable() {
            self.sync(&mut file, false)
        } else {
            Ok(())
        };
        let closed = match file.state {
            SessionState::Raw(handle) => self.fs.raw_close(&file.path, Some(handle)),
            SessionState::Buffered { .. } => Ok(()),
        };
        if let Err(e) = &closed {
            tracing::warn!(path = %file.path, error = %e, "raw_close failed on release");
        }
        synced.and(closed)
    }

    fn sync(&self, file: &mut OpenFile<F::Handle>, data_only: bool) -> VfsResult<()> {
        match &mut file.state {
            SessionState::Raw(handle) => self.fs.raw_sync(&file.path, data_only, Some(handle)),
            SessionState::Buffered { content, dirty } => {
                if *dirty {
                    tracing::debug!(path = %file.path, len = content.len(), "writing back buffer");
                    self.fs.write_to(&file.path, content)?;
                    *dirty = false;
                }
                Ok(())
            }
        }
    }

    fn truncate_handle(&self, path: &str, len: u64, handle: &mut F::Handle) -> VfsResult<()> {
        if self.fs.raw_truncate(path, len, Some(handle))? {
            Ok(())
        } else {
            Err(VfsError::unsupported(format!("truncate on raw session: {path}")))
        }
    }

    fn close_quietly(&self, path: &str, handle: F::Handle) {
        if let Err(e) = self.fs.raw_close(path, Some(handle)) {
            tracing::warn!(path, error = %e, "raw_close failed while abandoning session");
        }
    }

    // ========================================================================
    // Path operations
    // ========================================================================

    /// Truncate by path.
    ///
    /// Tries `raw_truncate` without a handle; anything other than `Ok(true)`
    /// falls back to read-modify-write.
    pub fn truncate(&self, path: &str, len: u64) -> VfsResult<()> {
        self.require_file(path)?;
        if !self.fs.can_write(path) {
            return Err(VfsError::permission_denied(path));
        }
        if self.fs.raw_truncate(path, len, None)? {
            return Ok(());
        }

        tracing::debug!(path, len, "truncating by read-modify-write");
        let mut content = self.fs.read_file(path)?;
        resize_buffer(&mut content, len, path)?;
        self.fs.write_to(path, &content)
    }

    /// Delete a file: `is_file`, `can_delete`, `delete`.
    pub fn unlink(&self, path: &str) -> VfsResult<()> {
        self.require_file(path)?;
        if !self.fs.can_delete(path) {
            return Err(VfsError::permission_denied(path));
        }
        self.fs.delete(path)
    }

    /// Create a directory: `can_mkdir`, `mkdir`.
    pub fn mkdir(&self, path: &str) -> VfsResult<()> {
        if !self.fs.can_mkdir(path) {
            return Err(VfsError::permission_denied(path));
        }
        self.fs.mkdir(path)
    }

    /// Remove a directory: `is_directory`, `can_rmdir`, `rmdir`.
    pub fn rmdir(&self, path: &str) -> VfsResult<()> {
        self.require_directory(path)?;
        if !self.fs.can_rmdir(path) {
            return Err(VfsError::permission_denied(path));
        }
        self.fs.rmdir(path)
    }

    /// Native rename, falling back to copy + delete for files.
    pub fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        if self.fs.rename(from, to)? {
            tracing::trace!(from, to, "renamed natively");
            return Ok(());
        }
        rename_fallback(self.fs.as_ref(), from, to)
    }

    /// Explicit modification-time update.
    pub fn utimens(&self, path: &str, mtime: SystemTime) -> VfsResult<()> {
        self.fs.touch(path, mtime)
    }

    /// Filesystem statistics.
    pub fn statfs(&self, path: &str) -> VfsResult<Statistics> {
        self.fs.statistics(path)
    }

    // ========================================================================
    // Extended attributes
    // ========================================================================

    /// Value of attribute `name`.
    pub fn getxattr(&self, path: &str, name: &str) -> VfsResult<Vec<u8>> {
        self.fs
            .xattr(path)
            .get(name)
            .ok_or_else(|| VfsError::no_attribute(name))
    }

    /// Set attribute `name`.
    pub fn setxattr(&self, path: &str, name: &str, value: &[u8]) -> VfsResult<()> {
        self.fs.xattr(path).set(name, value);
        Ok(())
    }

    /// Attribute names.
    pub fn listxattr(&self, path: &str) -> VfsResult<Vec<String>> {
        Ok(self.fs.xattr(path).names())
    }

    /// Remove attribute `name`.
    pub fn removexattr(&self, path: &str, name: &str) -> VfsResult<()> {
        self.fs
            .xattr(path)
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VfsError::no_attribute(name))
    }

    fn require_directory(&self, path: &str) -> VfsResult<()> {
        if self.fs.is_directory(path) {
            Ok(())
        } else if self.fs.is_file(path) {
            Err(VfsError::not_a_directory(path))
        } else {
            Err(VfsError::not_found(path))
        }
    }

    fn require_file(&self, path: &str) -> VfsResult<()> {
        if self.fs.is_file(path) {
            Ok(())
        } else if self.fs.is_directory(path) {
            Err(VfsError::is_a_directory(path))
        } else {
            Err(VfsError::not_found(path))
        }
    }
}

/// Grow or shrink `content` to `len` bytes, zero-filling growth.
///
/// Lengths that do not fit in memory are rejected instead of aborting in the
/// allocator.
fn resize_buffer(content: &mut Vec<u8>, len: u64, path: &str) -> VfsResult<()> {
    let len = usize::try_from(len).map_err(|_| VfsError::file_too_large(path))?;
    if len > content.len() {
        content
            .try_reserve_exact(len - content.len())
            .map_err(|_| VfsError::file_too_large(path))?;
    }
    content.resize(len, 0);
    Ok(())
}
