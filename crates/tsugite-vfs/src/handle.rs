//! Type-erased raw handles.
//!
//! Each backend picks its own `Filesystem::Handle`. An adapter that stores
//! sessions from arbitrary backends wraps the backend in [`Erased`], whose
//! handle type is the uniform [`AnyHandle`], and works with
//! [`DynFilesystem`] trait objects.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::{VfsError, VfsResult};
use crate::ops::Filesystem;
use crate::signal::SignalTable;
use crate::types::{FileTimes, OpenMode, Statistics};
use crate::xattr::Xattrs;

/// Opaque boxed raw handle.
pub struct AnyHandle(Box<dyn Any + Send>);

impl fmt::Debug for AnyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyHandle").field(&"<opaque>").finish()
    }
}

impl AnyHandle {
    /// Box a concrete handle.
    pub fn new<H: Send + 'static>(handle: H) -> Self {
        Self(Box::new(handle))
    }

    /// Borrow as `H`, if that is the boxed type.
    pub fn downcast_ref<H: 'static>(&self) -> Option<&H> {
        self.0.downcast_ref()
    }

    /// Mutably borrow as `H`, if that is the boxed type.
    pub fn downcast_mut<H: 'static>(&mut self) -> Option<&mut H> {
        self.0.downcast_mut()
    }

    /// Unbox as `H`, handing the box back on a type mismatch.
    pub fn into_inner<H: 'static>(self) -> Result<H, AnyHandle> {
        self.0.downcast().map(|b| *b).map_err(AnyHandle)
    }
}

/// A backend behind a uniform handle type.
pub type DynFilesystem = dyn Filesystem<Handle = AnyHandle>;

/// Erase `fs` into a shareable trait object.
pub fn erase<F: Filesystem + 'static>(fs: F) -> Arc<DynFilesystem> {
    Arc::new(Erased(fs))
}

/// Adapter from a concrete backend to [`DynFilesystem`].
#[derive(Debug)]
pub struct Erased<F>(pub F);

fn mismatch() -> VfsError {
    VfsError::other("raw handle belongs to a different backend")
}

fn concrete<H: 'static>(handle: Option<&mut AnyHandle>) -> VfsResult<Option<&mut H>> {
    match handle {
        Some(h) => h.downcast_mut::<H>().map(Some).ok_or_else(mismatch),
        None => Ok(None),
    }
}

impl<F: Filesystem> Filesystem for Erased<F> {
    type Handle = AnyHandle;

    fn is_directory(&self, path: &str) -> bool {
        self.0.is_directory(path)
    }

    fn is_file(&self, path: &str) -> bool {
        self.0.is_file(path)
    }

    fn contents(&self, path: &str) -> VfsResult<Vec<String>> {
        self.0.contents(path)
    }

    fn is_executable(&self, path: &str) -> bool {
        self.0.is_executable(path)
    }

    fn size(&self, path: &str) -> VfsResult<u64> {
        self.0.size(path)
    }

    fn times(&self, path: &str) -> VfsResult<FileTimes> {
        self.0.times(path)
    }

    fn read_file(&self, path: &str) -> VfsResult<Vec<u8>> {
        self.0.read_file(path)
    }

    fn can_write(&self, path: &str) -> bool {
        self.0.can_write(path)
    }

    fn write_to(&self, path: &str, content: &[u8]) -> VfsResult<()> {
        self.0.write_to(path, content)
    }

    fn can_delete(&self, path: &str) -> bool {
        self.0.can_delete(path)
    }

    fn delete(&self, path: &str) -> VfsResult<()> {
        self.0.delete(path)
    }

    fn can_mkdir(&self, path: &str) -> bool {
        self.0.can_mkdir(path)
    }

    fn mkdir(&self, path: &str) -> VfsResult<()> {
        self.0.mkdir(path)
    }

    fn can_rmdir(&self, path: &str) -> bool {
        self.0.can_rmdir(path)
    }

    fn rmdir(&self, path: &str) -> VfsResult<()> {
        self.0.rmdir(path)
    }

    fn touch(&self, path: &str, modtime: SystemTime) -> VfsResult<()> {
        self.0.touch(path, modtime)
    }

    fn rename(&self, from: &str, to: &str) -> VfsResult<bool> {
        self.0.rename(from, to)
    }

    fn raw_open(
        &self,
        path: &str,
        mode: OpenMode,
        extensions: bool,
    ) -> VfsResult<Option<AnyHandle>> {
        Ok(self.0.raw_open(path, mode, extensions)?.map(AnyHandle::new))
    }

    fn raw_truncate(
        &self,
        path: &str,
        len: u64,
        handle: Option<&mut AnyHandle>,
    ) -> VfsResult<bool> {
        self.0.raw_truncate(path, len, concrete::<F::Handle>(handle)?)
    }

    fn raw_read(
        &self,
        path: &str,
        offset: u64,
        len: usize,
        handle: Option<&mut AnyHandle>,
    ) -> VfsResult<Vec<u8>> {
        self.0.raw_read(path, offset, len, concrete::<F::Handle>(handle)?)
    }

    fn raw_write(
        &self,
        path: &str,
        offset: u64,
        buf: &[u8],
        handle: Option<&mut AnyHandle>,
    ) -> VfsResult<()> {
        self.0.raw_write(path, offset, buf, concrete::<F::Handle>(handle)?)
    }

    fn raw_sync(
        &self,
        path: &str,
        data_only: bool,
        handle: Option<&mut AnyHandle>,
    ) -> VfsResult<()> {
        self.0.raw_sync(path, data_only, concrete::<F::Handle>(handle)?)
    }

    fn raw_close(&self, path: &str, handle: Option<AnyHandle>) -> VfsResult<()> {
        let handle = match handle {
            Some(h) => Some(h.into_inner::<F::Handle>().map_err(|_| mismatch())?),
            None => None,
        };
        self.0.raw_close(path, handle)
    }

    fn xattr(&self, path: &str) -> Xattrs {
        self.0.xattr(path)
    }

    fn statistics(&self, path: &str) -> VfsResult<Statistics> {
        self.0.statistics(path)
    }

    fn mounted(&self) {
        self.0.mounted()
    }

    fn unmounted(&self) {
        self.0.unmounted()
    }

    fn signals(&self) -> &SignalTable {
        self.0.signals()
    }
}
