//! Copy + delete rename for backends without native rename.
//!
//! Only files are moved this way. Every permission check runs before the
//! first mutating call, so a refused rename leaves both paths untouched.

use crate::error::{VfsError, VfsResult};
use crate::ops::Filesystem;

/// Rename `from` to `to` by copying the content and deleting the source.
///
/// Checks, in order: `is_file(from)`, `can_write(to)`, `can_delete(from)`.
/// Then `read_file(from)`, `write_to(to, ..)`, `delete(from)`.
///
/// A failed `is_file` is followed by one `is_directory(from)` to choose
/// between `Unsupported` and `NotFound`; nothing else runs.
pub fn rename_fallback<F>(fs: &F, from: &str, to: &str) -> VfsResult<()>
where
    F: Filesystem + ?Sized,
{
    if !fs.is_file(from) {
        return Err(if fs.is_directory(from) {
            VfsError::unsupported(format!("directory rename without backend support: {from}"))
        } else {
            VfsError::not_found(from)
        });
    }
    if !fs.can_write(to) {
        return Err(VfsError::permission_denied(to));
    }
    if !fs.can_delete(from) {
        return Err(VfsError::permission_denied(from));
    }

    tracing::debug!(from, to, "renaming by copy");
    let content = fs.read_file(from)?;
    fs.write_to(to, &content)?;
    fs.delete(from)
}
