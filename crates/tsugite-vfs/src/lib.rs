//! # tsugite-vfs
//!
//! The joint between a userspace filesystem protocol adapter and the
//! backend that supplies directory and file semantics.
//!
//! - [`Filesystem`] - capability contract; every operation has a default
//! - [`Dispatcher`] - the fixed call sequences an adapter runs per action
//! - [`rename_fallback`] - copy + delete when a backend declines rename
//! - [`path`] - first-segment splitting for hierarchical backends
//! - [`StatsAccounting`] - used/free space and inodes, with strict quotas
//!
//! ## Design Decisions
//!
//! - **Predicates, not errors**: "not implemented" is `false` / empty /
//!   `None`, and the dispatcher picks a fallback. Errors mean failure.
//! - **Backend-chosen handles**: raw sessions use an associated type;
//!   [`Erased`] boxes it as [`AnyHandle`] for uniform storage.
//! - **Synchronous**: each call completes before the adapter proceeds.

mod config;
mod dispatch;
mod error;
mod handle;
mod ops;
pub mod path;
mod rename;
mod signal;
mod stats;
mod types;
mod xattr;

pub use config::QuotaConfig;
pub use dispatch::{Dispatcher, OpenFile, SENTINEL_NAME};
pub use error::{VfsError, VfsResult};
pub use handle::{AnyHandle, DynFilesystem, Erased, erase};
pub use ops::{EmptyFs, Filesystem};
pub use path::PathComponents;
pub use rename::rename_fallback;
pub use signal::{Signal, SignalAction, SignalTable};
pub use stats::{StatsAccounting, Usage};
pub use types::{DirEntry, FileAttr, FileTimes, FileType, OpenMode, Statistics};
pub use xattr::Xattrs;
