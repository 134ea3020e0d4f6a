//! Shared fixtures for integration tests.
//!
//! - [`TreeFs`] - an in-memory tree that walks paths segment by segment with
//!   `path::split`, charges usage to `StatsAccounting`, and persists xattrs.
//! - [`Recording`] - wraps any backend and logs every contract call.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;
use tsugite_vfs::path;
use tsugite_vfs::{
    FileTimes, Filesystem, OpenMode, QuotaConfig, SignalTable, Statistics, StatsAccounting,
    VfsError, VfsResult, Xattrs,
};

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tsugite_vfs=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// TreeFs
// ============================================================================

#[derive(Debug, Clone)]
enum Node {
    Dir(BTreeMap<String, Node>),
    File {
        data: Vec<u8>,
        executable: bool,
        mtime: SystemTime,
    },
}

fn lookup<'a>(node: &'a Node, path: &str) -> Option<&'a Node> {
    match path::split(path).into_parts() {
        (None, _) => Some(node),
        (Some(first), rest) => match node {
            Node::Dir(children) => lookup(children.get(first)?, rest.as_deref().unwrap_or("")),
            Node::File { .. } => None,
        },
    }
}

fn lookup_mut<'a>(node: &'a mut Node, path: &str) -> Option<&'a mut Node> {
    match path::split(path).into_parts() {
        (None, _) => Some(node),
        (Some(first), rest) => match node {
            Node::Dir(children) => {
                lookup_mut(children.get_mut(first)?, rest.as_deref().unwrap_or(""))
            }
            Node::File { .. } => None,
        },
    }
}

/// In-memory tree backend without a raw layer.
pub struct TreeFs {
    root: Mutex<Node>,
    stats: StatsAccounting,
    xattrs: Mutex<HashMap<String, Xattrs>>,
    locked: Mutex<HashSet<String>>,
    lifecycle: Mutex<Vec<&'static str>>,
    native_rename: bool,
    signals: SignalTable,
}

impl Default for TreeFs {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeFs {
    /// Empty root, unbounded accounting.
    pub fn new() -> Self {
        Self::with_quota(QuotaConfig::unbounded())
    }

    /// Empty root with the given limits.
    pub fn with_quota(quota: QuotaConfig) -> Self {
        Self {
            root: Mutex::new(Node::Dir(BTreeMap::new())),
            stats: StatsAccounting::with_config(quota),
            xattrs: Mutex::new(HashMap::new()),
            locked: Mutex::new(HashSet::new()),
            lifecycle: Mutex::new(Vec::new()),
            native_rename: false,
            signals: SignalTable::new(),
        }
    }

    /// Handle `rename` natively instead of declining.
    pub fn with_native_rename(mut self) -> Self {
        self.native_rename = true;
        self
    }

    /// Register signal handlers.
    pub fn with_signals(mut self, signals: SignalTable) -> Self {
        self.signals = signals;
        self
    }

    /// Refuse every `can_*` predicate at `path`.
    pub fn lock(&self, path: &str) {
        self.locked.lock().insert(path::normalize(path));
    }

    /// Seed a file, creating parent directories.
    pub fn add_file(&self, path: &str, data: &[u8]) {
        let (parent, _) = path::parent_and_name(path);
        self.add_dir(&parent);
        self.write_to(path, data).expect("seed file");
    }

    /// Seed a directory and its parents.
    pub fn add_dir(&self, path: &str) {
        let mut current = String::from("/");
        for segment in path::scan(path) {
            current = path::join(&current, segment);
            if !self.is_directory(&current) {
                Filesystem::mkdir(self, &current).expect("seed dir");
            }
        }
    }

    /// Mark a seeded file executable.
    pub fn set_executable(&self, path: &str) {
        if let Some(Node::File { executable, .. }) = lookup_mut(&mut self.root.lock(), path) {
            *executable = true;
        }
    }

    /// Current content of a file, if it exists.
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        match lookup(&self.root.lock(), path) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// The accounting helper.
    pub fn stats(&self) -> &StatsAccounting {
        &self.stats
    }

    /// Lifecycle notifications received so far.
    pub fn lifecycle(&self) -> Vec<&'static str> {
        self.lifecycle.lock().clone()
    }

    fn allowed(&self, path: &str) -> bool {
        !self.locked.lock().contains(&path::normalize(path))
    }

    fn parent_is_dir(&self, path: &str) -> bool {
        let (parent, name) = path::parent_and_name(path);
        name.is_some() && self.is_directory(&parent)
    }

    /// Apply a usage delta, undoing it if strict accounting refuses.
    ///
    /// Other failures never applied the delta, so there is nothing to undo.
    fn charge(&self, space: i64, nodes: i64) -> VfsResult<()> {
        match self.stats.adjust(space, nodes) {
            Err(e) if e.is_quota_exceeded() => {
                let _ = self.stats.adjust(-space, -nodes);
                Err(e)
            }
            other => other,
        }
    }

    fn with_parent<T>(
        &self,
        path: &str,
        f: impl FnOnce(&mut BTreeMap<String, Node>, &str) -> VfsResult<T>,
    ) -> VfsResult<T> {
        let (parent, name) = path::parent_and_name(path);
        let name = name.ok_or_else(|| VfsError::invalid_path(path))?;
        let mut root = self.root.lock();
        match lookup_mut(&mut root, &parent) {
            Some(Node::Dir(children)) => f(children, name),
            Some(Node::File { .. }) => Err(VfsError::not_a_directory(parent)),
            None => Err(VfsError::not_found(parent)),
        }
    }
}

impl Filesystem for TreeFs {
    type Handle = ();

    fn is_directory(&self, path: &str) -> bool {
        matches!(lookup(&self.root.lock(), path), Some(Node::Dir(_)))
    }

    fn is_file(&self, path: &str) -> bool {
        matches!(lookup(&self.root.lock(), path), Some(Node::File { .. }))
    }

    fn contents(&self, path: &str) -> VfsResult<Vec<String>> {
        match lookup(&self.root.lock(), path) {
            Some(Node::Dir(children)) => Ok(children.keys().cloned().collect()),
            Some(Node::File { .. }) => Err(VfsError::not_a_directory(path)),
            None => Err(VfsError::not_found(path)),
        }
    }

    fn is_executable(&self, path: &str) -> bool {
        matches!(
            lookup(&self.root.lock(), path),
            Some(Node::File { executable: true, .. })
        )
    }

    fn size(&self, path: &str) -> VfsResult<u64> {
        match lookup(&self.root.lock(), path) {
            Some(Node::File { data, .. }) => Ok(data.len() as u64),
            _ => Err(VfsError::not_found(path)),
        }
    }

    fn times(&self, path: &str) -> VfsResult<FileTimes> {
        match lookup(&self.root.lock(), path) {
            Some(Node::File { mtime, .. }) => Ok(FileTimes::uniform(*mtime)),
            Some(Node::Dir(_)) => Ok(FileTimes::default()),
            None => Err(VfsError::not_found(path)),
        }
    }

    fn read_file(&self, path: &str) -> VfsResult<Vec<u8>> {
        self.content(path).ok_or_else(|| VfsError::not_found(path))
    }

    fn can_write(&self, path: &str) -> bool {
        self.allowed(path) && self.parent_is_dir(path) && !self.is_directory(path)
    }

    fn write_to(&self, path: &str, content: &[u8]) -> VfsResult<()> {
        self.with_parent(path, |children, name| {
            let (space, nodes, executable) = match children.get(name) {
                Some(Node::File { data, executable, .. }) => {
                    (content.len() as i64 - data.len() as i64, 0, *executable)
                }
                Some(Node::Dir(_)) => return Err(VfsError::is_a_directory(path)),
                None => (content.len() as i64, 1, false),
            };
            self.charge(space, nodes)?;
            children.insert(
                name.to_string(),
                Node::File {
                    data: content.to_vec(),
                    executable,
                    mtime: SystemTime::now(),
                },
            );
            Ok(())
        })
    }

    fn can_delete(&self, path: &str) -> bool {
        self.allowed(path) && self.is_file(path)
    }

    fn delete(&self, path: &str) -> VfsResult<()> {
        self.with_parent(path, |children, name| match children.get(name) {
            Some(Node::File { data, .. }) => {
                let len = data.len() as i64;
                children.remove(name);
                self.charge(-len, -1)
            }
            Some(Node::Dir(_)) => Err(VfsError::is_a_directory(path)),
            None => Err(VfsError::not_found(path)),
        })
    }

    fn can_mkdir(&self, path: &str) -> bool {
        self.allowed(path)
            && self.parent_is_dir(path)
            && lookup(&self.root.lock(), path).is_none()
    }

    fn mkdir(&self, path: &str) -> VfsResult<()> {
        self.with_parent(path, |children, name| {
            if children.contains_key(name) {
                return Err(VfsError::already_exists(path));
            }
            self.charge(0, 1)?;
            children.insert(name.to_string(), Node::Dir(BTreeMap::new()));
            Ok(())
        })
    }

    fn can_rmdir(&self, path: &str) -> bool {
        self.allowed(path) && path::split(path).first.is_some() && self.is_directory(path)
    }

    fn rmdir(&self, path: &str) -> VfsResult<()> {
        self.with_parent(path, |children, name| match children.get(name) {
            Some(Node::Dir(entries)) if !entries.is_empty() => {
                Err(VfsError::directory_not_empty(path))
            }
            Some(Node::Dir(_)) => {
                children.remove(name);
                self.charge(0, -1)
            }
            Some(Node::File { .. }) => Err(VfsError::not_a_directory(path)),
            None => Err(VfsError::not_found(path)),
        })
    }

    fn touch(&self, path: &str, modtime: SystemTime) -> VfsResult<()> {
        match lookup_mut(&mut self.root.lock(), path) {
            Some(Node::File { mtime, .. }) => {
                *mtime = modtime;
                Ok(())
            }
            Some(Node::Dir(_)) => Ok(()),
            None => Err(VfsError::not_found(path)),
        }
    }

    fn rename(&self, from: &str, to: &str) -> VfsResult<bool> {
        if !self.native_rename {
            return Ok(false);
        }
        let node = self.with_parent(from, |children, name| {
            children.remove(name).ok_or_else(|| VfsError::not_found(from))
        })?;
        self.with_parent(to, |children, name| {
            children.insert(name.to_string(), node);
            Ok(true)
        })
    }

    fn xattr(&self, path: &str) -> Xattrs {
        self.xattrs
            .lock()
            .entry(path::normalize(path))
            .or_default()
            .clone()
    }

    fn statistics(&self, _path: &str) -> VfsResult<Statistics> {
        Ok(self.stats.to_statistics(None, None))
    }

    fn mounted(&self) {
        self.lifecycle.lock().push("mounted");
    }

    fn unmounted(&self) {
        self.lifecycle.lock().push("unmounted");
    }

    fn signals(&self) -> &SignalTable {
        &self.signals
    }
}

// ============================================================================
// Recording
// ============================================================================

/// Logs every contract call as `"<op> <path>"` before delegating.
pub struct Recording<F> {
    inner: F,
    calls: Mutex<Vec<String>>,
}

impl<F> Recording<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Operation names only, in order.
    pub fn ops(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|c| c.split(' ').next().unwrap_or_default().to_string())
            .collect()
    }

    /// How many times `op` was called.
    pub fn count(&self, op: &str) -> usize {
        self.ops().iter().filter(|o| *o == op).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn log(&self, op: &str, path: &str) {
        self.calls.lock().push(format!("{op} {path}"));
    }
}

impl<F: Filesystem> Filesystem for Recording<F> {
    type Handle = F::Handle;

    fn is_directory(&self, path: &str) -> bool {
        self.log("is_directory", path);
        self.inner.is_directory(path)
    }

    fn is_file(&self, path: &str) -> bool {
        self.log("is_file", path);
        self.inner.is_file(path)
    }

    fn contents(&self, path: &str) -> VfsResult<Vec<String>> {
        self.log("contents", path);
        self.inner.contents(path)
    }

    fn is_executable(&self, path: &str) -> bool {
        self.log("is_executable", path);
        self.inner.is_executable(path)
    }

    fn size(&self, path: &str) -> VfsResult<u64> {
        self.log("size", path);
        self.inner.size(path)
    }

    fn times(&self, path: &str) -> VfsResult<FileTimes> {
        self.log("times", path);
        self.inner.times(path)
    }

    fn read_file(&self, path: &str) -> VfsResult<Vec<u8>> {
        self.log("read_file", path);
        self.inner.read_file(path)
    }

    fn can_write(&self, path: &str) -> bool {
        self.log("can_write", path);
        self.inner.can_write(path)
    }

    fn write_to(&self, path: &str, content: &[u8]) -> VfsResult<()> {
        self.log("write_to", path);
        self.inner.write_to(path, content)
    }

    fn can_delete(&self, path: &str) -> bool {
        self.log("can_delete", path);
        self.inner.can_delete(path)
    }

    fn delete(&self, path: &str) -> VfsResult<()> {
        self.log("delete", path);
        self.inner.delete(path)
    }

    fn can_mkdir(&self, path: &str) -> bool {
        self.log("can_mkdir", path);
        self.inner.can_mkdir(path)
    }

    fn mkdir(&self, path: &str) -> VfsResult<()> {
        self.log("mkdir", path);
        self.inner.mkdir(path)
    }

    fn can_rmdir(&self, path: &str) -> bool {
        self.log("can_rmdir", path);
        self.inner.can_rmdir(path)
    }

    fn rmdir(&self, path: &str) -> VfsResult<()> {
        self.log("rmdir", path);
        self.inner.rmdir(path)
    }

    fn touch(&self, path: &str, modtime: SystemTime) -> VfsResult<()> {
        self.log("touch", path);
        self.inner.touch(path, modtime)
    }

    fn rename(&self, from: &str, to: &str) -> VfsResult<bool> {
        self.log("rename", from);
        self.inner.rename(from, to)
    }

    fn raw_open(
        &self,
        path: &str,
        mode: OpenMode,
        extensions: bool,
    ) -> VfsResult<Option<F::Handle>> {
        self.log("raw_open", path);
        self.inner.raw_open(path, mode, extensions)
    }

    fn raw_truncate(
        &self,
        path: &str,
        len: u64,
        handle: Option<&mut F::Handle>,
    ) -> VfsResult<bool> {
        self.log("raw_truncate", path);
        self.inner.raw_truncate(path, len, handle)
    }

    fn raw_read(
        &self,
        path: &str,
        offset: u64,
        len: usize,
        handle: Option<&mut F::Handle>,
    ) -> VfsResult<Vec<u8>> {
        self.log("raw_read", path);
        self.inner.raw_read(path, offset, len, handle)
    }

    fn raw_write(
        &self,
        path: &str,
        offset: u64,
        buf: &[u8],
        handle: Option<&mut F::Handle>,
    ) -> VfsResult<()> {
        self.log("raw_write", path);
        self.inner.raw_write(path, offset, buf, handle)
    }

    fn raw_sync(
        &self,
        path: &str,
        data_only: bool,
        handle: Option<&mut F::Handle>,
    ) -> VfsResult<()> {
        self.log("raw_sync", path);
        self.inner.raw_sync(path, data_only, handle)
    }

    fn raw_close(&self, path: &str, handle: Option<F::Handle>) -> VfsResult<()> {
        self.log("raw_close", path);
        self.inner.raw_close(path, handle)
    }

    fn xattr(&self, path: &str) -> Xattrs {
        self.log("xattr", path);
        self.inner.xattr(path)
    }

    fn statistics(&self, path: &str) -> VfsResult<Statistics> {
        self.log("statistics", path);
        self.inner.statistics(path)
    }

    fn mounted(&self) {
        self.log("mounted", "/");
        self.inner.mounted()
    }

    fn unmounted(&self) {
        self.log("unmounted", "/");
        self.inner.unmounted()
    }

    fn signals(&self) -> &SignalTable {
        self.inner.signals()
    }
}
