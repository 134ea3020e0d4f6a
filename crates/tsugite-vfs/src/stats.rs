//! Space and inode accounting for `statistics`.
//!
//! Backends call [`StatsAccounting::adjust`] on every operation that grows
//! or shrinks usage, and build their `statistics` answer from
//! [`StatsAccounting::to_statistics`]. Deltas are applied before the quota
//! check, so a strict-mode failure means "reject or undo the operation",
//! never "retry the adjustment".

use parking_lot::Mutex;

use crate::config::QuotaConfig;
use crate::error::{VfsError, VfsResult};
use crate::types::Statistics;

/// Raw counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Sum of all space deltas applied so far.
    pub space: i64,
    /// Sum of all node deltas applied so far.
    pub nodes: i64,
}

#[derive(Debug, Default)]
struct Counters {
    usage: Usage,
    limits: QuotaConfig,
}

impl Counters {
    fn over_quota(&self) -> bool {
        exceeds(self.usage.space, self.limits.max_space)
            || exceeds(self.usage.nodes, self.limits.max_nodes)
    }
}

fn exceeds(used: i64, max: Option<u64>) -> bool {
    match max {
        Some(max) => used > 0 && used as u64 > max,
        None => false,
    }
}

fn clamp(used: i64) -> u64 {
    u64::try_from(used).unwrap_or(0)
}

/// Used space and inode counters with optional quota enforcement.
///
/// Safe to share between threads; every mutation is serialized by an
/// internal lock.
#[derive(Debug, Default)]
pub struct StatsAccounting {
    counters: Mutex<Counters>,
}

impl StatsAccounting {
    /// Unbounded, lenient accounting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounting with the given limits.
    pub fn with_config(limits: QuotaConfig) -> Self {
        Self {
            counters: Mutex::new(Counters {
                usage: Usage::default(),
                limits,
            }),
        }
    }

    /// Apply `delta_space` bytes and `delta_nodes` inodes.
    ///
    /// The deltas land unless either sum would overflow, in which case
    /// neither counter changes. In strict mode this then fails with
    /// [`VfsError::QuotaExceeded`] if either count is above its maximum.
    pub fn adjust(&self, delta_space: i64, delta_nodes: i64) -> VfsResult<()> {
        let mut counters = self.counters.lock();
        let (Some(space), Some(nodes)) = (
            counters.usage.space.checked_add(delta_space),
            counters.usage.nodes.checked_add(delta_nodes),
        ) else {
            tracing::warn!(delta_space, delta_nodes, "usage counter overflow");
            return Err(VfsError::other(format!(
                "usage counter overflow applying ({delta_space}, {delta_nodes})"
            )));
        };
        counters.usage = Usage { space, nodes };

        if counters.limits.strict && counters.over_quota() {
            let (usage, limits) = (counters.usage, counters.limits);
            tracing::warn!(
                space = usage.space,
                nodes = usage.nodes,
                max_space = ?limits.max_space,
                max_nodes = ?limits.max_nodes,
                "quota exceeded"
            );
            return Err(VfsError::QuotaExceeded {
                space: usage.space,
                max_space: limits.max_space,
                nodes: usage.nodes,
                max_nodes: limits.max_nodes,
            });
        }
        Ok(())
    }

    /// Statistics tuple for the `statistics` operation.
    ///
    /// With `free_*` given, the total is `used + free`, so free stays
    /// constant as usage moves. Without it, the total is the configured
    /// maximum (0 when unbounded).
    pub fn to_statistics(&self, free_space: Option<u64>, free_nodes: Option<u64>) -> Statistics {
        let counters = self.counters.lock();
        let used_space = clamp(counters.usage.space);
        let used_nodes = clamp(counters.usage.nodes);
        let total = |used: u64, free: Option<u64>, max: Option<u64>| match free {
            Some(free) => used.saturating_add(free),
            None => max.unwrap_or(0),
        };
        Statistics {
            used_space,
            used_nodes,
            total_space: total(used_space, free_space, counters.limits.max_space),
            total_nodes: total(used_nodes, free_nodes, counters.limits.max_nodes),
        }
    }

    /// Current counters.
    pub fn usage(&self) -> Usage {
        self.counters.lock().usage
    }

    /// Current limits.
    pub fn limits(&self) -> QuotaConfig {
        self.counters.lock().limits
    }

    /// Replace the limits. Usage is kept; nothing is re-checked until the
    /// next `adjust`.
    pub fn set_limits(&self, limits: QuotaConfig) {
        self.counters.lock().limits = limits;
    }
}
