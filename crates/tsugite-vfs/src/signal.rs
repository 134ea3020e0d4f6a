//! Signal handler registration.
//!
//! A backend opts into a signal by registering a handler in a
//! [`SignalTable`] when it is constructed. Interrupt and terminate fall back
//! to unmounting when no handler is registered; every other unhandled
//! signal is ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use strum::{AsRefStr, Display, EnumString};

/// Operating signals a backend may handle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Signal {
    /// Hangup, conventionally "reload".
    Hup,
    /// Interrupt.
    Int,
    /// Quit.
    Quit,
    /// Terminate.
    Term,
    /// User-defined 1.
    Usr1,
    /// User-defined 2.
    Usr2,
}

impl Signal {
    /// Conventional handler name, e.g. `sighup`.
    pub fn handler_name(&self) -> String {
        format!("sig{self}")
    }

    /// Parse either `hup` or `sighup` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let bare = lower.strip_prefix("sig").unwrap_or(lower.as_str());
        bare.parse().ok()
    }

    /// Signals that unmount the filesystem when the backend has no handler.
    pub fn unmounts_by_default(&self) -> bool {
        matches!(self, Signal::Int | Signal::Term)
    }
}

/// What the adapter should do after delivering a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// A backend handler ran.
    Handled,
    /// No handler; begin unmounting.
    Unmount,
    /// No handler; nothing to do.
    Ignored,
}

type Handler = Arc<dyn Fn() + Send + Sync>;

/// Optional signal handlers, keyed by signal.
#[derive(Clone, Default)]
pub struct SignalTable {
    handlers: BTreeMap<Signal, Handler>,
}

static EMPTY: SignalTable = SignalTable::new();

impl fmt::Debug for SignalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalTable")
            .field("signals", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SignalTable {
    /// A table with no handlers.
    pub const fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Shared empty table, returned by backends that handle nothing.
    pub fn empty() -> &'static SignalTable {
        &EMPTY
    }

    /// Register `handler` for `signal`, replacing any earlier one.
    pub fn on(mut self, signal: Signal, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers.insert(signal, Arc::new(handler));
        self
    }

    /// Returns true if a handler is registered for `signal`.
    pub fn handles(&self, signal: Signal) -> bool {
        self.handlers.contains_key(&signal)
    }

    /// Registered signals in order.
    pub fn signals(&self) -> impl Iterator<Item = Signal> + '_ {
        self.handlers.keys().copied()
    }

    /// Run the handler for `signal`, or report the default action.
    pub fn dispatch(&self, signal: Signal) -> SignalAction {
        match self.handlers.get(&signal) {
            Some(handler) => {
                tracing::debug!(handler = %signal.handler_name(), "delivering signal");
                handler();
                SignalAction::Handled
            }
            None if signal.unmounts_by_default() => SignalAction::Unmount,
            None => SignalAction::Ignored,
        }
    }
}
