//! Change-notification sources.
//!
//! A [`Signal`] is the notifier half of both binding endpoints: display
//! properties emit one when the user edits a value, models emit one when an
//! attribute changes (possibly from an instrument polling thread).
//!
//! Handlers run synchronously on the emitting thread, in subscription order.
//! The handler list is snapshotted before dispatch, so a handler may subscribe
//! or unsubscribe (including itself) while the signal is being emitted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

/// Callback attached to a [`Signal`].
pub type Handler = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Token returned by [`Signal::subscribe`], used to disconnect the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

struct SignalInner {
    name: String,
    next_token: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionToken, Handler)>>,
}

/// Thread-safe, cloneable notification source.
///
/// Clones share the same handler list.
#[derive(Clone)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl Signal {
    /// Create a signal with no handlers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                name: name.into(),
                next_token: AtomicU64::new(1),
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Signal name, used in log and error messages.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Connect a handler.
    pub fn subscribe(&self, handler: impl Fn() -> Result<()> + Send + Sync + 'static) -> SubscriptionToken {
        let token = SubscriptionToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        self.inner.handlers.lock().push((token, Arc::new(handler)));
        token
    }

    /// Disconnect a handler. Returns `false` if the token was not connected.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut handlers = self.inner.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        handlers.len() != before
    }

    /// Number of connected handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }

    /// Whether both values refer to the same underlying signal.
    pub fn same_as(&self, other: &Signal) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Call every connected handler.
    ///
    /// All handlers run even if one fails; the first error is returned and
    /// later ones are logged.
    pub fn emit(&self) -> Result<()> {
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .lock()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        let mut first_error = None;
        for handler in handlers {
            if let Err(err) = handler() {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::warn!(signal = %self.inner.name, error = %err, "Additional handler failure");
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
