//! Owning execution context.
//!
//! Display endpoints may only be touched from one context (the GUI thread).
//! Model notifications can arrive from anywhere, e.g. an instrument polling
//! task, so their display updates are marshalled onto the owning context
//! through a task queue.
//!
//! # Architecture
//!
//! ```text
//! instrument thread ──post(task)──► mpsc queue ──► ContextLoop (GUI thread)
//!                                                    └─ runs task with token entered
//! ```
//!
//! Identity is explicit: each context has a [`ContextToken`], and a thread is
//! "on" the context while a [`ContextGuard`] from [`ContextLoop::enter`] is
//! alive or while the loop is running one of its tasks.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: Cell<Option<ContextToken>> = const { Cell::new(None) };
}

/// Identity of an owning execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextToken(u64);

impl ContextToken {
    /// Token of the context the calling thread is currently on, if any.
    pub fn current() -> Option<ContextToken> {
        CURRENT.with(Cell::get)
    }
}

/// Unit of work queued onto the owning context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Constructor for a context handle/loop pair.
pub struct OwningContext;

impl OwningContext {
    /// Create a new context.
    ///
    /// The handle is cloned into whatever needs to post work; the loop is run
    /// by the thread that owns the display.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(name: &str) -> (ContextHandle, ContextLoop) {
        let token = ContextToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed));
        let name: Arc<str> = Arc::from(name);
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ContextHandle {
                token,
                name: name.clone(),
                tx,
            },
            ContextLoop { token, name, rx },
        )
    }
}

/// Cloneable handle used to post work onto the owning context.
#[derive(Clone)]
pub struct ContextHandle {
    token: ContextToken,
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Task>,
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("name", &self.name)
            .field("token", &self.token)
            .finish()
    }
}

impl ContextHandle {
    /// Token of this context.
    pub fn token(&self) -> ContextToken {
        self.token
    }

    /// Context name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the calling thread is on this context.
    pub fn is_current(&self) -> bool {
        ContextToken::current() == Some(self.token)
    }

    /// Queue a task without running it, even when already on the context.
    ///
    /// Returns `false` if the loop has been dropped.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        if self.tx.send(Box::new(task)).is_err() {
            tracing::warn!(context = %self.name, "Context loop is gone, dropping task");
            return false;
        }
        true
    }
}

/// Restores the previous context of the thread when dropped.
///
/// Not `Send`: the guard belongs to the thread that entered.
pub struct ContextGuard {
    previous: Option<ContextToken>,
    _not_send: PhantomData<*const ()>,
}

impl ContextGuard {
    fn enter(token: ContextToken) -> Self {
        let previous = CURRENT.with(|c| c.replace(Some(token)));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT.with(|c| c.set(self.previous));
    }
}

/// Receiving end of the context queue.
pub struct ContextLoop {
    token: ContextToken,
    name: Arc<str>,
    rx: mpsc::UnboundedReceiver<Task>,
}

impl fmt::Debug for ContextLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextLoop")
            .field("name", &self.name)
            .field("token", &self.token)
            .finish()
    }
}

impl ContextLoop {
    /// Token of this context.
    pub fn token(&self) -> ContextToken {
        self.token
    }

    /// Mark the calling thread as being on this context until the guard drops.
    pub fn enter(&self) -> ContextGuard {
        ContextGuard::enter(self.token)
    }

    fn execute(&self, task: Task) {
        let _guard = ContextGuard::enter(self.token);
        task();
    }

    /// Run every queued task without waiting. Returns how many ran.
    ///
    /// Tasks queued by the tasks themselves are run in the same call.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            self.execute(task);
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(context = %self.name, ran, "Drained context queue");
        }
        ran
    }

    /// Wait for one task and run it. Returns `false` once every handle is gone
    /// and the queue is empty.
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                self.execute(task);
                true
            }
            None => false,
        }
    }

    /// Run tasks until every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!(context = %self.name, "Context loop started");
        while self.next().await {}
        tracing::debug!(context = %self.name, "Context loop finished");
    }
}
