//! Display endpoint adapters.
//!
//! Every bindable display element implements [`DisplayEndpoint`]: it reports a
//! stable identity, a kind tag used to infer the default property, and hands
//! out [`DisplayProperty`] adapters by name. The binding engine never probes
//! widgets at runtime; whatever a property can do is stated by its adapter.
//!
//! [`HeadlessWidget`] is a toolkit-free implementation used by tests, the demo
//! binary and applications that drive the mapper without a GUI.

mod headless;
mod kind;

pub use headless::{HeadlessProperty, HeadlessWidget};
pub use kind::{EndpointKind, EndpointKindTable};

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::signal::Signal;

/// Stable identity of a display endpoint, part of every binding key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointId(Uuid);

impl EndpointId {
    /// Allocate a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EndpointId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accessor for one named property of a display endpoint.
///
/// `get` and `set` are only called from the owning execution context.
pub trait DisplayProperty: Send + Sync {
    /// Whether `get` may be called.
    fn is_readable(&self) -> bool {
        true
    }

    /// Whether `set` may be called.
    fn is_writable(&self) -> bool {
        true
    }

    /// Read the displayed value.
    fn get(&self) -> Result<Value>;

    /// Write the displayed value.
    ///
    /// Implementations emit their notifier when the value changes, like a
    /// toolkit's `valueChanged` does.
    fn set(&self, value: Value) -> Result<()>;

    /// Change notification for this property, if it has one.
    fn notifier(&self) -> Option<Signal>;
}

/// A display element that can take part in bindings.
pub trait DisplayEndpoint: Send + Sync {
    /// Identity used in binding keys.
    fn endpoint_id(&self) -> EndpointId;

    /// Capability tag for default-property inference.
    fn kind(&self) -> EndpointKind;

    /// Look up a property adapter by name.
    fn property(&self, name: &str) -> Option<Arc<dyn DisplayProperty>>;
}
