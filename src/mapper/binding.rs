//! A single display property <-> model attribute binding.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::converter::Converter;
use crate::display::{DisplayEndpoint, DisplayProperty, EndpointId};
use crate::error::{Direction, MapperError, MapperResult};
use crate::model::{Model, ModelAccessor};
use crate::signal::{Signal, SubscriptionToken};

/// Registry key: display endpoint plus property name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey {
    endpoint: EndpointId,
    property: String,
}

impl BindingKey {
    /// Build a key.
    pub fn new(endpoint: EndpointId, property: impl Into<String>) -> Self {
        Self {
            endpoint,
            property: property.into(),
        }
    }

    /// Display endpoint part.
    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }

    /// Property name part.
    pub fn property(&self) -> &str {
        &self.property
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.endpoint, self.property)
    }
}

/// What a binding is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationState {
    /// Nothing in flight.
    Idle,
    /// A display edit is being written to the model.
    PropagatingFromView,
    /// A model value is being written to the display.
    PropagatingFromModel,
}

/// Raises a suppression flag for the lifetime of the guard.
///
/// Clearing on drop covers the error return and the unwinding path alike.
struct Suppression<'a>(&'a AtomicBool);

impl<'a> Suppression<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for Suppression<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct Binding {
    pub(super) key: BindingKey,
    pub(super) seq: u64,
    pub(super) display: Arc<dyn DisplayEndpoint>,
    pub(super) property: Arc<dyn DisplayProperty>,
    pub(super) display_notifier: Signal,
    pub(super) display_token: SubscriptionToken,
    pub(super) model: Arc<dyn Model>,
    pub(super) accessor: ModelAccessor,
    pub(super) model_notifier: Option<(Signal, SubscriptionToken)>,
    pub(super) converter: Option<Arc<dyn Converter>>,
    /// Set while this binding writes the display; display notifications are echoes.
    pub(super) display_suppressed: AtomicBool,
    /// Set while this binding writes the model; model notifications may be echoes.
    pub(super) model_suppressed: AtomicBool,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("kind", &self.display.kind().tag())
            .field("model", &self.model.model_name())
            .field("state", &self.state())
            .finish()
    }
}

impl Binding {
    pub(crate) fn key(&self) -> &BindingKey {
        &self.key
    }

    pub(crate) fn state(&self) -> PropagationState {
        if self.display_suppressed.load(Ordering::SeqCst) {
            PropagationState::PropagatingFromModel
        } else if self.model_suppressed.load(Ordering::SeqCst) {
            PropagationState::PropagatingFromView
        } else {
            PropagationState::Idle
        }
    }

    pub(crate) fn has_model_setter(&self) -> bool {
        self.accessor.is_writable()
    }

    pub(crate) fn is_display_suppressed(&self) -> bool {
        self.display_suppressed.load(Ordering::SeqCst)
    }

    fn to_model(&self, value: Value) -> Value {
        match &self.converter {
            Some(c) => c.to_model(value),
            None => value,
        }
    }

    fn to_view(&self, value: Value) -> Value {
        match &self.converter {
            Some(c) => c.to_view(value),
            None => value,
        }
    }

    fn fail(&self, direction: Direction) -> impl FnOnce(anyhow::Error) -> MapperError + '_ {
        move |err| MapperError::propagation(&self.key, direction, err)
    }

    /// Write the displayed value into the model.
    pub(crate) fn push_to_model(&self) -> MapperResult<()> {
        let setter = self
            .accessor
            .setter()
            .ok_or_else(|| MapperError::ModelReadOnly(self.key.clone()))?;

        let _suppressed = Suppression::raise(&self.model_suppressed);
        let shown = self.property.get().map_err(self.fail(Direction::ToModel))?;
        let value = self.to_model(shown);
        tracing::trace!(binding = %self.key, model = self.model.model_name(), %value, "view -> model");
        setter(value).map_err(self.fail(Direction::ToModel))
    }

    /// Write the model value into the display, unless it is the echo of an
    /// in-flight view -> model update or the display already shows it.
    pub(crate) fn pull_from_model(&self) -> MapperResult<()> {
        let fresh = self.accessor.get().map_err(self.fail(Direction::ToView))?;

        if self.model_suppressed.load(Ordering::SeqCst) {
            let shown = self.property.get().map_err(self.fail(Direction::ToView))?;
            if self.to_model(shown) == fresh {
                tracing::trace!(binding = %self.key, "Echo of view update swallowed");
                return Ok(());
            }
        }

        let value = self.to_view(fresh);
        let shown = self.property.get().map_err(self.fail(Direction::ToView))?;
        if shown == value {
            return Ok(());
        }

        let _suppressed = Suppression::raise(&self.display_suppressed);
        tracing::trace!(binding = %self.key, model = self.model.model_name(), %value, "model -> view");
        self.property.set(value).map_err(self.fail(Direction::ToView))
    }

    /// Disconnect both notifiers.
    pub(crate) fn release(&self) {
        self.display_notifier.unsubscribe(self.display_token);
        if let Some((signal, token)) = &self.model_notifier {
            signal.unsubscribe(*token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let id = EndpointId::new();
        let key = BindingKey::new(id, "value");
        assert_eq!(key.to_string(), format!("{id}.value"));
        assert_eq!(key.property(), "value");
        assert_eq!(key.endpoint(), id);
    }

    #[test]
    fn test_suppression_cleared_on_unwind() {
        let flag = AtomicBool::new(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _s = Suppression::raise(&flag);
            assert!(flag.load(Ordering::SeqCst));
            panic!("setter blew up");
        }));
        assert!(result.is_err());
        assert!(!flag.load(Ordering::SeqCst));
    }
}
