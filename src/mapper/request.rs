//! Arguments of `Mapper::add_binding`.

use std::sync::Arc;

use crate::converter::Converter;
use crate::display::DisplayEndpoint;
use crate::model::{Model, ModelSource, NotifierSource, SetterSource};
use crate::signal::Signal;

/// Description of a binding to create.
///
/// Only the display, the model and the model value source are required.
///
/// # Example
///
/// ```rust,ignore
/// mapper.add_binding(
///     BindingRequest::new(spin.clone(), logic.clone(), "position")
///         .model_notifier("position_changed")
///         .converter(ScaleConverter::scale(1000.0)),
/// )?;
/// ```
pub struct BindingRequest {
    pub(super) display: Arc<dyn DisplayEndpoint>,
    pub(super) model: Arc<dyn Model>,
    pub(super) source: ModelSource,
    pub(super) model_notifier: Option<NotifierSource>,
    pub(super) model_setter: Option<SetterSource>,
    pub(super) display_property: Option<String>,
    pub(super) display_notifier: Option<Signal>,
    pub(super) converter: Option<Arc<dyn Converter>>,
}

impl BindingRequest {
    /// Bind `display` to the value `source` of `model`.
    pub fn new(
        display: Arc<dyn DisplayEndpoint>,
        model: Arc<dyn Model>,
        source: impl Into<ModelSource>,
    ) -> Self {
        Self {
            display,
            model,
            source: source.into(),
            model_notifier: None,
            model_setter: None,
            display_property: None,
            display_notifier: None,
            converter: None,
        }
    }

    /// Model signal announcing changes. Without one, model changes are only
    /// shown on `revert()`.
    pub fn model_notifier(mut self, notifier: impl Into<NotifierSource>) -> Self {
        self.model_notifier = Some(notifier.into());
        self
    }

    /// Setter used instead of the one implied by the value source.
    pub fn model_setter(mut self, setter: impl Into<SetterSource>) -> Self {
        self.model_setter = Some(setter.into());
        self
    }

    /// Display property to bind. Inferred from the endpoint kind if unset or empty.
    pub fn display_property(mut self, name: impl Into<String>) -> Self {
        self.display_property = Some(name.into());
        self
    }

    /// Display signal to listen on instead of the property's own notifier,
    /// e.g. an "editing finished" signal.
    pub fn display_notifier(mut self, signal: Signal) -> Self {
        self.display_notifier = Some(signal);
        self
    }

    /// Converter applied at the boundary.
    pub fn converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Shared converter applied at the boundary.
    pub fn shared_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }
}
