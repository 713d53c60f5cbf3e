//! Model-side adapters.
//!
//! The engine itself only needs a [`ModelAccessor`]: a getter and an optional
//! setter. This module also provides the name-resolution layer on top of it,
//! so a GUI module can bind to a logic module by attribute name, the way
//! instrument GUIs usually refer to logic state:
//!
//! ```rust,ignore
//! let setpoint = PropertyCell::new("setpoint", json!(3.0));
//! let logic = Arc::new(ModelObject::new("laser_logic").with_cell(&setpoint));
//!
//! mapper.add_binding(
//!     BindingRequest::new(spin.clone(), logic.clone(), "setpoint")
//!         .model_notifier("setpoint_changed"),
//! )?;
//! ```
//!
//! # Resolution rules
//!
//! | value source      | attribute kind | getter          | setter                        |
//! |-------------------|----------------|-----------------|-------------------------------|
//! | accessor          | -              | accessor.get    | explicit, else accessor.set   |
//! | name              | `Property`     | property.get    | explicit, else property.set   |
//! | name              | `Method`       | `method()`      | explicit only                 |
//! | name              | anything else  | `NotCallable`   |                               |
//!
//! A named setter must be a `Method` (called with the value as its single
//! argument). A named notifier must be a `Signal`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{MapperError, MapperResult};
use crate::signal::Signal;

/// Reads the model value.
pub type Getter = Arc<dyn Fn() -> Result<Value> + Send + Sync>;
/// Writes the model value.
pub type Setter = Arc<dyn Fn(Value) -> Result<()> + Send + Sync>;
/// Model method taking positional arguments.
pub type Callable = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Getter plus optional setter for one model attribute.
#[derive(Clone)]
pub struct ModelAccessor {
    get: Getter,
    set: Option<Setter>,
}

impl fmt::Debug for ModelAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAccessor")
            .field("writable", &self.set.is_some())
            .finish()
    }
}

impl ModelAccessor {
    /// Read-only accessor.
    pub fn new(get: impl Fn() -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            get: Arc::new(get),
            set: None,
        }
    }

    /// Attach a setter.
    pub fn with_setter(mut self, set: impl Fn(Value) -> Result<()> + Send + Sync + 'static) -> Self {
        self.set = Some(Arc::new(set));
        self
    }

    pub(crate) fn with_shared_setter(mut self, set: Option<Setter>) -> Self {
        if set.is_some() {
            self.set = set;
        }
        self
    }

    /// Read the model value.
    pub fn get(&self) -> Result<Value> {
        (self.get)()
    }

    /// The setter, if any.
    pub fn setter(&self) -> Option<&Setter> {
        self.set.as_ref()
    }

    /// Whether a setter is attached.
    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }
}

/// One named attribute of a [`Model`].
#[derive(Clone)]
pub enum ModelAttribute {
    /// Getter/setter pair.
    Property(ModelAccessor),
    /// Callable method.
    Method(Callable),
    /// Plain, non-callable value.
    Value(Value),
    /// Change-notification signal.
    Signal(Signal),
}

impl ModelAttribute {
    fn kind_name(&self) -> &'static str {
        match self {
            ModelAttribute::Property(_) => "property",
            ModelAttribute::Method(_) => "method",
            ModelAttribute::Value(_) => "value",
            ModelAttribute::Signal(_) => "signal",
        }
    }
}

impl fmt::Debug for ModelAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

/// A domain object whose attributes can be bound by name.
pub trait Model: Send + Sync {
    /// Name used in error messages.
    fn model_name(&self) -> &str;

    /// Look up an attribute.
    fn attribute(&self, name: &str) -> Option<ModelAttribute>;
}

/// Where a binding reads the model value from.
#[derive(Clone)]
pub enum ModelSource {
    /// Explicit accessor pair.
    Accessor(ModelAccessor),
    /// Attribute name resolved against the model.
    Named(String),
}

impl From<ModelAccessor> for ModelSource {
    fn from(accessor: ModelAccessor) -> Self {
        ModelSource::Accessor(accessor)
    }
}

impl From<&str> for ModelSource {
    fn from(name: &str) -> Self {
        ModelSource::Named(name.to_string())
    }
}

impl From<String> for ModelSource {
    fn from(name: String) -> Self {
        ModelSource::Named(name)
    }
}

/// Explicit model setter for a binding.
#[derive(Clone)]
pub enum SetterSource {
    /// Setter closure.
    Setter(Setter),
    /// Name of a model method.
    Named(String),
}

impl SetterSource {
    /// Wrap a closure.
    pub fn from_fn(set: impl Fn(Value) -> Result<()> + Send + Sync + 'static) -> Self {
        SetterSource::Setter(Arc::new(set))
    }
}

impl From<&str> for SetterSource {
    fn from(name: &str) -> Self {
        SetterSource::Named(name.to_string())
    }
}

impl From<String> for SetterSource {
    fn from(name: String) -> Self {
        SetterSource::Named(name)
    }
}

impl From<Setter> for SetterSource {
    fn from(set: Setter) -> Self {
        SetterSource::Setter(set)
    }
}

/// Model-side change notification for a binding.
#[derive(Clone)]
pub enum NotifierSource {
    /// Signal handle.
    Signal(Signal),
    /// Name of a model signal.
    Named(String),
}

impl From<Signal> for NotifierSource {
    fn from(signal: Signal) -> Self {
        NotifierSource::Signal(signal)
    }
}

impl From<&Signal> for NotifierSource {
    fn from(signal: &Signal) -> Self {
        NotifierSource::Signal(signal.clone())
    }
}

impl From<&str> for NotifierSource {
    fn from(name: &str) -> Self {
        NotifierSource::Named(name.to_string())
    }
}

impl From<String> for NotifierSource {
    fn from(name: String) -> Self {
        NotifierSource::Named(name)
    }
}

fn missing(model: &dyn Model, attribute: &str) -> MapperError {
    MapperError::AttributeMissing {
        model: model.model_name().to_string(),
        attribute: attribute.to_string(),
    }
}

fn not_callable(model: &dyn Model, attribute: &str) -> MapperError {
    MapperError::NotCallable {
        model: model.model_name().to_string(),
        attribute: attribute.to_string(),
    }
}

fn resolve_setter(model: &dyn Model, source: SetterSource) -> MapperResult<Setter> {
    match source {
        SetterSource::Setter(set) => Ok(set),
        SetterSource::Named(name) => match model.attribute(&name) {
            None => Err(missing(model, &name)),
            Some(ModelAttribute::Method(method)) => {
                Ok(Arc::new(move |value: Value| method(&[value]).map(drop)))
            }
            Some(_) => Err(not_callable(model, &name)),
        },
    }
}

/// Build the accessor a binding uses. An explicit setter always wins over the
/// one implied by the value source.
pub(crate) fn resolve_accessor(
    model: &dyn Model,
    source: ModelSource,
    setter: Option<SetterSource>,
) -> MapperResult<ModelAccessor> {
    let explicit = setter.map(|s| resolve_setter(model, s)).transpose()?;

    let accessor = match source {
        ModelSource::Accessor(accessor) => accessor,
        ModelSource::Named(name) => match model.attribute(&name) {
            None => return Err(missing(model, &name)),
            Some(ModelAttribute::Property(accessor)) => accessor,
            Some(ModelAttribute::Method(method)) => ModelAccessor::new(move || method(&[])),
            Some(_) => return Err(not_callable(model, &name)),
        },
    };

    Ok(accessor.with_shared_setter(explicit))
}

pub(crate) fn resolve_notifier(model: &dyn Model, source: NotifierSource) -> MapperResult<Signal> {
    match source {
        NotifierSource::Signal(signal) => Ok(signal),
        NotifierSource::Named(name) => match model.attribute(&name) {
            None => Err(missing(model, &name)),
            Some(ModelAttribute::Signal(signal)) => Ok(signal),
            Some(_) => Err(MapperError::NoNotifier {
                owner: format!("model '{}'", model.model_name()),
                name,
            }),
        },
    }
}

// =============================================================================
// PropertyCell - observable model value
// =============================================================================

/// Shared model value with a change signal.
///
/// `set` stores the value and emits `changed` when it differs from the
/// previous one, from whatever thread calls it. Clones share state.
#[derive(Clone)]
pub struct PropertyCell {
    name: Arc<str>,
    value: Arc<RwLock<Value>>,
    changed: Signal,
}

impl fmt::Debug for PropertyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCell")
            .field("name", &self.name)
            .field("value", &*self.value.read())
            .finish()
    }
}

impl PropertyCell {
    /// Create a cell with an initial value.
    pub fn new(name: &str, initial: Value) -> Self {
        Self {
            name: Arc::from(name),
            value: Arc::new(RwLock::new(initial)),
            changed: Signal::new(format!("{name}_changed")),
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn get(&self) -> Value {
        self.value.read().clone()
    }

    /// Store a value, notifying subscribers if it changed.
    pub fn set(&self, value: Value) -> Result<()> {
        if self.replace(value) {
            self.changed.emit()?;
        }
        Ok(())
    }

    /// Store a value without notifying anyone.
    pub fn set_silently(&self, value: Value) {
        self.replace(value);
    }

    fn replace(&self, value: Value) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        true
    }

    /// The change signal.
    pub fn changed(&self) -> &Signal {
        &self.changed
    }

    /// Accessor reading and writing this cell.
    pub fn accessor(&self) -> ModelAccessor {
        let reader = self.clone();
        let writer = self.clone();
        ModelAccessor::new(move || Ok(reader.get())).with_setter(move |v| writer.set(v))
    }
}

// =============================================================================
// ModelObject - attribute map
// =============================================================================

/// [`Model`] backed by a fixed attribute map.
///
/// ```rust,ignore
/// let model = ModelObject::new("stage_logic")
///     .with_cell(&position)                      // "position" + "position_changed"
///     .with_method("home", |_| Ok(json!(null)))
///     .with_value("axis_count", json!(3));
/// ```
pub struct ModelObject {
    name: String,
    attributes: HashMap<String, ModelAttribute>,
}

impl fmt::Debug for ModelObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ModelObject")
            .field("name", &self.name)
            .field("attributes", &names)
            .finish()
    }
}

impl ModelObject {
    /// Empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: ModelAttribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Add a property.
    pub fn with_property(self, name: impl Into<String>, accessor: ModelAccessor) -> Self {
        self.with_attribute(name, ModelAttribute::Property(accessor))
    }

    /// Add a method.
    pub fn with_method(
        self,
        name: impl Into<String>,
        method: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.with_attribute(name, ModelAttribute::Method(Arc::new(method)))
    }

    /// Add a plain value.
    pub fn with_value(self, name: impl Into<String>, value: Value) -> Self {
        self.with_attribute(name, ModelAttribute::Value(value))
    }

    /// Add a signal.
    pub fn with_signal(self, name: impl Into<String>, signal: Signal) -> Self {
        self.with_attribute(name, ModelAttribute::Signal(signal))
    }

    /// Add a cell as property `<name>` and signal `<name>_changed`.
    pub fn with_cell(self, cell: &PropertyCell) -> Self {
        let name = cell.name().to_string();
        self.with_property(name.clone(), cell.accessor())
            .with_signal(format!("{name}_changed"), cell.changed().clone())
    }
}

impl Model for ModelObject {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<ModelAttribute> {
        self.attributes.get(name).cloned()
    }
}
