//! Toolkit-free display endpoint.
//!
//! `HeadlessWidget` holds its property values in memory and emits a
//! `<property>-changed` signal whenever one of them changes, whether by a
//! programmatic `set` or by a simulated user [`edit`](HeadlessWidget::edit).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use serde_json::{json, Value};

use crate::display::{DisplayEndpoint, DisplayProperty, EndpointId, EndpointKind};
use crate::signal::Signal;

/// In-memory property of a [`HeadlessWidget`].
pub struct HeadlessProperty {
    name: String,
    value: RwLock<Value>,
    readable: bool,
    writable: bool,
    notifier: Option<Signal>,
    writes: AtomicUsize,
}

impl std::fmt::Debug for HeadlessProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessProperty")
            .field("name", &self.name)
            .field("value", &*self.value.read())
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .field("has_notifier", &self.notifier.is_some())
            .finish()
    }
}

impl HeadlessProperty {
    /// Readable, writable property with a change signal.
    pub fn new(name: impl Into<String>, initial: Value) -> Self {
        let name = name.into();
        let notifier = Some(Signal::new(format!("{name}-changed")));
        Self {
            name,
            value: RwLock::new(initial),
            readable: true,
            writable: true,
            notifier,
            writes: AtomicUsize::new(0),
        }
    }

    /// Reject programmatic writes.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Reject reads.
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Drop the change signal.
    pub fn without_notifier(mut self) -> Self {
        self.notifier = None;
        self
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value, regardless of readability.
    pub fn value(&self) -> Value {
        self.value.read().clone()
    }

    /// Number of programmatic `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulate the user changing the value.
    pub fn edit(&self, value: Value) -> Result<()> {
        self.store(value)
    }

    fn store(&self, value: Value) -> Result<()> {
        let changed = {
            let mut current = self.value.write();
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        };

        match (&self.notifier, changed) {
            (Some(signal), true) => signal.emit(),
            _ => Ok(()),
        }
    }
}

impl DisplayProperty for HeadlessProperty {
    fn is_readable(&self) -> bool {
        self.readable
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn get(&self) -> Result<Value> {
        if !self.readable {
            return Err(anyhow!("Property '{}' is write-only", self.name));
        }
        Ok(self.value())
    }

    fn set(&self, value: Value) -> Result<()> {
        if !self.writable {
            return Err(anyhow!("Property '{}' is read-only", self.name));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.store(value)
    }

    fn notifier(&self) -> Option<Signal> {
        self.notifier.clone()
    }
}

/// Display endpoint with in-memory properties.
///
/// # Example
///
/// ```rust,ignore
/// let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
/// spin.edit("value", json!(5.0))?; // emits value-changed
/// assert_eq!(spin.value("value"), Some(json!(5.0)));
/// ```
#[derive(Debug)]
pub struct HeadlessWidget {
    id: EndpointId,
    kind: EndpointKind,
    properties: HashMap<String, Arc<HeadlessProperty>>,
}

impl HeadlessWidget {
    /// Widget of the given kind with no properties.
    pub fn new(kind: EndpointKind) -> Self {
        Self {
            id: EndpointId::new(),
            kind,
            properties: HashMap::new(),
        }
    }

    /// Add (or replace) a property.
    pub fn with_property(mut self, property: HeadlessProperty) -> Self {
        self.properties
            .insert(property.name().to_string(), Arc::new(property));
        self
    }

    /// Check box with a `checked` property.
    pub fn toggle(checked: bool) -> Self {
        Self::new(EndpointKind::ToggleControl).with_property(HeadlessProperty::new("checked", json!(checked)))
    }

    /// Combo box with a `selected-index` property.
    pub fn choice_list(index: i64) -> Self {
        Self::new(EndpointKind::SingleChoiceList)
            .with_property(HeadlessProperty::new("selected-index", json!(index)))
    }

    /// Line edit with a `text` property.
    pub fn line_edit(text: &str) -> Self {
        Self::new(EndpointKind::SingleLineText).with_property(HeadlessProperty::new("text", json!(text)))
    }

    /// Spin box with a `value` property.
    pub fn numeric_entry(value: f64) -> Self {
        Self::new(EndpointKind::NumericEntry).with_property(HeadlessProperty::new("value", json!(value)))
    }

    /// Plain text edit with a `plain-text` property.
    pub fn plain_text_edit(text: &str) -> Self {
        Self::new(EndpointKind::MultiLineText)
            .with_property(HeadlessProperty::new("plain-text", json!(text)))
    }

    /// Typed access to a property.
    pub fn handle(&self, name: &str) -> Option<Arc<HeadlessProperty>> {
        self.properties.get(name).cloned()
    }

    /// Current value of a property.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.properties.get(name).map(|p| p.value())
    }

    /// Programmatic writes received by a property (0 if it does not exist).
    pub fn write_count(&self, name: &str) -> usize {
        self.properties.get(name).map_or(0, |p| p.write_count())
    }

    /// Simulate a user edit of a property.
    pub fn edit(&self, name: &str, value: Value) -> Result<()> {
        self.properties
            .get(name)
            .ok_or_else(|| anyhow!("Widget has no property '{name}'"))?
            .edit(value)
    }
}

impl DisplayEndpoint for HeadlessWidget {
    fn endpoint_id(&self) -> EndpointId {
        self.id
    }

    fn kind(&self) -> EndpointKind {
        self.kind.clone()
    }

    fn property(&self, name: &str) -> Option<Arc<dyn DisplayProperty>> {
        self.properties
            .get(name)
            .map(|p| Arc::clone(p) as Arc<dyn DisplayProperty>)
    }
}
