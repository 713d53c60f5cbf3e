//! Value converters applied at a binding's boundary.
//!
//! A converter translates between the representation a display endpoint shows
//! and the representation the model stores (e.g. a spin box in µm bound to a
//! stage position in mm). Both directions default to identity.
//!
//! The mapper relies on `to_model` for echo detection: when a view-triggered
//! update comes back from the model, the display value is run through
//! `to_model` and compared with the fresh model value. Converters where
//! `to_model(to_view(x)) != x` are legal but may cause one extra display write
//! per edit.

use std::sync::Arc;

use serde_json::Value;

/// Bidirectional, side-effect free value transform.
pub trait Converter: Send + Sync {
    /// Convert a display value into the model's representation.
    fn to_model(&self, value: Value) -> Value {
        value
    }

    /// Convert a model value into the display's representation.
    fn to_view(&self, value: Value) -> Value {
        value
    }
}

/// Converter that passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityConverter;

impl Converter for IdentityConverter {}

type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Converter built from closures. A direction left unset is identity.
///
/// ```rust,ignore
/// let percent = FnConverter::new()
///     .with_to_model(|v| json!(v.as_f64().unwrap_or(0.0) / 100.0))
///     .with_to_view(|v| json!(v.as_f64().unwrap_or(0.0) * 100.0));
/// ```
#[derive(Clone, Default)]
pub struct FnConverter {
    to_model: Option<Transform>,
    to_view: Option<Transform>,
}

impl std::fmt::Debug for FnConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnConverter")
            .field("to_model", &self.to_model.is_some())
            .field("to_view", &self.to_view.is_some())
            .finish()
    }
}

impl FnConverter {
    /// Create an identity converter to be customised with the `with_*` methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display -> model transform.
    pub fn with_to_model(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.to_model = Some(Arc::new(f));
        self
    }

    /// Set the model -> display transform.
    pub fn with_to_view(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.to_view = Some(Arc::new(f));
        self
    }
}

impl Converter for FnConverter {
    fn to_model(&self, value: Value) -> Value {
        match &self.to_model {
            Some(f) => f(value),
            None => value,
        }
    }

    fn to_view(&self, value: Value) -> Value {
        match &self.to_view {
            Some(f) => f(value),
            None => value,
        }
    }
}

/// Linear unit conversion: `model = view * factor + offset`.
///
/// Non-numeric values, and results that are not finite, pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleConverter {
    factor: f64,
    offset: f64,
}

impl ScaleConverter {
    /// Create a converter with the given factor and offset.
    pub fn new(factor: f64, offset: f64) -> Self {
        Self { factor, offset }
    }

    /// Pure scaling, no offset.
    pub fn scale(factor: f64) -> Self {
        Self::new(factor, 0.0)
    }

    fn map(value: Value, f: impl Fn(f64) -> f64) -> Value {
        match value.as_f64().map(f).and_then(serde_json::Number::from_f64) {
            Some(n) => Value::Number(n),
            None => value,
        }
    }
}

impl Converter for ScaleConverter {
    fn to_model(&self, value: Value) -> Value {
        Self::map(value, |x| x * self.factor + self.offset)
    }

    fn to_view(&self, value: Value) -> Value {
        Self::map(value, |x| (x - self.offset) / self.factor)
    }
}
