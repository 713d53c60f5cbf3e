//! Custom error types for the binding engine.
//!
//! This module defines the primary error type, `MapperError`, for the whole crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to
//! report everything that can go wrong while resolving, maintaining and tearing
//! down a binding.
//!
//! ## Error Hierarchy
//!
//! - **Resolution failures** (`Resolution`, `DuplicateBinding`, `EndpointUnavailable`,
//!   `NoNotifier`, `AttributeMissing`, `NotCallable`): raised synchronously by
//!   `Mapper::add_binding`. Nothing is registered or subscribed when one of them
//!   is returned.
//! - **Registry failures** (`NotBound`, `InvalidPolicy`): raised by removal and
//!   by submit-policy parsing.
//! - **Propagation failures** (`ModelReadOnly`, `Propagation`): a single
//!   view -> model or model -> view transfer failed. `Propagation` wraps the
//!   `anyhow::Error` returned by the user's getter or setter.
//!
//! Configuration loading has its own error type, see [`crate::config::ConfigError`].

use std::fmt;

use thiserror::Error;

use crate::display::EndpointId;
use crate::mapper::BindingKey;

/// Convenience alias for results using the mapper error type.
pub type MapperResult<T> = std::result::Result<T, MapperError>;

/// Why a display property could not be used for a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailability {
    /// The endpoint has no property with that name.
    Missing,
    /// The property exists but cannot be read.
    Unreadable,
    /// The property exists but cannot be written.
    Unwritable,
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailability::Missing => write!(f, "not available"),
            Unavailability::Unreadable => write!(f, "not readable"),
            Unavailability::Unwritable => write!(f, "not writable"),
        }
    }
}

/// Direction of a single propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Display value pushed into the model.
    ToModel,
    /// Model value pushed into the display.
    ToView,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToModel => write!(f, "view -> model"),
            Direction::ToView => write!(f, "model -> view"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Property of display endpoint {endpoint} (kind '{kind}') could not be determined")]
    Resolution { endpoint: EndpointId, kind: String },

    #[error("Property '{}' of display endpoint {} already mapped", .0.property(), .0.endpoint())]
    DuplicateBinding(BindingKey),

    #[error("Property '{}' of display endpoint {} is {reason}", .key.property(), .key.endpoint())]
    EndpointUnavailable {
        key: BindingKey,
        reason: Unavailability,
    },

    #[error("'{name}' of {owner} has no notify signal")]
    NoNotifier { owner: String, name: String },

    #[error("Model '{model}' has no attribute '{attribute}'")]
    AttributeMissing { model: String, attribute: String },

    #[error("Attribute '{attribute}' of model '{model}' is not callable")]
    NotCallable { model: String, attribute: String },

    #[error("Display property {0} is not mapped")]
    NotBound(BindingKey),

    #[error("Unknown submit policy '{0}'")]
    InvalidPolicy(String),

    #[error("Binding {0} has no model setter")]
    ModelReadOnly(BindingKey),

    #[error("Propagation {direction} failed for binding {key}: {source}")]
    Propagation {
        key: BindingKey,
        direction: Direction,
        #[source]
        source: anyhow::Error,
    },
}

impl MapperError {
    pub(crate) fn propagation(key: &BindingKey, direction: Direction, source: anyhow::Error) -> Self {
        MapperError::Propagation {
            key: key.clone(),
            direction,
            source,
        }
    }
}
