//! Binding engine for the DAQ GUI modules.
//!
//! A GUI module shows instrument state in display elements (spin boxes,
//! check boxes, text fields) and lets the operator edit it. This crate keeps
//! each display property and its logic-module attribute in sync in both
//! directions, without echo loops, and with display updates confined to the
//! GUI's owning context even when the instrument reports from another thread.
//!
//! # Modules
//!
//! - [`mapper`]: the binding registry, submit policy and propagation
//! - [`display`]: display endpoint contract, kind table, headless widgets
//! - [`model`]: model contract, `PropertyCell`, `ModelObject`
//! - [`signal`]: change notifiers
//! - [`converter`]: value transforms at the binding boundary
//! - [`context`]: owning execution context and its task queue
//! - [`config`]: Figment-based configuration
//! - [`error`]: `MapperError`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use daq_mapper::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let (handle, ctx_loop) = OwningContext::new("gui");
//! let _gui = ctx_loop.enter();
//!
//! let setpoint = PropertyCell::new("setpoint", json!(3.0));
//! let logic = Arc::new(ModelObject::new("laser_logic").with_cell(&setpoint));
//! let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
//!
//! let mapper = Mapper::new(handle);
//! mapper.add_binding(
//!     BindingRequest::new(spin.clone(), logic, "setpoint").model_notifier("setpoint_changed"),
//! )?;
//! assert_eq!(spin.value("value"), Some(json!(3.0)));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod converter;
pub mod display;
pub mod error;
pub mod mapper;
pub mod model;
pub mod signal;

pub use error::{MapperError, MapperResult};

/// Common imports for GUI modules.
pub mod prelude {
    pub use crate::config::MapperConfig;
    pub use crate::context::{ContextHandle, ContextLoop, OwningContext};
    pub use crate::converter::{Converter, FnConverter, IdentityConverter, ScaleConverter};
    pub use crate::display::{DisplayEndpoint, DisplayProperty, EndpointKind, HeadlessProperty, HeadlessWidget};
    pub use crate::error::{MapperError, MapperResult};
    pub use crate::mapper::{BindingKey, BindingRequest, Mapper, PropagationState, SubmitPolicy};
    pub use crate::model::{Model, ModelAccessor, ModelAttribute, ModelObject, PropertyCell};
    pub use crate::signal::Signal;
}
