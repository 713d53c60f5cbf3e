//! Binding registry ("Mapper").
//!
//! A GUI module creates one `Mapper` when it activates, binds its display
//! elements to logic-module attributes, and calls [`Mapper::clear_mapping`]
//! when it deactivates.
//!
//! # Propagation
//!
//! ```text
//! display edit ──► view handler ──► to_model ──► model setter      (AUTO only)
//! model change ──► model handler ──► [context dispatch] ──► to_view ──► display setter
//! ```
//!
//! Each binding carries two suppression flags. While the binding writes the
//! display, display notifications are ignored; while it writes the model, a
//! model notification whose value matches the display is treated as the echo
//! of that write and not applied again.
//!
//! # Threading
//!
//! Display endpoints are only touched on the owning context given at
//! construction. Handlers triggered elsewhere, and `submit`/`revert` called
//! elsewhere, are queued onto that context and return immediately. Registry
//! locks are never held while user callbacks run.

mod binding;
mod policy;
mod request;

pub use binding::{BindingKey, PropagationState};
pub use policy::SubmitPolicy;
pub use request::BindingRequest;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::config::MapperConfig;
use crate::context::ContextHandle;
use crate::display::{DisplayEndpoint, EndpointKind, EndpointKindTable};
use crate::error::{Direction, MapperError, MapperResult, Unavailability};
use crate::model;

use binding::Binding;

struct MapperInner {
    context: ContextHandle,
    policy: Mutex<SubmitPolicy>,
    kinds: RwLock<EndpointKindTable>,
    bindings: Mutex<HashMap<BindingKey, Arc<Binding>>>,
    next_seq: AtomicU64,
}

/// Restores the cached submit policy when dropped.
struct PolicyOverride<'a> {
    slot: &'a Mutex<SubmitPolicy>,
    cached: SubmitPolicy,
}

impl<'a> PolicyOverride<'a> {
    fn force(slot: &'a Mutex<SubmitPolicy>, policy: SubmitPolicy) -> Self {
        let cached = std::mem::replace(&mut *slot.lock(), policy);
        Self { slot, cached }
    }
}

impl Drop for PolicyOverride<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = self.cached;
    }
}

impl MapperInner {
    fn binding(&self, key: &BindingKey) -> Option<Arc<Binding>> {
        self.bindings.lock().get(key).cloned()
    }

    /// Bindings in registration order.
    fn snapshot(&self) -> Vec<Arc<Binding>> {
        let mut all: Vec<Arc<Binding>> = self.bindings.lock().values().cloned().collect();
        all.sort_by_key(|b| b.seq);
        all
    }

    fn policy(&self) -> SubmitPolicy {
        *self.policy.lock()
    }

    fn view_notified(&self, binding: &Binding) -> MapperResult<()> {
        if binding.is_display_suppressed() {
            return Ok(());
        }
        match self.policy() {
            SubmitPolicy::Auto => binding.push_to_model(),
            SubmitPolicy::Manual => {
                tracing::trace!(binding = %binding.key(), "Edit buffered until submit");
                Ok(())
            }
        }
    }

    fn model_notified(&self, binding: &Binding) -> MapperResult<()> {
        binding.pull_from_model()
    }

    fn handle(&self, key: &BindingKey, direction: Direction) -> MapperResult<()> {
        // The binding may have been removed while the notification was queued.
        let Some(binding) = self.binding(key) else {
            tracing::trace!(binding = %key, "Notification for removed binding ignored");
            return Ok(());
        };
        match direction {
            Direction::ToModel => self.view_notified(&binding),
            Direction::ToView => self.model_notified(&binding),
        }
    }

    /// Notifier entry point: run on the owning context, queueing if needed.
    fn route(weak: &Weak<MapperInner>, key: &BindingKey, direction: Direction) -> anyhow::Result<()> {
        let Some(inner) = weak.upgrade() else {
            return Ok(());
        };

        if inner.context.is_current() {
            return inner.handle(key, direction).map_err(Into::into);
        }

        tracing::trace!(binding = %key, %direction, "Queueing notification onto owning context");
        let weak = weak.clone();
        let key = key.clone();
        inner.context.post(move || {
            if let Some(inner) = weak.upgrade() {
                if let Err(err) = inner.handle(&key, direction) {
                    tracing::error!(binding = %key, error = %err, "Queued propagation failed");
                }
            }
        });
        Ok(())
    }

    fn submit_now(&self) -> MapperResult<()> {
        let _restore = PolicyOverride::force(&self.policy, SubmitPolicy::Auto);
        let bindings = self.snapshot();
        tracing::debug!(count = bindings.len(), "Submitting display values");
        for binding in &bindings {
            if !binding.has_model_setter() {
                tracing::trace!(binding = %binding.key(), "Read-only binding skipped on submit");
                continue;
            }
            self.view_notified(binding)?;
        }
        Ok(())
    }

    fn revert_now(&self) -> MapperResult<()> {
        let bindings = self.snapshot();
        tracing::debug!(count = bindings.len(), "Reverting display values");
        for binding in &bindings {
            self.model_notified(binding)?;
        }
        Ok(())
    }

    fn remove(&self, key: &BindingKey) -> MapperResult<()> {
        let binding = self
            .bindings
            .lock()
            .remove(key)
            .ok_or_else(|| MapperError::NotBound(key.clone()))?;
        binding.release();
        tracing::debug!(binding = %key, "Binding removed");
        Ok(())
    }
}

/// Registry of display <-> model bindings for one GUI module.
pub struct Mapper {
    inner: Arc<MapperInner>,
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("context", &self.inner.context)
            .field("submit_policy", &self.submit_policy())
            .field("bindings", &self.len())
            .finish()
    }
}

impl Mapper {
    /// Create an empty registry bound to an owning context (policy AUTO).
    pub fn new(context: ContextHandle) -> Self {
        Self::with_parts(context, SubmitPolicy::default(), EndpointKindTable::default())
    }

    /// Create a registry using the configured policy and kind registrations.
    pub fn with_config(context: ContextHandle, config: &MapperConfig) -> Self {
        Self::with_parts(context, config.submit_policy, config.kind_table())
    }

    fn with_parts(context: ContextHandle, policy: SubmitPolicy, kinds: EndpointKindTable) -> Self {
        Self {
            inner: Arc::new(MapperInner {
                context,
                policy: Mutex::new(policy),
                kinds: RwLock::new(kinds),
                bindings: Mutex::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    /// The owning context.
    pub fn context(&self) -> &ContextHandle {
        &self.inner.context
    }

    /// Current submit policy.
    pub fn submit_policy(&self) -> SubmitPolicy {
        self.inner.policy()
    }

    /// Change the submit policy. Buffered edits are kept.
    pub fn set_submit_policy(&self, policy: SubmitPolicy) {
        *self.inner.policy.lock() = policy;
    }

    /// Change the submit policy by name (`"auto"` / `"manual"`).
    pub fn set_submit_policy_str(&self, policy: &str) -> MapperResult<()> {
        self.set_submit_policy(policy.parse()?);
        Ok(())
    }

    /// Register the default property of an endpoint kind.
    pub fn register_kind(&self, kind: EndpointKind, property: impl Into<String>) {
        self.inner.kinds.write().register(kind, property);
    }

    fn handler(&self, key: &BindingKey, direction: Direction) -> impl Fn() -> anyhow::Result<()> + Send + Sync + 'static {
        let weak = Arc::downgrade(&self.inner);
        let key = key.clone();
        move || MapperInner::route(&weak, &key, direction)
    }

    fn resolve_key(&self, display: &dyn DisplayEndpoint, property: Option<&str>) -> MapperResult<BindingKey> {
        let name = self.inner.kinds.read().resolve(display, property)?;
        Ok(BindingKey::new(display.endpoint_id(), name))
    }

    /// Bind a display property to a model attribute.
    ///
    /// On success the display already shows the (converted) model value. On
    /// error nothing is registered and no notifier keeps a subscription.
    ///
    /// # Errors
    ///
    /// - `Resolution`: no property given and the endpoint kind has no default
    /// - `DuplicateBinding`: the (display, property) pair is already bound
    /// - `EndpointUnavailable`: property missing, unreadable or unwritable
    /// - `NoNotifier`: no display notifier available, or the named model
    ///   notifier is not a signal
    /// - `AttributeMissing` / `NotCallable`: named model attribute resolution
    /// - `Propagation`: the initial model -> display pull failed
    pub fn add_binding(&self, request: BindingRequest) -> MapperResult<()> {
        let BindingRequest {
            display,
            model,
            source,
            model_notifier,
            model_setter,
            display_property,
            display_notifier,
            converter,
        } = request;

        let key = self.resolve_key(display.as_ref(), display_property.as_deref())?;
        if self.inner.bindings.lock().contains_key(&key) {
            return Err(MapperError::DuplicateBinding(key));
        }

        let unavailable = |reason| MapperError::EndpointUnavailable {
            key: key.clone(),
            reason,
        };
        let property = display
            .property(key.property())
            .ok_or_else(|| unavailable(Unavailability::Missing))?;
        if !property.is_readable() {
            return Err(unavailable(Unavailability::Unreadable));
        }
        if !property.is_writable() {
            return Err(unavailable(Unavailability::Unwritable));
        }

        let display_notifier = match display_notifier {
            Some(signal) => signal,
            None => property.notifier().ok_or_else(|| MapperError::NoNotifier {
                owner: format!("display endpoint {}", key.endpoint()),
                name: key.property().to_string(),
            })?,
        };

        let accessor = model::resolve_accessor(model.as_ref(), source, model_setter)?;
        let model_signal = model_notifier
            .map(|n| model::resolve_notifier(model.as_ref(), n))
            .transpose()?;

        // Everything resolved; only now connect.
        let display_token = display_notifier.subscribe(self.handler(&key, Direction::ToModel));
        let model_subscription = model_signal.map(|signal| {
            let token = signal.subscribe(self.handler(&key, Direction::ToView));
            (signal, token)
        });

        let binding = Arc::new(Binding {
            key: key.clone(),
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
            display,
            property,
            display_notifier,
            display_token,
            model,
            accessor,
            model_notifier: model_subscription,
            converter,
            display_suppressed: Default::default(),
            model_suppressed: Default::default(),
        });

        {
            let mut bindings = self.inner.bindings.lock();
            if bindings.contains_key(&key) {
                drop(bindings);
                binding.release();
                return Err(MapperError::DuplicateBinding(key));
            }
            bindings.insert(key.clone(), Arc::clone(&binding));
        }
        tracing::debug!(
            binding = %key,
            model = binding.model.model_name(),
            notified = binding.model_notifier.is_some(),
            "Binding added"
        );

        if let Err(err) = self.inner.model_notified(&binding) {
            // Roll back so a failed add leaves nothing behind.
            if let Err(remove_err) = self.inner.remove(&key) {
                tracing::debug!(binding = %key, error = %remove_err, "Binding already gone during rollback");
            }
            return Err(err);
        }
        Ok(())
    }

    /// Remove the binding of `display`'s property (inferred if `None`).
    pub fn remove_binding(&self, display: &dyn DisplayEndpoint, property: Option<&str>) -> MapperResult<()> {
        let key = self.resolve_key(display, property)?;
        self.inner.remove(&key)
    }

    /// Remove a binding by key.
    pub fn remove_binding_key(&self, key: &BindingKey) -> MapperResult<()> {
        self.inner.remove(key)
    }

    /// Remove every binding.
    pub fn clear_mapping(&self) {
        let keys: Vec<BindingKey> = self.inner.bindings.lock().keys().cloned().collect();
        for key in keys {
            if let Err(err) = self.inner.remove(&key) {
                tracing::debug!(binding = %key, error = %err, "Binding already gone");
            }
        }
    }

    fn redispatch(&self, operation: &'static str, run: fn(&MapperInner) -> MapperResult<()>) {
        tracing::debug!(operation, context = self.inner.context.name(), "Redispatching onto owning context");
        let weak = Arc::downgrade(&self.inner);
        self.inner.context.post(move || {
            if let Some(inner) = weak.upgrade() {
                if let Err(err) = run(&inner) {
                    tracing::error!(operation, error = %err, "Queued operation failed");
                }
            }
        });
    }

    /// Write every display value into its model.
    ///
    /// Off the owning context the call is queued and returns `Ok(())` at once.
    /// The submit policy is restored afterwards even if a setter fails; the
    /// first failure stops the pass and is returned.
    pub fn submit(&self) -> MapperResult<()> {
        if !self.inner.context.is_current() {
            self.redispatch("submit", MapperInner::submit_now);
            return Ok(());
        }
        self.inner.submit_now()
    }

    /// Show every model value again, discarding unsubmitted edits.
    ///
    /// Off the owning context the call is queued and returns `Ok(())` at once.
    pub fn revert(&self) -> MapperResult<()> {
        if !self.inner.context.is_current() {
            self.redispatch("revert", MapperInner::revert_now);
            return Ok(());
        }
        self.inner.revert_now()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.inner.bindings.lock().len()
    }

    /// Whether there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `display`'s property (inferred if `None`) is bound.
    pub fn is_bound(&self, display: &dyn DisplayEndpoint, property: Option<&str>) -> bool {
        self.resolve_key(display, property)
            .map(|key| self.inner.bindings.lock().contains_key(&key))
            .unwrap_or(false)
    }

    /// Keys of all bindings, in registration order.
    pub fn keys(&self) -> Vec<BindingKey> {
        self.inner
            .snapshot()
            .iter()
            .map(|b| b.key().clone())
            .collect()
    }

    /// Propagation state of a binding.
    pub fn binding_state(&self, key: &BindingKey) -> Option<PropagationState> {
        self.inner.binding(key).map(|b| b.state())
    }
}

impl Drop for Mapper {
    fn drop(&mut self) {
        let remaining = self.len();
        if remaining > 0 {
            tracing::warn!(remaining, "Mapper dropped with live bindings, clearing");
            self.clear_mapping();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextLoop, OwningContext};
    use crate::converter::FnConverter;
    use crate::display::{DisplayProperty, HeadlessProperty, HeadlessWidget};
    use crate::model::{ModelAccessor, ModelObject, PropertyCell};
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    struct Fixture {
        ctx_loop: ContextLoop,
        mapper: Mapper,
        setpoint: PropertyCell,
        logic: Arc<ModelObject>,
    }

    fn fixture() -> Fixture {
        let (handle, ctx_loop) = OwningContext::new("gui");
        let setpoint = PropertyCell::new("setpoint", json!(3.0));
        let logic = Arc::new(ModelObject::new("laser_logic").with_cell(&setpoint));
        Fixture {
            ctx_loop,
            mapper: Mapper::new(handle),
            setpoint,
            logic,
        }
    }

    /// Accessor around `cell` that counts setter calls.
    fn counting_accessor(cell: &PropertyCell, calls: &Arc<AtomicUsize>) -> ModelAccessor {
        let reader = cell.clone();
        let writer = cell.clone();
        let calls = calls.clone();
        ModelAccessor::new(move || Ok(reader.get())).with_setter(move |v| {
            calls.fetch_add(1, Ordering::SeqCst);
            writer.set(v)
        })
    }

    #[test]
    fn test_state_is_idle_between_propagations() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
        f.mapper
            .add_binding(BindingRequest::new(spin.clone(), f.logic.clone(), "setpoint"))
            .unwrap();

        let key = f.mapper.keys().remove(0);
        assert_eq!(f.mapper.binding_state(&key), Some(PropagationState::Idle));
        spin.edit("value", json!(4.0)).unwrap();
        assert_eq!(f.mapper.binding_state(&key), Some(PropagationState::Idle));
    }

    #[test]
    fn test_state_observed_during_model_write() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        f.mapper
            .add_binding(BindingRequest::new(spin.clone(), f.logic.clone(), "setpoint"))
            .unwrap();
        let key = f.mapper.keys().remove(0);

        // Probe the state from inside the model setter.
        let weak = Arc::downgrade(&f.mapper.inner);
        let probe_key = key.clone();
        let s = seen.clone();
        f.setpoint.changed().subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                if let Some(b) = inner.binding(&probe_key) {
                    s.lock().push(b.state());
                }
            }
            Ok(())
        });

        spin.edit("value", json!(4.5)).unwrap();
        assert_eq!(*seen.lock(), vec![PropagationState::PropagatingFromView]);
    }

    #[test]
    fn test_echo_is_swallowed() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
        let calls = Arc::new(AtomicUsize::new(0));

        f.mapper
            .add_binding(
                BindingRequest::new(spin.clone(), f.logic.clone(), counting_accessor(&f.setpoint, &calls))
                    .model_notifier(f.setpoint.changed()),
            )
            .unwrap();
        assert_eq!(spin.write_count("value"), 1);

        spin.edit("value", json!(5.0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.setpoint.get(), json!(5.0));
        // The model's change signal came back as an echo and was not re-applied
        assert_eq!(spin.write_count("value"), 1);
    }

    #[test]
    fn test_clamping_model_corrects_display_once() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
        let cell = f.setpoint.clone();
        let accessor = ModelAccessor::new({
            let cell = cell.clone();
            move || Ok(cell.get())
        })
        .with_setter(move |v: Value| {
            let clamped = v.as_f64().unwrap_or(0.0).min(10.0);
            cell.set(json!(clamped))
        });

        f.mapper
            .add_binding(
                BindingRequest::new(spin.clone(), f.logic.clone(), accessor)
                    .model_notifier("setpoint_changed"),
            )
            .unwrap();
        let writes_after_add = spin.write_count("value");

        spin.edit("value", json!(150.0)).unwrap();
        assert_eq!(f.setpoint.get(), json!(10.0));
        assert_eq!(spin.value("value"), Some(json!(10.0)));
        assert_eq!(spin.write_count("value"), writes_after_add + 1);
    }

    #[test]
    fn test_setter_error_clears_flag_and_propagates() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
        let accessor = f.setpoint.accessor();
        let failing = ModelAccessor::new(move || accessor.get())
            .with_setter(|_| Err(anyhow::anyhow!("stage offline")));

        f.mapper
            .add_binding(BindingRequest::new(spin.clone(), f.logic.clone(), failing))
            .unwrap();
        let key = f.mapper.keys().remove(0);

        let err = spin.edit("value", json!(1.0)).unwrap_err();
        assert!(err.to_string().contains("stage offline"));
        assert_eq!(f.mapper.binding_state(&key), Some(PropagationState::Idle));
    }

    #[test]
    fn test_model_read_only_binding() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let label = Arc::new(HeadlessWidget::line_edit(""));
        let read_only = ModelAccessor::new(|| Ok(json!("idle")));

        f.mapper
            .add_binding(BindingRequest::new(label.clone(), f.logic.clone(), read_only))
            .unwrap();
        assert_eq!(label.value("text"), Some(json!("idle")));

        let err = label.edit("text", json!("busy")).unwrap_err();
        assert!(err.to_string().contains("has no model setter"));
    }

    #[test]
    fn test_failed_initial_pull_rolls_back() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
        let notifier = f.setpoint.changed().clone();
        let broken = ModelAccessor::new(|| Err(anyhow::anyhow!("not connected")));

        let err = f
            .mapper
            .add_binding(BindingRequest::new(spin.clone(), f.logic.clone(), broken).model_notifier(&notifier))
            .unwrap_err();

        assert!(matches!(err, MapperError::Propagation { direction: Direction::ToView, .. }));
        assert!(f.mapper.is_empty());
        assert_eq!(notifier.handler_count(), 0);
        assert_eq!(spin.handle("value").unwrap().notifier().unwrap().handler_count(), 0);
    }

    #[test]
    fn test_explicit_display_notifier() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let editing_finished = crate::signal::Signal::new("editing-finished");
        let edit = Arc::new(
            HeadlessWidget::new(EndpointKind::SingleLineText)
                .with_property(HeadlessProperty::new("text", json!("")).without_notifier()),
        );
        let label = PropertyCell::new("label", json!("probe"));
        let logic = Arc::new(ModelObject::new("logic").with_cell(&label));

        f.mapper
            .add_binding(BindingRequest::new(edit.clone(), logic, "label").display_notifier(editing_finished.clone()))
            .unwrap();

        edit.edit("text", json!("pump")).unwrap();
        assert_eq!(label.get(), json!("probe"));
        editing_finished.emit().unwrap();
        assert_eq!(label.get(), json!("pump"));
    }

    #[test]
    fn test_converter_applies_both_directions() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let switch = Arc::new(HeadlessWidget::toggle(false));
        let mode = PropertyCell::new("mode", json!("off"));
        let logic = Arc::new(ModelObject::new("logic").with_cell(&mode));
        let converter = FnConverter::new()
            .with_to_model(|v| json!(if v.as_bool() == Some(true) { "on" } else { "off" }))
            .with_to_view(|v| json!(v.as_str() == Some("on")));

        f.mapper
            .add_binding(
                BindingRequest::new(switch.clone(), logic, "mode")
                    .model_notifier("mode_changed")
                    .converter(converter),
            )
            .unwrap();
        assert_eq!(switch.value("checked"), Some(json!(false)));

        switch.edit("checked", json!(true)).unwrap();
        assert_eq!(mode.get(), json!("on"));

        mode.set(json!("off")).unwrap();
        assert_eq!(switch.value("checked"), Some(json!(false)));
    }

    #[test]
    fn test_submit_policy_restored_after_failure() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
        let accessor = ModelAccessor::new(|| Ok(json!(1.0))).with_setter(|_| Err(anyhow::anyhow!("rejected")));
        f.mapper
            .add_binding(BindingRequest::new(spin.clone(), f.logic.clone(), accessor))
            .unwrap();

        f.mapper.set_submit_policy(SubmitPolicy::Manual);
        spin.edit("value", json!(2.0)).unwrap();
        assert!(f.mapper.submit().is_err());
        assert_eq!(f.mapper.submit_policy(), SubmitPolicy::Manual);
    }

    #[test]
    fn test_set_policy_by_name() {
        let f = fixture();
        f.mapper.set_submit_policy_str("manual").unwrap();
        assert_eq!(f.mapper.submit_policy(), SubmitPolicy::Manual);
        assert!(matches!(
            f.mapper.set_submit_policy_str("later"),
            Err(MapperError::InvalidPolicy(_))
        ));
        assert_eq!(f.mapper.submit_policy(), SubmitPolicy::Manual);
    }

    #[test]
    fn test_registered_kind_is_inferred() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let dial = Arc::new(
            HeadlessWidget::new(EndpointKind::Other("dial".into()))
                .with_property(HeadlessProperty::new("angle", json!(0.0))),
        );

        let err = f
            .mapper
            .add_binding(BindingRequest::new(dial.clone(), f.logic.clone(), "setpoint"))
            .unwrap_err();
        assert!(matches!(err, MapperError::Resolution { .. }));

        f.mapper.register_kind(EndpointKind::Other("dial".into()), "angle");
        f.mapper
            .add_binding(BindingRequest::new(dial.clone(), f.logic.clone(), "setpoint"))
            .unwrap();
        assert!(f.mapper.is_bound(dial.as_ref(), None));
        assert_eq!(dial.value("angle"), Some(json!(3.0)));
    }

    #[test]
    #[traced_test]
    fn test_drop_clears_bindings() {
        let f = fixture();
        let _guard = f.ctx_loop.enter();
        let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
        f.mapper
            .add_binding(BindingRequest::new(spin.clone(), f.logic.clone(), "setpoint").model_notifier("setpoint_changed"))
            .unwrap();
        assert_eq!(f.setpoint.changed().handler_count(), 1);

        drop(f.mapper);

        assert_eq!(f.setpoint.changed().handler_count(), 0);
        assert!(logs_contain("Mapper dropped with live bindings"));
    }
}
