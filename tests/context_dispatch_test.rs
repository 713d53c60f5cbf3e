//! Tests for marshalling display work onto the owning context.
//!
//! Instrument updates and `submit`/`revert` calls made off the GUI context
//! must not touch the display until the context loop runs them.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use daq_mapper::prelude::*;
use serde_json::json;

fn bound_setpoint() -> (ContextLoop, Mapper, PropertyCell, Arc<HeadlessWidget>) {
    let (handle, ctx_loop) = OwningContext::new("gui");
    let setpoint = PropertyCell::new("setpoint", json!(3.0));
    let logic = Arc::new(ModelObject::new("laser_logic").with_cell(&setpoint));
    let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));
    let mapper = Mapper::new(handle);

    {
        let _gui = ctx_loop.enter();
        mapper
            .add_binding(BindingRequest::new(spin.clone(), logic, "setpoint").model_notifier("setpoint_changed"))
            .expect("binding should succeed");
    }
    (ctx_loop, mapper, setpoint, spin)
}

#[test]
fn test_model_update_from_instrument_thread_is_queued() {
    let (mut ctx_loop, mapper, setpoint, spin) = bound_setpoint();
    let writes = spin.write_count("value");

    let cell = setpoint.clone();
    thread::spawn(move || cell.set(json!(12.5)))
        .join()
        .expect("instrument thread panicked")
        .expect("model update failed");

    assert_eq!(setpoint.get(), json!(12.5));
    assert_eq!(spin.value("value"), Some(json!(3.0)));
    assert_eq!(spin.write_count("value"), writes);

    assert_eq!(ctx_loop.run_pending(), 1);
    assert_eq!(spin.value("value"), Some(json!(12.5)));
    assert_eq!(mapper.len(), 1);
}

#[test]
fn test_queued_update_shows_latest_model_value() {
    let (mut ctx_loop, _mapper, setpoint, spin) = bound_setpoint();

    let cell = setpoint.clone();
    thread::spawn(move || {
        for step in 1..=3 {
            cell.set(json!(f64::from(step) * 10.0)).expect("model update failed");
        }
    })
    .join()
    .expect("instrument thread panicked");

    assert_eq!(ctx_loop.run_pending(), 3);
    assert_eq!(spin.value("value"), Some(json!(30.0)));
}

#[test]
fn test_queued_update_for_removed_binding_is_ignored() {
    let (mut ctx_loop, mapper, setpoint, spin) = bound_setpoint();

    let cell = setpoint.clone();
    thread::spawn(move || cell.set(json!(50.0)))
        .join()
        .expect("instrument thread panicked")
        .expect("model update failed");

    mapper.clear_mapping();
    let writes = spin.write_count("value");
    assert_eq!(ctx_loop.run_pending(), 1);
    assert_eq!(spin.write_count("value"), writes);
    assert_eq!(spin.value("value"), Some(json!(3.0)));
}

#[test]
fn test_off_context_submit_returns_before_setter_runs() {
    let (mut ctx_loop, mapper, setpoint, spin) = bound_setpoint();
    mapper.set_submit_policy(SubmitPolicy::Manual);
    {
        let _gui = ctx_loop.enter();
        spin.edit("value", json!(7.0)).expect("edit failed");
    }

    // Not on the context: the submit is queued
    mapper.submit().expect("queued submit should not fail");
    assert_eq!(setpoint.get(), json!(3.0));

    assert_eq!(ctx_loop.run_pending(), 1);
    assert_eq!(setpoint.get(), json!(7.0));
    assert_eq!(mapper.submit_policy(), SubmitPolicy::Manual);
}

#[test]
fn test_off_context_revert_is_queued() {
    let (mut ctx_loop, mapper, _setpoint, spin) = bound_setpoint();
    mapper.set_submit_policy(SubmitPolicy::Manual);
    {
        let _gui = ctx_loop.enter();
        spin.edit("value", json!(99.0)).expect("edit failed");
    }

    thread::scope(|s| {
        s.spawn(|| mapper.revert().expect("queued revert should not fail"));
    });
    assert_eq!(spin.value("value"), Some(json!(99.0)));

    ctx_loop.run_pending();
    assert_eq!(spin.value("value"), Some(json!(3.0)));
}

#[test]
fn test_update_after_loop_dropped_is_discarded() {
    let (ctx_loop, _mapper, setpoint, spin) = bound_setpoint();
    drop(ctx_loop);

    let cell = setpoint.clone();
    thread::spawn(move || cell.set(json!(1.0)))
        .join()
        .expect("instrument thread panicked")
        .expect("model update should not fail when the GUI is gone");
    assert_eq!(spin.value("value"), Some(json!(3.0)));
}

#[tokio::test]
async fn test_context_loop_applies_background_updates() {
    let (mut ctx_loop, _mapper, setpoint, spin) = bound_setpoint();

    let cell = setpoint.clone();
    let instrument = tokio::task::spawn_blocking(move || {
        thread::sleep(Duration::from_millis(10));
        cell.set(json!(42.0))
    });

    assert!(ctx_loop.next().await);
    assert_eq!(spin.value("value"), Some(json!(42.0)));
    instrument
        .await
        .expect("instrument task panicked")
        .expect("model update failed");
}
