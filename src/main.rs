//! Headless walkthrough of the binding engine.
//!
//! Binds a numeric entry to a laser setpoint and runs three scenarios:
//! an operator edit, instrument updates arriving from another thread, and a
//! buffered edit that is submitted and then reverted.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use daq_mapper::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mapper-demo", about = "Display <-> model binding walkthrough")]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = daq_mapper::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Submit policy override ("auto" or "manual")
    #[arg(long)]
    policy: Option<String>,

    /// Number of instrument updates sent from the background thread
    #[arg(long, default_value_t = 5)]
    updates: u32,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = MapperConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let (handle, mut ctx_loop) = OwningContext::new("gui");
    let _gui = ctx_loop.enter();

    let mapper = Mapper::with_config(handle, &config);
    if let Some(policy) = &cli.policy {
        mapper.set_submit_policy_str(policy)?;
    }

    let setpoint = PropertyCell::new("setpoint", json!(3.0));
    let logic = Arc::new(ModelObject::new("laser_logic").with_cell(&setpoint));
    let spin = Arc::new(HeadlessWidget::numeric_entry(0.0));

    mapper.add_binding(
        BindingRequest::new(spin.clone(), logic, "setpoint").model_notifier("setpoint_changed"),
    )?;
    tracing::info!(display = %spin.value("value").unwrap_or_default(), "Bound setpoint");

    // A: operator edit
    if mapper.submit_policy() == SubmitPolicy::Auto {
        spin.edit("value", json!(4.5))?;
        tracing::info!(model = %setpoint.get(), "Operator edit applied");
    }

    // B: instrument updates from another thread, applied by the context loop
    let instrument = {
        let setpoint = setpoint.clone();
        let updates = cli.updates;
        std::thread::spawn(move || -> anyhow::Result<()> {
            for step in 1..=updates {
                std::thread::sleep(Duration::from_millis(20));
                setpoint.set(json!(10.0 + f64::from(step)))?;
            }
            Ok(())
        })
    };
    for _ in 0..cli.updates {
        if !ctx_loop.next().await {
            break;
        }
        tracing::info!(display = %spin.value("value").unwrap_or_default(), "Instrument update shown");
    }
    instrument
        .join()
        .map_err(|_| anyhow::anyhow!("instrument thread panicked"))??;

    // C: buffered edit, submit, then revert
    mapper.set_submit_policy(SubmitPolicy::Manual);
    spin.edit("value", json!(7.0))?;
    tracing::info!(model = %setpoint.get(), "Edit buffered");
    mapper.submit()?;
    tracing::info!(model = %setpoint.get(), "Submitted");

    spin.edit("value", json!(9.0))?;
    mapper.revert()?;
    tracing::info!(display = %spin.value("value").unwrap_or_default(), "Reverted");

    mapper.clear_mapping();
    tracing::info!(bindings = mapper.len(), "Mapping cleared");
    Ok(())
}
