//! notifyhub - multi-channel notification dispatcher
//!
//! Demo driver: loads the configuration, builds the enabled backends and runs
//! one command against them.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use notifyhub::{app::App, cli::Cli, config::Config, telemetry::LoggingRecorder};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("-------------------- Configuration --------------------");
    debug!("Log Level: {}", config.log_level);
    debug!("Log Metrics: {}", config.log_metrics);
    debug!("Concurrent Dispatch: {}", config.dispatch.concurrent);
    debug!("Output Format: {}", config.output.format);
    debug!("Email: {}", enabled(config.email.enabled));
    debug!("SMS: {}", enabled(config.sms.enabled));
    debug!("Push: {}", enabled(config.push.enabled));
    debug!("Chat: {}", enabled(config.chat.enabled));
    debug!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let metrics_task = if config.log_metrics {
        info!(
            "Logging recorder enabled. Metrics will be printed every {} seconds.",
            config.metrics_interval_seconds
        );
        let (recorder, handle) = LoggingRecorder::new(
            Duration::from_secs(config.metrics_interval_seconds),
            shutdown_rx,
        );
        metrics::set_global_recorder(recorder)
            .map_err(|_| anyhow!("a metrics recorder is already installed"))?;
        Some(handle)
    } else {
        None
    };

    let app = App::from_config(&config);
    match &cli.command {
        Some(command) => println!("{}", app.run(command).await),
        None => warn!("No command given; run with --help to see the available commands."),
    }

    let _ = shutdown_tx.send(());
    if let Some(handle) = metrics_task {
        handle.await.context("metrics task panicked")?;
    }
    Ok(())
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}
