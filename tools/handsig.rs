// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! handsig - publish hand gesture symbols to an MQTT broker
//!
//! Reads landmark frames (one JSON document per line) from stdin or a file,
//! classifies the first qualifying hand each tick and publishes its 5-bit
//! symbol to the configured topic.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use handsig::config::{load_config, load_defaults, validate_config, ConfigError, HandsigConfig};
use handsig::observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingSettings};
use handsig::pipeline::{connect_with_retry, settings, JsonLinesSource, PipelineDriver};
use handsig::session::{MemoryBroker, PublishSession, SessionConfig};

/// Hand gesture telemetry publisher
#[derive(Parser, Debug)]
#[command(name = "handsig", version, author, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Path to handsig_configuration.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Landmark frames, one JSON document per line ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Broker host (overrides broker.host)
    #[arg(long)]
    broker_host: Option<String>,

    /// Broker port (overrides broker.port)
    #[arg(long)]
    broker_port: Option<u16>,

    /// Publish topic (overrides broker.topic)
    #[arg(long)]
    topic: Option<String>,

    /// MQTT client identifier (overrides broker.client_id)
    #[arg(long)]
    client_id: Option<String>,

    /// Publish to an in-process broker instead of the network
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Enable debug logging for crates (comma-separated, or "all")
    #[arg(long, value_delimiter = ',')]
    debug: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(host) = &self.broker_host {
            overrides.insert("broker.host".to_string(), host.clone());
        }
        if let Some(port) = self.broker_port {
            overrides.insert("broker.port".to_string(), port.to_string());
        }
        if let Some(topic) = &self.topic {
            overrides.insert("broker.topic".to_string(), topic.clone());
        }
        if let Some(client_id) = &self.client_id {
            overrides.insert("broker.client_id".to_string(), client_id.clone());
        }
        overrides
    }
}

/// Load the configuration. A missing file is only fatal when it was named
/// explicitly; the returned note is logged once logging is up.
fn load(args: &Args) -> Result<(HandsigConfig, Option<String>)> {
    let overrides = args.overrides();
    if let Some(path) = &args.config {
        let config = load_config(Some(path.as_path()), Some(&overrides))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        return Ok((config, None));
    }

    match load_config(None, Some(&overrides)) {
        Ok(config) => Ok((config, None)),
        Err(ConfigError::FileNotFound(searched)) => {
            let config = load_defaults(Some(&overrides)).context("Invalid configuration override")?;
            Ok((
                config,
                Some(format!(
                    "No configuration file found ({}), using defaults",
                    searched
                )),
            ))
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

/// Symbols the dry-run broker keeps for the summary line
const DRY_RUN_RETENTION: usize = 20;

fn dry_run_broker() -> MemoryBroker {
    MemoryBroker::new().with_retention(DRY_RUN_RETENTION)
}

/// Most recent payloads held by the dry-run broker, oldest first
fn delivered_tail(broker: &MemoryBroker) -> String {
    broker.payloads().join(" ")
}

fn open_session(config: SessionConfig, dry_run: bool, broker: &MemoryBroker) -> Result<PublishSession> {
    if dry_run {
        info!("Dry run: publishing to an in-process broker");
        return Ok(PublishSession::new(config, broker.transport()));
    }

    #[cfg(feature = "mqtt")]
    {
        Ok(PublishSession::mqtt(config))
    }
    #[cfg(not(feature = "mqtt"))]
    {
        anyhow::bail!("Built without the `mqtt` feature; use --dry-run")
    }
}

fn open_source(input: &str, config: &HandsigConfig) -> Result<JsonLinesSource> {
    let thresholds = settings::detection_thresholds(config);
    let timeout = settings::capture_timeout(config);
    if input == "-" {
        info!("Reading landmark frames from stdin");
        return Ok(JsonLinesSource::stdin(thresholds, timeout));
    }
    info!("Reading landmark frames from {}", input);
    JsonLinesSource::open(Path::new(input), thresholds, timeout)
        .context("Failed to open landmark source")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_note) = load(&args)?;

    let debug_flags = parse_debug_flags(&args.debug);
    let logging = LoggingSettings {
        level: if args.verbose {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        },
        log_dir: config.logging.log_dir.clone(),
        file_output: true,
        retention_days: config.logging.retention_days,
        retention_runs: config.logging.retention_runs,
    };
    let _log_guard = init_logging(&debug_flags, &logging).context("Failed to initialize logging")?;

    if let Some(note) = config_note {
        warn!("{}", note);
    }
    validate_config(&config).context("Invalid configuration")?;

    info!("handsig v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "  Broker: {}:{}  topic: '{}'  client: '{}'  qos: {}",
        config.broker.host,
        config.broker.port,
        config.broker.topic,
        config.broker.client_id,
        config.broker.qos
    );

    let source = open_source(&args.input, &config)?;
    let smoothing = settings::smoothing_filter(&config).context("Invalid smoothing window")?;
    if let Some(filter) = &smoothing {
        info!("  Smoothing: majority of {} ticks", filter.window());
    }

    let broker = dry_run_broker();
    let session_config = settings::session_config(&config).context("Invalid broker settings")?;
    let mut session = open_session(session_config, args.dry_run, &broker)?;
    connect_with_retry(
        &mut session,
        &settings::connect_options(&config),
        config.broker.startup_retries,
        config.broker.retry_backoff_ms,
    )
    .context("Failed to connect to broker")?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to install signal handler")?;

    let mut driver = PipelineDriver::new(source, session, settings::tick_interval(&config))
        .with_smoothing(smoothing);

    info!("🔄 Pipeline running (Press Ctrl+C to stop)...");
    let outcome = driver.run(&running);
    let (stats, session_stats) = driver.shutdown();

    info!(
        "Summary: {} ticks, {} hands, {} published, {} acknowledged, {} dropped, {} reconnects",
        stats.ticks,
        stats.hands_seen,
        stats.published,
        session_stats.acknowledged,
        stats.dropped + session_stats.dropped,
        session_stats.reconnects
    );
    if args.dry_run {
        info!(
            "Dry run delivered {} symbols, last {}: {}",
            session_stats.published,
            broker.payloads().len(),
            delivered_tail(&broker)
        );
    }

    outcome.context("Landmark capture failed")?;
    info!("✅ handsig shutdown complete");
    Ok(())
}
