// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output is always installed. With the `file-logging` feature an
//! additional JSON log is written per run:
//!
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── handsig.log
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// How logging should be set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Base level or filter directive (`info`, `warn`, `handsig_session=trace,info`)
    pub level: String,
    /// Base directory for per-run log folders
    pub log_dir: PathBuf,
    /// Write the JSON run log (ignored without the `file-logging` feature)
    pub file_output: bool,
    /// Delete run folders older than this many days
    pub retention_days: u64,
    /// Keep at most this many run folders
    pub retention_runs: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_output: true,
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

/// Keeps background log writers alive; logs are flushed when dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder of this run's log files, if file output is active
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

/// Build the `EnvFilter` for a base level and per-crate flags
pub fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter '{}'", directives))
}

/// Install the global subscriber
///
/// # Errors
/// Invalid level directive, unwritable log directory, or a subscriber that
/// is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, settings: &LoggingSettings) -> Result<LoggingGuard> {
    let env_filter = build_filter(debug_flags, &settings.level)?;

    let mut layers = Vec::new();

    // Console layer (human-readable)
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter)
        .boxed();
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guards, run_dir) = if settings.file_output {
        let (layer, guard, run_dir) = file_layer(debug_flags, settings)?;
        layers.push(layer);
        (vec![guard], Some(run_dir))
    } else {
        (Vec::new(), None)
    };
    #[cfg(not(feature = "file-logging"))]
    let run_dir = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("Global tracing subscriber already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        run_dir,
    })
}

#[cfg(feature = "file-logging")]
type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

#[cfg(feature = "file-logging")]
fn file_layer(
    debug_flags: &CrateDebugFlags,
    settings: &LoggingSettings,
) -> Result<(
    BoxedLayer,
    tracing_appender::non_blocking::WorkerGuard,
    PathBuf,
)> {
    use chrono::Utc;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let run_folder = settings.log_dir.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    let removed = cleanup_old_logs(
        &settings.log_dir,
        settings.retention_days,
        settings.retention_runs,
        Utc::now(),
    )?;
    if removed > 0 {
        eprintln!("Removed {} old log folders from {}", removed, settings.log_dir.display());
    }

    let appender = tracing_appender::rolling::never(&run_folder, "handsig.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(build_filter(debug_flags, &settings.level)?)
        .boxed();

    Ok((layer, guard, run_folder))
}

/// Remove run folders by age, then by count. Returns how many were removed.
///
/// Folders whose names do not parse as `run_YYYYmmdd_HHMMSS` are left alone.
#[cfg(feature = "file-logging")]
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<usize> {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

    if !base_log_dir.exists() {
        return Ok(0);
    }

    let cutoff = now - chrono::Duration::days(retention_days as i64);
    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();

    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run_"))
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y%m%d_%H%M%S").ok());
        if let Some(naive) = stamp {
            runs.push((path, Utc.from_utc_datetime(&naive)));
        }
    }

    // Newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (index, (path, started)) in runs.iter().enumerate() {
        if *started < cutoff || index >= retention_runs.max(1) {
            match std::fs::remove_dir_all(path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!(
                    "Warning: Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }

    Ok(removed)
}
