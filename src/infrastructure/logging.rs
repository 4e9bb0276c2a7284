//! Logging system configuration and initialization
//!
//! Console and optional file output, optional JSON formatting, and a local
//! time timer. `RUST_LOG` overrides the configured filter entirely.

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::defaults;

// Keeps the non-blocking file writer alive for the process lifetime
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Local wall-clock timestamps
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("logs")
}

/// Filter built from the configured level plus per-target overrides
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter = EnvFilter::new(&config.level);

    // Dependency targets stay quiet unless tracing everything
    if !config.level.eq_ignore_ascii_case("trace") {
        for (target, level) in &config.module_filters {
            match format!("{target}={level}").parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => warn!("Ignoring invalid log filter {}={}: {}", target, level, e),
            }
        }
    }

    filter
}

/// Initialize logging with custom configuration
///
/// ```bash
/// # Show HTTP client internals for one run
/// RUST_LOG="debug,reqwest=debug,hyper=debug" merger-tracker run
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_env_filter(config));

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .with_target(false);
        layers.push(if config.json_format { console.json().boxed() } else { console.boxed() });
    }

    if config.file_output {
        let log_dir = config.log_dir.clone().unwrap_or_else(get_log_directory);
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let (file_writer, guard) = non_blocking(rolling::never(&log_dir, defaults::LOG_FILE_NAME));
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(guard);
        }

        let file = fmt::layer()
            .with_writer(file_writer)
            .with_timer(LocalTimeFormatter)
            .with_target(true)
            .with_ansi(false);
        layers.push(if config.json_format { file.json().boxed() } else { file.boxed() });
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    debug!("Logging initialized at level {}", config.level);
    Ok(())
}
