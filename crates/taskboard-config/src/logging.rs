//! Logging initialization for the client.
//!
//! Every binary in the workspace calls [`init_logging`] once at startup and
//! uses plain `tracing` macros afterwards. Structured JSONL goes to
//! `~/.taskboard/logs/client.jsonl`; a compact human-readable copy can also go
//! to stderr.

use crate::{CoreError, CoreResult, Paths};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging options.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Name recorded in the startup event.
    pub service_name: String,
    /// Level used when `RUST_LOG` is not set.
    pub default_level: String,
    /// JSONL output file. `None` disables file output.
    pub log_path: Option<PathBuf>,
    /// Mirror logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            service_name: "taskboard".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Append-only log file writer, flushed after every write.
#[derive(Clone)]
struct LogFileWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl LogFileWriter {
    fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for LogFileWriter {
    type Writer = LogFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize logging for the client with the standard file location.
///
/// * `level` - Default log level (trace, debug, info, warn, error)
/// * `also_stderr` - Mirror events to stderr
pub fn init_logging(paths: &Paths, level: &str, also_stderr: bool) -> CoreResult<()> {
    init_logging_with(LogOptions {
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path: Some(paths.log_file()),
        also_stderr,
        ..Default::default()
    })
}

/// Initialize logging with explicit options.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with(options: LogOptions) -> CoreResult<()> {
    let file_layer = match &options.log_path {
        Some(path) => {
            let writer = LogFileWriter::open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(writer)
                    .with_filter(env_filter(&options.default_level)),
            )
        }
        None => None,
    };

    let stderr_layer = options.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&options.default_level))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CoreError::Config(format!("Failed to install logger: {}", e)))?;

    tracing::info!(
        service = %options.service_name,
        log_path = ?options.log_path,
        "logging initialized"
    );
    Ok(())
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
