//! Logging setup over `tracing-subscriber`.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "AYUSHLENS_LOG";

/// Log levels, mapped onto the tracing hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }

    /// Default filter directive for this crate at this level.
    pub fn directive(self) -> String {
        format!("ayushlens={}", self.to_tracing_level())
    }
}

/// Initialize logging at `level`, unless `AYUSHLENS_LOG` says otherwise.
///
/// Logs go to stderr so they don't interleave with the terminal front end.
///
/// ```no_run
/// use ayushlens::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Info);
/// tracing::info!("Application starting");
/// ```
///
/// ```bash
/// AYUSHLENS_LOG=ayushlens=debug ayushlens
/// ```
pub fn init_logging(level: LogLevel) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.directive()));

    // try_init: a second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(env_filter)
        .try_init();

    tracing::debug!("Logging initialized at level: {:?}", level);
}

/// Initialize logging with a custom filter string, e.g. `"ayushlens=debug,ayushlens::backend=trace"`.
pub fn init_logging_with_filter(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| {
        eprintln!("Invalid log filter '{}', using ayushlens=info", filter);
        EnvFilter::new(LogLevel::Info.directive())
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(env_filter)
        .try_init();

    tracing::debug!("Logging initialized with custom filter: {}", filter);
}
