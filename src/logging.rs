//! Logging functionality for claimdoc
//!
//! Diagnostics are emitted with the `tracing` crate. Console results printed by the
//! binary are separate and always go to stdout; logs go to stderr.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV_VAR: &str = "CLAIMDOC_LOG";

/// Log levels supported by claimdoc.
///
/// These map to the tracing level hierarchy: ERROR, WARN, INFO, DEBUG, TRACE.
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

    /// Map a `-v` count to a level: none is WARN, then INFO, DEBUG, TRACE.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Initialize logging with a specific log level.
///
/// Call once at the start of the program. Setting `CLAIMDOC_LOG` takes precedence
/// over `level`:
///
/// ```bash
/// CLAIMDOC_LOG=claimdoc=debug claimdoc --file-list file_list.txt
/// ```
pub fn init_logging(level: LogLevel) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(format!("claimdoc={}", level.to_tracing_level())));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    tracing::debug!("claimdoc logging initialized at level: {:?}", level);
}

/// Initialize logging with a custom filter string such as
/// `"claimdoc=info,claimdoc::auth=trace"`.
pub fn init_logging_with_filter(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| {
        eprintln!("Invalid log filter '{}', using claimdoc=info", filter);
        EnvFilter::new("claimdoc=info")
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    tracing::debug!("claimdoc logging initialized with custom filter: {}", filter);
}
