// Logging
//
// `init_tracing` sets up the process-wide subscriber. The exchange logger
// keeps a JSONL record of every prompt sent to the model and its reply.

pub mod exchange_logger;

pub use exchange_logger::{ExchangeLogger, LogEntry};

use tracing_subscriber::EnvFilter;

/// Default filter when RUST_LOG is unset
const DEFAULT_DIRECTIVE: &str = "worldsim=info";

/// Install the fmt subscriber, writing to stderr
///
/// `RUST_LOG` overrides the default `worldsim=info`. Calling twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
