//! Tracing subscriber for the native CLI.
//!
//! The library itself only emits `tracing` events; binaries decide where they
//! go. Vault and transport events carry ids, addresses and paths as fields,
//! never key material.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the process-wide subscriber. `RUST_LOG` filters (default `info`),
/// `SILEX_LOG_JSON=1` switches to JSON lines. Output goes to stderr so stdout
/// stays machine readable.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("SILEX_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
