//! Tracing setup for binaries embedding Roundtable.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by
/// `default_directive` when `RUST_LOG` is unset or invalid.
///
/// Logs go to stderr so stdout stays free for the transport. Calling it
/// twice is harmless: the second call leaves the first subscriber in place
/// and returns `false`.
///
/// # Example
///
/// ```no_run
/// roundtable::telemetry::init_tracing("info,roundtable_room=debug");
/// tracing::info!("bot starting");
/// ```
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
