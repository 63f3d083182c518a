#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! A single place for the (external) UI binary to install a `tracing`
//! subscriber before it starts driving panels and tasks. Every other
//! crate in the workspace only calls into `tracing`'s macros directly;
//! none of them install a subscriber themselves, so a consumer that
//! never calls [`init`] gets the default no-op subscriber with zero
//! overhead.
//!
//! # Design
//!
//! A thin wrapper around `tracing_subscriber::EnvFilter` so the log
//! level is controlled by the `DPAN_LOG` environment variable (falling
//! back to `info`), rather than every consumer hand-rolling its own
//! filter construction.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the default filter directive.
pub const LOG_ENV: &str = "DPAN_LOG";

/// Install a global `tracing` subscriber reading its filter from
/// [`LOG_ENV`] (default `info`).
///
/// Idempotent: a second call after the global subscriber is already set
/// is a silent no-op, matching `tracing`'s own `set_global_default`
/// contract.
pub fn init() {
    init_with_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")));
}

/// Install a global `tracing` subscriber with an explicit filter,
/// bypassing [`LOG_ENV`]. Useful for tests that want deterministic
/// verbosity.
pub fn init_with_filter(filter: EnvFilter) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    // Multiple test binaries in the same process may race to install
    // the subscriber; ignore the error rather than panic.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
