//! Tracing subscriber setup for the binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a compact stderr logger.
///
/// `RUST_LOG` wins when set; otherwise the ledger logs at `info`, or `debug`
/// when `verbose`. Stdout is left alone for the CSV report.
pub fn init(verbose: bool) {
    let default = if verbose {
        "freelance_ledger=debug,info"
    } else {
        "freelance_ledger=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
