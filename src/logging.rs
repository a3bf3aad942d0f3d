use std::io;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the diagnostic subscriber.
///
/// Filtering comes from `RUST_LOG` and defaults to `warn`. Output goes to stderr
/// so stdout only ever carries echoed error lines and the summary.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
