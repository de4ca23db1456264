//! Telemetry initialization.
//!
//! Logs go to stderr so that merged YAML on stdout stays clean. The filter
//! comes from `RUST_LOG` when set; `--debug` forces `debug` level. With
//! neither, only warnings and errors are shown.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Initialize the tracing subscriber.
///
/// Safe to call once per process; later calls are ignored (useful in
/// tests, where the first initializer wins).
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
