//! Logging setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. `HOSTSWITCH_LOG` wins over `-v` flags.
pub fn init(verbosity: u8, filter: Option<&str>) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("hostswitch={default}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
