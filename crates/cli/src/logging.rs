//! Log output for the `myadmin` binary.
//!
//! Library crates emit through the `log` facade; the fmt subscriber installed
//! here picks those records up through its `tracing-log` bridge. Output goes
//! to stderr so it never mixes with command output.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(level: &str, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        match level.trim().to_ascii_lowercase().as_str() {
            "error" => "error",
            "warn" | "warning" => "warn",
            "debug" => "debug",
            "trace" => "trace",
            "off" => "off",
            _ => "info",
        }
    };
    format!("myadmin={level}")
}

/// Initialize the global subscriber. Subsequent calls are no-ops.
pub fn init(level: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level, verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
