pub mod config;
pub mod dialogue; // Session engine: classify, input, aggregate, controller
pub mod history; // Archive of finished sessions
pub mod models;
pub mod report; // Lab analysis report parsing
pub mod transport; // Diagnosis backend seam + HTTP client

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Returns `false` when a subscriber was already installed.
pub fn init_tracing() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("Tracing subscriber already installed; keeping it");
    }
    installed
}
