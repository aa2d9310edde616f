// Voice Polish Admin - local web panel for filler words, replacements and history
#![allow(clippy::needless_return)]

pub mod constants;
pub mod errors;
pub mod handlers;
pub mod paths;
pub mod server;
pub mod state;
pub mod templates;
mod util;

use tracing::info;

pub use errors::AppError;
pub use server::{router, AppState, Server, ServerConfig};
pub use state::{normalize, Document, HistoryEntry, ReplacementEntry, Store};

/// Installs the global tracing subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Voice Polish Admin starting up");
}

pub async fn run(config: ServerConfig) -> Result<(), AppError> {
    info!(
        addr = %config.addr,
        state_path = %config.state_path.display(),
        "Starting admin server"
    );
    Server::new(config).run().await
}
