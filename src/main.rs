use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use voice_polish_admin_lib::constants::{DEFAULT_HOST, DEFAULT_PORT};
use voice_polish_admin_lib::paths::resolve_state_path;
use voice_polish_admin_lib::{AppError, ServerConfig};

#[derive(Parser)]
#[command(name = "voice-polish-admin")]
#[command(version)]
#[command(about = "Local admin panel for voice polish filler words, replacements and history", long_about = None)]
struct Cli {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// State file (defaults to $VOICE_POLISH_STATE_PATH or the app support directory)
    #[arg(short, long)]
    state_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    voice_polish_admin_lib::init_logging(&cli.log_level);

    let ip: IpAddr = cli
        .host
        .parse()
        .map_err(|e| AppError::Server(format!("Invalid host {}: {}", cli.host, e)))?;

    let config = ServerConfig {
        addr: SocketAddr::new(ip, cli.port),
        state_path: resolve_state_path(cli.state_path.as_deref()),
    };

    voice_polish_admin_lib::run(config).await
}
