use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use turnover::api::{self, AppState};
use turnover::config::ServerConfig;
use turnover::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "turnover")]
#[command(version)]
#[command(about = "Cleaning job coordination service for short-term rentals")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8000")]
    port: u16,

    /// Host address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Token signing secret. Tokens become invalid if this changes, so set
    /// it explicitly for any deployment that restarts.
    #[arg(long, env = "TURNOVER_TOKEN_SECRET")]
    token_secret: Option<String>,

    /// Validity window for issued tokens, in seconds
    #[arg(long, default_value = "86400")]
    token_ttl_secs: i64,

    /// How long past expiry a token may still be refreshed, in seconds
    #[arg(long, default_value = "3600")]
    refresh_grace_secs: i64,

    /// Directory for uploaded checklist photos
    #[arg(long, default_value = "media")]
    media_dir: PathBuf,

    /// Require every checklist item to be checked before a job can be
    /// marked complete
    #[arg(long)]
    require_checklist: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let secret = match args.token_secret {
        Some(secret) => secret,
        None => {
            tracing::warn!(
                "No token secret configured, generating one; \
                 tokens will not survive a restart"
            );
            uuid::Uuid::new_v4().simple().to_string()
        }
    };

    let listen_addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    let mut config = ServerConfig::new(listen_addr)
        .with_secret(secret)
        .with_media_dir(args.media_dir)
        .require_checklist_complete(args.require_checklist);
    config.auth.token_ttl_secs = args.token_ttl_secs;
    config.auth.refresh_grace_secs = args.refresh_grace_secs;

    tracing::info!(
        addr = %config.listen_addr,
        media_dir = %config.media_dir.display(),
        require_checklist = config.require_checklist_complete,
        "Starting turnover"
    );

    let state = AppState::new(&config);
    state.media.ensure_dir().await?;

    let shutdown = install_shutdown_handler();
    api::serve(&config, state, shutdown).await?;

    Ok(())
}
