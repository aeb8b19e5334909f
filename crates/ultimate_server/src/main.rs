//! Ultimate tic-tac-toe session server binary.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;
use ultimate_server::{AppState, Hub, IdentityService, JwtIdentity, ServerConfig, router};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            pool_size,
        } => {
            let mut config = load_config(config, cli.secret)?;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(pool_size) = pool_size {
                config = config.with_pool_size(pool_size);
            }
            run_server(config).await
        }
        Command::Token { player_id, config } => {
            let config = load_config(config, cli.secret)?;
            mint_token(&config, &player_id)
        }
    }
}

/// Reads the config file (or defaults) and applies the signing secret.
fn load_config(path: Option<PathBuf>, secret: Option<String>) -> Result<ServerConfig> {
    let config = match path {
        Some(path) => ServerConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    Ok(match secret {
        Some(secret) => config.with_signing_secret(secret),
        None => config,
    })
}

fn identity_service(config: &ServerConfig) -> Result<Arc<JwtIdentity>> {
    config.validate()?;
    Ok(Arc::new(JwtIdentity::new(
        config.signing_secret().as_bytes(),
        config.token_ttl(),
    )))
}

/// Run the WebSocket game server
#[instrument(skip_all, fields(pool_size = config.pool_size(), address = %config.bind_address()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    let identity = identity_service(&config)?;
    info!(?config, "Starting ultimate tic-tac-toe server");

    let hub = Hub::new(*config.pool_size(), identity.clone()).spawn();
    let app = router(AppState::new(hub, identity, *config.outbound_capacity()));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Server ready at ws://{}/ws", config.bind_address());

    axum::serve(listener, app).await?;
    Ok(())
}

fn mint_token(config: &ServerConfig, player_id: &str) -> Result<()> {
    let token = identity_service(config)?.mint(player_id)?;
    println!("{token}");
    Ok(())
}
