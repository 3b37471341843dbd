//! RAX FTPS Server - Entry Point

use std::sync::Arc;

use env_logger::{Builder, Env};
use log::info;

use rax_ftps_server::auth::StaticCredentials;
use rax_ftps_server::error::ServerError;
use rax_ftps_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // RUST_LOG overrides the default level
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ServerConfig::load()?;
    let credentials = StaticCredentials::from_config(&config.users);
    info!(
        "Launching FTPS server with {} accounts, root {}",
        credentials.account_count(),
        config.server_root
    );

    let server = Server::bind(&config, Arc::new(credentials)).await?;
    server.run().await;
    Ok(())
}
