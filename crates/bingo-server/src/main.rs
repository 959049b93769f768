use bingo_server::{BingoError, BingoServer, ServerConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), BingoError> {
    init_tracing();

    let config = ServerConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
    })?;

    let server = BingoServer::from_config(config).await?;
    server.run().await
}
