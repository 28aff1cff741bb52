//! Astra RPC Server
//!
//! Serves Ethereum-convention JSON-RPC calls through the compatibility shim
//! and forwards them to an Astra node. Loads configuration from
//! environment/.env file and starts the JSON-RPC server on the configured port.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use astra_rpc::config::Config;
use astra_rpc::server::start_server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::from_env()?;

    info!(
        "astra-rpc {} serving eth_* on port {} for {} chain {}",
        env!("CARGO_PKG_VERSION"),
        config.rpc_port,
        config.chain_type,
        config.chain_id.to_hex()
    );
    info!("Node endpoint {} (default shard {})", config.chain_url, config.shard_id);
    for shard in &config.sharding {
        info!(
            "  shard {:?}: http={} ws={}{}",
            shard.shard_id,
            shard.http.as_deref().unwrap_or("-"),
            shard.ws.as_deref().unwrap_or("-"),
            if shard.current == Some(true) { " (current)" } else { "" }
        );
    }
    info!(
        "Shim gas ceiling {}, gas price {}",
        config.gas_limit, config.gas_price
    );

    start_server(config).await?;

    Ok(())
}
