use probe_core::ProbeConfig;
use probe_server::ProbeServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = ProbeConfig::load(None)?;
    config
        .server
        .apply_port_override(std::env::var("PORT").ok().as_deref());

    ProbeServer::new(config).run().await?;
    Ok(())
}
