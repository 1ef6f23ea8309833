//! `probe serve` - start the HTTP server.

use probe_core::ProbeConfig;
use probe_server::ProbeServer;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, bind: Option<&str>) -> anyhow::Result<()> {
    let mut config = ProbeConfig::load(config_path)?;
    config
        .server
        .apply_port_override(std::env::var("PORT").ok().as_deref());

    if let Some(bind) = bind {
        let (host, port) = bind
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("--bind expects HOST:PORT, got '{}'", bind))?;
        config.server.host = host.to_string();
        config.server.port = port
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid port in --bind '{}'", bind))?;
    }

    ProbeServer::new(config).run().await?;
    Ok(())
}
