//! `opsrelay serve` — Start the WebSocket chat gateway.

use opsrelay_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("opsrelay gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Backend:   {}", config.backend.base_url);
    println!("   Model:     {}", config.provider.model);

    opsrelay_gateway::start(config).await?;

    Ok(())
}
