//! `opsrelay config` — Configuration management.

use opsrelay_config::AppConfig;

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");

    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote default config: {}", path.display());
    println!("Set OPSRELAY_API_KEY (or edit the file) before serving.");
    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Provider:");
    println!("   api_url:  {}", config.provider.api_url);
    println!("   model:    {}", config.provider.model);
    println!("   api_key:  {}", if config.has_api_key() { "set" } else { "NOT SET" });
    println!("Backend:");
    println!("   base_url: {}", config.backend.base_url);
    println!("   auth:     {}", if config.backend.auth_url.is_some() { "IAM token" } else { "none" });
    println!("Gateway:");
    println!("   bind:     {}:{}", config.gateway.host, config.gateway.port);
    if !config.tools.is_empty() {
        println!("Extra tools: {}", config.tools.len());
    }
    Ok(())
}
