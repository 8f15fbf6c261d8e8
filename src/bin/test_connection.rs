//! Test the connection to Homebridge and summarize what the server would expose

use anyhow::{bail, Context, Result};
use clap::Parser;
use homebridge_mcp::{
    client::{HomebridgeClient, HomebridgeHttpClient},
    tools::generate,
    ServerConfig,
};
use std::path::PathBuf;
use tracing::{error, info};

/// Homebridge connection test
#[derive(Parser, Debug)]
#[command(name = "homebridge-mcp-test-connection")]
#[command(about = "Fetch accessories from Homebridge and list the tools they produce")]
struct Args {
    /// TOML configuration file (environment variables are used otherwise)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Write the raw accessory list to this file as JSON
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ServerConfig::from_env().context("Failed to read configuration from environment")?,
    };
    config.validate().context("Invalid configuration")?;

    println!("\nTesting Homebridge connection");
    println!("========================================\n");
    println!("URL:  {}", config.homebridge.url);
    println!(
        "Auth: {}",
        if config.credentials.token.is_some() {
            "bearer token"
        } else {
            "username/password login"
        }
    );
    println!();

    let client = HomebridgeHttpClient::new(&config.homebridge, config.credentials.clone())?;

    info!("Fetching accessories...");
    let accessories = match client.get_accessories().await {
        Ok(accessories) => accessories,
        Err(e) => {
            error!("Connection test failed: {e}");
            if e.is_auth_error() {
                error!("Check HOMEBRIDGE_TOKEN, or HOMEBRIDGE_USERNAME and HOMEBRIDGE_PASSWORD");
            }
            return Err(e).context("Homebridge connection test failed");
        }
    };

    println!("Accessories: {}", accessories.len());
    for accessory in &accessories {
        let writable = accessory
            .service_characteristics
            .iter()
            .filter(|c| c.can_write)
            .count();
        println!(
            "  {:<32} {:<20} {} ({} characteristics, {} writable)",
            accessory.display_name(),
            accessory.human_type,
            accessory.unique_id,
            accessory.service_characteristics.len(),
            writable
        );
    }

    let generation = generate(&accessories);
    println!("\nGenerated tools: {}", generation.tools.len());
    for tool in &generation.tools {
        println!("  {}", tool.name);
    }
    if !generation.skipped.is_empty() {
        println!("\nSkipped characteristics: {}", generation.skipped.len());
        for skipped in &generation.skipped {
            println!(
                "  {}/{}: {:?}",
                skipped.target.unique_id, skipped.target.characteristic_type, skipped.reason
            );
        }
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&accessories)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nAccessory list written to {}", path.display());
    }

    if accessories.is_empty() {
        bail!("Homebridge returned no accessories");
    }

    println!("\nConnection test passed");
    Ok(())
}
