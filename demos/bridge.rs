//! Demo: run the full bridge against the canned stub client.
//!
//! Needs a config file (run the wizard demo first, or write one by hand)
//! and an MQTT broker at the configured URL.

mod stub_client;

use clap::Parser;

use totalconnect2mqtt::bridge::Bridge;
use totalconnect2mqtt::client::share;
use totalconnect2mqtt::config::BridgeConfig;

#[derive(Parser)]
#[command(name = "bridge")]
#[command(about = "Run the Total Connect MQTT bridge with a canned demo client")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "bridge.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config = BridgeConfig::load(&cli.config)?;

    let client = stub_client::StubClient::connect(
        &config.service.username,
        &config.service.password,
        &config.service.usercodes,
        config.options.auto_bypass_low_battery,
    )?;

    Bridge::new(config, share(client))
        .with_config_path(&cli.config)
        .serve()
        .await?;

    Ok(())
}
