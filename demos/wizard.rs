//! Demo: drive the setup (or reauth) wizard against the canned stub client.
//!
//! The stub accepts any password except "wrong" and the usercode 1234.

mod stub_client;

use std::collections::HashMap;
use std::path::Path;

use clap::Parser;

use totalconnect2mqtt::client::{ClientError, PanelClient};
use totalconnect2mqtt::setup::{self, ClientFactory, SetupOutcome};

#[derive(Parser)]
#[command(name = "wizard")]
#[command(about = "Interactive setup for the Total Connect MQTT bridge")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "bridge.toml")]
    config: String,

    /// Re-collect the password for an existing configuration
    #[arg(long)]
    reauth: bool,
}

struct StubFactory;

impl ClientFactory for StubFactory {
    fn connect(
        &self,
        username: &str,
        password: &str,
        usercodes: &HashMap<u32, String>,
        auto_bypass_low_battery: bool,
    ) -> Result<Box<dyn PanelClient>, ClientError> {
        let client =
            stub_client::StubClient::connect(username, password, usercodes, auto_bypass_low_battery)?;
        Ok(Box::new(client))
    }
}

fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let path = Path::new(&cli.config);

    if cli.reauth {
        setup::run_reauth(path, &StubFactory)?;
        println!("Credentials updated.");
        return Ok(());
    }

    match setup::run_setup(path, &StubFactory)? {
        SetupOutcome::Completed(config) => {
            println!(
                "Setup complete for {} ({} location codes stored).",
                config.service.username,
                config.service.usercodes.len()
            );
        }
        SetupOutcome::Aborted(reason) => println!("Setup aborted: {reason:?}"),
    }

    Ok(())
}
