//! Emergency Alerts end-to-end runner
//!
//! Runs the preflight checks and the switch synchronization scenarios
//! against a running Home Assistant instance.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ea_client::HaClient;
use ea_core::{AlertId, EntityId};
use ea_e2e::alerts::AlertHelpers;
use ea_e2e::config::E2eConfig;
use ea_e2e::preflight;
use ea_e2e::scenarios::SyncSuite;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "alerts-e2e", version, about = "End-to-end checks for Emergency Alerts")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "E2E_CONFIG")]
    config: Option<PathBuf>,

    /// Home Assistant base URL (overrides config and HA_URL)
    #[arg(long)]
    url: Option<String>,

    /// Long-lived access token (overrides config and HA_TOKEN)
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that Home Assistant is up and the integration has alerts
    Preflight,

    /// Run the switch synchronization scenarios
    Sync {
        /// Alert to exercise (default: configured alert, then the first one found)
        #[arg(long)]
        alert: Option<AlertId>,
    },

    /// Wait for an entity to reach a state
    WaitState {
        entity_id: EntityId,
        expected: String,
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },

    /// Wait for an entity attribute to equal a JSON value
    WaitAttribute {
        entity_id: EntityId,
        attribute: String,
        /// JSON value; anything that does not parse is taken as a string
        expected: String,
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let mut config = E2eConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(url) = cli.url {
        config.client.base_url = url;
    }
    if let Some(token) = cli.token {
        config.client.token = Some(token);
    }

    let client = HaClient::new(config.client.clone())?;

    match cli.command {
        Command::Preflight => {
            let report = preflight::run(&client, config.ready_timeout).await?;
            report.print_summary();
            if !report.is_ready() {
                bail!("preflight found problems");
            }
        }
        Command::Sync { alert } => {
            preflight::run(&client, config.ready_timeout).await?;

            let helpers = AlertHelpers::new(client, config.switch_timeout);
            let alert = match alert.or(config.alert) {
                Some(alert) => alert,
                None => helpers.first_alert().await?,
            };
            info!(%alert, "using test alert");

            let mut suite = SyncSuite::new(helpers, alert);
            suite.run_all().await;
            suite.print_summary();
            if !suite.all_passed() {
                bail!("switch synchronization scenarios failed");
            }
        }
        Command::WaitState {
            entity_id,
            expected,
            timeout_ms,
        } => {
            client
                .wait_for_state(&entity_id, &expected, Duration::from_millis(timeout_ms))
                .await?;
            println!("{} is {}", entity_id, expected);
        }
        Command::WaitAttribute {
            entity_id,
            attribute,
            expected,
            timeout_ms,
        } => {
            let expected: Value =
                serde_json::from_str(&expected).unwrap_or(Value::String(expected));
            client
                .wait_for_attribute(
                    &entity_id,
                    &attribute,
                    expected.clone(),
                    Duration::from_millis(timeout_ms),
                )
                .await?;
            println!("{}.{} is {}", entity_id, attribute, expected);
        }
    }

    Ok(())
}
