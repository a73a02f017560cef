//! NFID registry command line interface
//!
//! Thin client for a running `nfid-node`. Addresses and identity values are
//! validated locally before any request is sent.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nfid_types::{Address, Nfid};
use serde_json::Value;
use tracing::debug;

#[derive(Parser)]
#[command(name = "nfid-cli")]
#[command(about = "NFID identity registry command line interface", long_about = None)]
#[command(version)]
struct Cli {
    /// RPC endpoint URL
    #[arg(long, alias = "rpc", default_value = "http://localhost:8080")]
    rpc_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue an NFID to an address
    Mint {
        /// Account address (0x + 40 hex chars)
        address: Address,
        /// Identity value
        nfid: Nfid,
    },
    /// Revoke an address's NFID
    Burn {
        /// Account address
        address: Address,
        /// Identity value expected to be active
        nfid: Nfid,
    },
    /// Whether the address currently holds an NFID
    Check {
        /// Account address
        address: Address,
    },
    /// The NFID held by the address (0 if none)
    Find {
        /// Account address
        address: Address,
    },
    /// Whether the address currently holds exactly this NFID
    Associated {
        /// Account address
        address: Address,
        /// Identity value
        nfid: Nfid,
    },
    /// List registry events
    Events {
        /// Only show events after this sequence number
        #[arg(long, default_value_t = 0)]
        since: u64,
    },
    /// Node health and registry summary
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let rpc_url = cli.rpc_url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Mint { address, nfid } => {
            post_nfid(&client, &rpc_url, "mint", &address, nfid).await
        }
        Commands::Burn { address, nfid } => {
            post_nfid(&client, &rpc_url, "burn", &address, nfid).await
        }
        Commands::Check { address } => {
            get_json(&client, format!("{rpc_url}/nfid/{address}/check")).await
        }
        Commands::Find { address } => get_json(&client, format!("{rpc_url}/nfid/{address}")).await,
        Commands::Associated { address, nfid } => {
            get_json(
                &client,
                format!("{rpc_url}/nfid/{address}/associated/{nfid}"),
            )
            .await
        }
        Commands::Events { since } => {
            get_json(&client, format!("{rpc_url}/events?since={since}")).await
        }
        Commands::Health => get_json(&client, format!("{rpc_url}/health")).await,
    }
}

async fn post_nfid(
    client: &reqwest::Client,
    rpc_url: &str,
    action: &str,
    address: &Address,
    nfid: Nfid,
) -> Result<()> {
    let payload = serde_json::json!({
        "address": address.to_string(),
        "nfid": nfid.value(),
    });
    debug!(%address, %nfid, action, "Submitting registry update");

    let response = client
        .post(format!("{rpc_url}/nfid/{action}"))
        .json(&payload)
        .send()
        .await
        .with_context(|| format!("failed to reach {rpc_url}"))?;

    print_response(response, action).await
}

async fn get_json(client: &reqwest::Client, url: String) -> Result<()> {
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("failed to reach {url}"))?;

    print_response(response, "query").await
}

async fn print_response(response: reqwest::Response, action: &str) -> Result<()> {
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);

    if status.is_success() {
        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(())
    } else {
        anyhow::bail!(
            "{action} rejected (status {}): {}",
            status,
            serde_json::to_string_pretty(&body)?
        )
    }
}
