//! riskguard-cli
//!
//! Demo client for a running `riskguard-node`. Submits transactions,
//! triggers fraud simulations, and polls scoring results over REST.
//!
//! Usage:
//!   riskguard-cli submit         --sender <id> --receiver <id> --amount <n> [--node <url>]
//!   riskguard-cli simulate       --fraud-type <type> --sender <id> --receiver <id> --amount <n> [--node <url>]
//!   riskguard-cli status         --id <tx-id> [--node <url>]
//!   riskguard-cli risk-details   --id <tx-id> [--node <url>]
//!   riskguard-cli recent         [--limit <n>] [--node <url>]
//!   riskguard-cli stats          [--node <url>]

use clap::{Parser, Subcommand};

mod rpc_client;
use rpc_client::RiskGuardClient;

#[derive(Parser, Debug)]
#[command(
    name = "riskguard-cli",
    version,
    about = "RiskGuard demo client — submit transactions and poll fraud scoring results"
)]
struct Args {
    /// Node REST endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a plain transaction for evaluation.
    Submit {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        receiver: String,
        #[arg(long)]
        amount: f64,
    },

    /// Submit a deterministic fraud scenario (phishing_url, qr_code_tampering,
    /// high_value, network_fraud).
    Simulate {
        #[arg(long = "fraud-type")]
        fraud_type: String,
        #[arg(long)]
        sender: String,
        #[arg(long)]
        receiver: String,
        #[arg(long)]
        amount: f64,
    },

    /// Poll the status of a submitted transaction.
    Status {
        #[arg(long)]
        id: String,
    },

    /// Fetch the full risk breakdown for a transaction.
    RiskDetails {
        #[arg(long)]
        id: String,
    },

    /// List the most recently submitted transactions.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show the 24h fraud-rate aggregate and the live threshold snapshot.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn,riskguard_cli=info").init();

    let args = Args::parse();
    let client = RiskGuardClient::new(&args.node);

    match args.command {
        Command::Submit { sender, receiver, amount } => {
            let resp = client.submit_transaction(&sender, &receiver, amount).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Command::Simulate { fraud_type, sender, receiver, amount } => {
            let resp = client.simulate_fraud(&fraud_type, &sender, &receiver, amount).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Command::Status { id } => {
            let (status, body) = client.get_transaction(&id).await?;
            println!("HTTP {status}");
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::RiskDetails { id } => {
            let (status, body) = client.get_risk_details(&id).await?;
            println!("HTTP {status}");
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Recent { limit } => {
            let resp = client.recent_transactions(limit).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Command::Stats => {
            let resp = client.system_stats().await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
    }

    Ok(())
}
