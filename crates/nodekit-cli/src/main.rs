//! CLI entry point for nodekit graph maintenance.
//!
//! Results go to stdout as JSON; logs go to stderr.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use nodekit_core::Settings;
use nodekit_graph::{GraphClient, GraphConfig};

#[derive(Parser)]
#[command(name = "nodekit")]
#[command(about = "Maintenance commands for a nodekit-managed Neo4j graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: nodekit).
    #[arg(short, long, default_value = "nodekit", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the graph answers.
    Ping,
    /// Report node and relationship counts.
    Stats {
        /// Break counts down per label and relationship type.
        #[arg(long)]
        detailed: bool,
    },
    /// Delete nodes and their relationships.
    Clear {
        /// Only delete nodes with this label (repeatable). Omit to clear everything.
        #[arg(long = "label")]
        labels: Vec<String>,
        /// Required: confirm the deletion.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    let graph_config = GraphConfig::from(&settings);
    let graph = GraphClient::connect(&graph_config).await?;

    let output = match cli.command {
        Command::Ping => {
            commands::ping(&graph).await?;
            serde_json::json!({
                "status": "ok",
                "uri": graph_config.uri,
                "user": graph_config.user,
                "database": graph_config.database,
            })
        }
        Command::Stats { detailed } => commands::stats(&graph, detailed).await?,
        Command::Clear { labels, force } => {
            let remaining = commands::clear(&graph, &labels, force).await?;
            serde_json::json!({ "cleared": labels, "remaining_nodes": remaining })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
