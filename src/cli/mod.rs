//! CLI for running and talking to a swarm.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::a2a::{AgentClient, Endpoint};
use crate::config::SwarmConfig;
use crate::error::SwarmError;
use crate::supervisor::Supervisor;

/// Agent swarm CLI
#[derive(Parser, Debug)]
#[command(name = "agent-swarm", version, about = "Run and talk to a swarm of agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve every configured agent until interrupted
    Serve(RunArgs),
    /// Serve the swarm and chat with the entry agent on stdin
    Chat(RunArgs),
    /// Send one message to a running agent
    Send(SendArgs),
    /// Print a running agent's card as JSON
    Card(CardArgs),
}

/// Arguments for `serve` and `chat`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration file (defaults to ./agents.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Agent that receives top-level requests
    pub entry: String,
}

#[derive(Parser, Debug)]
pub struct SendArgs {
    /// Agent endpoint, e.g. unix:///tmp/writer.sock or tcp://127.0.0.1:7000
    #[arg(short, long)]
    pub url: Endpoint,

    pub text: String,
}

#[derive(Parser, Debug)]
pub struct CardArgs {
    #[arg(short, long)]
    pub url: Endpoint,
}

/// Load configuration and install the logger.
pub fn load_config(path: Option<&std::path::Path>) -> Result<SwarmConfig, SwarmError> {
    let config = SwarmConfig::load(path)?;
    crate::logging::init(&config.logger)?;
    Ok(config)
}

pub async fn handle_serve(args: RunArgs) -> Result<(), SwarmError> {
    let config = load_config(args.config.as_deref())?;
    Supervisor::from_config(&config)?.run(&args.entry).await
}

pub async fn handle_chat(args: RunArgs) -> Result<(), SwarmError> {
    let config = load_config(args.config.as_deref())?;
    let swarm = Supervisor::from_config(&config)?.start(&args.entry).await?;
    let client = swarm.entry_client().with_caller("cli");
    let shutdown = swarm.shutdown_token();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "/quit" | "/exit") {
            break;
        }
        match client.send_text(line).await {
            Ok(reply) => stdout.write_all(format!("{reply}\n").as_bytes()).await?,
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    info!("chat ended");
    shutdown.cancel();
    swarm.wait().await
}

pub async fn handle_send(args: SendArgs) -> Result<(), SwarmError> {
    let reply = AgentClient::new(args.url.to_string(), args.url)
        .with_caller("cli")
        .send_text(&args.text)
        .await?;
    println!("{reply}");
    Ok(())
}

pub async fn handle_card(args: CardArgs) -> Result<(), SwarmError> {
    let card = AgentClient::new(args.url.to_string(), args.url).get_card().await?;
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}
