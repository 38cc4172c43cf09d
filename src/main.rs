//! agent-swarm CLI binary entry point.

use agent_swarm::cli::{self, Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => cli::handle_serve(args).await,
        Commands::Chat(args) => cli::handle_chat(args).await,
        Commands::Send(args) => cli::handle_send(args).await,
        Commands::Card(args) => cli::handle_card(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
