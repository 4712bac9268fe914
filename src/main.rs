use clap::Parser;
use brillprime_edge::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Install(args) => cli::install::run(args).await,
        Command::Classify(args) => cli::classify::run(args),
    }
}
