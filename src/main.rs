use clap::Parser;
use semantic_doc_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::InitIndex => cli::index::init_index().await,
        Command::Seed(args) => cli::index::seed(args).await,
        Command::Reset => cli::index::reset().await,
        Command::Ingest(args) => cli::ingest::run(args).await,
        Command::Query(args) => cli::query::run(args).await,
    }
}
