use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    tocharvest::logging::init().context("init logging")?;

    let cli = tocharvest::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        tocharvest::cli::Command::Harvest(args) => {
            tocharvest::harvest::run(args).await.context("harvest")?;
        }
        tocharvest::cli::Command::Book(args) => {
            tocharvest::harvest::book(args).await.context("book")?;
        }
        tocharvest::cli::Command::Nav(args) => {
            tocharvest::nav::run(args).await.context("nav")?;
        }
    }

    Ok(())
}
