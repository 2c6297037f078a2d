//! cairup is a CLI tool to declare and deploy a compiled Starknet contract in one command.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cairup_deploy::{DeployConfig, JsonFileRecordWriter, Orchestrator, StarknetChainClient};
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load a .env file first so that its values are visible to the argument parser.
    let dotenv_path = dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let mut config = DeployConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let rpc_url = config.rpc_url()?;
    tracing::info!(
        rpc_url = %rpc_url,
        network = %config.network,
        artifact = %config.artifact.display(),
        "Starting deployment..."
    );

    let client = StarknetChainClient::new(rpc_url)?;
    let writer = JsonFileRecordWriter::new(&config.output);
    let mut orchestrator = Orchestrator::new(config, client, writer);

    match orchestrator.run().await {
        Ok(record) => {
            tracing::info!("✓ Deployment complete!");
            tracing::info!("");
            tracing::info!("Contract address:     {}", record.contract_address);
            tracing::info!("Class hash:           {}", record.class_hash);
            tracing::info!("Transaction hash:     {}", record.transaction_hash);
            tracing::info!("Network:              {}", record.network);
            Ok(())
        }
        Err(err) => {
            // The contract is live even though the record was not saved.
            if let Some(record) = err.deployed_record() {
                tracing::warn!("The contract IS deployed, save these values manually:");
                tracing::warn!("Contract address:     {}", record.contract_address);
                tracing::warn!("Class hash:           {}", record.class_hash);
                tracing::warn!("Transaction hash:     {}", record.transaction_hash);
            }

            Err(err).context(format!("Deployment failed ({})", orchestrator.state()))
        }
    }
}
