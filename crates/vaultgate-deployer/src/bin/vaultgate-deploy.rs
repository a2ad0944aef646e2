//! Command-line entry point for deploying VaultGateProtocol
//!
//! With no arguments, loads `deploy.toml`, deploys one instance of the
//! configured contract and prints its address. Exits with status 1 on any
//! failure after printing the error to standard error.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use vaultgate_deployer::{
	config::{ArtifactsConfig, DEFAULT_CONFIG_PATH},
	deployer_from_config, init_logging, ArtifactStore, DeployConfig,
};

#[derive(Parser, Debug)]
#[command(name = "vaultgate-deploy")]
#[command(about = "Deploy the VaultGateProtocol contract to an EVM network")]
#[command(version)]
struct Cli {
	/// Config file path
	#[arg(long, env = "VAULTGATE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
	config: PathBuf,

	/// Contract to deploy instead of the one named in the config
	#[arg(long)]
	contract: Option<String>,

	/// List contracts available in the artifact directory and exit
	#[arg(long)]
	list: bool,

	/// Enable debug logging
	#[arg(long, env = "VAULTGATE_DEBUG")]
	debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
	// Load environment variables from .env file if it exists
	let _ = dotenvy::dotenv();

	let cli = Cli::parse();
	init_logging(cli.debug);

	if cli.list {
		return list_contracts(&cli.config).await;
	}

	let config = DeployConfig::from_file(&cli.config).await?;
	info!(
		config_path = %cli.config.display(),
		chain = %config.network.chain_id,
		"Configuration loaded"
	);

	let deployer = deployer_from_config(&config, cli.contract.as_deref()).await?;
	match deployer.deploy().await {
		Ok(instance) => {
			println!("{}", instance);
			Ok(())
		},
		Err(e) => {
			error!(kind = e.kind(), error = %e, "Deployment failed");
			Err(e.into())
		},
	}
}

async fn list_contracts(config_path: &Path) -> Result<()> {
	let artifacts = ArtifactsConfig::from_file_or_default(config_path).await?;
	let store = ArtifactStore::new(&artifacts.dir);
	for name in store.list()? {
		println!("{}", name);
	}
	Ok(())
}
