//! Deployment tool for the VaultGateProtocol contract.
//!
//! Resolves a compiled contract artifact, creates one instance of it on an EVM
//! network and reports the confirmed address. The pieces are kept behind
//! traits so the whole flow can be exercised without a live chain:
//!
//! - [`artifacts`]: blueprint name to creation bytecode
//! - [`network`]: creation transaction submission and confirmation
//! - [`deployer`]: the single-shot deploy operation tying both together
//! - [`config`]: explicit configuration loaded from TOML

pub mod artifacts;
pub mod config;
pub mod deployer;
pub mod logging;
pub mod network;
pub mod types;

pub use artifacts::{ArtifactResolver, ArtifactStore, ContractFactory};
pub use config::DeployConfig;
pub use deployer::{DeployOptions, Deployer};
pub use logging::init_logging;
pub use network::{AlloyNetwork, NetworkInterface};
pub use types::{ChainId, DeployedInstance, Error, Result};

use std::sync::Arc;
use tracing::debug;

/// Builds a deployer from configuration, connecting to the configured network
///
/// `contract` overrides `artifacts.contract` when given. The artifact is
/// resolved before any RPC call, so a missing or broken build never reaches
/// the endpoint.
pub async fn deployer_from_config(config: &DeployConfig, contract: Option<&str>) -> Result<Deployer> {
	let contract = contract.unwrap_or(&config.artifacts.contract);
	let resolver = Arc::new(ArtifactStore::new(&config.artifacts.dir));
	let factory = resolver.resolve(contract)?;
	debug!(contract, artifact = %factory.source.display(), "Artifact available");

	let network = Arc::new(AlloyNetwork::connect(&config.network, &config.account).await?);

	Ok(Deployer::new(resolver, network, contract).with_options(DeployOptions {
		verify_code: config.deployment.verify_code,
	}))
}
