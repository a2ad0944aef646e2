//! Contract deployment
//!
//! The deployer resolves the target blueprint, submits a single creation
//! transaction, waits for it to be confirmed and hands back the new instance.
//! It never retries and never reuses a previous deployment: each call to
//! [`Deployer::deploy`] creates a new contract.

use crate::{
	artifacts::ArtifactResolver,
	network::NetworkInterface,
	types::{DeployedInstance, Error, Result},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Options that change what a deployment run does beyond creating the contract
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
	/// Check that runtime code exists at the new address
	pub verify_code: bool,
}

/// Single-shot deployer for one blueprint
#[derive(Clone)]
pub struct Deployer {
	resolver: Arc<dyn ArtifactResolver>,
	network: Arc<dyn NetworkInterface>,
	contract: String,
	options: DeployOptions,
}

impl Deployer {
	/// Creates a deployer for `contract`
	///
	/// # Arguments
	/// * `resolver` - Source of compiled blueprints
	/// * `network` - Network the instance is created on
	/// * `contract` - Blueprint name to deploy
	pub fn new(
		resolver: Arc<dyn ArtifactResolver>,
		network: Arc<dyn NetworkInterface>,
		contract: impl Into<String>,
	) -> Self {
		Self {
			resolver,
			network,
			contract: contract.into(),
			options: DeployOptions::default(),
		}
	}

	pub fn with_options(mut self, options: DeployOptions) -> Self {
		self.options = options;
		self
	}

	/// Blueprint this deployer instantiates
	pub fn contract(&self) -> &str {
		&self.contract
	}

	/// Deploys one new instance of the blueprint
	///
	/// # Returns
	/// The confirmed instance, including its address
	///
	/// # Errors
	/// Returns a resolution error if the blueprint cannot be loaded (the network
	/// is not contacted in that case), a submission or revert error if the
	/// creation is rejected, a timeout if confirmation does not arrive, and a
	/// verification error if code checking is enabled and no code was found.
	#[instrument(skip(self), fields(contract = %self.contract, chain = %self.network.chain_id()))]
	pub async fn deploy(&self) -> Result<DeployedInstance> {
		let started = Instant::now();
		info!(deployer = %self.network.deployer(), "Starting contract deployment");

		let factory = self.resolver.resolve(&self.contract)?;
		info!(
			artifact = %factory.source.display(),
			bytecode_len = factory.bytecode.len(),
			"Resolved contract artifact"
		);

		let tx_hash = self.network.submit_creation(factory.deploy_code()).await?;
		let instance = self
			.network
			.wait_for_instance(&self.contract, tx_hash)
			.await?;

		if self.options.verify_code {
			self.verify_code(&instance).await?;
		}

		info!(
			address = %instance.address,
			tx_hash = %instance.tx_hash,
			block = ?instance.block_number,
			duration_ms = started.elapsed().as_millis() as u64,
			"Contract deployed successfully"
		);
		Ok(instance)
	}

	async fn verify_code(&self, instance: &DeployedInstance) -> Result<()> {
		let code = self.network.code_at(instance.address).await?;
		if code.is_empty() {
			warn!(address = %instance.address, "No runtime code at deployed address");
			return Err(Error::Verification {
				address: instance.address,
				reason: "no runtime code at address".to_string(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::artifacts::{ContractFactory, MockArtifactResolver};
	use crate::network::MockNetworkInterface;
	use crate::types::ChainId;
	use alloy_primitives::{address, Address, Bytes, B256};
	use mockall::predicate::eq;
	use std::path::PathBuf;
	use std::sync::atomic::{AtomicU64, Ordering};

	const CONTRACT: &str = "VaultGateProtocol";

	fn factory() -> ContractFactory {
		ContractFactory {
			name: CONTRACT.to_string(),
			bytecode: Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
			abi: None,
			source: PathBuf::from("artifacts/contracts/VaultGateProtocol.sol/VaultGateProtocol.json"),
		}
	}

	fn resolver_ok() -> MockArtifactResolver {
		let mut resolver = MockArtifactResolver::new();
		resolver
			.expect_resolve()
			.with(eq(CONTRACT))
			.returning(|_| Ok(factory()));
		resolver
	}

	fn base_network() -> MockNetworkInterface {
		let mut network = MockNetworkInterface::new();
		network
			.expect_chain_id()
			.return_const(ChainId::from_u64(31337));
		network.expect_deployer().return_const(Address::ZERO);
		network
	}

	fn instance(address: Address) -> DeployedInstance {
		DeployedInstance {
			contract: CONTRACT.to_string(),
			address,
			tx_hash: B256::repeat_byte(0x11),
			block_number: Some(1),
		}
	}

	fn deployer(resolver: MockArtifactResolver, network: MockNetworkInterface) -> Deployer {
		Deployer::new(Arc::new(resolver), Arc::new(network), CONTRACT)
	}

	#[tokio::test]
	async fn test_deploy_reports_confirmed_address() {
		let expected = address!("0xABC0000000000000000000000000000000000123");
		let mut network = base_network();
		network
			.expect_submit_creation()
			.with(eq(factory().bytecode))
			.times(1)
			.returning(|_| Ok(B256::repeat_byte(0x11)));
		network
			.expect_wait_for_instance()
			.with(eq(CONTRACT), eq(B256::repeat_byte(0x11)))
			.times(1)
			.returning(move |_, _| Ok(instance(expected)));
		network.expect_code_at().never();

		let deployed = deployer(resolver_ok(), network).deploy().await.unwrap();

		assert_eq!(deployed.address, expected);
		assert_eq!(
			deployed.to_string(),
			format!("VaultGateProtocol contract deployed to: {}", expected)
		);
	}

	#[tokio::test]
	async fn test_resolution_failure_never_touches_network() {
		let mut resolver = MockArtifactResolver::new();
		resolver.expect_resolve().returning(|name| {
			Err(Error::ArtifactNotFound {
				name: name.to_string(),
				dir: PathBuf::from("artifacts"),
			})
		});
		let mut network = base_network();
		network.expect_submit_creation().never();
		network.expect_wait_for_instance().never();

		let err = deployer(resolver, network).deploy().await.unwrap_err();
		assert_eq!(err.kind(), "resolution");
	}

	#[tokio::test]
	async fn test_revert_on_submission() {
		let mut network = base_network();
		network
			.expect_submit_creation()
			.times(1)
			.returning(|_| Err(Error::Revert("execution reverted".to_string())));
		network.expect_wait_for_instance().never();

		let err = deployer(resolver_ok(), network).deploy().await.unwrap_err();
		assert!(matches!(err, Error::Revert(_)));
	}

	#[tokio::test]
	async fn test_revert_in_receipt() {
		let mut network = base_network();
		network
			.expect_submit_creation()
			.times(1)
			.returning(|_| Ok(B256::ZERO));
		network
			.expect_wait_for_instance()
			.times(1)
			.returning(|_, _| Err(Error::Revert("creation transaction failed".to_string())));

		let err = deployer(resolver_ok(), network).deploy().await.unwrap_err();
		assert_eq!(err.kind(), "revert");
	}

	#[tokio::test]
	async fn test_confirmation_timeout() {
		let mut network = base_network();
		network
			.expect_submit_creation()
			.times(1)
			.returning(|_| Ok(B256::ZERO));
		network
			.expect_wait_for_instance()
			.times(1)
			.returning(|_, hash| Err(Error::Timeout { hash, seconds: 120 }));

		let err = deployer(resolver_ok(), network).deploy().await.unwrap_err();
		assert!(matches!(err, Error::Timeout { seconds: 120, .. }));
	}

	#[tokio::test]
	async fn test_each_run_creates_a_new_instance() {
		let nonce = Arc::new(AtomicU64::new(0));
		let mut network = base_network();
		let submitted = nonce.clone();
		network
			.expect_submit_creation()
			.times(2)
			.returning(move |_| {
				let n = submitted.fetch_add(1, Ordering::SeqCst);
				Ok(B256::left_padding_from(&n.to_be_bytes()))
			});
		network
			.expect_wait_for_instance()
			.times(2)
			.returning(|_, hash| {
				let mut addr = [0u8; 20];
				addr.copy_from_slice(&hash[12..]);
				Ok(DeployedInstance {
					contract: CONTRACT.to_string(),
					address: Address::from(addr),
					tx_hash: hash,
					block_number: None,
				})
			});

		let mut resolver = MockArtifactResolver::new();
		resolver.expect_resolve().times(2).returning(|_| Ok(factory()));

		let deployer = deployer(resolver, network);
		let first = deployer.deploy().await.unwrap();
		let second = deployer.deploy().await.unwrap();

		assert_ne!(first.address, second.address);
		assert_ne!(first.tx_hash, second.tx_hash);
		assert_eq!(nonce.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn test_verify_code_passes_with_code() {
		let addr = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
		let mut network = base_network();
		network.expect_submit_creation().returning(|_| Ok(B256::ZERO));
		network
			.expect_wait_for_instance()
			.returning(move |_, _| Ok(instance(addr)));
		network
			.expect_code_at()
			.with(eq(addr))
			.times(1)
			.returning(|_| Ok(Bytes::from(vec![0x60, 0x80])));

		let deployed = deployer(resolver_ok(), network)
			.with_options(DeployOptions { verify_code: true })
			.deploy()
			.await
			.unwrap();
		assert_eq!(deployed.address, addr);
	}

	#[tokio::test]
	async fn test_verify_code_fails_without_code() {
		let mut network = base_network();
		network.expect_submit_creation().returning(|_| Ok(B256::ZERO));
		network
			.expect_wait_for_instance()
			.returning(|_, _| Ok(instance(Address::repeat_byte(0x01))));
		network.expect_code_at().returning(|_| Ok(Bytes::new()));

		let err = deployer(resolver_ok(), network)
			.with_options(DeployOptions { verify_code: true })
			.deploy()
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Verification { .. }));
	}
}
