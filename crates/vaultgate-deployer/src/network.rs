//! Network access for contract creation.
//!
//! [`NetworkInterface`] is the seam between the deployer and the chain: submit
//! a creation transaction, wait for it to be confirmed, read code back.
//! [`AlloyNetwork`] implements it over an HTTP JSON-RPC endpoint using Alloy,
//! with a local private-key wallet and a retrying transport.

use crate::config::{AccountConfig, NetworkConfig};
use crate::types::{ChainId, DeployedInstance, Error, Result};
use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{
	DynProvider, PendingTransactionConfig, PendingTransactionError, Provider, ProviderBuilder,
	WatchTxError,
};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::layers::RetryBackoffLayer;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Operations the deployer needs from a network.
///
/// Implementations own their own retry policy; callers submit exactly once.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NetworkInterface: Send + Sync {
	/// Chain this network is bound to.
	fn chain_id(&self) -> ChainId;

	/// Address that signs and pays for transactions.
	fn deployer(&self) -> Address;

	/// Signs and broadcasts a contract-creation transaction carrying `init_code`.
	///
	/// Returns the transaction hash once the node has accepted it.
	async fn submit_creation(&self, init_code: Bytes) -> Result<B256>;

	/// Waits for the creation transaction to be confirmed and returns the new instance.
	async fn wait_for_instance(&self, contract: &str, tx_hash: B256) -> Result<DeployedInstance>;

	/// Runtime code currently stored at `address`.
	async fn code_at(&self, address: Address) -> Result<Bytes>;
}

/// Alloy-backed EVM network.
pub struct AlloyNetwork {
	provider: DynProvider,
	chain_id: ChainId,
	deployer: Address,
	confirmations: u64,
	timeout: Duration,
}

impl std::fmt::Debug for AlloyNetwork {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AlloyNetwork")
			.field("chain_id", &self.chain_id)
			.field("deployer", &self.deployer)
			.field("confirmations", &self.confirmations)
			.field("timeout", &self.timeout)
			.field("provider", &"<DynProvider>")
			.finish()
	}
}

impl AlloyNetwork {
	/// Connects to the configured RPC endpoint.
	///
	/// Fails with a config error if the key is invalid or the endpoint reports a
	/// different chain id than configured, and with a submission error if the
	/// endpoint cannot be reached.
	pub async fn connect(network: &NetworkConfig, account: &AccountConfig) -> Result<Self> {
		let signer = account
			.private_key
			.expose_secret()
			.parse::<PrivateKeySigner>()
			.map_err(|e| Error::Config(format!("Invalid private key: {}", e)))?;
		let deployer = signer.address();

		let chain_id = network.chain_id;
		let wallet = EthereumWallet::from(signer.with_chain_id(Some(chain_id.id())));

		let url = network
			.rpc_url
			.trim()
			.parse()
			.map_err(|e| Error::Config(format!("Invalid RPC URL: {}", e)))?;

		let retry_layer = RetryBackoffLayer::new(
			network.max_retries,
			network.initial_backoff_ms,
			network.compute_units_per_second,
		);
		let client = RpcClient::builder().layer(retry_layer).http(url);

		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect_client(client)
			.erased();

		let remote_chain_id = provider.get_chain_id().await.map_err(|e| {
			Error::Submission(format!("Failed to connect to {}: {}", network.rpc_url, e))
		})?;
		if remote_chain_id != chain_id.id() {
			return Err(Error::Config(format!(
				"RPC endpoint reports chain id {}, configured {}",
				remote_chain_id, chain_id
			)));
		}

		debug!(chain = %chain_id, deployer = %deployer, "Connected to network");

		Ok(Self {
			provider,
			chain_id,
			deployer,
			confirmations: network.confirmations,
			timeout: network.confirmation_timeout(),
		})
	}
}

#[async_trait]
impl NetworkInterface for AlloyNetwork {
	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	fn deployer(&self) -> Address {
		self.deployer
	}

	async fn submit_creation(&self, init_code: Bytes) -> Result<B256> {
		debug!(
			chain = %self.chain_id,
			from = %self.deployer,
			init_code_len = init_code.len(),
			"Sending creation transaction"
		);

		let tx = TransactionRequest::default()
			.with_from(self.deployer)
			.with_deploy_code(init_code);

		let pending = self
			.provider
			.send_transaction(tx)
			.await
			.map_err(|e| classify_send_error(&e.to_string()))?;

		let tx_hash = *pending.tx_hash();
		info!(tx_hash = %tx_hash, chain = %self.chain_id, "Creation transaction submitted");
		Ok(tx_hash)
	}

	async fn wait_for_instance(&self, contract: &str, tx_hash: B256) -> Result<DeployedInstance> {
		info!(
			tx_hash = %tx_hash,
			confirmations = self.confirmations,
			timeout_secs = self.timeout.as_secs(),
			"Waiting for confirmation"
		);

		let config = PendingTransactionConfig::new(tx_hash)
			.with_required_confirmations(self.confirmations)
			.with_timeout(Some(self.timeout));

		let pending = self
			.provider
			.watch_pending_transaction(config)
			.await
			.map_err(|e| watch_error(tx_hash, self.timeout, e))?;
		let confirmed = pending.await.map_err(|e| watch_error(tx_hash, self.timeout, e))?;

		let receipt = self
			.provider
			.get_transaction_receipt(confirmed)
			.await
			.map_err(|e| Error::Submission(format!("Failed to get receipt: {}", e)))?
			.ok_or_else(|| {
				Error::Submission(format!("Receipt for {} unavailable after confirmation", tx_hash))
			})?;

		instance_from_receipt(
			contract,
			tx_hash,
			receipt.status(),
			receipt.contract_address(),
			receipt.block_number(),
		)
	}

	async fn code_at(&self, address: Address) -> Result<Bytes> {
		self.provider
			.get_code_at(address)
			.await
			.map_err(|e| Error::Submission(format!("Failed to get code at {}: {}", address, e)))
	}
}

/// Maps a node's rejection of a creation transaction to an error.
///
/// Nodes report constructor reverts during gas estimation as an RPC error
/// whose message mentions the revert.
fn classify_send_error(message: &str) -> Error {
	if message.to_ascii_lowercase().contains("revert") {
		Error::Revert(message.to_string())
	} else {
		Error::Submission(format!("Failed to send transaction: {}", message))
	}
}

/// Builds the instance handle from a confirmed receipt.
pub(crate) fn instance_from_receipt(
	contract: &str,
	tx_hash: B256,
	status: bool,
	contract_address: Option<Address>,
	block_number: Option<u64>,
) -> Result<DeployedInstance> {
	if !status {
		return Err(Error::Revert(format!(
			"creation transaction {} failed in block {}",
			tx_hash,
			block_number.map_or_else(|| "unknown".to_string(), |n| n.to_string())
		)));
	}

	let address = contract_address.ok_or_else(|| {
		Error::Submission(format!("No contract address in receipt for {}", tx_hash))
	})?;

	Ok(DeployedInstance {
		contract: contract.to_string(),
		address,
		tx_hash,
		block_number,
	})
}

/// Maps a pending-transaction watcher failure onto the deployer's error kinds
fn watch_error(tx_hash: B256, timeout: Duration, err: PendingTransactionError) -> Error {
	match err {
		PendingTransactionError::TxWatcher(WatchTxError::Timeout) => Error::Timeout {
			hash: tx_hash,
			seconds: timeout.as_secs(),
		},
		PendingTransactionError::FailedToRegister => {
			Error::Submission("Failed to register transaction watcher".to_string())
		},
		other => Error::Submission(format!("Transaction watch failed: {}", other)),
	}
}
