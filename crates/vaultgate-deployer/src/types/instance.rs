//! Handle for a confirmed contract instance

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contract instance whose creation transaction has been confirmed
///
/// Only built from a successful receipt, so `address` is always the address of
/// live on-chain code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedInstance {
	/// Name of the blueprint the instance was created from
	pub contract: String,
	/// Address assigned by the network
	pub address: Address,
	/// Hash of the creation transaction
	pub tx_hash: B256,
	/// Block that included the creation transaction
	pub block_number: Option<u64>,
}

impl fmt::Display for DeployedInstance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} contract deployed to: {}", self.contract, self.address)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_display_is_result_line() {
		let instance = DeployedInstance {
			contract: "VaultGateProtocol".to_string(),
			address: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
			tx_hash: B256::ZERO,
			block_number: Some(1),
		};
		assert_eq!(
			instance.to_string(),
			"VaultGateProtocol contract deployed to: 0x5FbDB2315678afecb367f032d93F642f64180aa3"
		);
	}
}
