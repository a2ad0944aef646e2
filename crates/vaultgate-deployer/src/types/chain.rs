//! Chain identifiers for deployment targets
//!
//! Wraps the numeric EIP-155 chain id so log lines and error messages can name
//! the network a contract is being deployed to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for the network a deployment targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub enum ChainId {
	Mainnet,
	Custom { id: u64 },
}

impl ChainId {
	/// Create ChainId from numeric identifier
	pub fn from_u64(id: u64) -> Self {
		match id {
			1 => Self::Mainnet,
			id => Self::Custom { id },
		}
	}

	/// Get the numeric chain identifier
	pub fn id(&self) -> u64 {
		match self {
			Self::Mainnet => 1,
			Self::Custom { id } => *id,
		}
	}

	/// Human-readable name for well-known chains
	pub fn name(&self) -> &str {
		match self {
			Self::Mainnet => "Ethereum Mainnet",
			Self::Custom { id: 11155111 } => "Sepolia",
			Self::Custom { id: 17000 } => "Holesky",
			Self::Custom { id: 137 } => "Polygon",
			Self::Custom { id: 42161 } => "Arbitrum One",
			Self::Custom { id: 10 } => "Optimism",
			Self::Custom { id: 8453 } => "Base",
			Self::Custom { id: 31337 } => "Local Devnet",
			Self::Custom { .. } => "Custom Chain",
		}
	}

	/// True for the chain id used by Hardhat Network and Anvil
	pub fn is_local(&self) -> bool {
		self.id() == 31337
	}
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({})", self.id(), self.name())
	}
}

impl From<u64> for ChainId {
	fn from(id: u64) -> Self {
		Self::from_u64(id)
	}
}

impl From<ChainId> for u64 {
	fn from(chain: ChainId) -> Self {
		chain.id()
	}
}
