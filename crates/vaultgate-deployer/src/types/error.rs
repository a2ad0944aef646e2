//! Error types and result handling for the deployer
//!
//! Every stage of a deployment (configuration, artifact resolution, submission,
//! confirmation) reports failures through the single `Error` enum below. The
//! binary prints whichever variant surfaces and exits with status 1.

use alloy_primitives::{Address, B256};
use std::path::PathBuf;

/// Convenience Result type alias using the local Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by a deployment run
#[derive(thiserror::Error, Debug)]
pub enum Error {
	// Config errors
	#[error("Configuration file not found: {0}")]
	ConfigNotFound(PathBuf),

	#[error("Invalid configuration: {0}")]
	Config(String),

	// Artifact errors
	#[error("Contract artifact for {name} not found in {dir}")]
	ArtifactNotFound { name: String, dir: PathBuf },

	#[error("Failed to resolve contract artifact: {0}")]
	Resolution(String),

	// Network errors
	#[error("Transaction submission failed: {0}")]
	Submission(String),

	#[error("Contract creation reverted: {0}")]
	Revert(String),

	#[error("Transaction {hash} not confirmed within {seconds}s")]
	Timeout { hash: B256, seconds: u64 },

	#[error("Deployed code check failed at {address}: {reason}")]
	Verification { address: Address, reason: String },

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Short, stable tag for the failing stage, used as a structured log field
	pub fn kind(&self) -> &'static str {
		match self {
			Error::ConfigNotFound(_) | Error::Config(_) => "config",
			Error::ArtifactNotFound { .. } | Error::Resolution(_) => "resolution",
			Error::Submission(_) => "submission",
			Error::Revert(_) => "revert",
			Error::Timeout { .. } => "timeout",
			Error::Verification { .. } => "verification",
			Error::Io(_) => "io",
		}
	}
}

impl From<toml::de::Error> for Error {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the input dump
		Error::Config(err.message().to_string())
	}
}
