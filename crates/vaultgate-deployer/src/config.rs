//! Deployment configuration.
//!
//! The target network, deployer account, artifact location and deployment
//! options are read from a TOML file into [`DeployConfig`], which is then
//! passed explicitly to the network layer and the deployer. String values may
//! reference environment variables as `${VAR}` or `${VAR:-default}`; these
//! are substituted before the TOML is parsed.

use crate::types::{ChainId, Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default config file looked up when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "deploy.toml";

/// Blueprint deployed when the config does not name one.
pub const DEFAULT_CONTRACT: &str = "VaultGateProtocol";

/// Complete configuration for one deployment run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeployConfig {
	/// Target network and RPC client settings.
	pub network: NetworkConfig,
	/// Account that signs and pays for the creation transaction.
	pub account: AccountConfig,
	/// Where compiled contract artifacts live and which one to deploy.
	#[serde(default)]
	pub artifacts: ArtifactsConfig,
	/// Post-deployment options.
	#[serde(default)]
	pub deployment: DeploymentConfig,
}

impl ArtifactsConfig {
	/// Reads only the `[artifacts]` table of a config file.
	///
	/// The other sections are neither substituted nor validated, so artifacts
	/// can be listed without deployment credentials in the environment. A
	/// missing table yields the defaults.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		if !path.exists() {
			return Err(Error::ConfigNotFound(path.to_path_buf()));
		}
		let content = tokio::fs::read_to_string(path).await?;
		let table: toml::Table = toml::from_str(&content)?;

		let Some(section) = table.get("artifacts") else {
			return Ok(Self::default());
		};
		let section = toml::to_string(section)
			.map_err(|e| Error::Config(format!("Invalid [artifacts] section: {}", e)))?;
		Ok(toml::from_str(&resolve_env_vars(&section)?)?)
	}

	/// Like [`ArtifactsConfig::from_file`], but falls back to the defaults when
	/// the file does not exist. Any other error is returned.
	pub async fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self> {
		match Self::from_file(path).await {
			Err(Error::ConfigNotFound(path)) => {
				warn!(path = %path.display(), "Config not found, using default artifact directory");
				Ok(Self::default())
			},
			other => other,
		}
	}
}

/// Network connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// EIP-155 chain id the RPC endpoint must report.
	pub chain_id: ChainId,
	/// HTTP(S) JSON-RPC endpoint.
	pub rpc_url: String,
	/// Blocks to wait for after inclusion before the creation counts as confirmed.
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Upper bound on the confirmation wait.
	#[serde(default = "default_confirmation_timeout_seconds")]
	pub confirmation_timeout_seconds: u64,
	/// Transport-level retries for rate-limited or failed RPC requests.
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	/// Initial backoff between transport retries.
	#[serde(default = "default_initial_backoff_ms")]
	pub initial_backoff_ms: u64,
	/// Compute units per second budget used by the retry layer.
	#[serde(default = "default_compute_units_per_second")]
	pub compute_units_per_second: u64,
}

impl NetworkConfig {
	/// Confirmation timeout as a Duration.
	pub fn confirmation_timeout(&self) -> Duration {
		Duration::from_secs(self.confirmation_timeout_seconds)
	}
}

/// Deployer account settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Hex-encoded secp256k1 private key.
	pub private_key: PrivateKey,
}

/// Artifact store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactsConfig {
	#[serde(default = "default_artifacts_dir")]
	pub dir: PathBuf,
	#[serde(default = "default_contract")]
	pub contract: String,
}

impl Default for ArtifactsConfig {
	fn default() -> Self {
		Self {
			dir: default_artifacts_dir(),
			contract: default_contract(),
		}
	}
}

/// Post-deployment options.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeploymentConfig {
	/// Fetch the runtime code at the new address and fail if it is empty.
	#[serde(default)]
	pub verify_code: bool,
}

/// Private key that never appears in Debug or Display output.
#[derive(Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PrivateKey(String);

impl PrivateKey {
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	/// Raw key material. Only the signer should call this.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for PrivateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("PrivateKey([REDACTED])")
	}
}

impl fmt::Display for PrivateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[REDACTED]")
	}
}

fn default_confirmations() -> u64 {
	1
}

fn default_confirmation_timeout_seconds() -> u64 {
	120
}

fn default_max_retries() -> u32 {
	5
}

fn default_initial_backoff_ms() -> u64 {
	1000
}

fn default_compute_units_per_second() -> u64 {
	10
}

fn default_artifacts_dir() -> PathBuf {
	PathBuf::from("artifacts")
}

fn default_contract() -> String {
	DEFAULT_CONTRACT.to_string()
}

/// Substitutes `${VAR}` and `${VAR:-default}` references with environment values.
///
/// References inside TOML comments are left alone, so a commented-out key does
/// not demand a variable that is never read.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String> {
	// Bounded input keeps the regex scan cheap
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(Error::Config(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| Error::Config(format!("Regex error: {e}")))?;

	let mut resolved = String::with_capacity(input.len());
	for line in input.split_inclusive('\n') {
		let (code, comment) = line.split_at(comment_start(line).unwrap_or(line.len()));

		let mut copied = 0;
		for cap in re.captures_iter(code) {
			let (Some(whole), Some(var_name)) = (cap.get(0), cap.get(1)) else {
				continue;
			};
			resolved.push_str(&code[copied..whole.start()]);
			resolved.push_str(&env_value(var_name.as_str(), cap.get(2).map(|m| m.as_str()))?);
			copied = whole.end();
		}
		resolved.push_str(&code[copied..]);
		resolved.push_str(comment);
	}

	Ok(resolved)
}

fn env_value(name: &str, default: Option<&str>) -> Result<String> {
	match (std::env::var(name), default) {
		(Ok(value), _) => Ok(value),
		(Err(_), Some(default)) => Ok(default.to_string()),
		(Err(_), None) => Err(Error::Config(format!(
			"Environment variable '{name}' not found"
		))),
	}
}

/// Byte offset of the `#` opening a comment on this line, ignoring `#` in strings.
fn comment_start(line: &str) -> Option<usize> {
	let mut quote: Option<char> = None;
	let mut escaped = false;

	for (i, c) in line.char_indices() {
		match quote {
			Some('"') if escaped => escaped = false,
			Some('"') if c == '\\' => escaped = true,
			Some(q) if c == q => quote = None,
			Some(_) => {},
			None if c == '"' || c == '\'' => quote = Some(c),
			None if c == '#' => return Some(i),
			None => {},
		}
	}
	None
}

impl DeployConfig {
	/// Loads and validates configuration from a TOML file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		if !path.exists() {
			return Err(Error::ConfigNotFound(path.to_path_buf()));
		}
		let content = tokio::fs::read_to_string(path).await?;
		content.parse()
	}

	/// Checks values serde cannot check on its own.
	pub fn validate(&self) -> Result<()> {
		if self.network.chain_id.id() == 0 {
			return Err(Error::Config("network.chain_id must be non-zero".into()));
		}

		let url = self.network.rpc_url.trim();
		if !(url.starts_with("http://") || url.starts_with("https://")) {
			return Err(Error::Config(format!(
				"network.rpc_url must be an http(s) URL, got '{}'",
				url
			)));
		}

		if self.network.confirmation_timeout_seconds == 0 {
			return Err(Error::Config(
				"network.confirmation_timeout_seconds must be greater than 0".into(),
			));
		}

		let key = self.account.private_key.expose_secret();
		let key = key.strip_prefix("0x").unwrap_or(key);
		if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err(Error::Config(
				"account.private_key must be 64 hex characters (32 bytes)".into(),
			));
		}

		if self.artifacts.contract.trim().is_empty() {
			return Err(Error::Config("artifacts.contract cannot be empty".into()));
		}

		Ok(())
	}
}

impl FromStr for DeployConfig {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let resolved = resolve_env_vars(s)?;
		let config: DeployConfig = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
