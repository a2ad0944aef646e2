//! Contract artifact resolution
//!
//! Turns a blueprint name into a [`ContractFactory`] by reading the compiled
//! JSON artifact from a build directory. Both Hardhat
//! (`artifacts/contracts/**/Name.sol/Name.json`, `"bytecode": "0x.."`) and
//! Foundry (`out/Name.sol/Name.json`, `"bytecode": {"object": "0x.."}`)
//! layouts are understood.

use crate::types::{Error, Result};
use alloy_primitives::{hex, Bytes};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compiled blueprint ready to be instantiated
#[derive(Debug, Clone, PartialEq)]
pub struct ContractFactory {
	/// Contract name as requested
	pub name: String,
	/// Creation bytecode
	pub bytecode: Bytes,
	/// ABI, when the artifact carries one
	pub abi: Option<Value>,
	/// Artifact file the factory was loaded from
	pub source: PathBuf,
}

impl ContractFactory {
	/// Init code for the creation transaction
	///
	/// The blueprint takes no constructor arguments, so this is the bytecode as is.
	pub fn deploy_code(&self) -> Bytes {
		self.bytecode.clone()
	}
}

/// Resolves blueprint names to constructible factories
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ArtifactResolver: Send + Sync {
	/// Looks up a compiled blueprint by contract name
	fn resolve(&self, name: &str) -> Result<ContractFactory>;
}

/// File-backed artifact store rooted at a build output directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
	root: PathBuf,
}

impl ArtifactStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Locate the artifact file for a contract
	///
	/// Artifacts are keyed by contract name, not by source file, so
	/// `Vault.sol/VaultGateProtocol.json` answers for `VaultGateProtocol`.
	/// Hardhat's `contracts/` tree is searched before the rest of the store.
	fn find_artifact(&self, name: &str) -> Result<Option<PathBuf>> {
		let file_name = format!("{}.json", name);

		let sources = self.root.join("contracts");
		if sources.is_dir() {
			if let Some(found) = find_nested(&sources, &file_name)? {
				return Ok(Some(found));
			}
		}

		if self.root.is_dir() {
			return find_nested(&self.root, &file_name);
		}
		Ok(None)
	}

	/// List the contract names available in the store
	pub fn list(&self) -> Result<Vec<String>> {
		let mut contracts = Vec::new();
		if self.root.is_dir() {
			collect_contracts(&self.root, &mut contracts)?;
		}
		contracts.sort();
		contracts.dedup();
		Ok(contracts)
	}
}

impl ArtifactResolver for ArtifactStore {
	fn resolve(&self, name: &str) -> Result<ContractFactory> {
		let path = self
			.find_artifact(name)
			.map_err(|e| {
				Error::Resolution(format!("Failed to scan {}: {}", self.root.display(), e))
			})?
			.ok_or_else(|| Error::ArtifactNotFound {
				name: name.to_string(),
				dir: self.root.clone(),
			})?;
		debug!(contract = name, artifact = %path.display(), "Loading contract artifact");

		let content = std::fs::read_to_string(&path).map_err(|e| {
			Error::Resolution(format!("Failed to read {}: {}", path.display(), e))
		})?;
		let json: Value = serde_json::from_str(&content).map_err(|e| {
			Error::Resolution(format!("Invalid JSON in {}: {}", path.display(), e))
		})?;

		if let Some(artifact_name) = json.get("contractName").and_then(Value::as_str) {
			if artifact_name != name {
				return Err(Error::Resolution(format!(
					"{} describes {}, expected {}",
					path.display(),
					artifact_name,
					name
				)));
			}
		}

		let bytecode = extract_bytecode(&json)
			.map_err(|reason| Error::Resolution(format!("{}: {}", path.display(), reason)))?;

		Ok(ContractFactory {
			name: name.to_string(),
			bytecode,
			abi: json.get("abi").cloned(),
			source: path,
		})
	}
}

/// Extract creation bytecode from either artifact flavour
fn extract_bytecode(json: &Value) -> std::result::Result<Bytes, String> {
	let raw = match json.get("bytecode") {
		Some(Value::String(s)) => s.as_str(),
		Some(Value::Object(obj)) => obj
			.get("object")
			.and_then(Value::as_str)
			.ok_or_else(|| "bytecode.object missing".to_string())?,
		_ => return Err("no bytecode field".to_string()),
	};

	let hex_str = raw.strip_prefix("0x").unwrap_or(raw);
	if hex_str.is_empty() {
		return Err("empty bytecode (abstract contract or interface?)".to_string());
	}
	if hex_str.contains("__") {
		return Err("bytecode has unlinked library placeholders".to_string());
	}

	hex::decode(hex_str)
		.map(Bytes::from)
		.map_err(|e| format!("invalid bytecode hex: {}", e))
}

/// Subdirectories of `dir`, split into `*.sol` artifact folders and the rest
///
/// Symlinks are not followed, so a link cycle in the build output cannot
/// recurse forever.
fn subdirectories(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
	let mut sol_dirs = Vec::new();
	let mut others = Vec::new();

	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		if !entry.file_type()?.is_dir() {
			continue;
		}
		let is_sol_dir = entry
			.file_name()
			.to_str()
			.is_some_and(|name| name.ends_with(".sol"));
		if is_sol_dir {
			sol_dirs.push(entry.path());
		} else {
			others.push(entry.path());
		}
	}

	// Keep lookups deterministic across filesystems
	sol_dirs.sort();
	others.sort();
	Ok((sol_dirs, others))
}

fn find_nested(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
	let (sol_dirs, others) = subdirectories(dir)?;

	for sol_dir in sol_dirs {
		let candidate = sol_dir.join(file_name);
		if candidate.is_file() {
			return Ok(Some(candidate));
		}
	}
	for sub in others {
		if let Some(found) = find_nested(&sub, file_name)? {
			return Ok(Some(found));
		}
	}
	Ok(None)
}

fn collect_contracts(dir: &Path, contracts: &mut Vec<String>) -> Result<()> {
	let (sol_dirs, others) = subdirectories(dir)?;

	for sol_dir in sol_dirs {
		for json_entry in std::fs::read_dir(&sol_dir)?.flatten() {
			if let Some(json_name) = json_entry.file_name().to_str() {
				if json_name.ends_with(".dbg.json") {
					continue;
				}
				if let Some(contract) = json_name.strip_suffix(".json") {
					contracts.push(contract.to_string());
				}
			}
		}
	}
	for sub in others {
		collect_contracts(&sub, contracts)?;
	}
	Ok(())
}
