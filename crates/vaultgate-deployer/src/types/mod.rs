//! Shared types used across the deployer

pub mod chain;
pub mod error;
pub mod instance;

pub use chain::ChainId;
pub use error::{Error, Result};
pub use instance::DeployedInstance;
