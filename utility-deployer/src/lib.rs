//! Deploys a compiled contract (by default `UtilityContract`) to an
//! Ethereum JSON-RPC endpoint and reports where it landed.

pub mod artifact;
pub mod client;
pub mod config;
pub mod deploy;
pub mod error;

pub use artifact::ContractArtifact;
pub use client::{connect, DeployClient};
pub use config::{Credentials, EnvOverrides, NetworkConfig};
pub use deploy::{deploy, CodeCheck, DeployRequest, Deployment};
pub use error::{DeployError, Result};
