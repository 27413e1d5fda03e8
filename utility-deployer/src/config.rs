//! Network credentials and their resolution into a usable endpoint.
//!
//! Credentials live in a JSON file keyed by network name:
//!
//! ```json
//! { "RINKEBY": { "URL": "https://...", "PKEY": "0x..." } }
//! ```
//!
//! `RPC_URL` and `PRIVATE_KEY` in the environment (or a `.env` file) win over
//! the file.

use std::{collections::BTreeMap, env, fmt, fs::File, path::Path};

use ethers::signers::LocalWallet;
use log::{debug, warn};
use serde::Deserialize;
use url::Url;

use crate::error::{DeployError, Result};

pub const RPC_URL_ENV_VAR: &str = "RPC_URL";
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

pub const DEFAULT_CREDENTIALS_PATH: &str = "scripts/credentials.json";
pub const DEFAULT_NETWORK: &str = "RINKEBY";

#[derive(Clone, Default, Deserialize)]
pub struct NetworkCredentials {
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
    #[serde(rename = "PKEY", default)]
    pub private_key: Option<String>,
}

impl fmt::Debug for NetworkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredentials")
            .field("url", &self.url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    networks: BTreeMap<String, NetworkCredentials>,
}

impl Credentials {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let credentials: Self = serde_json::from_reader(file)?;
        debug!(
            "Loaded {} network(s) from {}",
            credentials.networks.len(),
            path.display()
        );
        Ok(credentials)
    }

    pub fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    /// Exact match first, then a case-insensitive one.
    pub fn network(&self, name: &str) -> Result<&NetworkCredentials> {
        if let Some(entry) = self.networks.get(name) {
            return Ok(entry);
        }
        self.networks
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, entry)| entry)
            .ok_or_else(|| DeployError::UnknownNetwork {
                name: name.to_string(),
                available: self.network_names().collect::<Vec<_>>().join(", "),
            })
    }
}

/// Values read from the process environment that override the file.
#[derive(Clone, Default)]
pub struct EnvOverrides {
    pub rpc_url: Option<String>,
    pub private_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            rpc_url: env::var(RPC_URL_ENV_VAR).ok().filter(|v| !v.trim().is_empty()),
            private_key: env::var(PRIVATE_KEY_ENV_VAR)
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    fn covers_url(&self) -> bool {
        self.rpc_url.is_some()
    }
}

#[derive(Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: Url,
    private_key: Option<String>,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("name", &self.name)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl NetworkConfig {
    /// Reads the environment overrides and the credentials file at `path`.
    /// A missing file is fine when `RPC_URL` is set.
    pub fn load(path: impl AsRef<Path>, network: &str) -> Result<Self> {
        Self::load_with(path, network, &EnvOverrides::from_env())
    }

    pub fn load_with(
        path: impl AsRef<Path>,
        network: &str,
        overrides: &EnvOverrides,
    ) -> Result<Self> {
        let path = path.as_ref();
        let credentials = if path.exists() {
            Some(Credentials::load(path)?)
        } else if overrides.covers_url() {
            warn!(
                "Credentials file {} not found, using {} from the environment",
                path.display(),
                RPC_URL_ENV_VAR
            );
            None
        } else {
            return Err(DeployError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("credentials file {} not found", path.display()),
            )));
        };
        Self::resolve(network, credentials.as_ref(), overrides)
    }

    pub fn resolve(
        network: &str,
        credentials: Option<&Credentials>,
        overrides: &EnvOverrides,
    ) -> Result<Self> {
        let entry = match credentials {
            // The file is optional once the environment provides the URL.
            Some(creds) if overrides.covers_url() => {
                creds.network(network).cloned().unwrap_or_default()
            }
            Some(creds) => creds.network(network)?.clone(),
            None => NetworkCredentials::default(),
        };

        let url = overrides
            .rpc_url
            .clone()
            .or(entry.url)
            .ok_or_else(|| DeployError::MissingField {
                network: network.to_string(),
                field: "URL",
            })?;
        let rpc_url = parse_rpc_url(&url)?;

        let private_key = overrides
            .private_key
            .clone()
            .or(entry.private_key)
            .map(|key| normalize_private_key(&key))
            .transpose()?;

        Ok(Self {
            name: network.to_string(),
            rpc_url,
            private_key,
        })
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn private_key(&self) -> Result<&str> {
        self.private_key
            .as_deref()
            .ok_or_else(|| DeployError::MissingField {
                network: self.name.clone(),
                field: "PKEY",
            })
    }

    /// The signing identity, not yet bound to a chain id.
    pub fn signer(&self) -> Result<LocalWallet> {
        Ok(self.private_key()?.parse::<LocalWallet>()?)
    }
}

pub fn parse_rpc_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DeployError::UnsupportedScheme(other.to_string())),
    }
}

/// Returns the key as `0x`-prefixed lowercase hex. The key itself never ends
/// up in an error message.
pub fn normalize_private_key(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_part.len() != 64 {
        return Err(DeployError::InvalidKey(format!(
            "expected 64 hex characters, got {}",
            hex_part.len()
        )));
    }
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DeployError::InvalidKey(
            "key contains non-hex characters".to_string(),
        ));
    }
    Ok(format!("0x{}", hex_part.to_ascii_lowercase()))
}
