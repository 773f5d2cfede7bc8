use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;

pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";

const DEFAULT_SOLIDITY_VERSION: &str = "0.8.19";
const DEFAULT_NETWORK: &str = "localhost";
const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_CHAIN_ID: u64 = 31337;
const DEFAULT_SOURCES_DIR: &str = "./contracts_";
const DEFAULT_ARTIFACTS_DIR: &str = "./artifacts";
const DEFAULT_TIMEOUT_SECS: u64 = 40;
const DEFAULT_CONFIRMATIONS: usize = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),
    #[error("network `{0}` is not configured")]
    UnknownNetwork(String),
}

/// Process-wide probe settings. Built once at startup and handed to the
/// probe by reference; nothing reads it from ambient state.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProbeConfig {
    #[serde(default = "default_solidity")]
    pub solidity: String,
    #[serde(default = "default_network")]
    pub default_network: String,
    #[serde(default = "default_networks")]
    pub networks: BTreeMap<String, NetworkConfig>,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    pub url: String,
    /// Signing keys. Left empty when no credential was supplied; the
    /// failure shows up once a signer is built from it.
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Queried from the node when absent.
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsConfig {
    #[serde(default = "default_sources")]
    pub sources: PathBuf,
    #[serde(default = "default_artifacts")]
    pub artifacts: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            artifacts: default_artifacts(),
        }
    }
}

impl NetworkConfig {
    pub fn local() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            accounts: Vec::new(),
            chain_id: Some(DEFAULT_CHAIN_ID),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            confirmations: DEFAULT_CONFIRMATIONS,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ProbeConfig {
    /// The built-in literal table: a hardhat/anvil node on localhost.
    pub fn local() -> Self {
        Self {
            solidity: default_solidity(),
            default_network: default_network(),
            networks: default_networks(),
            paths: PathsConfig::default(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let contents =
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
        Self::from_toml_str(&contents)
    }

    /// Merge secrets and overrides into the default network.
    ///
    /// `lookup` is normally `std::env::var(..).ok()`; a missing private key
    /// leaves the account list empty rather than failing.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // an unconfigured default is left for `active_network` to report
        let Some(network) = self.networks.get_mut(&self.default_network) else {
            return;
        };

        network.accounts = lookup(PRIVATE_KEY_ENV_VAR).into_iter().collect();

        if let Some(url) = lookup(RPC_URL_ENV_VAR) {
            network.url = url;
        }
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_owned()))
    }

    pub fn active_network(&self) -> Result<&NetworkConfig, ConfigError> {
        self.network(&self.default_network)
    }
}

fn default_solidity() -> String {
    DEFAULT_SOLIDITY_VERSION.to_string()
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

fn default_networks() -> BTreeMap<String, NetworkConfig> {
    BTreeMap::from([(DEFAULT_NETWORK.to_string(), NetworkConfig::local())])
}

fn default_sources() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCES_DIR)
}

fn default_artifacts() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_confirmations() -> usize {
    DEFAULT_CONFIRMATIONS
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn local_table_matches_hardhat_defaults() {
        let config = ProbeConfig::local();

        assert_eq!(config.solidity, "0.8.19");
        assert_eq!(config.default_network, "localhost");
        assert_eq!(config.paths.sources, PathBuf::from("./contracts_"));

        let network = config.active_network().unwrap();
        assert_eq!(network.url, "http://127.0.0.1:8545");
        assert!(network.accounts.is_empty());
    }

    #[test]
    fn private_key_becomes_single_account() {
        let mut config = ProbeConfig::local();
        config.apply_env(env_of(&[(PRIVATE_KEY_ENV_VAR, "0xabc")]));

        let network = config.active_network().unwrap();
        assert_eq!(network.accounts, vec!["0xabc".to_string()]);
        assert_eq!(network.url, DEFAULT_RPC_URL);
    }

    #[test]
    fn missing_private_key_does_not_fail() {
        let mut config = ProbeConfig::local();
        config.apply_env(env_of(&[]));

        assert!(config.active_network().unwrap().accounts.is_empty());
    }

    #[test]
    fn rpc_url_overrides_endpoint() {
        let mut config = ProbeConfig::local();
        config.apply_env(env_of(&[(RPC_URL_ENV_VAR, "http://10.0.0.2:8545")]));

        assert_eq!(config.active_network().unwrap().url, "http://10.0.0.2:8545");
    }

    #[test]
    fn toml_fills_missing_keys_with_defaults() {
        let config = ProbeConfig::from_toml_str(
            r#"
            default-network = "anvil"

            [networks.anvil]
            url = "http://127.0.0.1:9545"
            timeout-secs = 5

            [paths]
            artifacts = "./out"
            "#,
        )
        .unwrap();

        assert_eq!(config.solidity, "0.8.19");
        assert_eq!(config.paths.sources, PathBuf::from("./contracts_"));
        assert_eq!(config.paths.artifacts, PathBuf::from("./out"));

        let network = config.active_network().unwrap();
        assert_eq!(network.chain_id, None);
        assert_eq!(network.call_timeout(), Duration::from_secs(5));
        assert_eq!(network.confirmations, 1);
    }

    #[test]
    fn unknown_network_is_an_error() {
        let config = ProbeConfig::local();
        let err = config.network("mainnet").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNetwork(name) if name == "mainnet"));
    }

    #[test]
    fn env_does_not_invent_the_default_network() {
        let mut config = ProbeConfig::from_toml_str(
            r#"
            default-network = "sepolia"

            [networks.localhost]
            url = "http://127.0.0.1:8545"
            "#,
        )
        .unwrap();

        config.apply_env(env_of(&[
            (PRIVATE_KEY_ENV_VAR, "0xabc"),
            (RPC_URL_ENV_VAR, "http://10.0.0.2:8545"),
        ]));

        assert!(!config.networks.contains_key("sepolia"));
        assert!(matches!(
            config.active_network(),
            Err(ConfigError::UnknownNetwork(name)) if name == "sepolia"
        ));
        // nothing leaks into the networks that do exist
        let localhost = config.network("localhost").unwrap();
        assert!(localhost.accounts.is_empty());
        assert_eq!(localhost.url, "http://127.0.0.1:8545");
    }
}
