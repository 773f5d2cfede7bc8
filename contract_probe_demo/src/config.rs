use std::path::Path;

use anyhow::Context;
use contract_probe::config::ProbeConfig;

/// Literal table (or `path`) merged with `.env` and the process environment.
/// `network` replaces the default network before the merge, so the key and
/// endpoint from the environment land on the network actually used.
pub fn load(path: Option<&Path>, network: Option<&str>) -> anyhow::Result<ProbeConfig> {
    dotenv::dotenv().ok();

    let mut config = match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            ProbeConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => {
            log::debug!("Using built-in local config");
            ProbeConfig::local()
        }
    };

    if let Some(name) = network {
        config.default_network = name.to_owned();
    }
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}
