use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use contract_probe::config::{NetworkConfig, PRIVATE_KEY_ENV_VAR};
use ethers::{
    core::k256::ecdsa::SigningKey,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer, Wallet},
};
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub type EtherSigner = SignerMiddleware<Provider<Http>, Wallet<SigningKey>>;

/// Signing client for `network`, using its first account.
///
/// Only talks to the node when the chain id is not configured.
pub async fn get_writer_ethers_client(
    network_name: &str,
    network: &NetworkConfig,
) -> anyhow::Result<Arc<EtherSigner>> {
    let key = network.accounts.first().ok_or_else(|| {
        anyhow!("no signing account for network `{network_name}` (set {PRIVATE_KEY_ENV_VAR})")
    })?;

    let url = Url::parse(&network.url)
        .with_context(|| format!("invalid url for network `{network_name}`"))?;
    let provider = Provider::new(Http::new(url)).interval(POLL_INTERVAL);

    let chain_id = match network.chain_id {
        Some(chain_id) => chain_id,
        None => provider
            .get_chainid()
            .await
            .context("querying chain id")?
            .as_u64(),
    };

    let wallet = key
        .parse::<LocalWallet>()
        .context("parsing signing key")?
        .with_chain_id(chain_id);

    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}
