pub mod city;

use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    contract::ContractFactory,
    providers::Middleware,
    types::{Address, H256, U256},
};

use crate::artifacts::ContractArtifact;

use self::city::CityContract;

/// Typed view of a deployed probe target: one accessor and one raw slot write.
///
/// Remote failures are carried as their rendered message; the caller tags
/// them with the step they happened in.
#[async_trait]
pub trait OwnerSlotContract: Send + Sync {
    fn address(&self) -> Address;

    async fn owner_address(&self) -> Result<Address, String>;

    /// Submit `write(slot, value)` and wait until it is mined. Returns the
    /// transaction hash, if the node handed back a receipt.
    async fn write_slot(&self, slot: U256, value: [u8; 32]) -> Result<Option<H256>, String>;
}

#[async_trait]
pub trait ContractDeployer: Send + Sync {
    type Instance: OwnerSlotContract;

    /// Deploy `artifact` with no constructor arguments and wait for it to be mined.
    async fn deploy(&self, artifact: &ContractArtifact) -> Result<Self::Instance, String>;
}

/// Deploys through an ethers client and binds the result to the generated
/// `City` bindings.
pub struct EthersDeployer<M> {
    client: Arc<M>,
    confirmations: usize,
}

impl<M> EthersDeployer<M>
where
    M: Middleware + 'static,
{
    pub fn new(client: Arc<M>, confirmations: usize) -> Self {
        Self {
            client,
            confirmations,
        }
    }
}

#[async_trait]
impl<M> ContractDeployer for EthersDeployer<M>
where
    M: Middleware + 'static,
{
    type Instance = CityContract<M>;

    async fn deploy(&self, artifact: &ContractArtifact) -> Result<Self::Instance, String> {
        let factory = ContractFactory::new(
            artifact.abi.clone(),
            artifact.bytecode.clone(),
            self.client.clone(),
        );

        let (instance, receipt) = factory
            .deploy(())
            .map_err(|e| e.to_string())?
            .confirmations(self.confirmations)
            .send_with_receipt()
            .await
            .map_err(|e| e.to_string())?;

        log::info!(
            "deployed {} at {:?} (tx {:?}, block {:?})",
            artifact.contract_name,
            instance.address(),
            receipt.transaction_hash,
            receipt.block_number
        );

        Ok(CityContract::new(
            instance.address(),
            self.client.clone(),
            self.confirmations,
        ))
    }
}
