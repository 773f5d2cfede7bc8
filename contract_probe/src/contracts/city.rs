use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, TransactionReceipt, H256, U256, U64},
};

use super::OwnerSlotContract;

// Include generated contract types from build script
include!(concat!(env!("OUT_DIR"), "/city_contract.rs"));

pub struct CityContract<M> {
    contract: City<M>,
    confirmations: usize,
}

impl<M: Middleware> CityContract<M> {
    /// `confirmations` is how many blocks a write waits for before its
    /// receipt counts.
    pub fn new(address: Address, client: Arc<M>, confirmations: usize) -> Self {
        Self {
            contract: City::new(address, client),
            confirmations,
        }
    }
}

/// Hash of a mined write, or an error if the EVM reverted it.
fn write_outcome(receipt: Option<TransactionReceipt>) -> Result<Option<H256>, String> {
    match receipt {
        Some(receipt) if receipt.status == Some(U64::zero()) => Err(format!(
            "transaction {:?} reverted",
            receipt.transaction_hash
        )),
        receipt => Ok(receipt.map(|r| r.transaction_hash)),
    }
}

#[async_trait]
impl<M> OwnerSlotContract for CityContract<M>
where
    M: Middleware + 'static,
{
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn owner_address(&self) -> Result<Address, String> {
        self.contract
            .owner_address()
            .call()
            .await
            .map_err(|e| e.to_string())
    }

    async fn write_slot(&self, slot: U256, value: [u8; 32]) -> Result<Option<H256>, String> {
        let receipt = self
            .contract
            .write(slot, value)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .confirmations(self.confirmations)
            .await
            .map_err(|e| e.to_string())?;

        write_outcome(receipt)
    }
}
