use std::{fmt, future::Future, time::Duration};

use ethers::types::{Address, H256, U256};
use tokio_util::sync::CancellationToken;

use crate::{
    artifacts::ContractArtifact,
    contracts::{ContractDeployer, OwnerSlotContract},
    errors::{ProbeError, ProbeStep},
    utils::{display_address, parse_word, word_to_address},
};

pub const DEFAULT_CONTRACT: &str = "City";
pub const DEFAULT_SLOT: u64 = 1;
pub const DEFAULT_PAYLOAD: &str =
    "0x000000000000000000000000f39fd6e51aad88f6f4ce6ab8827279cfffb92266";

const OLD_OWNER_LABEL: &str = "Old owner address:";
const NEW_OWNER_LABEL: &str = "New owner address:";

/// Arguments of the mutating call and the per-call time limit.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeOptions {
    pub slot: U256,
    pub payload: [u8; 32],
    pub call_timeout: Duration,
}

impl ProbeOptions {
    pub fn new(slot: u64, payload: &str, call_timeout: Duration) -> Result<Self, ProbeError> {
        Ok(Self {
            slot: U256::from(slot),
            payload: parse_word(payload)?,
            call_timeout,
        })
    }

    /// The owner the payload decodes to if the contract reads it as a
    /// padded address.
    pub fn expected_owner(&self) -> Address {
        word_to_address(&self.payload)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProbeReport {
    pub contract_address: Address,
    pub old_owner: Address,
    pub new_owner: Address,
    pub write_tx: Option<H256>,
}

/// Renders the two labelled console lines.
impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{OLD_OWNER_LABEL} {}", display_address(&self.old_owner))?;
        write!(f, "{NEW_OWNER_LABEL} {}", display_address(&self.new_owner))
    }
}

/// Deploy → read → write → read, strictly in that order.
pub struct Probe<D> {
    deployer: D,
    options: ProbeOptions,
    cancel: CancellationToken,
}

impl<D> Probe<D>
where
    D: ContractDeployer,
{
    pub fn new(deployer: D, options: ProbeOptions, cancel: CancellationToken) -> Self {
        Self {
            deployer,
            options,
            cancel,
        }
    }

    pub async fn run(&self, artifact: &ContractArtifact) -> Result<ProbeReport, ProbeError> {
        log::info!("deploying {}", artifact.fully_qualified_name());
        let instance = self
            .guarded(ProbeStep::Deploy, self.deployer.deploy(artifact))
            .await?;
        let contract_address = instance.address();

        let old_owner = self
            .guarded(ProbeStep::ReadOwnerBefore, instance.owner_address())
            .await?;
        log::debug!("owner before write: {old_owner:?}");

        log::info!(
            "writing 0x{} to slot {}",
            hex::encode(self.options.payload),
            self.options.slot
        );
        let write_tx = self
            .guarded(
                ProbeStep::WriteSlot,
                instance.write_slot(self.options.slot, self.options.payload),
            )
            .await?;
        log::debug!("write mined in {write_tx:?}");

        let new_owner = self
            .guarded(ProbeStep::ReadOwnerAfter, instance.owner_address())
            .await?;

        Ok(ProbeReport {
            contract_address,
            old_owner,
            new_owner,
            write_tx,
        })
    }

    /// Runs one remote call under the time limit and the cancellation token,
    /// tagging any failure with `step`.
    async fn guarded<T, F>(&self, step: ProbeStep, call: F) -> Result<T, ProbeError>
    where
        F: Future<Output = Result<T, String>>,
    {
        let after = self.options.call_timeout;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProbeError::Cancelled { step }),
            outcome = tokio::time::timeout(after, call) => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(message)) => Err(ProbeError::Remote { step, message }),
                Err(_) => Err(ProbeError::TimedOut { step, after }),
            },
        }
    }
}
