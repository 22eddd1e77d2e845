use std::sync::{
    Arc,
    atomic::{
        AtomicBool,
        AtomicU64,
        Ordering,
    },
};

use alloy::primitives::{
    Address,
    Bytes,
    U256,
    keccak256,
};
use async_trait::async_trait;
use deployer_core::{
    error::NetworkError,
    network::{
        DeploymentReceipt,
        Network,
    },
};
use parking_lot::Mutex;
use tracing::debug;

/// A creation transaction seen by [`MockNetwork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDeployment {
    pub init_code: Bytes,
    pub receipt: Option<DeploymentReceipt>,
}

/// In-memory network that confirms every creation at the address the
/// deploying account's nonce dictates.
///
/// Each instance deploys from a fresh random account, so two runs never share
/// addresses. Clones share state.
#[derive(Debug, Clone)]
pub struct MockNetwork {
    deployer: Address,
    nonce: Arc<AtomicU64>,
    sent: Arc<Mutex<Vec<SentDeployment>>>,
    rejected_prefixes: Arc<Mutex<Vec<Bytes>>>,
    stalled: Arc<AtomicBool>,
    balance: U256,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::with_deployer(Address::from(rand::random::<[u8; 20]>()))
    }

    pub fn with_deployer(deployer: Address) -> Self {
        Self {
            deployer,
            nonce: Arc::default(),
            sent: Arc::default(),
            rejected_prefixes: Arc::default(),
            stalled: Arc::default(),
            balance: U256::from(10u64).pow(U256::from(21u64)),
        }
    }

    /// Reverts any creation whose init code starts with `prefix`.
    pub fn reject_init_code(&self, prefix: impl Into<Bytes>) {
        self.rejected_prefixes.lock().push(prefix.into());
    }

    /// Never confirms creations sent after this call.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Every creation attempted so far, in order.
    pub fn sent(&self) -> Vec<SentDeployment> {
        self.sent.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().len()
    }
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Network for MockNetwork {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn deploy(&self, init_code: Bytes) -> Result<DeploymentReceipt, NetworkError> {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let tx_hash = keccak256([self.deployer.as_slice(), nonce.to_be_bytes().as_slice()].concat());

        let rejected = self
            .rejected_prefixes
            .lock()
            .iter()
            .any(|prefix| init_code.starts_with(prefix));
        if rejected {
            debug!(%tx_hash, "Mock network reverting creation");
            self.sent.lock().push(SentDeployment {
                init_code,
                receipt: None,
            });
            return Err(NetworkError::Reverted { tx_hash });
        }

        if self.stalled.load(Ordering::SeqCst) {
            self.sent.lock().push(SentDeployment {
                init_code,
                receipt: None,
            });
            return std::future::pending().await;
        }

        let receipt = DeploymentReceipt {
            address: self.deployer.create(nonce),
            tx_hash,
            block_number: Some(nonce + 1),
        };
        self.sent.lock().push(SentDeployment {
            init_code,
            receipt: Some(receipt),
        });
        Ok(receipt)
    }

    async fn balance(&self, account: Address) -> Result<U256, NetworkError> {
        Ok(if account == self.deployer {
            self.balance
        } else {
            U256::ZERO
        })
    }
}
