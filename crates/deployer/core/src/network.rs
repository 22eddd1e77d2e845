//! The chain the contracts are deployed to.

use alloy::{
    network::{
        EthereumWallet,
        TransactionBuilder,
    },
    primitives::{
        Address,
        Bytes,
        TxHash,
        U256,
    },
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use tracing::{
    debug,
    info,
};

use crate::{
    config::DeployerConfig,
    error::{
        ConfigError,
        NetworkError,
    },
};

/// What the network reports once a contract creation is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Submits contract creations on behalf of a single signing account.
///
/// Implementations return only after the creation is confirmed; callers bound
/// the wait themselves.
#[async_trait]
pub trait Network: Send + Sync {
    /// Account that signs and pays for deployments.
    fn deployer(&self) -> Address;

    /// Sends `init_code` as a contract creation and waits for its receipt.
    async fn deploy(&self, init_code: Bytes) -> Result<DeploymentReceipt, NetworkError>;

    async fn balance(&self, account: Address) -> Result<U256, NetworkError>;
}

/// JSON-RPC node reached over HTTP, signing locally.
#[derive(Clone)]
pub struct RpcNetwork {
    provider: DynProvider,
    deployer: Address,
    chain_id: u64,
}

impl RpcNetwork {
    /// Connects to the configured endpoint and checks the node's chain id
    /// against the configured one, if any.
    pub async fn connect(config: &DeployerConfig) -> Result<Self, ConfigError> {
        let signer = config.signing_credential.clone();
        let deployer = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(config.network_endpoint.clone())
            .erased();

        let endpoint = config.network_endpoint.to_string();
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ConfigError::Unreachable(endpoint, e.into()))?;
        if let Some(expected) = config.chain_id
            && expected != chain_id
        {
            return Err(ConfigError::ChainIdMismatch {
                expected,
                actual: chain_id,
            });
        }

        info!(
            network = %config.network_name,
            chain_id,
            deployer = %deployer,
            "Connected to network"
        );
        Ok(Self {
            provider,
            deployer,
            chain_id,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl Network for RpcNetwork {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn deploy(&self, init_code: Bytes) -> Result<DeploymentReceipt, NetworkError> {
        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_deploy_code(init_code);

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "Deployment transaction submitted");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(NetworkError::Reverted { tx_hash });
        }
        let address = receipt
            .contract_address
            .ok_or(NetworkError::MissingContractAddress { tx_hash })?;

        Ok(DeploymentReceipt {
            address,
            tx_hash,
            block_number: receipt.block_number,
        })
    }

    async fn balance(&self, account: Address) -> Result<U256, NetworkError> {
        Ok(self.provider.get_balance(account).await?)
    }
}
