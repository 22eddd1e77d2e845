use std::{
    path::PathBuf,
    time::Duration,
};

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::{
    deployer::AddressBook,
    encode_args::EncodeArgsError,
};

/// Top level failure of a deployment run.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("deployment of `{unit}` failed: {cause}")]
    DeploymentFailed {
        unit: String,
        #[source]
        cause: DeploymentFailure,
    },

    /// The contracts are on-chain but the artifact could not be written. The
    /// confirmed addresses are kept so the caller can still report them.
    #[error("contracts deployed but the address artifact was not written: {cause}")]
    PublishFailed {
        addresses: AddressBook,
        #[source]
        cause: PublishError,
    },

    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(#[from] ConfigError),
}

impl DeployError {
    pub(crate) fn failed(unit: &str, cause: impl Into<DeploymentFailure>) -> Self {
        Self::DeploymentFailed {
            unit: unit.to_string(),
            cause: cause.into(),
        }
    }
}

/// Why a single contract unit did not end up confirmed on-chain.
#[derive(Error, Debug)]
pub enum DeploymentFailure {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("could not encode constructor arguments: {0}")]
    Encode(#[from] EncodeArgsError),

    #[error("constructor argument references `{0}`, which has not been deployed in this run")]
    UnresolvedReference(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("no confirmation after {}s", .0.as_secs_f64())]
    ConfirmationTimeout(Duration),
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("no artifact named `{name}.json` under {}", .root.display())]
    NotFound { name: String, root: PathBuf },

    #[error("artifact `{name}` is ambiguous, found {} candidates: {}", .paths.len(), display_paths(.paths))]
    Ambiguous { name: String, paths: Vec<PathBuf> },

    #[error("malformed artifact {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{0}` has no creation bytecode (interface or abstract contract?)")]
    NotDeployable(String),

    #[error("failed to read artifacts: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("failed waiting for transaction: {0}")]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),

    #[error("deployment transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },

    #[error("receipt for {tx_hash} carries no contract address")]
    MissingContractAddress { tx_hash: TxHash },

    #[error("network rejected the transaction: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("`{0}` cannot be exported as an identifier")]
    InvalidIdentifier(String),

    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize addresses: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment variable `{0}` is not set")]
    MissingEnv(String),

    #[error("unterminated `${{` placeholder in `{0}`")]
    UnterminatedPlaceholder(String),

    #[error("unknown network `{name}`, known networks: {}", .known.join(", "))]
    UnknownNetwork { name: String, known: Vec<String> },

    #[error("invalid endpoint url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("network `{0}` has no signing account configured")]
    MissingAccount(String),

    #[error("invalid private key for network `{0}`")]
    InvalidPrivateKey(String),

    #[error("chain id mismatch: configured {expected}, node reports {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },

    #[error("could not query the node at {0}: {1}")]
    Unreachable(String, #[source] NetworkError),

    #[error("no contracts to deploy")]
    NoContracts,

    #[error("contract `{0}` is declared more than once")]
    DuplicateUnit(String),

    #[error("`{unit}` depends on unknown contract `{dependency}`")]
    UnknownDependency { unit: String, dependency: String },

    #[error("`{0}` depends on itself")]
    SelfDependency(String),

    #[error("dependency cycle between: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("invalid contract spec `{0}`, expected `Name` or `Name(arg1,arg2)`")]
    InvalidContractSpec(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
