#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod accounts;
pub mod config;
pub mod deploy_args;
pub mod deployer;
pub mod encode_args;
pub mod error;
pub mod network;
pub mod plan;
pub mod publisher;
pub mod registry;
pub mod run;

/// Confirmation timeout used when neither the CLI nor the config sets one.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;

/// Name of the network profile that is always available.
pub const LOCAL_NETWORK: &str = "hardhat";
