//! `accounts` command: shows which account a network profile deploys from.

use alloy::primitives::{
    Address,
    U256,
    utils::format_ether,
};
use clap::Parser;
use colored::Colorize;
use deployer_common::args::CliArgs;
use serde_json::json;

use crate::{
    config::ProjectConfig,
    error::{
        ConfigError,
        DeployError,
        NetworkError,
    },
    network::{
        Network,
        RpcNetwork,
    },
};

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "accounts",
    about = "Print the deploying account of a network profile and its balance"
)]
pub struct AccountsArgs {
    /// Network profile to inspect
    #[clap(short = 'n', long, env = "DEPLOYER_NETWORK")]
    pub network: Option<String>,
}

/// Deploying account of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub address: Address,
    pub balance: U256,
}

impl AccountsArgs {
    pub async fn run<F>(
        &self,
        cli_args: &CliArgs,
        config: &ProjectConfig,
        env: F,
    ) -> Result<AccountInfo, DeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let deployer_config = config.resolve(self.network.as_deref(), env)?;
        let network = RpcNetwork::connect(&deployer_config).await?;
        let info = account_info(&network).await.map_err(|e| {
            ConfigError::Unreachable(deployer_config.network_endpoint.to_string(), e)
        })?;

        if cli_args.json_output() {
            println!(
                "{}",
                json!({
                    "network": deployer_config.network_name,
                    "chain_id": network.chain_id(),
                    "address": info.address,
                    "balance_wei": info.balance.to_string(),
                    "balance": format_ether(info.balance),
                })
            );
        } else {
            println!(
                "{} {} ({} ETH)",
                format!("{}:", deployer_config.network_name).bold(),
                info.address,
                format_ether(info.balance)
            );
        }
        Ok(info)
    }
}

/// Reads the deploying account and its balance from `network`.
pub async fn account_info<N: Network>(network: &N) -> Result<AccountInfo, NetworkError> {
    let address = network.deployer();
    let balance = network.balance(address).await?;
    Ok(AccountInfo { address, balance })
}
