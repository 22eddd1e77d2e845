use clap::Parser;
use deployer_common::args::CliArgs;
use deployer_core::{
    DEFAULT_CONFIRMATION_TIMEOUT_SECS,
    LOCAL_NETWORK,
    accounts::AccountsArgs,
    deploy_args::{
        DeployArgs,
        PlanArgs,
    },
};
use std::sync::OnceLock;

fn version_message() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION
        .get_or_init(|| {
            format!(
                "{}\nDefault network: {}\nDefault confirmation timeout: {}s",
                env!("CARGO_PKG_VERSION"),
                LOCAL_NETWORK,
                DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            )
        })
        .as_str()
}

#[derive(Parser)]
#[command(
    name = "deployer",
    version = version_message(),
    long_version = version_message(),
    about = "Deploy dependent contracts in order and publish their addresses"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    #[command(flatten)]
    pub args: CliArgs,
}

#[derive(clap::Subcommand)]
pub enum Commands {
    #[command(name = "deploy")]
    Deploy(DeployArgs),
    #[command(name = "plan")]
    Plan(PlanArgs),
    #[command(name = "accounts")]
    Accounts(AccountsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_deploy_with_contract_chain() {
        let cli = Cli::try_parse_from([
            "deployer",
            "--json",
            "deploy",
            "-n",
            "kovan",
            "-c",
            "ArtDMarketplace",
            "-c",
            "ArtDodger(@ArtDMarketplace)",
        ])
        .unwrap();
        assert!(cli.args.json_output());
        match cli.command {
            Commands::Deploy(args) => {
                assert_eq!(args.network.as_deref(), Some("kovan"));
                assert_eq!(args.overrides.contracts.len(), 2);
                assert_eq!(args.overrides.contracts[1].name, "ArtDodger");
                assert_eq!(
                    args.overrides.contracts[1].dependencies(),
                    vec!["ArtDMarketplace"]
                );
            }
            _ => panic!("expected deploy command"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["deployer", "plan", "--config", "ops/deployer.toml", "-j"])
            .unwrap();
        assert!(cli.args.json_output());
        assert_eq!(cli.args.config_path(), PathBuf::from("ops/deployer.toml"));
        assert!(matches!(cli.command, Commands::Plan(_)));
    }

    #[test]
    fn parses_accounts_command() {
        let cli = Cli::try_parse_from(["deployer", "accounts", "--network", "hardhat"]).unwrap();
        match cli.command {
            Commands::Accounts(args) => assert_eq!(args.network.as_deref(), Some("hardhat")),
            _ => panic!("expected accounts command"),
        }
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["deployer", "deploy", "--format", "yaml"]).is_err());
    }
}
