//! `deploy` and `plan` commands.

use std::path::PathBuf;

use clap::{
    Args,
    Parser,
    ValueHint,
};
use colored::Colorize;
use deployer_common::args::CliArgs;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use serde_json::json;
use tokio::time::Duration;

use crate::{
    config::{
        DeployerConfig,
        ProjectConfig,
    },
    deployer::{
        AddressBook,
        Deployer,
        preflight,
    },
    error::DeployError,
    network::RpcNetwork,
    plan::{
        ContractUnit,
        DeploymentPlan,
    },
    publisher::{
        AddressPublisher,
        ArtifactFormat,
    },
    registry::ArtifactRegistry,
    run::{
        self,
        DeploymentReport,
    },
};

const DEPLOY_AFTER_HELP: &str = "EXAMPLES:\n    \
                                 Deploy the contracts listed in deployer.toml to its default network:\n        \
                                 deployer deploy\n\n    \
                                 Deploy to a named network and write addresses as JSON:\n        \
                                 deployer deploy -n ropsten -o addresses.json --format json\n\n    \
                                 Deploy an ad-hoc chain, passing the first address to the second constructor:\n        \
                                 deployer deploy -c ArtDMarketplace -c 'ArtDodger(@ArtDMarketplace)'";

/// Options shared by `deploy` and `plan` that override `deployer.toml`.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanOverrides {
    /// Directory of compiled contract artifacts
    #[clap(long, value_hint = ValueHint::DirPath)]
    pub artifacts: Option<PathBuf>,

    /// Contracts to deploy, replacing the configured list
    #[clap(
        long = "contract",
        short = 'c',
        value_name = "CONTRACT",
        help = "Contract in format 'Name' or 'Name(arg1,@Other)'. `@Other` is replaced with the address of Other. Repeat for multiple contracts."
    )]
    pub contracts: Vec<ContractUnit>,
}

impl PlanOverrides {
    fn apply(&self, config: &mut ProjectConfig) {
        if let Some(artifacts) = &self.artifacts {
            config.artifacts.clone_from(artifacts);
        }
        if !self.contracts.is_empty() {
            config.contracts.clone_from(&self.contracts);
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "deploy",
    about = "Deploy contracts in dependency order and publish their addresses",
    after_help = DEPLOY_AFTER_HELP
)]
pub struct DeployArgs {
    /// Network profile to deploy to
    #[clap(short = 'n', long, env = "DEPLOYER_NETWORK")]
    pub network: Option<String>,

    /// File the addresses are written to
    #[clap(short = 'o', long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Format of the address file
    #[clap(long, value_enum)]
    pub format: Option<ArtifactFormat>,

    /// Seconds to wait for each deployment to be confirmed
    #[clap(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub overrides: PlanOverrides,
}

impl DeployArgs {
    fn apply(&self, config: &mut ProjectConfig) {
        self.overrides.apply(config);
        if let Some(output) = &self.output {
            config.output.path.clone_from(output);
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(secs) = self.timeout_secs {
            config.confirmation_timeout_secs = secs;
        }
    }

    /// Creates and configures a progress spinner for the confirmation wait.
    fn create_spinner(json_output: bool) -> ProgressBar {
        if json_output {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    }

    /// Executes the full run: resolve configuration, deploy, publish.
    ///
    /// # Arguments
    /// * `cli_args` - General CLI arguments
    /// * `config` - Project configuration read from disk
    /// * `env` - Lookup for `${VAR}` placeholders
    pub async fn run<F>(
        &self,
        cli_args: &CliArgs,
        config: &ProjectConfig,
        env: F,
    ) -> Result<DeploymentReport, DeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = config.clone();
        self.apply(&mut config);

        let deployer_config: DeployerConfig = config.resolve(self.network.as_deref(), env)?;
        let plan = DeploymentPlan::resolve(config.contracts.clone())?;
        let publisher = AddressPublisher::new(&config.output.path, config.output.format);

        let network = RpcNetwork::connect(&deployer_config).await?;
        let chain_id = network.chain_id();
        let registry = ArtifactRegistry::new(&deployer_config.contract_template_source);
        let deployer = Deployer::new(network, registry, deployer_config.confirmation_timeout);

        let spinner = Self::create_spinner(cli_args.json_output());
        spinner.set_message(format!(
            "Deploying {} contract{} to {}...",
            plan.len(),
            if plan.len() == 1 { "" } else { "s" },
            deployer_config.network_name
        ));

        match run::execute(&deployer, &plan, &publisher).await {
            Ok(report) => {
                spinner.finish_with_message("✅ Deployment complete");
                Self::display_success(&report, &deployer_config.network_name, chain_id, cli_args);
                Ok(report)
            }
            Err(err) => {
                spinner.finish_with_message("❌ Deployment failed");
                if let DeployError::PublishFailed { addresses, .. } = &err {
                    Self::display_unpublished(addresses, cli_args);
                }
                Err(err)
            }
        }
    }

    fn display_success(
        report: &DeploymentReport,
        network: &str,
        chain_id: u64,
        cli_args: &CliArgs,
    ) {
        if cli_args.json_output() {
            let output = json!({
                "status": "success",
                "network": network,
                "chain_id": chain_id,
                "artifact": report.artifact,
                "contracts": report.addresses,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
            );
            return;
        }

        println!("\n{}", "Deployed Contracts".bold().green());
        println!("{}", "==================".green());
        for contract in &report.addresses {
            println!("  {:<24} {}", contract.name, contract.address);
        }
        println!("\nNetwork: {network} (chain id {chain_id})");
        println!("Addresses written to: {}", report.artifact.display());
    }

    /// Addresses have to reach the operator even when the artifact did not.
    fn display_unpublished(addresses: &AddressBook, cli_args: &CliArgs) {
        if cli_args.json_output() {
            eprintln!("{}", json!({ "deployed": addresses }));
            return;
        }
        eprintln!(
            "\n{}",
            "Contracts were deployed but the artifact was not written:"
                .bold()
                .yellow()
        );
        for contract in addresses {
            eprintln!("  {:<24} {}", contract.name, contract.address);
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "plan",
    about = "Show the deployment order and check artifacts without sending transactions"
)]
pub struct PlanArgs {
    #[command(flatten)]
    pub overrides: PlanOverrides,
}

impl PlanArgs {
    /// Resolves the plan and preflights every template.
    pub fn run(
        &self,
        cli_args: &CliArgs,
        config: &ProjectConfig,
    ) -> Result<DeploymentPlan, DeployError> {
        let mut config = config.clone();
        self.overrides.apply(&mut config);

        let plan = DeploymentPlan::resolve(config.contracts.clone())?;
        let templates = preflight(&ArtifactRegistry::new(&config.artifacts), &plan)?;

        if cli_args.json_output() {
            let units: Vec<_> = plan
                .units()
                .iter()
                .zip(&templates)
                .map(|(unit, template)| {
                    let args: Vec<String> =
                        unit.constructor_args.iter().map(ToString::to_string).collect();
                    json!({
                        "name": unit.name,
                        "constructor_args": args,
                        "depends_on": unit.dependencies(),
                        "bytecode_size": template.bytecode.len(),
                    })
                })
                .collect();
            println!("{}", json!({ "status": "success", "order": units }));
        } else {
            println!("{}", "Deployment Order".bold().green());
            println!("{}", "================".green());
            for (position, unit) in plan.units().iter().enumerate() {
                println!("  {}. {}", position + 1, unit);
            }
            if !plan.edges().is_empty() {
                println!("\n{}", "Dependencies".bold());
                for edge in plan.edges() {
                    println!("  {edge}");
                }
            }
        }
        Ok(plan)
    }
}
