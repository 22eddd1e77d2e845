mod cli;

use crate::cli::{
    Cli,
    Commands,
};
use clap::Parser;
use color_eyre::{
    Result,
    eyre::Report,
};
use deployer_core::config::ProjectConfig;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install()?;

    // A missing .env is fine; credentials may come from the real environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = async {
        let config = ProjectConfig::read_from_file(&cli.args.config_path())?;
        match &cli.command {
            Commands::Deploy(deploy) => {
                deploy.run(&cli.args, &config, env_lookup).await?;
            }
            Commands::Plan(plan) => {
                plan.run(&cli.args, &config)?;
            }
            Commands::Accounts(accounts) => {
                accounts.run(&cli.args, &config, env_lookup).await?;
            }
        }
        Ok::<_, Report>(())
    }
    .await;

    if let Err(err) = result {
        if cli.args.json_output() {
            let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
            eprintln!(
                "{}",
                json!({
                    "status": "error",
                    "error": {
                        "message": err.to_string(),
                        "causes": causes,
                    }
                })
            );
            std::process::exit(1);
        } else {
            return Err(err);
        }
    }

    Ok(())
}
