use clap::{
    Parser,
    ValueHint,
};
use std::path::PathBuf;

use crate::DEFAULT_CONFIG_FILE;

#[derive(Debug, Parser, Clone, Default)]
pub struct CliArgs {
    /// Print results and errors as JSON
    #[clap(short, long, global = true)]
    pub json: bool,
    /// Path of the project configuration file
    #[clap(
        long = "config",
        env = "DEPLOYER_CONFIG",
        global = true,
        value_hint = ValueHint::FilePath
    )]
    pub config_path: Option<PathBuf>,
}

impl CliArgs {
    pub fn json_output(&self) -> bool {
        self.json
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn parses_json_flag() {
        let args = CliArgs::try_parse_from(["cli", "--json"]).expect("should parse");
        assert!(args.json_output());
    }

    #[test]
    fn config_path_defaults_to_working_directory() {
        let args = CliArgs::default();
        assert_eq!(args.config_path(), PathBuf::from("deployer.toml"));
    }

    #[test]
    fn config_path_can_be_overridden() {
        let args = CliArgs {
            config_path: Some(PathBuf::from("/tmp/project/deployer.toml")),
            ..Default::default()
        };
        assert_eq!(
            args.config_path(),
            Path::new("/tmp/project/deployer.toml").to_path_buf()
        );
    }
}
