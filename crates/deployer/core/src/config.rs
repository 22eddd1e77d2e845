//! Project configuration (`deployer.toml`) and its resolution into a
//! [`DeployerConfig`] for one network.

use std::{
    collections::BTreeMap,
    fmt,
    fs,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use alloy::signers::local::PrivateKeySigner;
use serde::Deserialize;
use url::Url;

use crate::{
    DEFAULT_CONFIRMATION_TIMEOUT_SECS,
    LOCAL_NETWORK,
    error::ConfigError,
    plan::ContractUnit,
    publisher::ArtifactFormat,
};

/// First development account of the default hardhat/anvil mnemonic.
pub const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

const LOCAL_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default = "default_network")]
    pub default_network: String,
    /// Directory holding compiled artifacts.
    #[serde(default = "default_artifacts")]
    pub artifacts: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkProfile>,
    #[serde(default, rename = "contract")]
    pub contracts: Vec<ContractUnit>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub format: ArtifactFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkProfile {
    pub url: String,
    pub chain_id: Option<u64>,
    /// Private keys; the first one signs deployments.
    #[serde(default)]
    pub accounts: Vec<String>,
}

fn default_network() -> String {
    LOCAL_NETWORK.to_string()
}

fn default_artifacts() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_CONFIRMATION_TIMEOUT_SECS
}

fn default_output_path() -> PathBuf {
    PathBuf::from("config.js")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: ArtifactFormat::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_network: default_network(),
            artifacts: default_artifacts(),
            confirmation_timeout_secs: default_timeout_secs(),
            output: OutputConfig::default(),
            networks: BTreeMap::new(),
            contracts: Vec::new(),
        }
    }
}

impl NetworkProfile {
    /// Local node at the default JSON-RPC port, funded development key. The
    /// chain id is whatever the node reports (hardhat and anvil use 31337,
    /// a hardhat config may pin 1337).
    pub fn local() -> Self {
        Self {
            url: LOCAL_URL.to_string(),
            chain_id: None,
            accounts: vec![DEV_PRIVATE_KEY.to_string()],
        }
    }
}

/// Everything a run needs to reach the network and find templates. Built
/// once up front; nothing below it reads the environment.
#[derive(Clone)]
pub struct DeployerConfig {
    pub network_name: String,
    pub network_endpoint: Url,
    pub chain_id: Option<u64>,
    pub signing_credential: PrivateKeySigner,
    pub contract_template_source: PathBuf,
    pub confirmation_timeout: Duration,
}

impl fmt::Debug for DeployerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployerConfig")
            .field("network_name", &self.network_name)
            .field("network_endpoint", &self.network_endpoint.as_str())
            .field("chain_id", &self.chain_id)
            .field("signer", &self.signing_credential.address())
            .field("contract_template_source", &self.contract_template_source)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish()
    }
}

impl ProjectConfig {
    /// Reads the config file. A missing file yields the defaults so that a
    /// bare `--contract` invocation against a local node works.
    pub fn read_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let mut config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        // Relative paths in the file are relative to the file.
        if let Some(base) = path.parent() {
            config.artifacts = base.join(&config.artifacts);
            config.output.path = base.join(&config.output.path);
        }
        Ok(config)
    }

    /// Looks up a profile, falling back to the built-in local one.
    pub fn network(&self, name: &str) -> Result<NetworkProfile, ConfigError> {
        if let Some(profile) = self.networks.get(name) {
            return Ok(profile.clone());
        }
        if name == LOCAL_NETWORK {
            return Ok(NetworkProfile::local());
        }

        let mut known: Vec<String> = self.networks.keys().cloned().collect();
        if !self.networks.contains_key(LOCAL_NETWORK) {
            known.push(LOCAL_NETWORK.to_string());
        }
        Err(ConfigError::UnknownNetwork {
            name: name.to_string(),
            known,
        })
    }

    /// Resolves `network` (or the default network) into a [`DeployerConfig`],
    /// interpolating `${VAR}` placeholders through `env`.
    pub fn resolve<F>(&self, network: Option<&str>, env: F) -> Result<DeployerConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network_name = network.unwrap_or(&self.default_network).to_string();
        let profile = self.network(&network_name)?;

        let url = interpolate(&profile.url, &env)?;
        let network_endpoint =
            Url::parse(&url).map_err(|source| ConfigError::InvalidUrl { url, source })?;

        let key = profile
            .accounts
            .first()
            .ok_or_else(|| ConfigError::MissingAccount(network_name.clone()))?;
        let key = interpolate(key, &env)?;
        let signing_credential = parse_private_key(&key)
            .ok_or_else(|| ConfigError::InvalidPrivateKey(network_name.clone()))?;

        Ok(DeployerConfig {
            network_name,
            network_endpoint,
            chain_id: profile.chain_id,
            signing_credential,
            contract_template_source: self.artifacts.clone(),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
        })
    }
}

/// Accepts keys with or without a `0x` prefix.
fn parse_private_key(raw: &str) -> Option<PrivateKeySigner> {
    let trimmed = raw.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex.is_empty() {
        return None;
    }
    format!("0x{hex}").parse().ok()
}

/// Replaces every `${NAME}` in `raw` with the value of `NAME`.
pub fn interpolate<F>(raw: &str, env: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ConfigError::UnterminatedPlaceholder(raw.to_string()))?;
        let name = after[..end].trim();
        let value = env(name).ok_or_else(|| ConfigError::MissingEnv(name.to_string()))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ConstructorArg;
    use std::collections::HashMap;

    const ARTD_CONFIG: &str = r#"
default_network = "ropsten"
artifacts = "artifacts"

[output]
path = "frontend/config.js"

[networks.hardhat]
url = "http://127.0.0.1:8545"
chain_id = 1337
accounts = ["0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"]

[networks.kovan]
url = "https://kovan.infura.io/v3/${INFURA_KEY}"
accounts = ["${PRIVATE_KEY}"]

[networks.ropsten]
url = "https://ropsten.infura.io/v3/${INFURA_KEY}"
accounts = ["0x${PRIVATE_KEY}"]

[[contract]]
name = "ArtDMarketplace"

[[contract]]
name = "ArtDodger"
args = ["@ArtDMarketplace"]
"#;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn parse(contents: &str) -> ProjectConfig {
        toml::from_str(contents).unwrap()
    }

    #[test]
    fn parses_project_file() {
        let config = parse(ARTD_CONFIG);
        assert_eq!(config.default_network, "ropsten");
        assert_eq!(config.networks.len(), 3);
        assert_eq!(config.output.path, PathBuf::from("frontend/config.js"));
        assert_eq!(config.output.format, ArtifactFormat::Js);
        assert_eq!(config.contracts.len(), 2);
        assert_eq!(
            config.contracts[1].constructor_args,
            vec![ConstructorArg::AddressOf("ArtDMarketplace".into())]
        );
    }

    #[test]
    fn defaults_apply_to_empty_file() {
        let config = parse("");
        assert_eq!(config.default_network, "hardhat");
        assert_eq!(config.artifacts, PathBuf::from("artifacts"));
        assert_eq!(config.output.path, PathBuf::from("config.js"));
        assert_eq!(config.confirmation_timeout_secs, 120);
        assert!(config.contracts.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ProjectConfig>("defaultNetwork = \"x\"").is_err());
    }

    #[test]
    fn resolves_default_network_with_env() {
        let config = parse(ARTD_CONFIG);
        let resolved = config
            .resolve(None, env(&[("INFURA_KEY", "abc123"), ("PRIVATE_KEY", KEY)]))
            .unwrap();

        assert_eq!(resolved.network_name, "ropsten");
        assert_eq!(
            resolved.network_endpoint.as_str(),
            "https://ropsten.infura.io/v3/abc123"
        );
        assert_eq!(resolved.chain_id, None);
        assert_eq!(
            resolved.signing_credential.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert_eq!(resolved.confirmation_timeout, Duration::from_secs(120));
    }

    #[test]
    fn key_without_prefix_is_accepted() {
        let config = parse(ARTD_CONFIG);
        let resolved = config
            .resolve(
                Some("kovan"),
                env(&[("INFURA_KEY", "abc123"), ("PRIVATE_KEY", KEY)]),
            )
            .unwrap();
        assert_eq!(resolved.network_name, "kovan");
    }

    #[test]
    fn missing_env_var_is_reported() {
        let config = parse(ARTD_CONFIG);
        let err = config
            .resolve(Some("kovan"), env(&[("PRIVATE_KEY", KEY)]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(name) if name == "INFURA_KEY"));
    }

    #[test]
    fn malformed_key_is_rejected() {
        let config = parse(ARTD_CONFIG);
        let err = config
            .resolve(
                Some("kovan"),
                env(&[("INFURA_KEY", "abc"), ("PRIVATE_KEY", "not-a-key")]),
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrivateKey(name) if name == "kovan"));
    }

    #[test]
    fn built_in_local_network() {
        let config = ProjectConfig::default();
        let resolved = config.resolve(None, env(&[])).unwrap();
        assert_eq!(resolved.network_name, "hardhat");
        assert_eq!(resolved.chain_id, None);
        assert_eq!(resolved.network_endpoint.as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn configured_profile_overrides_built_in() {
        let config = parse(ARTD_CONFIG);
        let resolved = config.resolve(Some("hardhat"), env(&[])).unwrap();
        assert_eq!(
            resolved.signing_credential.address().to_string(),
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
        );
        assert_eq!(resolved.chain_id, Some(1337));
    }

    #[test]
    fn unknown_network_lists_known_ones() {
        let config = parse(ARTD_CONFIG);
        let err = config.resolve(Some("mainnet"), env(&[])).unwrap_err();
        match err {
            ConfigError::UnknownNetwork { name, known } => {
                assert_eq!(name, "mainnet");
                assert_eq!(known, ["hardhat", "kovan", "ropsten"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn network_without_accounts_is_invalid() {
        let config = parse(
            r#"
[networks.readonly]
url = "http://localhost:8545"
"#,
        );
        let err = config.resolve(Some("readonly"), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAccount(_)));
    }

    #[test]
    fn interpolation() {
        let lookup = env(&[("A", "1"), ("B", "two")]);
        assert_eq!(interpolate("x${A}y${ B }z", &lookup).unwrap(), "x1ytwoz");
        assert_eq!(interpolate("no placeholders", &lookup).unwrap(), "no placeholders");
        assert!(matches!(
            interpolate("${A", &lookup),
            Err(ConfigError::UnterminatedPlaceholder(_))
        ));
        assert!(matches!(
            interpolate("${C}", &lookup),
            Err(ConfigError::MissingEnv(name)) if name == "C"
        ));
    }

    #[test]
    fn read_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::read_from_file(&dir.path().join("deployer.toml")).unwrap();
        assert_eq!(config.default_network, "hardhat");
    }

    #[test]
    fn read_file_anchors_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployer.toml");
        fs::write(&path, ARTD_CONFIG).unwrap();

        let config = ProjectConfig::read_from_file(&path).unwrap();
        assert_eq!(config.artifacts, dir.path().join("artifacts"));
        assert_eq!(config.output.path, dir.path().join("frontend/config.js"));
    }

    #[test]
    fn read_invalid_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployer.toml");
        fs::write(&path, "default_network = [").unwrap();
        assert!(matches!(
            ProjectConfig::read_from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
