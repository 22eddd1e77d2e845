use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde_json::json;
use tempfile::TempDir;

/// Init code that ignores constructor arguments and deploys
/// [`STUB_RUNTIME_CODE`].
pub const STUB_INIT_CODE: &str = "0x600a600c600039600a6000f3602a60005260206000f3";

/// Runtime code left on-chain by [`STUB_INIT_CODE`]; returns 42.
pub const STUB_RUNTIME_CODE: &str = "0x602a60005260206000f3";

pub const NO_CONSTRUCTOR_ABI: &str = "[]";

/// ABI with a single `constructor(address)`.
pub const ADDRESS_CONSTRUCTOR_ABI: &str = r#"[{"type":"constructor","stateMutability":"nonpayable","inputs":[{"name":"marketplace","type":"address","internalType":"address"}]}]"#;

/// Writes a Hardhat style artifact for `name` to
/// `<root>/contracts/<name>.sol/<name>.json`.
pub fn write_artifact(root: &Path, name: &str, abi: &str, bytecode: &str) -> PathBuf {
    let dir = root.join("contracts").join(format!("{name}.sol"));
    fs::create_dir_all(&dir).expect("create artifact dir");
    let abi: serde_json::Value = serde_json::from_str(abi).expect("fixture abi is json");
    let artifact = json!({
        "_format": "hh-sol-artifact-1",
        "contractName": name,
        "sourceName": format!("contracts/{name}.sol"),
        "abi": abi,
        "bytecode": bytecode,
        "deployedBytecode": STUB_RUNTIME_CODE,
        "linkReferences": {},
        "deployedLinkReferences": {},
    });
    let path = dir.join(format!("{name}.json"));
    fs::write(&path, serde_json::to_string_pretty(&artifact).expect("serialize artifact"))
        .expect("write artifact");
    path
}

/// Temporary project with an artifacts directory holding a base contract and
/// a dependent whose constructor takes the base's address.
pub struct ArtifactDir {
    dir: TempDir,
}

impl ArtifactDir {
    pub const BASE: &'static str = "ArtDMarketplace";
    pub const DEPENDENT: &'static str = "ArtDodger";

    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp project");
        let this = Self { dir };
        fs::create_dir_all(this.artifacts()).expect("create artifacts dir");
        write_artifact(&this.artifacts(), Self::BASE, NO_CONSTRUCTOR_ABI, STUB_INIT_CODE);
        write_artifact(
            &this.artifacts(),
            Self::DEPENDENT,
            ADDRESS_CONSTRUCTOR_ABI,
            STUB_INIT_CODE,
        );
        this
    }

    /// Project root; a good place for the published artifact.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn artifacts(&self) -> PathBuf {
        self.dir.path().join("artifacts")
    }
}

impl Default for ArtifactDir {
    fn default() -> Self {
        Self::new()
    }
}
