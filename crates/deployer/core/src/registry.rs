//! Lookup of compiled contract templates by name.

use std::{
    collections::HashMap,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use alloy::primitives::Bytes;
use alloy_json_abi::{
    Constructor,
    JsonAbi,
};
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    encode_args::{
        EncodeArgsError,
        encode_constructor_args,
    },
    error::TemplateError,
};

/// ABI and creation bytecode of a contract.
#[derive(Debug, Clone)]
pub struct ContractTemplate {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractTemplate {
    pub fn new(name: impl Into<String>, abi: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            name: name.into(),
            abi,
            bytecode,
        }
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.abi.constructor.as_ref()
    }

    /// Number of constructor parameters.
    pub fn arity(&self) -> usize {
        self.constructor().map_or(0, |c| c.inputs.len())
    }

    /// Creation bytecode with the encoded constructor arguments appended.
    pub fn init_code<S: AsRef<str>>(&self, args: &[S]) -> Result<Bytes, EncodeArgsError> {
        let encoded = encode_constructor_args(self.constructor(), args)?;
        let mut code = Vec::with_capacity(self.bytecode.len() + encoded.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(&encoded);
        Ok(code.into())
    }
}

/// Source of contract templates, resolved by logical name.
pub trait TemplateRegistry: Send + Sync {
    fn template(&self, name: &str) -> Result<ContractTemplate, TemplateError>;
}

impl TemplateRegistry for HashMap<String, ContractTemplate> {
    fn template(&self, name: &str) -> Result<ContractTemplate, TemplateError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
                root: PathBuf::from("<memory>"),
            })
    }
}

/// Hardhat (`artifacts/`) and Foundry (`out/`) both store one
/// `<Contract>.json` per contract somewhere below the root.
#[derive(Debug, Clone)]
pub struct ArtifactRegistry {
    root: PathBuf,
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    bytecode: RawBytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

impl From<RawBytecode> for Bytes {
    fn from(raw: RawBytecode) -> Self {
        match raw {
            RawBytecode::Hex(bytes) | RawBytecode::Object { object: bytes } => bytes,
        }
    }
}

impl ArtifactRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, name: &str) -> Result<Vec<PathBuf>, TemplateError> {
        if !self.root.is_dir() {
            return Err(TemplateError::NotFound {
                name: name.to_string(),
                root: self.root.clone(),
            });
        }

        let file_name = format!("{name}.json");
        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                TemplateError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("filesystem loop while walking artifacts")
                }))
            })?;
            if entry.file_type().is_file() && entry.file_name() == file_name.as_str() {
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }

    fn load(name: &str, path: &Path) -> Result<ContractTemplate, TemplateError> {
        let contents = fs::read_to_string(path)?;
        let raw: RawArtifact =
            serde_json::from_str(&contents).map_err(|source| TemplateError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let bytecode = Bytes::from(raw.bytecode);
        if bytecode.is_empty() {
            return Err(TemplateError::NotDeployable(name.to_string()));
        }
        Ok(ContractTemplate::new(name, raw.abi, bytecode))
    }
}

impl TemplateRegistry for ArtifactRegistry {
    fn template(&self, name: &str) -> Result<ContractTemplate, TemplateError> {
        let mut candidates = self.candidates(name)?;
        match candidates.len() {
            0 => Err(TemplateError::NotFound {
                name: name.to_string(),
                root: self.root.clone(),
            }),
            1 => {
                let path = candidates.remove(0);
                debug!(contract = name, path = %path.display(), "Loading artifact");
                Self::load(name, &path)
            }
            _ => Err(TemplateError::Ambiguous {
                name: name.to_string(),
                paths: candidates,
            }),
        }
    }
}
