//! Writes deployed addresses to a file client code can import directly.

use std::{
    fs,
    io::Write as _,
    path::{
        Path,
        PathBuf,
    },
};

use deployer_common::is_identifier;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::{
    deployer::AddressBook,
    error::PublishError,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// One `export const Name = "0x…"` line per contract.
    #[default]
    Js,
    /// A flat `{ "Name": "0x…" }` object.
    Json,
}

#[derive(Debug, Clone)]
pub struct AddressPublisher {
    destination: PathBuf,
    format: ArtifactFormat,
}

impl AddressPublisher {
    pub fn new(destination: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            destination: destination.into(),
            format,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Renders the artifact contents, entries in deployment order.
    pub fn render(&self, addresses: &AddressBook) -> Result<String, PublishError> {
        match self.format {
            ArtifactFormat::Js => addresses
                .iter()
                .map(|contract| {
                    if !is_identifier(&contract.name) {
                        return Err(PublishError::InvalidIdentifier(contract.name.clone()));
                    }
                    Ok(format!(
                        "export const {} = \"{}\"\n",
                        contract.name, contract.address
                    ))
                })
                .collect(),
            ArtifactFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = addresses
                    .iter()
                    .map(|c| (c.name.clone(), c.address.to_string().into()))
                    .collect();
                let mut out = serde_json::to_string_pretty(&map)?;
                out.push('\n');
                Ok(out)
            }
        }
    }

    /// Replaces the destination with the rendered artifact. The new contents
    /// are written next to it and renamed into place, so readers never see a
    /// partially written file. An existing artifact keeps its permissions.
    pub fn publish(&self, addresses: &AddressBook) -> Result<(), PublishError> {
        let contents = self.render(addresses)?;
        let io_err = |source| PublishError::Io {
            path: self.destination.clone(),
            source,
        };

        let dir = match self.destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        let permissions = match fs::metadata(&self.destination) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(_) => default_permissions(),
        };
        if let Some(permissions) = permissions {
            file.as_file().set_permissions(permissions).map_err(io_err)?;
        }
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&self.destination)
            .map_err(|e| io_err(e.error))?;

        info!(
            path = %self.destination.display(),
            contracts = addresses.len(),
            "Published deployment artifact"
        );
        Ok(())
    }
}

/// Mode of a fresh artifact; temp files start owner-only.
#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployer::DeployedContract;
    use alloy::primitives::{
        TxHash,
        address,
    };
    use std::fs;

    fn book() -> AddressBook {
        let mut book = AddressBook::default();
        book.insert(DeployedContract {
            name: "ArtDMarketplace".into(),
            address: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            tx_hash: TxHash::ZERO,
            block_number: Some(1),
        });
        book.insert(DeployedContract {
            name: "ArtDodger".into(),
            address: address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            tx_hash: TxHash::ZERO,
            block_number: Some(2),
        });
        book
    }

    #[test]
    fn renders_es_module_in_deployment_order() {
        let publisher = AddressPublisher::new("config.js", ArtifactFormat::Js);
        assert_eq!(
            publisher.render(&book()).unwrap(),
            "export const ArtDMarketplace = \"0x5FbDB2315678afecb367f032d93F642f64180aa3\"\n\
             export const ArtDodger = \"0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512\"\n"
        );
    }

    #[test]
    fn renders_json_object() {
        let publisher = AddressPublisher::new("addresses.json", ArtifactFormat::Json);
        let rendered = publisher.render(&book()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            parsed["ArtDodger"],
            "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
        );
        assert_eq!(parsed.as_object().unwrap().len(), 2);
    }

    #[test]
    fn rejects_names_that_are_not_identifiers() {
        let mut book = AddressBook::default();
        book.insert(DeployedContract {
            name: "Art-Dodger".into(),
            address: address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            tx_hash: TxHash::ZERO,
            block_number: None,
        });
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.js");
        let err = AddressPublisher::new(&path, ArtifactFormat::Js)
            .publish(&book)
            .unwrap_err();
        assert!(matches!(err, PublishError::InvalidIdentifier(name) if name == "Art-Dodger"));
        assert!(!path.exists());
    }

    #[test]
    fn overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.js");
        fs::write(&path, "export const Stale = \"0x0\"\nexport const Other = \"0x1\"\n").unwrap();

        AddressPublisher::new(&path, ArtifactFormat::Js)
            .publish(&book())
            .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("Stale"));
        assert_eq!(written.lines().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn keeps_mode_of_existing_artifact() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.js");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        AddressPublisher::new(&path, ArtifactFormat::Js)
            .publish(&book())
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn new_artifact_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.js");
        AddressPublisher::new(&path, ArtifactFormat::Js)
            .publish(&book())
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("config.js");
        let err = AddressPublisher::new(&path, ArtifactFormat::Js)
            .publish(&book())
            .unwrap_err();
        assert!(matches!(err, PublishError::Io { path: p, .. } if p == path));
    }
}
