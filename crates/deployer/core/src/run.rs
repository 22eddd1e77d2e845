//! One full deployment run: deploy the plan, then publish the addresses.

use std::path::PathBuf;

use crate::{
    deployer::{
        AddressBook,
        Deployer,
    },
    error::DeployError,
    network::Network,
    plan::DeploymentPlan,
    publisher::AddressPublisher,
    registry::TemplateRegistry,
};

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    pub addresses: AddressBook,
    pub artifact: PathBuf,
}

/// Deploys `plan` and writes the artifact. If only the write fails, the
/// returned [`DeployError::PublishFailed`] still carries every address.
pub async fn execute<N, R>(
    deployer: &Deployer<N, R>,
    plan: &DeploymentPlan,
    publisher: &AddressPublisher,
) -> Result<DeploymentReport, DeployError>
where
    N: Network,
    R: TemplateRegistry,
{
    let addresses = deployer.deploy(plan).await?;

    if let Err(cause) = publisher.publish(&addresses) {
        return Err(DeployError::PublishFailed { addresses, cause });
    }

    Ok(DeploymentReport {
        addresses,
        artifact: publisher.destination().to_path_buf(),
    })
}
