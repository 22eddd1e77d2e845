use std::{
    path::PathBuf,
    time::Duration,
};

use deployer_core::{
    deployer::Deployer,
    error::DeployError,
    plan::DeploymentPlan,
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
use int_test_utils::{
    ArtifactDir,
    MockNetwork,
};

/// A temporary project deploying against a [`MockNetwork`].
pub struct TestSetup {
    pub project: ArtifactDir,
    pub network: MockNetwork,
    pub output: PathBuf,
    pub format: ArtifactFormat,
    pub timeout: Duration,
}

impl TestSetup {
    pub fn new() -> Self {
        let project = ArtifactDir::new();
        let output = project.root().join("config.js");
        Self {
            project,
            network: MockNetwork::new(),
            output,
            format: ArtifactFormat::Js,
            timeout: Duration::from_secs(5),
        }
    }

    #[allow(dead_code)]
    pub fn set_output(&mut self, output: PathBuf) {
        self.output = output;
    }

    #[allow(dead_code)]
    pub fn set_format(&mut self, format: ArtifactFormat) {
        self.format = format;
    }

    #[allow(dead_code)]
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub async fn run(&self, specs: &[&str]) -> Result<DeploymentReport, DeployError> {
        let units = specs
            .iter()
            .map(|spec| spec.parse())
            .collect::<Result<Vec<_>, _>>()?;
        let plan = DeploymentPlan::resolve(units)?;
        let deployer = Deployer::new(
            self.network.clone(),
            ArtifactRegistry::new(self.project.artifacts()),
            self.timeout,
        );
        let publisher = AddressPublisher::new(&self.output, self.format);
        run::execute(&deployer, &plan, &publisher).await
    }
}
