//! Ordered deployment of contract units.

use std::time::Duration;

use alloy::primitives::{
    Address,
    Bytes,
    TxHash,
};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{
    debug,
    info,
    warn,
};

use crate::{
    encode_args::encode_args,
    error::{
        DeployError,
        DeploymentFailure,
    },
    network::Network,
    plan::{
        ConstructorArg,
        ContractUnit,
        DeploymentPlan,
    },
    registry::{
        ContractTemplate,
        TemplateRegistry,
    },
};

/// A contract confirmed on-chain during this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedContract {
    pub name: String,
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Deployed contracts by name, in the order they were deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressBook {
    contracts: Vec<DeployedContract>,
}

impl AddressBook {
    /// Records `contract`, replacing an earlier entry with the same name.
    pub fn insert(&mut self, contract: DeployedContract) {
        match self.contracts.iter_mut().find(|c| c.name == contract.name) {
            Some(existing) => *existing = contract,
            None => self.contracts.push(contract),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DeployedContract> {
        self.contracts.iter().find(|c| c.name == name)
    }

    pub fn address(&self, name: &str) -> Option<Address> {
        self.get(name).map(|c| c.address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeployedContract> {
        self.contracts.iter()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl<'a> IntoIterator for &'a AddressBook {
    type Item = &'a DeployedContract;
    type IntoIter = std::slice::Iter<'a, DeployedContract>;

    fn into_iter(self) -> Self::IntoIter {
        self.contracts.iter()
    }
}

/// Deploys the units of a [`DeploymentPlan`] one at a time, feeding the
/// addresses of earlier units into the constructors of later ones.
pub struct Deployer<N, R> {
    network: N,
    registry: R,
    confirmation_timeout: Duration,
}

impl<N: Network, R: TemplateRegistry> Deployer<N, R> {
    pub fn new(network: N, registry: R, confirmation_timeout: Duration) -> Self {
        Self {
            network,
            registry,
            confirmation_timeout,
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Deploys every unit of `plan` in order.
    ///
    /// All templates are resolved and all literal arguments checked before the
    /// first transaction is sent. The first failing unit aborts the run; units
    /// after it are never attempted.
    pub async fn deploy(&self, plan: &DeploymentPlan) -> Result<AddressBook, DeployError> {
        let templates = preflight(&self.registry, plan)?;

        let mut book = AddressBook::default();
        for (unit, template) in plan.units().iter().zip(&templates) {
            let contract = self.deploy_unit(unit, template, &book).await?;
            book.insert(contract);
        }
        Ok(book)
    }

    async fn deploy_unit(
        &self,
        unit: &ContractUnit,
        template: &ContractTemplate,
        book: &AddressBook,
    ) -> Result<DeployedContract, DeployError> {
        let args = resolve_args(unit, book).map_err(|e| DeployError::failed(&unit.name, e))?;
        let init_code: Bytes = template
            .init_code(&args)
            .map_err(|e| DeployError::failed(&unit.name, e))?;

        info!(unit = %unit.name, args = ?args, "Deploying contract");
        debug!(unit = %unit.name, init_code_len = init_code.len(), "Init code built");

        let receipt = match timeout(self.confirmation_timeout, self.network.deploy(init_code)).await
        {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                warn!(unit = %unit.name, error = %e, "Deployment failed");
                return Err(DeployError::failed(&unit.name, e));
            }
            Err(_) => {
                warn!(
                    unit = %unit.name,
                    timeout_secs = self.confirmation_timeout.as_secs_f64(),
                    "Deployment not confirmed in time"
                );
                return Err(DeployError::failed(
                    &unit.name,
                    DeploymentFailure::ConfirmationTimeout(self.confirmation_timeout),
                ));
            }
        };

        info!(
            unit = %unit.name,
            address = %receipt.address,
            tx_hash = %receipt.tx_hash,
            block_number = ?receipt.block_number,
            "Contract deployed"
        );
        Ok(DeployedContract {
            name: unit.name.clone(),
            address: receipt.address,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        })
    }
}

/// Resolves the template of every unit and checks its literal arguments,
/// without touching the network.
pub fn preflight<R: TemplateRegistry>(
    registry: &R,
    plan: &DeploymentPlan,
) -> Result<Vec<ContractTemplate>, DeployError> {
    plan.units()
        .iter()
        .map(|unit| {
            let template = registry
                .template(&unit.name)
                .map_err(|e| DeployError::failed(&unit.name, e))?;
            check_literal_args(unit, &template).map_err(|e| DeployError::failed(&unit.name, e))?;
            Ok(template)
        })
        .collect()
}

/// Replaces `@Name` arguments with the checksummed address recorded for `Name`.
fn resolve_args(unit: &ContractUnit, book: &AddressBook) -> Result<Vec<String>, DeploymentFailure> {
    unit.constructor_args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Literal(value) => Ok(value.clone()),
            ConstructorArg::AddressOf(name) => book
                .address(name)
                .map(|address| address.to_string())
                .ok_or_else(|| DeploymentFailure::UnresolvedReference(name.clone())),
        })
        .collect()
}

/// Checks arity and literal values; references are only known after their
/// dependency is deployed.
fn check_literal_args(
    unit: &ContractUnit,
    template: &ContractTemplate,
) -> Result<(), DeploymentFailure> {
    let placeholder = Address::ZERO.to_string();
    let args: Vec<&str> = unit
        .constructor_args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Literal(value) => value.as_str(),
            ConstructorArg::AddressOf(_) => placeholder.as_str(),
        })
        .collect();
    match template.constructor() {
        Some(constructor) => encode_args(&constructor.inputs, &args).map(drop)?,
        None => template.init_code(&args).map(drop)?,
    }
    Ok(())
}
