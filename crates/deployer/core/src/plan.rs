//! Contract units and the order they are deployed in.
//!
//! A unit may take the address of another unit of the same run as a
//! constructor argument (written `@Name`), or name it in `depends_on` without
//! passing its address. Both produce a [`DependencyEdge`]. [`DeploymentPlan`]
//! sorts the units so every dependency is deployed before its dependents.

use std::{
    collections::{
        BTreeSet,
        HashMap,
    },
    fmt,
    str::FromStr,
};

use serde::Deserialize;

use crate::error::ConfigError;

/// Prefix marking a constructor argument as a reference to another unit.
pub const REFERENCE_PREFIX: char = '@';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorArg {
    /// Passed to the ABI coercer as-is.
    Literal(String),
    /// Replaced with the deployed address of the named unit.
    AddressOf(String),
}

impl ConstructorArg {
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::AddressOf(name) => Some(name),
            Self::Literal(_) => None,
        }
    }
}

impl From<&str> for ConstructorArg {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix(REFERENCE_PREFIX) {
            Some(name) if !name.is_empty() => Self::AddressOf(name.to_string()),
            _ => Self::Literal(raw.to_string()),
        }
    }
}

impl From<String> for ConstructorArg {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl fmt::Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::AddressOf(name) => write!(f, "{REFERENCE_PREFIX}{name}"),
        }
    }
}

/// A named deployable template plus its constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContractUnit {
    pub name: String,
    #[serde(default, rename = "args")]
    #[serde(deserialize_with = "deserialize_args")]
    pub constructor_args: Vec<ConstructorArg>,
    /// Ordering-only dependencies whose address is not passed to the constructor.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

fn deserialize_args<'de, D>(deserializer: D) -> Result<Vec<ConstructorArg>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(ConstructorArg::from).collect())
}

impl ContractUnit {
    pub fn new(name: impl Into<String>, constructor_args: Vec<ConstructorArg>) -> Self {
        Self {
            name: name.into(),
            constructor_args,
            depends_on: Vec::new(),
        }
    }

    /// Names of the units this one must be deployed after, without duplicates.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.constructor_args
            .iter()
            .filter_map(ConstructorArg::reference)
            .chain(self.depends_on.iter().map(String::as_str))
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Parses `Name` or `Name(arg1,@Other)`, the format accepted by `--contract`.
impl FromStr for ContractUnit {
    type Err = ConfigError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidContractSpec(spec.to_string());
        let spec = spec.trim();

        let (name, args) = match spec.find('(') {
            None => (spec, Vec::new()),
            Some(open) => {
                let inner = spec[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
                let args = if inner.trim().is_empty() {
                    Vec::new()
                } else {
                    split_top_level(inner)
                        .ok_or_else(invalid)?
                        .into_iter()
                        .map(ConstructorArg::from)
                        .collect()
                };
                (&spec[..open], args)
            }
        };

        let name = name.trim();
        if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == ')') {
            return Err(invalid());
        }
        Ok(Self::new(name, args))
    }
}

/// Splits on commas outside brackets, parentheses and quotes, so array and
/// tuple literals stay whole. `None` if the nesting is unbalanced.
fn split_top_level(inner: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (position, c) in inner.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.checked_sub(1)?,
            (None, ',') if depth == 0 => {
                parts.push(&inner[start..position]);
                start = position + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    parts.push(&inner[start..]);
    Some(parts)
}

impl fmt::Display for ContractUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constructor_args.is_empty() {
            return write!(f, "{}", self.name);
        }
        let args = self
            .constructor_args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{}({args})", self.name)
    }
}

/// `dependent` requires `dependency` to be deployed first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DependencyEdge {
    pub dependency: String,
    pub dependent: String,
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.dependency, self.dependent)
    }
}

/// Units in a valid deployment order.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    units: Vec<ContractUnit>,
    edges: Vec<DependencyEdge>,
}

impl DeploymentPlan {
    /// Validates the units and sorts them topologically. Among units whose
    /// dependencies are satisfied, the one declared first goes first.
    pub fn resolve(units: Vec<ContractUnit>) -> Result<Self, ConfigError> {
        if units.is_empty() {
            return Err(ConfigError::NoContracts);
        }

        let mut index = HashMap::with_capacity(units.len());
        for (position, unit) in units.iter().enumerate() {
            if index.insert(unit.name.as_str(), position).is_some() {
                return Err(ConfigError::DuplicateUnit(unit.name.clone()));
            }
        }

        let mut edges = Vec::new();
        let mut remaining = vec![0usize; units.len()];
        let mut dependents = vec![Vec::new(); units.len()];
        for (position, unit) in units.iter().enumerate() {
            for dependency in unit.dependencies() {
                if dependency == unit.name {
                    return Err(ConfigError::SelfDependency(unit.name.clone()));
                }
                let &from = index
                    .get(dependency)
                    .ok_or_else(|| ConfigError::UnknownDependency {
                        unit: unit.name.clone(),
                        dependency: dependency.to_string(),
                    })?;
                dependents[from].push(position);
                remaining[position] += 1;
                edges.push(DependencyEdge {
                    dependency: dependency.to_string(),
                    dependent: unit.name.clone(),
                });
            }
        }

        // Kahn's algorithm; the ready set is ordered by declaration position.
        let mut ready: BTreeSet<usize> = (0..units.len())
            .filter(|&position| remaining[position] == 0)
            .collect();
        let mut order = Vec::with_capacity(units.len());
        while let Some(position) = ready.pop_first() {
            order.push(position);
            for &dependent in &dependents[position] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != units.len() {
            // Drop blocked units that only wait on a cycle.
            let mut blocked: Vec<bool> = remaining.iter().map(|&count| count > 0).collect();
            loop {
                let waiting: Vec<usize> = (0..units.len())
                    .filter(|&position| {
                        blocked[position]
                            && !dependents[position].iter().any(|&d| blocked[d])
                    })
                    .collect();
                if waiting.is_empty() {
                    break;
                }
                for position in waiting {
                    blocked[position] = false;
                }
            }
            let cycle = units
                .iter()
                .enumerate()
                .filter(|(position, _)| blocked[*position])
                .map(|(_, unit)| unit.name.clone())
                .collect();
            return Err(ConfigError::DependencyCycle(cycle));
        }

        let mut slots: Vec<Option<ContractUnit>> = units.into_iter().map(Some).collect();
        let units = order
            .into_iter()
            .filter_map(|position| slots[position].take())
            .collect();

        Ok(Self { units, edges })
    }

    pub fn units(&self) -> &[ContractUnit] {
        &self.units
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
