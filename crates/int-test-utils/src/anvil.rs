use alloy::{
    hex,
    node_bindings::{
        Anvil,
        AnvilInstance,
    },
};
use deployer_core::config::NetworkProfile;

/// A local anvil node, killed on drop.
pub struct AnvilNode {
    pub instance: AnvilInstance,
}

impl AnvilNode {
    /// Network profile that deploys from the node's first funded account.
    pub fn profile(&self) -> NetworkProfile {
        let key = &self.instance.keys()[0];
        NetworkProfile {
            url: self.instance.endpoint(),
            chain_id: Some(self.instance.chain_id()),
            accounts: vec![hex::encode_prefixed(key.to_bytes())],
        }
    }
}

/// Spawns anvil from `PATH`.
pub fn spawn_anvil() -> anyhow::Result<AnvilNode> {
    let instance = Anvil::new().try_spawn()?;
    Ok(AnvilNode { instance })
}
