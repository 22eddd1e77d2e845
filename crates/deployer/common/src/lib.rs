#![allow(clippy::must_use_candidate)]

pub mod args;

/// Project configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "deployer.toml";

/// Returns true if `name` can be bound as an ECMAScript identifier.
///
/// Only the ASCII subset is accepted; contract names produced by solc always
/// fall inside it.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
