//! Deterministic context addresses.

use phantasma_config::ADDRESS_SIZE;
use sha2::{Digest, Sha256};
use std::fmt;

/// Prefix byte of an address derived from a hash.
const SYSTEM_KIND: u8 = 2;

/// Identity of a context: a kind byte followed by a SHA-256 digest.
///
/// Script contexts are addressed by the hash of their name; the entry
/// context of a VM is addressed by the hash of its script bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const NULL: Address = Address([0; ADDRESS_SIZE]);

    pub fn from_hash(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[0] = SYSTEM_KIND;
        bytes[1..].copy_from_slice(&digest);
        Address(bytes)
    }

    pub fn from_name(name: &str) -> Self {
        Self::from_hash(name.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}
