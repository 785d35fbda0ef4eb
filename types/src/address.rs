//! Hierarchical address derivation.
//!
//! Every storage location in the world state is computed from a root address plus a label
//! (and optionally an index). Nothing here is persisted as a lookup table: the same inputs
//! always yield the same address on every executor.

use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{sha256::Sha256, Hasher};
use commonware_utils::{from_hex, hex};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Length of an address in bytes (one SHA-256 digest).
pub const ADDRESS_LEN: usize = 32;

/// Well-known derivation labels.
pub mod labels {
    pub const AVATAR: &str = "avatar-state";
    pub const INVENTORY: &str = "inventory";
    pub const WORLD_INFORMATION: &str = "world-information";
    pub const COMBINATION_SLOT: &str = "combination-slot";
    pub const STAKE: &str = "stake";
    pub const BLACKSMITH: &str = "blacksmith";
    pub const BLOCK: &str = "system/block";
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Derive a child address from `self`, a label, and an optional index.
    ///
    /// Inputs are length-prefixed before hashing so that `("ab", "c")` and `("a", "bc")`
    /// can never collide, and the presence of an index is tagged so that `None` differs
    /// from `Some(0)`.
    pub fn derive(&self, label: &str, index: Option<u64>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&(ADDRESS_LEN as u32).to_be_bytes());
        hasher.update(&self.0);
        hasher.update(&(label.len() as u32).to_be_bytes());
        hasher.update(label.as_bytes());
        match index {
            None => {
                hasher.update(&[0u8]);
            }
            Some(index) => {
                hasher.update(&[1u8]);
                hasher.update(&index.to_be_bytes());
            }
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(digest.as_ref());
        Self(bytes)
    }

    pub fn from_hex(value: &str) -> Option<Self> {
        let bytes = from_hex(value)?;
        let bytes: [u8; ADDRESS_LEN] = bytes.as_slice().try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex(&self.0)
    }
}

/// Avatar address for an identity's slot.
pub fn avatar_address(agent: &Address, slot: u8) -> Address {
    agent.derive(labels::AVATAR, Some(slot as u64))
}

/// Sub-address holding an avatar's inventory in the legacy split layout.
pub fn legacy_inventory_address(avatar: &Address) -> Address {
    avatar.derive(labels::INVENTORY, None)
}

/// Sub-address holding an avatar's world progress in the legacy split layout.
pub fn legacy_world_information_address(avatar: &Address) -> Address {
    avatar.derive(labels::WORLD_INFORMATION, None)
}

pub fn combination_slot_address(avatar: &Address, slot: u8) -> Address {
    avatar.derive(labels::COMBINATION_SLOT, Some(slot as u64))
}

/// Escrow address that holds an identity's staked currency.
pub fn stake_address(agent: &Address) -> Address {
    agent.derive(labels::STAKE, None)
}

/// Sink for crafting fees.
pub fn blacksmith_address() -> Address {
    Address::ZERO.derive(labels::BLACKSMITH, None)
}

/// Location of the last executed block marker.
pub fn block_marker_address() -> Address {
    Address::ZERO.derive(labels::BLOCK, None)
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Write for Address {
    fn write(&self, writer: &mut impl BufMut) {
        writer.put_slice(&self.0);
    }
}

impl Read for Address {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(<[u8; ADDRESS_LEN]>::read(reader)?))
    }
}

impl FixedSize for Address {
    const SIZE: usize = ADDRESS_LEN;
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Address::from_hex(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid address: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(byte: u8) -> Address {
        Address::new([byte; ADDRESS_LEN])
    }

    #[test]
    fn derive_is_pure() {
        let a = root(7).derive("inventory", None);
        let b = root(7).derive("inventory", None);
        assert_eq!(a, b);
    }

    #[test]
    fn derive_separates_every_input() {
        let base = root(1).derive(labels::AVATAR, Some(0));
        assert_ne!(base, root(2).derive(labels::AVATAR, Some(0)));
        assert_ne!(base, root(1).derive(labels::STAKE, Some(0)));
        assert_ne!(base, root(1).derive(labels::AVATAR, Some(1)));
        assert_ne!(base, root(1).derive(labels::AVATAR, None));
    }

    #[test]
    fn index_zero_differs_from_no_index() {
        assert_ne!(root(3).derive("x", None), root(3).derive("x", Some(0)));
    }

    #[test]
    fn hex_round_trip_and_serde() {
        let address = avatar_address(&root(9), 2);
        assert_eq!(Address::from_hex(&address.to_hex()), Some(address));

        let json = serde_json::to_string(&address).expect("serialize");
        let back: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, address);
        assert!(serde_json::from_str::<Address>("\"zz\"").is_err());
    }

    #[test]
    fn well_known_addresses_are_distinct() {
        let agent = root(4);
        let avatar = avatar_address(&agent, 0);
        let all = [
            avatar,
            legacy_inventory_address(&avatar),
            legacy_world_information_address(&avatar),
            combination_slot_address(&avatar, 0),
            combination_slot_address(&avatar, 1),
            stake_address(&agent),
            blacksmith_address(),
            block_marker_address(),
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
