use super::MAX_ENTRIES;
use crate::{
    address::Address,
    versioned::{read_list, SchemaError, Versioned},
};
use bytes::{Buf, BufMut};
use commonware_codec::Write;
use std::collections::BTreeMap;

/// Root account of an identity: which avatar occupies which slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentState {
    pub avatars: BTreeMap<u8, Address>,
}

impl AgentState {
    pub fn avatar(&self, slot: u8) -> Option<&Address> {
        self.avatars.get(&slot)
    }

    pub fn owns(&self, avatar: &Address) -> bool {
        self.avatars.values().any(|a| a == avatar)
    }
}

impl Versioned for AgentState {
    const KIND: &'static str = "AgentState";
    const VERSION: u8 = 1;

    fn write_payload(&self, writer: &mut impl BufMut) {
        let entries: Vec<(u8, Address)> = self.avatars.iter().map(|(k, v)| (*k, *v)).collect();
        entries.write(writer);
    }

    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError> {
        if version != Self::VERSION {
            return Err(Self::unsupported(version));
        }
        let mut avatars = BTreeMap::new();
        for (slot, address) in read_list::<(u8, Address)>(Self::KIND, reader, MAX_ENTRIES)? {
            if avatars.insert(slot, address).is_some() {
                return Err(SchemaError::Malformed {
                    kind: Self::KIND,
                    reason: format!("duplicate slot {slot}"),
                });
            }
        }
        Ok(Self { avatars })
    }
}
