use super::MAX_ENTRIES;
use crate::versioned::{read_list, SchemaError, Versioned};
use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_utils::hex;
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

pub type ItemId = u32;

/// Globally unique id of a non-fungible item.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct InstanceId(pub [u8; 16]);

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", hex(&self.0))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex(&self.0))
    }
}

impl Write for InstanceId {
    fn write(&self, writer: &mut impl BufMut) {
        writer.put_slice(&self.0);
    }
}

impl Read for InstanceId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(<[u8; 16]>::read(reader)?))
    }
}

impl FixedSize for InstanceId {
    const SIZE: usize = 16;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonFungibleItem {
    pub instance_id: InstanceId,
    pub item_id: ItemId,
    pub level: u8,
    pub equipped: bool,
}

impl NonFungibleItem {
    pub fn new(instance_id: InstanceId, item_id: ItemId) -> Self {
        Self {
            instance_id,
            item_id,
            level: 0,
            equipped: false,
        }
    }
}

impl Write for NonFungibleItem {
    fn write(&self, writer: &mut impl BufMut) {
        self.instance_id.write(writer);
        self.item_id.write(writer);
        self.level.write(writer);
        self.equipped.write(writer);
    }
}

impl Read for NonFungibleItem {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            instance_id: InstanceId::read(reader)?,
            item_id: ItemId::read(reader)?,
            level: u8::read(reader)?,
            equipped: bool::read(reader)?,
        })
    }
}

impl FixedSize for NonFungibleItem {
    const SIZE: usize = InstanceId::SIZE + ItemId::SIZE + u8::SIZE + bool::SIZE;
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum InventoryError {
    #[error("insufficient material {item_id}: required {required}, available {available}")]
    InsufficientMaterial {
        item_id: ItemId,
        required: u64,
        available: u64,
    },
    #[error("instance {0} not found")]
    MissingInstance(InstanceId),
    #[error("instance {0} already exists")]
    DuplicateInstance(InstanceId),
    #[error("stack of item {0} would overflow")]
    Overflow(ItemId),
    #[error("inventory full: cannot add item {item_id}")]
    Full { item_id: ItemId },
}

/// Item holdings of one avatar.
///
/// Fungible stacks are counts keyed by item id; a stack never holds zero. Non-fungible
/// items are keyed by instance id and carry their own mutable sub-state. Each collection
/// holds at most [MAX_ENTRIES] entries, the same bound the decoder enforces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    fungible: BTreeMap<ItemId, u64>,
    non_fungible: BTreeMap<InstanceId, NonFungibleItem>,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.fungible.is_empty() && self.non_fungible.is_empty()
    }

    pub fn fungible_count(&self, item_id: ItemId) -> u64 {
        self.fungible.get(&item_id).copied().unwrap_or(0)
    }

    pub fn fungibles(&self) -> impl Iterator<Item = (ItemId, u64)> + '_ {
        self.fungible.iter().map(|(id, count)| (*id, *count))
    }

    pub fn non_fungible(&self, instance_id: &InstanceId) -> Option<&NonFungibleItem> {
        self.non_fungible.get(instance_id)
    }

    pub fn non_fungible_mut(&mut self, instance_id: &InstanceId) -> Option<&mut NonFungibleItem> {
        self.non_fungible.get_mut(instance_id)
    }

    pub fn non_fungibles(&self) -> impl Iterator<Item = &NonFungibleItem> {
        self.non_fungible.values()
    }

    pub fn add_fungible(&mut self, item_id: ItemId, count: u64) -> Result<(), InventoryError> {
        if count == 0 {
            return Ok(());
        }
        let current = self.fungible_count(item_id);
        if current == 0 && self.fungible.len() >= MAX_ENTRIES {
            return Err(InventoryError::Full { item_id });
        }
        let updated = current
            .checked_add(count)
            .ok_or(InventoryError::Overflow(item_id))?;
        self.fungible.insert(item_id, updated);
        Ok(())
    }

    /// Remove `count` of a fungible item; nothing changes on failure.
    pub fn remove_fungible(&mut self, item_id: ItemId, count: u64) -> Result<(), InventoryError> {
        let available = self.fungible_count(item_id);
        if available < count {
            return Err(InventoryError::InsufficientMaterial {
                item_id,
                required: count,
                available,
            });
        }
        match available - count {
            0 => {
                self.fungible.remove(&item_id);
            }
            left => {
                self.fungible.insert(item_id, left);
            }
        }
        Ok(())
    }

    pub fn add_non_fungible(&mut self, item: NonFungibleItem) -> Result<(), InventoryError> {
        if self.non_fungible.contains_key(&item.instance_id) {
            return Err(InventoryError::DuplicateInstance(item.instance_id));
        }
        if self.non_fungible.len() >= MAX_ENTRIES {
            return Err(InventoryError::Full {
                item_id: item.item_id,
            });
        }
        self.non_fungible.insert(item.instance_id, item);
        Ok(())
    }

    pub fn remove_non_fungible(
        &mut self,
        instance_id: &InstanceId,
    ) -> Result<NonFungibleItem, InventoryError> {
        self.non_fungible
            .remove(instance_id)
            .ok_or(InventoryError::MissingInstance(*instance_id))
    }

    fn from_parts(
        fungible: Vec<(ItemId, u64)>,
        non_fungible: Vec<NonFungibleItem>,
    ) -> Result<Self, SchemaError> {
        let malformed = |reason: String| SchemaError::Malformed {
            kind: Self::KIND,
            reason,
        };
        let mut inventory = Self::default();
        for (item_id, count) in fungible {
            if count == 0 {
                return Err(malformed(format!("empty stack for item {item_id}")));
            }
            if inventory.fungible.insert(item_id, count).is_some() {
                return Err(malformed(format!("duplicate stack for item {item_id}")));
            }
        }
        for item in non_fungible {
            let instance_id = item.instance_id;
            if inventory.non_fungible.insert(instance_id, item).is_some() {
                return Err(malformed(format!("duplicate instance {instance_id}")));
            }
        }
        Ok(inventory)
    }
}

impl Versioned for Inventory {
    const KIND: &'static str = "Inventory";
    const VERSION: u8 = 2;

    fn write_payload(&self, writer: &mut impl BufMut) {
        let fungible: Vec<(ItemId, u64)> = self.fungibles().collect();
        let non_fungible: Vec<NonFungibleItem> = self.non_fungible.values().cloned().collect();
        fungible.write(writer);
        non_fungible.write(writer);
    }

    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError> {
        match version {
            1 => InventoryV1::read_fields(reader)?.upgrade(),
            2 => {
                let fungible = read_list(Self::KIND, reader, MAX_ENTRIES)?;
                let non_fungible = read_list(Self::KIND, reader, MAX_ENTRIES)?;
                Self::from_parts(fungible, non_fungible)
            }
            v => Err(Self::unsupported(v)),
        }
    }
}

/// Non-fungible entry before enhancement levels existed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonFungibleItemV1 {
    pub instance_id: InstanceId,
    pub item_id: ItemId,
}

impl Write for NonFungibleItemV1 {
    fn write(&self, writer: &mut impl BufMut) {
        self.instance_id.write(writer);
        self.item_id.write(writer);
    }
}

impl Read for NonFungibleItemV1 {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            instance_id: InstanceId::read(reader)?,
            item_id: ItemId::read(reader)?,
        })
    }
}

/// Inventory schema version 1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InventoryV1 {
    pub fungible: Vec<(ItemId, u64)>,
    pub non_fungible: Vec<NonFungibleItemV1>,
}

impl InventoryV1 {
    fn read_fields(reader: &mut impl Buf) -> Result<Self, SchemaError> {
        Ok(Self {
            fungible: read_list(Inventory::KIND, reader, MAX_ENTRIES)?,
            non_fungible: read_list(Inventory::KIND, reader, MAX_ENTRIES)?,
        })
    }

    /// Non-fungibles start unenhanced and unequipped.
    pub fn upgrade(self) -> Result<Inventory, SchemaError> {
        let non_fungible = self
            .non_fungible
            .into_iter()
            .map(|item| NonFungibleItem::new(item.instance_id, item.item_id))
            .collect();
        Inventory::from_parts(self.fungible, non_fungible)
    }
}

impl Write for InventoryV1 {
    fn write(&self, writer: &mut impl BufMut) {
        self.fungible.write(writer);
        self.non_fungible.write(writer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioned::{decode, encode, encode_with_version, SchemaError};

    fn instance(byte: u8) -> InstanceId {
        InstanceId([byte; 16])
    }

    #[test]
    fn remove_fungible_is_all_or_nothing() {
        let mut inventory = Inventory::default();
        inventory.add_fungible(303000, 2).unwrap();

        let err = inventory.remove_fungible(303000, 3).unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientMaterial {
                item_id: 303000,
                required: 3,
                available: 2
            }
        );
        assert_eq!(inventory.fungible_count(303000), 2);

        inventory.remove_fungible(303000, 2).unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn duplicate_instance_is_rejected() {
        let mut inventory = Inventory::default();
        inventory
            .add_non_fungible(NonFungibleItem::new(instance(1), 10100))
            .unwrap();
        assert_eq!(
            inventory.add_non_fungible(NonFungibleItem::new(instance(1), 10200)),
            Err(InventoryError::DuplicateInstance(instance(1)))
        );
        assert_eq!(inventory.non_fungible(&instance(1)).unwrap().item_id, 10100);
    }

    fn numbered(i: usize) -> InstanceId {
        let mut id = [0u8; 16];
        id[..8].copy_from_slice(&(i as u64).to_be_bytes());
        InstanceId(id)
    }

    #[test]
    fn full_inventory_refuses_new_entries_and_stays_readable() {
        let mut inventory = Inventory::default();
        for i in 0..MAX_ENTRIES {
            inventory
                .add_non_fungible(NonFungibleItem::new(numbered(i), 10100))
                .unwrap();
            inventory.add_fungible(i as ItemId, 1).unwrap();
        }

        let before = inventory.clone();
        assert_eq!(
            inventory.add_non_fungible(NonFungibleItem::new(numbered(MAX_ENTRIES), 10200)),
            Err(InventoryError::Full { item_id: 10200 })
        );
        assert_eq!(
            inventory.add_fungible(MAX_ENTRIES as ItemId, 1),
            Err(InventoryError::Full {
                item_id: MAX_ENTRIES as ItemId
            })
        );
        assert_eq!(inventory, before);

        // Topping up an existing stack is still allowed.
        inventory.add_fungible(0, 5).unwrap();
        assert_eq!(inventory.fungible_count(0), 6);

        let decoded = decode::<Inventory>(&encode(&inventory)).unwrap();
        assert_eq!(decoded, inventory);
    }

    #[test]
    fn removing_an_instance_frees_it() {
        let mut inventory = Inventory::default();
        inventory
            .add_non_fungible(NonFungibleItem::new(instance(5), 10100))
            .unwrap();

        let removed = inventory.remove_non_fungible(&instance(5)).unwrap();
        assert_eq!(removed.item_id, 10100);
        assert!(inventory.non_fungible(&instance(5)).is_none());
        assert_eq!(
            inventory.remove_non_fungible(&instance(5)),
            Err(InventoryError::MissingInstance(instance(5)))
        );
        assert!(inventory.is_empty());
    }

    #[test]
    fn v1_decodes_like_upgraded_current() {
        let v1 = InventoryV1 {
            fungible: vec![(303000, 5), (400000, 1)],
            non_fungible: vec![
                NonFungibleItemV1 {
                    instance_id: instance(2),
                    item_id: 10100,
                },
                NonFungibleItemV1 {
                    instance_id: instance(1),
                    item_id: 10200,
                },
            ],
        };
        let old = decode::<Inventory>(&encode_with_version(1, &v1)).unwrap();
        let upgraded = v1.upgrade().unwrap();
        assert_eq!(old, decode::<Inventory>(&encode(&upgraded)).unwrap());
        assert_eq!(old.non_fungible(&instance(2)).unwrap().level, 0);
        assert!(!old.non_fungible(&instance(2)).unwrap().equipped);
    }

    #[test]
    fn writer_emits_current_version() {
        let mut inventory = Inventory::default();
        inventory.add_fungible(1, 1).unwrap();
        let mut item = NonFungibleItem::new(instance(3), 10100);
        item.level = 4;
        item.equipped = true;
        inventory.add_non_fungible(item).unwrap();

        let encoded = encode(&inventory);
        assert_eq!(encoded[0], Inventory::VERSION);
        assert_eq!(decode::<Inventory>(&encoded).unwrap(), inventory);
    }

    #[test]
    fn unknown_version_and_truncation_fail() {
        assert_eq!(
            decode::<Inventory>(&[9u8, 0, 0]),
            Err(SchemaError::InvalidSchemaVersion {
                kind: "Inventory",
                version: 9
            })
        );

        let mut inventory = Inventory::default();
        inventory.add_fungible(7, 3).unwrap();
        let encoded = encode(&inventory);
        assert!(matches!(
            decode::<Inventory>(&encoded[..encoded.len() - 1]),
            Err(SchemaError::Malformed { .. })
        ));
    }

    #[test]
    fn non_canonical_stacks_are_malformed() {
        let v1 = InventoryV1 {
            fungible: vec![(5, 1), (5, 2)],
            non_fungible: vec![],
        };
        assert!(matches!(
            decode::<Inventory>(&encode_with_version(1, &v1)),
            Err(SchemaError::Malformed { .. })
        ));
    }
}
