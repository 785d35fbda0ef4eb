use super::{InstanceId, ItemId, NonFungibleItem};
use crate::versioned::{read_as, SchemaError, Versioned};
use bytes::{Buf, BufMut};
use commonware_codec::{Error, Read, ReadExt, Write};

/// A craft in progress: the result is held here until the slot unlocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CraftJob {
    pub recipe_id: u32,
    pub result: NonFungibleItem,
    pub start_block: u64,
    pub unlock_block: u64,
}

impl Write for CraftJob {
    fn write(&self, writer: &mut impl BufMut) {
        self.recipe_id.write(writer);
        self.result.write(writer);
        self.start_block.write(writer);
        self.unlock_block.write(writer);
    }
}

impl Read for CraftJob {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let job = Self {
            recipe_id: u32::read(reader)?,
            result: NonFungibleItem::read(reader)?,
            start_block: u64::read(reader)?,
            unlock_block: u64::read(reader)?,
        };
        if job.unlock_block < job.start_block {
            return Err(Error::Invalid("CraftJob", "unlock before start"));
        }
        Ok(job)
    }
}

/// One crafting slot of an avatar. `job == None` means the slot is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombinationSlot {
    pub job: Option<CraftJob>,
}

impl CombinationSlot {
    pub fn occupied(job: CraftJob) -> Self {
        Self { job: Some(job) }
    }

    pub fn is_empty(&self) -> bool {
        self.job.is_none()
    }
}

impl Versioned for CombinationSlot {
    const KIND: &'static str = "CombinationSlot";
    const VERSION: u8 = 2;

    fn write_payload(&self, writer: &mut impl BufMut) {
        self.job.write(writer);
    }

    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError> {
        match version {
            1 => Ok(read_as::<CombinationSlotV1>(Self::KIND, reader)?.upgrade()),
            2 => Ok(Self {
                job: read_as(Self::KIND, reader)?,
            }),
            v => Err(Self::unsupported(v)),
        }
    }
}

/// Slot job before start blocks were recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CraftJobV1 {
    pub recipe_id: u32,
    pub result_item_id: ItemId,
    pub instance_id: InstanceId,
    pub unlock_block: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombinationSlotV1 {
    pub job: Option<CraftJobV1>,
}

impl CombinationSlotV1 {
    /// Jobs from before start blocks were tracked are treated as started at genesis.
    pub fn upgrade(self) -> CombinationSlot {
        CombinationSlot {
            job: self.job.map(|job| CraftJob {
                recipe_id: job.recipe_id,
                result: NonFungibleItem::new(job.instance_id, job.result_item_id),
                start_block: 0,
                unlock_block: job.unlock_block,
            }),
        }
    }
}

impl Write for CombinationSlotV1 {
    fn write(&self, writer: &mut impl BufMut) {
        match &self.job {
            None => false.write(writer),
            Some(job) => {
                true.write(writer);
                job.recipe_id.write(writer);
                job.result_item_id.write(writer);
                job.instance_id.write(writer);
                job.unlock_block.write(writer);
            }
        }
    }
}

impl Read for CombinationSlotV1 {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        if !bool::read(reader)? {
            return Ok(Self { job: None });
        }
        Ok(Self {
            job: Some(CraftJobV1 {
                recipe_id: u32::read(reader)?,
                result_item_id: ItemId::read(reader)?,
                instance_id: InstanceId::read(reader)?,
                unlock_block: u64::read(reader)?,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioned::{decode, encode, encode_with_version};

    #[test]
    fn v1_slot_upgrades_with_start_zero() {
        let old = CombinationSlotV1 {
            job: Some(CraftJobV1 {
                recipe_id: 1,
                result_item_id: 10100,
                instance_id: InstanceId([6u8; 16]),
                unlock_block: 150,
            }),
        };
        let decoded = decode::<CombinationSlot>(&encode_with_version(1, &old)).unwrap();
        let job = decoded.job.as_ref().unwrap();
        assert_eq!(job.start_block, 0);
        assert_eq!(job.unlock_block, 150);
        assert_eq!(job.result.item_id, 10100);
        assert_eq!(decoded, decode::<CombinationSlot>(&encode(&old.upgrade())).unwrap());
    }

    #[test]
    fn empty_slot_round_trips_in_both_versions() {
        let v1 = encode_with_version(1, &CombinationSlotV1::default());
        assert!(decode::<CombinationSlot>(&v1).unwrap().is_empty());
        let current = encode(&CombinationSlot::default());
        assert_eq!(current[0], 2);
        assert!(decode::<CombinationSlot>(&current).unwrap().is_empty());
    }

    #[test]
    fn unlock_before_start_is_rejected() {
        let slot = CombinationSlot::occupied(CraftJob {
            recipe_id: 1,
            result: NonFungibleItem::new(InstanceId([1u8; 16]), 10100),
            start_block: 100,
            unlock_block: 50,
        });
        assert!(matches!(
            decode::<CombinationSlot>(&encode(&slot)),
            Err(SchemaError::Malformed { .. })
        ));
    }
}
