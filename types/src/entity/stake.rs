use super::MAX_ENTRIES;
use crate::versioned::{read_as, read_list, SchemaError, Versioned};
use bytes::{Buf, BufMut};
use commonware_codec::{Error, Read, ReadExt, Write};
use std::collections::BTreeMap;

/// Stake lock of one identity.
///
/// The escrowed balance at the identity's stake address is authoritative for rewards and
/// refunds; `amount` records what was staked when the lock opened (0 for records that
/// predate it). A cancelled record persists with `closed` set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StakeRecord {
    pub amount: u64,
    pub started_block: u64,
    /// Last block a reward was claimed at, 0 if never.
    pub last_claimed_block: u64,
    pub cancellable_block: u64,
    pub closed: bool,
    /// Reward level -> number of reward steps claimed at that level.
    pub achievements: BTreeMap<u32, u32>,
}

impl StakeRecord {
    pub fn open(amount: u64, started_block: u64, lockup_interval: u64) -> Self {
        Self {
            amount,
            started_block,
            last_claimed_block: 0,
            cancellable_block: started_block.saturating_add(lockup_interval),
            closed: false,
            achievements: BTreeMap::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Block from which the next reward interval is measured.
    pub fn reward_anchor(&self) -> u64 {
        self.started_block.max(self.last_claimed_block)
    }

    pub fn record_achievement(&mut self, level: u32, steps: u32) {
        let entry = self.achievements.entry(level).or_insert(0);
        *entry = entry.saturating_add(steps);
    }
}

fn read_achievements(reader: &mut impl Buf) -> Result<BTreeMap<u32, u32>, SchemaError> {
    let mut achievements = BTreeMap::new();
    for (level, count) in read_list::<(u32, u32)>(StakeRecord::KIND, reader, MAX_ENTRIES)? {
        if achievements.insert(level, count).is_some() {
            return Err(SchemaError::Malformed {
                kind: StakeRecord::KIND,
                reason: format!("duplicate achievement level {level}"),
            });
        }
    }
    Ok(achievements)
}

fn write_achievements(achievements: &BTreeMap<u32, u32>, writer: &mut impl BufMut) {
    let entries: Vec<(u32, u32)> = achievements.iter().map(|(k, v)| (*k, *v)).collect();
    entries.write(writer);
}

impl Versioned for StakeRecord {
    const KIND: &'static str = "StakeRecord";
    const VERSION: u8 = 3;

    fn write_payload(&self, writer: &mut impl BufMut) {
        self.amount.write(writer);
        self.started_block.write(writer);
        self.last_claimed_block.write(writer);
        self.cancellable_block.write(writer);
        self.closed.write(writer);
        write_achievements(&self.achievements, writer);
    }

    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError> {
        match version {
            1 => Ok(read_as::<StakeRecordV1>(Self::KIND, reader)?.upgrade()),
            2 => Ok(StakeRecordV2::read_fields(reader)?.upgrade()),
            3 => Ok(Self {
                amount: read_as(Self::KIND, reader)?,
                started_block: read_as(Self::KIND, reader)?,
                last_claimed_block: read_as(Self::KIND, reader)?,
                cancellable_block: read_as(Self::KIND, reader)?,
                closed: read_as(Self::KIND, reader)?,
                achievements: read_achievements(reader)?,
            }),
            v => Err(Self::unsupported(v)),
        }
    }
}

/// Stake schema version 1: lock timing only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StakeRecordV1 {
    pub started_block: u64,
    pub received_block: u64,
    pub cancellable_block: u64,
}

impl StakeRecordV1 {
    /// Version 1 never recorded the staked amount or a cancellation, so the record comes
    /// back open with amount 0 and the escrow balance stays the source of truth.
    pub fn upgrade(self) -> StakeRecord {
        StakeRecord {
            amount: 0,
            started_block: self.started_block,
            last_claimed_block: self.received_block,
            cancellable_block: self.cancellable_block,
            closed: false,
            achievements: BTreeMap::new(),
        }
    }
}

impl Write for StakeRecordV1 {
    fn write(&self, writer: &mut impl BufMut) {
        self.started_block.write(writer);
        self.received_block.write(writer);
        self.cancellable_block.write(writer);
    }
}

impl Read for StakeRecordV1 {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            started_block: u64::read(reader)?,
            received_block: u64::read(reader)?,
            cancellable_block: u64::read(reader)?,
        })
    }
}

/// Stake schema version 2: adds the staked amount and achievements.
///
/// Version 2 opened every record with a positive amount and marked cancellation by
/// zeroing it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StakeRecordV2 {
    pub amount: u64,
    pub started_block: u64,
    pub last_claimed_block: u64,
    pub cancellable_block: u64,
    pub achievements: BTreeMap<u32, u32>,
}

impl StakeRecordV2 {
    fn read_fields(reader: &mut impl Buf) -> Result<Self, SchemaError> {
        let kind = StakeRecord::KIND;
        Ok(Self {
            amount: read_as(kind, reader)?,
            started_block: read_as(kind, reader)?,
            last_claimed_block: read_as(kind, reader)?,
            cancellable_block: read_as(kind, reader)?,
            achievements: read_achievements(reader)?,
        })
    }

    pub fn upgrade(self) -> StakeRecord {
        StakeRecord {
            amount: self.amount,
            started_block: self.started_block,
            last_claimed_block: self.last_claimed_block,
            cancellable_block: self.cancellable_block,
            closed: self.amount == 0,
            achievements: self.achievements,
        }
    }
}

impl Write for StakeRecordV2 {
    fn write(&self, writer: &mut impl BufMut) {
        self.amount.write(writer);
        self.started_block.write(writer);
        self.last_claimed_block.write(writer);
        self.cancellable_block.write(writer);
        write_achievements(&self.achievements, writer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioned::{decode, encode, encode_with_version};

    #[test]
    fn v1_record_upgrades_open_with_empty_achievements() {
        let old = StakeRecordV1 {
            started_block: 10,
            received_block: 60,
            cancellable_block: 210,
        };
        let decoded = decode::<StakeRecord>(&encode_with_version(1, &old)).unwrap();
        assert_eq!(decoded.last_claimed_block, 60);
        assert_eq!(decoded.amount, 0);
        assert!(!decoded.is_closed());
        assert!(decoded.achievements.is_empty());
        assert_eq!(decoded, decode::<StakeRecord>(&encode(&old.upgrade())).unwrap());
    }

    #[test]
    fn v2_record_keeps_its_cancellation() {
        let open = StakeRecordV2 {
            amount: 500,
            started_block: 10,
            last_claimed_block: 0,
            cancellable_block: 110,
            achievements: BTreeMap::from([(2, 3)]),
        };
        let decoded = decode::<StakeRecord>(&encode_with_version(2, &open)).unwrap();
        assert!(!decoded.is_closed());
        assert_eq!(decoded.amount, 500);
        assert_eq!(decoded.achievements.get(&2), Some(&3));

        let cancelled = StakeRecordV2 { amount: 0, ..open };
        let decoded = decode::<StakeRecord>(&encode_with_version(2, &cancelled)).unwrap();
        assert!(decoded.is_closed());
        assert_eq!(decoded, decode::<StakeRecord>(&encode(&cancelled.upgrade())).unwrap());
    }

    #[test]
    fn closed_flag_survives_encoding() {
        let mut record = StakeRecord::open(600, 3, 100);
        record.close();
        let encoded = encode(&record);
        assert_eq!(encoded[0], StakeRecord::VERSION);
        let decoded = decode::<StakeRecord>(&encoded).unwrap();
        assert!(decoded.is_closed());
        assert_eq!(decoded.amount, 600);
    }

    #[test]
    fn achievements_accumulate() {
        let mut record = StakeRecord::open(500, 100, 1_000);
        assert_eq!(record.cancellable_block, 1_100);
        record.record_achievement(1, 2);
        record.record_achievement(1, 3);
        assert_eq!(record.achievements.get(&1), Some(&5));

        let decoded = decode::<StakeRecord>(&encode(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn anchor_is_latest_of_start_and_claim() {
        let mut record = StakeRecord::open(1, 100, 10);
        assert_eq!(record.reward_anchor(), 100);
        record.last_claimed_block = 150;
        assert_eq!(record.reward_anchor(), 150);
    }
}
