use crate::versioned::{read_as, SchemaError, Versioned};
use bytes::{Buf, BufMut};
use commonware_codec::Write;

/// Stage progress of an avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldInformation {
    /// Highest cleared stage id, 0 when nothing is cleared.
    pub last_cleared_stage: u32,
}

impl WorldInformation {
    pub fn is_cleared(&self, stage_id: u32) -> bool {
        stage_id <= self.last_cleared_stage
    }

    /// A stage is playable once the previous one is cleared.
    pub fn is_unlocked(&self, stage_id: u32) -> bool {
        stage_id <= self.last_cleared_stage.saturating_add(1)
    }

    pub fn clear(&mut self, stage_id: u32) {
        self.last_cleared_stage = self.last_cleared_stage.max(stage_id);
    }
}

impl Versioned for WorldInformation {
    const KIND: &'static str = "WorldInformation";
    const VERSION: u8 = 1;

    fn write_payload(&self, writer: &mut impl BufMut) {
        self.last_cleared_stage.write(writer);
    }

    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError> {
        if version != Self::VERSION {
            return Err(Self::unsupported(version));
        }
        Ok(Self {
            last_cleared_stage: read_as(Self::KIND, reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_follows_clears() {
        let mut world = WorldInformation::default();
        assert!(world.is_unlocked(1));
        assert!(!world.is_unlocked(2));

        world.clear(1);
        assert!(world.is_cleared(1));
        assert!(world.is_unlocked(2));

        world.clear(0);
        assert_eq!(world.last_cleared_stage, 1);
    }
}
