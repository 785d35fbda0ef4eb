use super::{Inventory, WorldInformation, MAX_NAME_LEN};
use crate::{
    address::Address,
    codec::{read_bytes, read_string, write_bytes, write_string},
    versioned::{decode, read_as, SchemaError, Versioned},
};
use bytes::{Buf, BufMut, Bytes};
use commonware_codec::{Error, Read, ReadExt, Write};

/// Action points granted to avatars created before action points were persisted.
pub const V1_ACTION_POINT: u32 = 120;

/// Largest nested entity inside a legacy unified blob.
const MAX_LEGACY_PART: usize = 1 << 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Customization {
    pub hair: u8,
    pub lens: u8,
    pub ear: u8,
    pub tail: u8,
}

impl Write for Customization {
    fn write(&self, writer: &mut impl BufMut) {
        self.hair.write(writer);
        self.lens.write(writer);
        self.ear.write(writer);
        self.tail.write(writer);
    }
}

impl Read for Customization {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            hair: u8::read(reader)?,
            lens: u8::read(reader)?,
            ear: u8::read(reader)?,
            tail: u8::read(reader)?,
        })
    }
}

/// Profile of one avatar (current schema: version 3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvatarProfile {
    pub name: String,
    pub agent: Address,
    pub created_block: u64,
    pub level: u32,
    pub exp: u64,
    pub action_point: u32,
    pub daily_reward_block: u64,
    pub customization: Customization,
}

impl AvatarProfile {
    pub fn new(
        name: String,
        agent: Address,
        created_block: u64,
        action_point: u32,
        customization: Customization,
    ) -> Self {
        Self {
            name,
            agent,
            created_block,
            level: 1,
            exp: 0,
            action_point,
            daily_reward_block: created_block,
            customization,
        }
    }
}

impl Versioned for AvatarProfile {
    const KIND: &'static str = "AvatarProfile";
    const VERSION: u8 = 3;

    fn write_payload(&self, writer: &mut impl BufMut) {
        write_string(&self.name, writer);
        self.agent.write(writer);
        self.created_block.write(writer);
        self.level.write(writer);
        self.exp.write(writer);
        self.action_point.write(writer);
        self.daily_reward_block.write(writer);
        self.customization.write(writer);
    }

    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError> {
        match version {
            1 => Ok(AvatarProfileV1::read_fields(reader)?.upgrade().upgrade()),
            2 => Ok(AvatarProfileV2::read_fields(reader)?.upgrade()),
            3 => {
                let v2 = AvatarProfileV2::read_fields(reader)?;
                let customization = read_as(Self::KIND, reader)?;
                Ok(AvatarProfile {
                    customization,
                    ..v2.upgrade()
                })
            }
            v => Err(Self::unsupported(v)),
        }
    }
}

/// Profile schema version 1: identity and progression only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvatarProfileV1 {
    pub name: String,
    pub agent: Address,
    pub created_block: u64,
    pub level: u32,
    pub exp: u64,
}

impl AvatarProfileV1 {
    fn read_fields(reader: &mut impl Buf) -> Result<Self, SchemaError> {
        let kind = AvatarProfile::KIND;
        Ok(Self {
            name: read_string(reader, MAX_NAME_LEN).map_err(|e| SchemaError::malformed(kind, e))?,
            agent: read_as(kind, reader)?,
            created_block: read_as(kind, reader)?,
            level: read_as(kind, reader)?,
            exp: read_as(kind, reader)?,
        })
    }

    pub fn upgrade(self) -> AvatarProfileV2 {
        AvatarProfileV2 {
            daily_reward_block: self.created_block,
            action_point: V1_ACTION_POINT,
            v1: self,
        }
    }
}

impl Write for AvatarProfileV1 {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.name, writer);
        self.agent.write(writer);
        self.created_block.write(writer);
        self.level.write(writer);
        self.exp.write(writer);
    }
}

/// Profile schema version 2: adds action points and the daily reward marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvatarProfileV2 {
    pub v1: AvatarProfileV1,
    pub action_point: u32,
    pub daily_reward_block: u64,
}

impl AvatarProfileV2 {
    fn read_fields(reader: &mut impl Buf) -> Result<Self, SchemaError> {
        let v1 = AvatarProfileV1::read_fields(reader)?;
        Ok(Self {
            v1,
            action_point: read_as(AvatarProfile::KIND, reader)?,
            daily_reward_block: read_as(AvatarProfile::KIND, reader)?,
        })
    }

    /// Customization defaults to all zeroes.
    pub fn upgrade(self) -> AvatarProfile {
        AvatarProfile {
            name: self.v1.name,
            agent: self.v1.agent,
            created_block: self.v1.created_block,
            level: self.v1.level,
            exp: self.v1.exp,
            action_point: self.action_point,
            daily_reward_block: self.daily_reward_block,
            customization: Customization::default(),
        }
    }
}

impl Write for AvatarProfileV2 {
    fn write(&self, writer: &mut impl BufMut) {
        self.v1.write(writer);
        self.action_point.write(writer);
        self.daily_reward_block.write(writer);
    }
}

/// An avatar together with the entities stored next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvatarState {
    pub address: Address,
    pub profile: AvatarProfile,
    pub inventory: Inventory,
    pub world: WorldInformation,
}

/// Unified pre-migration layout: profile, inventory and world progress in one value.
///
/// Each part is itself a versioned encoding, so a blob written long ago can carry a
/// version-1 profile next to a version-1 inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyAvatarBlob {
    pub profile: Bytes,
    pub inventory: Bytes,
    pub world: Bytes,
}

impl LegacyAvatarBlob {
    pub fn into_state(self, address: Address) -> Result<AvatarState, SchemaError> {
        Ok(AvatarState {
            address,
            profile: decode(&self.profile)?,
            inventory: decode(&self.inventory)?,
            world: decode(&self.world)?,
        })
    }
}

impl Versioned for LegacyAvatarBlob {
    const KIND: &'static str = "LegacyAvatarBlob";
    const VERSION: u8 = 1;

    fn write_payload(&self, writer: &mut impl BufMut) {
        write_bytes(&self.profile, writer);
        write_bytes(&self.inventory, writer);
        write_bytes(&self.world, writer);
    }

    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError> {
        if version != Self::VERSION {
            return Err(Self::unsupported(version));
        }
        let mut part = || {
            read_bytes(reader, MAX_LEGACY_PART)
                .map(Bytes::from)
                .map_err(|e| SchemaError::malformed(Self::KIND, e))
        };
        Ok(Self {
            profile: part()?,
            inventory: part()?,
            world: part()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entity::inventory::{InventoryV1, NonFungibleItemV1},
        entity::InstanceId,
        versioned::{encode, encode_with_version},
    };
    use proptest::prelude::*;

    fn v1(name: &str) -> AvatarProfileV1 {
        AvatarProfileV1 {
            name: name.to_string(),
            agent: Address::new([1u8; 32]),
            created_block: 10,
            level: 3,
            exp: 250,
        }
    }

    #[test]
    fn v1_profile_upgrades_through_every_step() {
        let old = v1("Hero");
        let decoded = decode::<AvatarProfile>(&encode_with_version(1, &old)).unwrap();
        assert_eq!(decoded.name, "Hero");
        assert_eq!(decoded.level, 3);
        assert_eq!(decoded.action_point, V1_ACTION_POINT);
        assert_eq!(decoded.daily_reward_block, 10);
        assert_eq!(decoded.customization, Customization::default());

        let direct = decode::<AvatarProfile>(&encode(&old.upgrade().upgrade())).unwrap();
        assert_eq!(decoded, direct);
    }

    #[test]
    fn v2_profile_keeps_action_points() {
        let old = AvatarProfileV2 {
            v1: v1("Scout"),
            action_point: 17,
            daily_reward_block: 99,
        };
        let decoded = decode::<AvatarProfile>(&encode_with_version(2, &old)).unwrap();
        assert_eq!(decoded.action_point, 17);
        assert_eq!(decoded.daily_reward_block, 99);
    }

    #[test]
    fn truncated_profile_is_malformed_not_defaulted() {
        let encoded = encode_with_version(2, &v1("Hero"));
        assert!(matches!(
            decode::<AvatarProfile>(&encoded),
            Err(SchemaError::Malformed { .. })
        ));
    }

    #[test]
    fn legacy_blob_carries_old_parts() {
        let inventory = InventoryV1 {
            fungible: vec![(303000, 2)],
            non_fungible: vec![NonFungibleItemV1 {
                instance_id: InstanceId([4u8; 16]),
                item_id: 10100,
            }],
        };
        let blob = LegacyAvatarBlob {
            profile: encode_with_version(1, &v1("Old")),
            inventory: encode_with_version(1, &inventory),
            world: encode(&WorldInformation {
                last_cleared_stage: 5,
            }),
        };
        let address = Address::new([8u8; 32]);
        let state = decode::<LegacyAvatarBlob>(&encode(&blob))
            .unwrap()
            .into_state(address)
            .unwrap();
        assert_eq!(state.address, address);
        assert_eq!(state.profile.name, "Old");
        assert_eq!(state.inventory.fungible_count(303000), 2);
        assert_eq!(state.world.last_cleared_stage, 5);
    }

    proptest! {
        #[test]
        fn upgrade_commutes_with_decode(
            name in "[A-Za-z]{2,20}",
            created_block in any::<u64>(),
            level in any::<u32>(),
            exp in any::<u64>(),
        ) {
            let old = AvatarProfileV1 {
                name,
                agent: Address::new([2u8; 32]),
                created_block,
                level,
                exp,
            };
            let from_old = decode::<AvatarProfile>(&encode_with_version(1, &old)).unwrap();
            let from_new = decode::<AvatarProfile>(&encode(&old.upgrade().upgrade())).unwrap();
            prop_assert_eq!(from_old, from_new);
        }
    }
}
