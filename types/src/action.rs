//! Action wire format.
//!
//! Actions travel as an [ActionEnvelope]: a string type id plus a flat list of loosely
//! typed [Field]s. Each concrete action knows how to lay itself out as fields and how to
//! read itself back, rejecting anything whose shape does not match exactly. Lookup from
//! type id to decoder goes through a fixed registry rather than reflection.

use crate::{
    address::Address,
    codec::{read_bytes, read_string, string_encode_size, write_bytes, write_string},
    entity::{CouponId, Customization, ItemId},
    key::Currency,
};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, RangeCfg, Read, ReadExt, Write};
use thiserror::Error as ThisError;

pub const MAX_TYPE_ID_LEN: usize = 64;
pub const MAX_FIELDS: usize = 32;
pub const MAX_TEXT_LEN: usize = 256;
pub const MAX_BYTES_LEN: usize = 1_024;
pub const MAX_LIST_LEN: usize = 64;
/// Maximum nesting of [Field::List].
pub const MAX_DEPTH: usize = 4;

/// Longest memo accepted on transfers and mints.
pub const MAX_MEMO_LEN: usize = 80;

/// Most coupons a single issue may create.
pub const MAX_COUPONS_PER_ISSUE: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Null,
    Bool(bool),
    U64(u64),
    I64(i64),
    Text(String),
    Bytes(Vec<u8>),
    Address(Address),
    List(Vec<Field>),
}

impl Field {
    fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Address(_) => "address",
            Self::List(_) => "list",
        }
    }
}

impl Write for Field {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Null => 0u8.write(writer),
            Self::Bool(value) => {
                1u8.write(writer);
                value.write(writer);
            }
            Self::U64(value) => {
                2u8.write(writer);
                value.write(writer);
            }
            Self::I64(value) => {
                3u8.write(writer);
                value.write(writer);
            }
            Self::Text(value) => {
                4u8.write(writer);
                write_string(value, writer);
            }
            Self::Bytes(value) => {
                5u8.write(writer);
                write_bytes(value, writer);
            }
            Self::Address(value) => {
                6u8.write(writer);
                value.write(writer);
            }
            Self::List(values) => {
                7u8.write(writer);
                values.write(writer);
            }
        }
    }
}

impl Read for Field {
    /// Remaining nesting depth.
    type Cfg = usize;

    fn read_cfg(reader: &mut impl Buf, depth: &Self::Cfg) -> Result<Self, Error> {
        let field = match u8::read(reader)? {
            0 => Self::Null,
            1 => Self::Bool(bool::read(reader)?),
            2 => Self::U64(u64::read(reader)?),
            3 => Self::I64(i64::read(reader)?),
            4 => Self::Text(read_string(reader, MAX_TEXT_LEN)?),
            5 => Self::Bytes(read_bytes(reader, MAX_BYTES_LEN)?),
            6 => Self::Address(Address::read(reader)?),
            7 => {
                if *depth == 0 {
                    return Err(Error::Invalid("Field", "nesting too deep"));
                }
                Self::List(Vec::<Field>::read_cfg(
                    reader,
                    &(RangeCfg::from(0..=MAX_LIST_LEN), depth - 1),
                )?)
            }
            i => return Err(Error::InvalidEnum(i)),
        };
        Ok(field)
    }
}

impl EncodeSize for Field {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Null => 0,
                Self::Bool(_) => bool::SIZE,
                Self::U64(_) => u64::SIZE,
                Self::I64(_) => i64::SIZE,
                Self::Text(value) => string_encode_size(value),
                Self::Bytes(value) => 4 + value.len(),
                Self::Address(_) => Address::SIZE,
                Self::List(values) => values.encode_size(),
            }
    }
}

/// Encoded action as submitted by a host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionEnvelope {
    pub type_id: String,
    pub fields: Vec<Field>,
}

impl Write for ActionEnvelope {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.type_id, writer);
        self.fields.write(writer);
    }
}

impl Read for ActionEnvelope {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let type_id = read_string(reader, MAX_TYPE_ID_LEN)?;
        let fields = Vec::<Field>::read_cfg(reader, &(RangeCfg::from(0..=MAX_FIELDS), MAX_DEPTH))?;
        Ok(Self { type_id, fields })
    }
}

impl EncodeSize for ActionEnvelope {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.type_id) + self.fields.encode_size()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FieldError {
    #[error("unknown action type {0:?}")]
    UnknownType(String),
    #[error("missing field {0}")]
    Missing(&'static str),
    #[error("field {field}: expected {expected}, got {got}")]
    Shape {
        field: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    #[error("field {0} out of range")]
    OutOfRange(&'static str),
    #[error("{0} unexpected trailing fields")]
    Trailing(usize),
}

/// Cursor over an action's fields that enforces their exact shape.
pub struct FieldReader<'a> {
    fields: &'a [Field],
    position: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(fields: &'a [Field]) -> Self {
        Self {
            fields,
            position: 0,
        }
    }

    fn next(&mut self, name: &'static str) -> Result<&'a Field, FieldError> {
        let field = self
            .fields
            .get(self.position)
            .ok_or(FieldError::Missing(name))?;
        self.position += 1;
        Ok(field)
    }

    fn mismatch(name: &'static str, expected: &'static str, got: &Field) -> FieldError {
        FieldError::Shape {
            field: name,
            expected,
            got: got.shape(),
        }
    }

    pub fn u64(&mut self, name: &'static str) -> Result<u64, FieldError> {
        match self.next(name)? {
            Field::U64(value) => Ok(*value),
            other => Err(Self::mismatch(name, "u64", other)),
        }
    }

    pub fn u32(&mut self, name: &'static str) -> Result<u32, FieldError> {
        u32::try_from(self.u64(name)?).map_err(|_| FieldError::OutOfRange(name))
    }

    pub fn u8(&mut self, name: &'static str) -> Result<u8, FieldError> {
        u8::try_from(self.u64(name)?).map_err(|_| FieldError::OutOfRange(name))
    }

    pub fn text(&mut self, name: &'static str) -> Result<String, FieldError> {
        match self.next(name)? {
            Field::Text(value) => Ok(value.clone()),
            other => Err(Self::mismatch(name, "text", other)),
        }
    }

    /// `Null` reads as `None`.
    pub fn optional_text(
        &mut self,
        name: &'static str,
        max_len: usize,
    ) -> Result<Option<String>, FieldError> {
        match self.next(name)? {
            Field::Null => Ok(None),
            Field::Text(value) if value.len() <= max_len => Ok(Some(value.clone())),
            Field::Text(_) => Err(FieldError::OutOfRange(name)),
            other => Err(Self::mismatch(name, "text or null", other)),
        }
    }

    pub fn address(&mut self, name: &'static str) -> Result<Address, FieldError> {
        match self.next(name)? {
            Field::Address(value) => Ok(*value),
            other => Err(Self::mismatch(name, "address", other)),
        }
    }

    pub fn bytes(&mut self, name: &'static str) -> Result<&'a [u8], FieldError> {
        match self.next(name)? {
            Field::Bytes(value) => Ok(value),
            other => Err(Self::mismatch(name, "bytes", other)),
        }
    }

    pub fn coupon_id(&mut self, name: &'static str) -> Result<CouponId, FieldError> {
        let bytes = self.bytes(name)?;
        <[u8; 16]>::try_from(bytes)
            .map(CouponId)
            .map_err(|_| FieldError::OutOfRange(name))
    }

    pub fn currency(&mut self, name: &'static str) -> Result<Currency, FieldError> {
        Currency::new(self.text(name)?).map_err(|_| FieldError::OutOfRange(name))
    }

    pub fn list(&mut self, name: &'static str) -> Result<&'a [Field], FieldError> {
        match self.next(name)? {
            Field::List(values) => Ok(values),
            other => Err(Self::mismatch(name, "list", other)),
        }
    }

    pub fn finish(self) -> Result<(), FieldError> {
        match self.fields.len() - self.position {
            0 => Ok(()),
            extra => Err(FieldError::Trailing(extra)),
        }
    }
}

/// A concrete action that can be laid out as fields.
pub trait ActionPayload: Sized {
    const TYPE_ID: &'static str;

    fn to_fields(&self) -> Vec<Field>;

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError>;

    fn from_fields(fields: &[Field]) -> Result<Self, FieldError> {
        let mut reader = FieldReader::new(fields);
        let payload = Self::read_fields(&mut reader)?;
        reader.finish()?;
        Ok(payload)
    }
}

fn optional_text_field(value: &Option<String>) -> Field {
    match value {
        Some(text) => Field::Text(text.clone()),
        None => Field::Null,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateAvatar {
    pub index: u8,
    pub name: String,
    pub customization: Customization,
}

impl ActionPayload for CreateAvatar {
    const TYPE_ID: &'static str = "create_avatar";

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::U64(self.index as u64),
            Field::Text(self.name.clone()),
            Field::U64(self.customization.hair as u64),
            Field::U64(self.customization.lens as u64),
            Field::U64(self.customization.ear as u64),
            Field::U64(self.customization.tail as u64),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            index: reader.u8("index")?,
            name: reader.text("name")?,
            customization: Customization {
                hair: reader.u8("hair")?,
                lens: reader.u8("lens")?,
                ear: reader.u8("ear")?,
                tail: reader.u8("tail")?,
            },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferAsset {
    pub recipient: Address,
    pub currency: Currency,
    pub amount: u64,
    pub memo: Option<String>,
}

impl ActionPayload for TransferAsset {
    const TYPE_ID: &'static str = "transfer_asset";

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::Address(self.recipient),
            Field::Text(self.currency.ticker().to_string()),
            Field::U64(self.amount),
            optional_text_field(&self.memo),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            recipient: reader.address("recipient")?,
            currency: reader.currency("currency")?,
            amount: reader.u64("amount")?,
            memo: reader.optional_text("memo", MAX_MEMO_LEN)?,
        })
    }
}

/// One line of a privileged mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MintSpec {
    Asset {
        recipient: Address,
        currency: Currency,
        amount: u64,
    },
    /// Fungible items credited to an avatar's inventory.
    Item {
        recipient: Address,
        item_id: ItemId,
        count: u64,
    },
}

impl MintSpec {
    fn to_field(&self) -> Field {
        let fields = match self {
            Self::Asset {
                recipient,
                currency,
                amount,
            } => vec![
                Field::U64(0),
                Field::Address(*recipient),
                Field::Text(currency.ticker().to_string()),
                Field::U64(*amount),
            ],
            Self::Item {
                recipient,
                item_id,
                count,
            } => vec![
                Field::U64(1),
                Field::Address(*recipient),
                Field::U64(*item_id as u64),
                Field::U64(*count),
            ],
        };
        Field::List(fields)
    }

    fn from_field(fields: &[Field]) -> Result<Self, FieldError> {
        let mut reader = FieldReader::new(fields);
        let spec = match reader.u64("kind")? {
            0 => Self::Asset {
                recipient: reader.address("recipient")?,
                currency: reader.currency("currency")?,
                amount: reader.u64("amount")?,
            },
            1 => Self::Item {
                recipient: reader.address("recipient")?,
                item_id: reader.u32("item_id")?,
                count: reader.u64("count")?,
            },
            _ => return Err(FieldError::OutOfRange("kind")),
        };
        reader.finish()?;
        Ok(spec)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintAssets {
    pub specs: Vec<MintSpec>,
    pub memo: Option<String>,
}

impl ActionPayload for MintAssets {
    const TYPE_ID: &'static str = "mint_assets";

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::List(self.specs.iter().map(MintSpec::to_field).collect()),
            optional_text_field(&self.memo),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        let specs = reader
            .list("specs")?
            .iter()
            .map(|field| match field {
                Field::List(fields) => MintSpec::from_field(fields),
                other => Err(FieldReader::mismatch("specs", "list", other)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            specs,
            memo: reader.optional_text("memo", MAX_MEMO_LEN)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinationConsumable {
    pub avatar: Address,
    pub slot_index: u8,
    pub recipe_id: u32,
}

impl ActionPayload for CombinationConsumable {
    const TYPE_ID: &'static str = "combination_consumable";

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::Address(self.avatar),
            Field::U64(self.slot_index as u64),
            Field::U64(self.recipe_id as u64),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            avatar: reader.address("avatar")?,
            slot_index: reader.u8("slot_index")?,
            recipe_id: reader.u32("recipe_id")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RapidCombination {
    pub avatar: Address,
    pub slot_index: u8,
}

impl ActionPayload for RapidCombination {
    const TYPE_ID: &'static str = "rapid_combination";

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::Address(self.avatar),
            Field::U64(self.slot_index as u64),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            avatar: reader.address("avatar")?,
            slot_index: reader.u8("slot_index")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettleCombination {
    pub avatar: Address,
    pub slot_index: u8,
}

impl ActionPayload for SettleCombination {
    const TYPE_ID: &'static str = "settle_combination";

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::Address(self.avatar),
            Field::U64(self.slot_index as u64),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            avatar: reader.address("avatar")?,
            slot_index: reader.u8("slot_index")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HackAndSlash {
    pub avatar: Address,
    pub stage_id: u32,
}

impl ActionPayload for HackAndSlash {
    const TYPE_ID: &'static str = "hack_and_slash";

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::Address(self.avatar),
            Field::U64(self.stage_id as u64),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            avatar: reader.address("avatar")?,
            stage_id: reader.u32("stage_id")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChargeActionPoint {
    pub avatar: Address,
}

impl ActionPayload for ChargeActionPoint {
    const TYPE_ID: &'static str = "charge_action_point";

    fn to_fields(&self) -> Vec<Field> {
        vec![Field::Address(self.avatar)]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            avatar: reader.address("avatar")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stake {
    pub amount: u64,
}

impl ActionPayload for Stake {
    const TYPE_ID: &'static str = "stake";

    fn to_fields(&self) -> Vec<Field> {
        vec![Field::U64(self.amount)]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            amount: reader.u64("amount")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimStakeReward {
    pub avatar: Address,
}

impl ActionPayload for ClaimStakeReward {
    const TYPE_ID: &'static str = "claim_stake_reward";

    fn to_fields(&self) -> Vec<Field> {
        vec![Field::Address(self.avatar)]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            avatar: reader.address("avatar")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelStake;

impl ActionPayload for CancelStake {
    const TYPE_ID: &'static str = "cancel_stake";

    fn to_fields(&self) -> Vec<Field> {
        Vec::new()
    }

    fn read_fields(_: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self)
    }
}

/// Privileged creation of identical coupons in an agent's wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueCoupons {
    pub recipient: Address,
    /// (item id, quantity) pairs granted by each coupon.
    pub rewards: Vec<(ItemId, u32)>,
    pub count: u32,
}

impl ActionPayload for IssueCoupons {
    const TYPE_ID: &'static str = "issue_coupons";

    fn to_fields(&self) -> Vec<Field> {
        let rewards = self
            .rewards
            .iter()
            .map(|(item_id, quantity)| {
                Field::List(vec![
                    Field::U64(*item_id as u64),
                    Field::U64(*quantity as u64),
                ])
            })
            .collect();
        vec![
            Field::Address(self.recipient),
            Field::List(rewards),
            Field::U64(self.count as u64),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        let recipient = reader.address("recipient")?;
        let rewards = reader
            .list("rewards")?
            .iter()
            .map(|field| match field {
                Field::List(fields) => {
                    let mut pair = FieldReader::new(fields);
                    let reward = (pair.u32("item_id")?, pair.u32("quantity")?);
                    pair.finish()?;
                    Ok(reward)
                }
                other => Err(FieldReader::mismatch("rewards", "list", other)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            recipient,
            rewards,
            count: reader.u32("count")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedeemCoupon {
    pub coupon_id: CouponId,
    pub avatar: Address,
}

impl ActionPayload for RedeemCoupon {
    const TYPE_ID: &'static str = "redeem_coupon";

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::Bytes(self.coupon_id.0.to_vec()),
            Field::Address(self.avatar),
        ]
    }

    fn read_fields(reader: &mut FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            coupon_id: reader.coupon_id("coupon_id")?,
            avatar: reader.address("avatar")?,
        })
    }
}

/// Every action the engine knows how to execute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    CreateAvatar(CreateAvatar),
    TransferAsset(TransferAsset),
    MintAssets(MintAssets),
    CombinationConsumable(CombinationConsumable),
    RapidCombination(RapidCombination),
    SettleCombination(SettleCombination),
    HackAndSlash(HackAndSlash),
    ChargeActionPoint(ChargeActionPoint),
    Stake(Stake),
    ClaimStakeReward(ClaimStakeReward),
    CancelStake(CancelStake),
    IssueCoupons(IssueCoupons),
    RedeemCoupon(RedeemCoupon),
}

type Decoder = fn(&[Field]) -> Result<Action, FieldError>;

fn decode_as<T>(fields: &[Field]) -> Result<Action, FieldError>
where
    T: ActionPayload + Into<Action>,
{
    T::from_fields(fields).map(Into::into)
}

/// Type id -> decoder.
const REGISTRY: &[(&str, Decoder)] = &[
    (CreateAvatar::TYPE_ID, decode_as::<CreateAvatar>),
    (TransferAsset::TYPE_ID, decode_as::<TransferAsset>),
    (MintAssets::TYPE_ID, decode_as::<MintAssets>),
    (
        CombinationConsumable::TYPE_ID,
        decode_as::<CombinationConsumable>,
    ),
    (RapidCombination::TYPE_ID, decode_as::<RapidCombination>),
    (SettleCombination::TYPE_ID, decode_as::<SettleCombination>),
    (HackAndSlash::TYPE_ID, decode_as::<HackAndSlash>),
    (ChargeActionPoint::TYPE_ID, decode_as::<ChargeActionPoint>),
    (Stake::TYPE_ID, decode_as::<Stake>),
    (ClaimStakeReward::TYPE_ID, decode_as::<ClaimStakeReward>),
    (CancelStake::TYPE_ID, decode_as::<CancelStake>),
    (IssueCoupons::TYPE_ID, decode_as::<IssueCoupons>),
    (RedeemCoupon::TYPE_ID, decode_as::<RedeemCoupon>),
];

impl Action {
    pub fn registered_types() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|(type_id, _)| *type_id)
    }

    pub fn type_id(&self) -> &'static str {
        match self {
            Self::CreateAvatar(_) => CreateAvatar::TYPE_ID,
            Self::TransferAsset(_) => TransferAsset::TYPE_ID,
            Self::MintAssets(_) => MintAssets::TYPE_ID,
            Self::CombinationConsumable(_) => CombinationConsumable::TYPE_ID,
            Self::RapidCombination(_) => RapidCombination::TYPE_ID,
            Self::SettleCombination(_) => SettleCombination::TYPE_ID,
            Self::HackAndSlash(_) => HackAndSlash::TYPE_ID,
            Self::ChargeActionPoint(_) => ChargeActionPoint::TYPE_ID,
            Self::Stake(_) => Stake::TYPE_ID,
            Self::ClaimStakeReward(_) => ClaimStakeReward::TYPE_ID,
            Self::CancelStake(_) => CancelStake::TYPE_ID,
            Self::IssueCoupons(_) => IssueCoupons::TYPE_ID,
            Self::RedeemCoupon(_) => RedeemCoupon::TYPE_ID,
        }
    }

    pub fn to_envelope(&self) -> ActionEnvelope {
        let fields = match self {
            Self::CreateAvatar(a) => a.to_fields(),
            Self::TransferAsset(a) => a.to_fields(),
            Self::MintAssets(a) => a.to_fields(),
            Self::CombinationConsumable(a) => a.to_fields(),
            Self::RapidCombination(a) => a.to_fields(),
            Self::SettleCombination(a) => a.to_fields(),
            Self::HackAndSlash(a) => a.to_fields(),
            Self::ChargeActionPoint(a) => a.to_fields(),
            Self::Stake(a) => a.to_fields(),
            Self::ClaimStakeReward(a) => a.to_fields(),
            Self::CancelStake(a) => a.to_fields(),
            Self::IssueCoupons(a) => a.to_fields(),
            Self::RedeemCoupon(a) => a.to_fields(),
        };
        ActionEnvelope {
            type_id: self.type_id().to_string(),
            fields,
        }
    }

    pub fn from_envelope(envelope: &ActionEnvelope) -> Result<Self, FieldError> {
        let (_, decoder) = REGISTRY
            .iter()
            .find(|(type_id, _)| *type_id == envelope.type_id)
            .ok_or_else(|| FieldError::UnknownType(envelope.type_id.clone()))?;
        decoder(&envelope.fields)
    }
}

macro_rules! impl_into_action {
    ($($payload:ident),* $(,)?) => {
        $(
            impl From<$payload> for Action {
                fn from(payload: $payload) -> Self {
                    Self::$payload(payload)
                }
            }
        )*
    };
}

impl_into_action!(
    CreateAvatar,
    TransferAsset,
    MintAssets,
    CombinationConsumable,
    RapidCombination,
    SettleCombination,
    HackAndSlash,
    ChargeActionPoint,
    Stake,
    ClaimStakeReward,
    CancelStake,
    IssueCoupons,
    RedeemCoupon,
);
