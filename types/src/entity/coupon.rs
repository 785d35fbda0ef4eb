use super::{ItemId, MAX_ENTRIES};
use crate::versioned::{read_as, read_list, SchemaError, Versioned};
use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_utils::hex;
use std::{collections::BTreeMap, fmt};

/// Id of a single-use reward coupon.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CouponId(pub [u8; 16]);

impl fmt::Debug for CouponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CouponId({})", hex(&self.0))
    }
}

impl fmt::Display for CouponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex(&self.0))
    }
}

impl Write for CouponId {
    fn write(&self, writer: &mut impl BufMut) {
        writer.put_slice(&self.0);
    }
}

impl Read for CouponId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(<[u8; 16]>::read(reader)?))
    }
}

impl FixedSize for CouponId {
    const SIZE: usize = 16;
}

/// A bundle of items an agent can redeem into one of its avatars.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coupon {
    pub id: CouponId,
    /// Item id -> quantity.
    pub rewards: BTreeMap<ItemId, u32>,
}

/// Unredeemed coupons held by an agent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CouponWallet {
    coupons: BTreeMap<CouponId, Coupon>,
}

impl CouponWallet {
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    pub fn get(&self, id: &CouponId) -> Option<&Coupon> {
        self.coupons.get(id)
    }

    pub fn coupons(&self) -> impl Iterator<Item = &Coupon> {
        self.coupons.values()
    }

    /// Returns false, leaving the wallet unchanged, if the id is taken or the wallet is full.
    pub fn insert(&mut self, coupon: Coupon) -> bool {
        if self.coupons.len() >= MAX_ENTRIES || self.coupons.contains_key(&coupon.id) {
            return false;
        }
        self.coupons.insert(coupon.id, coupon);
        true
    }

    pub fn take(&mut self, id: &CouponId) -> Option<Coupon> {
        self.coupons.remove(id)
    }
}

impl Versioned for CouponWallet {
    const KIND: &'static str = "CouponWallet";
    const VERSION: u8 = 1;

    fn write_payload(&self, writer: &mut impl BufMut) {
        (self.coupons.len() as u32).write(writer);
        for coupon in self.coupons.values() {
            coupon.id.write(writer);
            let rewards: Vec<(ItemId, u32)> =
                coupon.rewards.iter().map(|(k, v)| (*k, *v)).collect();
            rewards.write(writer);
        }
    }

    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError> {
        if version != Self::VERSION {
            return Err(Self::unsupported(version));
        }
        let malformed = |reason: String| SchemaError::Malformed {
            kind: Self::KIND,
            reason,
        };
        let count = read_as::<u32>(Self::KIND, reader)? as usize;
        if count > MAX_ENTRIES {
            return Err(malformed(format!("{count} coupons")));
        }
        let mut wallet = Self::default();
        for _ in 0..count {
            let id = read_as::<CouponId>(Self::KIND, reader)?;
            let mut rewards = BTreeMap::new();
            let pairs = read_list::<(ItemId, u32)>(Self::KIND, reader, MAX_ENTRIES)?;
            for (item_id, quantity) in pairs {
                if rewards.insert(item_id, quantity).is_some() {
                    return Err(malformed(format!("duplicate reward {item_id} in {id}")));
                }
            }
            if !wallet.insert(Coupon { id, rewards }) {
                return Err(malformed(format!("duplicate coupon {id}")));
            }
        }
        Ok(wallet)
    }
}
