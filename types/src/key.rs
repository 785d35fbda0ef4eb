//! Storage keys.
//!
//! A key is an account (a namespace selecting what kind of value lives there) paired with
//! an [Address]. `Account::Legacy` is the flat pre-migration namespace: it is consulted on
//! read when the current account is empty, but it is never written.

use crate::{
    address::Address,
    codec::{read_string, string_encode_size, write_string},
};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CurrencyError {
    #[error("currency ticker must be 1..={max} uppercase ASCII letters, got {ticker:?}")]
    InvalidTicker { ticker: String, max: usize },
}

/// A fungible currency ticker (e.g. `GOLD`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(String);

impl Currency {
    pub const MAX_TICKER_LEN: usize = 8;

    pub fn new(ticker: impl Into<String>) -> Result<Self, CurrencyError> {
        let ticker = ticker.into();
        let valid = !ticker.is_empty()
            && ticker.len() <= Self::MAX_TICKER_LEN
            && ticker.bytes().all(|b| b.is_ascii_uppercase());
        if !valid {
            return Err(CurrencyError::InvalidTicker {
                ticker,
                max: Self::MAX_TICKER_LEN,
            });
        }
        Ok(Self(ticker))
    }

    /// The default in-game currency.
    pub fn gold() -> Self {
        Self("GOLD".to_string())
    }

    pub fn ticker(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.0)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Write for Currency {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.0, writer);
    }
}

impl Read for Currency {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let ticker = read_string(reader, Self::MAX_TICKER_LEN)?;
        Self::new(ticker).map_err(|_| Error::Invalid("Currency", "invalid ticker"))
    }
}

impl EncodeSize for Currency {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.0)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ticker = String::deserialize(deserializer)?;
        Currency::new(ticker).map_err(de::Error::custom)
    }
}

/// Namespace of a storage key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Account {
    /// Flat pre-migration namespace (tag 0). Read-only.
    Legacy,
    /// Host bookkeeping such as the last executed block (tag 1).
    System,

    // Entity accounts (tags 2-7)
    Agent,
    Avatar,
    Inventory,
    WorldInformation,
    CombinationSlot,
    Stake,

    // Asset accounts (tags 8-9)
    Balance(Currency),
    Supply(Currency),

    /// Unredeemed coupons of an agent (tag 10).
    CouponWallet,
}

impl Account {
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy)
    }
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Legacy => 0u8.write(writer),
            Self::System => 1u8.write(writer),

            Self::Agent => 2u8.write(writer),
            Self::Avatar => 3u8.write(writer),
            Self::Inventory => 4u8.write(writer),
            Self::WorldInformation => 5u8.write(writer),
            Self::CombinationSlot => 6u8.write(writer),
            Self::Stake => 7u8.write(writer),

            Self::Balance(currency) => {
                8u8.write(writer);
                currency.write(writer);
            }
            Self::Supply(currency) => {
                9u8.write(writer);
                currency.write(writer);
            }
            Self::CouponWallet => 10u8.write(writer),
        }
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let account = match u8::read(reader)? {
            0 => Self::Legacy,
            1 => Self::System,

            2 => Self::Agent,
            3 => Self::Avatar,
            4 => Self::Inventory,
            5 => Self::WorldInformation,
            6 => Self::CombinationSlot,
            7 => Self::Stake,

            8 => Self::Balance(Currency::read(reader)?),
            9 => Self::Supply(Currency::read(reader)?),
            10 => Self::CouponWallet,

            i => return Err(Error::InvalidEnum(i)),
        };
        Ok(account)
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Balance(currency) | Self::Supply(currency) => currency.encode_size(),
                _ => 0,
            }
    }
}

/// A fully-qualified storage key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    pub account: Account,
    pub address: Address,
}

impl Key {
    pub fn new(account: Account, address: Address) -> Self {
        Self { account, address }
    }

    pub fn legacy(address: Address) -> Self {
        Self::new(Account::Legacy, address)
    }

    pub fn balance(address: Address, currency: &Currency) -> Self {
        Self::new(Account::Balance(currency.clone()), address)
    }

    /// Total supply of a currency lives at the zero address.
    pub fn supply(currency: &Currency) -> Self {
        Self::new(Account::Supply(currency.clone()), Address::ZERO)
    }
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        self.account.write(writer);
        self.address.write(writer);
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let account = Account::read(reader)?;
        let address = Address::read(reader)?;
        Ok(Self { account, address })
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        self.account.encode_size() + Address::SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};

    #[test]
    fn currency_ticker_validation() {
        assert!(Currency::new("GOLD").is_ok());
        assert!(Currency::new("CRYSTAL").is_ok());
        assert!(Currency::new("").is_err());
        assert!(Currency::new("gold").is_err());
        assert!(Currency::new("TOOLONGTICKER").is_err());
    }

    #[test]
    fn key_codec_round_trip() {
        let address = Address::new([5u8; 32]);
        for key in [
            Key::legacy(address),
            Key::new(Account::Avatar, address),
            Key::balance(address, &Currency::gold()),
            Key::supply(&Currency::gold()),
            Key::new(Account::CouponWallet, address),
        ] {
            let encoded = key.encode();
            assert_eq!(encoded.len(), key.encode_size());
            assert_eq!(Key::decode(encoded).unwrap(), key);
        }
    }

    #[test]
    fn unknown_account_tag_is_rejected() {
        let mut bytes = vec![42u8];
        bytes.extend_from_slice(&[0u8; 32]);
        assert!(matches!(
            Key::decode(bytes.as_slice()),
            Err(Error::InvalidEnum(42))
        ));
    }

    #[test]
    fn legacy_keys_sort_first() {
        let address = Address::new([1u8; 32]);
        assert!(Key::legacy(address) < Key::new(Account::Agent, address));
    }
}
