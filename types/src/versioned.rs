//! Versioned entity codec.
//!
//! Every persisted entity is stored as `[version: u8][payload]`. Writers always emit the
//! current version. Readers accept every version the entity has ever shipped and lift older
//! payloads to the current shape through explicit, one-directional upgrade steps.

use bytes::{Buf, BufMut, Bytes};
use commonware_codec::{Error, RangeCfg, Read, ReadExt, Write};
use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SchemaError {
    #[error("invalid schema version for {kind}: {version}")]
    InvalidSchemaVersion { kind: &'static str, version: u8 },
    #[error("malformed {kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

impl SchemaError {
    pub fn malformed(kind: &'static str, err: Error) -> Self {
        Self::Malformed {
            kind,
            reason: err.to_string(),
        }
    }
}

/// An entity with a schema history.
pub trait Versioned: Sized {
    /// Human-readable entity name used in errors and logs.
    const KIND: &'static str;
    /// Version emitted by [encode].
    const VERSION: u8;

    /// Write the current-version payload (without the version byte).
    fn write_payload(&self, writer: &mut impl BufMut);

    /// Read a payload of the given `version` and upgrade it to the current shape.
    fn read_payload(version: u8, reader: &mut impl Buf) -> Result<Self, SchemaError>;

    fn unsupported(version: u8) -> SchemaError {
        SchemaError::InvalidSchemaVersion {
            kind: Self::KIND,
            version,
        }
    }
}

/// Read a codec value, attributing failures to entity `kind`.
pub fn read_as<R: Read<Cfg = ()>>(
    kind: &'static str,
    reader: &mut impl Buf,
) -> Result<R, SchemaError> {
    R::read(reader).map_err(|err| SchemaError::malformed(kind, err))
}

/// Read a length-prefixed list of at most `max` values, attributing failures to `kind`.
pub fn read_list<R>(
    kind: &'static str,
    reader: &mut impl Buf,
    max: usize,
) -> Result<Vec<R>, SchemaError>
where
    R: Read,
    R::Cfg: Default,
{
    Vec::<R>::read_cfg(reader, &(RangeCfg::from(0..=max), R::Cfg::default()))
        .map_err(|err| SchemaError::malformed(kind, err))
}

pub fn encode<T: Versioned>(entity: &T) -> Bytes {
    let mut buf = Vec::new();
    T::VERSION.write(&mut buf);
    entity.write_payload(&mut buf);
    Bytes::from(buf)
}

/// Encode an older payload under an explicit version byte.
///
/// Only historical fixtures and migration tooling need this; live writers use [encode].
pub fn encode_with_version(version: u8, payload: &impl Write) -> Bytes {
    let mut buf = Vec::new();
    version.write(&mut buf);
    payload.write(&mut buf);
    Bytes::from(buf)
}

pub fn decode<T: Versioned>(value: &[u8]) -> Result<T, SchemaError> {
    let mut reader = value;
    let version = read_as::<u8>(T::KIND, &mut reader)?;
    let entity = T::read_payload(version, &mut reader)?;
    if reader.has_remaining() {
        return Err(SchemaError::Malformed {
            kind: T::KIND,
            reason: format!("{} trailing bytes", reader.remaining()),
        });
    }
    Ok(entity)
}

/// Version byte of an encoded value, if any.
pub fn version_of(value: &[u8]) -> Option<u8> {
    value.first().copied()
}
