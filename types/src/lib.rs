//! Shared types for worldline: addresses, storage keys, versioned entities, the action wire
//! format, and the host-supplied configuration and lookup tables.

pub mod action;
pub mod address;
pub mod codec;
pub mod config;
pub mod entity;
pub mod event;
pub mod key;
pub mod sheet;
pub mod versioned;

pub use action::{Action, ActionEnvelope, ActionPayload, Field, FieldError};
pub use address::Address;
pub use config::{ConfigError, GameConfig};
pub use event::Event;
pub use key::{Account, Currency, Key};
pub use sheet::{SheetError, TableSheets};
pub use versioned::{SchemaError, Versioned};
