//! Persisted entities and their schema histories.
//!
//! Each submodule defines the current shape of an entity plus frozen structs for every
//! older version it has shipped, with one `upgrade` step per version bump.

pub mod agent;
pub mod avatar;
pub mod coupon;
pub mod inventory;
pub mod slot;
pub mod stake;
pub mod world;

pub use agent::AgentState;
pub use avatar::{AvatarProfile, AvatarState, Customization, LegacyAvatarBlob};
pub use coupon::{Coupon, CouponId, CouponWallet};
pub use inventory::{InstanceId, Inventory, InventoryError, ItemId, NonFungibleItem};
pub use slot::{CombinationSlot, CraftJob};
pub use stake::StakeRecord;
pub use world::WorldInformation;

/// Upper bound on any collection read from storage.
pub const MAX_ENTRIES: usize = 4_096;
/// Upper bound on any name read from storage.
pub const MAX_NAME_LEN: usize = 64;
