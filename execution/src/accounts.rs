//! Typed loading and saving of world entities.
//!
//! Entities migrated at different times can sit in three layouts:
//!
//! 1. current: one account per entity (`Avatar`, `Inventory`, `WorldInformation`, ...),
//! 2. legacy split: the profile at the flat legacy key, with inventory and world progress
//!    at derived legacy sub-addresses,
//! 3. legacy unified: profile, inventory and world progress in a single legacy blob.
//!
//! Readers try them in that order. The split layout is recognized by looking for its
//! inventory sub-address, which the unified layout never writes. Writers always emit the
//! current layout; legacy keys are left in place and shadowed.

use tracing::trace;
use worldline_types::{
    address::{
        combination_slot_address, legacy_inventory_address, legacy_world_information_address,
        stake_address, Address,
    },
    entity::{
        AgentState, AvatarProfile, AvatarState, CombinationSlot, CouponWallet, Inventory,
        LegacyAvatarBlob, StakeRecord, WorldInformation,
    },
    key::{Account, Key},
    versioned::decode,
    Versioned,
};

use crate::{
    error::ActionError,
    layer::Layer,
    store::{Located, State},
};

/// Read an entity from its current account, falling back to the flat legacy key.
fn read_located<T: Versioned, S: State>(
    state: &S,
    account: Account,
    address: Address,
) -> Result<Option<T>, ActionError> {
    match state.get_or_legacy(account, address) {
        None => Ok(None),
        Some(Located::Current(value)) | Some(Located::Legacy(value)) => Ok(Some(decode(&value)?)),
    }
}

fn read_current<T: Versioned, S: State>(state: &S, key: &Key) -> Result<Option<T>, ActionError> {
    state
        .get(key)
        .map(|value| decode::<T>(&value))
        .transpose()
        .map_err(ActionError::from)
}

pub fn load_agent<S: State>(
    state: &S,
    agent: &Address,
) -> Result<Option<AgentState>, ActionError> {
    read_located(state, Account::Agent, *agent)
}

pub fn save_agent<S: State>(layer: &mut Layer<'_, S>, agent: &Address, state: &AgentState) {
    layer.write(Key::new(Account::Agent, *agent), state);
}

pub fn load_avatar<S: State>(
    state: &S,
    address: &Address,
) -> Result<Option<AvatarState>, ActionError> {
    let address = *address;

    let current = Key::new(Account::Avatar, address);
    if let Some(profile) = read_current::<AvatarProfile, _>(state, &current)? {
        let inventory: Inventory = read_current(state, &Key::new(Account::Inventory, address))?
            .unwrap_or_default();
        let world: WorldInformation =
            read_current(state, &Key::new(Account::WorldInformation, address))?
                .unwrap_or_default();
        return Ok(Some(AvatarState {
            address,
            profile,
            inventory,
            world,
        }));
    }

    let Some(legacy) = state.get(&Key::legacy(address)) else {
        return Ok(None);
    };

    let inventory_key = Key::legacy(legacy_inventory_address(&address));
    if let Some(inventory) = read_current::<Inventory, _>(state, &inventory_key)? {
        trace!(%address, "reading avatar from legacy split layout");
        let world_key = Key::legacy(legacy_world_information_address(&address));
        let world: WorldInformation = read_current(state, &world_key)?.unwrap_or_default();
        return Ok(Some(AvatarState {
            address,
            profile: decode(&legacy)?,
            inventory,
            world,
        }));
    }

    trace!(%address, "reading avatar from legacy unified layout");
    let blob: LegacyAvatarBlob = decode(&legacy)?;
    Ok(Some(blob.into_state(address)?))
}

/// Write every part of the avatar in the current layout.
pub fn save_avatar<S: State>(layer: &mut Layer<'_, S>, avatar: &AvatarState) {
    layer.write(Key::new(Account::Avatar, avatar.address), &avatar.profile);
    layer.write(Key::new(Account::Inventory, avatar.address), &avatar.inventory);
    layer.write(Key::new(Account::WorldInformation, avatar.address), &avatar.world);
}

/// Load an avatar the signer owns.
pub fn load_owned_avatar<S: State>(
    state: &S,
    signer: &Address,
    address: &Address,
) -> Result<AvatarState, ActionError> {
    let avatar = load_avatar(state, address)?
        .ok_or_else(|| ActionError::not_found(AvatarProfile::KIND, *address))?;
    if avatar.profile.agent != *signer {
        return Err(ActionError::PermissionDenied { signer: *signer });
    }
    Ok(avatar)
}

pub fn load_slot<S: State>(
    state: &S,
    avatar: &Address,
    index: u8,
) -> Result<Option<CombinationSlot>, ActionError> {
    read_located(state, Account::CombinationSlot, combination_slot_address(avatar, index))
}

pub fn save_slot<S: State>(
    layer: &mut Layer<'_, S>,
    avatar: &Address,
    index: u8,
    slot: &CombinationSlot,
) {
    let key = Key::new(Account::CombinationSlot, combination_slot_address(avatar, index));
    layer.write(key, slot);
}

pub fn load_stake<S: State>(
    state: &S,
    agent: &Address,
) -> Result<Option<StakeRecord>, ActionError> {
    read_located(state, Account::Stake, stake_address(agent))
}

pub fn save_stake<S: State>(layer: &mut Layer<'_, S>, agent: &Address, record: &StakeRecord) {
    layer.write(Key::new(Account::Stake, stake_address(agent)), record);
}

/// Coupon wallets only ever lived in the current layout; a missing one is empty.
pub fn load_wallet<S: State>(state: &S, agent: &Address) -> Result<CouponWallet, ActionError> {
    Ok(read_current(state, &Key::new(Account::CouponWallet, *agent))?.unwrap_or_default())
}

pub fn save_wallet<S: State>(layer: &mut Layer<'_, S>, agent: &Address, wallet: &CouponWallet) {
    layer.write(Key::new(Account::CouponWallet, *agent), wallet);
}
