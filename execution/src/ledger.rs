//! Currency balances and item holdings.
//!
//! Balances are stored per `(address, currency)` and total supply per currency. Transfers
//! move value without changing supply; only [mint] raises it and only [burn] lowers it.
//! Every operation checks all preconditions before writing, so a failure leaves the layer
//! exactly as it was. Zero balances are deleted rather than stored.

use commonware_codec::{DecodeExt, Encode};
use tracing::trace;
use worldline_types::{
    address::Address,
    entity::{Inventory, InstanceId, ItemId, NonFungibleItem},
    key::{Currency, Key},
    sheet::ItemKind,
};

use crate::{
    error::ActionError,
    layer::Layer,
    random::ActionRandom,
    store::State,
};

fn read_amount<S: State>(state: &S, key: &Key) -> Result<u64, ActionError> {
    match state.get(key) {
        None => Ok(0),
        Some(value) => u64::decode(value.as_ref()).map_err(|err| ActionError::Malformed {
            kind: "Balance",
            reason: err.to_string(),
        }),
    }
}

fn write_amount<S: State>(layer: &mut Layer<'_, S>, key: Key, amount: u64) {
    if amount == 0 {
        layer.delete(key);
    } else {
        layer.insert(key, amount.encode().freeze());
    }
}

fn insufficient(currency: &Currency, required: u64, available: u64) -> ActionError {
    ActionError::InsufficientBalance {
        resource: currency.ticker().to_string(),
        required,
        available,
    }
}

fn overflow() -> ActionError {
    ActionError::invalid("amount", "balance overflow")
}

pub fn balance<S: State>(
    state: &S,
    address: &Address,
    currency: &Currency,
) -> Result<u64, ActionError> {
    read_amount(state, &Key::balance(*address, currency))
}

pub fn total_supply<S: State>(state: &S, currency: &Currency) -> Result<u64, ActionError> {
    read_amount(state, &Key::supply(currency))
}

/// Create `amount` new units at `to`. Authorization is the caller's job.
pub fn mint<S: State>(
    layer: &mut Layer<'_, S>,
    to: &Address,
    currency: &Currency,
    amount: u64,
) -> Result<(), ActionError> {
    let supply = total_supply(layer, currency)?
        .checked_add(amount)
        .ok_or_else(overflow)?;
    let updated = balance(layer, to, currency)?
        .checked_add(amount)
        .ok_or_else(overflow)?;
    write_amount(layer, Key::supply(currency), supply);
    write_amount(layer, Key::balance(*to, currency), updated);
    trace!(%to, %currency, amount, supply, "minted");
    Ok(())
}

pub fn burn<S: State>(
    layer: &mut Layer<'_, S>,
    from: &Address,
    currency: &Currency,
    amount: u64,
) -> Result<(), ActionError> {
    let available = balance(layer, from, currency)?;
    if available < amount {
        return Err(insufficient(currency, amount, available));
    }
    let supply = total_supply(layer, currency)?;
    let remaining = supply.checked_sub(amount).ok_or_else(|| ActionError::Malformed {
        kind: "Supply",
        reason: format!("supply {supply} below burned amount {amount}"),
    })?;
    write_amount(layer, Key::balance(*from, currency), available - amount);
    write_amount(layer, Key::supply(currency), remaining);
    Ok(())
}

pub fn transfer<S: State>(
    layer: &mut Layer<'_, S>,
    from: &Address,
    to: &Address,
    currency: &Currency,
    amount: u64,
) -> Result<(), ActionError> {
    let available = balance(layer, from, currency)?;
    if available < amount {
        return Err(insufficient(currency, amount, available));
    }
    if from == to {
        return Ok(());
    }
    let received = balance(layer, to, currency)?
        .checked_add(amount)
        .ok_or_else(overflow)?;
    write_amount(layer, Key::balance(*from, currency), available - amount);
    write_amount(layer, Key::balance(*to, currency), received);
    Ok(())
}

pub fn add_fungible_item(
    inventory: &mut Inventory,
    item_id: ItemId,
    count: u64,
) -> Result<(), ActionError> {
    inventory.add_fungible(item_id, count)?;
    Ok(())
}

pub fn remove_fungible_item(
    inventory: &mut Inventory,
    item_id: ItemId,
    count: u64,
) -> Result<(), ActionError> {
    inventory.remove_fungible(item_id, count)?;
    Ok(())
}

pub fn add_non_fungible_item(
    inventory: &mut Inventory,
    item: NonFungibleItem,
) -> Result<(), ActionError> {
    inventory.add_non_fungible(item)?;
    Ok(())
}

pub fn remove_non_fungible_item(
    inventory: &mut Inventory,
    instance_id: &InstanceId,
) -> Result<NonFungibleItem, ActionError> {
    Ok(inventory.remove_non_fungible(instance_id)?)
}

/// Hand out `count` of an item: one stack for materials, fresh instances for equipment.
pub fn grant_item(
    inventory: &mut Inventory,
    kind: ItemKind,
    item_id: ItemId,
    count: u64,
    random: &mut ActionRandom,
) -> Result<(), ActionError> {
    match kind {
        ItemKind::Material => add_fungible_item(inventory, item_id, count),
        ItemKind::Equipment => {
            for _ in 0..count {
                let item = NonFungibleItem::new(random.instance_id(), item_id);
                add_non_fungible_item(inventory, item)?;
            }
            Ok(())
        }
    }
}

/// Remove several fungible stacks at once; nothing is removed unless all are available.
pub fn consume_materials(
    inventory: &mut Inventory,
    materials: impl IntoIterator<Item = (ItemId, u64)>,
) -> Result<(), ActionError> {
    let mut staged = inventory.clone();
    for (item_id, count) in materials {
        staged.remove_fungible(item_id, count)?;
    }
    *inventory = staged;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{random::ActionRandom, store::Snapshot};
    use proptest::prelude::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    #[test]
    fn transfer_without_funds_writes_nothing() {
        let base = Snapshot::empty();
        let mut layer = Layer::new(&base);
        let gold = Currency::gold();
        mint(&mut layer, &addr(1), &gold, 5).unwrap();
        let before = layer.commit();
        let base = base.apply(before);

        let mut layer = Layer::new(&base);
        assert_eq!(
            transfer(&mut layer, &addr(1), &addr(2), &gold, 6),
            Err(ActionError::InsufficientBalance {
                resource: "GOLD".to_string(),
                required: 6,
                available: 5
            })
        );
        assert!(layer.is_clean());
    }

    #[test]
    fn burn_lowers_supply() {
        let base = Snapshot::empty();
        let mut layer = Layer::new(&base);
        let gold = Currency::gold();
        mint(&mut layer, &addr(1), &gold, 10).unwrap();
        burn(&mut layer, &addr(1), &gold, 4).unwrap();
        assert_eq!(balance(&layer, &addr(1), &gold).unwrap(), 6);
        assert_eq!(total_supply(&layer, &gold).unwrap(), 6);

        burn(&mut layer, &addr(1), &gold, 6).unwrap();
        let writes = layer.commit();
        assert!(Snapshot::empty().apply(writes).is_empty());
    }

    #[test]
    fn consume_materials_is_all_or_nothing() {
        let mut inventory = Inventory::default();
        inventory.add_fungible(1, 3).unwrap();
        inventory.add_fungible(2, 1).unwrap();

        let err = consume_materials(&mut inventory, [(1, 2), (2, 2)]).unwrap_err();
        assert_eq!(
            err,
            ActionError::InsufficientMaterial {
                item_id: 2,
                required: 2,
                available: 1
            }
        );
        assert_eq!(inventory.fungible_count(1), 3);

        consume_materials(&mut inventory, [(1, 2), (2, 1)]).unwrap();
        assert_eq!(inventory.fungible_count(1), 1);
        assert_eq!(inventory.fungible_count(2), 0);
    }

    #[test]
    fn grant_item_stacks_materials_and_mints_equipment() {
        let mut random = ActionRandom::new(9, 0, b"redeem_coupon");
        let mut inventory = Inventory::default();
        grant_item(&mut inventory, ItemKind::Material, 303000, 3, &mut random).unwrap();
        grant_item(&mut inventory, ItemKind::Equipment, 10100, 2, &mut random).unwrap();

        assert_eq!(inventory.fungible_count(303000), 3);
        let swords: Vec<_> = inventory.non_fungibles().collect();
        assert_eq!(swords.len(), 2);
        assert!(swords.iter().all(|item| item.item_id == 10100));
        assert_ne!(swords[0].instance_id, swords[1].instance_id);
    }

    #[test]
    fn remove_non_fungible_item_takes_the_instance() {
        let mut random = ActionRandom::new(5, 0, b"combination_consumable");
        let mut inventory = Inventory::default();
        let sword = random.instance_id();
        let armor = random.instance_id();
        add_non_fungible_item(&mut inventory, NonFungibleItem::new(sword, 10100)).unwrap();
        add_non_fungible_item(&mut inventory, NonFungibleItem::new(armor, 10200)).unwrap();

        let removed = remove_non_fungible_item(&mut inventory, &sword).unwrap();
        assert_eq!(removed, NonFungibleItem::new(sword, 10100));
        assert!(inventory.non_fungible(&sword).is_none());
        assert!(inventory.non_fungible(&armor).is_some());
    }

    #[test]
    fn removing_a_missing_instance_changes_nothing() {
        let mut inventory = Inventory::default();
        let kept = InstanceId([1u8; 16]);
        let missing = InstanceId([2u8; 16]);
        add_non_fungible_item(&mut inventory, NonFungibleItem::new(kept, 10100)).unwrap();
        let before = inventory.clone();

        assert!(matches!(
            remove_non_fungible_item(&mut inventory, &missing),
            Err(ActionError::InvalidFieldValue {
                field: "instance_id",
                ..
            })
        ));
        assert_eq!(inventory, before);
    }

    #[test]
    fn removed_instance_ids_are_not_reissued() {
        let mut random = ActionRandom::new(5, 0, b"rapid_combination");
        let mut inventory = Inventory::default();
        let first = random.instance_id();
        add_non_fungible_item(&mut inventory, NonFungibleItem::new(first, 10100)).unwrap();
        remove_non_fungible_item(&mut inventory, &first).unwrap();

        for _ in 0..256 {
            let next = random.instance_id();
            assert_ne!(next, first);
            add_non_fungible_item(&mut inventory, NonFungibleItem::new(next, 10100)).unwrap();
        }
        assert!(inventory.non_fungible(&first).is_none());
        assert_eq!(inventory.non_fungibles().count(), 256);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Mint { to: u8, amount: u64 },
        Transfer { from: u8, to: u8, amount: u64 },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, 0u64..1_000).prop_map(|(to, amount)| Op::Mint { to, amount }),
            (0u8..4, 0u8..4, 0u64..1_500)
                .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        ]
    }

    proptest! {
        #[test]
        fn supply_equals_sum_of_balances(ops in proptest::collection::vec(op(), 1..64)) {
            let gold = Currency::gold();
            let mut snapshot = Snapshot::empty();
            let mut minted = 0u64;
            for op in ops {
                let mut layer = Layer::new(&snapshot);
                let result = match op {
                    Op::Mint { to, amount } => mint(&mut layer, &addr(to), &gold, amount)
                        .map(|_| minted += amount),
                    Op::Transfer { from, to, amount } => {
                        transfer(&mut layer, &addr(from), &addr(to), &gold, amount)
                    }
                };
                if result.is_ok() {
                    let writes = layer.commit();
                    snapshot = snapshot.apply(writes);
                }
            }

            let total: u64 = (0u8..4)
                .map(|i| balance(&snapshot, &addr(i), &gold).unwrap())
                .sum();
            prop_assert_eq!(total, minted);
            prop_assert_eq!(total_supply(&snapshot, &gold).unwrap(), minted);
        }
    }
}
