use tracing::debug;
use worldline_types::{
    action::{CombinationConsumable, RapidCombination, SettleCombination},
    address::{blacksmith_address, combination_slot_address, Address},
    entity::{AvatarState, CombinationSlot, CraftJob, NonFungibleItem},
    Event, Versioned,
};

use super::{Handler, Layer, MissingState};
use crate::{
    accounts::{load_owned_avatar, load_slot, save_avatar, save_slot},
    context::ActionContext,
    error::ActionError,
    ledger,
    schedule::{blocks_remaining, is_ready, schedule, Lock},
    store::State,
};

fn check_slot_index(index: u8, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
    let count = ctx.config().combination_slot_count;
    if index >= count {
        return Err(ActionError::invalid(
            "slot_index",
            format!("slot {index} of {count}"),
        ));
    }
    Ok(())
}

fn require_slot<S: State>(
    state: &S,
    avatar: &Address,
    index: u8,
) -> Result<CombinationSlot, ActionError> {
    load_slot(state, avatar, index)?.ok_or_else(|| {
        ActionError::not_found(
            CombinationSlot::KIND,
            combination_slot_address(avatar, index),
        )
    })
}

/// Move a finished job's result into the avatar's inventory.
fn deliver(avatar: &mut AvatarState, job: CraftJob) -> Result<NonFungibleItem, ActionError> {
    ledger::add_non_fungible_item(&mut avatar.inventory, job.result.clone())?;
    Ok(job.result)
}

impl Handler for CombinationConsumable {
    const COST: u64 = 3;

    fn validate(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        check_slot_index(self.slot_index, ctx)?;
        if ctx.sheets().recipe(self.recipe_id).is_none() {
            return Err(ActionError::invalid(
                "recipe_id",
                format!("unknown recipe {}", self.recipe_id),
            ));
        }
        Ok(())
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let recipe = ctx
            .sheets()
            .recipe(self.recipe_id)
            .ok_or_else(|| ActionError::invalid("recipe_id", "unknown recipe"))?;
        let mut avatar = load_owned_avatar(layer, &ctx.signer, &self.avatar)?;
        if recipe.unlock_stage > 0 && !avatar.world.is_cleared(recipe.unlock_stage) {
            return Err(ActionError::StageLocked {
                stage_id: recipe.unlock_stage,
                last_cleared: avatar.world.last_cleared_stage,
            });
        }

        let slot = require_slot(layer, &self.avatar, self.slot_index)?;
        let mut events = Vec::new();
        if let Some(job) = slot.job {
            let lock = Lock::from(&job);
            if !is_ready(&lock, ctx.block_index) {
                return Err(ActionError::ScheduleNotReady {
                    unlock_block: lock.unlock_block,
                    current_block: ctx.block_index,
                });
            }
            // A finished job left in the slot is collected before the slot is reused.
            let item = deliver(&mut avatar, job)?;
            events.push(Event::CombinationSettled {
                avatar: self.avatar,
                slot: self.slot_index,
                instance_id: item.instance_id,
                item_id: item.item_id,
            });
        }

        ledger::consume_materials(
            &mut avatar.inventory,
            recipe.materials.iter().map(|m| (m.item_id, m.count)),
        )?;
        if recipe.gold_cost > 0 {
            ledger::transfer(
                layer,
                &ctx.signer,
                &blacksmith_address(),
                &ctx.config().gold,
                recipe.gold_cost,
            )?;
        }

        let instance_id = ctx.random.instance_id();
        if avatar.inventory.non_fungible(&instance_id).is_some() {
            return Err(ActionError::DuplicateInstance(instance_id));
        }
        let lock = schedule(ctx.block_index, recipe.required_blocks);
        let job = CraftJob {
            recipe_id: recipe.id,
            result: NonFungibleItem::new(instance_id, recipe.result_item_id),
            start_block: lock.start_block,
            unlock_block: lock.unlock_block,
        };
        save_slot(layer, &self.avatar, self.slot_index, &CombinationSlot::occupied(job));
        save_avatar(layer, &avatar);

        debug!(
            avatar = %self.avatar,
            slot = self.slot_index,
            recipe = recipe.id,
            unlock_block = lock.unlock_block,
            "combination started"
        );
        events.push(Event::CombinationStarted {
            avatar: self.avatar,
            slot: self.slot_index,
            recipe_id: recipe.id,
            instance_id,
            unlock_block: lock.unlock_block,
        });
        Ok(events)
    }
}

impl Handler for RapidCombination {
    const COST: u64 = 2;

    fn validate(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        check_slot_index(self.slot_index, ctx)
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let config = ctx.config();
        let mut avatar = load_owned_avatar(layer, &ctx.signer, &self.avatar)?;
        let slot = require_slot(layer, &self.avatar, self.slot_index)?;
        let Some(mut job) = slot.job else {
            return Err(ActionError::invalid("slot_index", "slot is empty"));
        };
        let lock = Lock::from(&job);
        if is_ready(&lock, ctx.block_index) {
            return Err(ActionError::invalid("slot_index", "slot is already unlocked"));
        }

        let hourglasses = blocks_remaining(&lock, ctx.block_index)
            .div_ceil(config.blocks_per_hourglass.max(1));
        ledger::remove_fungible_item(&mut avatar.inventory, config.hourglass_item_id, hourglasses)?;
        job.unlock_block = job.start_block.max(ctx.block_index);
        save_slot(layer, &self.avatar, self.slot_index, &CombinationSlot::occupied(job));
        save_avatar(layer, &avatar);

        Ok(vec![Event::CombinationRushed {
            avatar: self.avatar,
            slot: self.slot_index,
            hourglasses,
        }])
    }
}

impl Handler for SettleCombination {
    const COST: u64 = 1;
    const MISSING_STATE: MissingState = MissingState::Tolerate;

    fn validate(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        check_slot_index(self.slot_index, ctx)
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let mut avatar = load_owned_avatar(layer, &ctx.signer, &self.avatar)?;
        let slot = require_slot(layer, &self.avatar, self.slot_index)?;
        let Some(job) = slot.job else {
            return Ok(Vec::new());
        };
        let lock = Lock::from(&job);
        if !is_ready(&lock, ctx.block_index) {
            return Err(ActionError::ScheduleNotReady {
                unlock_block: lock.unlock_block,
                current_block: ctx.block_index,
            });
        }

        let item = deliver(&mut avatar, job)?;
        save_slot(layer, &self.avatar, self.slot_index, &CombinationSlot::default());
        save_avatar(layer, &avatar);

        Ok(vec![Event::CombinationSettled {
            avatar: self.avatar,
            slot: self.slot_index,
            instance_id: item.instance_id,
            item_id: item.item_id,
        }])
    }
}
