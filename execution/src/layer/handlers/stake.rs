use tracing::{debug, info};
use worldline_types::{
    action::{CancelStake, ClaimStakeReward, Stake},
    address::stake_address,
    entity::StakeRecord,
    Event, Versioned,
};

use super::{Handler, Layer};
use crate::{
    accounts::{load_owned_avatar, load_stake, save_avatar, save_stake},
    context::ActionContext,
    error::ActionError,
    ledger,
    schedule::{is_cancellable, is_claimable, reward_steps},
    store::State,
};

fn require_stake<S: State>(
    state: &S,
    ctx: &ActionContext<'_>,
) -> Result<StakeRecord, ActionError> {
    load_stake(state, &ctx.signer)?
        .ok_or_else(|| ActionError::not_found(StakeRecord::KIND, stake_address(&ctx.signer)))
}

impl Handler for Stake {
    const COST: u64 = 2;

    fn validate(&self, _ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        if self.amount == 0 {
            return Err(ActionError::invalid("amount", "must be positive"));
        }
        Ok(())
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let config = ctx.config();
        let escrow = stake_address(&ctx.signer);
        let previous = load_stake(layer, &ctx.signer)?;
        if previous.as_ref().is_some_and(|record| !record.is_closed()) {
            return Err(ActionError::AddressAlreadyInUse(escrow));
        }
        if ctx.sheets().stake_level(self.amount).is_none() {
            return Err(ActionError::invalid(
                "amount",
                format!("{} is below every reward level", self.amount),
            ));
        }

        ledger::transfer(layer, &ctx.signer, &escrow, &config.gold, self.amount)?;
        let mut record =
            StakeRecord::open(self.amount, ctx.block_index, config.stake_lockup_interval);
        if let Some(previous) = previous {
            record.achievements = previous.achievements;
        }
        save_stake(layer, &ctx.signer, &record);

        info!(
            agent = %ctx.signer,
            amount = self.amount,
            cancellable_block = record.cancellable_block,
            "stake opened"
        );
        Ok(vec![Event::Staked {
            agent: ctx.signer,
            amount: self.amount,
            cancellable_block: record.cancellable_block,
        }])
    }
}

impl Handler for ClaimStakeReward {
    const COST: u64 = 3;

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let config = ctx.config();
        let interval = config.stake_reward_interval;
        let mut record = require_stake(layer, ctx)?;
        let mut avatar = load_owned_avatar(layer, &ctx.signer, &self.avatar)?;

        let steps = reward_steps(&record, ctx.block_index, interval);
        if !is_claimable(&record, ctx.block_index, interval) || steps == 0 {
            return Err(ActionError::ScheduleNotReady {
                unlock_block: record.reward_anchor().saturating_add(interval),
                current_block: ctx.block_index,
            });
        }

        let staked = ledger::balance(layer, &stake_address(&ctx.signer), &config.gold)?;
        let level = ctx.sheets().stake_level(staked).ok_or_else(|| {
            ActionError::invalid("stake", format!("{staked} is below every reward level"))
        })?;
        for reward in &level.rewards {
            let count = (staked / reward.rate)
                .checked_mul(steps)
                .ok_or_else(|| ActionError::invalid("stake", "reward overflows"))?;
            if count > 0 {
                ledger::add_fungible_item(&mut avatar.inventory, reward.item_id, count)?;
            }
        }

        record.last_claimed_block = record
            .reward_anchor()
            .saturating_add(steps.saturating_mul(interval));
        record.record_achievement(level.level, u32::try_from(steps).unwrap_or(u32::MAX));
        save_stake(layer, &ctx.signer, &record);
        save_avatar(layer, &avatar);

        debug!(agent = %ctx.signer, level = level.level, steps, "stake reward claimed");
        Ok(vec![Event::StakeRewardClaimed {
            agent: ctx.signer,
            avatar: self.avatar,
            level: level.level,
            steps,
        }])
    }
}

impl Handler for CancelStake {
    const COST: u64 = 2;

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let config = ctx.config();
        let mut record = require_stake(layer, ctx)?;
        if record.is_closed() {
            return Err(ActionError::invalid("stake", "already cancelled"));
        }
        if !is_cancellable(&record, ctx.block_index) {
            return Err(ActionError::ScheduleNotReady {
                unlock_block: record.cancellable_block,
                current_block: ctx.block_index,
            });
        }

        let escrow = stake_address(&ctx.signer);
        let amount = ledger::balance(layer, &escrow, &config.gold)?;
        if amount > 0 {
            ledger::transfer(layer, &escrow, &ctx.signer, &config.gold, amount)?;
        }
        record.close();
        save_stake(layer, &ctx.signer, &record);

        info!(agent = %ctx.signer, amount, "stake cancelled");
        Ok(vec![Event::StakeCancelled {
            agent: ctx.signer,
            amount,
        }])
    }
}
