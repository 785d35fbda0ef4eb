use tracing::debug;
use worldline_types::{action::HackAndSlash, Event};

use super::{Handler, Layer};
use crate::{
    accounts::{load_owned_avatar, save_avatar},
    context::ActionContext,
    error::ActionError,
    ledger,
    store::State,
};

impl Handler for HackAndSlash {
    const COST: u64 = 5;

    fn validate(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        if ctx.sheets().stage(self.stage_id).is_none() {
            return Err(ActionError::invalid(
                "stage_id",
                format!("unknown stage {}", self.stage_id),
            ));
        }
        Ok(())
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let sheets = ctx.sheets();
        let stage = sheets
            .stage(self.stage_id)
            .ok_or_else(|| ActionError::invalid("stage_id", "unknown stage"))?;
        let mut avatar = load_owned_avatar(layer, &ctx.signer, &self.avatar)?;
        if !avatar.world.is_unlocked(stage.id) {
            return Err(ActionError::StageLocked {
                stage_id: stage.id,
                last_cleared: avatar.world.last_cleared_stage,
            });
        }
        let available = avatar.profile.action_point;
        if available < stage.action_point_cost {
            return Err(ActionError::InsufficientBalance {
                resource: "action point".to_string(),
                required: stage.action_point_cost as u64,
                available: available as u64,
            });
        }
        avatar.profile.action_point = available - stage.action_point_cost;

        let simulator = ctx.env.simulator;
        let outcome = simulator.simulate(&mut ctx.random, sheets, &avatar, stage);
        let delta = outcome.delta;
        avatar.profile.exp = avatar.profile.exp.saturating_add(delta.exp);
        if delta.cleared {
            avatar.world.clear(stage.id);
        }
        for (item_id, count) in &delta.rewards {
            ledger::add_fungible_item(&mut avatar.inventory, *item_id, *count)?;
        }
        save_avatar(layer, &avatar);

        debug!(
            avatar = %self.avatar,
            stage = stage.id,
            cleared = delta.cleared,
            exp = delta.exp,
            turns = outcome.log.len(),
            "battle finished"
        );
        Ok(vec![Event::BattleFinished {
            avatar: self.avatar,
            stage_id: stage.id,
            cleared: delta.cleared,
            exp: delta.exp,
            log: outcome.log,
        }])
    }
}
