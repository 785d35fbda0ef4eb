//! Action handlers.
//!
//! Each action type implements [Handler]: a fixed gas cost, a policy for missing state, a
//! `validate` step that only looks at the input and the read-only context, and an `execute`
//! step that reads and writes through the action's [Layer].

use tracing::debug;
use worldline_types::Event;

use super::Layer;
use crate::{
    context::{ActionContext, GasMeter},
    error::ActionError,
    store::State,
};

mod asset;
mod avatar;
mod battle;
mod combination;
mod coupon;
mod stake;

/// What to do when an action finds the state it operates on missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingState {
    Reject,
    /// Commit as a no-op with no writes and no events.
    Tolerate,
}

pub trait Handler {
    const COST: u64;
    const MISSING_STATE: MissingState = MissingState::Reject;

    /// Checks that need no state. Runs after the fixed cost is charged.
    fn validate(&self, _ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError>;
}

pub(super) fn run<H: Handler, S: State>(
    handler: &H,
    layer: &mut Layer<'_, S>,
    ctx: &mut ActionContext<'_>,
    gas: &mut GasMeter,
) -> Result<Vec<Event>, ActionError> {
    gas.charge(H::COST)?;
    handler.validate(ctx)?;
    match handler.execute(layer, ctx) {
        Err(ActionError::StateNotFound { kind, address })
            if H::MISSING_STATE == MissingState::Tolerate =>
        {
            debug!(kind, %address, "state missing; committing as no-op");
            layer.discard();
            Ok(Vec::new())
        }
        result => result,
    }
}
