use bytes::Bytes;
use std::collections::BTreeMap;
use worldline_types::{action::Action, key::Key, Event, Versioned};

use crate::{
    context::{ActionContext, GasMeter},
    error::ActionError,
    store::{State, Status},
};

pub(crate) mod handlers;

pub use handlers::{Handler, MissingState};

/// Pending writes of a single action over an immutable base state.
///
/// Reads see the action's own writes first. Nothing reaches the base until the dispatcher
/// takes the writeset with [Layer::commit]; dropping the layer discards everything.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: Key, value: Bytes) {
        debug_assert!(!key.account.is_legacy(), "legacy keys are read-only");
        self.pending.insert(key, Status::Update(value));
    }

    pub fn delete(&mut self, key: Key) {
        debug_assert!(!key.account.is_legacy(), "legacy keys are read-only");
        self.pending.insert(key, Status::Delete);
    }

    /// Encode `entity` at its current version.
    pub fn write<T: Versioned>(&mut self, key: Key, entity: &T) {
        self.insert(key, worldline_types::versioned::encode(entity));
    }

    pub fn is_clean(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn discard(&mut self) {
        self.pending.clear();
    }

    /// Run one decoded action against this layer.
    pub(crate) fn apply(
        &mut self,
        action: &Action,
        ctx: &mut ActionContext<'_>,
        gas: &mut GasMeter,
    ) -> Result<Vec<Event>, ActionError> {
        match action {
            Action::CreateAvatar(a) => handlers::run(a, self, ctx, gas),
            Action::TransferAsset(a) => handlers::run(a, self, ctx, gas),
            Action::MintAssets(a) => handlers::run(a, self, ctx, gas),
            Action::CombinationConsumable(a) => handlers::run(a, self, ctx, gas),
            Action::RapidCombination(a) => handlers::run(a, self, ctx, gas),
            Action::SettleCombination(a) => handlers::run(a, self, ctx, gas),
            Action::HackAndSlash(a) => handlers::run(a, self, ctx, gas),
            Action::ChargeActionPoint(a) => handlers::run(a, self, ctx, gas),
            Action::Stake(a) => handlers::run(a, self, ctx, gas),
            Action::ClaimStakeReward(a) => handlers::run(a, self, ctx, gas),
            Action::CancelStake(a) => handlers::run(a, self, ctx, gas),
            Action::IssueCoupons(a) => handlers::run(a, self, ctx, gas),
            Action::RedeemCoupon(a) => handlers::run(a, self, ctx, gas),
        }
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    fn get(&self, key: &Key) -> Option<Bytes> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key),
        }
    }
}
