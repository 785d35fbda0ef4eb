//! Execute actions against snapshots.
//!
//! Every action runs in its own [Layer] over the snapshot left by the previous action. On
//! success the layer's writeset becomes the next snapshot; on any failure the layer is
//! dropped and the previous snapshot is returned untouched. Rejections are ordinary
//! outcomes recorded in the [Receipt]. Only host-level inconsistencies (a block index that
//! does not advance, a replay that diverges) are errors, and those must halt the host.

use anyhow::{anyhow, Context as _};
use commonware_codec::{DecodeExt, Encode};
use tracing::{debug, trace, warn};
use worldline_types::{
    action::{Action, ActionEnvelope},
    address::{block_marker_address, Address},
    key::{Account, Key},
    Event,
};

use crate::{
    context::{ActionContext, ExecutionContext, GasMeter},
    error::ActionError,
    layer::Layer,
    random::ActionRandom,
    store::Snapshot,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    Rejected(ActionError),
}

impl Outcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// What happened to one action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Position of the action within its block.
    pub index: u32,
    pub type_id: String,
    pub outcome: Outcome,
    /// Empty unless committed.
    pub events: Vec<Event>,
    pub gas_used: u64,
}

/// An action as submitted: who signed it and what it says.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedAction {
    pub signer: Address,
    pub envelope: ActionEnvelope,
}

impl SignedAction {
    pub fn new(signer: Address, action: impl Into<Action>) -> Self {
        Self {
            signer,
            envelope: action.into().to_envelope(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Block {
    pub index: u64,
    pub actions: Vec<SignedAction>,
}

pub struct BlockOutput {
    pub snapshot: Snapshot,
    pub receipts: Vec<Receipt>,
}

/// Execute one action, returning the successor snapshot and its receipt.
///
/// A rejected action returns a clone of `snapshot`.
pub fn execute_action(
    snapshot: &Snapshot,
    envelope: &ActionEnvelope,
    env: ExecutionContext<'_>,
    block_index: u64,
    action_index: u32,
    signer: Address,
) -> (Snapshot, Receipt) {
    let mut receipt = Receipt {
        index: action_index,
        type_id: envelope.type_id.clone(),
        outcome: Outcome::Committed,
        events: Vec::new(),
        gas_used: 0,
    };

    let action = match Action::from_envelope(envelope) {
        Ok(action) => action,
        Err(err) => {
            let err = ActionError::from(err);
            debug!(
                block_index,
                action_index,
                type_id = %envelope.type_id,
                %err,
                "undecodable action"
            );
            receipt.outcome = Outcome::Rejected(err);
            return (snapshot.clone(), receipt);
        }
    };

    let mut ctx = ActionContext {
        env,
        block_index,
        action_index,
        signer,
        random: ActionRandom::new(block_index, action_index, action.type_id().as_bytes()),
    };
    let mut gas = GasMeter::new(env.config.gas_limit);
    let mut layer = Layer::new(snapshot);
    let result = layer.apply(&action, &mut ctx, &mut gas);
    receipt.gas_used = gas.used();

    match result {
        Ok(events) => {
            let writes = layer.commit();
            trace!(
                block_index,
                action_index,
                type_id = action.type_id(),
                writes = writes.len(),
                "committed"
            );
            receipt.events = events;
            (snapshot.apply(writes), receipt)
        }
        Err(err) => {
            debug!(
                block_index,
                action_index,
                type_id = action.type_id(),
                %signer,
                %err,
                "rejected"
            );
            receipt.outcome = Outcome::Rejected(err);
            (snapshot.clone(), receipt)
        }
    }
}

fn block_marker_key() -> Key {
    Key::new(Account::System, block_marker_address())
}

/// Index of the last block executed against `snapshot`, if any.
pub fn last_block(snapshot: &Snapshot) -> anyhow::Result<Option<u64>> {
    snapshot
        .get(&block_marker_key())
        .map(|value| u64::decode(value.as_ref()).context("decode block marker"))
        .transpose()
}

/// Execute every action of `block` in order.
///
/// Fails without executing anything if `block.index` does not advance past the last
/// executed block.
pub fn execute_block(
    snapshot: &Snapshot,
    block: &Block,
    env: ExecutionContext<'_>,
) -> anyhow::Result<BlockOutput> {
    if let Some(last) = last_block(snapshot)? {
        if block.index <= last {
            warn!(last, requested = block.index, "non-monotonic block index");
            return Err(anyhow!(
                "non-monotonic block index: last={last}, requested={}",
                block.index
            ));
        }
    }

    let mut current = snapshot.clone();
    let mut receipts = Vec::with_capacity(block.actions.len());
    for (index, action) in block.actions.iter().enumerate() {
        let action_index = u32::try_from(index)
            .with_context(|| format!("too many actions in block {}", block.index))?;
        let (next, receipt) = execute_action(
            &current,
            &action.envelope,
            env,
            block.index,
            action_index,
            action.signer,
        );
        current = next;
        receipts.push(receipt);
    }

    let snapshot = current.set(block_marker_key(), block.index.encode().freeze());
    Ok(BlockOutput { snapshot, receipts })
}

/// Execute `blocks` in order starting from `genesis`.
pub fn replay<'a>(
    genesis: &Snapshot,
    blocks: impl IntoIterator<Item = &'a Block>,
    env: ExecutionContext<'_>,
) -> anyhow::Result<Snapshot> {
    let mut snapshot = genesis.clone();
    for block in blocks {
        snapshot = execute_block(&snapshot, block, env)
            .with_context(|| format!("replay block {}", block.index))?
            .snapshot;
    }
    Ok(snapshot)
}

/// Check that replaying `blocks` from `genesis` reproduces `expected`.
pub fn verify_replay<'a>(
    genesis: &Snapshot,
    blocks: impl IntoIterator<Item = &'a Block>,
    env: ExecutionContext<'_>,
    expected: &Snapshot,
) -> anyhow::Result<()> {
    let replayed = replay(genesis, blocks, env)?;
    let (got, want) = (replayed.root(), expected.root());
    if got != want {
        warn!(?got, ?want, "replay diverged");
        return Err(anyhow!("replay root mismatch: expected {want:?}, got {got:?}"));
    }
    Ok(())
}
