//! Worldline execution layer.
//!
//! This crate applies actions to versioned world state. Each action runs in a [`Layer`]
//! over an immutable [`Snapshot`] and either commits its whole writeset or leaves the
//! snapshot untouched.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; the block index is the only clock.
//! - Draw randomness only from the action's [`ActionRandom`].
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! The primary entrypoint is [`execute_block`].
//!
//! ## Minimal execution pipeline (example)
//! ```rust,ignore
//! use worldline_execution::{execute_block, Block, ExecutionContext, SignedAction, Snapshot};
//! use worldline_types::action::CreateAvatar;
//!
//! # fn example(ctx: ExecutionContext<'_>, signer: worldline_types::Address) -> anyhow::Result<()> {
//! let block = Block {
//!     index: 1,
//!     actions: vec![SignedAction::new(
//!         signer,
//!         CreateAvatar { index: 0, name: "Hero".into(), customization: Default::default() },
//!     )],
//! };
//! let output = execute_block(&Snapshot::empty(), &block, ctx)?;
//! assert!(output.receipts[0].outcome.is_committed());
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod layer;
pub mod ledger;
pub mod random;
pub mod schedule;
pub mod simulator;
pub mod store;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod replay_harness_tests;

pub use context::{ActionContext, ExecutionContext, GasMeter};
pub use dispatcher::{
    execute_action, execute_block, last_block, replay, verify_replay, Block, BlockOutput,
    Outcome, Receipt, SignedAction,
};
pub use error::ActionError;
pub use layer::{Handler, Layer, MissingState};
pub use random::ActionRandom;
pub use simulator::{BattleDelta, BattleOutcome, Simulator};
pub use store::{Located, Snapshot, State, Status};
