//! Interface to the external battle simulator.
//!
//! The engine does not know how combat works. It hands the simulator a randomness source,
//! the sheets, the avatar and the stage, and applies whatever delta comes back exactly like
//! any other write. Implementations must draw all randomness from `rng`.

use rand::RngCore;
use worldline_types::{entity::AvatarState, entity::ItemId, sheet::StageRow, TableSheets};

/// State changes produced by a battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BattleDelta {
    pub cleared: bool,
    pub exp: u64,
    /// Fungible rewards credited to the avatar's inventory.
    pub rewards: Vec<(ItemId, u64)>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BattleOutcome {
    /// Opaque turn-by-turn log, passed through to the receipt.
    pub log: Vec<String>,
    pub delta: BattleDelta,
}

pub trait Simulator {
    fn simulate(
        &self,
        rng: &mut dyn RngCore,
        sheets: &TableSheets,
        avatar: &AvatarState,
        stage: &StageRow,
    ) -> BattleOutcome;
}
