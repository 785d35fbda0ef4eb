use crate::{
    context::ExecutionContext,
    dispatcher::{execute_block, Block, Receipt, SignedAction},
    simulator::{BattleDelta, BattleOutcome, Simulator},
    store::Snapshot,
};
use rand::RngCore;
use worldline_types::{
    action::Action, address::Address, entity::AvatarState, sheet::StageRow, GameConfig,
    TableSheets,
};

pub const IRON: u32 = 303_000;
pub const CLOTH: u32 = 303_001;
pub const CRYSTAL: u32 = 600_000;
pub const SWORD: u32 = 10_100;
pub const ARMOR: u32 = 10_200;

/// Recipe for [SWORD]: 2 iron, 10 gold, 50 blocks.
pub const SWORD_RECIPE: u32 = 1;
/// Recipe for [ARMOR]: unlocked by clearing stage 2.
pub const ARMOR_RECIPE: u32 = 2;

const SHEETS: &str = r#"{
    "items": [
        {"id": 303000, "name": "Iron", "kind": "material"},
        {"id": 303001, "name": "Cloth", "kind": "material"},
        {"id": 400000, "name": "Hourglass", "kind": "material"},
        {"id": 500000, "name": "AP Stone", "kind": "material"},
        {"id": 600000, "name": "Crystal", "kind": "material"},
        {"id": 10100, "name": "Sword", "kind": "equipment"},
        {"id": 10200, "name": "Armor", "kind": "equipment"}
    ],
    "recipes": [
        {"id": 1, "result_item_id": 10100, "materials": [{"item_id": 303000, "count": 2}],
         "gold_cost": 10, "required_blocks": 50},
        {"id": 2, "result_item_id": 10200, "materials": [{"item_id": 303001, "count": 3}],
         "gold_cost": 0, "required_blocks": 20, "unlock_stage": 2}
    ],
    "stages": [
        {"id": 1, "action_point_cost": 5, "exp": 10},
        {"id": 2, "action_point_cost": 5, "exp": 20},
        {"id": 3, "action_point_cost": 10, "exp": 40}
    ],
    "stake_rewards": [
        {"level": 1, "required_amount": 50, "rewards": [{"item_id": 600000, "rate": 10}]},
        {"level": 2, "required_amount": 500, "rewards": [
            {"item_id": 600000, "rate": 5},
            {"item_id": 400000, "rate": 100}
        ]}
    ]
}"#;

/// Creates an address whose bytes are all `seed`
pub fn create_address(seed: u8) -> Address {
    Address::new([seed; 32])
}

/// Creates the test sheets
pub fn create_sheets() -> TableSheets {
    TableSheets::from_json(SHEETS).expect("test sheets are valid")
}

/// Creates a config with short stake intervals and the given minters
pub fn create_config(minters: Vec<Address>) -> GameConfig {
    let config = GameConfig {
        stake_reward_interval: 10,
        stake_lockup_interval: 100,
        minters,
        ..GameConfig::default()
    };
    config.validate().expect("test config is valid");
    config
}

/// Battle simulator driven entirely by the supplied randomness.
///
/// Each turn draws one value; the battle is won when a draw lands below `win_percent`.
#[derive(Clone, Copy, Debug)]
pub struct TestSimulator {
    pub win_percent: u32,
    pub turns: usize,
}

impl Default for TestSimulator {
    fn default() -> Self {
        Self {
            win_percent: 100,
            turns: 3,
        }
    }
}

impl Simulator for TestSimulator {
    fn simulate(
        &self,
        rng: &mut dyn RngCore,
        _sheets: &TableSheets,
        avatar: &AvatarState,
        stage: &StageRow,
    ) -> BattleOutcome {
        let mut log = Vec::with_capacity(self.turns);
        let mut cleared = false;
        for turn in 0..self.turns {
            let roll = rng.next_u32() % 100;
            log.push(format!("turn {turn}: {} rolls {roll}", avatar.profile.name));
            if roll < self.win_percent {
                cleared = true;
                break;
            }
        }
        let exp = if cleared { stage.exp } else { stage.exp / 2 };
        BattleOutcome {
            log,
            delta: BattleDelta {
                cleared,
                exp,
                rewards: if cleared { vec![(IRON, 1)] } else { Vec::new() },
            },
        }
    }
}

/// A chain of snapshots driven one block at a time.
pub struct TestChain {
    pub config: GameConfig,
    pub sheets: TableSheets,
    pub simulator: TestSimulator,
    pub snapshot: Snapshot,
}

impl TestChain {
    pub fn new(minters: Vec<Address>) -> Self {
        Self {
            config: create_config(minters),
            sheets: create_sheets(),
            simulator: TestSimulator::default(),
            snapshot: Snapshot::empty(),
        }
    }

    pub fn env(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(&self.config, &self.sheets, &self.simulator)
    }

    /// Executes a block and advances the chain
    pub fn execute(&mut self, block: Block) -> Vec<Receipt> {
        let output = execute_block(&self.snapshot, &block, self.env()).expect("block executes");
        self.snapshot = output.snapshot;
        output.receipts
    }

    /// Executes a block holding a single action
    pub fn run(&mut self, block_index: u64, signer: Address, action: impl Into<Action>) -> Receipt {
        let block = Block {
            index: block_index,
            actions: vec![SignedAction::new(signer, action)],
        };
        self.execute(block)
            .pop()
            .expect("one receipt per action")
    }
}
