use crate::{
    address::Address,
    entity::{ItemId, MAX_NAME_LEN},
    key::Currency,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Game rules shared by every executor.
///
/// Values that are not present in the JSON fall back to [GameConfig::default].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub avatar_slot_count: u8,
    pub combination_slot_count: u8,
    pub name_min_len: usize,
    pub name_max_len: usize,
    pub action_point_max: u32,
    pub stake_reward_interval: u64,
    pub stake_lockup_interval: u64,
    pub gold: Currency,
    /// Identities allowed to run `mint_assets`.
    pub minters: Vec<Address>,
    pub ap_stone_item_id: ItemId,
    pub hourglass_item_id: ItemId,
    pub blocks_per_hourglass: u64,
    /// Gas budget of a single action.
    pub gas_limit: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            avatar_slot_count: 3,
            combination_slot_count: 4,
            name_min_len: 2,
            name_max_len: 20,
            action_point_max: 120,
            stake_reward_interval: 50_400,
            stake_lockup_interval: 201_600,
            gold: Currency::gold(),
            minters: Vec::new(),
            ap_stone_item_id: 500_000,
            hourglass_item_id: 400_000,
            blocks_per_hourglass: 3,
            gas_limit: 10,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.avatar_slot_count == 0 {
            return Err(ConfigError::Invalid("avatar_slot_count must be positive"));
        }
        if self.combination_slot_count == 0 {
            return Err(ConfigError::Invalid("combination_slot_count must be positive"));
        }
        if self.name_min_len == 0 || self.name_min_len > self.name_max_len {
            return Err(ConfigError::Invalid("name length bounds are inconsistent"));
        }
        if self.name_max_len > MAX_NAME_LEN {
            return Err(ConfigError::Invalid(
                "name_max_len exceeds the longest storable name",
            ));
        }
        if self.stake_reward_interval == 0 {
            return Err(ConfigError::Invalid("stake_reward_interval must be positive"));
        }
        if self.stake_lockup_interval < self.stake_reward_interval {
            return Err(ConfigError::Invalid(
                "stake_lockup_interval must cover at least one reward interval",
            ));
        }
        if self.blocks_per_hourglass == 0 {
            return Err(ConfigError::Invalid("blocks_per_hourglass must be positive"));
        }
        if self.gas_limit == 0 {
            return Err(ConfigError::Invalid("gas_limit must be positive"));
        }
        Ok(())
    }
}
