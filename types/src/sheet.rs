//! Economic lookup tables supplied by the host.
//!
//! Sheets are immutable for the lifetime of an executor. They are loaded from JSON once,
//! checked for internal consistency, and indexed into ordered maps so that every lookup
//! and iteration is deterministic.

use crate::{entity::ItemId, key::Currency};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SheetError {
    #[error("invalid sheet json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate row {id} in {sheet}")]
    Duplicate { sheet: &'static str, id: u64 },
    #[error("row {id} in {sheet} references unknown item {item_id}")]
    UnknownItem {
        sheet: &'static str,
        id: u64,
        item_id: ItemId,
    },
    #[error("row {id} in {sheet}: {reason}")]
    Invalid {
        sheet: &'static str,
        id: u64,
        reason: &'static str,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Stackable; tracked by count.
    #[default]
    Material,
    /// Unique; tracked by instance id.
    Equipment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRow {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub kind: ItemKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCost {
    pub item_id: ItemId,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRow {
    pub id: u32,
    pub result_item_id: ItemId,
    pub materials: Vec<MaterialCost>,
    #[serde(default)]
    pub gold_cost: u64,
    pub required_blocks: u64,
    /// Stage that must be cleared before the recipe can be used (0 = none).
    #[serde(default)]
    pub unlock_stage: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRow {
    pub id: u32,
    pub action_point_cost: u32,
    pub exp: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeReward {
    pub item_id: ItemId,
    /// Staked units per reward item, per interval.
    pub rate: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRewardRow {
    pub level: u32,
    pub required_amount: u64,
    pub rewards: Vec<StakeReward>,
}

/// Item handed to every new avatar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterItemRow {
    pub item_id: ItemId,
    pub count: u64,
}

/// Who receives a starter currency grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarterTarget {
    /// The identity that created the avatar.
    Agent,
    /// The new avatar's own address.
    Avatar,
}

/// Currency minted for every new avatar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterAssetRow {
    pub currency: Currency,
    pub amount: u64,
    pub target: StarterTarget,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRows {
    #[serde(default)]
    pub items: Vec<ItemRow>,
    #[serde(default)]
    pub recipes: Vec<RecipeRow>,
    #[serde(default)]
    pub stages: Vec<StageRow>,
    #[serde(default)]
    pub stake_rewards: Vec<StakeRewardRow>,
    #[serde(default)]
    pub starter_items: Vec<StarterItemRow>,
    #[serde(default)]
    pub starter_assets: Vec<StarterAssetRow>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableSheets {
    items: BTreeMap<ItemId, ItemRow>,
    recipes: BTreeMap<u32, RecipeRow>,
    stages: BTreeMap<u32, StageRow>,
    /// Keyed by required amount so the best level for a stake is a range lookup.
    stake_rewards: BTreeMap<u64, StakeRewardRow>,
    starter_items: BTreeMap<ItemId, StarterItemRow>,
    /// Granted in row order.
    starter_assets: Vec<StarterAssetRow>,
}

fn index<K: Ord + Copy + Into<u64>, V>(
    sheet: &'static str,
    rows: Vec<V>,
    key: impl Fn(&V) -> K,
) -> Result<BTreeMap<K, V>, SheetError> {
    let mut indexed = BTreeMap::new();
    for row in rows {
        let id = key(&row);
        if indexed.insert(id, row).is_some() {
            return Err(SheetError::Duplicate {
                sheet,
                id: id.into(),
            });
        }
    }
    Ok(indexed)
}

impl TableSheets {
    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        Self::from_rows(serde_json::from_str(json)?)
    }

    pub fn from_rows(rows: SheetRows) -> Result<Self, SheetError> {
        let sheets = Self {
            items: index("items", rows.items, |row| row.id)?,
            recipes: index("recipes", rows.recipes, |row| row.id)?,
            stages: index("stages", rows.stages, |row| row.id)?,
            stake_rewards: index("stake_rewards", rows.stake_rewards, |row| row.required_amount)?,
            starter_items: index("starter_items", rows.starter_items, |row| row.item_id)?,
            starter_assets: rows.starter_assets,
        };
        sheets.validate()?;
        Ok(sheets)
    }

    fn require_item(
        &self,
        sheet: &'static str,
        id: u64,
        item_id: ItemId,
        kind: ItemKind,
    ) -> Result<(), SheetError> {
        match self.items.get(&item_id) {
            None => Err(SheetError::UnknownItem { sheet, id, item_id }),
            Some(row) if row.kind != kind => Err(SheetError::Invalid {
                sheet,
                id,
                reason: "item kind mismatch",
            }),
            Some(_) => Ok(()),
        }
    }

    fn validate(&self) -> Result<(), SheetError> {
        for recipe in self.recipes.values() {
            let id = recipe.id as u64;
            self.require_item("recipes", id, recipe.result_item_id, ItemKind::Equipment)?;
            for material in &recipe.materials {
                self.require_item("recipes", id, material.item_id, ItemKind::Material)?;
                if material.count == 0 {
                    return Err(SheetError::Invalid {
                        sheet: "recipes",
                        id,
                        reason: "zero material count",
                    });
                }
            }
        }
        for row in self.stake_rewards.values() {
            for reward in &row.rewards {
                self.require_item(
                    "stake_rewards",
                    row.level as u64,
                    reward.item_id,
                    ItemKind::Material,
                )?;
                if reward.rate == 0 {
                    return Err(SheetError::Invalid {
                        sheet: "stake_rewards",
                        id: row.level as u64,
                        reason: "zero reward rate",
                    });
                }
            }
        }
        for row in self.starter_items.values() {
            let id = row.item_id as u64;
            if !self.items.contains_key(&row.item_id) {
                return Err(SheetError::UnknownItem {
                    sheet: "starter_items",
                    id,
                    item_id: row.item_id,
                });
            }
            if row.count == 0 {
                return Err(SheetError::Invalid {
                    sheet: "starter_items",
                    id,
                    reason: "zero count",
                });
            }
        }
        for (position, row) in self.starter_assets.iter().enumerate() {
            if row.amount == 0 {
                return Err(SheetError::Invalid {
                    sheet: "starter_assets",
                    id: position as u64,
                    reason: "zero amount",
                });
            }
        }
        Ok(())
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemRow> {
        self.items.get(&id)
    }

    pub fn recipe(&self, id: u32) -> Option<&RecipeRow> {
        self.recipes.get(&id)
    }

    pub fn stage(&self, id: u32) -> Option<&StageRow> {
        self.stages.get(&id)
    }

    /// Items granted to a new avatar, in item id order.
    pub fn starter_items(&self) -> impl Iterator<Item = &StarterItemRow> {
        self.starter_items.values()
    }

    pub fn starter_assets(&self) -> &[StarterAssetRow] {
        &self.starter_assets
    }

    /// Highest reward level whose requirement `amount` meets.
    pub fn stake_level(&self, amount: u64) -> Option<&StakeRewardRow> {
        self.stake_rewards
            .range(..=amount)
            .next_back()
            .map(|(_, row)| row)
    }
}
