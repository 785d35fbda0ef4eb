use tracing::info;
use worldline_types::{
    action::{ChargeActionPoint, CreateAvatar},
    address::avatar_address,
    entity::{AvatarProfile, AvatarState, CombinationSlot, Inventory, WorldInformation},
    sheet::StarterTarget,
    Event, GameConfig,
};

use super::{Handler, Layer};
use crate::{
    accounts::{load_agent, load_avatar, load_owned_avatar, save_agent, save_avatar, save_slot},
    context::ActionContext,
    error::ActionError,
    ledger,
    store::State,
};

/// Names are ASCII letters, digits and inner spaces.
fn validate_name(name: &str, config: &GameConfig) -> Result<(), ActionError> {
    let len = name.chars().count();
    if len < config.name_min_len || len > config.name_max_len {
        return Err(ActionError::invalid(
            "name",
            format!(
                "length {len} outside {}..={}",
                config.name_min_len, config.name_max_len
            ),
        ));
    }
    if name.starts_with(' ') || name.ends_with(' ') {
        return Err(ActionError::invalid("name", "leading or trailing space"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
        return Err(ActionError::invalid("name", "unsupported character"));
    }
    Ok(())
}

impl Handler for CreateAvatar {
    const COST: u64 = 1;

    fn validate(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        let config = ctx.config();
        if self.index >= config.avatar_slot_count {
            return Err(ActionError::invalid(
                "index",
                format!("slot {} of {}", self.index, config.avatar_slot_count),
            ));
        }
        validate_name(&self.name, config)
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let config = ctx.config();
        let agent_address = ctx.signer;
        let address = avatar_address(&agent_address, self.index);

        let mut agent = load_agent(layer, &agent_address)?.unwrap_or_default();
        if agent.avatar(self.index).is_some() || load_avatar(layer, &address)?.is_some() {
            return Err(ActionError::AddressAlreadyInUse(address));
        }

        let mut avatar = AvatarState {
            address,
            profile: AvatarProfile::new(
                self.name.clone(),
                agent_address,
                ctx.block_index,
                config.action_point_max,
                self.customization,
            ),
            inventory: Inventory::default(),
            world: WorldInformation::default(),
        };
        let mut events = vec![Event::AvatarCreated {
            agent: agent_address,
            avatar: address,
            slot: self.index,
            name: self.name.clone(),
        }];
        events.extend(grant_starter_kit(layer, ctx, &mut avatar)?);
        save_avatar(layer, &avatar);
        for slot in 0..config.combination_slot_count {
            save_slot(layer, &address, slot, &CombinationSlot::default());
        }
        agent.avatars.insert(self.index, address);
        save_agent(layer, &agent_address, &agent);

        info!(agent = %agent_address, avatar = %address, slot = self.index, "avatar created");
        Ok(events)
    }
}

/// Credit the sheet's starter items to a new avatar and mint its starter currency.
fn grant_starter_kit<S: State>(
    layer: &mut Layer<'_, S>,
    ctx: &mut ActionContext<'_>,
    avatar: &mut AvatarState,
) -> Result<Vec<Event>, ActionError> {
    let sheets = ctx.sheets();
    let mut events = Vec::new();
    for starter in sheets.starter_items() {
        let row = sheets.item(starter.item_id).ok_or_else(|| {
            ActionError::invalid("starter_items", format!("unknown item {}", starter.item_id))
        })?;
        ledger::grant_item(
            &mut avatar.inventory,
            row.kind,
            starter.item_id,
            starter.count,
            &mut ctx.random,
        )?;
        events.push(Event::ItemMinted {
            avatar: avatar.address,
            item_id: starter.item_id,
            count: starter.count,
        });
    }
    for grant in sheets.starter_assets() {
        let recipient = match grant.target {
            StarterTarget::Agent => avatar.profile.agent,
            StarterTarget::Avatar => avatar.address,
        };
        ledger::mint(layer, &recipient, &grant.currency, grant.amount)?;
        events.push(Event::AssetMinted {
            recipient,
            currency: grant.currency.clone(),
            amount: grant.amount,
        });
    }
    Ok(events)
}

impl Handler for ChargeActionPoint {
    const COST: u64 = 1;

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let config = ctx.config();
        let mut avatar = load_owned_avatar(layer, &ctx.signer, &self.avatar)?;
        if avatar.profile.action_point >= config.action_point_max {
            return Err(ActionError::ActionPointFull);
        }
        ledger::remove_fungible_item(&mut avatar.inventory, config.ap_stone_item_id, 1)?;
        avatar.profile.action_point = config.action_point_max;
        save_avatar(layer, &avatar);

        Ok(vec![Event::ActionPointCharged {
            avatar: self.avatar,
            action_point: avatar.profile.action_point,
        }])
    }
}
