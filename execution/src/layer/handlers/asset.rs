use tracing::info;
use worldline_types::{
    action::{MintAssets, MintSpec, TransferAsset},
    entity::AvatarProfile,
    sheet::ItemKind,
    Event, Versioned,
};

use super::{Handler, Layer};
use crate::{
    accounts::{load_avatar, save_avatar},
    context::ActionContext,
    error::ActionError,
    ledger,
    store::State,
};

impl Handler for TransferAsset {
    const COST: u64 = 1;

    fn validate(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        if self.amount == 0 {
            return Err(ActionError::invalid("amount", "must be positive"));
        }
        if self.recipient == ctx.signer {
            return Err(ActionError::invalid("recipient", "sender and recipient are the same"));
        }
        Ok(())
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        ledger::transfer(layer, &ctx.signer, &self.recipient, &self.currency, self.amount)?;
        Ok(vec![Event::AssetTransferred {
            sender: ctx.signer,
            recipient: self.recipient,
            currency: self.currency.clone(),
            amount: self.amount,
            memo: self.memo.clone(),
        }])
    }
}

impl Handler for MintAssets {
    const COST: u64 = 2;

    fn validate(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        if !ctx.config().minters.contains(&ctx.signer) {
            return Err(ActionError::PermissionDenied { signer: ctx.signer });
        }
        if self.specs.is_empty() {
            return Err(ActionError::invalid("specs", "nothing to mint"));
        }
        for spec in &self.specs {
            let amount = match spec {
                MintSpec::Asset { amount, .. } => *amount,
                MintSpec::Item { count, .. } => *count,
            };
            if amount == 0 {
                return Err(ActionError::invalid("specs", "zero amount"));
            }
        }
        Ok(())
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let mut events = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            match spec {
                MintSpec::Asset {
                    recipient,
                    currency,
                    amount,
                } => {
                    ledger::mint(layer, recipient, currency, *amount)?;
                    events.push(Event::AssetMinted {
                        recipient: *recipient,
                        currency: currency.clone(),
                        amount: *amount,
                    });
                }
                MintSpec::Item {
                    recipient,
                    item_id,
                    count,
                } => {
                    match ctx.sheets().item(*item_id) {
                        Some(row) if row.kind == ItemKind::Material => {}
                        _ => {
                            return Err(ActionError::invalid(
                                "item_id",
                                format!("{item_id} is not a mintable material"),
                            ))
                        }
                    }
                    let mut avatar = load_avatar(layer, recipient)?
                        .ok_or_else(|| ActionError::not_found(AvatarProfile::KIND, *recipient))?;
                    ledger::add_fungible_item(&mut avatar.inventory, *item_id, *count)?;
                    save_avatar(layer, &avatar);
                    events.push(Event::ItemMinted {
                        avatar: *recipient,
                        item_id: *item_id,
                        count: *count,
                    });
                }
            }
        }

        info!(
            minter = %ctx.signer,
            specs = self.specs.len(),
            memo = self.memo.as_deref().unwrap_or_default(),
            "privileged mint"
        );
        Ok(events)
    }
}
