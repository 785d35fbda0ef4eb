use std::collections::{BTreeMap, BTreeSet};

use rand::RngCore;
use tracing::info;
use worldline_types::{
    action::{IssueCoupons, RedeemCoupon, MAX_COUPONS_PER_ISSUE},
    entity::{AvatarProfile, Coupon, CouponId, CouponWallet, MAX_ENTRIES},
    Event, Versioned,
};

use super::{Handler, Layer, MissingState};
use crate::{
    accounts::{load_avatar, load_wallet, save_avatar, save_wallet},
    context::ActionContext,
    error::ActionError,
    ledger,
    store::State,
};

impl Handler for IssueCoupons {
    const COST: u64 = 2;

    fn validate(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        if !ctx.config().minters.contains(&ctx.signer) {
            return Err(ActionError::PermissionDenied { signer: ctx.signer });
        }
        if self.count == 0 || self.count > MAX_COUPONS_PER_ISSUE {
            return Err(ActionError::invalid(
                "count",
                format!("must be in 1..={MAX_COUPONS_PER_ISSUE}"),
            ));
        }
        if self.rewards.is_empty() {
            return Err(ActionError::invalid("rewards", "nothing to grant"));
        }
        let mut seen = BTreeSet::new();
        for (item_id, quantity) in &self.rewards {
            if *quantity == 0 {
                return Err(ActionError::invalid("rewards", "zero quantity"));
            }
            if !seen.insert(*item_id) {
                return Err(ActionError::invalid("rewards", format!("duplicate item {item_id}")));
            }
            if ctx.sheets().item(*item_id).is_none() {
                return Err(ActionError::invalid("rewards", format!("unknown item {item_id}")));
            }
        }
        Ok(())
    }

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let mut wallet = load_wallet(layer, &self.recipient)?;
        if wallet.len() + self.count as usize > MAX_ENTRIES {
            return Err(ActionError::invalid(
                "count",
                format!("wallet holds {} coupons", wallet.len()),
            ));
        }

        let rewards: BTreeMap<_, _> = self.rewards.iter().copied().collect();
        let mut issued = Vec::with_capacity(self.count as usize);
        while issued.len() < self.count as usize {
            let mut bytes = [0u8; 16];
            ctx.random.fill_bytes(&mut bytes);
            let coupon = Coupon {
                id: CouponId(bytes),
                rewards: rewards.clone(),
            };
            if wallet.insert(coupon) {
                issued.push(CouponId(bytes));
            }
        }
        save_wallet(layer, &self.recipient, &wallet);

        info!(
            minter = %ctx.signer,
            recipient = %self.recipient,
            count = self.count,
            "coupons issued"
        );
        Ok(vec![Event::CouponsIssued {
            recipient: self.recipient,
            coupons: issued,
        }])
    }
}

impl Handler for RedeemCoupon {
    const COST: u64 = 1;
    const MISSING_STATE: MissingState = MissingState::Tolerate;

    fn execute<S: State>(
        &self,
        layer: &mut Layer<'_, S>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<Event>, ActionError> {
        let mut avatar = load_avatar(layer, &self.avatar)?
            .ok_or_else(|| ActionError::not_found(AvatarProfile::KIND, self.avatar))?;
        if avatar.profile.agent != ctx.signer {
            return Err(ActionError::PermissionDenied { signer: ctx.signer });
        }
        let mut wallet = load_wallet(layer, &ctx.signer)?;
        let coupon = wallet
            .take(&self.coupon_id)
            .ok_or_else(|| ActionError::not_found(CouponWallet::KIND, ctx.signer))?;

        for (item_id, quantity) in &coupon.rewards {
            let row = ctx.sheets().item(*item_id).ok_or_else(|| {
                ActionError::invalid("coupon_id", format!("unknown reward item {item_id}"))
            })?;
            ledger::grant_item(
                &mut avatar.inventory,
                row.kind,
                *item_id,
                *quantity as u64,
                &mut ctx.random,
            )?;
        }
        save_avatar(layer, &avatar);
        save_wallet(layer, &ctx.signer, &wallet);

        Ok(vec![Event::CouponRedeemed {
            agent: ctx.signer,
            avatar: self.avatar,
            coupon_id: self.coupon_id,
        }])
    }
}
