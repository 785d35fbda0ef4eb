use crate::{
    address::Address,
    entity::{CouponId, InstanceId, ItemId},
    key::Currency,
};

/// Observable effect of a committed action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    AvatarCreated {
        agent: Address,
        avatar: Address,
        slot: u8,
        name: String,
    },
    AssetTransferred {
        sender: Address,
        recipient: Address,
        currency: Currency,
        amount: u64,
        memo: Option<String>,
    },
    AssetMinted {
        recipient: Address,
        currency: Currency,
        amount: u64,
    },
    ItemMinted {
        avatar: Address,
        item_id: ItemId,
        count: u64,
    },
    CombinationStarted {
        avatar: Address,
        slot: u8,
        recipe_id: u32,
        instance_id: InstanceId,
        unlock_block: u64,
    },
    CombinationRushed {
        avatar: Address,
        slot: u8,
        hourglasses: u64,
    },
    CombinationSettled {
        avatar: Address,
        slot: u8,
        instance_id: InstanceId,
        item_id: ItemId,
    },
    BattleFinished {
        avatar: Address,
        stage_id: u32,
        cleared: bool,
        exp: u64,
        log: Vec<String>,
    },
    ActionPointCharged {
        avatar: Address,
        action_point: u32,
    },
    Staked {
        agent: Address,
        amount: u64,
        cancellable_block: u64,
    },
    StakeRewardClaimed {
        agent: Address,
        avatar: Address,
        level: u32,
        steps: u64,
    },
    StakeCancelled {
        agent: Address,
        amount: u64,
    },
    CouponsIssued {
        recipient: Address,
        coupons: Vec<CouponId>,
    },
    CouponRedeemed {
        agent: Address,
        avatar: Address,
        coupon_id: CouponId,
    },
}
