//! Time-locked resources.
//!
//! Locks are evaluated, never polled: whether a slot or stake is ready is a predicate over
//! the current block index, computed at read time by whichever action asks.

use worldline_types::entity::{CraftJob, StakeRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lock {
    pub start_block: u64,
    pub unlock_block: u64,
}

/// Lock starting at `start` and lasting `duration` blocks.
pub fn schedule(start: u64, duration: u64) -> Lock {
    Lock {
        start_block: start,
        unlock_block: start.saturating_add(duration),
    }
}

pub fn is_ready(lock: &Lock, current: u64) -> bool {
    current >= lock.unlock_block
}

pub fn blocks_remaining(lock: &Lock, current: u64) -> u64 {
    lock.unlock_block.saturating_sub(current)
}

impl From<&CraftJob> for Lock {
    fn from(job: &CraftJob) -> Self {
        Self {
            start_block: job.start_block,
            unlock_block: job.unlock_block,
        }
    }
}

pub fn is_claimable(record: &StakeRecord, current: u64, reward_interval: u64) -> bool {
    !record.is_closed() && current >= record.reward_anchor().saturating_add(reward_interval)
}

pub fn is_cancellable(record: &StakeRecord, current: u64) -> bool {
    current >= record.cancellable_block
}

/// Whole reward intervals accrued since the last claim, counting only up to the
/// cancellable block.
pub fn reward_steps(record: &StakeRecord, current: u64, reward_interval: u64) -> u64 {
    if reward_interval == 0 || record.is_closed() {
        return 0;
    }
    let end = current.min(record.cancellable_block);
    end.saturating_sub(record.reward_anchor()) / reward_interval
}
