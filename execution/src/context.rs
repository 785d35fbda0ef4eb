use crate::{error::ActionError, random::ActionRandom, simulator::Simulator};
use worldline_types::{address::Address, GameConfig, TableSheets};

/// Read-only collaborators shared by every action in a block.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub config: &'a GameConfig,
    pub sheets: &'a TableSheets,
    pub simulator: &'a dyn Simulator,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        config: &'a GameConfig,
        sheets: &'a TableSheets,
        simulator: &'a dyn Simulator,
    ) -> Self {
        Self {
            config,
            sheets,
            simulator,
        }
    }
}

/// Per-action gas budget. Costs are fixed per action type and charged on entry, before
/// the input is validated or any state is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn charge(&mut self, amount: u64) -> Result<(), ActionError> {
        let required = self.used.saturating_add(amount);
        if required > self.limit {
            return Err(ActionError::OutOfGas {
                limit: self.limit,
                required,
            });
        }
        self.used = required;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }
}

/// Everything a handler knows about the action it is executing.
pub struct ActionContext<'a> {
    pub env: ExecutionContext<'a>,
    pub block_index: u64,
    pub action_index: u32,
    pub signer: Address,
    pub random: ActionRandom,
}

impl<'a> ActionContext<'a> {
    pub fn config(&self) -> &'a GameConfig {
        self.env.config
    }

    pub fn sheets(&self) -> &'a TableSheets {
        self.env.sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_meter_rejects_over_budget() {
        let mut gas = GasMeter::new(3);
        gas.charge(2).unwrap();
        assert_eq!(
            gas.charge(2),
            Err(ActionError::OutOfGas {
                limit: 3,
                required: 4
            })
        );
        assert_eq!(gas.used(), 2);
        gas.charge(1).unwrap();
        assert_eq!(gas.used(), 3);
    }
}
