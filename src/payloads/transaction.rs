//! Transaction multisig actions

use ton_types::Cell;

use super::*;

pub mod opcodes {
    pub const DEPOSIT: u32 = 0x7d9d71fe;
    pub const RETURN_TON: u32 = 0x243d1d70;
}

#[derive(Debug, Clone)]
pub struct DepositParams {
    pub validator: ton_block::MsgAddressInt,
    /// Validator reward share, `0..=100` with up to two decimals
    pub validator_reward_percent: f64,
    pub max_nominators_count: u16,
    pub min_validator_stake: u128,
    pub min_nominator_stake: u128,
    pub wallet_id: u32,
    pub amount: u128,
}

#[derive(Debug, Clone)]
pub enum TransactionAction {
    /// Sends funds from the financial contract to a nominator pool
    Deposit(DepositParams),
    ReturnTon(ton_block::MsgAddressInt),
}

impl TransactionAction {
    pub fn opcode(&self) -> u32 {
        match self {
            Self::Deposit(_) => opcodes::DEPOSIT,
            Self::ReturnTon(_) => opcodes::RETURN_TON,
        }
    }

    pub fn build(&self) -> Result<Cell, PayloadError> {
        let mut builder = begin_action(self.opcode())?;

        match self {
            Self::Deposit(params) => {
                let percent = params.validator_reward_percent;
                if !(0.0..=100.0).contains(&percent) {
                    return Err(PayloadError::InvalidPercent(percent));
                }

                store_address(&mut builder, &params.validator)?;
                builder
                    .append_u16((percent * 100.0).round() as u16)?
                    .append_u16(params.max_nominators_count)?;
                store_coins(&mut builder, params.min_validator_stake)?;
                store_coins(&mut builder, params.min_nominator_stake)?;
                builder.append_u32(params.wallet_id)?;
                store_coins(&mut builder, params.amount)?;
            }
            Self::ReturnTon(address) => store_address(&mut builder, address)?,
        }

        finish(builder)
    }
}
