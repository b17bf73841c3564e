use ton_block::Serializable;
use ton_types::{BuilderData, Cell, IBitstring};

pub use self::admin::AdminAction;
pub use self::transaction::{DepositParams, TransactionAction};

use crate::content::ContentError;

pub mod admin;
pub mod transaction;

/// Nano-units in one TON
pub const ONE_TON: u128 = 1_000_000_000;

fn begin_action(opcode: u32) -> Result<BuilderData, PayloadError> {
    let mut builder = BuilderData::new();
    builder.append_u32(opcode)?;
    Ok(builder)
}

fn store_address(
    builder: &mut BuilderData,
    address: &ton_block::MsgAddressInt,
) -> Result<(), PayloadError> {
    address.write_to(builder)?;
    Ok(())
}

fn store_coins(builder: &mut BuilderData, amount: u128) -> Result<(), PayloadError> {
    ton_block::Grams(amount).write_to(builder)?;
    Ok(())
}

fn finish(builder: BuilderData) -> Result<Cell, PayloadError> {
    Ok(builder.into_cell()?)
}

#[derive(thiserror::Error, Debug)]
pub enum PayloadError {
    #[error("invalid percentage: {0}")]
    InvalidPercent(f64),
    #[error("invalid content")]
    Content(#[from] ContentError),
    #[error("invalid cell: {0}")]
    Cell(anyhow::Error),
}

impl From<anyhow::Error> for PayloadError {
    fn from(e: anyhow::Error) -> Self {
        Self::Cell(e)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::str::FromStr;

    use ton_types::SliceData;

    pub fn test_address(last: u8) -> ton_block::MsgAddressInt {
        ton_block::MsgAddressInt::from_str(&format!("0:{}{last:02x}", "00".repeat(31))).unwrap()
    }

    pub fn read_address(slice: &mut SliceData) -> ton_block::MsgAddressInt {
        use ton_block::Deserializable;
        ton_block::MsgAddressInt::construct_from(slice).unwrap()
    }

    pub fn read_coins(slice: &mut SliceData) -> u128 {
        use ton_block::Deserializable;
        ton_block::Grams::construct_from(slice).unwrap().0
    }
}
