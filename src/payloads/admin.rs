//! Admin multisig actions

use ton_types::Cell;

use super::*;
use crate::content::{build_onchain_metadata, JettonMetadata};

pub mod opcodes {
    pub const CHANGE_ADMIN_MULTISIG: u32 = 0x01345e3e;
    pub const CANCEL_CHANGING_ADMIN_MULTISIG: u32 = 0x069dd9cb;
    pub const CHANGE_TRANSACTION_MULTISIG: u32 = 0x5fb0ba98;
    pub const CANCEL_CHANGING_TRANSACTION_MULTISIG: u32 = 0x75f23ec3;
    pub const CHANGE_CONTENT: u32 = 0x34d22003;
    pub const CANCEL_CHANGING_CONTENT: u32 = 0x47a4e755;
    pub const CHANGE_COMMISSION_FACTOR: u32 = 0x7ea2bdae;
    pub const CANCEL_CHANGING_COMMISSION_FACTOR: u32 = 0x2357a2f4;
    pub const CHANGE_COMMISSION_ADDRESS: u32 = 0x65cecbcc;
    pub const CANCEL_CHANGING_COMMISSION_ADDRESS: u32 = 0x69fc24e6;
    pub const CHANGE_FINANCIAL_CODE: u32 = 0x60ef7f7b;
    pub const CANCEL_CHANGING_FINANCIAL_CODE: u32 = 0x03f21bfc;
    pub const SEND_COMMISSION: u32 = 0x43deb294;
    pub const TRANSFER_JETTON: u32 = 0x384a37da;
    pub const RETURN_TON: u32 = 0x054fa365;
}

#[derive(Debug, Clone)]
pub enum AdminAction {
    ChangeAdminMultisig(ton_block::MsgAddressInt),
    CancelChangingAdminMultisig,
    ChangeTransactionMultisig(ton_block::MsgAddressInt),
    CancelChangingTransactionMultisig,
    ChangeContent(JettonMetadata),
    CancelChangingContent,
    ChangeCommissionFactor(u16),
    CancelChangingCommissionFactor,
    ChangeCommissionAddress(ton_block::MsgAddressInt),
    CancelChangingCommissionAddress,
    ChangeFinancialCode(Cell),
    CancelChangingFinancialCode,
    SendCommission,
    TransferJetton {
        jetton_wallet: ton_block::MsgAddressInt,
        destination: ton_block::MsgAddressInt,
        /// Amount in nano-units
        amount: u128,
    },
    ReturnTon(ton_block::MsgAddressInt),
}

impl AdminAction {
    pub fn opcode(&self) -> u32 {
        use opcodes::*;

        match self {
            Self::ChangeAdminMultisig(_) => CHANGE_ADMIN_MULTISIG,
            Self::CancelChangingAdminMultisig => CANCEL_CHANGING_ADMIN_MULTISIG,
            Self::ChangeTransactionMultisig(_) => CHANGE_TRANSACTION_MULTISIG,
            Self::CancelChangingTransactionMultisig => CANCEL_CHANGING_TRANSACTION_MULTISIG,
            Self::ChangeContent(_) => CHANGE_CONTENT,
            Self::CancelChangingContent => CANCEL_CHANGING_CONTENT,
            Self::ChangeCommissionFactor(_) => CHANGE_COMMISSION_FACTOR,
            Self::CancelChangingCommissionFactor => CANCEL_CHANGING_COMMISSION_FACTOR,
            Self::ChangeCommissionAddress(_) => CHANGE_COMMISSION_ADDRESS,
            Self::CancelChangingCommissionAddress => CANCEL_CHANGING_COMMISSION_ADDRESS,
            Self::ChangeFinancialCode(_) => CHANGE_FINANCIAL_CODE,
            Self::CancelChangingFinancialCode => CANCEL_CHANGING_FINANCIAL_CODE,
            Self::SendCommission => SEND_COMMISSION,
            Self::TransferJetton { .. } => TRANSFER_JETTON,
            Self::ReturnTon(_) => RETURN_TON,
        }
    }

    pub fn build(&self) -> Result<Cell, PayloadError> {
        let mut builder = begin_action(self.opcode())?;

        match self {
            Self::ChangeAdminMultisig(address)
            | Self::ChangeTransactionMultisig(address)
            | Self::ChangeCommissionAddress(address)
            | Self::ReturnTon(address) => store_address(&mut builder, address)?,
            Self::ChangeContent(metadata) => {
                builder.checked_append_reference(build_onchain_metadata(metadata)?)?;
            }
            Self::ChangeCommissionFactor(factor) => {
                builder.append_u16(*factor)?;
            }
            Self::ChangeFinancialCode(code) => {
                builder.checked_append_reference(code.clone())?;
            }
            Self::TransferJetton {
                jetton_wallet,
                destination,
                amount,
            } => {
                store_address(&mut builder, jetton_wallet)?;
                store_address(&mut builder, destination)?;
                store_coins(&mut builder, *amount)?;
            }
            Self::CancelChangingAdminMultisig
            | Self::CancelChangingTransactionMultisig
            | Self::CancelChangingContent
            | Self::CancelChangingCommissionFactor
            | Self::CancelChangingCommissionAddress
            | Self::CancelChangingFinancialCode
            | Self::SendCommission => {}
        }

        finish(builder)
    }
}

#[cfg(test)]
mod tests {
    use ton_types::SliceData;

    use super::*;
    use crate::content::{MetadataKey, StoredContent};
    use crate::payloads::tests::*;

    #[test]
    fn cancel_actions_are_opcode_only() {
        let cell = AdminAction::CancelChangingContent.build().unwrap();
        assert_eq!(cell.bit_length(), 32);
        assert_eq!(cell.references_count(), 0);

        let mut slice = SliceData::load_cell(cell).unwrap();
        assert_eq!(
            slice.get_next_u32().unwrap(),
            opcodes::CANCEL_CHANGING_CONTENT
        );
    }

    #[test]
    fn change_content_embeds_metadata() {
        let metadata = JettonMetadata::new()
            .with(MetadataKey::Name, "bemo")
            .with(MetadataKey::Symbol, "stTON");
        let cell = AdminAction::ChangeContent(metadata.clone())
            .build()
            .unwrap();

        let mut slice = SliceData::load_cell(cell).unwrap();
        assert_eq!(slice.get_next_u32().unwrap(), opcodes::CHANGE_CONTENT);

        let content = slice.checked_drain_reference().unwrap();
        assert_eq!(
            StoredContent::decode(&content).unwrap(),
            StoredContent::Onchain {
                metadata,
                is_faulty: false
            }
        );
    }

    #[test]
    fn transfer_jetton_layout() {
        let cell = AdminAction::TransferJetton {
            jetton_wallet: test_address(1),
            destination: test_address(2),
            amount: 15 * ONE_TON,
        }
        .build()
        .unwrap();

        let mut slice = SliceData::load_cell(cell).unwrap();
        assert_eq!(slice.get_next_u32().unwrap(), opcodes::TRANSFER_JETTON);
        assert_eq!(read_address(&mut slice), test_address(1));
        assert_eq!(read_address(&mut slice), test_address(2));
        assert_eq!(read_coins(&mut slice), 15 * ONE_TON);
        assert_eq!(slice.remaining_bits(), 0);
    }

    #[test]
    fn commission_factor_layout() {
        let cell = AdminAction::ChangeCommissionFactor(1000).build().unwrap();
        let mut slice = SliceData::load_cell(cell).unwrap();
        assert_eq!(
            slice.get_next_u32().unwrap(),
            opcodes::CHANGE_COMMISSION_FACTOR
        );
        assert_eq!(slice.get_next_u16().unwrap(), 1000);
    }
}
