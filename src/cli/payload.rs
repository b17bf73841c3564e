use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;

use crate::content::JettonMetadata;
use crate::payloads::{AdminAction, DepositParams, TransactionAction};
use crate::util::*;

#[derive(FromArgs)]
/// Builds multisig action payloads
#[argh(subcommand, name = "payload")]
pub struct Cmd {
    #[argh(subcommand)]
    subcommand: SubCmd,
}

impl Cmd {
    pub fn run(self) -> Result<()> {
        let cell = match self.subcommand {
            SubCmd::Admin(cmd) => cmd.into_action()?.build()?,
            SubCmd::Deposit(cmd) => cmd.into_action().build()?,
            SubCmd::ReturnTon(cmd) => TransactionAction::ReturnTon(cmd.address.0).build()?,
        };

        print_output(encode_cell(&cell)?);
        Ok(())
    }
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCmd {
    Admin(CmdAdmin),
    Deposit(CmdDeposit),
    ReturnTon(CmdReturnTon),
}

#[derive(FromArgs)]
/// Admin multisig action
#[argh(subcommand, name = "admin")]
struct CmdAdmin {
    /// action name (e.g. `change-content`, `cancel-changing-content`, `send-commission`)
    #[argh(positional)]
    action: String,

    /// target address for address actions
    #[argh(option)]
    address: Option<AddressInput>,

    /// path to the JSON object with jetton attributes
    #[argh(option)]
    content: Option<PathBuf>,

    /// new commission factor
    #[argh(option)]
    factor: Option<u16>,

    /// new financial contract code BOC or path to a file with it
    #[argh(option)]
    code: Option<String>,

    /// jetton wallet address for `transfer-jetton`
    #[argh(option)]
    jetton_wallet: Option<AddressInput>,

    /// jetton amount for `transfer-jetton`
    #[argh(option)]
    amount: Option<Tokens>,
}

impl CmdAdmin {
    fn into_action(self) -> Result<AdminAction> {
        let address = || {
            self.address
                .clone()
                .map(|AddressInput(address)| address)
                .context("`--address` is required")
        };

        Ok(match self.action.as_str() {
            "change-admin-multisig" => AdminAction::ChangeAdminMultisig(address()?),
            "cancel-changing-admin-multisig" => AdminAction::CancelChangingAdminMultisig,
            "change-transaction-multisig" => AdminAction::ChangeTransactionMultisig(address()?),
            "cancel-changing-transaction-multisig" => {
                AdminAction::CancelChangingTransactionMultisig
            }
            "change-content" => {
                let path = self.content.as_ref().context("`--content` is required")?;
                let data = std::fs::read(path).context("failed to read metadata file")?;
                let mut deserializer = serde_json::Deserializer::from_slice(&data);
                let metadata: JettonMetadata = serde_path_to_error::deserialize(&mut deserializer)
                    .context("failed to parse metadata")?;
                AdminAction::ChangeContent(metadata)
            }
            "cancel-changing-content" => AdminAction::CancelChangingContent,
            "change-commission-factor" => AdminAction::ChangeCommissionFactor(
                self.factor.context("`--factor` is required")?,
            ),
            "cancel-changing-commission-factor" => AdminAction::CancelChangingCommissionFactor,
            "change-commission-address" => AdminAction::ChangeCommissionAddress(address()?),
            "cancel-changing-commission-address" => AdminAction::CancelChangingCommissionAddress,
            "change-financial-code" => {
                let code = self.code.as_deref().context("`--code` is required")?;
                AdminAction::ChangeFinancialCode(read_cell(code)?)
            }
            "cancel-changing-financial-code" => AdminAction::CancelChangingFinancialCode,
            "send-commission" => AdminAction::SendCommission,
            "transfer-jetton" => AdminAction::TransferJetton {
                jetton_wallet: self
                    .jetton_wallet
                    .clone()
                    .context("`--jetton-wallet` is required")?
                    .0,
                destination: address()?,
                amount: self.amount.context("`--amount` is required")?.0,
            },
            "return-ton" => AdminAction::ReturnTon(address()?),
            other => anyhow::bail!("unknown admin action `{other}`"),
        })
    }
}

#[derive(FromArgs)]
/// Transaction multisig deposit to a nominator pool
#[argh(subcommand, name = "deposit")]
struct CmdDeposit {
    /// validator address
    #[argh(option)]
    validator: AddressInput,

    /// validator reward share in percents
    #[argh(option)]
    percent: f64,

    /// max nominators count
    #[argh(option)]
    max_nominators: u16,

    /// min validator stake in tokens
    #[argh(option)]
    min_validator_stake: Tokens,

    /// min nominator stake in tokens
    #[argh(option)]
    min_nominator_stake: Tokens,

    /// nominator pool wallet id
    #[argh(option)]
    wallet_id: u32,

    /// deposit amount in tokens
    #[argh(option)]
    amount: Tokens,
}

impl CmdDeposit {
    fn into_action(self) -> TransactionAction {
        TransactionAction::Deposit(DepositParams {
            validator: self.validator.0,
            validator_reward_percent: self.percent,
            max_nominators_count: self.max_nominators,
            min_validator_stake: self.min_validator_stake.0,
            min_nominator_stake: self.min_nominator_stake.0,
            wallet_id: self.wallet_id,
            amount: self.amount.0,
        })
    }
}

#[derive(FromArgs)]
/// Transaction multisig request to return TON
#[argh(subcommand, name = "return-ton")]
struct CmdReturnTon {
    /// destination address
    #[argh(positional)]
    address: AddressInput,
}
