use std::str::FromStr;

use anyhow::{Context, Result};
use argh::FromArgs;
use everscale_crypto::ed25519;
use ton_block::Serializable;

use super::CliContext;
use crate::config::StoredKeys;
use crate::multisig::{self, MultisigOrder, OrderParams};
use crate::util::*;

#[derive(FromArgs)]
/// Multisig order utils
#[argh(subcommand, name = "order")]
pub struct Cmd {
    #[argh(subcommand)]
    subcommand: SubCmd,
}

impl Cmd {
    pub fn run(self, ctx: CliContext) -> Result<()> {
        match self.subcommand {
            SubCmd::New(cmd) => cmd.run(ctx),
            SubCmd::Sign(cmd) => cmd.run(ctx),
            SubCmd::Merge(cmd) => cmd.run(),
            SubCmd::Show(cmd) => cmd.run(),
            SubCmd::Body(cmd) => cmd.run(ctx),
        }
    }
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCmd {
    New(CmdNew),
    Sign(CmdSign),
    Merge(CmdMerge),
    Show(CmdShow),
    Body(CmdBody),
}

#[derive(FromArgs)]
/// Creates an unsigned order from action payloads
#[argh(subcommand, name = "new")]
struct CmdNew {
    /// action payload BOC (up to three)
    #[argh(option, short = 'p')]
    payload: Vec<String>,

    /// multisig wallet id (from config by default)
    #[argh(option)]
    wallet_id: Option<u32>,

    /// order lifetime in seconds (from config by default)
    #[argh(option)]
    query_offset: Option<u32>,

    /// submitter owner id
    #[argh(option, default = "0")]
    owner: u8,
}

impl CmdNew {
    fn run(self, ctx: CliContext) -> Result<()> {
        let config = ctx.load_config()?;
        let defaults = config.order_params();
        let params = OrderParams {
            wallet_id: self.wallet_id.unwrap_or(defaults.wallet_id),
            query_offset: self.query_offset.unwrap_or(defaults.query_offset),
        };

        let payloads = self
            .payload
            .iter()
            .map(|payload| read_cell(payload))
            .collect::<Result<Vec<_>>>()
            .context("invalid action payload")?;

        let order = MultisigOrder::with_payloads(&payloads, params)?;
        print_output(encode_cell(&order.to_cell(self.owner)?)?);
        Ok(())
    }
}

#[derive(FromArgs)]
/// Adds owner signature to the order
#[argh(subcommand, name = "sign")]
struct CmdSign {
    /// order BOC or path to a file with it
    #[argh(positional)]
    order: String,

    /// owner slot
    #[argh(option, short = 's')]
    slot: u8,

    /// keys file name (in the keys directory) or path
    #[argh(option, short = 'k')]
    keys: String,
}

impl CmdSign {
    fn run(self, ctx: CliContext) -> Result<()> {
        let keys = StoredKeys::load_as_keypair(ctx.dirs().keys_file(&self.keys))?;

        let (owner_id, mut order) = MultisigOrder::from_message(&read_cell(&self.order)?)?;
        order.sign(self.slot, &keys);

        print_output(encode_cell(&order.to_cell(owner_id)?)?);
        Ok(())
    }
}

#[derive(FromArgs)]
/// Merges signatures of several copies of the same order
#[argh(subcommand, name = "merge")]
struct CmdMerge {
    /// order BOCs or paths to files with them
    #[argh(positional)]
    orders: Vec<String>,

    /// submitter owner id
    #[argh(option, short = 'o')]
    owner: u8,
}

impl CmdMerge {
    fn run(self) -> Result<()> {
        let mut orders = self.orders.iter();
        let first = orders
            .next()
            .context("at least one order is required")?;

        let (_, mut merged) = MultisigOrder::from_message(&read_cell(first)?)?;
        for order in orders {
            let (_, order) = MultisigOrder::from_message(&read_cell(order)?)?;
            anyhow::ensure!(
                order.signing_hash() == merged.signing_hash(),
                "orders have different payloads"
            );
            merged.union_signatures(&order);
        }

        print_output(encode_cell(&merged.to_cell(self.owner)?)?);
        Ok(())
    }
}

#[derive(FromArgs)]
/// Prints order details
#[argh(subcommand, name = "show")]
struct CmdShow {
    /// order BOC or path to a file with it
    #[argh(positional)]
    order: String,

    /// owner public key to verify signatures with, as `SLOT:KEY`
    #[argh(option)]
    pubkey: Vec<SlotPublicKey>,
}

impl CmdShow {
    fn run(self) -> Result<()> {
        let message = multisig::OrderMessage::parse(&read_cell(&self.order)?)?;
        let owner_id = message.owner_id;
        let links = message.links.len();
        let order = message.into_order();

        let header = order.header().ok();
        let verify = |slot: u8| {
            self.pubkey
                .iter()
                .find(|key| key.slot == slot)
                .map(|key| order.verify(slot, &key.public_key))
        };

        let signatures = order
            .signatures()
            .map(|(slot, signature)| {
                serde_json::json!({
                    "slot": slot,
                    "signature": hex::encode(signature),
                    "valid": verify(slot),
                })
            })
            .collect::<Vec<_>>();

        let valid_count = order.count_valid(
            self.pubkey
                .iter()
                .map(|key| (key.slot, &key.public_key)),
        );

        print_output(serde_json::to_string_pretty(&serde_json::json!({
            "owner_id": owner_id,
            "hash": hex::encode(order.signing_hash().as_slice()),
            "wallet_id": header.map(|header| header.wallet_id),
            "query_id": header.map(|header| header.query_id.to_string()),
            "expire_at": header.map(|header| header.expire_at()),
            "links": links,
            "signatures": signatures,
            "valid_count": valid_count,
        }))?);
        Ok(())
    }
}

#[derive(FromArgs)]
/// Builds signed external message body for the order
#[argh(subcommand, name = "body")]
struct CmdBody {
    /// order BOC or path to a file with it
    #[argh(positional)]
    order: String,

    /// submitter keys file name (in the keys directory) or path
    #[argh(option, short = 'k')]
    keys: String,

    /// repeat the submitter signature in every link
    #[argh(switch)]
    adversarial: bool,

    /// wrap the body into an external message to this multisig address
    #[argh(option)]
    address: Option<AddressInput>,
}

impl CmdBody {
    fn run(self, ctx: CliContext) -> Result<()> {
        let keys = StoredKeys::load_as_keypair(ctx.dirs().keys_file(&self.keys))?;

        let (owner_id, order) = MultisigOrder::from_message(&read_cell(&self.order)?)?;
        let cell = if self.adversarial {
            order.to_adversarial_cell(owner_id)?
        } else {
            order.to_cell(owner_id)?
        };

        let body = multisig::sign_message_body(&cell, &keys)?;
        let result = match self.address {
            Some(AddressInput(address)) => multisig::external_message(address, body)?
                .serialize()
                .context("failed to serialize message")?,
            None => body,
        };

        print_output(encode_cell(&result)?);
        Ok(())
    }
}

struct SlotPublicKey {
    slot: u8,
    public_key: ed25519::PublicKey,
}

impl FromStr for SlotPublicKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (slot, key) = s
            .split_once(':')
            .context("expected public key as `SLOT:KEY`")?;

        let slot = slot.parse().context("invalid owner slot")?;
        let key: [u8; 32] = parse_hex_or_base64(key)?
            .try_into()
            .map_err(|_| anyhow::Error::msg("invalid public key length"))?;
        let public_key = ed25519::PublicKey::from_bytes(key).context("invalid public key")?;

        Ok(Self { slot, public_key })
    }
}
