use anyhow::{Context, Result};
use argh::FromArgs;
use everscale_crypto::ed25519;

use super::CliContext;
use crate::config::StoredKeys;
use crate::crypto::{self, MnemonicType};
use crate::util::*;

#[derive(FromArgs)]
/// Seed utils
#[argh(subcommand, name = "seed")]
pub struct Cmd {
    #[argh(subcommand)]
    subcommand: SubCmd,
}

impl Cmd {
    pub fn run(self, ctx: CliContext) -> Result<()> {
        match self.subcommand {
            SubCmd::Generate(cmd) => cmd.run(ctx),
            SubCmd::Derive(cmd) => cmd.run(),
            SubCmd::Pubkey(cmd) => cmd.run(),
        }
    }
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCmd {
    Generate(CmdGenerate),
    Derive(CmdDerive),
    Pubkey(CmdPubkey),
}

#[derive(Debug, PartialEq, FromArgs)]
/// Generates new seed
#[argh(subcommand, name = "generate")]
struct CmdGenerate {
    /// mnemonic type
    #[argh(option, long = "type", short = 't', default = "MnemonicType::Legacy")]
    ty: MnemonicType,

    /// store signer keys derived from the new seed into the keys directory
    #[argh(option)]
    save: Option<String>,
}

impl CmdGenerate {
    fn run(self, ctx: CliContext) -> Result<()> {
        let Some(name) = self.save else {
            print_output(crypto::generate_seed(self.ty));
            return Ok(());
        };

        anyhow::ensure!(
            self.ty == StoredKeys::DEFAULT_MNEMONIC_TYPE,
            "only legacy seeds can be stored"
        );

        let keys = StoredKeys::generate()?;
        let path = ctx.dirs().keys_file(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("failed to create keys directory")?;
        }
        keys.store(&path)?;

        tracing::info!(path = %path.display(), "signer keys saved");
        print_output(serde_json::json!({
            "public": keys.public.map(hex::encode),
            "path": path.display().to_string(),
        }));
        Ok(())
    }
}

#[derive(Debug, PartialEq, FromArgs)]
/// Derives key from seed
#[argh(subcommand, name = "derive")]
struct CmdDerive {
    /// mnemonic type
    #[argh(option, long = "type", short = 't', default = "MnemonicType::Legacy")]
    ty: MnemonicType,

    /// seed phrase or empty for input from stdin
    #[argh(positional)]
    seed: Option<String>,

    /// derivation path for bip39 mnemonic
    #[argh(option, short = 'p')]
    path: Option<String>,

    /// encode keys in base64 (hex by default)
    #[argh(switch)]
    base64: bool,
}

impl CmdDerive {
    fn run(self) -> Result<()> {
        let seed = parse_optional_input(self.seed, true)?;
        let seed = String::from_utf8(seed)?;

        let path = if let Some(path) = &self.path {
            path.as_str()
        } else {
            crypto::DEFAULT_PATH
        };

        let secret = crypto::derive_secret_from_phrase(seed.trim(), self.ty, path)?;

        print_output(encode_key_pair(&secret, self.base64));
        Ok(())
    }
}

#[derive(Debug, PartialEq, FromArgs)]
/// Computes public key from secret key
#[argh(subcommand, name = "pubkey")]
struct CmdPubkey {
    /// secret key in hex or empty for input from stdin
    #[argh(positional)]
    secret: Option<String>,

    /// encode keys in base64 (hex by default)
    #[argh(switch)]
    base64: bool,
}

impl CmdPubkey {
    fn run(self) -> Result<()> {
        let secret = match self.secret {
            Some(secret) => parse_hex_or_base64(secret.trim())?,
            None => {
                let input = String::from_utf8(parse_optional_input(None, true)?)?;
                parse_hex_or_base64(input.trim())?
            }
        };
        let secret: [u8; 32] = secret
            .try_into()
            .map_err(|_| anyhow::Error::msg("invalid secret key length"))?;

        let secret = ed25519::SecretKey::from_bytes(secret);
        print_output(encode_key_pair(&secret, self.base64));
        Ok(())
    }
}

fn encode_key_pair(secret: &ed25519::SecretKey, base64: bool) -> serde_json::Value {
    let public = ed25519::PublicKey::from(secret);

    let encode = |bytes: &[u8; 32]| -> String {
        if base64 {
            base64::encode(bytes)
        } else {
            hex::encode(bytes)
        }
    };

    serde_json::json!({
        "secret": encode(secret.as_bytes()),
        "public": encode(public.as_bytes()),
    })
}
