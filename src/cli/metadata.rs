use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;

use super::CliContext;
use crate::content::{self, JettonMetadata, OffchainFetcher};
use crate::util::*;

#[derive(FromArgs)]
/// Jetton metadata utils
#[argh(subcommand, name = "metadata")]
pub struct Cmd {
    #[argh(subcommand)]
    subcommand: SubCmd,
}

impl Cmd {
    pub async fn run(self, ctx: CliContext) -> Result<()> {
        match self.subcommand {
            SubCmd::Build(cmd) => cmd.run(),
            SubCmd::Read(cmd) => cmd.run(ctx).await,
        }
    }
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCmd {
    Build(CmdBuild),
    Read(CmdRead),
}

#[derive(FromArgs)]
/// Builds jetton content cell
#[argh(subcommand, name = "build")]
struct CmdBuild {
    /// path to the JSON object with attributes or empty for input from stdin
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// build off-chain content with the specified uri instead
    #[argh(option)]
    offchain: Option<String>,
}

impl CmdBuild {
    fn run(self) -> Result<()> {
        let cell = match self.offchain {
            Some(uri) => content::build_offchain_metadata(&uri)?,
            None => {
                let data = match self.input {
                    Some(path) => std::fs::read(path).context("failed to read metadata file")?,
                    None => parse_optional_input(None, true)?,
                };

                let mut deserializer = serde_json::Deserializer::from_slice(&data);
                let metadata: JettonMetadata = serde_path_to_error::deserialize(&mut deserializer)
                    .context("failed to parse metadata")?;
                content::build_onchain_metadata(&metadata)?
            }
        };

        print_output(encode_cell(&cell)?);
        Ok(())
    }
}

#[derive(FromArgs)]
/// Decodes jetton content cell, fetching off-chain metadata if needed
#[argh(subcommand, name = "read")]
struct CmdRead {
    /// content BOC in base64 or hex, path to a file with it or empty for input from stdin
    #[argh(positional)]
    boc: Option<String>,
}

impl CmdRead {
    async fn run(self, ctx: CliContext) -> Result<()> {
        let config = ctx.load_config()?;

        let boc = String::from_utf8(parse_optional_input(self.boc, true)?)?;
        let cell = read_cell(boc.trim())?;

        let fetcher = OffchainFetcher::new(&config.ipfs_gateway, config.fetch_timeout)
            .context("failed to build http client")?;
        let content = content::read_metadata(&cell, &fetcher).await?;

        print_output(serde_json::to_string_pretty(&content)?);
        Ok(())
    }
}
