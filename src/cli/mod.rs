use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;

use crate::config::*;
use crate::dirs::*;

pub mod metadata;
pub mod order;
pub mod payload;
pub mod seed;

/// Multisig order and jetton metadata toolkit
#[derive(FromArgs)]
pub struct App {
    #[argh(subcommand)]
    command: Command,

    /// path to the root directory
    #[argh(option, default = "ProjectDirs::default_root_dir()")]
    root: PathBuf,
}

impl App {
    pub async fn run(self) -> Result<()> {
        tracing::debug!("root dir {:?}", self.root);

        let ctx = CliContext {
            dirs: ProjectDirs::new(self.root),
        };

        match self.command {
            Command::Metadata(cmd) => cmd.run(ctx).await,
            Command::Order(cmd) => cmd.run(ctx),
            Command::Payload(cmd) => cmd.run(),
            Command::Seed(cmd) => cmd.run(ctx),
        }
    }
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Metadata(metadata::Cmd),
    Order(order::Cmd),
    Payload(payload::Cmd),
    Seed(seed::Cmd),
}

pub struct CliContext {
    dirs: ProjectDirs,
}

impl CliContext {
    pub fn load_config(&self) -> Result<AppConfig> {
        AppConfig::load(&self.dirs.app_config)
    }

    pub fn dirs(&self) -> &ProjectDirs {
        &self.dirs
    }
}
