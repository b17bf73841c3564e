pub use self::boc::*;
pub use self::cli::*;

mod boc;
mod cli;
