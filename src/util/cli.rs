use std::io::{Read, Write};
use std::str::FromStr;

use anyhow::{Context, Result};

#[derive(Clone)]
pub struct AddressInput(pub ton_block::MsgAddressInt);

impl std::fmt::Display for AddressInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AddressInput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ton_block::MsgAddressInt::from_str(s.trim())
            .map(Self)
            .map_err(|_| anyhow::Error::msg("invalid address"))
    }
}

/// Decimal token amount, parsed into nano-units
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Tokens(pub u128);

impl std::fmt::Display for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let int = self.0 / 1000000000;
        let mut frac = self.0 % 1000000000;

        int.fmt(f)?;
        if frac > 0 {
            let mut width = 9;
            while frac % 10 == 0 {
                frac /= 10;
                width -= 1;
            }
            f.write_fmt(format_args!(".{frac:0width$}"))?;
        }
        Ok(())
    }
}

impl FromStr for Tokens {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || anyhow::Error::msg("invalid token amount");

        let (int, frac) = match s.trim().split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (s.trim(), ""),
        };
        if int.is_empty() || frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let int = int.parse::<u128>().map_err(|_| invalid())?;
        let frac = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<9}").parse::<u128>().map_err(|_| invalid())?
        };

        int.checked_mul(1000000000)
            .and_then(|int| int.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

pub fn parse_optional_input(data: Option<String>, raw: bool) -> Result<Vec<u8>> {
    match data {
        Some(data) if raw => Ok(data.into()),
        Some(data) => parse_hex_or_base64(&data),
        None => {
            let mut data = Vec::new();
            std::io::stdin()
                .read_to_end(&mut data)
                .context("failed to read from stdin")?;
            Ok(data)
        }
    }
}

pub fn parse_hex_or_base64(data: &str) -> Result<Vec<u8>> {
    if let Some(hash) = data.strip_prefix("0x") {
        hex::decode(hash).map_err(From::from)
    } else {
        match hex::decode(data) {
            Ok(bytes) => Ok(bytes),
            Err(e) => match base64::decode(data) {
                Ok(bytes) => Ok(bytes),
                _ => Err(e.into()),
            },
        }
    }
}

pub fn print_output<T: std::fmt::Display>(arg: T) {
    let _ = if is_terminal() {
        writeln!(std::io::stdout(), "{arg:#}")
    } else {
        write!(std::io::stdout(), "{arg}")
    };
}

pub fn print_error(text: impl std::fmt::Display) {
    if is_terminal() {
        eprintln!("{}", console::style(format!("✘ {text}")).red().bold());
    } else {
        eprintln!("Error: {text}");
    }
}

pub fn is_terminal() -> bool {
    use once_cell::race::OnceBox;

    static IS_TERMINAL: OnceBox<bool> = OnceBox::new();
    *IS_TERMINAL.get_or_init(|| Box::new(console::user_attended()))
}
