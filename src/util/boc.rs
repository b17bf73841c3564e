use std::path::Path;

use anyhow::{Context, Result};
use ton_types::Cell;

use super::parse_hex_or_base64;

/// Decodes a single-root BOC from hex or base64
pub fn parse_cell(data: &str) -> Result<Cell> {
    let bytes = parse_hex_or_base64(data.trim()).context("invalid BOC encoding")?;
    ton_types::deserialize_tree_of_cells(&mut bytes.as_slice()).context("invalid BOC")
}

/// Accepts either an inline BOC or a path to a file with it
pub fn read_cell(input: &str) -> Result<Cell> {
    let path = Path::new(input);
    if path.is_file() {
        let data = std::fs::read_to_string(path).context("failed to read BOC file")?;
        parse_cell(&data)
    } else {
        parse_cell(input)
    }
}

pub fn encode_cell(cell: &Cell) -> Result<String> {
    let bytes = ton_types::serialize_toc(cell).context("failed to serialize cell")?;
    Ok(base64::encode(bytes))
}

#[cfg(test)]
mod tests {
    use ton_types::{BuilderData, IBitstring};

    use super::*;

    #[test]
    fn base64_and_hex_boc() {
        let mut builder = BuilderData::new();
        builder.append_u32(0xdeadbeef).unwrap();
        let cell = builder.into_cell().unwrap();

        let encoded = encode_cell(&cell).unwrap();
        assert_eq!(parse_cell(&encoded).unwrap(), cell);

        let hex = hex::encode(base64::decode(&encoded).unwrap());
        assert_eq!(parse_cell(&hex).unwrap(), cell);
    }
}
