use anyhow::Result;
use everscale_crypto::ed25519;
use tiny_hderive::bip32::ExtendedPrivKey;

use super::LANGUAGE;

pub fn validate_phrase(phrase: &str) -> Result<()> {
    bip39::Mnemonic::from_phrase(phrase, LANGUAGE)?;
    Ok(())
}

pub fn derive_from_phrase(phrase: &str, path: &str) -> Result<ed25519::SecretKey> {
    let mnemonic = bip39::Mnemonic::from_phrase(phrase, LANGUAGE)?;
    let hd = bip39::Seed::new(&mnemonic, "");

    let derived = ExtendedPrivKey::derive(hd.as_bytes(), path)
        .map_err(|_| anyhow::anyhow!("Invalid derivation path"))?;

    Ok(ed25519::SecretKey::from_bytes(derived.secret()))
}
