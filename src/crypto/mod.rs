use std::str::FromStr;

use anyhow::Result;
use everscale_crypto::ed25519;
use hmac::digest::Digest;
use rand::Rng;

mod bip39;
mod legacy;

const LANGUAGE: ::bip39::Language = ::bip39::Language::English;

pub const DEFAULT_PATH: &str = "m/44'/396'/0'/0/0";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MnemonicType {
    /// Phrase with 24 words, used by the first TON wallets
    Legacy,
    /// Phrase with 12 words. The derivation path allows multiple signers
    /// to share one mnemonic
    Bip39,
}

impl FromStr for MnemonicType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "bip39" => Ok(Self::Bip39),
            _ => Err(anyhow::anyhow!(
                "unknown mnemonic type (neither `legacy` nor `bip39`)"
            )),
        }
    }
}

pub fn validate_phrase(phrase: &str, mnemonic_type: MnemonicType) -> Result<()> {
    match mnemonic_type {
        MnemonicType::Legacy => legacy::validate_phrase(phrase),
        MnemonicType::Bip39 => bip39::validate_phrase(phrase),
    }
}

pub fn derive_secret_from_phrase(
    phrase: &str,
    mnemonic_type: MnemonicType,
    path: &str,
) -> Result<ed25519::SecretKey> {
    match mnemonic_type {
        MnemonicType::Legacy => legacy::derive_from_phrase(phrase),
        MnemonicType::Bip39 => bip39::derive_from_phrase(phrase, path),
    }
}

pub fn derive_from_phrase(
    phrase: &str,
    mnemonic_type: MnemonicType,
    path: &str,
) -> Result<ed25519::KeyPair> {
    let secret = derive_secret_from_phrase(phrase, mnemonic_type, path)?;
    Ok(ed25519::KeyPair::from(&secret))
}

/// Generates seed phrase
pub fn generate_seed(mnemonic_type: MnemonicType) -> String {
    use ::bip39::util::{Bits11, IterExt};

    let rng = &mut rand::thread_rng();

    fn generate_words(entropy: &[u8]) -> Vec<&'static str> {
        let wordlist = LANGUAGE.wordlist();

        let checksum_byte = sha2::Sha256::digest(entropy)[0];

        entropy
            .iter()
            .chain(Some(&checksum_byte))
            .bits()
            .map(|bits: Bits11| wordlist.get_word(bits))
            .collect()
    }

    match mnemonic_type {
        MnemonicType::Legacy => {
            let entropy: [u8; 32] = rng.gen();
            generate_words(&entropy)
        }
        MnemonicType::Bip39 => {
            let entropy: [u8; 16] = rng.gen();
            generate_words(&entropy)
        }
    }
    .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_seeds_are_valid() {
        for ty in [MnemonicType::Legacy, MnemonicType::Bip39] {
            let seed = generate_seed(ty);
            let expected = match ty {
                MnemonicType::Legacy => 24,
                MnemonicType::Bip39 => 12,
            };
            assert_eq!(seed.split_whitespace().count(), expected);
            validate_phrase(&seed, ty).unwrap();
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let seed = generate_seed(MnemonicType::Bip39);
        let first = derive_from_phrase(&seed, MnemonicType::Bip39, DEFAULT_PATH).unwrap();
        let second = derive_from_phrase(&seed, MnemonicType::Bip39, DEFAULT_PATH).unwrap();
        assert_eq!(first.public_key, second.public_key);

        let other = derive_from_phrase(&seed, MnemonicType::Bip39, "m/44'/396'/0'/0/1").unwrap();
        assert_ne!(first.public_key, other.public_key);
    }

    #[test]
    fn legacy_phrase_length_is_checked() {
        let seed = generate_seed(MnemonicType::Bip39);
        assert!(derive_from_phrase(&seed, MnemonicType::Legacy, DEFAULT_PATH).is_err());
    }

    #[test]
    fn derived_key_signs() {
        let seed = generate_seed(MnemonicType::Legacy);
        let keypair = derive_from_phrase(&seed, MnemonicType::Legacy, DEFAULT_PATH).unwrap();
        let signature = keypair.sign_raw(b"order");
        assert!(keypair.public_key.verify_raw(b"order", &signature));
    }

    #[test]
    fn mnemonic_type_from_str() {
        assert_eq!("legacy".parse::<MnemonicType>().unwrap(), MnemonicType::Legacy);
        assert_eq!("bip39".parse::<MnemonicType>().unwrap(), MnemonicType::Bip39);
        assert!("other".parse::<MnemonicType>().is_err());
    }
}
