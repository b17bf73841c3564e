use std::path::Path;

use anyhow::{Context, Result};
use broxus_util::{serde_hex_array, serde_optional_hex_array};
use everscale_crypto::ed25519;
use serde::{Deserialize, Serialize};

use crate::crypto::*;

/// Signer keys file
#[derive(Serialize)]
pub struct StoredKeys {
    #[serde(with = "serde_hex_array")]
    pub secret: [u8; 32],
    #[serde(
        with = "serde_optional_hex_array",
        skip_serializing_if = "Option::is_none"
    )]
    pub public: Option<[u8; 32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

impl StoredKeys {
    pub const DEFAULT_MNEMONIC_TYPE: MnemonicType = MnemonicType::Legacy;

    pub fn generate() -> Result<Self> {
        Self::from_seed(generate_seed(Self::DEFAULT_MNEMONIC_TYPE))
    }

    pub fn from_seed<T: AsRef<str>>(seed: T) -> Result<Self> {
        fn inner(seed: &str) -> Result<StoredKeys> {
            let seed = seed.trim().to_owned();
            let secret =
                derive_secret_from_phrase(&seed, StoredKeys::DEFAULT_MNEMONIC_TYPE, DEFAULT_PATH)?;
            let public = ed25519::PublicKey::from(&secret);
            Ok(StoredKeys {
                secret: *secret.as_bytes(),
                public: Some(public.to_bytes()),
                seed: Some(seed),
            })
        }

        inner(seed.as_ref())
    }

    pub fn load_as_keypair<P: AsRef<Path>>(path: P) -> Result<ed25519::KeyPair> {
        Self::load(path)?.as_keypair()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        fn inner(path: &Path) -> Result<StoredKeys> {
            #[derive(Deserialize)]
            #[serde(deny_unknown_fields)]
            pub struct StoredKeysHelper {
                #[serde(default, with = "serde_optional_hex_array")]
                pub secret: Option<[u8; 32]>,
                #[serde(default, with = "serde_optional_hex_array")]
                pub public: Option<[u8; 32]>,
                #[serde(default)]
                pub seed: Option<String>,
            }

            let file = std::fs::File::open(path).context("failed to open keys file")?;
            let mut deserializer =
                serde_json::Deserializer::from_reader(std::io::BufReader::new(file));
            let data: StoredKeysHelper = serde_path_to_error::deserialize(&mut deserializer)
                .context("failed to parse keys")?;

            if let Some(secret) = data.secret {
                Ok(StoredKeys {
                    secret,
                    public: data.public,
                    seed: data.seed,
                })
            } else if let Some(seed) = data.seed {
                StoredKeys::from_seed(seed)
            } else {
                anyhow::bail!("invalid keys file")
            }
        }

        inner(path.as_ref())
    }

    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to serialize keys")?;
        std::fs::write(path, data).context("failed to save keys")
    }

    /// Builds a key pair, checking the stored public key if present
    pub fn as_keypair(&self) -> Result<ed25519::KeyPair> {
        let secret = ed25519::SecretKey::from_bytes(self.secret);
        let keypair = ed25519::KeyPair::from(&secret);
        if let Some(public) = &self.public {
            anyhow::ensure!(
                keypair.public_key.as_bytes() == public,
                "public key doesn't match the secret"
            );
        }
        Ok(keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("orderkeeper-keys-{}.json", rand::random::<u32>()))
    }

    #[test]
    fn generated_keys_roundtrip() {
        let keys = StoredKeys::generate().unwrap();
        let path = temp_path();
        keys.store(&path).unwrap();

        let loaded = StoredKeys::load_as_keypair(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.public_key.to_bytes(), keys.public.unwrap());
    }

    #[test]
    fn seed_only_file_is_derived() {
        let seed = generate_seed(StoredKeys::DEFAULT_MNEMONIC_TYPE);
        let path = temp_path();
        std::fs::write(&path, serde_json::json!({ "seed": seed }).to_string()).unwrap();

        let loaded = StoredKeys::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.secret, StoredKeys::from_seed(&seed).unwrap().secret);
    }

    #[test]
    fn mismatched_public_key_is_rejected() {
        let mut keys = StoredKeys::generate().unwrap();
        keys.public = Some([0; 32]);
        assert!(keys.as_keypair().is_err());
    }
}
