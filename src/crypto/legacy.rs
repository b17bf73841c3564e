use anyhow::Result;
use everscale_crypto::ed25519;
use hmac::{Mac, NewMac};
use pbkdf2::pbkdf2;

use super::LANGUAGE;

const WORD_COUNT: usize = 24;

pub fn validate_phrase(phrase: &str) -> Result<()> {
    let wordmap = LANGUAGE.wordmap();
    let mut word_count = 0;
    for word in phrase.split_whitespace() {
        word_count += 1;
        if word_count > WORD_COUNT {
            anyhow::bail!("Expected {WORD_COUNT} words")
        }

        wordmap.get_bits(word)?;
    }
    if word_count != WORD_COUNT {
        anyhow::bail!("Expected {WORD_COUNT} words")
    }
    Ok(())
}

pub fn derive_from_phrase(phrase: &str) -> Result<ed25519::SecretKey> {
    const PBKDF_ITERATIONS: u32 = 100_000;
    const SALT: &[u8] = b"TON default seed";

    validate_phrase(phrase)?;

    let password = hmac::Hmac::<sha2::Sha512>::new_from_slice(phrase.as_bytes())
        .map_err(|_| anyhow::anyhow!("Invalid phrase"))?
        .finalize()
        .into_bytes();

    let mut res = [0; 512 / 8];
    pbkdf2::<hmac::Hmac<sha2::Sha512>>(&password, SALT, PBKDF_ITERATIONS, &mut res);

    let mut secret = [0; 32];
    secret.copy_from_slice(&res[..32]);
    Ok(ed25519::SecretKey::from_bytes(secret))
}
