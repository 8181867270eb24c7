use crate::alphabet::Alphabet;
use crate::encoding::{Encoder, encoded_len};
use crate::error::Result;
use crate::secret::MasterSecret;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Digest bytes fed to the encoder. A multiple of 3, so no partial block.
pub const DERIVED_BYTES: usize = 12;
pub const PASSWORD_LEN: usize = encoded_len(DERIVED_BYTES);

/// Derives the password for `site` as `encode(SHA-256(master || site)[..12])`.
pub fn derive_password(
    master: &MasterSecret,
    site: &str,
    alphabet: &Alphabet,
) -> Result<Zeroizing<String>> {
    let mut hasher = Sha256::new();
    hasher.update(master.as_bytes());
    hasher.update(site.as_bytes());
    let mut digest = Zeroizing::new([0u8; 32]);
    digest.copy_from_slice(&hasher.finalize());

    let encoder = Encoder::new(alphabet)?;
    Ok(encoder.encode(&digest[..DERIVED_BYTES]))
}
