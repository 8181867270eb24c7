use crate::error::{PwdbError, Result};
use crate::registry::Registry;
use crate::secret::MasterSecret;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

pub const FINGERPRINT_LEN: usize = 8;

pub const UNLOCK_PROMPT: &str = "Enter master password: ";
pub const NEW_MASTER_PROMPT: &str = "Enter new master password: ";
pub const CONFIRM_MASTER_PROMPT: &str = "Verify new master password: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn compute(secret: &MasterSecret) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest[..FINGERPRINT_LEN]);
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn matches(&self, candidate: &MasterSecret) -> bool {
        Self::compute(candidate) == *self
    }
}

pub fn compute_fingerprint(password: &MasterSecret) -> String {
    Fingerprint::compute(password).to_hex()
}

pub trait SecretPrompt {
    fn read_secret(&mut self, prompt: &str) -> io::Result<MasterSecret>;
}

impl<F> SecretPrompt for F
where
    F: FnMut(&str) -> io::Result<MasterSecret>,
{
    fn read_secret(&mut self, prompt: &str) -> io::Result<MasterSecret> {
        self(prompt)
    }
}

/// Prompts until a candidate matches `stored`. There is no attempt limit.
pub fn authenticate<P>(stored: &Fingerprint, prompt: &mut P) -> Result<MasterSecret>
where
    P: SecretPrompt + ?Sized,
{
    let mut attempts: u64 = 0;
    loop {
        let candidate = prompt
            .read_secret(UNLOCK_PROMPT)
            .map_err(PwdbError::Prompt)?;
        attempts += 1;

        if stored.matches(&candidate) {
            tracing::debug!(attempts, "Master password accepted");
            return Ok(candidate);
        }

        tracing::warn!(attempts, "Master password rejected");
    }
}

pub fn prompt_new_master<P>(prompt: &mut P) -> Result<MasterSecret>
where
    P: SecretPrompt + ?Sized,
{
    loop {
        let first = prompt
            .read_secret(NEW_MASTER_PROMPT)
            .map_err(PwdbError::Prompt)?;
        let second = prompt
            .read_secret(CONFIRM_MASTER_PROMPT)
            .map_err(PwdbError::Prompt)?;

        if first.is_empty() {
            tracing::warn!("Empty master password rejected");
            continue;
        }
        if first == second {
            return Ok(first);
        }

        tracing::warn!("Master password entries did not match");
    }
}

pub fn create_registry(
    path: impl AsRef<Path>,
    secret: &MasterSecret,
) -> Result<(Registry, Fingerprint)> {
    let fingerprint = Fingerprint::compute(secret);
    let registry = Registry::create(path, fingerprint)?;
    Ok((registry, fingerprint))
}
