use crate::alphabet::Alphabet;
use crate::error::{PwdbError, Result};
use base64::Engine as _;
use base64::alphabet::Alphabet as DigitTable;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::NO_PAD;
use zeroize::Zeroizing;

pub struct Encoder {
    engine: GeneralPurpose,
}

impl Encoder {
    pub fn new(alphabet: &Alphabet) -> Result<Self> {
        Self::with_digits(alphabet.as_str())
    }

    /// Builds an encoder from any 64 distinct printable ASCII characters
    /// other than `=`.
    pub fn with_digits(digits: &str) -> Result<Self> {
        let table = DigitTable::new(digits).map_err(|e| PwdbError::InvalidDigitTable {
            digits: digits.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            engine: GeneralPurpose::new(&table, NO_PAD),
        })
    }

    pub fn encode(&self, bytes: &[u8]) -> Zeroizing<String> {
        Zeroizing::new(self.engine.encode(bytes))
    }
}

pub const fn encoded_len(byte_count: usize) -> usize {
    (byte_count * 4).div_ceil(3)
}
