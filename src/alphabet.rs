use crate::error::{PwdbError, Result};
use std::fmt;
use std::str::FromStr;

pub const ALPHABET_LEN: usize = 64;

const UPPERCASE: &[u8] = b"QWERTYUIOPASDFGHJKLZXCVBNM";
const DIGITS: &[u8] = b"1234567890";
const SYMBOLS: &[u8] = b"!@#$%^&*()~`{}[];:<>,.?/";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// A character class that a site's password may be required to draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Uppercase,
    Digits,
    Symbols,
}

impl CharClass {
    /// Classes in the order their characters enter the alphabet.
    pub const ALL: &'static [CharClass] = &[
        CharClass::Uppercase,
        CharClass::Digits,
        CharClass::Symbols,
    ];

    pub fn tag(self) -> char {
        match self {
            CharClass::Uppercase => 'u',
            CharClass::Digits => 'n',
            CharClass::Symbols => 's',
        }
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'u' => Some(CharClass::Uppercase),
            'n' => Some(CharClass::Digits),
            's' => Some(CharClass::Symbols),
            _ => None,
        }
    }

    fn chars(self) -> &'static [u8] {
        match self {
            CharClass::Uppercase => UPPERCASE,
            CharClass::Digits => DIGITS,
            CharClass::Symbols => SYMBOLS,
        }
    }
}

/// A validated class-selection string such as `"uns"`, `"n"` or `""`.
///
/// The original text is kept as entered: `"nu"` and `"un"` are stored
/// differently but [select the same classes](AlphabetSpec::same_classes).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlphabetSpec(String);

impl AlphabetSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        if let Some(invalid) = spec.chars().find(|c| CharClass::from_tag(*c).is_none()) {
            return Err(PwdbError::InvalidAlphabetSpec {
                spec: spec.to_string(),
                invalid,
            });
        }
        Ok(Self(spec.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, class: CharClass) -> bool {
        self.0.contains(class.tag())
    }

    pub fn same_classes(&self, other: &AlphabetSpec) -> bool {
        CharClass::ALL
            .iter()
            .all(|class| self.contains(*class) == other.contains(*class))
    }
}

impl FromStr for AlphabetSpec {
    type Err = PwdbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AlphabetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The 64 distinct digits a derived password is encoded with.
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    digits: [u8; ALPHABET_LEN],
}

impl Alphabet {
    /// Requested classes first (uppercase, digits, symbols), then the
    /// lowercase filler, then whatever unrequested classes are still needed
    /// to reach 64 distinct characters.
    pub fn build(spec: &AlphabetSpec) -> Self {
        let requested = CharClass::ALL
            .iter()
            .filter(|class| spec.contains(**class))
            .map(|class| class.chars());
        let filler = std::iter::once(LOWERCASE).chain(
            CharClass::ALL
                .iter()
                .filter(|class| !spec.contains(**class))
                .map(|class| class.chars()),
        );

        let mut digits = [0u8; ALPHABET_LEN];
        for (slot, ch) in digits
            .iter_mut()
            .zip(requested.chain(filler).flatten().copied())
        {
            *slot = ch;
        }

        Self { digits }
    }

    pub fn as_bytes(&self) -> &[u8; ALPHABET_LEN] {
        &self.digits
    }

    pub fn as_str(&self) -> &str {
        // Every source table is ASCII.
        std::str::from_utf8(&self.digits).unwrap_or_default()
    }

    pub fn contains(&self, ch: char) -> bool {
        ch.is_ascii() && self.digits.contains(&(ch as u8))
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Alphabet").field(&self.as_str()).finish()
    }
}
