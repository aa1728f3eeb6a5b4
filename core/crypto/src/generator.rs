//! Random password, passphrase and PIN generation from the OS CSPRNG.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::wordlist::WORDS;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{};:,.?";
const AMBIGUOUS: &[u8] = b"0O1lI";

/// Allowed password length range.
pub const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 8..=128;

/// Allowed PIN length range.
pub const PIN_LENGTH: std::ops::RangeInclusive<usize> = 4..=12;

/// Allowed passphrase word count range.
pub const PASSPHRASE_WORDS: std::ops::RangeInclusive<usize> = 3..=10;

/// Options for [`generate_password`].
#[derive(Debug, Clone)]
pub struct PasswordOptions {
    /// Requested length; clamped to [`PASSWORD_LENGTH`].
    pub length: usize,
    /// Include punctuation characters.
    pub symbols: bool,
    /// Drop look-alike characters such as `0`/`O` and `1`/`l`.
    pub exclude_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 16,
            symbols: true,
            exclude_ambiguous: false,
        }
    }
}

/// Generate a random password.
///
/// Every enabled character class appears at least once.
pub fn generate_password(options: &PasswordOptions) -> String {
    let length = options
        .length
        .clamp(*PASSWORD_LENGTH.start(), *PASSWORD_LENGTH.end());

    let mut classes: Vec<Vec<u8>> = vec![LOWERCASE.to_vec(), UPPERCASE.to_vec(), DIGITS.to_vec()];
    if options.symbols {
        classes.push(SYMBOLS.to_vec());
    }
    if options.exclude_ambiguous {
        for class in &mut classes {
            class.retain(|c| !AMBIGUOUS.contains(c));
        }
    }

    let pool: Vec<u8> = classes.iter().flatten().copied().collect();
    let mut rng = OsRng;

    let mut out: Vec<u8> = classes
        .iter()
        .filter_map(|class| class.choose(&mut rng).copied())
        .collect();
    while out.len() < length {
        out.push(pool[rng.gen_range(0..pool.len())]);
    }
    out.shuffle(&mut rng);

    out.into_iter().map(char::from).collect()
}

/// Generate a numeric PIN; `length` is clamped to [`PIN_LENGTH`].
pub fn generate_pin(length: usize) -> String {
    let length = length.clamp(*PIN_LENGTH.start(), *PIN_LENGTH.end());
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(DIGITS[rng.gen_range(0..DIGITS.len())]))
        .collect()
}

/// Generate a passphrase of dictionary words joined by `separator`.
///
/// `word_count` is clamped to [`PASSPHRASE_WORDS`]; words may repeat.
pub fn generate_passphrase(word_count: usize, separator: &str) -> String {
    let count = word_count.clamp(*PASSPHRASE_WORDS.start(), *PASSPHRASE_WORDS.end());
    let mut rng = OsRng;
    (0..count)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(separator)
}
