//! Random password generation from selectable ASCII character classes.

use crate::crypto::aead::secure_random;
use anyhow::{Result, bail};
use zeroize::Zeroizing;

pub const MIN_LENGTH: usize = 4;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharClasses {
    pub upper: bool,
    pub lower: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for CharClasses {
    fn default() -> Self {
        Self {
            upper: true,
            lower: true,
            digits: true,
            symbols: true,
        }
    }
}

impl CharClasses {
    pub fn is_empty(&self) -> bool {
        !(self.upper || self.lower || self.digits || self.symbols)
    }

    /// Characters to sample from. Selecting nothing means everything.
    pub fn pool(&self) -> Vec<u8> {
        let classes = if self.is_empty() {
            Self::default()
        } else {
            *self
        };

        [
            (classes.upper, UPPER),
            (classes.lower, LOWER),
            (classes.digits, DIGITS),
            (classes.symbols, SYMBOLS),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .flat_map(|(_, chars)| chars.bytes())
        .collect()
    }
}

/// Draws `length` characters uniformly from the selected pool using the OS
/// random source.
pub fn generate(length: usize, classes: CharClasses) -> Result<Zeroizing<String>> {
    if length < MIN_LENGTH {
        bail!("password length must be at least {MIN_LENGTH}");
    }

    let pool = classes.pool();
    let mut password = Zeroizing::new(String::with_capacity(length));
    for _ in 0..length {
        password.push(char::from(pool[random_index(pool.len())?]));
    }
    Ok(password)
}

/// Uniform index below `n` (`n <= 256`), rejecting bytes that would bias the
/// modulo.
fn random_index(n: usize) -> Result<usize> {
    let limit = 256 - 256 % n;
    let mut byte = [0u8; 1];
    loop {
        secure_random(&mut byte)?;
        let value = usize::from(byte[0]);
        if value < limit {
            return Ok(value % n);
        }
    }
}
