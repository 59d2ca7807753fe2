//! Heuristic password strength scoring.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl Strength {
    fn from_score(score: u8) -> Self {
        match score {
            0..=2 => Strength::Weak,
            3..=4 => Strength::Medium,
            5..=6 => Strength::Strong,
            _ => Strength::VeryStrong,
        }
    }

    pub fn tip(&self) -> &'static str {
        match self {
            Strength::Weak => "Add uppercase, digits, and symbols. Use at least 8 characters.",
            Strength::Medium => "Good start! Try making it longer and adding more character types.",
            Strength::Strong => "Great password! Consider going even longer for extra security.",
            Strength::VeryStrong => "Excellent! This is a very secure password.",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strength::Weak => "WEAK",
            Strength::Medium => "MEDIUM",
            Strength::Strong => "STRONG",
            Strength::VeryStrong => "VERY STRONG",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthReport {
    pub length: usize,
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_digit: bool,
    pub has_symbol: bool,
    pub score: u8,
    pub strength: Strength,
}

pub const MAX_SCORE: u8 = 7;

/// One point per length threshold (8, 12, 16) and per character class present.
pub fn assess(password: &str) -> StrengthReport {
    let length = password.chars().count();
    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(char::is_numeric);
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    let score = [
        length >= 8,
        length >= 12,
        length >= 16,
        has_upper,
        has_lower,
        has_digit,
        has_symbol,
    ]
    .into_iter()
    .filter(|hit| *hit)
    .count() as u8;

    StrengthReport {
        length,
        has_upper,
        has_lower,
        has_digit,
        has_symbol,
        score,
        strength: Strength::from_score(score),
    }
}
