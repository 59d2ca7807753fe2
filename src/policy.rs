//! Pass/fail checks of a password against a configurable policy.

use anyhow::{Result, bail};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    min_length: usize,
    max_length: usize,
    require_upper: bool,
    require_lower: bool,
    require_digit: bool,
    require_symbol: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_upper: true,
            require_lower: true,
            require_digit: true,
            require_symbol: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    MinLength(usize),
    MaxLength(usize),
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::MinLength(n) => write!(f, "At least {n} characters"),
            Rule::MaxLength(n) => write!(f, "No more than {n} characters"),
            Rule::Uppercase => f.write_str("Contains uppercase letter"),
            Rule::Lowercase => f.write_str("Contains lowercase letter"),
            Rule::Digit => f.write_str("Contains a digit"),
            Rule::Symbol => f.write_str("Contains a symbol"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyReport {
    pub results: Vec<(Rule, bool)>,
}

impl PolicyReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|(_, ok)| *ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = Rule> + '_ {
        self.results.iter().filter(|(_, ok)| !ok).map(|(rule, _)| *rule)
    }
}

impl Policy {
    pub fn new(
        min_length: usize,
        max_length: usize,
        require_upper: bool,
        require_lower: bool,
        require_digit: bool,
        require_symbol: bool,
    ) -> Result<Self> {
        let policy = Self {
            min_length,
            max_length,
            require_upper,
            require_lower,
            require_digit,
            require_symbol,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_length < 1 {
            bail!("policy minimum length must be >= 1");
        }
        if self.min_length > self.max_length {
            bail!(
                "policy minimum length {} exceeds maximum length {}",
                self.min_length,
                self.max_length
            );
        }
        Ok(())
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Whether each character class is required, in rule order.
    pub fn requirements(&self) -> [(Rule, bool); 4] {
        [
            (Rule::Uppercase, self.require_upper),
            (Rule::Lowercase, self.require_lower),
            (Rule::Digit, self.require_digit),
            (Rule::Symbol, self.require_symbol),
        ]
    }

    /// Evaluates all six rules; a class that is not required always passes.
    pub fn check(&self, password: &str) -> PolicyReport {
        let length = password.chars().count();
        let has = |pred: fn(char) -> bool| password.chars().any(pred);

        let mut results = vec![
            (Rule::MinLength(self.min_length), length >= self.min_length),
            (Rule::MaxLength(self.max_length), length <= self.max_length),
        ];
        for (rule, required) in self.requirements() {
            let satisfied = match rule {
                Rule::Uppercase => has(char::is_uppercase),
                Rule::Lowercase => has(char::is_lowercase),
                Rule::Digit => has(char::is_numeric),
                _ => has(|c| !c.is_alphanumeric()),
            };
            results.push((rule, !required || satisfied));
        }

        PolicyReport { results }
    }
}
