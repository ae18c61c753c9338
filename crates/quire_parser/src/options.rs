//! Parse and render option flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// A set of option flags shared by the parser and the renderer.
///
/// # Example
///
/// ```rust
/// use quire_parser::Options;
///
/// let options = Options::SMART | Options::HARDBREAKS;
/// assert!(options.contains(Options::SMART));
/// assert!(!options.contains(Options::NOBREAKS));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(u32);

impl Options {
    /// No options.
    pub const DEFAULT: Self = Self(0);
    /// Record source positions on rendered output.
    pub const SOURCEPOS: Self = Self(1 << 1);
    /// Treat soft breaks as hard breaks.
    pub const HARDBREAKS: Self = Self(1 << 2);
    /// Render soft breaks as spaces.
    pub const NOBREAKS: Self = Self(1 << 4);
    /// Replace invalid UTF-8 sequences in the input.
    ///
    /// Input is always decoded this way; the flag is kept so option words
    /// written for other engines carry over unchanged.
    pub const VALIDATE_UTF8: Self = Self(1 << 9);
    /// Convert straight quotes, dashes and ellipses to typographic ones.
    pub const SMART: Self = Self(1 << 10);

    const NAMED: [(&'static str, Self); 5] = [
        ("sourcepos", Self::SOURCEPOS),
        ("hardbreaks", Self::HARDBREAKS),
        ("nobreaks", Self::NOBREAKS),
        ("validate_utf8", Self::VALIDATE_UTF8),
        ("smart", Self::SMART),
    ];

    /// Creates an option set from its raw bits.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the flags in `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the flags in `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Looks up a single flag by its snake_case name.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "default" {
            return Some(Self::DEFAULT);
        }
        Self::NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, flag)| *flag)
    }

    /// Builds an option set from flag names.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownOption`] for the first name that is not
    /// a known flag.
    pub fn from_names<'n>(names: impl IntoIterator<Item = &'n str>) -> Result<Self, ParseError> {
        names.into_iter().try_fold(Self::DEFAULT, |acc, name| {
            Self::from_name(name)
                .map(|flag| acc | flag)
                .ok_or_else(|| ParseError::unknown_option(name))
        })
    }

    /// Returns the names of the flags that are set.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl BitOr for Options {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            f.write_str("default")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}
