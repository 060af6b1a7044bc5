use crate::{EncodingError, Result};

/// First code point considered for digits (`!`).
pub const ASCII_FLOOR: u8 = 33;
/// Exclusive upper bound (`[`).
pub const ASCII_CEILING: u8 = 91;

/// Characters that break string literals or template syntax downstream.
pub const DENIED_CHARACTERS: &[char] = &[
    ':', '"', '\\', '%', '\'', '`', '*', '.', '$', '^', '(', ')', '[', ']', '+', '-', '?',
];

pub const DEFAULT_MARKER: char = '~';

/// Validate a configured marker string and return its single character.
///
/// The marker starts every emitted code, so it obeys the same denylist as the
/// digits.
pub fn parse_marker(raw: &str) -> Result<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(marker), None) if is_marker_char(marker) => Ok(marker),
        _ => Err(EncodingError::InvalidMarker(raw.to_string())),
    }
}

fn is_marker_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && !DENIED_CHARACTERS.contains(&c)
}

/// Digit alphabet of the bijective numeral system used for codes.
///
/// Digit value `d` (1-based) is rendered as `digits[d - 1]`; there is no
/// zero digit, so every positive integer has exactly one representation and
/// longer strings always denote larger numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    marker: char,
    digits: Vec<char>,
}

impl Alphabet {
    pub fn new(marker: char) -> Self {
        let digits = (ASCII_FLOOR..ASCII_CEILING)
            .map(char::from)
            .filter(|c| !DENIED_CHARACTERS.contains(c) && *c != marker)
            .collect();
        Self { marker, digits }
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    pub fn base(&self) -> usize {
        self.digits.len()
    }

    pub fn digits(&self) -> &[char] {
        &self.digits
    }

    /// Bijective base-`B` numeral for `index`. Zero maps to the empty string.
    pub fn bijective_digits(&self, index: usize) -> String {
        let base = self.base();
        let mut reversed = Vec::new();
        let mut rest = index;
        while rest > 0 {
            rest -= 1;
            reversed.push(self.digits[rest % base]);
            rest /= base;
        }
        reversed.iter().rev().collect()
    }

    /// Code for the token at 1-based position `index` of the pattern list.
    pub fn code(&self, index: usize) -> String {
        let digits = self.bijective_digits(index);
        let mut code = String::with_capacity(digits.len() + self.marker.len_utf8());
        code.push(self.marker);
        code.push_str(&digits);
        code
    }

    /// Inverse of [`Alphabet::code`]. Returns `None` for strings that are not
    /// well-formed codes under this marker.
    pub fn index_of(&self, code: &str) -> Option<usize> {
        let digits = code.strip_prefix(self.marker)?;
        if digits.is_empty() {
            return None;
        }
        let base = self.base();
        let mut value: usize = 0;
        for ch in digits.chars() {
            let digit = self.digits.iter().position(|d| *d == ch)? + 1;
            value = value.checked_mul(base)?.checked_add(digit)?;
        }
        Some(value)
    }
}
