use serde::{Serialize, Serializer};
use std::fmt;

/// Separator between a description and its legacy embedded index
pub const LEGACY_INDEX_DELIMITER: &str = "___";

/// A signed integer of any magnitude, as written by the caller.
///
/// Only ever reduced modulo a list length, so the digits are kept as text
/// instead of being bounded by a machine integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestedIndex {
    negative: bool,
    /// ASCII digits, no leading zeros; `"0"` for zero
    digits: String,
}

impl RequestedIndex {
    /// Parse `[+-]?digits`, surrounding whitespace allowed and single
    /// underscores permitted between digits. `None` when the text is not an
    /// integer.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, body) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        if body.is_empty() || body.starts_with('_') || body.ends_with('_') || body.contains("__") {
            return None;
        }

        let mut digits = String::with_capacity(body.len());
        for c in body.chars() {
            match c {
                '0'..='9' => {
                    if !(digits.is_empty() && c == '0') {
                        digits.push(c);
                    }
                }
                '_' => {}
                _ => return None,
            }
        }

        if digits.is_empty() {
            return Some(Self::zero());
        }
        Some(Self { negative, digits })
    }

    /// [`RequestedIndex::parse`], with anything that is not an integer read as 0
    pub fn parse_or_zero(text: &str) -> Self {
        Self::parse(text).unwrap_or_default()
    }

    pub fn zero() -> Self {
        Self {
            negative: false,
            digits: "0".to_string(),
        }
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// The value when it fits in an `i64`
    pub fn as_i64(&self) -> Option<i64> {
        self.to_string().parse().ok()
    }

    /// Euclidean remainder in `[0, len)`; `None` only for `len == 0`
    pub fn rem_euclid(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let modulus = len as u128;
        let rem = self
            .digits
            .bytes()
            .fold(0u128, |acc, d| (acc * 10 + u128::from(d - b'0')) % modulus);
        let rem = if self.negative && rem != 0 { modulus - rem } else { rem };
        usize::try_from(rem).ok()
    }
}

impl Default for RequestedIndex {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for RequestedIndex {
    fn from(value: i64) -> Self {
        Self {
            negative: value < 0,
            digits: value.unsigned_abs().to_string(),
        }
    }
}

impl fmt::Display for RequestedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.digits)
    }
}

/// A JSON number when it fits in an `i64`, a decimal string otherwise
impl Serialize for RequestedIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_i64() {
            Some(value) => serializer.serialize_i64(value),
            None => serializer.collect_str(self),
        }
    }
}

/// Description split into query text and an optional embedded index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector<'a> {
    pub query: &'a str,
    /// `Some` when the description carried a `___` suffix.
    /// A suffix that is not an integer yields zero.
    pub index: Option<RequestedIndex>,
}

/// Parse `description___<index>`.
///
/// Text before the first delimiter is the query; the piece after it (up to
/// any further delimiter) is the index.
pub fn parse_selector(description: &str) -> Selector<'_> {
    let mut parts = description.split(LEGACY_INDEX_DELIMITER);
    let query = parts.next().unwrap_or_default();
    Selector {
        query,
        index: parts.next().map(RequestedIndex::parse_or_zero),
    }
}

/// Wrap `requested` into `[0, len)`. `None` only for an empty list.
#[inline]
pub fn effective_index(requested: &RequestedIndex, len: usize) -> Option<usize> {
    requested.rem_euclid(len)
}

/// Pick one entry by wrap-around index, returning it with the index used
pub fn select<'a, T>(results: &'a [T], requested: &RequestedIndex) -> Option<(&'a T, usize)> {
    let index = effective_index(requested, results.len())?;
    results.get(index).map(|item| (item, index))
}
