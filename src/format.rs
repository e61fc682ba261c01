//! Display helpers for chart levels and scores.

use std::fmt;

/// A chart level such as `9` or `9+`.
///
/// The API encodes levels as `2 × level + plus`, so `18` is level 9 and
/// `19` is level 9+.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RatingClass {
    pub rating: u8,
    pub plus: bool,
}

impl From<u8> for RatingClass {
    fn from(encoded: u8) -> Self {
        Self {
            rating: encoded / 2,
            plus: encoded % 2 == 1,
        }
    }
}

impl fmt::Display for RatingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rating)?;
        if self.plus {
            write!(f, "+")?;
        }
        Ok(())
    }
}

/// Renders an encoded chart level, e.g. `19` as `"9+"`.
#[must_use]
pub fn rating_string(encoded: u8) -> String {
    RatingClass::from(encoded).to_string()
}

/// Renders a score as shown in game: eight digits in groups of three,
/// e.g. `9876543` as `"09'876'543"`.
#[must_use]
pub fn format_score(score: u32) -> String {
    let digits = format!("{score:08}");
    let head = digits.len() % 3;

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && i % 3 == head {
            grouped.push('\'');
        }
        grouped.push(digit);
    }

    grouped
}
