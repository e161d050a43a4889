//! Fixed-point decimal type with 2 decimal places precision.
//!
//! Uses `rust_decimal` internally with scale enforcement so that every
//! monetary field renders with exactly two digits and a `.` separator,
//! independent of the host locale.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

/// A decimal type that maintains exactly 2 decimal places of precision.
///
/// Values are rescaled once, when they enter the system. Formatting never
/// rounds again.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use statement_export::Decimal2;
///
/// let amount = Decimal2::from_str("250.5").unwrap();
/// assert_eq!(amount.to_string(), "250.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Decimal2(Decimal);

impl Decimal2 {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Decimal2(Decimal::ZERO);

    /// Creates a new `Decimal2` from a `Decimal`, normalizing to 2 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value;
        normalized.rescale(Self::SCALE);
        Decimal2(normalized)
    }

    /// Subtraction that yields `None` instead of panicking on overflow.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Decimal2::new)
    }

    /// Returns `true` if this value is strictly below zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl FromStr for Decimal2 {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Decimal2::new(decimal))
    }
}

impl fmt::Display for Decimal2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Sub for Decimal2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Decimal2::new(self.0 - rhs.0)
    }
}

impl<'de> Deserialize<'de> for Decimal2 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Decimal2::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_normalizes_scale() {
        assert_eq!(Decimal2::from_str("99").unwrap().to_string(), "99.00");
        assert_eq!(Decimal2::from_str("250.5").unwrap().to_string(), "250.50");
        assert_eq!(Decimal2::from_str("1050.00").unwrap().to_string(), "1050.00");
        assert_eq!(Decimal2::from_str("  2.5  ").unwrap().to_string(), "2.50");
    }

    #[test]
    fn test_arithmetic_preserves_scale() {
        let a = Decimal2::from_str("1050").unwrap();
        let b = Decimal2::from_str("50").unwrap();

        assert_eq!((a - b).to_string(), "1000.00");
        assert_eq!((b - a).to_string(), "-1000.00");
    }

    #[test]
    fn test_checked_sub_reports_overflow() {
        let max = Decimal2(Decimal::MAX);
        let min = Decimal2(Decimal::MIN);
        assert!(min.checked_sub(max).is_none());
        assert_eq!(
            max.checked_sub(max).map(|d| d.to_string()),
            Some("0.00".to_string())
        );
    }

    #[test]
    fn test_negative_values() {
        let d = Decimal2::from_str("-12.3").unwrap();
        assert!(d.is_negative());
        assert_eq!(d.to_string(), "-12.30");
        assert!(!Decimal2::ZERO.is_negative());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Decimal2::from_str("abc").is_err());
        assert!(Decimal2::from_str("").is_err());
    }
}
