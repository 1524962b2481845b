//! Ledger amounts in the smallest unit (wei).
//!
//! The decimal form ("10.0", "1.5") is only ever produced for display or parsed
//! from user input; contract calls always carry the integer value.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use alloy_primitives::utils::{format_ether, parse_ether};
use serde::{Deserialize, Serialize};

use crate::error::ValidationFailure;

/// Number of fractional digits between the display unit and the smallest unit.
pub const DECIMALS: usize = 18;

/// An integer amount in the ledger's smallest unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::ZERO);

    pub const fn from_smallest_unit(value: U256) -> Self {
        Self(value)
    }

    pub const fn smallest_unit(self) -> U256 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Parses a user-entered decimal string such as `"1.5"` or `".25"`.
    ///
    /// At most [`DECIMALS`] fractional digits are accepted; anything finer
    /// than the smallest unit is rejected rather than rounded. Signs,
    /// exponents and hex are not accepted.
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationFailure> {
        let invalid = |reason: String| ValidationFailure::InvalidAmount {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("expected a decimal number".to_string()));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected a decimal number".to_string()));
        }
        if fraction.len() > DECIMALS {
            return Err(invalid("too many decimal places".to_string()));
        }

        let whole = if whole.is_empty() { "0" } else { whole };
        let normalized = if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{fraction}")
        };

        parse_ether(&normalized)
            .map(Amount)
            .map_err(|e| invalid(e.to_string()))
    }

    /// Renders the amount in display units, always with at least one
    /// fractional digit (`10.0`, `8.5`, `0.000000000000000001`).
    pub fn to_decimal_string(self) -> String {
        let formatted = format_ether(self.0);
        match formatted.split_once('.') {
            Some((whole, fraction)) => {
                let fraction = fraction.trim_end_matches('0');
                if fraction.is_empty() {
                    format!("{whole}.0")
                } else {
                    format!("{whole}.{fraction}")
                }
            }
            None => format!("{formatted}.0"),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl FromStr for Amount {
    type Err = ValidationFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(value: u128) -> U256 {
        U256::from(value)
    }

    const ETH: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(
            Amount::parse_decimal("1.5").unwrap().smallest_unit(),
            wei(1_500_000_000_000_000_000)
        );
        assert_eq!(Amount::parse_decimal("10").unwrap().smallest_unit(), wei(10 * ETH));
        assert_eq!(
            Amount::parse_decimal(".25").unwrap().smallest_unit(),
            wei(250_000_000_000_000_000)
        );
        assert_eq!(Amount::parse_decimal(" 2. ").unwrap().smallest_unit(), wei(2 * ETH));
    }

    #[test]
    fn test_parse_smallest_unit() {
        let amount = Amount::parse_decimal("0.000000000000000001").unwrap();
        assert_eq!(amount.smallest_unit(), wei(1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", ".", "abc", "1.2.3", "-1", "1e3", "0x10"] {
            let err = Amount::parse_decimal(input).unwrap_err();
            assert!(
                matches!(err, ValidationFailure::InvalidAmount { .. }),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        let err = Amount::parse_decimal("0.0000000000000000001").unwrap_err();
        match err {
            ValidationFailure::InvalidAmount { reason, .. } => {
                assert_eq!(reason, "too many decimal places")
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        // Scaled by 10^18 this no longer fits in 256 bits.
        let huge = "9".repeat(70);
        assert!(matches!(
            Amount::parse_decimal(&huge),
            Err(ValidationFailure::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_amounts_beyond_128_bits() {
        let large = Amount::from_smallest_unit(U256::from(u128::MAX) + U256::from(1));
        assert!(large > Amount::from_smallest_unit(wei(u128::MAX)));
        assert_eq!(large.to_string().parse::<Amount>().unwrap(), large);
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_smallest_unit(wei(10 * ETH)).to_string(), "10.0");
        assert_eq!(Amount::ZERO.to_string(), "0.0");
        assert_eq!(Amount::parse_decimal("8.5").unwrap().to_string(), "8.5");
        assert_eq!(Amount::from_smallest_unit(wei(1)).to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_checked_arithmetic() {
        let ten = Amount::parse_decimal("10").unwrap();
        let one_and_half = Amount::parse_decimal("1.5").unwrap();
        assert_eq!(ten.checked_sub(one_and_half).unwrap().to_string(), "8.5");
        assert!(one_and_half.checked_sub(ten).is_none());
        assert_eq!(ten.checked_add(one_and_half).unwrap().to_string(), "11.5");
    }
}
