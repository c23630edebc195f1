//! Fixed-point money.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional digits kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Number of whole digits a stored amount may carry (`NUMERIC(15,2)`).
pub const MONEY_INTEGER_DIGITS: u32 = 13;

/// A monetary amount backed by a fixed-point decimal.
///
/// Arithmetic is exact; only percentage reductions round, half away from
/// zero, to [`MONEY_SCALE`] digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero money.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps a decimal amount.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates an amount from whole currency units.
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Creates an amount from minor units (hundredths).
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, MONEY_SCALE))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Returns the underlying decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Whether the amount is stored without rounding: at most
    /// [`MONEY_SCALE`] fractional and [`MONEY_INTEGER_DIGITS`] whole digits.
    pub fn fits_storage(&self) -> bool {
        let limit = Decimal::from(10i64.pow(MONEY_INTEGER_DIGITS));
        self.0.normalize().scale() <= MONEY_SCALE && self.0.abs() < limit
    }

    /// Adds `other`, or `None` if the sum overflows.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiplies by a quantity.
    pub fn times(&self, quantity: u32) -> Money {
        Money(self.0 * Decimal::from(quantity))
    }

    /// Reduces the amount by `percent` percent: `self × (100 − percent) / 100`.
    pub fn less_percent(&self, percent: Decimal) -> Money {
        Money(self.0 * (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED).rounded()
    }

    /// Subtracts `other`, flooring the result at zero.
    pub fn saturating_sub(&self, other: Money) -> Money {
        if other.0 >= self.0 {
            Money::ZERO
        } else {
            Money(self.0 - other.0)
        }
    }

    /// Rounds to [`MONEY_SCALE`] fractional digits.
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> std::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_and_minor_units_agree() {
        assert_eq!(Money::from_major(15), Money::from_minor(1500));
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_major(100);
        let b = Money::from_minor(2550);
        assert_eq!(a + b, Money::from_minor(12550));
        assert_eq!(a - b, Money::from_minor(7450));
        assert_eq!(-b, Money::from_minor(-2550));

        let mut c = a;
        c += b;
        c -= Money::from_major(25);
        assert_eq!(c, Money::from_minor(10050));
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Money::from_major(1).is_positive());
        assert!(Money::zero().is_zero());
        assert!(Money::from_major(-1).is_negative());
        assert!(!Money::zero().is_positive());
    }

    #[test]
    fn test_fits_storage() {
        assert!(Money::from_minor(1).fits_storage());
        assert!(Money::new(Decimal::new(1_500, 3)).fits_storage());
        assert!(Money::from_major(9_999_999_999_999).fits_storage());
        assert!(!Money::new(Decimal::new(5, 3)).fits_storage());
        assert!(!Money::from_major(10_000_000_000_000).fits_storage());
        assert!(!Money::new(Decimal::MAX).fits_storage());
    }

    #[test]
    fn test_checked_add_reports_overflow() {
        assert_eq!(
            Money::from_major(1).checked_add(Money::from_minor(50)),
            Some(Money::from_minor(150))
        );
        assert_eq!(Money::new(Decimal::MAX).checked_add(Money::from_major(1)), None);
    }

    #[test]
    fn test_times_quantity() {
        assert_eq!(Money::from_minor(1999).times(3), Money::from_minor(5997));
        assert_eq!(Money::from_major(10).times(0), Money::ZERO);
    }

    #[test]
    fn test_less_percent_rounds_half_away_from_zero() {
        assert_eq!(Money::from_major(100_000).less_percent(Decimal::from(10)), Money::from_major(90_000));
        // 0.05 * 0.5 = 0.025 rounds up to 0.03
        assert_eq!(Money::from_minor(5).less_percent(Decimal::from(50)), Money::from_minor(3));
        assert_eq!(Money::from_major(80).less_percent(Decimal::ZERO), Money::from_major(80));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        assert_eq!(Money::from_major(10).saturating_sub(Money::from_major(3)), Money::from_major(7));
        assert_eq!(Money::from_major(10).saturating_sub(Money::from_major(30)), Money::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_major(1), Money::from_major(2), Money::from_minor(50)]
            .iter()
            .sum();
        assert_eq!(total, Money::from_minor(350));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_major(40_000).to_string(), "40000.00");
        assert_eq!(Money::from_minor(-1205).to_string(), "-12.05");
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_number: Money = serde_json::from_str("40000").unwrap();
        let from_string: Money = serde_json::from_str("\"40000.00\"").unwrap();
        assert_eq!(from_number, from_string);
    }
}
