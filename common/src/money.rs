//! [`Omr`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Amount of Omani Rials.
///
/// Arithmetic is exact and checked, as amounts come from external input
/// unbounded. Rounding to fils (the third fractional digit) happens only where
/// a rate is applied and when parsing external input.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Omr(Decimal);

impl Omr {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Number of fractional digits of an [`Omr`] amount.
    pub const SCALE: u32 = 3;

    /// One fils, the smallest unit of an [`Omr`] amount.
    pub const FILS: Self = Self(Decimal::from_parts(1, 0, 0, false, 3));

    /// Creates a new [`Omr`] amount exactly as provided.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a new [`Omr`] amount rounded to fils, half away from zero.
    #[must_use]
    pub fn rounded(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(
            Self::SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// Returns the underlying [`Decimal`] amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Indicates whether this amount is below zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Indicates whether this amount is above zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns the absolute difference between two amounts.
    ///
    /// [`None`] is returned if the difference overflows.
    #[must_use]
    pub fn abs_diff(self, other: Self) -> Option<Self> {
        self.checked_sub(other).map(|d| Self(d.0.abs()))
    }

    /// Adds two amounts, returning [`None`] on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Subtracts two amounts, returning [`None`] on overflow.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Multiplies this amount by the provided `times`, returning [`None`] on
    /// overflow.
    #[must_use]
    pub fn checked_mul(self, times: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(times)).map(Self)
    }

    /// Sums up the provided amounts, returning [`None`] on overflow.
    #[must_use]
    pub fn checked_sum(
        amounts: impl IntoIterator<Item = Self>,
    ) -> Option<Self> {
        amounts.into_iter().try_fold(Self::ZERO, Self::checked_add)
    }
}

impl From<Decimal> for Omr {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Omr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut amount = self.0.round_dp_with_strategy(
            Self::SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        );
        amount.rescale(Self::SCALE);
        write!(f, "{amount}")
    }
}

impl FromStr for Omr {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self::rounded)
            .map_err(|_| "invalid amount")
    }
}

impl Serialize for Omr {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Omr {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self::rounded)
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Omr;

    fn omr(s: &str) -> Omr {
        Omr::new(s.parse::<Decimal>().unwrap())
    }

    #[test]
    fn from_str() {
        assert_eq!(Omr::from_str("123.45").unwrap(), omr("123.45"));
        assert_eq!(Omr::from_str("500").unwrap(), omr("500.000"));
        assert_eq!(Omr::from_str(" 0.001 ").unwrap(), Omr::FILS);
        assert_eq!(Omr::from_str("1.0005").unwrap(), omr("1.001"));
        assert_eq!(Omr::from_str("-1.0005").unwrap(), omr("-1.001"));

        assert!(Omr::from_str("").is_err());
        assert!(Omr::from_str("12,5").is_err());
        assert!(Omr::from_str("OMR").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(omr("6000").to_string(), "6000.000");
        assert_eq!(omr("123.4").to_string(), "123.400");
        assert_eq!(omr("0.0015").to_string(), "0.002");
        assert_eq!(Omr::ZERO.to_string(), "0.000");
    }

    #[test]
    fn sums_exactly() {
        let total =
            Omr::checked_sum(["0.1", "0.2", "0.3"].into_iter().map(omr));

        assert_eq!(total, Some(omr("0.6")));
        assert_eq!(omr("500").checked_mul(12), Some(omr("6000")));
        assert_eq!(omr("1").abs_diff(omr("1.002")), Some(omr("0.002")));
    }

    #[test]
    fn detects_overflow() {
        let huge = Omr::new(Decimal::MAX);

        assert_eq!(huge.checked_add(omr("1")), None);
        assert_eq!(huge.checked_mul(12), None);
        assert_eq!(Omr::new(Decimal::MIN).checked_sub(omr("1")), None);
        assert_eq!(huge.abs_diff(Omr::new(Decimal::MIN)), None);
        assert_eq!(Omr::checked_sum([huge, huge]), None);
        assert_eq!(Omr::checked_sum([]), Some(Omr::ZERO));
    }

    #[test]
    fn serializes_with_fils_precision() {
        assert_eq!(
            serde_json::to_string(&omr("500")).unwrap(),
            r#""500.000""#,
        );
        assert_eq!(
            serde_json::from_str::<Omr>(r#""600.5""#).unwrap(),
            omr("600.5"),
        );
        assert_eq!(serde_json::from_str::<Omr>("300").unwrap(), omr("300"));
        assert_eq!(
            serde_json::from_str::<Omr>("0.1").unwrap(),
            omr("0.100"),
        );
        assert!(serde_json::from_str::<Omr>(r#""ten""#).is_err());
    }
}
