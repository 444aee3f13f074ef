//! [`Rate`]-related definitions.

use derive_more::Display;
use rust_decimal::Decimal;

use crate::Omr;

/// Fraction in the `[0, 1]` range applied to an [`Omr`] base (`0.05` is 5%).
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct Rate(Decimal);

impl Rate {
    /// Creates a new [`Rate`] by checking the provided value is within the
    /// `[0, 1]` range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE).contains(&val).then_some(Self(val))
    }

    /// Creates a new [`Rate`] without performing any validation.
    ///
    /// # Safety
    ///
    /// The provided value must be within the `[0, 1]` range.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(val: Decimal) -> Self {
        Self(val)
    }

    /// Returns the underlying fraction.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Applies this [`Rate`] to the provided `base`, rounding the result to
    /// fils.
    ///
    /// Never overflows, as the result doesn't exceed the `base` in magnitude.
    #[must_use]
    pub fn of(self, base: Omr) -> Omr {
        Omr::rounded(base.amount() * self.0)
    }
}
