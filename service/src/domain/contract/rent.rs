//! Monthly rent [`Schedule`].

use common::{Date, Omr};
use derive_more::{Display, Error};
use serde::Serialize;

use super::Terms;

/// Rent due for every month of the [`Terms`].
#[derive(Clone, Copy, Debug)]
pub struct Schedule<'t> {
    /// [`Terms`] this [`Schedule`] is built from.
    terms: &'t Terms,
}

impl<'t> Schedule<'t> {
    /// Creates a new [`Schedule`] of the provided [`Terms`].
    ///
    /// # Errors
    ///
    /// With a [`LengthMismatch`] if custom monthly rents are used, but there
    /// isn't exactly one per month of the term.
    pub fn new(terms: &'t Terms) -> Result<Self, LengthMismatch> {
        let actual = terms.custom_monthly_rents.len();
        let matches = usize::try_from(terms.duration).ok() == Some(actual);
        if terms.use_custom_monthly_rents && !matches {
            return Err(LengthMismatch {
                expected: terms.duration,
                actual,
            });
        }
        Ok(Self { terms })
    }

    /// Returns the rent of the provided 1-based `period`.
    ///
    /// [`None`] is returned for periods outside the term.
    #[must_use]
    pub fn amount(&self, period: u32) -> Option<Omr> {
        if period == 0 || period > self.terms.duration {
            return None;
        }
        if !self.terms.use_custom_monthly_rents {
            return Some(self.terms.monthly_rent);
        }
        let index = usize::try_from(period - 1).ok()?;
        self.terms.custom_monthly_rents.get(index).copied()
    }

    /// Returns the rent of the whole term.
    ///
    /// [`None`] is returned if it overflows.
    #[must_use]
    pub fn total(&self) -> Option<Omr> {
        if self.terms.use_custom_monthly_rents {
            Omr::checked_sum(self.terms.custom_monthly_rents.iter().copied())
        } else {
            self.terms.monthly_rent.checked_mul(self.terms.duration)
        }
    }

    /// Returns the wire name of the field the rent of this [`Schedule`] comes
    /// from.
    #[must_use]
    pub fn field(&self) -> &'static str {
        if self.terms.use_custom_monthly_rents {
            "customMonthlyRents"
        } else {
            "monthlyRent"
        }
    }

    /// Iterates over the [`Period`]s of the term, in order.
    pub fn periods(&self) -> impl Iterator<Item = Period> + 't {
        let this = *self;
        (1..=self.terms.duration).map_while(move |number| {
            Some(Period {
                number,
                due_on: this.terms.start_date.add_months(number - 1)?,
                amount: this.amount(number)?,
            })
        })
    }
}

/// Single month of a [`Schedule`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// 1-based number of this [`Period`].
    pub number: u32,

    /// [`Date`] the rent of this [`Period`] is due on.
    pub due_on: Date,

    /// Rent of this [`Period`].
    pub amount: Omr,
}

/// Custom monthly rents don't cover the term month by month.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("expected {expected} custom monthly rents, found {actual}")]
pub struct LengthMismatch {
    /// Number of months in the term.
    pub expected: u32,

    /// Number of provided custom monthly rents.
    pub actual: usize,
}
