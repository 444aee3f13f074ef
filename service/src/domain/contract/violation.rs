//! [`Violation`] definitions.

use std::fmt;

use derive_more::{Display, Error, From, IntoIterator};
use itertools::Itertools as _;
use serde::Serialize;
use strum::{Display as KindDisplay, EnumString};

/// Kind of a [`Violation`].
#[derive(
    Clone,
    Copy,
    Debug,
    EnumString,
    Eq,
    Hash,
    KindDisplay,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum Kind {
    /// Custom monthly rents don't cover the term month by month.
    ScheduleLengthMismatch,

    /// Checks don't sum up to the amount they cover.
    ChecksAmountMismatch,

    /// Check number occurs twice within a schedule.
    DuplicateCheckNumber,

    /// Check has no date where one is required.
    MissingCheckDate,

    /// Rate is out of the `[0, 1]` range.
    InvalidRate,

    /// Monetary field is below zero.
    NegativeAmount,

    /// Monetary field is too large to be summed up.
    AmountOverflow,

    /// Cash part of a deposit exceeds the deposit itself.
    CashExceedsDeposit,

    /// Check amount is zero or below.
    NonPositiveAmount,

    /// Schedule has more checks than allowed.
    CheckCountExceeded,

    /// Term dates don't span the declared number of whole months.
    DurationMismatch,

    /// Section was modified concurrently.
    Conflict,
}

/// Violated invariant of contract terms.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Violation {
    /// [`Kind`] of this [`Violation`].
    pub kind: Kind,

    /// Wire name of the offending field.
    pub field: &'static str,

    /// Index of the offending record within [`Violation::field`], if it's a
    /// sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// Human-readable description.
    pub message: String,
}

impl Violation {
    /// Creates a new [`Violation`] of a whole field.
    #[must_use]
    pub fn new(
        kind: Kind,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field,
            index: None,
            message: message.into(),
        }
    }

    /// Points this [`Violation`] at the record with the provided `index`.
    #[must_use]
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field)?;
        if let Some(i) = self.index {
            write!(f, "[{i}]")?;
        }
        write!(f, ": {} ({})", self.message, self.kind)
    }
}

/// Every [`Violation`] found at once.
#[derive(
    Clone,
    Debug,
    Default,
    Display,
    Eq,
    Error,
    From,
    IntoIterator,
    PartialEq,
    Serialize,
)]
#[display("{}", _0.iter().join("; "))]
#[serde(transparent)]
pub struct Violations(#[error(not(source))] Vec<Violation>);

impl Violations {
    /// Records the provided [`Violation`].
    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    /// Indicates whether no [`Violation`] is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the recorded [`Violation`]s.
    #[must_use]
    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    /// Indicates whether a [`Violation`] of the provided [`Kind`] is
    /// recorded.
    #[must_use]
    pub fn contains(&self, kind: Kind) -> bool {
        self.0.iter().any(|v| v.kind == kind)
    }

    /// Converts these [`Violations`] into a [`Result`], successful only if
    /// none is recorded.
    ///
    /// # Errors
    ///
    /// With these [`Violations`] if any is recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Extend<Violation> for Violations {
    fn extend<T: IntoIterator<Item = Violation>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}
