//! Validation of [`CheckRecord`] schedules.

use std::collections::HashSet;

use common::Omr;

use super::{
    violation::{Kind, Violation, Violations},
    CheckRecord,
};

/// Maximum difference tolerated between the sum of a schedule and the amount
/// it covers.
pub const TOLERANCE: Omr = Omr::FILS;

/// What a schedule of [`CheckRecord`]s must satisfy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Requirements {
    /// Amount the checks must sum up to.
    pub expected_total: Omr,

    /// Maximum number of checks, if limited.
    pub max_count: Option<u32>,

    /// Whether every check must be dated.
    pub dates_required: bool,
}

/// Validates the provided `checks` against the [`Requirements`], reporting
/// violations at the provided wire `field`.
///
/// Check numbers are compared with surrounding whitespace trimmed. Blank
/// numbers are not compared at all.
///
/// # Errors
///
/// With every [`Violation`] found.
pub fn validate(
    field: &'static str,
    checks: &[CheckRecord],
    req: &Requirements,
) -> Result<(), Violations> {
    let mut violations = Violations::default();

    for (i, check) in checks.iter().enumerate() {
        if !check.amount.is_positive() {
            violations.push(
                Violation::new(
                    Kind::NonPositiveAmount,
                    field,
                    format!("check amount {} must be positive", check.amount),
                )
                .at(i),
            );
        }
    }

    if req.dates_required {
        let undated =
            checks.iter().enumerate().filter(|(_, c)| c.date.is_none());
        for (i, _) in undated {
            violations.push(
                Violation::new(
                    Kind::MissingCheckDate,
                    field,
                    "check has no date",
                )
                .at(i),
            );
        }
    }

    let mut seen = HashSet::with_capacity(checks.len());
    for (i, check) in checks.iter().enumerate() {
        let number = check.check_number.trim();
        if !number.is_empty() && !seen.insert(number) {
            violations.push(
                Violation::new(
                    Kind::DuplicateCheckNumber,
                    field,
                    format!("check number `{number}` is already used"),
                )
                .at(i),
            );
        }
    }

    match Omr::checked_sum(checks.iter().map(|c| c.amount)) {
        Some(total) => {
            let diff = total.abs_diff(req.expected_total);
            if !diff.is_some_and(|d| d <= TOLERANCE) {
                violations.push(Violation::new(
                    Kind::ChecksAmountMismatch,
                    field,
                    format!(
                        "checks sum up to {total}, expected {}",
                        req.expected_total,
                    ),
                ));
            }
        }
        None => violations.push(Violation::new(
            Kind::AmountOverflow,
            field,
            "checks sum up beyond the supported range",
        )),
    }

    if let Some(max) = req.max_count {
        if usize::try_from(max).is_ok_and(|max| checks.len() > max) {
            violations.push(Violation::new(
                Kind::CheckCountExceeded,
                field,
                format!("{} checks exceed the limit of {max}", checks.len()),
            ));
        }
    }

    violations.into_result()
}
