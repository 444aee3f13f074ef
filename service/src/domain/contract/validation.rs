//! Validation of [`Terms`] as a whole.

use std::collections::BTreeSet;

use common::{Omr, Rate};

use super::{
    check::{self, Requirements},
    summary,
    terms::{DepositPaymentMethod, RentPaymentMethod},
    violation::{Kind, Violation, Violations},
    Section, Summary, Terms,
};

/// Scope of check schedules to revalidate.
///
/// Field-level invariants are checked regardless of the [`Scope`].
#[derive(Clone, Copy, Debug)]
pub enum Scope<'s> {
    /// Every check schedule.
    Everything,

    /// Check schedules influenced by the provided touched [`Section`]s.
    Sections(&'s BTreeSet<Section>),
}

impl Scope<'_> {
    /// Sections influencing the rent checks.
    const RENT_CHECKS: &'static [Section] = &[
        Section::Checks,
        Section::Payment,
        Section::Financial,
        Section::Dates,
        Section::CustomRents,
    ];

    /// Sections influencing the deposit checks.
    const DEPOSIT_CHECKS: &'static [Section] =
        &[Section::Checks, Section::Payment, Section::Financial];

    /// Indicates whether any of the provided `sections` is in this [`Scope`].
    fn covers(self, sections: &[Section]) -> bool {
        match self {
            Self::Everything => true,
            Self::Sections(touched) => {
                sections.iter().any(|s| touched.contains(s))
            }
        }
    }
}

/// Validates the provided [`Terms`] and computes their [`Summary`].
///
/// # Errors
///
/// With every [`Violation`] found.
pub fn validate(
    terms: &Terms,
    scope: Scope<'_>,
) -> Result<Summary, Violations> {
    let mut violations = Violations::default();

    for (field, amount) in [
        ("monthlyRent", terms.monthly_rent),
        ("deposit", terms.deposit),
        ("depositCashAmount", terms.deposit_cash_amount),
        ("totalOtherTaxAmount", terms.total_other_tax_amount),
        ("municipalityRegistrationFee", terms.municipality_registration_fee),
        ("electricityBillAmount", terms.electricity_bill_amount),
        ("waterBillAmount", terms.water_bill_amount),
        ("internetFees", terms.internet_fees),
        ("otherFeesAmount", terms.other_fees_amount),
    ]
    .into_iter()
    .chain(terms.grace_period_amount.map(|a| ("gracePeriodAmount", a)))
    {
        if amount.is_negative() {
            violations.push(negative(field, amount));
        }
    }
    for (i, amount) in terms.custom_monthly_rents.iter().enumerate() {
        if amount.is_negative() {
            violations.push(negative("customMonthlyRents", *amount).at(i));
        }
    }

    let months = terms.start_date.whole_months_until(terms.end_date);
    if months != Some(terms.duration) {
        violations.push(Violation::new(
            Kind::DurationMismatch,
            "duration",
            match months {
                Some(n) => format!(
                    "{} to {} spans {n} months, not {}",
                    terms.start_date, terms.end_date, terms.duration,
                ),
                None => format!(
                    "{} to {} doesn't span whole months",
                    terms.start_date, terms.end_date,
                ),
            },
        ));
    }

    if Rate::new(terms.vat_rate).is_none() {
        violations.push(Violation::new(
            Kind::InvalidRate,
            "vatRate",
            format!("VAT rate {} is out of the `[0, 1]` range", terms.vat_rate),
        ));
    }

    let summary = match Summary::compute(terms) {
        Ok(s) => Some(s),
        Err(summary::Error::ScheduleLength(e)) => {
            violations.push(Violation::new(
                Kind::ScheduleLengthMismatch,
                "customMonthlyRents",
                e.to_string(),
            ));
            None
        }
        Err(summary::Error::Overflow(field)) => {
            violations.push(Violation::new(
                Kind::AmountOverflow,
                field,
                "amount sums up beyond the supported range",
            ));
            None
        }
        // Already reported above.
        Err(summary::Error::InvalidRate(_)) => None,
    };

    if let Some(total_rent) = summary.map(|s| s.total_rent) {
        if terms.rent_payment_method == RentPaymentMethod::Check
            && scope.covers(Scope::RENT_CHECKS)
        {
            let req = Requirements {
                expected_total: total_rent,
                max_count: Some(terms.duration),
                dates_required: true,
            };
            if let Err(e) =
                check::validate("rentChecks", &terms.rent_checks, &req)
            {
                violations.extend(e);
            }
        }
    }

    if terms.deposit_payment_method == DepositPaymentMethod::CashAndCheck
        && terms.deposit_cash_amount > terms.deposit
    {
        violations.push(Violation::new(
            Kind::CashExceedsDeposit,
            "depositCashAmount",
            format!(
                "cash amount {} exceeds the deposit of {}",
                terms.deposit_cash_amount, terms.deposit,
            ),
        ));
    }

    if scope.covers(Scope::DEPOSIT_CHECKS) {
        if let Some(expected_total) = deposit_by_checks(terms) {
            let req = Requirements {
                expected_total,
                max_count: None,
                dates_required: false,
            };
            if let Err(e) =
                check::validate("depositChecks", &terms.deposit_checks, &req)
            {
                violations.extend(e);
            }
        }
    }

    match summary {
        Some(s) if violations.is_empty() => Ok(s),
        _ => Err(violations),
    }
}

/// Returns the part of the deposit to be covered by checks, if any.
///
/// [`None`] is returned for a cash part exceeding the deposit as well.
fn deposit_by_checks(terms: &Terms) -> Option<Omr> {
    match terms.deposit_payment_method {
        DepositPaymentMethod::Check => Some(terms.deposit),
        DepositPaymentMethod::CashAndCheck => terms
            .deposit
            .checked_sub(terms.deposit_cash_amount)
            .filter(|a| !a.is_negative()),
        DepositPaymentMethod::Cash
        | DepositPaymentMethod::BankTransfer
        | DepositPaymentMethod::ElectronicPayment => None,
    }
}

/// Creates a [`Kind::NegativeAmount`] [`Violation`] of the provided `field`.
fn negative(field: &'static str, amount: Omr) -> Violation {
    Violation::new(
        Kind::NegativeAmount,
        field,
        format!("amount {amount} must not be negative"),
    )
}

#[cfg(test)]
mod spec {
    use std::collections::BTreeSet;

    use common::Omr;
    use rust_decimal::Decimal;

    use crate::domain::contract::{
        terms::{spec::base_terms, DepositPaymentMethod, RentPaymentMethod},
        violation::Kind,
        CheckRecord, Section, Terms, Violations,
    };

    use super::{validate, Scope};

    fn omr(s: &str) -> Omr {
        s.parse().unwrap()
    }

    fn check(number: &str, amount: &str, date: Option<&str>) -> CheckRecord {
        CheckRecord {
            check_number: number.into(),
            amount: omr(amount),
            date: date.map(|d| d.parse().unwrap()),
        }
    }

    fn kinds(violations: &Violations) -> Vec<Kind> {
        violations.as_slice().iter().map(|v| v.kind).collect()
    }

    fn cash_and_check_deposit(check_amount: &str) -> Terms {
        let mut terms = base_terms();
        terms.deposit = omr("1000.000");
        terms.deposit_payment_method = DepositPaymentMethod::CashAndCheck;
        terms.deposit_cash_amount = omr("400.000");
        terms.deposit_checks = vec![check("D-1", check_amount, None)];
        terms
    }

    #[test]
    fn flat_rent_scenario() {
        let summary = validate(&base_terms(), Scope::Everything).unwrap();

        assert_eq!(summary.total_rent, omr("6000.000"));
    }

    #[test]
    fn cash_and_check_deposit_scenario() {
        assert!(
            validate(&cash_and_check_deposit("600.000"), Scope::Everything)
                .is_ok()
        );

        let violations =
            validate(&cash_and_check_deposit("500.000"), Scope::Everything)
                .unwrap_err();

        assert_eq!(kinds(&violations), [Kind::ChecksAmountMismatch]);
        assert_eq!(violations.as_slice()[0].field, "depositChecks");
    }

    #[test]
    fn cash_and_check_deposit_tolerance() {
        assert!(
            validate(&cash_and_check_deposit("600.001"), Scope::Everything)
                .is_ok()
        );
        assert!(
            validate(&cash_and_check_deposit("599.998"), Scope::Everything)
                .is_err()
        );
    }

    #[test]
    fn vat_scenario() {
        let mut terms = base_terms();
        terms.includes_vat = true;
        terms.vat_rate = Decimal::new(5, 2);

        let summary = validate(&terms, Scope::Everything).unwrap();

        assert_eq!(summary.total_rent, omr("6000.000"));
        assert_eq!(summary.vat, omr("300.000"));
    }

    #[test]
    fn custom_rents_length_scenario() {
        let mut terms = base_terms();
        terms.start_date = "2024-01-01".parse().unwrap();
        terms.end_date = "2024-03-31".parse().unwrap();
        terms.duration = 3;
        terms.use_custom_monthly_rents = true;
        terms.custom_monthly_rents = vec![omr("100"), omr("200")];

        let violations = validate(&terms, Scope::Everything).unwrap_err();

        assert_eq!(kinds(&violations), [Kind::ScheduleLengthMismatch]);
    }

    #[test]
    fn custom_rents_total() {
        let mut terms = base_terms();
        terms.end_date = "2024-03-31".parse().unwrap();
        terms.duration = 3;
        terms.use_custom_monthly_rents = true;
        terms.custom_monthly_rents = vec![omr("100"), omr("200"), omr("300")];

        let summary = validate(&terms, Scope::Everything).unwrap();

        assert_eq!(summary.total_rent, omr("600"));
    }

    #[test]
    fn aggregates_field_violations() {
        let mut terms = base_terms();
        terms.duration = 11;
        terms.deposit = omr("-1");
        terms.vat_rate = Decimal::new(2, 0);
        terms.custom_monthly_rents = vec![omr("-5")];

        let violations = validate(&terms, Scope::Everything).unwrap_err();

        assert_eq!(
            kinds(&violations),
            [
                Kind::NegativeAmount,
                Kind::NegativeAmount,
                Kind::DurationMismatch,
                Kind::InvalidRate,
            ],
        );
        assert_eq!(violations.as_slice()[1].field, "customMonthlyRents");
        assert_eq!(violations.as_slice()[1].index, Some(0));
    }

    #[test]
    fn huge_amounts_are_violations() {
        let mut terms = base_terms();
        terms.monthly_rent = omr("7000000000000000000000000000");

        let violations = validate(&terms, Scope::Everything).unwrap_err();

        assert_eq!(kinds(&violations), [Kind::AmountOverflow]);
        assert_eq!(violations.as_slice()[0].field, "monthlyRent");

        let mut terms = base_terms();
        terms.end_date = "2024-02-29".parse().unwrap();
        terms.duration = 2;
        terms.use_custom_monthly_rents = true;
        terms.custom_monthly_rents = vec![
            omr("50000000000000000000000000000"),
            omr("50000000000000000000000000000"),
        ];

        let violations = validate(&terms, Scope::Everything).unwrap_err();

        assert_eq!(kinds(&violations), [Kind::AmountOverflow]);
        assert_eq!(violations.as_slice()[0].field, "customMonthlyRents");
    }

    #[test]
    fn cash_part_must_not_exceed_deposit() {
        let mut terms = cash_and_check_deposit("600.000");
        terms.deposit_cash_amount = omr("1100.000");

        let violations = validate(&terms, Scope::Everything).unwrap_err();

        assert_eq!(kinds(&violations), [Kind::CashExceedsDeposit]);
        assert_eq!(violations.as_slice()[0].field, "depositCashAmount");
    }

    #[test]
    fn accepts_month_end_term() {
        let mut terms = base_terms();
        terms.start_date = "2024-03-31".parse().unwrap();
        terms.end_date = "2024-04-30".parse().unwrap();
        terms.duration = 1;

        assert!(validate(&terms, Scope::Everything).is_ok());
    }

    #[test]
    fn rent_checks_cover_the_whole_term() {
        let mut terms = base_terms();
        terms.end_date = "2024-02-29".parse().unwrap();
        terms.duration = 2;
        terms.rent_payment_method = RentPaymentMethod::Check;
        terms.rent_checks = vec![
            check("R-1", "500", Some("2024-01-01")),
            check("R-2", "500", Some("2024-02-01")),
        ];

        assert!(validate(&terms, Scope::Everything).is_ok());

        terms.rent_checks[1].date = None;
        let violations = validate(&terms, Scope::Everything).unwrap_err();

        assert_eq!(kinds(&violations), [Kind::MissingCheckDate]);

        terms.rent_checks.push(check("R-3", "0.001", Some("2024-03-01")));
        terms.rent_checks[1].date = "2024-02-01".parse().ok();
        let violations = validate(&terms, Scope::Everything).unwrap_err();

        assert_eq!(kinds(&violations), [Kind::CheckCountExceeded]);
    }

    #[test]
    fn revalidates_only_influenced_schedules() {
        let mut terms = cash_and_check_deposit("500.000");
        terms.rent_payment_method = RentPaymentMethod::Check;

        let meters = BTreeSet::from([Section::Meters]);
        assert!(validate(&terms, Scope::Sections(&meters)).is_ok());

        let dates = BTreeSet::from([Section::Dates]);
        let violations =
            validate(&terms, Scope::Sections(&dates)).unwrap_err();
        assert_eq!(kinds(&violations), [Kind::ChecksAmountMismatch]);
        assert_eq!(violations.as_slice()[0].field, "rentChecks");

        let payment = BTreeSet::from([Section::Payment]);
        let violations =
            validate(&terms, Scope::Sections(&payment)).unwrap_err();
        assert_eq!(
            kinds(&violations),
            [Kind::ChecksAmountMismatch, Kind::ChecksAmountMismatch],
        );
    }

    #[test]
    fn wire_round_trip_revalidates() {
        let mut terms = cash_and_check_deposit("600");
        terms.includes_vat = true;
        terms.rent_payment_method = RentPaymentMethod::Check;
        terms.rent_checks = (1..=12)
            .map(|m| {
                let date = format!("2024-{m:02}-01");
                check(&format!("R-{m}"), "500", Some(date.as_str()))
            })
            .collect();
        let summary = validate(&terms, Scope::Everything).unwrap();
        terms.apply_derived(&summary);

        let json = serde_json::to_string(&terms).unwrap();
        let parsed: Terms = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, terms);
        assert_eq!(validate(&parsed, Scope::Everything).unwrap(), summary);
    }
}
