//! [`Summary`] definitions.

use common::Omr;
use derive_more::{Display, Error as StdError, From};
use serde::Serialize;

use super::{
    fee::{self, Fees},
    rent::{self, Schedule},
    Terms,
};

/// Financial summary of [`Terms`].
///
/// The tenant's obligation and the owner's municipal obligation are kept
/// apart, as the tenant never pays municipality or utility pass-throughs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Rent of the whole term.
    pub total_rent: Omr,

    /// VAT charged on [`Summary::total_rent`].
    pub vat: Omr,

    /// Taxes other than VAT.
    pub other_taxes: Omr,

    /// Refundable deposit.
    pub deposit: Omr,

    /// Internet fees.
    pub internet: Omr,

    /// Other fees.
    pub other_fees: Omr,

    /// Everything the tenant owes.
    pub tenant_total: Omr,

    /// Municipality fee derived from [`Summary::total_rent`].
    pub municipality_fee: Omr,

    /// Municipality registration fee.
    pub municipality_registration_fee: Omr,

    /// Electricity bill.
    pub electricity_bill: Omr,

    /// Water bill.
    pub water_bill: Omr,

    /// Everything the owner owes to the municipality and utilities.
    pub owner_municipal_total: Omr,
}

impl Summary {
    /// Computes the [`Summary`] of the provided [`Terms`].
    ///
    /// # Errors
    ///
    /// If the rent [`Schedule`] or the VAT rate of the [`Terms`] is invalid,
    /// or the amounts sum up beyond the [`Omr`] range.
    pub fn compute(terms: &Terms) -> Result<Self, Error> {
        let schedule = Schedule::new(terms)?;
        let rent_field = schedule.field();
        let total_rent =
            schedule.total().ok_or(Error::Overflow(rent_field))?;
        let fees = Fees::new(terms, total_rent);

        let vat = fees.vat()?;
        let other_taxes = fees.other_taxes();
        let internet = fees.internet();
        let other_fees = fees.other_fees();
        let tenant_total = total(&[
            (rent_field, total_rent),
            ("vatRate", vat),
            ("totalOtherTaxAmount", other_taxes),
            ("deposit", terms.deposit),
            ("internetFees", internet),
            ("otherFeesAmount", other_fees),
        ])?;

        let municipality_fee = fees.municipality();
        let owner_municipal_total = total(&[
            (rent_field, municipality_fee),
            (
                "municipalityRegistrationFee",
                terms.municipality_registration_fee,
            ),
            ("electricityBillAmount", terms.electricity_bill_amount),
            ("waterBillAmount", terms.water_bill_amount),
        ])?;

        Ok(Self {
            total_rent,
            vat,
            other_taxes,
            deposit: terms.deposit,
            internet,
            other_fees,
            tenant_total,
            municipality_fee,
            municipality_registration_fee: terms.municipality_registration_fee,
            electricity_bill: terms.electricity_bill_amount,
            water_bill: terms.water_bill_amount,
            owner_municipal_total,
        })
    }
}

/// Sums up the provided amounts, each coming from the named wire field.
///
/// # Errors
///
/// With an [`Error::Overflow`] of the field whose amount overflows the sum.
fn total(parts: &[(&'static str, Omr)]) -> Result<Omr, Error> {
    parts.iter().try_fold(Omr::ZERO, |sum, &(field, amount)| {
        sum.checked_add(amount).ok_or(Error::Overflow(field))
    })
}

/// Error of computing a [`Summary`].
#[derive(Clone, Copy, Debug, Display, From, StdError)]
pub enum Error {
    /// Rent [`Schedule`] is invalid.
    #[display("Invalid rent schedule: {_0}")]
    ScheduleLength(rent::LengthMismatch),

    /// VAT rate is invalid.
    #[display("{_0}")]
    InvalidRate(fee::InvalidRate),

    /// Amount of the named wire field overflows a total.
    #[display("`{_0}` overflows the total amount")]
    #[from(ignore)]
    Overflow(#[error(not(source))] &'static str),
}

#[cfg(test)]
mod spec {
    use common::Omr;
    use rust_decimal::Decimal;

    use crate::domain::contract::terms::spec::base_terms;

    use super::{Error, Summary};

    fn omr(s: &str) -> Omr {
        s.parse().unwrap()
    }

    #[test]
    fn splits_tenant_and_owner_totals() {
        let mut terms = base_terms();
        terms.deposit = omr("1000");
        terms.includes_vat = true;
        terms.vat_rate = Decimal::new(5, 2);
        terms.has_other_taxes = true;
        terms.total_other_tax_amount = omr("20");
        terms.internet_included = true;
        terms.internet_fees = omr("25");
        terms.has_other_fees = true;
        terms.other_fees_amount = omr("40");
        terms.municipality_registration_fee = omr("10");
        terms.electricity_bill_amount = omr("30.5");
        terms.water_bill_amount = omr("12.25");

        let summary = Summary::compute(&terms).unwrap();

        assert_eq!(summary.total_rent, omr("6000"));
        assert_eq!(summary.vat, omr("300"));
        assert_eq!(summary.tenant_total, omr("7385"));
        assert_eq!(summary.municipality_fee, omr("180"));
        assert_eq!(summary.owner_municipal_total, omr("232.750"));
    }

    #[test]
    fn is_idempotent() {
        let mut terms = base_terms();
        terms.monthly_rent = omr("333.333");
        terms.includes_vat = true;

        let first = Summary::compute(&terms).unwrap();
        let second = Summary::compute(&terms).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap(),
        );
    }

    #[test]
    fn serializes_every_component() {
        let summary = Summary::compute(&base_terms()).unwrap();

        let json = serde_json::to_value(summary).unwrap();

        assert_eq!(json["totalRent"], "6000.000");
        assert_eq!(json["tenantTotal"], "6000.000");
        assert_eq!(json["municipalityFee"], "180.000");
        assert_eq!(json["ownerMunicipalTotal"], "180.000");
    }

    #[test]
    fn fails_on_invalid_inputs() {
        let mut terms = base_terms();
        terms.use_custom_monthly_rents = true;

        assert!(matches!(
            Summary::compute(&terms),
            Err(Error::ScheduleLength(_)),
        ));

        let mut terms = base_terms();
        terms.includes_vat = true;
        terms.vat_rate = Decimal::new(-1, 2);

        assert!(matches!(
            Summary::compute(&terms),
            Err(Error::InvalidRate(_)),
        ));
    }

    #[test]
    fn reports_overflowing_field() {
        let huge = omr("70000000000000000000000000000");

        let mut terms = base_terms();
        terms.monthly_rent = huge;
        assert!(matches!(
            Summary::compute(&terms),
            Err(Error::Overflow("monthlyRent")),
        ));

        let mut terms = base_terms();
        terms.deposit = huge;
        terms.internet_included = true;
        terms.internet_fees = huge;
        assert!(matches!(
            Summary::compute(&terms),
            Err(Error::Overflow("internetFees")),
        ));

        let mut terms = base_terms();
        terms.electricity_bill_amount = huge;
        terms.water_bill_amount = huge;
        assert!(matches!(
            Summary::compute(&terms),
            Err(Error::Overflow("waterBillAmount")),
        ));
    }
}
