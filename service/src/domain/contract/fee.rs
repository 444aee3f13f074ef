//! Fees and taxes of [`Terms`].

use common::{Omr, Rate};
use derive_more::{Display, Error};
use rust_decimal::Decimal;

use super::Terms;

/// Share of the total rent the owner pays to the municipality.
#[expect(unsafe_code, reason = "constant within range")]
pub const MUNICIPALITY_FEE_RATE: Rate =
    unsafe { Rate::new_unchecked(Decimal::from_parts(3, 0, 0, false, 2)) };

/// Calculator of fee and tax contributions.
#[derive(Clone, Copy, Debug)]
pub struct Fees<'t> {
    /// [`Terms`] the contributions are calculated of.
    terms: &'t Terms,

    /// Rent of the whole term.
    total_rent: Omr,
}

impl<'t> Fees<'t> {
    /// Creates a new [`Fees`] calculator of the provided [`Terms`], whose
    /// whole-term rent is `total_rent`.
    #[must_use]
    pub fn new(terms: &'t Terms, total_rent: Omr) -> Self {
        Self { terms, total_rent }
    }

    /// Returns the VAT charged on the total rent, if VAT is included.
    ///
    /// # Errors
    ///
    /// With an [`InvalidRate`] if VAT is included, but its rate is out of the
    /// `[0, 1]` range.
    pub fn vat(&self) -> Result<Omr, InvalidRate> {
        if !self.terms.includes_vat {
            return Ok(Omr::ZERO);
        }
        Rate::new(self.terms.vat_rate)
            .map(|rate| rate.of(self.total_rent))
            .ok_or(InvalidRate(self.terms.vat_rate))
    }

    /// Returns the owner-side municipality fee.
    #[must_use]
    pub fn municipality(&self) -> Omr {
        MUNICIPALITY_FEE_RATE.of(self.total_rent)
    }

    /// Returns the internet fees, if internet is included.
    #[must_use]
    pub fn internet(&self) -> Omr {
        if self.terms.internet_included {
            self.terms.internet_fees
        } else {
            Omr::ZERO
        }
    }

    /// Returns the other fees, if any apply.
    #[must_use]
    pub fn other_fees(&self) -> Omr {
        if self.terms.has_other_fees {
            self.terms.other_fees_amount
        } else {
            Omr::ZERO
        }
    }

    /// Returns the taxes other than VAT, if any apply.
    #[must_use]
    pub fn other_taxes(&self) -> Omr {
        if self.terms.has_other_taxes {
            self.terms.total_other_tax_amount
        } else {
            Omr::ZERO
        }
    }
}

/// VAT rate is out of the `[0, 1]` range.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("VAT rate {_0} is out of the `[0, 1]` range")]
pub struct InvalidRate(#[error(not(source))] pub Decimal);

#[cfg(test)]
mod spec {
    use common::Omr;
    use rust_decimal::Decimal;

    use crate::domain::contract::terms::spec::base_terms;

    use super::{Fees, InvalidRate};

    fn omr(s: &str) -> Omr {
        s.parse().unwrap()
    }

    #[test]
    fn vat_of_total_rent() {
        let mut terms = base_terms();
        terms.includes_vat = true;
        terms.vat_rate = Decimal::new(5, 2);

        assert_eq!(Fees::new(&terms, omr("6000")).vat(), Ok(omr("300.000")));

        terms.includes_vat = false;

        assert_eq!(Fees::new(&terms, omr("6000")).vat(), Ok(Omr::ZERO));
    }

    #[test]
    fn rejects_out_of_range_vat_rate() {
        let mut terms = base_terms();
        terms.includes_vat = true;
        terms.vat_rate = Decimal::new(5, 0);

        assert_eq!(
            Fees::new(&terms, omr("6000")).vat(),
            Err(InvalidRate(Decimal::new(5, 0))),
        );

        terms.includes_vat = false;

        assert_eq!(Fees::new(&terms, omr("6000")).vat(), Ok(Omr::ZERO));
    }

    #[test]
    fn municipality_fee_ignores_vat() {
        let mut terms = base_terms();
        let fees = Fees::new(&terms, omr("6000"));

        assert_eq!(fees.municipality(), omr("180"));

        terms.includes_vat = true;

        assert_eq!(Fees::new(&terms, omr("6000")).municipality(), omr("180"));
        assert_eq!(
            Fees::new(&terms, omr("333.35")).municipality(),
            omr("10.001"),
        );
    }

    #[test]
    fn optional_contributions() {
        let mut terms = base_terms();
        terms.internet_fees = omr("25");
        terms.other_fees_amount = omr("40");
        terms.total_other_tax_amount = omr("15");

        let fees = Fees::new(&terms, omr("6000"));
        assert_eq!(fees.internet(), Omr::ZERO);
        assert_eq!(fees.other_fees(), Omr::ZERO);
        assert_eq!(fees.other_taxes(), Omr::ZERO);

        terms.internet_included = true;
        terms.has_other_fees = true;
        terms.has_other_taxes = true;

        let fees = Fees::new(&terms, omr("6000"));
        assert_eq!(fees.internet(), omr("25"));
        assert_eq!(fees.other_fees(), omr("40"));
        assert_eq!(fees.other_taxes(), omr("15"));
    }
}
