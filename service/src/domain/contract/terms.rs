//! [`Terms`] definitions.

use common::{define_kind, Date, Omr};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Summary;

/// Financial terms of a rental [`Contract`].
///
/// Defaults of the optional fields are applied once, while deserializing.
///
/// [`Contract`]: super::Contract
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Terms {
    /// First day of the term.
    pub start_date: Date,

    /// Last day of the term, inclusive.
    pub end_date: Date,

    /// Number of whole months between [`Terms::start_date`] and
    /// [`Terms::end_date`].
    pub duration: u32,

    /// Grace window after a due date, in days.
    #[serde(default)]
    pub grace_period_days: Option<u32>,

    /// Amount tolerated during the grace window.
    #[serde(default)]
    pub grace_period_amount: Option<Omr>,

    /// Flat rent of every month.
    pub monthly_rent: Omr,

    /// Whether [`Terms::custom_monthly_rents`] override
    /// [`Terms::monthly_rent`].
    #[serde(default)]
    pub use_custom_monthly_rents: bool,

    /// Rent of every month of the term, in order.
    #[serde(default)]
    pub custom_monthly_rents: Vec<Omr>,

    /// Refundable security amount.
    #[serde(default)]
    pub deposit: Omr,

    /// Whether VAT is charged on the rent.
    #[serde(default, rename = "includesVAT")]
    pub includes_vat: bool,

    /// VAT rate as a fraction (`0.05` is 5%).
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,

    /// VAT charged for the whole term.
    ///
    /// Derived, see [`Terms::apply_derived()`].
    #[serde(default, rename = "totalVATAmount")]
    pub total_vat_amount: Omr,

    /// Whether taxes other than VAT apply.
    #[serde(default)]
    pub has_other_taxes: bool,

    /// Total of taxes other than VAT.
    #[serde(default)]
    pub total_other_tax_amount: Omr,

    /// How the rent is paid.
    #[serde(default)]
    pub rent_payment_method: RentPaymentMethod,

    /// How the deposit is paid.
    #[serde(default)]
    pub deposit_payment_method: DepositPaymentMethod,

    /// Cash portion of a [`DepositPaymentMethod::CashAndCheck`] deposit.
    #[serde(default)]
    pub deposit_cash_amount: Omr,

    /// Checks covering the rent.
    #[serde(default)]
    pub rent_checks: Vec<CheckRecord>,

    /// Bank of the rent checks.
    #[serde(default)]
    pub rent_bank_name: Option<String>,

    /// Bank branch of the rent checks.
    #[serde(default)]
    pub rent_bank_branch: Option<String>,

    /// Bank account of the rent checks.
    #[serde(default)]
    pub rent_bank_account: Option<String>,

    /// Checks covering the deposit.
    #[serde(default)]
    pub deposit_checks: Vec<CheckRecord>,

    /// Bank of the deposit checks.
    #[serde(default)]
    pub deposit_bank_name: Option<String>,

    /// Bank branch of the deposit checks.
    #[serde(default)]
    pub deposit_bank_branch: Option<String>,

    /// Bank account of the deposit checks.
    #[serde(default)]
    pub deposit_bank_account: Option<String>,

    /// References of the attached documents.
    #[serde(default)]
    pub documents: Vec<String>,

    /// Owner-side municipality registration fee.
    #[serde(default)]
    pub municipality_registration_fee: Omr,

    /// Owner-side municipality fee for the whole term.
    ///
    /// Derived, see [`Terms::apply_derived()`].
    #[serde(default)]
    pub municipality_fees: Omr,

    /// Number of the electricity meter.
    #[serde(default)]
    pub electricity_meter_number: Option<String>,

    /// Number of the water meter.
    #[serde(default)]
    pub water_meter_number: Option<String>,

    /// Owner-side electricity bill.
    #[serde(default)]
    pub electricity_bill_amount: Omr,

    /// Owner-side water bill.
    #[serde(default)]
    pub water_bill_amount: Omr,

    /// Whether internet is included.
    #[serde(default)]
    pub internet_included: bool,

    /// Billing period of [`Terms::internet_fees`].
    #[serde(default)]
    pub internet_payment_type: InternetPaymentType,

    /// Internet fees, taken as entered.
    #[serde(default)]
    pub internet_fees: Omr,

    /// Whether other fees apply.
    #[serde(default)]
    pub has_other_fees: bool,

    /// Description of other fees.
    #[serde(default)]
    pub other_fees_description: Option<String>,

    /// Amount of other fees.
    #[serde(default)]
    pub other_fees_amount: Omr,
}

/// Default VAT rate in Oman.
fn default_vat_rate() -> Decimal {
    Decimal::new(5, 2)
}

impl Terms {
    /// Overwrites the derived fields with the values of the provided
    /// [`Summary`].
    pub fn apply_derived(&mut self, summary: &Summary) {
        self.total_vat_amount = summary.vat;
        self.municipality_fees = summary.municipality_fee;
    }
}

define_kind! {
    #[doc = "Method of paying the rent."]
    enum RentPaymentMethod {
        #[doc = "Cash."]
        Cash = 1,

        #[doc = "Post-dated checks."]
        Check = 2,

        #[doc = "Bank transfer."]
        BankTransfer = 3,

        #[doc = "Electronic payment."]
        ElectronicPayment = 4,
    }
}

impl Default for RentPaymentMethod {
    fn default() -> Self {
        Self::Cash
    }
}

define_kind! {
    #[doc = "Method of paying the deposit."]
    enum DepositPaymentMethod {
        #[doc = "Cash."]
        Cash = 1,

        #[doc = "Checks."]
        Check = 2,

        #[doc = "Cash portion plus checks covering the remainder."]
        CashAndCheck = 3,

        #[doc = "Bank transfer."]
        BankTransfer = 4,

        #[doc = "Electronic payment."]
        ElectronicPayment = 5,
    }
}

impl Default for DepositPaymentMethod {
    fn default() -> Self {
        Self::Cash
    }
}

define_kind! {
    #[doc = "Billing period of internet fees."]
    enum InternetPaymentType {
        #[doc = "Billed monthly."]
        Monthly = 1,

        #[doc = "Billed annually."]
        Annually = 2,
    }
}

impl Default for InternetPaymentType {
    fn default() -> Self {
        Self::Monthly
    }
}

/// Single check of a schedule.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "WireCheck", into = "WireCheck")]
pub struct CheckRecord {
    /// Number of this check, unique within its schedule.
    pub check_number: String,

    /// Amount of this check.
    pub amount: Omr,

    /// Date this check is cashed on, if any.
    pub date: Option<Date>,
}

/// [`CheckRecord`] as it appears on the wire.
///
/// `hasDate: false` discards the `date`, even if present.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireCheck {
    #[serde(default)]
    check_number: String,
    amount: Omr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<Date>,
    #[serde(default)]
    has_date: Option<bool>,
}

impl From<WireCheck> for CheckRecord {
    fn from(wire: WireCheck) -> Self {
        Self {
            check_number: wire.check_number,
            amount: wire.amount,
            date: wire.date.filter(|_| wire.has_date != Some(false)),
        }
    }
}

impl From<CheckRecord> for WireCheck {
    fn from(check: CheckRecord) -> Self {
        Self {
            check_number: check.check_number,
            amount: check.amount,
            has_date: Some(check.date.is_some()),
            date: check.date,
        }
    }
}
