//! [`Section`] definitions.

use common::{define_kind, Date, Omr};
use derive_more::From;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::{
    terms::{DepositPaymentMethod, InternetPaymentType, RentPaymentMethod},
    CheckRecord, Terms,
};

define_kind! {
    #[doc = "Section of [`Terms`] edited as a whole."]
    enum Section {
        #[doc = "Term dates, duration and grace period."]
        Dates = 1,

        #[doc = "Rent, deposit and taxes."]
        Financial = 2,

        #[doc = "Rent and deposit payment methods."]
        Payment = 3,

        #[doc = "Rent and deposit check schedules."]
        Checks = 4,

        #[doc = "Attached documents."]
        Documents = 5,

        #[doc = "Utility meters and bills."]
        Meters = 6,

        #[doc = "Internet subscription."]
        Internet = 7,

        #[doc = "Other fees charged to the tenant."]
        OtherFees = 8,

        #[doc = "Per-month rent overrides."]
        CustomRents = 9,
    }
}

/// Overwrites `field` with the provided `value`, if any.
fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *field = v;
    }
}

/// Deserializes a present field into [`Some`], so an explicit `null` becomes
/// `Some(None)` while an absent field stays [`None`].
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Patch of the [`Section::Dates`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DatesPatch {
    /// New first day of the term.
    pub start_date: Option<Date>,

    /// New last day of the term.
    pub end_date: Option<Date>,

    /// New number of months in the term.
    pub duration: Option<u32>,

    /// New grace window in days.
    #[serde(deserialize_with = "nullable")]
    pub grace_period_days: Option<Option<u32>>,

    /// New amount tolerated during the grace window.
    #[serde(deserialize_with = "nullable")]
    pub grace_period_amount: Option<Option<Omr>>,
}

impl DatesPatch {
    fn apply(self, terms: &mut Terms) {
        set(&mut terms.start_date, self.start_date);
        set(&mut terms.end_date, self.end_date);
        set(&mut terms.duration, self.duration);
        set(&mut terms.grace_period_days, self.grace_period_days);
        set(&mut terms.grace_period_amount, self.grace_period_amount);
    }
}

/// Patch of the [`Section::Financial`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialPatch {
    /// New flat monthly rent.
    pub monthly_rent: Option<Omr>,

    /// New deposit.
    pub deposit: Option<Omr>,

    /// Whether VAT is charged on the rent.
    #[serde(rename = "includesVAT")]
    pub includes_vat: Option<bool>,

    /// New VAT rate as a fraction.
    pub vat_rate: Option<Decimal>,

    /// Whether other taxes apply.
    pub has_other_taxes: Option<bool>,

    /// New total of other taxes.
    pub total_other_tax_amount: Option<Omr>,

    /// New municipality registration fee.
    pub municipality_registration_fee: Option<Omr>,
}

impl FinancialPatch {
    fn apply(self, terms: &mut Terms) {
        set(&mut terms.monthly_rent, self.monthly_rent);
        set(&mut terms.deposit, self.deposit);
        set(&mut terms.includes_vat, self.includes_vat);
        set(&mut terms.vat_rate, self.vat_rate);
        set(&mut terms.has_other_taxes, self.has_other_taxes);
        set(&mut terms.total_other_tax_amount, self.total_other_tax_amount);
        set(
            &mut terms.municipality_registration_fee,
            self.municipality_registration_fee,
        );
    }
}

/// Patch of the [`Section::Payment`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentPatch {
    /// New [`RentPaymentMethod`].
    pub rent_payment_method: Option<RentPaymentMethod>,

    /// New [`DepositPaymentMethod`].
    pub deposit_payment_method: Option<DepositPaymentMethod>,

    /// New cash portion of the deposit.
    pub deposit_cash_amount: Option<Omr>,
}

impl PaymentPatch {
    fn apply(self, terms: &mut Terms) {
        set(&mut terms.rent_payment_method, self.rent_payment_method);
        set(&mut terms.deposit_payment_method, self.deposit_payment_method);
        set(&mut terms.deposit_cash_amount, self.deposit_cash_amount);
    }
}

/// Patch of the [`Section::Checks`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChecksPatch {
    /// New rent checks, replacing the whole schedule.
    pub rent_checks: Option<Vec<CheckRecord>>,

    /// New bank of the rent checks.
    #[serde(deserialize_with = "nullable")]
    pub rent_bank_name: Option<Option<String>>,

    /// New bank branch of the rent checks.
    #[serde(deserialize_with = "nullable")]
    pub rent_bank_branch: Option<Option<String>>,

    /// New bank account of the rent checks.
    #[serde(deserialize_with = "nullable")]
    pub rent_bank_account: Option<Option<String>>,

    /// New deposit checks, replacing the whole schedule.
    pub deposit_checks: Option<Vec<CheckRecord>>,

    /// New bank of the deposit checks.
    #[serde(deserialize_with = "nullable")]
    pub deposit_bank_name: Option<Option<String>>,

    /// New bank branch of the deposit checks.
    #[serde(deserialize_with = "nullable")]
    pub deposit_bank_branch: Option<Option<String>>,

    /// New bank account of the deposit checks.
    #[serde(deserialize_with = "nullable")]
    pub deposit_bank_account: Option<Option<String>>,
}

impl ChecksPatch {
    fn apply(self, terms: &mut Terms) {
        set(&mut terms.rent_checks, self.rent_checks);
        set(&mut terms.rent_bank_name, self.rent_bank_name);
        set(&mut terms.rent_bank_branch, self.rent_bank_branch);
        set(&mut terms.rent_bank_account, self.rent_bank_account);
        set(&mut terms.deposit_checks, self.deposit_checks);
        set(&mut terms.deposit_bank_name, self.deposit_bank_name);
        set(&mut terms.deposit_bank_branch, self.deposit_bank_branch);
        set(&mut terms.deposit_bank_account, self.deposit_bank_account);
    }
}

/// Patch of the [`Section::Documents`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentsPatch {
    /// New document references, replacing the whole list.
    pub documents: Option<Vec<String>>,
}

impl DocumentsPatch {
    fn apply(self, terms: &mut Terms) {
        set(&mut terms.documents, self.documents);
    }
}

/// Patch of the [`Section::Meters`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MetersPatch {
    /// New electricity meter number.
    #[serde(deserialize_with = "nullable")]
    pub electricity_meter_number: Option<Option<String>>,

    /// New water meter number.
    #[serde(deserialize_with = "nullable")]
    pub water_meter_number: Option<Option<String>>,

    /// New electricity bill amount.
    pub electricity_bill_amount: Option<Omr>,

    /// New water bill amount.
    pub water_bill_amount: Option<Omr>,
}

impl MetersPatch {
    fn apply(self, terms: &mut Terms) {
        set(
            &mut terms.electricity_meter_number,
            self.electricity_meter_number,
        );
        set(&mut terms.water_meter_number, self.water_meter_number);
        set(
            &mut terms.electricity_bill_amount,
            self.electricity_bill_amount,
        );
        set(&mut terms.water_bill_amount, self.water_bill_amount);
    }
}

/// Patch of the [`Section::Internet`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InternetPatch {
    /// Whether internet is included.
    pub internet_included: Option<bool>,

    /// New [`InternetPaymentType`].
    pub internet_payment_type: Option<InternetPaymentType>,

    /// New internet fees.
    pub internet_fees: Option<Omr>,
}

impl InternetPatch {
    fn apply(self, terms: &mut Terms) {
        set(&mut terms.internet_included, self.internet_included);
        set(&mut terms.internet_payment_type, self.internet_payment_type);
        set(&mut terms.internet_fees, self.internet_fees);
    }
}

/// Patch of the [`Section::OtherFees`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OtherFeesPatch {
    /// Whether other fees apply.
    pub has_other_fees: Option<bool>,

    /// New description of other fees.
    #[serde(deserialize_with = "nullable")]
    pub other_fees_description: Option<Option<String>>,

    /// New amount of other fees.
    pub other_fees_amount: Option<Omr>,
}

impl OtherFeesPatch {
    fn apply(self, terms: &mut Terms) {
        set(&mut terms.has_other_fees, self.has_other_fees);
        set(&mut terms.other_fees_description, self.other_fees_description);
        set(&mut terms.other_fees_amount, self.other_fees_amount);
    }
}

/// Patch of the [`Section::CustomRents`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomRentsPatch {
    /// Whether per-month rents override the flat one.
    pub use_custom_monthly_rents: Option<bool>,

    /// New per-month rents, replacing the whole list.
    pub custom_monthly_rents: Option<Vec<Omr>>,
}

impl CustomRentsPatch {
    fn apply(self, terms: &mut Terms) {
        set(
            &mut terms.use_custom_monthly_rents,
            self.use_custom_monthly_rents,
        );
        set(&mut terms.custom_monthly_rents, self.custom_monthly_rents);
    }
}

/// Patch of a single [`Section`].
#[derive(Clone, Debug, From, PartialEq)]
pub enum SectionPatch {
    #[doc(hidden)]
    Dates(DatesPatch),
    #[doc(hidden)]
    Financial(FinancialPatch),
    #[doc(hidden)]
    Payment(PaymentPatch),
    #[doc(hidden)]
    Checks(ChecksPatch),
    #[doc(hidden)]
    Documents(DocumentsPatch),
    #[doc(hidden)]
    Meters(MetersPatch),
    #[doc(hidden)]
    Internet(InternetPatch),
    #[doc(hidden)]
    OtherFees(OtherFeesPatch),
    #[doc(hidden)]
    CustomRents(CustomRentsPatch),
}

impl SectionPatch {
    /// Returns the [`Section`] this [`SectionPatch`] touches.
    #[must_use]
    pub fn section(&self) -> Section {
        match self {
            Self::Dates(_) => Section::Dates,
            Self::Financial(_) => Section::Financial,
            Self::Payment(_) => Section::Payment,
            Self::Checks(_) => Section::Checks,
            Self::Documents(_) => Section::Documents,
            Self::Meters(_) => Section::Meters,
            Self::Internet(_) => Section::Internet,
            Self::OtherFees(_) => Section::OtherFees,
            Self::CustomRents(_) => Section::CustomRents,
        }
    }

    /// Overwrites the fields of `terms` this [`SectionPatch`] carries, leaving
    /// every other field intact.
    pub fn apply(self, terms: &mut Terms) {
        match self {
            Self::Dates(p) => p.apply(terms),
            Self::Financial(p) => p.apply(terms),
            Self::Payment(p) => p.apply(terms),
            Self::Checks(p) => p.apply(terms),
            Self::Documents(p) => p.apply(terms),
            Self::Meters(p) => p.apply(terms),
            Self::Internet(p) => p.apply(terms),
            Self::OtherFees(p) => p.apply(terms),
            Self::CustomRents(p) => p.apply(terms),
        }
    }
}

/// Partial [`Terms`] as received from a client, possibly touching several
/// [`Section`]s at once.
///
/// Derived fields (`totalVATAmount`, `municipalityFees`) and unknown fields
/// are ignored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Patch {
    #[serde(flatten)]
    dates: DatesPatch,
    #[serde(flatten)]
    financial: FinancialPatch,
    #[serde(flatten)]
    payment: PaymentPatch,
    #[serde(flatten)]
    checks: ChecksPatch,
    #[serde(flatten)]
    documents: DocumentsPatch,
    #[serde(flatten)]
    meters: MetersPatch,
    #[serde(flatten)]
    internet: InternetPatch,
    #[serde(flatten)]
    other_fees: OtherFeesPatch,
    #[serde(flatten)]
    custom_rents: CustomRentsPatch,
}

impl Patch {
    /// Splits this [`Patch`] into [`SectionPatch`]es, skipping the
    /// [`Section`]s it doesn't touch.
    #[must_use]
    pub fn into_sections(self) -> Vec<SectionPatch> {
        let Self {
            dates,
            financial,
            payment,
            checks,
            documents,
            meters,
            internet,
            other_fees,
            custom_rents,
        } = self;

        [
            (dates != DatesPatch::default()).then(|| dates.into()),
            (financial != FinancialPatch::default()).then(|| financial.into()),
            (payment != PaymentPatch::default()).then(|| payment.into()),
            (checks != ChecksPatch::default()).then(|| checks.into()),
            (documents != DocumentsPatch::default()).then(|| documents.into()),
            (meters != MetersPatch::default()).then(|| meters.into()),
            (internet != InternetPatch::default()).then(|| internet.into()),
            (other_fees != OtherFeesPatch::default())
                .then(|| other_fees.into()),
            (custom_rents != CustomRentsPatch::default())
                .then(|| custom_rents.into()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
