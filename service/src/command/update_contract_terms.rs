//! [`Command`] for updating [`Terms`] of an existing [`Contract`].

use std::collections::BTreeSet;

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use itertools::Itertools as _;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::contract::Terms;
use crate::{
    domain::{
        contract::{
            self,
            validation::{self, Scope},
            Section, SectionPatch, Violations,
        },
        Authorization, Contract,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating [`Terms`] of an existing [`Contract`] section by
/// section.
///
/// Only the fields of the touched [`Section`]s are merged into the currently
/// stored [`Terms`], so concurrent updates of unrelated [`Section`]s never
/// overwrite each other.
#[derive(Clone, Debug)]
pub struct UpdateContractTerms {
    /// ID of the [`Contract`] to update.
    pub contract_id: contract::Id,

    /// [`contract::Version`] the patches are based on, if known.
    ///
    /// If any touched [`Section`] was modified after it, the update is
    /// rejected.
    pub expected_version: Option<contract::Version>,

    /// [`SectionPatch`]es to apply.
    pub patches: Vec<SectionPatch>,

    /// [`Authorization`] of the user performing the update.
    pub authorization: Authorization,
}

impl<Db> Command<UpdateContractTerms> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateContractTerms,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateContractTerms {
            contract_id,
            expected_version,
            patches,
            authorization,
        } = cmd;

        let sections: BTreeSet<_> =
            patches.iter().map(SectionPatch::section).collect();
        if sections.is_empty() {
            return Err(tracerr::new!(E::NothingToUpdate));
        }

        let forbidden = authorization.forbidden(&sections);
        if !forbidden.is_empty() {
            return Err(tracerr::new!(E::Forbidden(forbidden)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize concurrent updates of the same `Contract`.
        tx.execute(Lock(By::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        if let Some(base) = expected_version {
            let conflicting = contract.conflicting_sections(base, &sections);
            if !conflicting.is_empty() {
                return Err(tracerr::new!(E::Conflict {
                    sections: conflicting,
                    current: contract.version,
                }));
            }
        }

        let mut terms = contract.terms.clone();
        for patch in patches {
            patch.apply(&mut terms);
        }

        let summary = validation::validate(&terms, Scope::Sections(&sections))
            .map_err(tracerr::from_and_wrap!(=> E))?;
        terms.apply_derived(&summary);

        contract.revise(terms, &sections);

        tx.execute(Update(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            contract_id = %contract.id,
            version = %contract.version,
            user_id = %authorization.user_id,
            sections = %sections.iter().join(","),
            "`Contract` terms updated",
        );

        Ok(contract)
    }
}

/// Error of [`UpdateContractTerms`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Touched [`Section`]s were modified after the expected version.
    #[display(
        "Sections {} were modified concurrently, current version is {current}",
        sections.iter().join(", "),
    )]
    #[from(ignore)]
    Conflict {
        /// Conflicting [`Section`]s.
        sections: BTreeSet<Section>,

        /// Current [`contract::Version`] of the [`Contract`].
        current: contract::Version,
    },

    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    #[from(ignore)]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// User may not edit some of the touched [`Section`]s.
    #[display("Not allowed to edit sections: {}", _0.iter().join(", "))]
    #[from(ignore)]
    Forbidden(#[error(not(source))] BTreeSet<Section>),

    /// Updated [`Terms`] violate some invariants.
    #[display("Invalid contract terms: {_0}")]
    Invalid(#[error(not(source))] Violations),

    /// No [`Section`] is touched.
    #[display("Nothing to update")]
    #[from(ignore)]
    NothingToUpdate,
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Omr,
    };

    use crate::{
        command::CreateContract,
        domain::{
            contract::{
                self,
                section::{DatesPatch, FinancialPatch, PaymentPatch},
                terms::{spec::base_terms, DepositPaymentMethod},
                violation::Kind,
                Section, Version,
            },
            user::{self, Role},
            Authorization, Contract,
        },
        infra::{Database as _, Memory},
        spec::service,
        Command as _, Service,
    };

    use super::{ExecutionError, UpdateContractTerms};

    fn omr(s: &str) -> Omr {
        s.parse().unwrap()
    }

    fn as_role(role: Role) -> Authorization {
        Authorization {
            user_id: user::Id::new(),
            role,
        }
    }

    async fn created(svc: &Service<Memory>) -> Contract {
        svc.execute(CreateContract {
            terms: base_terms(),
            authorization: as_role(Role::Admin),
        })
        .await
        .unwrap()
    }

    async fn stored(svc: &Service<Memory>, id: contract::Id) -> Contract {
        svc.database()
            .execute(Select(By::<Option<Contract>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
    }

    fn new_rent(
        contract: &Contract,
        base: Option<Version>,
        rent: &str,
    ) -> UpdateContractTerms {
        UpdateContractTerms {
            contract_id: contract.id,
            expected_version: base,
            patches: vec![FinancialPatch {
                monthly_rent: Some(omr(rent)),
                ..FinancialPatch::default()
            }
            .into()],
            authorization: as_role(Role::Accountant),
        }
    }

    fn new_end(
        contract: &Contract,
        base: Option<Version>,
    ) -> UpdateContractTerms {
        UpdateContractTerms {
            contract_id: contract.id,
            expected_version: base,
            patches: vec![DatesPatch {
                end_date: "2025-06-30".parse().ok(),
                duration: Some(18),
                ..DatesPatch::default()
            }
            .into()],
            authorization: as_role(Role::Agent),
        }
    }

    #[tokio::test]
    async fn merges_concurrent_edits_of_distinct_sections() {
        let svc = service();
        let contract = created(&svc).await;
        let base = Some(contract.version);

        let (financial, dates) = tokio::join!(
            svc.execute(new_rent(&contract, base, "550")),
            svc.execute(new_end(&contract, base)),
        );
        financial.unwrap();
        dates.unwrap();

        let stored = stored(&svc, contract.id).await;
        assert_eq!(stored.version, Version::INITIAL.next().next());
        assert_eq!(stored.terms.monthly_rent, omr("550"));
        assert_eq!(stored.terms.duration, 18);
        assert_eq!(stored.terms.municipality_fees, omr("297"));
        assert_eq!(stored.revisions[&Section::Payment], Version::INITIAL);
    }

    #[tokio::test]
    async fn detects_concurrent_edits_of_same_section() {
        let svc = service();
        let contract = created(&svc).await;
        let base = Some(contract.version);

        let (first, second) = tokio::join!(
            svc.execute(new_rent(&contract, base, "550")),
            svc.execute(new_rent(&contract, base, "600")),
        );

        let (ok, err) = match (first, second) {
            (Ok(c), Err(e)) | (Err(e), Ok(c)) => (c, e),
            (Ok(_), Ok(_)) | (Err(_), Err(_)) => {
                panic!("exactly one edit must succeed")
            }
        };
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Conflict { sections, current }
                if sections.contains(&Section::Financial)
                    && *current == ok.version,
        ));
        assert_eq!(stored(&svc, contract.id).await, ok);
    }

    #[tokio::test]
    async fn applies_without_expected_version() {
        let svc = service();
        let contract = created(&svc).await;

        drop(svc.execute(new_rent(&contract, None, "550")).await.unwrap());
        let updated =
            svc.execute(new_rent(&contract, None, "600")).await.unwrap();

        assert_eq!(updated.terms.monthly_rent, omr("600"));
        assert_eq!(updated.terms.total_vat_amount, Omr::ZERO);
    }

    #[tokio::test]
    async fn rejects_unknown_version() {
        let svc = service();
        let contract = created(&svc).await;

        let err = svc
            .execute(new_end(&contract, Some(contract.version.next())))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Conflict { .. }));
    }

    #[tokio::test]
    async fn keeps_stored_terms_on_violations() {
        let svc = service();
        let contract = created(&svc).await;

        let err = svc
            .execute(UpdateContractTerms {
                contract_id: contract.id,
                expected_version: Some(contract.version),
                patches: vec![
                    FinancialPatch {
                        deposit: Some(omr("1000")),
                        ..FinancialPatch::default()
                    }
                    .into(),
                    PaymentPatch {
                        deposit_payment_method: Some(
                            DepositPaymentMethod::CashAndCheck,
                        ),
                        deposit_cash_amount: Some(omr("400")),
                        ..PaymentPatch::default()
                    }
                    .into(),
                ],
                authorization: as_role(Role::Accountant),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Invalid(v)
                if v.contains(Kind::ChecksAmountMismatch),
        ));
        assert_eq!(stored(&svc, contract.id).await, contract);
    }

    #[tokio::test]
    async fn rejects_forbidden_sections() {
        let svc = service();
        let contract = created(&svc).await;

        let mut cmd = new_rent(&contract, None, "550");
        cmd.authorization = as_role(Role::Agent);
        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Forbidden(s) if s.contains(&Section::Financial),
        ));
        assert_eq!(stored(&svc, contract.id).await, contract);
    }

    #[tokio::test]
    async fn rejects_unknown_contract() {
        let svc = service();
        let mut contract = created(&svc).await;
        contract.id = contract::Id::new();

        let err = svc
            .execute(new_rent(&contract, None, "550"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractNotExists(id) if *id == contract.id,
        ));
    }
}
