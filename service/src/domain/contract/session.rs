//! [`EditSession`] definitions.

use derive_more::{Display, Error};

use crate::{
    command::{Command, UpdateContractTerms},
    domain::Authorization,
};

use super::{Contract, Section, SectionPatch};

/// State of an [`EditSession`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// Nothing is being edited.
    Viewing,

    /// [`Section`] is being edited.
    Editing(Section),

    /// Edited [`Section`] is being saved.
    Saving(Section),
}

/// Editing of a [`Contract`] one [`Section`] at a time.
///
/// Saves are based on the [`Contract`] version observed by this
/// [`EditSession`], so a [`Section`] modified elsewhere in the meantime is
/// reported as a conflict instead of being overwritten.
#[derive(Clone, Debug)]
pub struct EditSession {
    /// Current [`Contract`].
    contract: Contract,

    /// [`Authorization`] of the editing user.
    authorization: Authorization,

    /// Current [`State`].
    state: State,
}

impl EditSession {
    /// Opens a new [`EditSession`] viewing the provided [`Contract`].
    #[must_use]
    pub fn open(contract: Contract, authorization: Authorization) -> Self {
        Self {
            contract,
            authorization,
            state: State::Viewing,
        }
    }

    /// Returns the current [`Contract`].
    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Returns the current [`State`].
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Starts editing the provided [`Section`].
    ///
    /// # Errors
    ///
    /// If another [`Section`] is being edited or saved, or the user may not
    /// edit the provided one.
    pub fn begin(&mut self, section: Section) -> Result<(), TransitionError> {
        match self.state {
            State::Viewing => {}
            State::Editing(s) | State::Saving(s) => {
                return Err(TransitionError::AlreadyEditing(s));
            }
        }
        if !self.authorization.role.can_edit(section) {
            return Err(TransitionError::Forbidden(section));
        }
        self.state = State::Editing(section);
        Ok(())
    }

    /// Stops editing without saving anything.
    ///
    /// # Errors
    ///
    /// If nothing is being edited.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        match self.state {
            State::Editing(_) => {
                self.state = State::Viewing;
                Ok(())
            }
            State::Viewing | State::Saving(_) => {
                Err(TransitionError::NotEditing)
            }
        }
    }

    /// Saves the provided [`SectionPatch`] of the edited [`Section`] with the
    /// provided `service`.
    ///
    /// On success, the saved [`Contract`] becomes the current one and editing
    /// stops. Otherwise, editing continues and nothing is persisted.
    ///
    /// # Errors
    ///
    /// If the [`SectionPatch`] doesn't belong to the edited [`Section`], or
    /// the `service` rejects it.
    pub async fn save<Svc>(
        &mut self,
        service: &Svc,
        patch: SectionPatch,
    ) -> Result<&Contract, SaveError<Svc::Err>>
    where
        Svc: Command<UpdateContractTerms, Ok = Contract>,
    {
        let State::Editing(editing) = self.state else {
            return Err(SaveError::NotEditing);
        };
        if patch.section() != editing {
            return Err(SaveError::SectionMismatch {
                editing,
                patch: patch.section(),
            });
        }

        self.state = State::Saving(editing);
        let res = service
            .execute(UpdateContractTerms {
                contract_id: self.contract.id,
                expected_version: Some(self.contract.version),
                patches: vec![patch],
                authorization: self.authorization,
            })
            .await;
        match res {
            Ok(contract) => {
                self.contract = contract;
                self.state = State::Viewing;
                Ok(&self.contract)
            }
            Err(e) => {
                self.state = State::Editing(editing);
                Err(SaveError::Rejected(e))
            }
        }
    }
}

/// Error of an [`EditSession`] [`State`] transition.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum TransitionError {
    /// Another [`Section`] is being edited.
    #[display("`{_0}` section is already being edited")]
    AlreadyEditing(#[error(not(source))] Section),

    /// User may not edit the [`Section`].
    #[display("Not allowed to edit `{_0}` section")]
    Forbidden(#[error(not(source))] Section),

    /// Nothing is being edited.
    #[display("No section is being edited")]
    NotEditing,
}

/// Error of saving an [`EditSession`].
#[derive(Debug, Display, Error)]
pub enum SaveError<E> {
    /// Nothing is being edited.
    #[display("No section is being edited")]
    NotEditing,

    /// Patch doesn't belong to the edited [`Section`].
    #[display("Cannot save `{patch}` while editing `{editing}` section")]
    SectionMismatch {
        /// Edited [`Section`].
        editing: Section,

        /// [`Section`] of the patch.
        patch: Section,
    },

    /// Save is rejected.
    #[display("Save is rejected: {_0}")]
    Rejected(E),
}

#[cfg(test)]
mod spec {
    use common::Omr;

    use crate::{
        command::{update_contract_terms::ExecutionError, CreateContract},
        domain::{
            contract::{
                section::{DatesPatch, FinancialPatch},
                terms::spec::base_terms,
                violation::Kind,
                Contract, Section, SectionPatch, Version,
            },
            user::{self, Role},
            Authorization,
        },
        infra::Memory,
        spec::service,
        Command as _, Service,
    };

    use super::{EditSession, SaveError, State, TransitionError};

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

    fn rent(amount: &str) -> SectionPatch {
        FinancialPatch {
            monthly_rent: Some(omr(amount)),
            ..FinancialPatch::default()
        }
        .into()
    }

    #[tokio::test]
    async fn edits_one_section_at_a_time() {
        let svc = service();
        let mut session =
            EditSession::open(created(&svc).await, as_role(Role::Admin));

        assert_eq!(session.state(), State::Viewing);
        assert_eq!(session.cancel(), Err(TransitionError::NotEditing));

        session.begin(Section::Dates).unwrap();
        assert_eq!(session.state(), State::Editing(Section::Dates));
        assert_eq!(
            session.begin(Section::Financial),
            Err(TransitionError::AlreadyEditing(Section::Dates)),
        );

        session.cancel().unwrap();
        assert_eq!(session.state(), State::Viewing);
        session.begin(Section::Financial).unwrap();
    }

    #[tokio::test]
    async fn respects_role() {
        let svc = service();
        let mut session =
            EditSession::open(created(&svc).await, as_role(Role::Agent));

        assert_eq!(
            session.begin(Section::Financial),
            Err(TransitionError::Forbidden(Section::Financial)),
        );
        assert_eq!(session.state(), State::Viewing);
        session.begin(Section::Meters).unwrap();
    }

    #[tokio::test]
    async fn saves_edited_section() {
        let svc = service();
        let mut session =
            EditSession::open(created(&svc).await, as_role(Role::Admin));
        session.begin(Section::Financial).unwrap();

        let saved = session.save(&svc, rent("600")).await.unwrap();

        assert_eq!(saved.version, Version::INITIAL.next());
        assert_eq!(saved.terms.monthly_rent, omr("600"));
        assert_eq!(session.state(), State::Viewing);
        assert_eq!(session.contract().terms.municipality_fees, omr("216"));
    }

    #[tokio::test]
    async fn accepts_only_edited_section() {
        let svc = service();
        let mut session =
            EditSession::open(created(&svc).await, as_role(Role::Admin));

        assert!(matches!(
            session.save(&svc, rent("600")).await,
            Err(SaveError::NotEditing),
        ));

        session.begin(Section::Dates).unwrap();
        assert!(matches!(
            session.save(&svc, rent("600")).await,
            Err(SaveError::SectionMismatch {
                editing: Section::Dates,
                patch: Section::Financial,
            }),
        ));
        assert_eq!(session.state(), State::Editing(Section::Dates));
    }

    #[tokio::test]
    async fn keeps_editing_on_violations() {
        let svc = service();
        let contract = created(&svc).await;
        let mut session =
            EditSession::open(contract.clone(), as_role(Role::Admin));
        session.begin(Section::Dates).unwrap();

        let res = session
            .save(
                &svc,
                DatesPatch {
                    duration: Some(7),
                    ..DatesPatch::default()
                }
                .into(),
            )
            .await;

        assert!(matches!(
            res,
            Err(SaveError::Rejected(e)) if matches!(
                e.as_ref(),
                ExecutionError::Invalid(v)
                    if v.contains(Kind::DurationMismatch),
            ),
        ));
        assert_eq!(session.state(), State::Editing(Section::Dates));
        assert_eq!(session.contract(), &contract);
    }

    #[tokio::test]
    async fn reports_conflicting_save() {
        let svc = service();
        let contract = created(&svc).await;
        let mut first =
            EditSession::open(contract.clone(), as_role(Role::Admin));
        let mut second = EditSession::open(contract, as_role(Role::Accountant));
        first.begin(Section::Financial).unwrap();
        second.begin(Section::Financial).unwrap();

        _ = first.save(&svc, rent("600")).await.unwrap();
        let res = second.save(&svc, rent("700")).await;

        assert!(matches!(
            res,
            Err(SaveError::Rejected(e))
                if matches!(e.as_ref(), ExecutionError::Conflict { .. }),
        ));
        assert_eq!(second.state(), State::Editing(Section::Financial));
    }
}
