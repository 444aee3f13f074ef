//! [`Command`] for creating a new [`Contract`].

use std::collections::BTreeSet;

use common::operations::Insert;
use derive_more::{Display, Error, From};
use itertools::Itertools as _;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract::{
            validation::{self, Scope},
            Section, Terms, Violations,
        },
        Authorization, Contract,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Contract`] of the provided [`Terms`].
#[derive(Clone, Debug)]
pub struct CreateContract {
    /// [`Terms`] of the new [`Contract`].
    pub terms: Terms,

    /// [`Authorization`] of the user creating the [`Contract`].
    pub authorization: Authorization,
}

impl<Db> Command<CreateContract> for Service<Db>
where
    Db: Database<Insert<Contract>, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract {
            mut terms,
            authorization,
        } = cmd;

        let forbidden = authorization.forbidden(Section::ALL);
        if !forbidden.is_empty() {
            return Err(tracerr::new!(E::Forbidden(forbidden)));
        }

        let summary = validation::validate(&terms, Scope::Everything)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        terms.apply_derived(&summary);

        let contract = Contract::new(terms);
        self.database()
            .execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            contract_id = %contract.id,
            user_id = %authorization.user_id,
            "`Contract` created",
        );

        Ok(contract)
    }
}

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// User may not edit some of the [`Section`]s.
    #[display("Not allowed to edit sections: {}", _0.iter().join(", "))]
    #[from(ignore)]
    Forbidden(#[error(not(source))] BTreeSet<Section>),

    /// [`Terms`] violate some invariants.
    #[display("Invalid contract terms: {_0}")]
    Invalid(#[error(not(source))] Violations),
}
