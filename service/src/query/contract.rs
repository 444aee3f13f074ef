//! [`Query`] collection related to a single [`Contract`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contract::{
            self,
            rent::{self, Period, Schedule},
            summary, Summary,
        },
        Contract,
    },
    infra::{database, Database},
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Contract`] by its [`contract::Id`].
pub type ById = DatabaseQuery<By<Option<Contract>, contract::Id>>;

/// Queries the [`Summary`] of a [`Contract`] by its [`contract::Id`].
#[derive(Clone, Copy, Debug)]
pub struct SummaryById(pub contract::Id);

impl<Db> Query<SummaryById> for Service<Db>
where
    Db: Database<
        Select<By<Option<Contract>, contract::Id>>,
        Ok = Option<Contract>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Summary>;
    type Err = Traced<ReportError>;

    async fn execute(
        &self,
        SummaryById(id): SummaryById,
    ) -> Result<Self::Ok, Self::Err> {
        use ReportError as E;

        self.database()
            .execute(Select(By::<Option<Contract>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map(|c| Summary::compute(&c.terms))
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))
    }
}

/// Queries the monthly rent [`Period`]s of a [`Contract`] by its
/// [`contract::Id`].
#[derive(Clone, Copy, Debug)]
pub struct ScheduleById(pub contract::Id);

impl<Db> Query<ScheduleById> for Service<Db>
where
    Db: Database<
        Select<By<Option<Contract>, contract::Id>>,
        Ok = Option<Contract>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Vec<Period>>;
    type Err = Traced<ReportError>;

    async fn execute(
        &self,
        ScheduleById(id): ScheduleById,
    ) -> Result<Self::Ok, Self::Err> {
        use ReportError as E;

        self.database()
            .execute(Select(By::<Option<Contract>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map(|c| {
                Schedule::new(&c.terms)
                    .map(|s| s.periods().collect::<Vec<_>>())
            })
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))
    }
}

/// Error of [`SummaryById`] and [`ScheduleById`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ReportError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Stored [`contract::Terms`] cannot be scheduled.
    #[display("Failed to schedule `Contract` rent: {_0}")]
    Schedule(rent::LengthMismatch),

    /// Stored [`contract::Terms`] cannot be summarized.
    #[display("Failed to summarize `Contract`: {_0}")]
    Summary(summary::Error),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::CreateContract,
        domain::{
            contract::{self, terms::spec::base_terms},
            user::{self, Role},
            Authorization,
        },
        spec::service,
        Command as _, Query as _,
    };

    use super::{ById, ScheduleById, SummaryById};

    #[tokio::test]
    async fn summarizes_stored_contract() {
        let svc = service();
        let contract = svc
            .execute(CreateContract {
                terms: base_terms(),
                authorization: Authorization {
                    user_id: user::Id::new(),
                    role: Role::Admin,
                },
            })
            .await
            .unwrap();

        let summary = svc.execute(SummaryById(contract.id)).await.unwrap();
        assert_eq!(summary.unwrap().tenant_total, "6000".parse().unwrap());

        let found = svc.execute(ById::by(contract.id)).await.unwrap();
        assert_eq!(found, Some(contract));

        let unknown = contract::Id::new();
        assert_eq!(svc.execute(SummaryById(unknown)).await.unwrap(), None);
        assert_eq!(svc.execute(ById::by(unknown)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn schedules_stored_contract() {
        let svc = service();
        let contract = svc
            .execute(CreateContract {
                terms: base_terms(),
                authorization: Authorization {
                    user_id: user::Id::new(),
                    role: Role::Admin,
                },
            })
            .await
            .unwrap();

        let periods =
            svc.execute(ScheduleById(contract.id)).await.unwrap().unwrap();

        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0].due_on, "2024-01-01".parse().unwrap());
        assert_eq!(periods[11].due_on, "2024-12-01".parse().unwrap());
        assert!(periods
            .iter()
            .all(|p| p.amount == contract.terms.monthly_rent));

        let unknown = ScheduleById(contract::Id::new());
        assert_eq!(svc.execute(unknown).await.unwrap(), None);
    }
}
