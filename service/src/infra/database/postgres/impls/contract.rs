//! [`Contract`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use postgres_types::Json;
use tracerr::Traced;

use crate::{
    domain::{
        contract::{self, Revisions, Terms},
        Contract,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, version, terms, revisions, created_at, updated_at \
            FROM contracts \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| {
                let Json(terms) = row.get::<_, Json<Terms>>("terms");
                let Json(revisions) =
                    row.get::<_, Json<Revisions>>("revisions");
                Contract {
                    id: row.get("id"),
                    version: row.get("version"),
                    terms,
                    revisions,
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                }
            }))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            version,
            terms,
            revisions,
            created_at,
            updated_at,
        } = contract;

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, version, terms, revisions, created_at, updated_at\
            ) VALUES (\
                $1::UUID, $2::INT8, $3::JSONB, $4::JSONB, \
                $5::TIMESTAMPTZ, $6::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &version,
                &Json(&terms),
                &Json(&revisions),
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            version,
            terms,
            revisions,
            created_at: _,
            updated_at,
        } = contract;

        const SQL: &str = "\
            UPDATE contracts \
            SET version = $2::INT8, \
                terms = $3::JSONB, \
                revisions = $4::JSONB, \
                updated_at = $5::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        let updated = self
            .exec(
                SQL,
                &[&id, &version, &Json(&terms), &Json(&revisions), &updated_at],
            )
            .await
            .map_err(tracerr::wrap!())?;
        if updated == 0 {
            return Err(tracerr::new!(database::Error::from(
                database::postgres::Error::NotExists(id),
            )));
        }
        Ok(())
    }
}

impl<C> Database<Lock<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        // Upserting takes the row lock even if the row exists already, so the
        // lock is held until the end of the transaction.
        const SQL: &str = "\
            INSERT INTO contracts_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
