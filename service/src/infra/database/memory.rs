//! In-memory [`Database`] implementation.

use std::{collections::HashMap, future::Future, sync::Arc};

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Update,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{contract, Contract},
    infra::{database, Database},
};

/// Stored [`Contract`]s.
pub type Contracts = HashMap<contract::Id, Contract>;

/// In-memory [`Database`].
///
/// Transactions are serialized: a [`Tx`] holds the whole storage until it's
/// committed or dropped, and its writes become visible only on [`Commit`].
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Non-transactional [`Memory`] client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared storage.
    contracts: Arc<Mutex<Contracts>>,
}

/// Transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Pending transaction, [`None`] once committed.
    pending: Arc<Mutex<Option<Pending>>>,
}

/// Pending transaction of a [`Tx`] client.
#[derive(Debug)]
struct Pending {
    /// Exclusively held shared storage.
    storage: OwnedMutexGuard<Contracts>,

    /// Copy of the storage the transaction writes to.
    staged: Contracts,
}

/// Access to [`Contracts`] of a [`Memory`] client.
pub trait Storage {
    /// Runs the provided function over the [`Contracts`].
    ///
    /// # Errors
    ///
    /// If the [`Contracts`] cannot be accessed anymore.
    fn with<R>(
        &self,
        f: impl FnOnce(&mut Contracts) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Storage for NonTx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut Contracts) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&mut *self.contracts.lock().await))
    }
}

impl Storage for Tx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut Contracts) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let mut pending = self.pending.lock().await;
        let pending = pending
            .as_mut()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        Ok(f(&mut pending.staged))
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let storage = Arc::clone(&self.0.contracts).lock_owned().await;
        let staged = storage.clone();
        Ok(Memory(Tx {
            pending: Arc::new(Mutex::new(Some(Pending { storage, staged }))),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Pending {
            mut storage,
            staged,
        } = self
            .0
            .pending
            .lock()
            .await
            .take()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        *storage = staged;
        Ok(())
    }
}

impl<S: Storage> Database<Select<By<Option<Contract>, contract::Id>>>
    for Memory<S>
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|contracts| contracts.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<Contract>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|contracts| {
                if contracts.contains_key(&contract.id) {
                    return Err(Error::AlreadyExists(contract.id));
                }
                _ = contracts.insert(contract.id, contract);
                Ok(())
            })
            .await
            .map_err(tracerr::wrap!())?
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<S: Storage> Database<Update<Contract>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|contracts| {
                let stored = contracts
                    .get_mut(&contract.id)
                    .ok_or(Error::NotExists(contract.id))?;
                *stored = contract;
                Ok::<_, Error>(())
            })
            .await
            .map_err(tracerr::wrap!())?
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Lock<By<Contract, contract::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Whole storage is already held by the transaction.
        Ok(())
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Contract`] with the same ID is already stored.
    #[display("`Contract(id: {_0})` already exists")]
    AlreadyExists(#[error(not(source))] contract::Id),

    /// [`Contract`] is not stored.
    #[display("`Contract(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] contract::Id),

    /// Transaction is already committed.
    #[display("Transaction is already committed")]
    TxFinished,
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Commit, Insert, Select, Transact, Update};

    use crate::{
        domain::{
            contract::{self, terms::spec::base_terms},
            Contract,
        },
        infra::Database as _,
    };

    use super::Memory;

    fn select(id: contract::Id) -> Select<By<Option<Contract>, contract::Id>> {
        Select(By::new(id))
    }

    #[tokio::test]
    async fn commits_staged_writes() {
        let db = Memory::new();
        let contract = Contract::new(base_terms());

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(contract.clone())).await.unwrap();
        assert_eq!(
            tx.execute(select(contract.id)).await.unwrap().as_ref(),
            Some(&contract),
        );
        tx.execute(Commit).await.unwrap();
        drop(tx);

        assert_eq!(
            db.execute(select(contract.id)).await.unwrap(),
            Some(contract),
        );
    }

    #[tokio::test]
    async fn discards_uncommitted_writes() {
        let db = Memory::new();
        let contract = Contract::new(base_terms());
        db.execute(Insert(contract.clone())).await.unwrap();

        let tx = db.execute(Transact).await.unwrap();
        let mut updated = contract.clone();
        updated.terms.duration = 1;
        tx.execute(Update(updated)).await.unwrap();
        drop(tx);

        assert_eq!(
            db.execute(select(contract.id)).await.unwrap(),
            Some(contract),
        );
    }

    #[tokio::test]
    async fn rejects_duplicates_and_unknown_updates() {
        let db = Memory::new();
        let contract = Contract::new(base_terms());

        assert!(db.execute(Update(contract.clone())).await.is_err());
        db.execute(Insert(contract.clone())).await.unwrap();
        assert!(db.execute(Insert(contract)).await.is_err());
    }

    #[tokio::test]
    async fn commits_once() {
        let db = Memory::new();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Commit).await.unwrap();

        assert!(tx.execute(Commit).await.is_err());
    }
}
