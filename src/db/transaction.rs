/*!
 * Unit of work
 *
 * Every multi-step operation runs inside one `UnitOfWork`. The wrapped
 * `DatabaseTransaction` rolls back when dropped, so an early return, a `?`
 * or a cancelled future never leaves partial writes behind. Success paths
 * call `commit` explicitly.
 */

use metrics::{counter, histogram};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, Statement, Value,
    TransactionTrait,
};
use std::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::errors::ServiceError;

pub struct UnitOfWork {
    txn: DatabaseTransaction,
    id: Uuid,
    started: Instant,
}

impl UnitOfWork {
    pub async fn begin(db: &DatabaseConnection) -> Result<Self, ServiceError> {
        let id = Uuid::new_v4();
        let txn = db.begin().await.map_err(|e| {
            error!(unit_of_work = %id, error = %e, "Failed to start database transaction");
            ServiceError::DatabaseError(e)
        })?;

        debug!(unit_of_work = %id, "Started database transaction");
        counter!("dinein_db.transaction.started", 1);

        Ok(Self {
            txn,
            id,
            started: Instant::now(),
        })
    }

    /// Connection every repository call inside this unit must use.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub fn backend(&self) -> DbBackend {
        self.txn.get_database_backend()
    }

    /// Takes a transaction-scoped advisory lock on Postgres. Other backends
    /// serialize writers on their own and skip this.
    pub async fn advisory_lock(&self, key: i64) -> Result<(), ServiceError> {
        if self.backend() != DbBackend::Postgres {
            return Ok(());
        }
        self.txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_advisory_xact_lock($1)",
                [Value::from(key)],
            ))
            .await?;
        Ok(())
    }

    pub async fn commit(self) -> Result<(), ServiceError> {
        let Self { txn, id, started } = self;
        txn.commit().await.map_err(|e| {
            error!(unit_of_work = %id, error = %e, "Failed to commit database transaction");
            counter!("dinein_db.transaction.commit_failed", 1);
            ServiceError::DatabaseError(e)
        })?;

        let elapsed = started.elapsed();
        histogram!("dinein_db.transaction.duration", elapsed.as_secs_f64());
        counter!("dinein_db.transaction.committed", 1);
        debug!(unit_of_work = %id, "Transaction committed in {:?}", elapsed);
        Ok(())
    }

    /// Rolls back explicitly so the failure is logged; dropping the unit has
    /// the same effect on the store.
    pub async fn rollback(self) {
        let Self { txn, id, started } = self;
        counter!("dinein_db.transaction.rolled_back", 1);
        if let Err(e) = txn.rollback().await {
            error!(unit_of_work = %id, error = %e, "Rollback failed; connection will discard the transaction");
            return;
        }
        warn!(unit_of_work = %id, "Transaction rolled back after {:?}", started.elapsed());
    }
}
