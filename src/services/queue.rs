use sea_orm::ConnectionTrait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::QueueCode;
use crate::repositories::TransactionRepository;

/// Advisory lock key that serializes queue code issuance across processes.
pub const QUEUE_ISSUANCE_LOCK_KEY: i64 = 0x5155_4555_4531; // "QUEUE1"

/// The code that follows `latest`. An absent or unparseable predecessor
/// restarts the sequence at `Q0001`.
pub fn next_queue_code(latest: Option<&str>) -> QueueCode {
    let previous = match latest {
        Some(raw) => QueueCode::parse(raw).unwrap_or_else(|_| {
            warn!(latest = raw, "Latest queue code is malformed; restarting sequence");
            QueueCode::zero()
        }),
        None => QueueCode::zero(),
    };
    previous.next()
}

/// Computes the queue code for `transaction_id` from the latest issued one.
///
/// Callers must hold the issuance guard; two concurrent calls otherwise read
/// the same predecessor.
pub async fn generate_queue_code<C>(
    repository: &TransactionRepository,
    conn: &C,
    transaction_id: Uuid,
) -> Result<QueueCode, ServiceError>
where
    C: ConnectionTrait,
{
    let latest = repository.latest_queue_code(conn, transaction_id).await?;
    let code = next_queue_code(latest.as_deref());
    debug!(%transaction_id, previous = ?latest, queue_code = %code, "Generated queue code");
    Ok(code)
}
