use chrono::DateTime;
use chrono::Utc;
use database::DbConnection;

use super::Model;

/// The result of an update guarded by the last modification date read by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<M> {
    Updated(M),
    /// The row doesn't exist (anymore)
    NotFound,
    /// The row was modified by someone else since it was read
    Conflict,
}

/// Optimistic concurrency on the `last_modified_date` column
pub trait ConditionalUpdate<K, M>: Sized
where
    K: Send,
    M: Model,
{
    type Error: std::error::Error + From<crate::Error> + Send;

    /// Updates the row #`id` only if its last modification date still equals `last_seen`
    async fn update_unless_modified(
        self,
        conn: &mut DbConnection,
        id: K,
        last_seen: DateTime<Utc>,
    ) -> Result<UpdateOutcome<M>, Self::Error>;
}
