use chrono::DateTime;
use chrono::Utc;
use database::DbConnection;

use super::Model;

/// Unpaginated listing of the whole table, ordered by primary key
pub trait List: Model {
    type Error: std::error::Error + From<crate::Error> + Send;

    async fn list(conn: &mut DbConnection) -> Result<Vec<Self>, Self::Error>;
}

/// Selection of the rows created within a time window
pub trait CreatedWithin: Model {
    type Error: std::error::Error + From<crate::Error> + Send;

    /// Returns the rows whose creation date lies in `[start, end]`, bounds included,
    /// ordered by creation date then primary key
    ///
    /// An empty window (`start > end`) selects nothing.
    async fn list_created_within(
        conn: &mut DbConnection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Self>, Self::Error>;
}
