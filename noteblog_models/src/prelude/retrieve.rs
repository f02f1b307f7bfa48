use database::DbConnection;

use super::Model;

/// Describes how a [Model] can be retrieved from the database
///
/// `K` is the type of the key used to identify the row, usually the primary key.
pub trait Retrieve<K>: Model
where
    K: Send,
{
    type Error: std::error::Error + From<crate::Error> + Send;

    /// Retrieves the row #`id` and deserializes it as a model instance
    async fn retrieve(conn: DbConnection, id: K) -> Result<Option<Self>, Self::Error>;

    /// Just like [Retrieve::retrieve] but returns `Err(fail())` if the row was not found
    async fn retrieve_or_fail<E, F>(conn: DbConnection, id: K, fail: F) -> Result<Self, E>
    where
        E: From<Self::Error>,
        F: FnOnce() -> E + Send,
    {
        match Self::retrieve(conn, id).await {
            Ok(Some(obj)) => Ok(obj),
            Ok(None) => Err(fail()),
            Err(e) => Err(E::from(e)),
        }
    }

    /// Returns whether the row #`id` exists
    async fn exists(conn: DbConnection, id: K) -> Result<bool, Self::Error>;
}
