use database::DbConnection;

use super::Model;

/// Describes how a [Model] can be deleted from the database knowing only its key
pub trait DeleteStatic<K>: Model
where
    K: Send,
{
    type Error: std::error::Error + From<crate::Error> + Send;

    /// Deletes the row #`id` from the database
    ///
    /// Returns whether a row was actually deleted.
    async fn delete_static(conn: &mut DbConnection, id: K) -> Result<bool, Self::Error>;

    /// Just like [DeleteStatic::delete_static] but returns `Err(fail())` if the row didn't exist
    async fn delete_static_or_fail<E, F>(conn: &mut DbConnection, id: K, fail: F) -> Result<(), E>
    where
        E: From<Self::Error>,
        F: FnOnce() -> E + Send,
    {
        match Self::delete_static(conn, id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(fail()),
            Err(e) => Err(E::from(e)),
        }
    }
}
