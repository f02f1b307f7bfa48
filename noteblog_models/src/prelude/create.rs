use database::DbConnection;

use super::Model;

/// Describes how a [Model] can be created in the database
///
/// You can implement this type manually but its recommended to use the `record_model!`
/// macro instead.
pub trait Create<M: Model>: Sized {
    type Error: std::error::Error + From<crate::Error> + Send;

    /// Creates a new row in the database with the values of the changeset and
    /// returns the created model instance
    async fn create(self, conn: &mut DbConnection) -> Result<M, Self::Error>;
}
