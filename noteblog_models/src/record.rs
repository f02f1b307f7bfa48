/// Generates the row, the changeset and the whole model prelude of a text record
///
/// A text record table has exactly the columns `id` (the primary key), `content`,
/// `created_date` and `last_modified_date`. The model struct itself must be declared
/// beforehand with the same four public fields.
///
/// ```ignore
/// record_model!(Note, row = NoteRow, changeset = NoteChangeset, table = note);
/// ```
macro_rules! record_model {
    ($model:ident, row = $row:ident, changeset = $changeset:ident, table = $table:ident) => {
        #[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
        #[diesel(table_name = database::tables::$table)]
        #[diesel(check_for_backend(diesel::pg::Pg))]
        pub struct $row {
            id: i64,
            content: String,
            created_date: chrono::DateTime<chrono::Utc>,
            last_modified_date: chrono::DateTime<chrono::Utc>,
        }

        impl From<$row> for $model {
            fn from(row: $row) -> Self {
                Self {
                    id: row.id,
                    content: row.content,
                    created_date: row.created_date,
                    last_modified_date: row.last_modified_date,
                }
            }
        }

        #[derive(Debug, Default, Clone, diesel::AsChangeset, diesel::Insertable)]
        #[diesel(table_name = database::tables::$table)]
        pub struct $changeset {
            pub content: Option<String>,
            pub created_date: Option<chrono::DateTime<chrono::Utc>>,
            pub last_modified_date: Option<chrono::DateTime<chrono::Utc>>,
        }

        impl $changeset {
            #[must_use = "builder methods are intended to be chained"]
            pub fn content(mut self, content: String) -> Self {
                self.content = Some(content);
                self
            }

            #[must_use = "builder methods are intended to be chained"]
            pub fn created_date(mut self, created_date: chrono::DateTime<chrono::Utc>) -> Self {
                self.created_date = Some(created_date);
                self
            }

            #[must_use = "builder methods are intended to be chained"]
            pub fn last_modified_date(
                mut self,
                last_modified_date: chrono::DateTime<chrono::Utc>,
            ) -> Self {
                self.last_modified_date = Some(last_modified_date);
                self
            }

            /// Sets both dates to `at`
            #[must_use = "builder methods are intended to be chained"]
            pub fn created_at(self, at: chrono::DateTime<chrono::Utc>) -> Self {
                self.created_date(at).last_modified_date(at)
            }
        }

        impl From<$model> for $changeset {
            fn from(model: $model) -> Self {
                Self {
                    content: Some(model.content),
                    created_date: Some(model.created_date),
                    last_modified_date: Some(model.last_modified_date),
                }
            }
        }

        impl $crate::prelude::Model for $model {
            type Row = $row;
            type Changeset = $changeset;
            type Table = database::tables::$table::table;
        }

        impl $crate::prelude::Create<$model> for $changeset {
            type Error = $crate::Error;

            #[tracing::instrument(name = "model:create", skip_all, err, fields(model = stringify!($model)))]
            async fn create(
                self,
                conn: &mut database::DbConnection,
            ) -> Result<$model, Self::Error> {
                use diesel::SelectableHelper as _;
                use diesel_async::RunQueryDsl as _;
                use std::ops::DerefMut as _;

                diesel::insert_into(database::tables::$table::table)
                    .values(&self)
                    .returning($row::as_select())
                    .get_result::<$row>(conn.write().await.deref_mut())
                    .await
                    .map(Into::into)
                    .map_err(|e| Self::Error::from($crate::Error::from(e)))
            }
        }

        impl $crate::prelude::Retrieve<i64> for $model {
            type Error = $crate::Error;

            #[tracing::instrument(name = "model:retrieve", skip_all, err, fields(model = stringify!($model), id = id))]
            async fn retrieve(
                conn: database::DbConnection,
                id: i64,
            ) -> Result<Option<Self>, Self::Error> {
                use diesel::OptionalExtension as _;
                use diesel::QueryDsl as _;
                use diesel::SelectableHelper as _;
                use diesel_async::RunQueryDsl as _;
                use std::ops::DerefMut as _;

                database::tables::$table::table
                    .find(id)
                    .select($row::as_select())
                    .first::<$row>(conn.write().await.deref_mut())
                    .await
                    .optional()
                    .map(|row| row.map(Into::into))
                    .map_err(|e| Self::Error::from($crate::Error::from(e)))
            }

            #[tracing::instrument(name = "model:exists", skip_all, err, fields(model = stringify!($model), id = id))]
            async fn exists(conn: database::DbConnection, id: i64) -> Result<bool, Self::Error> {
                use diesel::QueryDsl as _;
                use diesel_async::RunQueryDsl as _;
                use std::ops::DerefMut as _;

                diesel::select(diesel::dsl::exists(
                    database::tables::$table::table.find(id),
                ))
                .get_result::<bool>(conn.write().await.deref_mut())
                .await
                .map_err(|e| Self::Error::from($crate::Error::from(e)))
            }
        }

        impl $crate::prelude::List for $model {
            type Error = $crate::Error;

            #[tracing::instrument(name = "model:list", skip_all, err, fields(model = stringify!($model)))]
            async fn list(conn: &mut database::DbConnection) -> Result<Vec<Self>, Self::Error> {
                use database::tables::$table::dsl;
                use diesel::ExpressionMethods as _;
                use diesel::QueryDsl as _;
                use diesel::SelectableHelper as _;
                use diesel_async::RunQueryDsl as _;
                use futures_util::TryStreamExt as _;
                use std::ops::DerefMut as _;

                dsl::$table
                    .order_by(dsl::id.asc())
                    .select($row::as_select())
                    .load_stream::<$row>(conn.write().await.deref_mut())
                    .await
                    .map_err($crate::Error::from)?
                    .map_ok(<$row as Into<$model>>::into)
                    .try_collect::<Vec<_>>()
                    .await
                    .map_err(|e| Self::Error::from($crate::Error::from(e)))
            }
        }

        impl $crate::prelude::CreatedWithin for $model {
            type Error = $crate::Error;

            #[tracing::instrument(name = "model:list_created_within", skip_all, err, fields(model = stringify!($model), start = %start, end = %end))]
            async fn list_created_within(
                conn: &mut database::DbConnection,
                start: chrono::DateTime<chrono::Utc>,
                end: chrono::DateTime<chrono::Utc>,
            ) -> Result<Vec<Self>, Self::Error> {
                use database::tables::$table::dsl;
                use diesel::ExpressionMethods as _;
                use diesel::QueryDsl as _;
                use diesel::SelectableHelper as _;
                use diesel_async::RunQueryDsl as _;
                use std::ops::DerefMut as _;

                dsl::$table
                    .filter(dsl::created_date.between(start, end))
                    .order_by((dsl::created_date.asc(), dsl::id.asc()))
                    .select($row::as_select())
                    .load::<$row>(conn.write().await.deref_mut())
                    .await
                    .map(|rows| rows.into_iter().map(Into::into).collect())
                    .map_err(|e| Self::Error::from($crate::Error::from(e)))
            }
        }

        impl $crate::prelude::ConditionalUpdate<i64, $model> for $changeset {
            type Error = $crate::Error;

            #[tracing::instrument(name = "model:update_unless_modified", skip_all, err, fields(model = stringify!($model), id = id, last_seen = %last_seen))]
            async fn update_unless_modified(
                self,
                conn: &mut database::DbConnection,
                id: i64,
                last_seen: chrono::DateTime<chrono::Utc>,
            ) -> Result<$crate::prelude::UpdateOutcome<$model>, Self::Error> {
                use database::tables::$table::dsl;
                use diesel::ExpressionMethods as _;
                use diesel::OptionalExtension as _;
                use diesel::QueryDsl as _;
                use diesel::SelectableHelper as _;
                use diesel_async::RunQueryDsl as _;
                use std::ops::DerefMut as _;

                let updated = diesel::update(
                    dsl::$table
                        .find(id)
                        .filter(dsl::last_modified_date.eq(last_seen)),
                )
                .set(&self)
                .returning($row::as_select())
                .get_result::<$row>(conn.write().await.deref_mut())
                .await
                .optional()
                .map_err($crate::Error::from)?;

                if let Some(row) = updated {
                    return Ok($crate::prelude::UpdateOutcome::Updated(row.into()));
                }
                let still_exists = <$model as $crate::prelude::Retrieve<i64>>::exists(conn.clone(), id).await?;
                Ok(if still_exists {
                    $crate::prelude::UpdateOutcome::Conflict
                } else {
                    $crate::prelude::UpdateOutcome::NotFound
                })
            }
        }

        impl $crate::prelude::DeleteStatic<i64> for $model {
            type Error = $crate::Error;

            #[tracing::instrument(name = "model:delete_static", skip_all, err, fields(model = stringify!($model), id = id))]
            async fn delete_static(
                conn: &mut database::DbConnection,
                id: i64,
            ) -> Result<bool, Self::Error> {
                use diesel::QueryDsl as _;
                use diesel_async::RunQueryDsl as _;
                use std::ops::DerefMut as _;

                diesel::delete(database::tables::$table::table.find(id))
                    .execute(conn.write().await.deref_mut())
                    .await
                    .map(|n| n == 1)
                    .map_err(|e| Self::Error::from($crate::Error::from(e)))
            }
        }
    };
}

pub(crate) use record_model;
