//! Diesel-backed vocabulary list/entry repository.
//!
//! Every multi-row mutation runs in an explicit transaction: saving a new
//! list with its first batch, appending a batch, and the delete-children-
//! then-parent cascade. The compound `(owner_id, name)` unique constraint is
//! the authoritative duplicate-name rejection; the service pre-check is only
//! a fast path.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{ListPersistenceError, ListRepository};
use crate::domain::user::UserId;
use crate::domain::vocabulary::{EntryId, ListId, ListName, VocabularyEntry, VocabularyList};

use super::diesel_helpers::{
    collect_rows, diesel_error_message, is_unique_violation_on, pool_error_message,
};
use super::models::{EntryRow, ListRow};
use super::pool::DbPool;
use super::schema::{vocabulary_entries, vocabulary_lists};

/// Diesel-backed `ListRepository` over the shared pool.
#[derive(Clone)]
pub struct DieselListRepository {
    pool: DbPool,
}

impl DieselListRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_pool_error(error: super::pool::PoolError) -> ListPersistenceError {
        ListPersistenceError::connection(pool_error_message(error))
    }

    fn map_diesel_error(error: diesel::result::Error, operation: &str) -> ListPersistenceError {
        ListPersistenceError::query(diesel_error_message(error, operation))
    }

    fn map_name_conflict(
        error: diesel::result::Error,
        name: &str,
        operation: &str,
    ) -> ListPersistenceError {
        if is_unique_violation_on(&error, "name") {
            ListPersistenceError::duplicate_name(name)
        } else {
            Self::map_diesel_error(error, operation)
        }
    }

    fn map_list_row(row: ListRow) -> Result<VocabularyList, ListPersistenceError> {
        row.into_domain().map_err(ListPersistenceError::query)
    }
}

#[async_trait]
impl ListRepository for DieselListRepository {
    async fn create_list(&self, list: &VocabularyList) -> Result<(), ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let row = ListRow::from_domain(list);

        diesel::insert_into(vocabulary_lists::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| Self::map_name_conflict(error, list.name.as_ref(), "create list"))
    }

    async fn create_list_with_entries(
        &self,
        list: &VocabularyList,
        entries: &[VocabularyEntry],
    ) -> Result<(), ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let list_row = ListRow::from_domain(list);
        let entry_rows: Vec<EntryRow> = entries.iter().map(EntryRow::from_domain).collect();

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(vocabulary_lists::table)
                    .values(&list_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(vocabulary_entries::table)
                    .values(&entry_rows)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| {
            Self::map_name_conflict(error, list.name.as_ref(), "create list with entries")
        })
    }

    async fn find_list(
        &self,
        id: &ListId,
    ) -> Result<Option<VocabularyList>, ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let row: Option<ListRow> = vocabulary_lists::table
            .find(id.as_uuid())
            .select(ListRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| Self::map_diesel_error(error, "find list"))?;

        row.map(Self::map_list_row).transpose()
    }

    async fn find_list_by_name(
        &self,
        owner: &UserId,
        name: &str,
    ) -> Result<Option<VocabularyList>, ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let row: Option<ListRow> = vocabulary_lists::table
            .filter(vocabulary_lists::owner_id.eq(owner.as_uuid()))
            .filter(vocabulary_lists::name.eq(name))
            .select(ListRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| Self::map_diesel_error(error, "find list by name"))?;

        row.map(Self::map_list_row).transpose()
    }

    async fn lists_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<VocabularyList>, ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let rows: Vec<ListRow> = vocabulary_lists::table
            .filter(vocabulary_lists::owner_id.eq(owner.as_uuid()))
            .order_by(vocabulary_lists::created_at.desc())
            .select(ListRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| Self::map_diesel_error(error, "lists for owner"))?;

        collect_rows(
            rows.into_iter().map(ListRow::into_domain),
            ListPersistenceError::query,
        )
    }

    async fn rename_list(
        &self,
        id: &ListId,
        name: &ListName,
    ) -> Result<(), ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        diesel::update(vocabulary_lists::table.find(id.as_uuid()))
            .set(vocabulary_lists::name.eq(name.as_ref()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| Self::map_name_conflict(error, name.as_ref(), "rename list"))
    }

    async fn delete_list(&self, id: &ListId) -> Result<(), ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let list_id = *id.as_uuid();

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(
                    vocabulary_entries::table.filter(vocabulary_entries::list_id.eq(list_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(vocabulary_lists::table.find(list_id))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| Self::map_diesel_error(error, "delete list cascade"))
    }

    async fn append_entries(
        &self,
        entries: &[VocabularyEntry],
    ) -> Result<(), ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from_domain).collect();

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(vocabulary_entries::table)
                    .values(&rows)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| Self::map_diesel_error(error, "append entries"))
    }

    async fn find_entry(
        &self,
        id: &EntryId,
    ) -> Result<Option<VocabularyEntry>, ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let row: Option<EntryRow> = vocabulary_entries::table
            .find(id.as_uuid())
            .select(EntryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| Self::map_diesel_error(error, "find entry"))?;

        Ok(row.map(EntryRow::into_domain))
    }

    async fn entries_for_list(
        &self,
        id: &ListId,
    ) -> Result<Vec<VocabularyEntry>, ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let rows: Vec<EntryRow> = vocabulary_entries::table
            .filter(vocabulary_entries::list_id.eq(id.as_uuid()))
            .order_by(vocabulary_entries::added_at.asc())
            .select(EntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| Self::map_diesel_error(error, "entries for list"))?;

        Ok(rows.into_iter().map(EntryRow::into_domain).collect())
    }

    async fn update_entry(&self, entry: &VocabularyEntry) -> Result<(), ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let row = EntryRow::from_domain(entry);

        diesel::update(vocabulary_entries::table.find(entry.id.as_uuid()))
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| Self::map_diesel_error(error, "update entry"))
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<(), ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        diesel::delete(vocabulary_entries::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| Self::map_diesel_error(error, "delete entry"))
    }

    async fn count_lists_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<u64, ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let count: i64 = vocabulary_lists::table
            .filter(vocabulary_lists::owner_id.eq(owner.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|error| Self::map_diesel_error(error, "count lists"))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn count_entries_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<u64, ListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let count: i64 = vocabulary_entries::table
            .filter(vocabulary_entries::owner_id.eq(owner.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|error| Self::map_diesel_error(error, "count entries"))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
