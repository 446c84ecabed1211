//! Diesel-backed user repository.
//!
//! Deleting a user is an explicit transactional cascade: owned entries and
//! lists go first, audit records are detached (the log is append-only), and
//! the user row goes last. Nothing relies on implicit ORM cascade
//! configuration, so the "no orphaned entry" invariant is visible here.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::user::{EmailAddress, FederatedId, User, UserId};

use super::diesel_helpers::{diesel_error_message, is_unique_violation_on, pool_error_message};
use super::models::UserRow;
use super::pool::DbPool;
use super::schema::{api_call_logs, users, vocabulary_entries, vocabulary_lists};

/// Diesel-backed `UserRepository` over the shared pool.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_pool_error(error: super::pool::PoolError) -> UserPersistenceError {
        UserPersistenceError::connection(pool_error_message(error))
    }

    fn map_diesel_error(error: diesel::result::Error, operation: &str) -> UserPersistenceError {
        UserPersistenceError::query(diesel_error_message(error, operation))
    }

    fn map_row(row: UserRow) -> Result<User, UserPersistenceError> {
        row.into_domain().map_err(UserPersistenceError::query)
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let row = UserRow::from_domain(user);

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| {
                if is_unique_violation_on(&error, "email") {
                    UserPersistenceError::duplicate_email(user.email.as_ref())
                } else {
                    Self::map_diesel_error(error, "insert user")
                }
            })
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let row = UserRow::from_domain(user);

        diesel::update(users::table.find(user.id.as_uuid()))
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| Self::map_diesel_error(error, "update user"))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| Self::map_diesel_error(error, "find user by id"))?;

        row.map(Self::map_row).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| Self::map_diesel_error(error, "find user by email"))?;

        row.map(Self::map_row).transpose()
    }

    async fn find_by_federated_id(
        &self,
        federated_id: &FederatedId,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::federated_id.eq(federated_id.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| Self::map_diesel_error(error, "find user by federated id"))?;

        row.map(Self::map_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let rows: Vec<UserRow> = users::table
            .order_by(users::created_at.desc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| Self::map_diesel_error(error, "list users"))?;

        super::diesel_helpers::collect_rows(
            rows.into_iter().map(UserRow::into_domain),
            UserPersistenceError::query,
        )
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let user_id = *id.as_uuid();

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(
                    vocabulary_entries::table.filter(vocabulary_entries::owner_id.eq(user_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    vocabulary_lists::table.filter(vocabulary_lists::owner_id.eq(user_id)),
                )
                .execute(conn)
                .await?;
                // Audit records outlive the user; only the reference goes.
                diesel::update(api_call_logs::table.filter(api_call_logs::user_id.eq(user_id)))
                    .set(api_call_logs::user_id.eq(None::<Uuid>))
                    .execute(conn)
                    .await?;
                diesel::delete(users::table.find(user_id)).execute(conn).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| Self::map_diesel_error(error, "delete user cascade"))
    }
}
