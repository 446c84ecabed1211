//! Administrative user management and audit overview.
//!
//! All operations sit behind the admin guard. Destructive actions refuse
//! the acting admin's own account and fellow admin accounts; deleting a
//! user cascades to their lists and entries while audit records are merely
//! detached (the log is append-only).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::access::{require_admin, require_admin_target_modifiable};
use crate::domain::audit::{ApiCallRecord, AuditStats};
use crate::domain::error::Error;
use crate::domain::ports::{AuditLog, AuditLogError, UserPersistenceError, UserRepository};
use crate::domain::user::{User, UserId};

/// Recent audit records plus aggregate totals, for the admin log view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditOverview {
    pub stats: AuditStats,
    pub recent: Vec<ApiCallRecord>,
}

/// Admin use-cases over user persistence and the audit log.
#[derive(Clone)]
pub struct AdminService<U, A> {
    users: Arc<U>,
    audit: Arc<A>,
}

impl<U, A> AdminService<U, A>
where
    U: UserRepository,
    A: AuditLog,
{
    /// Create a service over the given repositories.
    pub fn new(users: Arc<U>, audit: Arc<A>) -> Self {
        Self { users, audit }
    }

    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => Error::service_unavailable(message),
            UserPersistenceError::Query { message } => Error::internal(message),
            UserPersistenceError::DuplicateEmail { email } => {
                Error::internal(format!("unexpected email conflict: {email}"))
            }
        }
    }

    fn map_audit_error(error: AuditLogError) -> Error {
        match error {
            AuditLogError::Connection { message } => Error::service_unavailable(message),
            AuditLogError::Query { message } => Error::internal(message),
        }
    }

    /// All user accounts, for the admin dashboard.
    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>, Error> {
        require_admin(actor)?;
        self.users.list_all().await.map_err(Self::map_user_error)
    }

    /// One account with full detail, for the admin user page.
    pub async fn view_user(&self, actor: &User, target: &UserId) -> Result<User, Error> {
        require_admin(actor)?;
        self.load_user(target).await
    }

    /// Delete an account and everything it owns.
    pub async fn delete_user(&self, actor: &User, target: &UserId) -> Result<(), Error> {
        let target_user = self.load_user(target).await?;
        require_admin_target_modifiable(actor, &target_user)?;
        self.users
            .delete(target)
            .await
            .map_err(Self::map_user_error)
    }

    /// Block or unblock an account.
    pub async fn set_blocked(
        &self,
        actor: &User,
        target: &UserId,
        blocked: bool,
    ) -> Result<User, Error> {
        let mut target_user = self.load_user(target).await?;
        require_admin_target_modifiable(actor, &target_user)?;
        target_user.is_blocked = blocked;
        self.users
            .update(&target_user)
            .await
            .map_err(Self::map_user_error)?;
        Ok(target_user)
    }

    /// Recent audit records and aggregate totals.
    pub async fn audit_overview(&self, actor: &User, limit: u32) -> Result<AuditOverview, Error> {
        require_admin(actor)?;
        let stats = self.audit.stats().await.map_err(Self::map_audit_error)?;
        let recent = self
            .audit
            .recent(limit)
            .await
            .map_err(Self::map_audit_error)?;
        Ok(AuditOverview { stats, recent })
    }

    async fn load_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for admin protections over mock repositories.
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{FixtureAuditLog, MockAuditLog, MockUserRepository};
    use crate::domain::user::EmailAddress;

    fn user(mail: &str, is_admin: bool) -> User {
        User {
            id: UserId::random(),
            email: EmailAddress::new(mail).expect("valid email"),
            name: None,
            display_name: None,
            picture_url: None,
            password_hash: None,
            federated_id: None,
            is_admin,
            is_blocked: false,
            created_at: Utc::now(),
        }
    }

    fn service(users: MockUserRepository) -> AdminService<MockUserRepository, FixtureAuditLog> {
        AdminService::new(Arc::new(users), Arc::new(FixtureAuditLog))
    }

    #[tokio::test]
    async fn delete_user_cascades_through_the_repository() {
        let admin = user("admin@example.com", true);
        let target = user("user@example.com", false);
        let target_id = target.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .with(eq(target_id))
            .times(1)
            .return_once(move |_| Ok(Some(target)));
        users
            .expect_delete()
            .with(eq(target_id))
            .times(1)
            .return_once(|_| Ok(()));

        service(users)
            .delete_user(&admin, &target_id)
            .await
            .expect("delete succeeds");
    }

    #[tokio::test]
    async fn admins_cannot_delete_themselves() {
        let admin = user("admin@example.com", true);
        let admin_clone = admin.clone();
        let admin_id = admin.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(admin_clone)));
        users.expect_delete().times(0);

        let err = service(users)
            .delete_user(&admin, &admin_id)
            .await
            .expect_err("self-delete denied");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn admins_cannot_delete_or_block_fellow_admins() {
        let admin = user("admin@example.com", true);
        let peer = user("peer@example.com", true);
        let peer_id = peer.id;
        let peer_clone = peer.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(2)
            .returning(move |_| Ok(Some(peer_clone.clone())));
        users.expect_delete().times(0);
        users.expect_update().times(0);

        let service = service(users);
        let err = service
            .delete_user(&admin, &peer_id)
            .await
            .expect_err("peer delete denied");
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let err = service
            .set_blocked(&admin, &peer_id, true)
            .await
            .expect_err("peer block denied");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn blocking_a_regular_user_persists_the_flag() {
        let admin = user("admin@example.com", true);
        let target = user("user@example.com", false);
        let target_id = target.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(target)));
        users
            .expect_update()
            .withf(|updated: &User| updated.is_blocked)
            .times(1)
            .return_once(|_| Ok(()));

        let blocked = service(users)
            .set_blocked(&admin, &target_id, true)
            .await
            .expect("block succeeds");
        assert!(blocked.is_blocked);
    }

    #[tokio::test]
    async fn non_admins_cannot_list_users() {
        let regular = user("user@example.com", false);
        let mut users = MockUserRepository::new();
        users.expect_list_all().times(0);

        let err = service(users)
            .list_users(&regular)
            .await
            .expect_err("admin gate holds");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn audit_overview_combines_stats_and_recent_records() {
        let admin = user("admin@example.com", true);
        let users = MockUserRepository::new();

        let mut audit = MockAuditLog::new();
        audit.expect_stats().times(1).return_once(|| {
            Ok(AuditStats {
                total_calls: 3,
                successful_calls: 2,
                failed_calls: 1,
                by_api: Vec::new(),
            })
        });
        audit
            .expect_recent()
            .with(eq(50_u32))
            .times(1)
            .return_once(|_| Ok(Vec::new()));

        let service = AdminService::new(Arc::new(users), Arc::new(audit));
        let overview = service
            .audit_overview(&admin, 50)
            .await
            .expect("overview loads");
        assert_eq!(overview.stats.total_calls, 3);
        assert!(overview.recent.is_empty());
    }
}
