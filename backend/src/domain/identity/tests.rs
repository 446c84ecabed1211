//! Behaviour coverage for the federated reconciliation state machine and
//! session resolution, over in-memory stub repositories.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::*;
use crate::domain::error::ErrorCode;

/// In-memory user repository tracking how often each user was updated.
#[derive(Default)]
struct StubUsers {
    rows: Mutex<Vec<User>>,
    update_count: Mutex<usize>,
}

impl StubUsers {
    fn with_user(user: User) -> Self {
        Self {
            rows: Mutex::new(vec![user]),
            update_count: Mutex::new(0),
        }
    }

    fn updates(&self) -> usize {
        *self.update_count.lock().expect("count lock")
    }

    fn snapshot(&self) -> Vec<User> {
        self.rows.lock().expect("rows lock").clone()
    }
}

#[async_trait]
impl UserRepository for StubUsers {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut rows = self.rows.lock().expect("rows lock");
        if rows.iter().any(|row| row.email == user.email) {
            return Err(UserPersistenceError::duplicate_email(user.email.as_ref()));
        }
        rows.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let Some(row) = rows.iter_mut().find(|row| row.id == user.id) else {
            return Err(UserPersistenceError::query("user missing"));
        };
        *row = user.clone();
        *self.update_count.lock().expect("count lock") += 1;
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .find(|row| row.id == *id)
            .cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .find(|row| row.email == *email)
            .cloned())
    }

    async fn find_by_federated_id(
        &self,
        federated_id: &FederatedId,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .find(|row| row.federated_id.as_ref() == Some(federated_id))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self.snapshot())
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        self.rows
            .lock()
            .expect("rows lock")
            .retain(|row| row.id != *id);
        Ok(())
    }
}

/// In-memory pending-link store.
#[derive(Default)]
struct StubLinks {
    rows: Mutex<HashMap<Uuid, PendingLink>>,
}

#[async_trait]
impl PendingLinkStore for StubLinks {
    async fn put(&self, link: PendingLink) -> Result<(), PendingLinkStoreError> {
        self.rows
            .lock()
            .expect("rows lock")
            .insert(*link.token.as_uuid(), link);
        Ok(())
    }

    async fn get(&self, token: &LinkToken) -> Result<Option<PendingLink>, PendingLinkStoreError> {
        Ok(self
            .rows
            .lock()
            .expect("rows lock")
            .get(token.as_uuid())
            .cloned())
    }

    async fn remove(&self, token: &LinkToken) -> Result<(), PendingLinkStoreError> {
        self.rows.lock().expect("rows lock").remove(token.as_uuid());
        Ok(())
    }
}

fn email(raw: &str) -> EmailAddress {
    EmailAddress::new(raw).expect("valid email")
}

fn federated_id(raw: &str) -> FederatedId {
    FederatedId::new(raw).expect("valid federated id")
}

fn profile(id: &str, mail: &str) -> FederatedProfile {
    FederatedProfile {
        federated_id: federated_id(id),
        email: email(mail),
        name: Some("Ada Lovelace".to_owned()),
        picture_url: Some("https://example.com/ada.png".to_owned()),
    }
}

fn password_user(mail: &str) -> User {
    User::register(email(mail), Some("Ada".to_owned()), "secret1").expect("valid registration")
}

fn service(users: StubUsers) -> IdentityService<StubUsers, StubLinks> {
    IdentityService::new(Arc::new(users), Arc::new(StubLinks::default()))
}

#[tokio::test]
async fn register_then_login_round_trips() {
    let service = service(StubUsers::default());
    let user = service
        .register("Ada@Example.com", Some("Ada".to_owned()), "secret1", "secret1", true)
        .await
        .expect("registration succeeds");
    assert_eq!(user.email.as_ref(), "ada@example.com");

    let creds = LoginCredentials::try_from_parts("ada@example.com", "secret1")
        .expect("valid credentials");
    let logged_in = service.login_password(&creds).await.expect("login succeeds");
    assert_eq!(logged_in.id, user.id);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let service = service(StubUsers::with_user(password_user("ada@example.com")));
    let err = service
        .register("ada@example.com", None, "secret1", "secret1", true)
        .await
        .expect_err("duplicate rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn register_requires_terms_and_matching_passwords() {
    let service = service(StubUsers::default());
    let no_terms = service
        .register("a@b.com", None, "secret1", "secret1", false)
        .await
        .expect_err("terms required");
    assert_eq!(no_terms.code(), ErrorCode::InvalidRequest);

    let mismatch = service
        .register("a@b.com", None, "secret1", "secret2", true)
        .await
        .expect_err("confirmation must match");
    assert_eq!(mismatch.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn login_rejects_wrong_password_and_blocked_accounts() {
    let mut blocked = password_user("blocked@example.com");
    blocked.is_blocked = true;
    let users = StubUsers::default();
    users.insert(&password_user("ada@example.com")).await.expect("seed");
    users.insert(&blocked).await.expect("seed");
    let service = service(users);

    let wrong = LoginCredentials::try_from_parts("ada@example.com", "not-it")
        .expect("valid credentials");
    assert_eq!(
        service.login_password(&wrong).await.expect_err("rejected").code(),
        ErrorCode::Unauthorized,
    );

    let creds = LoginCredentials::try_from_parts("blocked@example.com", "secret1")
        .expect("valid credentials");
    assert_eq!(
        service.login_password(&creds).await.expect_err("blocked").code(),
        ErrorCode::Forbidden,
    );
}

#[tokio::test]
async fn first_federated_sign_in_creates_a_shell_and_requires_setup() {
    let users = Arc::new(StubUsers::default());
    let service = IdentityService::new(Arc::clone(&users), Arc::new(StubLinks::default()));

    let outcome = service
        .sign_in_federated(profile("google-1", "ada@example.com"))
        .await
        .expect("sign-in succeeds");

    let FederatedSignIn::SetupRequired(token) = outcome else {
        panic!("expected setup to be required, got {outcome:?}");
    };

    let shell = users
        .find_by_federated_id(&federated_id("google-1"))
        .await
        .expect("lookup succeeds")
        .expect("shell user exists");
    assert!(!shell.is_setup_complete());

    // The pending token resolves to the setup step, not an authenticated
    // session.
    let resolution = service
        .resolve_session(&SessionState::for_pending_link(token))
        .await
        .expect("resolution succeeds");
    assert!(matches!(resolution, SessionResolution::SetupPending(_)));
}

#[tokio::test]
async fn complete_setup_mutates_the_user_exactly_once() {
    let users = Arc::new(StubUsers::default());
    let service = IdentityService::new(Arc::clone(&users), Arc::new(StubLinks::default()));

    let FederatedSignIn::SetupRequired(token) = service
        .sign_in_federated(profile("google-1", "ada@example.com"))
        .await
        .expect("sign-in succeeds")
    else {
        panic!("expected setup to be required");
    };

    let user = service
        .complete_setup(&token, "secret1", "secret1", true)
        .await
        .expect("setup succeeds");
    assert!(user.is_setup_complete());
    assert_eq!(users.updates(), 1);

    // Resubmission is safe: the session is granted again without touching
    // the user a second time.
    let replayed = service
        .complete_setup(&token, "secret1", "secret1", true)
        .await
        .expect("resubmission succeeds");
    assert_eq!(replayed.id, user.id);
    assert_eq!(users.updates(), 1, "no second mutation");

    // A second full sign-in now grants the session directly.
    let outcome = service
        .sign_in_federated(profile("google-1", "ada@example.com"))
        .await
        .expect("sign-in succeeds");
    assert!(matches!(outcome, FederatedSignIn::SessionGranted(_)));
}

#[tokio::test]
async fn email_matched_password_account_is_linked_and_granted_immediately() {
    let existing = password_user("ada@example.com");
    let existing_id = existing.id;
    let users = Arc::new(StubUsers::with_user(existing));
    let service = IdentityService::new(Arc::clone(&users), Arc::new(StubLinks::default()));

    let outcome = service
        .sign_in_federated(profile("google-1", "ada@example.com"))
        .await
        .expect("sign-in succeeds");

    // A password already exists, so no completion step is needed.
    let FederatedSignIn::SessionGranted(user) = outcome else {
        panic!("expected immediate session, got {outcome:?}");
    };
    assert_eq!(user.id, existing_id);
    assert_eq!(user.federated_id, Some(federated_id("google-1")));

    let stored = users
        .find_by_federated_id(&federated_id("google-1"))
        .await
        .expect("lookup succeeds");
    assert!(stored.is_some(), "the link was persisted");
}

#[tokio::test]
async fn blocked_accounts_are_rejected_at_every_entry_point() {
    let mut blocked = password_user("ada@example.com");
    blocked.is_blocked = true;
    let blocked_id = blocked.id;
    let service = service(StubUsers::with_user(blocked));

    let err = service
        .sign_in_federated(profile("google-1", "ada@example.com"))
        .await
        .expect_err("blocked sign-in rejected");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let err = service
        .resolve_session(&SessionState::for_user(blocked_id))
        .await
        .expect_err("blocked session rejected");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn expired_links_are_rejected_and_cleared() {
    let users = Arc::new(StubUsers::default());
    let links = Arc::new(StubLinks::default());
    let service = IdentityService::with_config(
        Arc::clone(&users),
        Arc::clone(&links),
        IdentityConfig {
            pending_link_ttl: Duration::minutes(15),
        },
    );

    let mut link = PendingLink::new(
        federated_id("google-1"),
        email("ada@example.com"),
        None,
        None,
    );
    link.issued_at = Utc::now() - Duration::minutes(16);
    let token = link.token;
    links.put(link).await.expect("seed link");

    let err = service
        .complete_setup(&token, "secret1", "secret1", true)
        .await
        .expect_err("expired link rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    // The record was dropped, so the session now resolves anonymous.
    let resolution = service
        .resolve_session(&SessionState::for_pending_link(token))
        .await
        .expect("resolution succeeds");
    assert_eq!(resolution, SessionResolution::Anonymous);
}

#[tokio::test]
async fn stale_user_sessions_resolve_anonymous() {
    let service = service(StubUsers::default());
    let resolution = service
        .resolve_session(&SessionState::for_user(UserId::random()))
        .await
        .expect("resolution succeeds");
    assert_eq!(resolution, SessionResolution::Anonymous);

    let resolution = service
        .resolve_session(&SessionState::anonymous())
        .await
        .expect("resolution succeeds");
    assert_eq!(resolution, SessionResolution::Anonymous);
}

#[tokio::test]
async fn change_password_requires_the_current_one_only_when_it_exists() {
    let with_password = password_user("ada@example.com");
    let with_password_id = with_password.id;
    let federated_only = User::federated_shell(
        federated_id("google-2"),
        email("grace@example.com"),
        None,
        None,
    );
    let federated_only_id = federated_only.id;

    let users = StubUsers::default();
    users.insert(&with_password).await.expect("seed");
    users.insert(&federated_only).await.expect("seed");
    let service = service(users);

    let missing_current = service
        .change_password(&with_password_id, None, "newpass1", "newpass1")
        .await
        .expect_err("current password required");
    assert_eq!(missing_current.code(), ErrorCode::InvalidRequest);

    let wrong_current = service
        .change_password(&with_password_id, Some("not-it"), "newpass1", "newpass1")
        .await
        .expect_err("wrong current password");
    assert_eq!(wrong_current.code(), ErrorCode::Unauthorized);

    service
        .change_password(&with_password_id, Some("secret1"), "newpass1", "newpass1")
        .await
        .expect("change succeeds");

    // Federated-only accounts set their first password without one.
    service
        .change_password(&federated_only_id, None, "newpass1", "newpass1")
        .await
        .expect("first password set succeeds");
}

#[tokio::test]
async fn display_name_updates_are_bounded_and_clear_on_empty() {
    let user = password_user("ada@example.com");
    let user_id = user.id;
    let service = service(StubUsers::with_user(user));

    let updated = service
        .update_display_name(&user_id, Some("  Countess  ".to_owned()))
        .await
        .expect("update succeeds");
    assert_eq!(updated.display_name.as_deref(), Some("Countess"));

    let cleared = service
        .update_display_name(&user_id, Some("   ".to_owned()))
        .await
        .expect("clear succeeds");
    assert!(cleared.display_name.is_none());

    let too_long = service
        .update_display_name(&user_id, Some("x".repeat(101)))
        .await
        .expect_err("overlong rejected");
    assert_eq!(too_long.code(), ErrorCode::InvalidRequest);
}
