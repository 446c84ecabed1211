//! Identity resolution and federated-account reconciliation.
//!
//! The web layer hands this service a [`SessionState`] (at most one of a
//! resolved user id or a pending-linkage token) and receives a resolved
//! actor back. Federated sign-ins run through an explicit state machine:
//!
//! - no account → create a passwordless shell bound to the federated id and
//!   email, then require password setup;
//! - account matched by email without a federated id → attach the id, then
//!   require password setup unless a password already exists;
//! - fully linked account → session granted immediately.
//!
//! Blocked accounts are rejected at every entry point. The pending-setup
//! state is a token-addressed [`PendingLink`] with a bounded TTL, not ad hoc
//! session keys.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::auth::LoginCredentials;
use crate::domain::error::Error;
use crate::domain::ports::{
    LinkToken, PendingLink, PendingLinkStore, PendingLinkStoreError, UserPersistenceError,
    UserRepository,
};
use crate::domain::user::{EmailAddress, FederatedId, User, UserId, UserValidationError};

/// Profile payload received from the federated identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederatedProfile {
    pub federated_id: FederatedId,
    pub email: EmailAddress,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

/// Logical session content consumed from the excluded web layer.
///
/// Carries at most one of a resolved user id (explicit login) or a pending
/// linkage token (post-OAuth, pre-account-linkage).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_id: Option<UserId>,
    pub pending_link: Option<LinkToken>,
}

impl SessionState {
    /// Session with no identity attached.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session for an authenticated user.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            pending_link: None,
        }
    }

    /// Session awaiting federated password setup.
    pub fn for_pending_link(token: LinkToken) -> Self {
        Self {
            user_id: None,
            pending_link: Some(token),
        }
    }
}

/// Result of resolving a session to an actor.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionResolution {
    /// A live, unblocked account.
    Authenticated(User),
    /// A federated sign-in awaiting password setup.
    SetupPending(PendingLink),
    /// No identity, or stale session content.
    Anonymous,
}

/// Outcome of a federated sign-in attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FederatedSignIn {
    /// The account is fully linked; a session may be granted immediately.
    SessionGranted(User),
    /// Password setup is required before a session is granted.
    SetupRequired(LinkToken),
}

/// Tunables for the identity service.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Lifetime of a pending-linkage token.
    pub pending_link_ttl: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            pending_link_ttl: Duration::minutes(15),
        }
    }
}

/// Identity use-cases over user persistence and the pending-link store.
#[derive(Clone)]
pub struct IdentityService<U, S> {
    users: Arc<U>,
    links: Arc<S>,
    config: IdentityConfig,
}

impl<U, S> IdentityService<U, S>
where
    U: UserRepository,
    S: PendingLinkStore,
{
    /// Create a service with default configuration.
    pub fn new(users: Arc<U>, links: Arc<S>) -> Self {
        Self::with_config(users, links, IdentityConfig::default())
    }

    /// Create a service with explicit configuration.
    pub fn with_config(users: Arc<U>, links: Arc<S>, config: IdentityConfig) -> Self {
        Self {
            users,
            links,
            config,
        }
    }

    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => Error::service_unavailable(message),
            UserPersistenceError::Query { message } => Error::internal(message),
            UserPersistenceError::DuplicateEmail { email } => {
                Error::invalid_request(format!("email already registered: {email}"))
            }
        }
    }

    fn map_link_error(error: PendingLinkStoreError) -> Error {
        Error::internal(error.to_string())
    }

    fn map_validation_error(error: UserValidationError) -> Error {
        Error::invalid_request(error.to_string())
    }

    fn check_password_pair(password: &str, confirm: &str) -> Result<(), Error> {
        if password.is_empty() || confirm.is_empty() {
            return Err(Error::invalid_request(
                "password and confirmation are required",
            ));
        }
        if password != confirm {
            return Err(Error::invalid_request(
                "password and confirmation do not match",
            ));
        }
        Ok(())
    }

    /// Register a password-based account.
    pub async fn register(
        &self,
        email: &str,
        name: Option<String>,
        password: &str,
        confirm: &str,
        accept_terms: bool,
    ) -> Result<User, Error> {
        if !accept_terms {
            return Err(Error::invalid_request(
                "the terms of service must be accepted",
            ));
        }
        Self::check_password_pair(password, confirm)?;
        let email = EmailAddress::new(email).map_err(Self::map_validation_error)?;

        // Fast-path duplicate check; the storage constraint stays
        // authoritative for the race window.
        if self
            .users
            .find_by_email(&email)
            .await
            .map_err(Self::map_user_error)?
            .is_some()
        {
            return Err(Error::invalid_request(format!(
                "email already registered: {email}"
            )));
        }

        let user = User::register(email, name, password).map_err(Self::map_validation_error)?;
        self.users
            .insert(&user)
            .await
            .map_err(Self::map_user_error)?;
        Ok(user)
    }

    /// Authenticate with email and password.
    pub async fn login_password(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(Self::map_user_error)?;

        match user {
            Some(user) if user.verify_password(credentials.password()) => {
                if user.is_blocked {
                    return Err(Error::forbidden("account is blocked"));
                }
                Ok(user)
            }
            // Missing account, passwordless account, and wrong password all
            // collapse to one answer so the response does not leak which.
            _ => Err(Error::unauthorized("invalid email or password")),
        }
    }

    /// Run the federated reconciliation state machine for one sign-in.
    pub async fn sign_in_federated(
        &self,
        profile: FederatedProfile,
    ) -> Result<FederatedSignIn, Error> {
        if let Some(user) = self
            .users
            .find_by_federated_id(&profile.federated_id)
            .await
            .map_err(Self::map_user_error)?
        {
            if user.is_blocked {
                return Err(Error::forbidden("account is blocked"));
            }
            if user.is_setup_complete() {
                return Ok(FederatedSignIn::SessionGranted(user));
            }
            return self.issue_pending_link(profile).await;
        }

        if let Some(mut user) = self
            .users
            .find_by_email(&profile.email)
            .await
            .map_err(Self::map_user_error)?
        {
            if user.is_blocked {
                return Err(Error::forbidden("account is blocked"));
            }
            user.attach_federated_identity(
                profile.federated_id.clone(),
                profile.name.clone(),
                profile.picture_url.clone(),
            );
            self.users
                .update(&user)
                .await
                .map_err(Self::map_user_error)?;
            if user.is_setup_complete() {
                return Ok(FederatedSignIn::SessionGranted(user));
            }
            return self.issue_pending_link(profile).await;
        }

        // No account at all: create the shell now so the invariant "a
        // federated id maps to exactly one user" holds before setup
        // completes.
        let shell = User::federated_shell(
            profile.federated_id.clone(),
            profile.email.clone(),
            profile.name.clone(),
            profile.picture_url.clone(),
        );
        self.users
            .insert(&shell)
            .await
            .map_err(Self::map_user_error)?;
        self.issue_pending_link(profile).await
    }

    async fn issue_pending_link(
        &self,
        profile: FederatedProfile,
    ) -> Result<FederatedSignIn, Error> {
        let link = PendingLink::new(
            profile.federated_id,
            profile.email,
            profile.name,
            profile.picture_url,
        );
        let token = link.token;
        self.links.put(link).await.map_err(Self::map_link_error)?;
        Ok(FederatedSignIn::SetupRequired(token))
    }

    /// Finish federated setup by attaching a password credential.
    ///
    /// Idempotent: once the account holds a password, resubmission grants
    /// the session again without mutating the user.
    pub async fn complete_setup(
        &self,
        token: &LinkToken,
        password: &str,
        confirm: &str,
        accept_terms: bool,
    ) -> Result<User, Error> {
        let link = self
            .links
            .get(token)
            .await
            .map_err(Self::map_link_error)?
            .ok_or_else(|| Error::not_found("no pending federated setup for this token"))?;

        if link.is_expired(self.config.pending_link_ttl, Utc::now()) {
            self.links
                .remove(token)
                .await
                .map_err(Self::map_link_error)?;
            return Err(Error::invalid_request(
                "the setup link has expired; sign in again",
            ));
        }

        if !accept_terms {
            return Err(Error::invalid_request(
                "the terms of service must be accepted",
            ));
        }
        Self::check_password_pair(password, confirm)?;

        let mut user = self
            .find_linked_user(&link)
            .await?
            .ok_or_else(|| Error::not_found("the account for this setup no longer exists"))?;

        if user.is_blocked {
            return Err(Error::forbidden("account is blocked"));
        }

        // Resubmission after success lands here with a password already in
        // place and changes nothing: the user is mutated exactly once. The
        // token stays until the TTL sweeps it so a double submit is safe.
        if !user.has_password() {
            user.set_password(password).map_err(Self::map_validation_error)?;
            if user.federated_id.is_none() {
                user.attach_federated_identity(
                    link.federated_id.clone(),
                    link.name.clone(),
                    link.picture_url.clone(),
                );
            }
            self.users
                .update(&user)
                .await
                .map_err(Self::map_user_error)?;
        }

        Ok(user)
    }

    /// Resolve a request-scoped session to at most one actor.
    pub async fn resolve_session(
        &self,
        session: &SessionState,
    ) -> Result<SessionResolution, Error> {
        if let Some(user_id) = &session.user_id {
            let Some(user) = self
                .users
                .find_by_id(user_id)
                .await
                .map_err(Self::map_user_error)?
            else {
                // Stale reference to a deleted account.
                return Ok(SessionResolution::Anonymous);
            };
            if user.is_blocked {
                return Err(Error::forbidden("account is blocked"));
            }
            return Ok(SessionResolution::Authenticated(user));
        }

        if let Some(token) = &session.pending_link {
            let Some(link) = self.links.get(token).await.map_err(Self::map_link_error)? else {
                return Ok(SessionResolution::Anonymous);
            };
            if link.is_expired(self.config.pending_link_ttl, Utc::now()) {
                self.links
                    .remove(token)
                    .await
                    .map_err(Self::map_link_error)?;
                return Ok(SessionResolution::Anonymous);
            }
            if let Some(user) = self.find_linked_user(&link).await? {
                if user.is_blocked {
                    return Err(Error::forbidden("account is blocked"));
                }
            }
            return Ok(SessionResolution::SetupPending(link));
        }

        Ok(SessionResolution::Anonymous)
    }

    /// Change or set the account password.
    ///
    /// Accounts that already hold a password must present the current one;
    /// federated accounts setting their first password need none.
    pub async fn change_password(
        &self,
        user_id: &UserId,
        current: Option<&str>,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), Error> {
        let mut user = self.load_user(user_id).await?;
        if user.is_blocked {
            return Err(Error::forbidden("account is blocked"));
        }

        if user.has_password() {
            let Some(current) = current else {
                return Err(Error::invalid_request("the current password is required"));
            };
            if !user.verify_password(current) {
                return Err(Error::unauthorized("the current password is incorrect"));
            }
        }

        Self::check_password_pair(new_password, confirm)?;
        user.set_password(new_password)
            .map_err(Self::map_validation_error)?;
        self.users
            .update(&user)
            .await
            .map_err(Self::map_user_error)
    }

    /// Update the profile display name. Empty input clears it.
    pub async fn update_display_name(
        &self,
        user_id: &UserId,
        display_name: Option<String>,
    ) -> Result<User, Error> {
        let mut user = self.load_user(user_id).await?;
        if user.is_blocked {
            return Err(Error::forbidden("account is blocked"));
        }

        let cleaned = display_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        if let Some(name) = &cleaned {
            if name.chars().count() > 100 {
                return Err(Error::invalid_request(
                    "display name must be at most 100 characters",
                ));
            }
        }
        user.display_name = cleaned;
        self.users
            .update(&user)
            .await
            .map_err(Self::map_user_error)?;
        Ok(user)
    }

    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn find_linked_user(&self, link: &PendingLink) -> Result<Option<User>, Error> {
        if let Some(user) = self
            .users
            .find_by_federated_id(&link.federated_id)
            .await
            .map_err(Self::map_user_error)?
        {
            return Ok(Some(user));
        }
        self.users
            .find_by_email(&link.email)
            .await
            .map_err(Self::map_user_error)
    }
}

#[cfg(test)]
mod tests;
