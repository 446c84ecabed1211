//! User aggregate and its value types.
//!
//! A user may authenticate with a password credential, a federated identity,
//! or both. A federated-only account is "setup incomplete" until a password
//! is attached; the identity service routes such accounts through the
//! completion step before granting a session.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for user value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyEmail,
    MalformedEmail,
    EmptyFederatedId,
    PasswordTooShort { min: usize },
    PasswordUnhashable,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::MalformedEmail => write!(f, "email must contain a local part and a domain"),
            Self::EmptyFederatedId => write!(f, "federated id must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordUnhashable => write!(f, "password could not be hashed"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 6;

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID, e.g. one read back from storage.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Globally unique, normalised email address.
///
/// ## Invariants
/// - Trimmed and lower-cased on construction.
/// - Contains exactly one `@` with a non-empty local part and domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        match normalised.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(normalised))
            }
            _ => Err(UserValidationError::MalformedEmail),
        }
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Opaque identifier issued by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FederatedId(String);

impl FederatedId {
    /// Validate and construct a federated identity id.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyFederatedId);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for FederatedId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FederatedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<FederatedId> for String {
    fn from(value: FederatedId) -> Self {
        value.0
    }
}

impl TryFrom<String> for FederatedId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Argon2id credential in PHC string form. The plaintext never leaves the
/// constructor or the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredPasswordHash(String);

impl StoredPasswordHash {
    /// Hash a plaintext password with a fresh salt.
    pub fn derive(password: &str) -> Result<Self, UserValidationError> {
        if password.chars().count() < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|_| UserValidationError::PasswordUnhashable)?;
        Ok(Self(hash))
    }

    /// Wrap a hash read back from storage.
    pub fn from_phc_string(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Check a candidate password against the stored hash.
    pub fn verify(&self, candidate: &str) -> bool {
        PasswordHash::new(self.0.as_str())
            .map(|parsed| {
                Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// The PHC string persisted by repositories.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Application user.
///
/// ## Invariants
/// - `email` is globally unique (enforced by storage).
/// - `federated_id` is unique when present.
/// - A user with neither credential cannot be authenticated at all; a
///   federated-only user is setup-incomplete until a password is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
    pub password_hash: Option<StoredPasswordHash>,
    pub federated_id: Option<FederatedId>,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a password-based account, as produced by the registration form.
    pub fn register(
        email: EmailAddress,
        name: Option<String>,
        password: &str,
    ) -> Result<Self, UserValidationError> {
        let password_hash = StoredPasswordHash::derive(password)?;
        Ok(Self {
            id: UserId::random(),
            email,
            name,
            display_name: None,
            picture_url: None,
            password_hash: Some(password_hash),
            federated_id: None,
            is_admin: false,
            is_blocked: false,
            created_at: Utc::now(),
        })
    }

    /// Create a passwordless shell account from a federated sign-in profile.
    /// The account stays setup-incomplete until a password is attached.
    pub fn federated_shell(
        federated_id: FederatedId,
        email: EmailAddress,
        name: Option<String>,
        picture_url: Option<String>,
    ) -> Self {
        Self {
            id: UserId::random(),
            email,
            name,
            display_name: None,
            picture_url,
            password_hash: None,
            federated_id: Some(federated_id),
            is_admin: false,
            is_blocked: false,
            created_at: Utc::now(),
        }
    }

    /// Whether a password credential exists.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// A federated-only account must finish password setup before password
    /// login works; accounts with a password are always complete.
    pub fn is_setup_complete(&self) -> bool {
        self.has_password()
    }

    /// Verify a candidate password. Always false without a credential.
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(candidate))
    }

    /// Replace (or set) the password credential.
    pub fn set_password(&mut self, password: &str) -> Result<(), UserValidationError> {
        self.password_hash = Some(StoredPasswordHash::derive(password)?);
        Ok(())
    }

    /// Attach a federated identity, keeping existing profile fields when the
    /// incoming ones are absent.
    pub fn attach_federated_identity(
        &mut self,
        federated_id: FederatedId,
        name: Option<String>,
        picture_url: Option<String>,
    ) {
        self.federated_id = Some(federated_id);
        if self.name.is_none() {
            self.name = name;
        }
        if self.picture_url.is_none() {
            self.picture_url = picture_url;
        }
    }
}
