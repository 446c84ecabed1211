//! Authentication primitives such as login credentials.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to the identity
//! service.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::user::{EmailAddress, UserValidationError};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or malformed.
    InvalidEmail(UserValidationError),
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(inner) => inner.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by the identity service.
///
/// ## Invariants
/// - `email` is normalised via [`EmailAddress`].
/// - `password` is non-empty but otherwise untouched; trailing whitespace is
///   preserved to avoid surprising credential comparisons.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::new(email).map_err(LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password candidate provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw")]
    #[case("not-an-email", "pw")]
    fn invalid_emails_fail(#[case] email: &str, #[case] password: &str) {
        let err =
            LoginCredentials::try_from_parts(email, password).expect_err("invalid email fails");
        assert!(matches!(err, LoginValidationError::InvalidEmail(_)));
    }

    #[test]
    fn blank_password_fails() {
        let err = LoginCredentials::try_from_parts("a@b.com", "")
            .expect_err("blank password must fail");
        assert_eq!(err, LoginValidationError::EmptyPassword);
    }

    #[test]
    fn password_whitespace_is_preserved() {
        let creds = LoginCredentials::try_from_parts("A@B.com", " secret ")
            .expect("valid credentials");
        assert_eq!(creds.email().as_ref(), "a@b.com");
        assert_eq!(creds.password(), " secret ");
    }
}
