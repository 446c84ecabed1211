//! Domain entities, use-case services, and ports.
//!
//! Purpose: hold everything the web layer needs without dragging transport
//! concerns in. Types are strongly typed and validated at construction;
//! services compose authorization guards in front of every operation and
//! talk to infrastructure only through the traits in [`ports`].

pub mod access;
pub mod admin;
pub mod audit;
pub mod auth;
pub mod curation;
pub mod enrichment;
pub mod error;
pub mod identity;
pub mod ports;
pub mod user;
pub mod vocabulary;

pub use self::admin::{AdminService, AuditOverview};
pub use self::audit::{ApiCallRecord, ApiCallStat, ApiName, AuditStats};
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::curation::{CurationService, CurationStats, SaveOutcome, SaveTarget};
pub use self::enrichment::{
    EnrichedRecord, EnrichedWord, EnrichmentOutcome, EnrichmentService,
};
pub use self::error::{Error, ErrorCode};
pub use self::identity::{
    FederatedProfile, FederatedSignIn, IdentityConfig, IdentityService, SessionResolution,
    SessionState,
};
pub use self::user::{
    EmailAddress, FederatedId, StoredPasswordHash, User, UserId, UserValidationError,
};
pub use self::vocabulary::{
    EntryDraft, EntryEdit, EntryId, ListId, ListName, VocabularyEntry, VocabularyList,
    VocabularyValidationError,
};

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, Error>;
