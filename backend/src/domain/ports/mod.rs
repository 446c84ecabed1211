//! Domain ports for the hexagonal boundary.

mod audit_log;
mod definition_lookup;
mod list_repository;
mod pending_link_store;
mod translator;
mod user_repository;

pub use audit_log::{AuditLog, AuditLogError, FixtureAuditLog};
#[cfg(test)]
pub use audit_log::MockAuditLog;
pub use definition_lookup::{DefinitionLookup, WordDefinition};
pub use list_repository::{ListPersistenceError, ListRepository};
#[cfg(test)]
pub use list_repository::MockListRepository;
pub use pending_link_store::{LinkToken, PendingLink, PendingLinkStore, PendingLinkStoreError};
#[cfg(test)]
pub use pending_link_store::MockPendingLinkStore;
pub use translator::Translator;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use user_repository::MockUserRepository;
