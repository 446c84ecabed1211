//! Outbound adapters: external HTTP services and persistence.

pub mod dictionary;
pub mod linkage;
pub mod persistence;
pub mod translation;

pub use dictionary::DictionaryHttpClient;
pub use linkage::InMemoryPendingLinkStore;
pub use translation::TranslationHttpClient;
