//! Translation adapter.

mod http_client;

pub use http_client::{
    TranslationHttpClient, DEFAULT_BATCH_TIMEOUT, DEFAULT_SINGLE_TIMEOUT,
};
