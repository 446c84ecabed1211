//! Dictionary lookup adapter.

mod dto;
mod http_client;

pub use http_client::{
    DictionaryHttpClient, DEFAULT_DICTIONARY_ENDPOINT, DEFAULT_DICTIONARY_TIMEOUT,
};
