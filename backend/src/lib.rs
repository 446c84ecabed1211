//! Vocabulary backend library.
//!
//! The crate is split along the hexagonal boundary: `domain` holds entities,
//! use-case services, and the ports they drive; `outbound` holds the adapters
//! that satisfy those ports (external HTTP services and PostgreSQL
//! persistence). The web layer consuming this crate talks to it through
//! [`domain::SessionState`] and plain data structures only.

pub mod domain;
pub mod outbound;
