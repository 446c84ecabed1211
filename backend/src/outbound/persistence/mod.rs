//! Diesel/PostgreSQL persistence adapters.

mod diesel_audit_log;
mod diesel_helpers;
mod diesel_list_repository;
mod diesel_user_repository;
mod models;
pub mod pool;
pub mod schema;

pub use diesel_audit_log::DieselAuditLog;
pub use diesel_list_repository::DieselListRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
