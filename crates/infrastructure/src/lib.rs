//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_catalog_repository;
mod postgres_audit_repository;
mod postgres_catalog_repository;
mod sqlx_errors;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_catalog_repository::InMemoryCatalogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_catalog_repository::PostgresCatalogRepository;
