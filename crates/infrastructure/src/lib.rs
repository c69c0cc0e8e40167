//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod fs_blob_store;
mod http_text_formatter;
mod in_memory_blob_store;
mod in_memory_grievance_repository;
mod in_memory_role_directory;
mod postgres_grievance_repository;
mod postgres_rate_limit_repository;
mod postgres_role_directory;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use fs_blob_store::FsBlobStore;
pub use http_text_formatter::HttpTextFormatter;
pub use in_memory_blob_store::InMemoryBlobStore;
pub use in_memory_grievance_repository::InMemoryGrievanceRepository;
pub use in_memory_role_directory::InMemoryRoleDirectory;
pub use postgres_grievance_repository::PostgresGrievanceRepository;
pub use postgres_rate_limit_repository::PostgresRateLimitRepository;
pub use postgres_role_directory::PostgresRoleDirectory;
pub use postgres_user_repository::PostgresUserRepository;
