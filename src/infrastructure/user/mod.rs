//! User infrastructure module
//!
//! Password hashing with Argon2, the PostgreSQL and in-memory repositories,
//! and the user service built on top of them.

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::UserService;
