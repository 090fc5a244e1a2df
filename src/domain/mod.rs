//! Domain layer - Core business types and contracts

pub mod error;
pub mod user;

pub use error::DomainError;
pub use user::{User, UserId, UserRepository, UserServiceError};
