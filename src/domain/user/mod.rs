//! User domain
//!
//! This module provides the user entity, the errors the user service is
//! allowed to surface, and the repository contract implemented by the
//! storage backends.

mod entity;
mod error;
mod repository;

pub use entity::{User, UserId};
pub use error::UserServiceError;
pub use repository::UserRepository;

#[cfg(test)]
pub use repository::mock::StubUserRepository;
