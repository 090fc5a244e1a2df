//! Errors surfaced by the user service

use thiserror::Error;

use crate::domain::DomainError;

/// The only failures the user service reports to its callers.
///
/// Storage and hashing details are logged where they occur and never carried
/// past the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserServiceError {
    #[error("user with given id does not exist")]
    NotFound,

    #[error("something gone wrong")]
    General,
}

impl From<&DomainError> for UserServiceError {
    fn from(err: &DomainError) -> Self {
        if err.is_not_found() {
            Self::NotFound
        } else {
            Self::General
        }
    }
}

impl From<DomainError> for UserServiceError {
    fn from(err: DomainError) -> Self {
        Self::from(&err)
    }
}
