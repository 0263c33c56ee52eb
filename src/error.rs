use std::io;

use thiserror::Error;

use crate::ids::{AccountId, TaskId};

/// Every failure the store reports. Nothing here is fatal; callers re-prompt or report.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username `{0}` is already taken")]
    DuplicateUsername(String),
    #[error("email `{0}` is already registered")]
    DuplicateEmail(String),
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("task {task_id} not found for account {account_id}")]
    TaskNotFound { account_id: AccountId, task_id: TaskId },
    #[error("task {0} is already completed")]
    AlreadyCompleted(TaskId),
    #[error("no {0} ids left")]
    IdsExhausted(&'static str),
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Username or email collision.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateUsername(_) | Self::DuplicateEmail(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound(_) | Self::TaskNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_grouping() {
        assert!(StoreError::DuplicateUsername("u1".to_string()).is_duplicate_key());
        assert!(StoreError::DuplicateEmail("e@x.com".to_string()).is_duplicate_key());
        assert!(!StoreError::AccountNotFound(101).is_duplicate_key());
        assert!(StoreError::AccountNotFound(101).is_not_found());
    }

    #[test]
    fn test_validation_message() {
        let err = StoreError::validation("email", "missing `@`");
        assert_eq!(err.to_string(), "invalid email: missing `@`");
    }
}
