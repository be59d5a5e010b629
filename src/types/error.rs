//! Error types for the loyalty rewards engine
//!
//! This module defines every error that can occur while loading the catalog,
//! reading events, and running accrual or redemption.
//!
//! # Error Categories
//!
//! Each variant maps onto one [`ErrorKind`] so that a transport layer can pick
//! a status code without matching on individual variants:
//!
//! - **Validation**: malformed input, rejected before anything is persisted
//! - **NotFound**: a referenced merchant, transaction or reward does not exist
//! - **InsufficientRewards**: a business-rule rejection of a redemption
//! - **Persistence**: collaborator or file I/O failure
//! - **Consistency**: a post-condition was violated; signals a defect

use super::reward::RewardType;
use super::transaction::{MerchantId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of a [`LoyaltyError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientRewards,
    Persistence,
    Consistency,
}

/// Main error type for the loyalty rewards engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoyaltyError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// For event streams this is recoverable: the malformed record is skipped.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Amount is zero, negative or malformed
    #[error("Invalid amount '{amount}' for {operation}")]
    InvalidAmount {
        /// The offending amount as text
        amount: String,
        /// Operation that rejected it
        operation: String,
    },

    /// Reward type tag is not one of the recognized tags
    #[error("Invalid reward type '{reward_type}'")]
    InvalidRewardType {
        /// The unrecognized tag
        reward_type: String,
    },

    /// Any other malformed input field
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// A referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (merchant, reward, transaction, ...)
        entity: String,
        /// Identifier that was looked up
        id: u64,
    },

    /// Redemption requested more than the user holds for the key
    #[error(
        "Insufficient {reward_type} for user {user} at merchant {merchant}: available {available}, requested {requested}"
    )]
    InsufficientRewards {
        user: UserId,
        merchant: MerchantId,
        reward_type: RewardType,
        available: Decimal,
        requested: Decimal,
    },

    /// Decimal arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for user {user}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// User the operation was for
        user: UserId,
    },

    /// A collaborator failed to read or write
    #[error("Persistence failure in {operation}: {message}")]
    Persistence {
        operation: String,
        message: String,
    },

    /// A post-condition was violated
    #[error("Consistency violation in {operation}: {message}")]
    Consistency {
        operation: String,
        message: String,
    },
}

impl LoyaltyError {
    /// Classify the error for callers that only care about its category
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoyaltyError::ParseError { .. }
            | LoyaltyError::InvalidAmount { .. }
            | LoyaltyError::InvalidRewardType { .. }
            | LoyaltyError::Validation { .. }
            | LoyaltyError::ArithmeticOverflow { .. } => ErrorKind::Validation,
            LoyaltyError::NotFound { .. } => ErrorKind::NotFound,
            LoyaltyError::InsufficientRewards { .. } => ErrorKind::InsufficientRewards,
            LoyaltyError::FileNotFound { .. }
            | LoyaltyError::IoError { .. }
            | LoyaltyError::Persistence { .. } => ErrorKind::Persistence,
            LoyaltyError::Consistency { .. } => ErrorKind::Consistency,
        }
    }
}

impl From<std::io::Error> for LoyaltyError {
    fn from(error: std::io::Error) -> Self {
        LoyaltyError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LoyaltyError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LoyaltyError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LoyaltyError {
    /// Create a FileNotFound error
    pub fn file_not_found(path: &str) -> Self {
        LoyaltyError::FileNotFound {
            path: path.to_string(),
        }
    }

    /// Create a ParseError error
    pub fn parse_error(line: Option<u64>, message: impl Into<String>) -> Self {
        LoyaltyError::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: impl ToString, operation: &str) -> Self {
        LoyaltyError::InvalidAmount {
            amount: amount.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Create an InvalidRewardType error
    pub fn invalid_reward_type(reward_type: &str) -> Self {
        LoyaltyError::InvalidRewardType {
            reward_type: reward_type.to_string(),
        }
    }

    /// Create a Validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LoyaltyError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &str, id: u64) -> Self {
        LoyaltyError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    /// Create an InsufficientRewards error
    pub fn insufficient_rewards(
        user: UserId,
        merchant: MerchantId,
        reward_type: RewardType,
        available: Decimal,
        requested: Decimal,
    ) -> Self {
        LoyaltyError::InsufficientRewards {
            user,
            merchant,
            reward_type,
            available,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, user: UserId) -> Self {
        LoyaltyError::ArithmeticOverflow {
            operation: operation.to_string(),
            user,
        }
    }

    /// Create a Persistence error
    pub fn persistence(operation: &str, message: impl Into<String>) -> Self {
        LoyaltyError::Persistence {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Create a Consistency error
    pub fn consistency(operation: &str, message: impl Into<String>) -> Self {
        LoyaltyError::Consistency {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}
