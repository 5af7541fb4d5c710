//! Error types for the name registry

use thiserror::Error;

/// Failure reported by a [`crate::Ledger`] debit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("unknown account: {account}")]
    UnknownAccount { account: String },

    #[error("payment rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Domain already registered: {name}")]
    DomainAlreadyRegistered { name: String },

    #[error("Domain not registered: {name}")]
    DomainNotRegistered { name: String },

    #[error("No preorder found for commitment {commitment}")]
    PreorderNotFound { commitment: String },

    #[error("Preorder {commitment} expired at tick {expired_at}")]
    PreorderExpired { commitment: String, expired_at: u64 },

    #[error("Invalid domain name: {name} (length must be within {min}..={max})")]
    InvalidDomainName { name: String, min: usize, max: usize },

    #[error("Invalid record for {name}: {reason}")]
    InvalidRecord { name: String, reason: String },

    #[error("Unauthorized: caller {caller} may not act on {subject}")]
    NotAuthorized { caller: String, subject: String },

    #[error("Domain expired: {name} (expired at tick {expires_at})")]
    DomainExpired { name: String, expires_at: u64 },

    #[error("Insufficient payment: offered {offered}, required {required}")]
    InsufficientPayment { offered: u64, required: u64 },

    #[error("Payment failed: {0}")]
    PaymentFailed(#[from] PaymentError),

    #[error("Invalid registry configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Registry storage error: {0}")]
    StorageError(#[from] anyhow::Error),
}

/// Coarse failure classes callers are expected to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyRegistered,
    NotAuthorized,
    NotRegistered,
    InvalidName,
    InvalidRecord,
    Expired,
    InsufficientPayment,
    Config,
    Storage,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DomainAlreadyRegistered { .. } => ErrorKind::AlreadyRegistered,
            Self::DomainNotRegistered { .. }
            | Self::PreorderNotFound { .. }
            | Self::PreorderExpired { .. } => ErrorKind::NotRegistered,
            Self::InvalidDomainName { .. } => ErrorKind::InvalidName,
            Self::InvalidRecord { .. } => ErrorKind::InvalidRecord,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::DomainExpired { .. } => ErrorKind::Expired,
            Self::InsufficientPayment { .. } | Self::PaymentFailed(_) => {
                ErrorKind::InsufficientPayment
            }
            Self::InvalidConfig(_) | Self::ConfigError(_) => ErrorKind::Config,
            Self::StorageError(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
