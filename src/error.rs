use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to parse config: {0}")]
    ParseJson(#[source] serde_json::Error),

    #[error("chain id mismatch: configured {configured}, endpoint reports {reported}")]
    ChainIdMismatch { configured: u64, reported: u64 },
}

/// Chain access and transaction errors.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("call {call} failed: {reason}")]
    CallFailed { call: &'static str, reason: String },

    #[error("failed to submit {step}: {reason}")]
    SubmissionFailed { step: &'static str, reason: String },

    #[error("{step} transaction {tx_hash} reverted")]
    TransactionRevert { step: &'static str, tx_hash: String },

    #[error("no position token id found in {step} receipt {tx_hash}")]
    MissingTokenId { step: &'static str, tx_hash: String },
}

/// Liquidity and balance errors surfaced per pool or position.
#[derive(Error, Debug, Clone)]
pub enum LiquidityError {
    #[error("insufficient {token} balance: have {have}, need {need} (short {shortfall})")]
    InsufficientBalance {
        token: String,
        have: Decimal,
        need: Decimal,
        shortfall: Decimal,
    },

    #[error("insufficient underlying {token} to split: have {have}, need {need}")]
    InsufficientUnderlying {
        token: String,
        have: Decimal,
        need: Decimal,
    },

    #[error("position {token_id} is owned by {owner}, not {caller}")]
    OwnershipMismatch {
        token_id: String,
        owner: String,
        caller: String,
    },

    #[error("pool for {token0}/{token1} not found after creation")]
    PoolNotFound { token0: String, token1: String },

    #[error("position {token_id} still holds {liquidity} liquidity after full removal")]
    ResidualLiquidity { token_id: String, liquidity: u128 },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Liquidity(#[from] LiquidityError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// True when the failure means the position belongs to someone else.
    #[must_use]
    pub fn is_ownership_mismatch(&self) -> bool {
        matches!(
            self,
            Error::Liquidity(LiquidityError::OwnershipMismatch { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        // dialoguer::Error wraps an IO error
        Error::Io(std::io::Error::other(err.to_string()))
    }
}
