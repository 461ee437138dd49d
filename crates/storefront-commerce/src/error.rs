//! Storefront API error types.

use thiserror::Error;

use crate::checkout::StockConflict;

/// HTTP status the backend uses to signal insufficient stock.
pub const CONFLICT_STATUS: u16 = 409;

/// Tagged failure returned by the product and order gateways.
///
/// Only [`ApiError::StockConflict`] carries per-product shortfalls.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The order was rejected because one or more lines exceed stock.
    #[error("Stock conflict: {}", .0.message_or_default())]
    StockConflict(StockConflict),

    /// Non-success HTTP response other than a stock conflict.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (connection, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The HTTP status carried by this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::StockConflict(_) => Some(CONFLICT_STATUS),
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    /// Whether this is a stock conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::StockConflict(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
