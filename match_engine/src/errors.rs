use thiserror::Error;

use crate::types::{Price, Quantity};

/// Engine-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The order was refused before any state was touched.
    #[error("Invalid order: quantity {quantity} at price {price}: {reason}")]
    InvalidOrder {
        quantity: Quantity,
        price: Price,
        reason: RejectReason,
    },

    /// The engine task behind a trading pair is no longer running.
    #[error("Matching engine is not running")]
    EngineStopped,
}

/// Why `submit` refused an order
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("price must be positive after rounding")]
    NonPositivePrice,

    #[error("quantity exceeds the configured maximum")]
    QuantityAboveLimit,

    /// Accepting the order would overflow book or traded volume
    #[error("quantity would overflow engine volume")]
    VolumeOverflow,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Trait to simplify converting domain-specific errors into `anyhow::Error`
pub trait IntoAnyhow<T> {
    /// Convert a domain-specific error into an `anyhow::Error`
    fn into_anyhow(self) -> anyhow::Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> IntoAnyhow<T> for Result<T, E> {
    fn into_anyhow(self) -> anyhow::Result<T> {
        self.map_err(anyhow::Error::new)
    }
}
