//! Error types for the acquisition pipeline and the store boundary.

use thiserror::Error;

/// Failure of a single bus transfer. The transfer is treated as not having
/// happened at all.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("I2C transfer failed: {0}")]
    I2c(#[from] rppal::i2c::Error),

    #[error("bus I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short read at register {register:#04x}: expected {expected} bytes, got {got}")]
    ShortRead {
        register: u8,
        expected: usize,
        got: usize,
    },
}

/// Errors raised by a BME280 session.
#[derive(Debug, Error)]
pub enum SensorError {
    /// A register read or write failed during normal operation.
    #[error("sensor bus error: {0}")]
    Bus(#[from] BusError),

    /// Either calibration block could not be read. No partial calibration is usable.
    #[error("failed to load calibration data: {0}")]
    Calibration(#[source] BusError),

    #[error("unsupported chip id {found:#04x} (expected {expected:#04x})")]
    UnsupportedChip { expected: u8, found: u8 },
}

/// Errors talking to the shared store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the failure is expected to clear up on its own (dropped or
    /// refused connections, timeouts) as opposed to a misconfiguration.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Redis(e) => {
                e.is_io_error()
                    || e.is_connection_dropped()
                    || e.is_connection_refusal()
                    || e.is_timeout()
            }
            StoreError::Unavailable(_) => true,
            StoreError::Encode(_) => false,
        }
    }
}

/// A stored record that cannot be turned back into a reading.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid record json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
}
