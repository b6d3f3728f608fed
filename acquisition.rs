//! The acquisition loop: sample, validate, aggregate, publish, repeat.
//!
//! Each cycle ends in an explicit [`CycleError`] when nothing was published.
//! Skipped cycles are logged and the loop moves on immediately; only a fatal
//! error ends [`Acquisition::run`].

use std::fmt;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::aggregate::{aggregate, median};
use crate::bus::RegisterBus;
use crate::error::{SensorError, StoreError};
use crate::sampler::Sampler;
use crate::sensor::Bme280;
use crate::store::{publish, Store};
use crate::structs::{AggregatedReading, Measurement};
use crate::validate::{ValidationFailure, Validator};

#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("error sampling data: {0}")]
    Bus(#[from] SensorError),

    #[error("invalid sample data: {0}")]
    Invalid(#[from] ValidationFailure),

    #[error("failed to publish reading: {0}")]
    Publish(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum CycleError {
    /// Nothing was published this cycle; the next one may succeed.
    #[error("cycle skipped: {0}")]
    Skipped(#[from] SkipReason),

    #[error("fatal store error: {0}")]
    Fatal(#[source] StoreError),
}

impl From<StoreError> for CycleError {
    fn from(e: StoreError) -> Self {
        if e.is_transient() {
            CycleError::Skipped(SkipReason::Publish(e))
        } else {
            CycleError::Fatal(e)
        }
    }
}

pub struct Acquisition<B, S> {
    sensor: Bme280<B>,
    store: S,
    sampler: Sampler,
    validator: Validator,
}

impl<B, S> Acquisition<B, S>
where
    B: RegisterBus,
    S: Store,
{
    pub fn new(sensor: Bme280<B>, store: S, sampler: Sampler, validator: Validator) -> Self {
        Self {
            sensor,
            store,
            sampler,
            validator,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One full cycle. Blocks for roughly `samples * interval`.
    pub async fn run_cycle(&mut self) -> Result<AggregatedReading, CycleError> {
        let batch = self
            .sampler
            .sample_batch(&mut self.sensor)
            .await
            .map_err(SkipReason::from)?;
        debug!("sampled data: {}", BatchSummary(&batch));

        self.validator.check(&batch).map_err(SkipReason::from)?;
        let reading = aggregate(&batch).ok_or(SkipReason::Invalid(ValidationFailure::Empty))?;

        publish(&self.store, &reading).await?;
        info!(
            temperature = reading.temperature,
            pressure = reading.pressure,
            humidity = reading.humidity,
            timestamp = %reading.timestamp,
            "published reading"
        );
        Ok(reading)
    }

    /// Run cycles until a fatal error occurs.
    pub async fn run(mut self) -> StoreError {
        loop {
            match self.run_cycle().await {
                Ok(_) => {}
                Err(CycleError::Skipped(reason @ SkipReason::Invalid(_))) => {
                    warn!("{}. Skipping...", reason)
                }
                Err(CycleError::Skipped(reason)) => error!("{}", reason),
                Err(CycleError::Fatal(e)) => {
                    error!(error = %e, "stopping acquisition");
                    return e;
                }
            }
        }
    }
}

/// min / median / max of each channel, for the debug log.
struct BatchSummary<'a>(&'a [Measurement]);

impl fmt::Display for BatchSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels: [(&str, fn(&Measurement) -> f64); 4] = [
            ("temperature", |m| m.temperature),
            ("pressure", |m| m.pressure),
            ("humidity", |m| m.humidity),
            ("sensor_time", |m| m.sensor_latency.as_secs_f64()),
        ];
        write!(f, "n={}", self.0.len())?;
        for (name, value) in channels {
            let min = self.0.iter().map(value).fold(f64::INFINITY, f64::min);
            let max = self.0.iter().map(value).fold(f64::NEG_INFINITY, f64::max);
            if let Some(mid) = median(self.0.iter().map(value)) {
                write!(f, " {}=[{:.4} {:.4} {:.4}]", name, min, mid, max)?;
            }
        }
        Ok(())
    }
}
