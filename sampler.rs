use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::sleep;

use crate::bus::RegisterBus;
use crate::error::SensorError;
use crate::sensor::Bme280;
use crate::structs::{Measurement, SampleBatch};

/// Takes a fixed number of sequential readings at a fixed cadence.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    pub samples: usize,
    pub interval: Duration,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            samples: 20,
            interval: Duration::from_millis(100),
        }
    }
}

impl Sampler {
    pub fn new(samples: usize, interval: Duration) -> Self {
        Self { samples, interval }
    }

    /// Collect one batch. The first failing read aborts the whole batch.
    pub async fn sample_batch<B: RegisterBus>(
        &self,
        sensor: &mut Bme280<B>,
    ) -> Result<SampleBatch, SensorError> {
        let mut batch = Vec::with_capacity(self.samples);
        for _ in 0..self.samples {
            let start = Instant::now();
            let values = sensor.measure()?;
            let sensor_latency = start.elapsed();

            batch.push(Measurement {
                temperature: values.temperature,
                pressure: values.pressure,
                humidity: values.humidity,
                timestamp: Utc::now(),
                sensor_latency,
            });
            sleep(self.interval).await;
        }
        Ok(batch)
    }
}
