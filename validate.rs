use thiserror::Error;

use crate::structs::Measurement;

/// Why a batch was discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("batch is empty")]
    Empty,

    #[error("measurement {index} has a non-numeric field")]
    NonFinite { index: usize },

    #[error("sensor read time standard deviation {std_dev:.4}s exceeds {max:.4}s")]
    LatencyJitter { std_dev: f64, max: f64 },
}

/// Accepts or rejects a whole batch; there is no partial acceptance.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    /// Upper bound for the standard deviation of read latencies, in seconds.
    pub max_latency_std: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Self { max_latency_std: 0.01 }
    }
}

impl Validator {
    pub fn new(max_latency_std: f64) -> Self {
        Self { max_latency_std }
    }

    pub fn check(&self, batch: &[Measurement]) -> Result<(), ValidationFailure> {
        if batch.is_empty() {
            return Err(ValidationFailure::Empty);
        }
        if let Some(index) = batch.iter().position(|m| !is_complete(m)) {
            return Err(ValidationFailure::NonFinite { index });
        }

        let latencies: Vec<f64> = batch.iter().map(|m| m.sensor_latency.as_secs_f64()).collect();
        let std_dev = sample_std_dev(&latencies);
        if std_dev > self.max_latency_std {
            return Err(ValidationFailure::LatencyJitter {
                std_dev,
                max: self.max_latency_std,
            });
        }
        Ok(())
    }

    pub fn is_valid(&self, batch: &[Measurement]) -> bool {
        self.check(batch).is_ok()
    }
}

fn is_complete(m: &Measurement) -> bool {
    m.temperature.is_finite() && m.pressure.is_finite() && m.humidity.is_finite()
}

/// Sample standard deviation (n - 1). A single value has no spread.
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (n - 1.0)).sqrt()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;

    fn batch(latencies: &[f64]) -> Vec<Measurement> {
        latencies
            .iter()
            .map(|&l| Measurement {
                temperature: 20.5,
                pressure: 1013.2,
                humidity: 45.2,
                timestamp: Utc::now(),
                sensor_latency: Duration::from_secs_f64(l),
            })
            .collect()
    }

    #[test]
    fn empty_batch_is_invalid() {
        assert_eq!(Validator::default().check(&[]), Err(ValidationFailure::Empty));
        assert!(!Validator::default().is_valid(&[]));
    }

    #[test]
    fn steady_latencies_are_valid() {
        assert!(Validator::default().is_valid(&batch(&[0.001, 0.001, 0.001])));
        assert!(Validator::default().is_valid(&batch(&[0.5])));
    }

    #[test]
    fn jittery_latencies_are_invalid() {
        let result = Validator::default().check(&batch(&[0.001, 0.001, 0.2]));
        match result {
            Err(ValidationFailure::LatencyJitter { std_dev, .. }) => {
                assert!((std_dev - 0.11489).abs() < 1e-4)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_value_is_invalid() {
        let mut b = batch(&[0.001, 0.001, 0.001]);
        b[1].temperature = f64::NAN;
        assert_eq!(
            Validator::default().check(&b),
            Err(ValidationFailure::NonFinite { index: 1 })
        );
    }

    #[test]
    fn threshold_is_configurable() {
        let b = batch(&[0.001, 0.001, 0.2]);
        assert!(Validator::new(0.5).is_valid(&b));
    }
}
