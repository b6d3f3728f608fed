use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Factory calibration constants of one BME280, as burned into its NVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationData {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

/// Uncompensated ADC output of one burst read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReading {
    pub pressure: u32,
    pub temperature: u32,
    pub humidity: u32,
}

/// Physical values of one read: °C, hPa and %RH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compensated {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
    /// Wall-clock time spent inside the read call.
    pub sensor_latency: Duration,
}

pub type SampleBatch = Vec<Measurement>;

/// The single record published per acquisition cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedReading {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
    #[serde(serialize_with = "utc_seconds::serialize")]
    pub timestamp: DateTime<Utc>,
}

/// `YYYY-MM-DDTHH:MM:SSZ`, the form the acquisition side has always written.
mod utc_seconds {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(FORMAT))
    }
}
