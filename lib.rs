//! BME280 temperature, pressure and humidity service for the Raspberry Pi.
//!
//! The `acquire` role samples the sensor in bursts, rejects unreliable
//! bursts, and publishes the per-channel median to a shared store. The
//! `serve` role reads the latest record back out over HTTP.

pub mod acquisition;
pub mod aggregate;
pub mod api;
pub mod bus;
pub mod calibration;
pub mod compensate;
pub mod config;
pub mod decode;
pub mod error;
pub mod sampler;
pub mod sensor;
pub mod store;
pub mod structs;
pub mod validate;

pub use acquisition::{Acquisition, CycleError, SkipReason};
pub use bus::{RegisterBus, RppalBus};
pub use error::{BusError, RecordError, SensorError, StoreError};
pub use sampler::Sampler;
pub use sensor::Bme280;
pub use store::{MemoryStore, RedisStore, Store, TphRecord, TPH_KEY};
pub use structs::{AggregatedReading, CalibrationData, Measurement, RawReading, SampleBatch};
pub use validate::{ValidationFailure, Validator};
