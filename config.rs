//! Command line and environment configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::sampler::Sampler;
use crate::validate::Validator;

/// BME280 temperature / pressure / humidity service
#[derive(Parser, Debug)]
#[command(name = "rptph", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Shared store holding the latest reading
    #[arg(long, env = "REDIS_URL", default_value = "redis://redis:6379/0", global = true)]
    pub redis_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sample the sensor and publish the median reading, forever
    Acquire(AcquireArgs),

    /// Serve the latest reading over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AcquireArgs {
    /// I2C bus number
    #[arg(long, env = "I2C_BUS", default_value_t = 1)]
    pub i2c_bus: u8,

    /// Sensor address, e.g. 0x76
    #[arg(long, env = "I2C_ADDRESS", value_parser = parse_address)]
    pub i2c_address: u16,

    /// Readings per batch
    #[arg(long, default_value_t = 20)]
    pub samples: usize,

    /// Delay between readings in milliseconds
    #[arg(long, default_value_t = 100)]
    pub interval_ms: u64,

    /// Largest accepted standard deviation of read times, in seconds
    #[arg(long, default_value_t = 0.01)]
    pub max_latency_std: f64,

    /// Attempts for the initial store connection
    #[arg(long, default_value_t = 5)]
    pub connect_retries: u32,

    /// Delay between store connection attempts in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub connect_delay_ms: u64,
}

impl AcquireArgs {
    pub fn sampler(&self) -> Sampler {
        Sampler::new(self.samples, Duration::from_millis(self.interval_ms))
    }

    pub fn validator(&self) -> Validator {
        Validator::new(self.max_latency_std)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,
}

/// Accepts hex with or without `0x` (the usual way I2C addresses are written).
fn parse_address(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let address = u16::from_str_radix(digits, 16).map_err(|e| format!("invalid I2C address {s:?}: {e}"))?;
    if address > 0x7F {
        return Err(format!("I2C address {s} is out of the 7-bit range"));
    }
    Ok(address)
}
