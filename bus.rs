//! Register access to the sensor.
//!
//! The decode and compensation code only ever talks to a [`RegisterBus`], so
//! it can run against a fake register map in tests. [`RppalBus`] is the
//! Raspberry Pi implementation.

use rppal::i2c::I2c;
use tracing::debug;

use crate::error::BusError;

pub trait RegisterBus {
    /// Read `len` consecutive registers starting at `register`.
    fn read_block(&mut self, address: u16, register: u8, len: usize) -> Result<Vec<u8>, BusError>;

    fn write_byte(&mut self, address: u16, register: u8, value: u8) -> Result<(), BusError>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read_block(&mut self, address: u16, register: u8, len: usize) -> Result<Vec<u8>, BusError> {
        (**self).read_block(address, register, len)
    }

    fn write_byte(&mut self, address: u16, register: u8, value: u8) -> Result<(), BusError> {
        (**self).write_byte(address, register, value)
    }
}

/// I2C controller of the Raspberry Pi.
pub struct RppalBus {
    i2c: I2c,
    selected: Option<u16>,
}

impl RppalBus {
    pub fn new(bus: u8) -> Result<Self, BusError> {
        let i2c = I2c::with_bus(bus)?;
        debug!(bus, clock_speed = ?i2c.clock_speed().ok(), "opened I2C bus");
        Ok(Self { i2c, selected: None })
    }

    fn select(&mut self, address: u16) -> Result<(), BusError> {
        if self.selected != Some(address) {
            self.i2c.set_slave_address(address)?;
            self.selected = Some(address);
        }
        Ok(())
    }
}

impl RegisterBus for RppalBus {
    fn read_block(&mut self, address: u16, register: u8, len: usize) -> Result<Vec<u8>, BusError> {
        self.select(address)?;
        let mut buf = vec![0u8; len];
        self.i2c.block_read(register, &mut buf)?;
        Ok(buf)
    }

    fn write_byte(&mut self, address: u16, register: u8, value: u8) -> Result<(), BusError> {
        self.select(address)?;
        self.i2c.smbus_write_byte(register, value)?;
        Ok(())
    }
}
