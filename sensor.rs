//! One BME280 session: calibration, one-time configuration, burst reads.

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::bus::RegisterBus;
use crate::compensate;
use crate::decode::{raw16, raw20};
use crate::error::{BusError, SensorError};
use crate::structs::{CalibrationData, Compensated, RawReading};

// BME280 I2C default slave address.
pub const ADDR_BME280: u16 = 0x76;

// BME280 register addresses.
const REG_CHIP_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_ADC_VALUE: u8 = 0xF7;
const REG_ADC_VALUE_LEN: usize = 8;

const CHIP_ID_BME280: u8 = 0x60;
const SOFT_RESET: u8 = 0xB6;
const RESET_DELAY: Duration = Duration::from_millis(100);

pub struct Bme280<B> {
    bus: B,
    address: u16,
    calib: CalibrationData,
}

impl<B: RegisterBus> Bme280<B> {
    /// Open a session: check the chip, load its calibration and put it in
    /// normal mode. Nothing here is repeated between reads.
    ///
    /// Blocks the calling thread for the reset delay, so call it outside
    /// async code.
    pub fn new(mut bus: B, address: u16) -> Result<Self, SensorError> {
        let id = bus.read_block(address, REG_CHIP_ID, 1)?;
        match id.first() {
            Some(&CHIP_ID_BME280) => {}
            found => {
                return Err(SensorError::UnsupportedChip {
                    expected: CHIP_ID_BME280,
                    found: found.copied().unwrap_or(0),
                })
            }
        }

        let calib = CalibrationData::load(&mut bus, address)?;
        let mut sensor = Self { bus, address, calib };
        sensor.configure()?;
        info!("BME280 initialized at address {:#04x}", address);
        Ok(sensor)
    }

    fn configure(&mut self) -> Result<(), SensorError> {
        let osrs_t: u8 = 1; // Temperature oversampling x 1
        let osrs_p: u8 = 1; // Pressure oversampling x 1
        let osrs_h: u8 = 1; // Humidity oversampling x 1
        let mode: u8 = 3; // Normal mode
        let t_sb: u8 = 0; // Tstandby 0.5ms
        let filter: u8 = 0; // Filter off
        let spi3w_en: u8 = 0; // 3-wire SPI Disable

        self.bus.write_byte(self.address, REG_RESET, SOFT_RESET)?;
        thread::sleep(RESET_DELAY);

        // ctrl_hum only takes effect after the following ctrl_meas write
        self.bus.write_byte(self.address, REG_CTRL_HUM, osrs_h)?;
        self.bus
            .write_byte(self.address, REG_CTRL_MEAS, (osrs_t << 5) | (osrs_p << 2) | mode)?;
        self.bus
            .write_byte(self.address, REG_CONFIG, (t_sb << 5) | (filter << 2) | spi3w_en)?;
        Ok(())
    }

    pub fn calibration(&self) -> &CalibrationData {
        &self.calib
    }

    /// Burst read of the 0xF7 - 0xFE data registers.
    pub fn read_raw(&mut self) -> Result<RawReading, SensorError> {
        let data = self
            .bus
            .read_block(self.address, REG_ADC_VALUE, REG_ADC_VALUE_LEN)?;
        if data.len() != REG_ADC_VALUE_LEN {
            return Err(BusError::ShortRead {
                register: REG_ADC_VALUE,
                expected: REG_ADC_VALUE_LEN,
                got: data.len(),
            }
            .into());
        }
        Ok(RawReading {
            pressure: raw20(data[0], data[1], data[2]),
            temperature: raw20(data[3], data[4], data[5]),
            humidity: raw16(data[6], data[7]),
        })
    }

    /// One read, compensated into physical units.
    pub fn measure(&mut self) -> Result<Compensated, SensorError> {
        let raw = self.read_raw()?;
        Ok(compensate::compensate(&raw, &self.calib))
    }
}
