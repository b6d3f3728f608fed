//! Calibration block decode.

use tracing::debug;

use crate::bus::RegisterBus;
use crate::decode::{packed12_high, packed12_low, signed16_le, signed8, unsigned16_le};
use crate::error::{BusError, SensorError};
use crate::structs::CalibrationData;

// 0x88 - 0xA1: temperature and pressure words, dig_H1 at the end
pub const REG_CALIB_00: u8 = 0x88;
pub const REG_CALIB_00_LEN: usize = 26;
// 0xE1 - 0xE7: remaining humidity coefficients
pub const REG_CALIB_26: u8 = 0xE1;
pub const REG_CALIB_26_LEN: usize = 7;

impl CalibrationData {
    /// Decode the two raw calibration blocks.
    pub fn from_blocks(a: &[u8; REG_CALIB_00_LEN], b: &[u8; REG_CALIB_26_LEN]) -> Self {
        let word = |i: usize| signed16_le(a[i], a[i + 1]);

        Self {
            t1: unsigned16_le(a[0], a[1]),
            t2: word(2),
            t3: word(4),
            p1: unsigned16_le(a[6], a[7]),
            p2: word(8),
            p3: word(10),
            p4: word(12),
            p5: word(14),
            p6: word(16),
            p7: word(18),
            p8: word(20),
            p9: word(22),
            h1: a[25],
            h2: signed16_le(b[0], b[1]),
            h3: b[2],
            h4: packed12_low(b[3], b[4]),
            h5: packed12_high(b[5], b[4]),
            h6: signed8(b[6]),
        }
    }

    /// Read both calibration blocks from the device. Either read failing
    /// fails the whole load.
    pub fn load<B: RegisterBus>(bus: &mut B, address: u16) -> Result<Self, SensorError> {
        let a: [u8; REG_CALIB_00_LEN] = read_exact(bus, address, REG_CALIB_00)?;
        let b: [u8; REG_CALIB_26_LEN] = read_exact(bus, address, REG_CALIB_26)?;
        let calib = Self::from_blocks(&a, &b);
        debug!(?calib, "loaded calibration");
        Ok(calib)
    }
}

fn read_exact<B: RegisterBus, const N: usize>(
    bus: &mut B,
    address: u16,
    register: u8,
) -> Result<[u8; N], SensorError> {
    let data = bus
        .read_block(address, register, N)
        .map_err(SensorError::Calibration)?;
    let got = data.len();
    data.try_into().map_err(|_| {
        SensorError::Calibration(BusError::ShortRead {
            register,
            expected: N,
            got,
        })
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Bosch datasheet example coefficients plus typical humidity ones.
    pub(crate) const BLOCK_A: [u8; REG_CALIB_00_LEN] = [
        0x70, 0x6B, // T1 = 27504
        0x43, 0x67, // T2 = 26435
        0x18, 0xFC, // T3 = -1000
        0x7D, 0x8E, // P1 = 36477
        0x43, 0xD6, // P2 = -10685
        0xD0, 0x0B, // P3 = 3024
        0x27, 0x0B, // P4 = 2855
        0x8C, 0x00, // P5 = 140
        0xF9, 0xFF, // P6 = -7
        0x8C, 0x3C, // P7 = 15500
        0xF8, 0xC6, // P8 = -14600
        0x70, 0x17, // P9 = 6000
        0x00, // reserved
        0x4B, // H1 = 75
    ];

    pub(crate) const BLOCK_B: [u8; REG_CALIB_26_LEN] = [
        0x6A, 0x01, // H2 = 362
        0x00, // H3 = 0
        0x13, 0x29, 0x03, // H4 = 313, H5 = 50
        0x1E, // H6 = 30
    ];

    pub(crate) fn reference() -> CalibrationData {
        CalibrationData {
            t1: 27504,
            t2: 26435,
            t3: -1000,
            p1: 36477,
            p2: -10685,
            p3: 3024,
            p4: 2855,
            p5: 140,
            p6: -7,
            p7: 15500,
            p8: -14600,
            p9: 6000,
            h1: 75,
            h2: 362,
            h3: 0,
            h4: 313,
            h5: 50,
            h6: 30,
        }
    }

    struct Blocks {
        a: Vec<u8>,
        b: Option<Vec<u8>>,
    }

    impl RegisterBus for Blocks {
        fn read_block(&mut self, _address: u16, register: u8, len: usize) -> Result<Vec<u8>, BusError> {
            match register {
                REG_CALIB_00 => Ok(self.a[..len.min(self.a.len())].to_vec()),
                REG_CALIB_26 => self
                    .b
                    .clone()
                    .ok_or_else(|| std::io::Error::other("nack").into()),
                _ => unreachable!("unexpected register {register:#04x}"),
            }
        }

        fn write_byte(&mut self, _address: u16, _register: u8, _value: u8) -> Result<(), BusError> {
            unreachable!("calibration load never writes")
        }
    }

    #[test]
    fn decodes_datasheet_blocks() {
        assert_eq!(CalibrationData::from_blocks(&BLOCK_A, &BLOCK_B), reference());
    }

    #[test]
    fn negative_humidity_coefficients() {
        let mut b = BLOCK_B;
        b[3] = 0xF0;
        b[4] = 0x8F;
        b[5] = 0xFF;
        b[6] = 0xF6;
        let calib = CalibrationData::from_blocks(&BLOCK_A, &b);
        assert_eq!(calib.h4, -241);
        assert_eq!(calib.h5, -8);
        assert_eq!(calib.h6, -10);
    }

    #[test]
    fn load_reads_both_blocks() {
        let mut bus = Blocks {
            a: BLOCK_A.to_vec(),
            b: Some(BLOCK_B.to_vec()),
        };
        let calib = CalibrationData::load(&mut bus, 0x76).unwrap();
        assert_eq!(calib, reference());
    }

    #[test]
    fn unreadable_humidity_block_is_fatal() {
        let mut bus = Blocks {
            a: BLOCK_A.to_vec(),
            b: None,
        };
        let err = CalibrationData::load(&mut bus, 0x76).unwrap_err();
        assert!(matches!(err, SensorError::Calibration(BusError::Io(_))));
    }

    #[test]
    fn short_block_is_rejected() {
        let mut bus = Blocks {
            a: BLOCK_A[..24].to_vec(),
            b: Some(BLOCK_B.to_vec()),
        };
        let err = CalibrationData::load(&mut bus, 0x76).unwrap_err();
        assert!(matches!(
            err,
            SensorError::Calibration(BusError::ShortRead {
                register: REG_CALIB_00,
                expected: 26,
                got: 24
            })
        ));
    }
}
