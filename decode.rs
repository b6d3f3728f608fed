//! Bit-level helpers for the BME280 register map.
//!
//! Calibration words are stored little-endian; the humidity coefficients
//! H4 and H5 are 12-bit values sharing the nibbles of register 0xE5.

/// Little-endian unsigned 16-bit word.
pub fn unsigned16_le(lo: u8, hi: u8) -> u16 {
    ((hi as u16) << 8) | lo as u16
}

/// Little-endian two's-complement 16-bit word.
pub fn signed16_le(lo: u8, hi: u8) -> i16 {
    unsigned16_le(lo, hi) as i16
}

/// 12-bit signed field made of `msb` and the low nibble of `shared` (dig_H4).
pub fn packed12_low(msb: u8, shared: u8) -> i16 {
    ((msb as i8 as i16) << 4) | (shared & 0x0F) as i16
}

/// 12-bit signed field made of `msb` and the high nibble of `shared` (dig_H5).
pub fn packed12_high(msb: u8, shared: u8) -> i16 {
    ((msb as i8 as i16) << 4) | (shared >> 4) as i16
}

pub fn signed8(b: u8) -> i8 {
    b as i8
}

/// 20-bit ADC value (pressure, temperature): `msb<<12 | lsb<<4 | xlsb>>4`.
pub fn raw20(msb: u8, lsb: u8, xlsb: u8) -> u32 {
    ((msb as u32) << 12) | ((lsb as u32) << 4) | ((xlsb as u32) >> 4)
}

/// 16-bit ADC value (humidity).
pub fn raw16(msb: u8, lsb: u8) -> u32 {
    ((msb as u32) << 8) | lsb as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_bit_words() {
        assert_eq!(unsigned16_le(0x01, 0x00), 1);
        assert_eq!(unsigned16_le(0x70, 0x6B), 27504);
        assert_eq!(signed16_le(0xFF, 0xFF), -1);
        assert_eq!(signed16_le(0x00, 0x80), -32768);
        assert_eq!(signed16_le(0xFF, 0x7F), 32767);
        assert_eq!(signed16_le(0x18, 0xFC), -1000);
    }

    #[test]
    fn packed_humidity_fields() {
        // E4 = 0x13, E5 = 0x29, E6 = 0x03 -> H4 = 313, H5 = 50
        assert_eq!(packed12_low(0x13, 0x29), 313);
        assert_eq!(packed12_high(0x03, 0x29), 50);
        // sign comes from the msb byte
        assert_eq!(packed12_low(0xFF, 0x0F), -1);
        assert_eq!(packed12_high(0x80, 0x00), -2048);
        assert_eq!(packed12_low(0x7F, 0xFF), 2047);
    }

    #[test]
    fn signed_byte() {
        assert_eq!(signed8(0x1E), 30);
        assert_eq!(signed8(0x7F), 127);
        assert_eq!(signed8(0x80), -128);
        assert_eq!(signed8(0xFF), -1);
    }

    #[test]
    fn adc_layouts() {
        assert_eq!(raw20(0x65, 0x5A, 0xC0), 415148);
        assert_eq!(raw20(0x7E, 0xED, 0x00), 519888);
        // low nibble of xlsb is not part of the value
        assert_eq!(raw20(0x7E, 0xED, 0x0F), 519888);
        assert_eq!(raw20(0xFF, 0xFF, 0xF0), 0xFFFFF);
        assert_eq!(raw16(0x75, 0x30), 30000);
    }
}
