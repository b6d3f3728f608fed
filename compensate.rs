//! Floating point compensation formulas from the BME280 datasheet (4.2.3).
//!
//! Temperature has to be compensated first: it yields the [`Fine`]
//! temperature that the pressure and humidity formulas depend on. `Fine` can
//! only be obtained from [`temperature`], so the order is enforced by the
//! signatures and a value never outlives the reading it came from unless the
//! caller keeps it on purpose.

use crate::structs::{CalibrationData, Compensated, RawReading};

/// Fine temperature (`t_fine`) of one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fine(f64);

impl Fine {
    pub fn value(self) -> f64 {
        self.0
    }
}

/// Returns the temperature in °C and the fine temperature of this reading.
pub fn temperature(raw: u32, calib: &CalibrationData) -> (f64, Fine) {
    let adc_t = raw as f64;
    let t1 = calib.t1 as f64;
    let var1 = (adc_t / 16384.0 - t1 / 1024.0) * calib.t2 as f64;
    let var2 = (adc_t / 131072.0 - t1 / 8192.0)
        * (adc_t / 131072.0 - t1 / 8192.0)
        * calib.t3 as f64;
    let fine = var1 + var2;
    (fine / 5120.0, Fine(fine))
}

/// Pressure in hPa. Returns `0.0` instead of dividing by zero.
pub fn pressure(raw: u32, calib: &CalibrationData, fine: Fine) -> f64 {
    let mut var1 = fine.0 / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * calib.p6 as f64 / 32768.0;
    var2 = var2 + var1 * calib.p5 as f64 * 2.0;
    var2 = var2 / 4.0 + calib.p4 as f64 * 65536.0;
    var1 = (calib.p3 as f64 * var1 * var1 / 524288.0 + calib.p2 as f64 * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * calib.p1 as f64;
    if var1 == 0.0 {
        return 0.0;
    }
    let mut p = 1048576.0 - raw as f64;
    p = (p - var2 / 4096.0) * 6250.0 / var1;
    var1 = calib.p9 as f64 * p * p / 2147483648.0;
    var2 = p * calib.p8 as f64 / 32768.0;
    let pa = p + (var1 + var2 + calib.p7 as f64) / 16.0;
    pa / 100.0
}

/// Relative humidity in %, clamped to `[0, 100]`.
pub fn humidity(raw: u32, calib: &CalibrationData, fine: Fine) -> f64 {
    let mut h = fine.0 - 76800.0;
    h = (raw as f64 - (calib.h4 as f64 * 64.0 + calib.h5 as f64 / 16384.0 * h))
        * (calib.h2 as f64 / 65536.0
            * (1.0
                + calib.h6 as f64 / 67108864.0 * h * (1.0 + calib.h3 as f64 / 67108864.0 * h)));
    h = h * (1.0 - calib.h1 as f64 * h / 524288.0);
    h.clamp(0.0, 100.0)
}

/// Compensate all three channels of one reading.
pub fn compensate(raw: &RawReading, calib: &CalibrationData) -> Compensated {
    let (temperature, fine) = temperature(raw.temperature, calib);
    Compensated {
        temperature,
        pressure: pressure(raw.pressure, calib, fine),
        humidity: humidity(raw.humidity, calib, fine),
    }
}
