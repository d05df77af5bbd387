//! Ratiometric sensors sampled through the VAD input.
//!
//! Humidity formulas follow the HIH-4010 datasheet, pressure formulas the
//! MPXA4115A datasheet.

use crate::{Ds2438, Ds2438Result, InputSelect};
use embedded_hal::delay::DelayNs;
use embedded_onewire::OneWire;

/// Supply and signal voltages of a ratiometric sensor, sampled back to back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltagePair {
    /// Supply (reference) voltage, in volts.
    pub source: f32,
    /// Sensor output voltage, in volts.
    pub sensor: f32,
}

impl VoltagePair {
    /// Sensor output as a fraction of the supply.
    ///
    /// A zero supply voltage yields an infinite or NaN ratio.
    pub fn ratio(&self) -> f32 {
        self.sensor / self.source
    }
}

/// Relative humidity in %RH from a sensor sample and the ambient temperature in °C.
pub fn humidity(pair: VoltagePair, temp_c: f32) -> f32 {
    // sensor RH at 25 °C: Vout = Vsupply * (0.0062 * RH + 0.16)
    let sensor_rh = (pair.ratio() - 0.16) / 0.0062;
    sensor_rh / (1.0546 - 0.00216 * temp_c)
}

/// Barometric pressure in kPa from a sensor sample.
pub fn pressure(pair: VoltagePair) -> f32 {
    (pair.ratio() + 0.095) / 0.009
}

/// Error band in kPa of a pressure reading, given the temperature in °C and
/// the supply voltage of the sensor.
///
/// The band is 1.5 kPa strictly between 15 and 115 kPa and 1 kPa elsewhere,
/// widened by 5 % per degree outside of 0 to 85 °C.
pub fn pressure_error(pressure: f32, temp_c: f32, source: f32) -> f32 {
    let pressure_error = if pressure > 15.0 && pressure < 115.0 {
        1.5
    } else {
        1.0
    };
    let temp_error = if temp_c > 85.0 {
        1.0 + temp_c * 0.05
    } else if temp_c < 0.0 {
        1.0 - temp_c * 0.05
    } else {
        1.0
    };
    temp_error * pressure_error * 0.009 * source
}

impl Ds2438 {
    /// Sample the reference input, then `target`.
    ///
    /// Both conversions happen in this order within the call, since the
    /// device holds one input selection at a time.
    pub fn read_pair<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
        target: InputSelect,
    ) -> Ds2438Result<VoltagePair, O::BusError> {
        self.select_input(bus, delay, InputSelect::Reference)?;
        let source = self.read_volt(bus, delay)?;
        self.select_input(bus, delay, target)?;
        let sensor = self.read_volt(bus, delay)?;
        Ok(VoltagePair { source, sensor })
    }

    /// Output of a generic ratiometric sensor on the VAD input, as a fraction of its supply.
    pub fn read_ad<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds2438Result<f32, O::BusError> {
        Ok(self
            .read_pair(bus, delay, InputSelect::PrimarySensor)?
            .ratio())
    }

    /// Temperature compensated relative humidity, in %RH.
    pub fn read_hum<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds2438Result<f32, O::BusError> {
        let temp_c = self.read_temp_c(bus, delay)?;
        let pair = self.read_pair(bus, delay, self.humidity_input)?;
        Ok(humidity(pair, temp_c))
    }

    /// Barometric pressure, in kPa.
    pub fn read_pressure<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds2438Result<f32, O::BusError> {
        let pair = self.read_pair(bus, delay, self.pressure_input)?;
        Ok(pressure(pair))
    }

    /// Error band of a pressure reading, in kPa, using a fresh sample of the
    /// sensor supply voltage.
    pub fn calc_pressure_error<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
        pressure: f32,
        temp_c: f32,
    ) -> Ds2438Result<f32, O::BusError> {
        self.select_input(bus, delay, InputSelect::Reference)?;
        let source = self.read_volt(bus, delay)?;
        Ok(pressure_error(pressure, temp_c, source))
    }

    /// Supply and output voltages of the solar sensor.
    pub fn read_solar<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds2438Result<VoltagePair, O::BusError> {
        self.read_pair(bus, delay, self.solar_input)
    }
}
