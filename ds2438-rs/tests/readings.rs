mod common;

use common::{Event, RecordingDelay, ROM, SimDs2438, assert_float_eq, delays, log};
use ds2438::{Ds2438, Ds2438Error, InputSelect, OneWireError};
use embedded_hal_mock::eh1::delay::NoopDelay;

#[test]
fn read_volt_decodes_register() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone());
    bus.page[3] = 0x2c;
    bus.page[4] = 0x01;
    let mut delay = RecordingDelay::new(log.clone());
    let dev = Ds2438::new(ROM);

    assert_float_eq(dev.read_volt(&mut bus, &mut delay).unwrap(), 3.0, 1e-4);
    assert_eq!(
        SimDs2438::commands(&log),
        vec![(0xb4, true), (0xb8, false), (0xbe, false)]
    );
    assert_eq!(delays(&log), vec![10]);
    // no input selection happens
    assert!(SimDs2438::configs(&log).is_empty());
}

#[test]
fn externally_powered_conversion_skips_pullup() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone());
    bus.strong_pullup = false;
    let mut delay = RecordingDelay::new(log.clone());
    let dev = Ds2438::new(ROM).with_parasite_power(false);

    dev.read_volt(&mut bus, &mut delay).unwrap();
    assert_eq!(SimDs2438::commands(&log)[0], (0xb4, false));
}

#[test]
fn parasite_power_needs_pullup_support() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone());
    bus.strong_pullup = false;
    let mut delay = NoopDelay::new();
    let dev = Ds2438::new(ROM);

    assert_eq!(
        dev.read_temp_c(&mut bus, &mut delay),
        Err(Ds2438Error::OneWire(OneWireError::Unimplemented))
    );
}

#[test]
fn read_temperature_decodes_register() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone()).with_temperature(0x00, 0x19);
    let mut delay = RecordingDelay::new(log.clone());
    let dev = Ds2438::new(ROM);

    assert_eq!(dev.read_temp_c(&mut bus, &mut delay), Ok(25.0));
    assert_eq!(SimDs2438::commands(&log)[0], (0x44, true));
    assert_eq!(delays(&log), vec![20]);

    bus.page[1] = 0x80;
    assert_eq!(dev.read_temp_c(&mut bus, &mut delay), Ok(25.5));
}

#[test]
fn fahrenheit_follows_celsius() {
    let log = log();
    let mut delay = RecordingDelay::new(log.clone());
    let dev = Ds2438::new(ROM);
    for (lsb, msb) in [(0x00, 0x19), (0x80, 0x19), (0xc0, 0xf5), (0x00, 0x00), (0x00, 0x7d)] {
        let mut bus = SimDs2438::new(log.clone()).with_temperature(lsb, msb);
        let c = dev.read_temp_c(&mut bus, &mut delay).unwrap();
        let f = dev.read_temp_f(&mut bus, &mut delay).unwrap();
        assert_float_eq(f, c * 1.8 + 32.0, 1e-4);
    }
}

#[test]
fn read_current_is_raw_signed() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone());
    let dev = Ds2438::new(ROM);

    bus.page[5] = 0x2a;
    bus.page[6] = 0x01;
    assert_eq!(dev.read_current(&mut bus), Ok(298.0));
    bus.page[5] = 0xf6;
    bus.page[6] = 0xff;
    assert_eq!(dev.read_current(&mut bus), Ok(-10.0));
    assert!(delays(&log).is_empty());
}

#[test]
fn read_ad_samples_reference_then_sensor() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone())
        .with_voltage(0x0f, 5.0)
        .with_voltage(0x00, 2.5);
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM);

    assert_float_eq(dev.read_ad(&mut bus, &mut delay).unwrap(), 0.5, 1e-5);
    assert_eq!(SimDs2438::configs(&log), vec![0x0f, 0x00]);
    let conversions = SimDs2438::commands(&log)
        .iter()
        .filter(|(cmd, _)| *cmd == 0xb4)
        .count();
    assert_eq!(conversions, 2);
    assert_eq!(delays(&log), vec![20, 10, 20, 10]);
    assert_eq!(dev.input_select(), Some(InputSelect::PrimarySensor));
}

#[test]
fn read_ad_with_dead_supply() {
    let log = log();
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM);

    let mut bus = SimDs2438::new(log.clone())
        .with_voltage(0x0f, 0.0)
        .with_voltage(0x00, 1.0);
    assert!(dev.read_ad(&mut bus, &mut delay).unwrap().is_infinite());

    let mut bus = SimDs2438::new(log.clone())
        .with_voltage(0x0f, 0.0)
        .with_voltage(0x00, 0.0);
    assert!(dev.read_ad(&mut bus, &mut delay).unwrap().is_nan());
}

#[test]
fn derived_reading_stops_on_bad_setup() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone()).with_voltage(0x0f, 5.0);
    bus.readback = Some(0x00);
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM);

    assert_eq!(
        dev.read_ad(&mut bus, &mut delay),
        Err(Ds2438Error::SetupMismatch {
            written: 0x0f,
            read: 0x00
        })
    );
    assert!(!SimDs2438::commands(&log).iter().any(|(cmd, _)| *cmd == 0xb4));
}

#[test]
fn read_hum_compensates_temperature() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone())
        .with_temperature(0x00, 0x19)
        .with_voltage(0x0f, 5.0)
        .with_voltage(0x00, 2.5);
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM);

    let rh = dev.read_hum(&mut bus, &mut delay).unwrap();
    let expected = ((0.5 - 0.16) / 0.0062) / (1.0546 - 0.00216 * 25.0);
    assert_float_eq(rh, expected, 1e-3);
    // temperature first, then the voltage pair
    assert_eq!(SimDs2438::commands(&log)[0], (0x44, true));
    assert_eq!(SimDs2438::configs(&log), vec![0x0f, 0x00]);
}

#[test]
fn read_pressure_uses_configured_input() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone())
        .with_voltage(0x0f, 5.0)
        .with_voltage(0x01, 2.5);
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM).with_pressure_input(InputSelect::Other(0x01));

    let kpa = dev.read_pressure(&mut bus, &mut delay).unwrap();
    assert_float_eq(kpa, (0.5 + 0.095) / 0.009, 1e-3);
    assert_eq!(SimDs2438::configs(&log), vec![0x0f, 0x01]);
}

#[test]
fn pressure_and_humidity_default_to_vad() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone());
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM);

    dev.read_pressure(&mut bus, &mut delay).unwrap();
    dev.read_hum(&mut bus, &mut delay).unwrap();
    assert_eq!(SimDs2438::configs(&log), vec![0x0f, 0x00, 0x0f, 0x00]);
}

#[test]
fn pressure_error_samples_reference_once() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone()).with_voltage(0x0f, 5.0);
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM);

    let err = dev
        .calc_pressure_error(&mut bus, &mut delay, 101.3, 20.0)
        .unwrap();
    assert_float_eq(err, 1.5 * 0.009 * 5.0, 1e-5);
    assert_eq!(SimDs2438::configs(&log), vec![0x0f]);

    let err = dev
        .calc_pressure_error(&mut bus, &mut delay, 115.0, 20.0)
        .unwrap();
    assert_float_eq(err, 0.009 * 5.0, 1e-5);
}

#[test]
fn read_solar_returns_both_voltages() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone())
        .with_voltage(0x0f, 4.87)
        .with_voltage(0x09, 0.42);
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM);

    let pair = dev.read_solar(&mut bus, &mut delay).unwrap();
    assert_float_eq(pair.source, 4.87, 1e-4);
    assert_float_eq(pair.sensor, 0.42, 1e-4);
    assert_eq!(SimDs2438::configs(&log), vec![0x0f, 0x09]);
    assert_eq!(dev.input_select(), Some(InputSelect::AuxiliarySensor));
}

#[test]
fn read_pair_keeps_fixed_order() {
    let log = log();
    let mut bus = SimDs2438::new(log.clone())
        .with_voltage(0x0f, 3.3)
        .with_voltage(0x22, 1.1);
    let mut delay = RecordingDelay::new(log.clone());
    let mut dev = Ds2438::new(ROM);

    let pair = dev
        .read_pair(&mut bus, &mut delay, InputSelect::Other(0x22))
        .unwrap();
    assert_float_eq(pair.ratio(), 1.0 / 3.0, 1e-4);
    let selects: Vec<_> = log
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::Command(0x4e, _) | Event::Command(0xb4, _)))
        .copied()
        .collect();
    assert_eq!(
        selects,
        vec![
            Event::Command(0x4e, false),
            Event::Command(0xb4, true),
            Event::Command(0x4e, false),
            Event::Command(0xb4, true),
        ]
    );
}
