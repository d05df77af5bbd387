use clap::{Parser, Subcommand};
use ds2438::{Ds2438, Ds2438Result, OneWire};
use embedded_hal::delay::DelayNs;

mod bridge;

/// Read a DS2438 battery monitor through a DS2484 I2C to 1-Wire bridge
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long)]
    path: String,
    /// ROM address of the DS2438, in hex. The first DS2438 found is used if omitted
    #[arg(short, long, value_parser = parse_rom)]
    rom: Option<u64>,
    /// The DS2438 has its own supply, do not hold a strong pull-up during conversions
    #[arg(long)]
    external_power: bool,
    /// Validate the CRC of every scratchpad read
    #[arg(long)]
    crc: bool,
    /// Time between readings, in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u32,
    /// Number of readings, forever if omitted
    #[arg(short, long)]
    count: Option<u32>,
    /// Number of 1 ms busy polls before a DS2484 command is given up on
    #[arg(long, default_value_t = 100)]
    retries: u8,
    #[command(subcommand)]
    reading: Reading,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Reading {
    /// Temperature in °C and °F
    Temperature,
    /// Voltage of the currently selected input
    Voltage,
    /// Raw current register
    Current,
    /// Status/configuration register
    Setup,
    /// Ratio of the VAD input to the supply
    Ad,
    /// Relative humidity
    Humidity,
    /// Barometric pressure and its error band
    Pressure,
    /// Solar sensor supply and output voltages
    Solar,
    /// Everything above
    All,
}

fn parse_rom(s: &str) -> Result<u64, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid ROM address {s:?}: {e}"))
}

fn report<O: OneWire, D: DelayNs>(
    dev: &mut Ds2438,
    bus: &mut O,
    delay: &mut D,
    reading: Reading,
) -> Ds2438Result<(), O::BusError> {
    let all = matches!(reading, Reading::All);
    if all || matches!(reading, Reading::Temperature) {
        let temp = dev.read_temperature(bus, delay)?;
        log::info!(
            "Temperature: {} °C, {:.2} °F",
            temp,
            temp.to_num::<f32>() * 1.8 + 32.0
        );
    }
    if all || matches!(reading, Reading::Voltage) {
        let volts = dev.read_volt(bus, delay)?;
        log::info!("Voltage ({:?}): {:.2} V", dev.input_select(), volts);
    }
    if all || matches!(reading, Reading::Current) {
        let current = dev.read_current(bus)?;
        log::info!("Current: {}", current);
    }
    if all || matches!(reading, Reading::Setup) {
        let cfg = dev.read_configuration(bus)?;
        log::info!("Setup: {:#04x} {:?}", cfg.into_bits(), cfg);
    }
    if all || matches!(reading, Reading::Ad) {
        let ratio = dev.read_ad(bus, delay)?;
        log::info!("A/D ratio: {:.4}", ratio);
    }
    if all || matches!(reading, Reading::Humidity) {
        let humidity = dev.read_hum(bus, delay)?;
        log::info!("Humidity: {:.1} %RH", humidity);
    }
    if all || matches!(reading, Reading::Pressure) {
        let temp = dev.read_temp_c(bus, delay)?;
        let pressure = dev.read_pressure(bus, delay)?;
        let error = dev.calc_pressure_error(bus, delay, pressure, temp)?;
        log::info!("Pressure: {:.2} ± {:.2} kPa", pressure, error);
    }
    if all || matches!(reading, Reading::Solar) {
        let solar = dev.read_solar(bus, delay)?;
        log::info!("Source : {:.2} V", solar.source);
        log::info!("Solar : {:.2} V", solar.sensor);
    }
    Ok(())
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Open the I2C bus
    let i2c = linux_embedded_hal::I2cdev::new(&args.path).expect("Failed to open I2C device");
    // Create a DS2484 bridge
    let mut bus =
        bridge::Ds2484Bridge::new(i2c, linux_embedded_hal::Delay).with_retries(args.retries);
    bus.init().expect("Failed to initialize DS2484");
    let mut delay = linux_embedded_hal::Delay;
    // Find the DS2438
    let rom = match args.rom {
        Some(rom) => rom,
        None => {
            let mut roms = [0; 1];
            let found = ds2438::enumerate(&mut bus, &mut roms).expect("Failed to enumerate devices");
            if found == 0 {
                log::error!("No DS2438 found on {}", args.path);
                std::process::exit(1);
            }
            roms[0]
        }
    };
    log::info!("Using DS2438 {:016x}", rom);
    let mut dev = Ds2438::new(rom)
        .with_parasite_power(!args.external_power)
        .with_crc(args.crc);
    let mut taken = 0;
    loop {
        if let Err(e) = report(&mut dev, &mut bus, &mut delay, args.reading) {
            log::error!("Reading failed: {:?}", e);
        }
        taken += 1;
        if args.count.is_some_and(|count| taken >= count) {
            break;
        }
        delay.delay_ms(args.interval_ms);
    }
}
