mod config;

use crate::config::{AdapterKind, Config, SIM_TRANSPORT};
use clcd_gpio::gpiod::GpiodProvider;
use clcd_gpio::lcd::adapter::{
    Adapter, GpioLcdAdapter, LcdAdapter, ShiftOutRegPin, ShiftRegisterLcdAdapter,
};
use clcd_gpio::lcd::hd44780::DisplayExt;
use clcd_gpio::lcd::hd44780::driver::{AdapterHD44780Driver, HD44780Driver};
use clcd_gpio::lcd::{LcdPin, LcdPinMap};
use clcd_gpio::sim::SimGpioProvider;
use clcd_gpio::GpioProvider;
use dotenv::dotenv;
use eyre::eyre;
use log::{debug, info, warn};
use sysinfo::System;
use time::OffsetDateTime;
use time::macros::format_description;

const UNKNOWN_STR: &str = "???";

fn build_pin_map(config: &Config, provider: &dyn GpioProvider) -> eyre::Result<LcdPinMap> {
    let mut pin_map = LcdPinMap::new();
    for (name, &address) in &config.pins {
        let role = LcdPin::ALL
            .into_iter()
            .find(|pin| pin.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| eyre!("Unknown LCD pin '{}'", name))?;

        let pin = match config.adapter {
            AdapterKind::ShiftRegister => ShiftOutRegPin::from_address(address)
                .ok_or_else(|| eyre!("No shift register output {} for {}", address, role))?
                .descriptor(),
            AdapterKind::Gpio => provider.pin(address)?,
        };
        pin_map.map(role, pin);
    }
    if pin_map.is_empty() {
        return Err(eyre!("No LCD pins configured"));
    }
    Ok(pin_map)
}

/// Amount of simulated lines needed to cover every address in the config.
fn sim_line_count(config: &Config) -> usize {
    let lines = config.shift_register;
    let mut addresses = vec![lines.data, lines.latch, lines.clock];
    if config.adapter == AdapterKind::Gpio {
        addresses.extend(config.pins.values().copied());
    }
    addresses.into_iter().max().map_or(0, |max| max + 1)
}

fn run(provider: &dyn GpioProvider, config: &Config) -> eyre::Result<()> {
    let pin_map = build_pin_map(config, provider)?;
    for (role, pin) in pin_map.all_pins() {
        info!("LCD {} @ {}", role, pin);
    }

    debug!("Initializing {:?} adapter...", config.adapter);
    let adapter: Adapter = match config.adapter {
        AdapterKind::ShiftRegister => {
            let lines = config.shift_register;
            info!(
                "Shift register @ Data: {}, Latch: {}, Clock: {}",
                lines.data, lines.latch, lines.clock
            );
            ShiftRegisterLcdAdapter::new(provider, lines.data, lines.latch, lines.clock, pin_map)?
                .into()
        }
        AdapterKind::Gpio => GpioLcdAdapter::new(provider, pin_map)?.into(),
    };

    let eight_bit = config.adapter == AdapterKind::Gpio
        && LcdPin::BYTE.iter().all(|&pin| adapter.pin_map().is_mapped(pin));
    let mut lcd = if eight_bit {
        AdapterHD44780Driver::new_8bit(adapter)
    } else {
        AdapterHD44780Driver::new_4bit(adapter)
    };

    debug!("Initializing LCD driver on a {:?} bus...", lcd.data_length());
    lcd.init(true, false)?;
    debug!("{:?} initialized.", lcd);

    lcd.print("Hello, ")?;
    lcd.print(System::host_name().as_deref().unwrap_or(UNKNOWN_STR))?;

    let now = OffsetDateTime::now_local().unwrap_or_else(|e| {
        warn!("Local time unavailable ({}), using UTC", e);
        OffsetDateTime::now_utc()
    });
    let time = now.format(format_description!("[hour]:[minute]:[second]"))?;
    lcd.set_cursor(1, 0)?;
    lcd.print(&time)?;

    info!("Greeting printed at {}.", time);
    Ok(())
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("clcd demo starting...");
    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!("Architecture {}", System::cpu_arch());

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };

    if config.is_simulated() {
        let sim = SimGpioProvider::new(SIM_TRANSPORT, sim_line_count(&config));
        debug!("{:?} initialized.", sim);
        run(&sim, &config)?;

        if config.adapter == AdapterKind::ShiftRegister {
            let lines = config.shift_register;
            let latched = sim.latched_bytes(lines.data, lines.latch, lines.clock);
            info!("Shift register latched {} bytes.", latched.len());
        }
        info!("Simulated lines changed level {} times.", sim.trace().len());
    } else {
        let gpio = GpiodProvider::open(&config.transport)?;
        debug!("{:?} initialized.", gpio);
        run(&gpio, &config)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clcd_gpio::lcd::LcdError;

    #[test]
    fn default_config_maps_shift_register_outputs() {
        let config = Config::default();
        let sim = SimGpioProvider::new(SIM_TRANSPORT, sim_line_count(&config));
        let pin_map = build_pin_map(&config, &sim).unwrap();

        assert_eq!(pin_map.len(), 7);
        assert_eq!(
            pin_map.resolve(LcdPin::En).map(|pin| pin.address()),
            Some(ShiftOutRegPin::QC.address())
        );
        assert!(ShiftRegisterLcdAdapter::validate_pin_map(&pin_map).is_ok());
    }

    #[test]
    fn gpio_config_maps_provider_pins() {
        let mut config = Config::default();
        config.adapter = AdapterKind::Gpio;
        let sim = SimGpioProvider::new(SIM_TRANSPORT, sim_line_count(&config));
        let pin_map = build_pin_map(&config, &sim).unwrap();

        let adapter = GpioLcdAdapter::new(&sim, pin_map);
        assert!(adapter.is_ok());
    }

    #[test]
    fn unknown_pin_names_are_rejected() {
        let mut config = Config::default();
        config.pins.insert("BACKLIGHT".to_string(), 3);
        let sim = SimGpioProvider::new(SIM_TRANSPORT, sim_line_count(&config));
        assert!(build_pin_map(&config, &sim).is_err());
    }

    #[test]
    fn empty_pin_config_is_rejected() {
        let mut config = Config::default();
        config.pins.clear();
        let sim = SimGpioProvider::new(SIM_TRANSPORT, sim_line_count(&config));
        assert!(build_pin_map(&config, &sim).is_err());
    }

    #[test]
    fn full_data_bus_selects_eight_bit_driver() {
        let mut config = Config::default();
        config.adapter = AdapterKind::Gpio;
        config.pins.clear();
        for (i, role) in LcdPin::ALL.iter().enumerate() {
            if *role != LcdPin::Rw {
                config.pins.insert(role.name().to_string(), i);
            }
        }
        let sim = SimGpioProvider::new(SIM_TRANSPORT, sim_line_count(&config));
        run(&sim, &config).unwrap();

        // Bytes go out whole: one enable pulse per reset write, command and character.
        let host = System::host_name().map_or(UNKNOWN_STR.len(), |name| name.chars().count());
        let commands = 3 + 4 + 1;
        let characters = "Hello, ".len() + host + "HH:MM:SS".len();
        assert_eq!(sim.rising_edges(config.pins["EN"]), commands + characters);
    }

    #[test]
    fn shared_addresses_fail_at_construction() {
        let mut config = Config::default();
        config.pins.insert("RW".to_string(), 0);
        let sim = SimGpioProvider::new(SIM_TRANSPORT, sim_line_count(&config));
        let pin_map = build_pin_map(&config, &sim).unwrap();
        let lines = config.shift_register;

        assert!(matches!(
            ShiftRegisterLcdAdapter::new(&sim, lines.data, lines.latch, lines.clock, pin_map),
            Err(LcdError::InvalidPinMapping { role: LcdPin::Rw, .. })
        ));
    }

    #[test]
    fn simulated_run_prints_greeting() {
        let config = Config::default();
        let sim = SimGpioProvider::new(SIM_TRANSPORT, sim_line_count(&config));
        run(&sim, &config).unwrap();

        let lines = config.shift_register;
        assert!(!sim.latched_bytes(lines.data, lines.latch, lines.clock).is_empty());
        assert!(!sim.is_in_use(lines.data));
    }
}
