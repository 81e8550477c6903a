//! Signal-level behavior of the shift register adapter, observed through a simulated provider.

use clcd_gpio::lcd::adapter::{Adapter, LcdAdapter, ShiftOutRegPin, ShiftRegisterLcdAdapter};
use clcd_gpio::lcd::hd44780::DisplayExt;
use clcd_gpio::lcd::hd44780::driver::AdapterHD44780Driver;
use clcd_gpio::lcd::{
    LcdError, LcdPin, LcdPinMap, LcdReadWriteState, LcdRegisterSelectState, MappingFault,
    PinState,
};
use clcd_gpio::sim::SimGpioProvider;
use clcd_gpio::{GpioProvider, PinDescriptor, PinMode, PinModes};

const DATA: usize = 5;
const LATCH: usize = 6;
const CLOCK: usize = 7;

const EN_BIT: u8 = 1 << 2;

/// RS on QA, RW on QB, EN on QC, DATA4..DATA7 on QE..QH.
fn pin_map() -> LcdPinMap {
    LcdPinMap::new()
        .with(LcdPin::Rs, ShiftOutRegPin::QA)
        .with(LcdPin::Rw, ShiftOutRegPin::QB)
        .with(LcdPin::En, ShiftOutRegPin::QC)
        .with(LcdPin::Data4, ShiftOutRegPin::QE)
        .with(LcdPin::Data5, ShiftOutRegPin::QF)
        .with(LcdPin::Data6, ShiftOutRegPin::QG)
        .with(LcdPin::Data7, ShiftOutRegPin::QH)
}

fn initialized(sim: &SimGpioProvider, map: LcdPinMap) -> ShiftRegisterLcdAdapter<'_> {
    let mut adapter = ShiftRegisterLcdAdapter::new(sim, DATA, LATCH, CLOCK, map).unwrap();
    adapter.initialize().unwrap();
    sim.clear_trace();
    adapter
}

#[test]
fn one_role_write_never_disturbs_another() {
    let sim = SimGpioProvider::new("GPIO-A", 8);
    let mut adapter = initialized(&sim, pin_map());
    let map = pin_map();
    let mapped: Vec<_> = map.all_pins().map(|(role, pin)| (role, pin.address())).collect();

    for &(role, address) in &mapped {
        for &(other, _) in mapped.iter().filter(|(other, _)| *other != role) {
            for &(any, _) in &mapped {
                adapter.set_pin_value(any, PinState::Low).unwrap();
            }

            adapter.set_pin_value(role, PinState::High).unwrap();
            adapter.set_pin_value(other, PinState::Low).unwrap();
            assert_eq!(adapter.state(), 1u8 << address, "{} disturbed by {}", role, other);
        }
    }
}

#[test]
fn each_nibble_is_one_pulse_of_three_commits() {
    let sim = SimGpioProvider::new("GPIO-A", 8);
    let mut adapter = initialized(&sim, pin_map());

    adapter.write_4bits(0b0000).unwrap();
    adapter.write_4bits(0b1111).unwrap();

    assert_eq!(sim.rising_edges(LATCH), 6);
    let latched = sim.latched_bytes(DATA, LATCH, CLOCK);
    assert_eq!(
        latched,
        vec![
            0b0000_0000,
            0b0000_0100,
            0b0000_0000,
            0b1111_0000,
            0b1111_0100,
            0b1111_0000,
        ]
    );
    let enable: Vec<_> = latched.iter().map(|byte| byte & EN_BIT != 0).collect();
    assert_eq!(enable, vec![false, true, false, false, true, false]);
}

#[test]
fn missing_data7_fails_without_committing() {
    let sim = SimGpioProvider::new("GPIO-A", 8);
    let mut map = pin_map();
    map.unmap(LcdPin::Data7);
    let mut adapter = initialized(&sim, map);

    assert_eq!(
        adapter.write_4bits(0b1010),
        Err(LcdError::PinNotMapped(LcdPin::Data7))
    );
    assert!(sim.trace().is_empty());
    assert_eq!(adapter.state(), 0);
}

#[test]
fn pins_of_a_gpio_provider_are_rejected() {
    let sim = SimGpioProvider::new("GPIO-A", 8);
    let foreign = pin_map().with(LcdPin::Rw, sim.pin(3).unwrap());

    assert!(matches!(
        ShiftRegisterLcdAdapter::validate_pin_map(&foreign),
        Err(LcdError::InvalidPinMapping {
            role: LcdPin::Rw,
            fault: MappingFault::ProviderMismatch { .. },
            ..
        })
    ));
    assert!(ShiftRegisterLcdAdapter::new(&sim, DATA, LATCH, CLOCK, foreign).is_err());
    assert!(!sim.is_in_use(DATA));

    let adapter = ShiftRegisterLcdAdapter::new(&sim, DATA, LATCH, CLOCK, pin_map()).unwrap();
    assert!(adapter.validate(&pin_map()).is_ok());
}

#[test]
fn pins_without_digital_output_are_rejected() {
    let input_only = PinDescriptor::new(
        ShiftOutRegPin::PROVIDER_NAME,
        3,
        "QD",
        PinModes::empty().with(PinMode::DigitalInput),
    )
    .unwrap();
    let map = pin_map().with(LcdPin::Rw, input_only);

    assert!(matches!(
        ShiftRegisterLcdAdapter::validate_pin_map(&map),
        Err(LcdError::InvalidPinMapping {
            fault: MappingFault::UnsupportedMode(PinMode::DigitalOutput),
            ..
        })
    ));
}

#[test]
fn unmapped_read_write_is_silent() {
    let sim = SimGpioProvider::new("GPIO-A", 8);
    let mut map = pin_map();
    map.unmap(LcdPin::Rw);
    let mut adapter = initialized(&sim, map);

    for rs in [LcdRegisterSelectState::Command, LcdRegisterSelectState::Data] {
        adapter.set_reg_select_state(rs).unwrap();
        let before = adapter.state();
        for rw in [LcdReadWriteState::Read, LcdReadWriteState::Write] {
            assert_eq!(adapter.set_read_write_state(rw), Ok(()));
            assert_eq!(adapter.state(), before);
        }
    }
    assert!(sim.trace().is_empty());
}

#[test]
fn data4_on_qa_round_trips() {
    let sim = SimGpioProvider::new("GPIO-A", 8);
    let map = LcdPinMap::new().with(LcdPin::Data4, ShiftOutRegPin::QA);
    let mut adapter = initialized(&sim, map);

    adapter.set_pin_value(LcdPin::Data4, PinState::High).unwrap();
    assert_eq!(adapter.state(), 0x01);
    adapter.set_pin_value(LcdPin::Data4, PinState::Low).unwrap();
    assert_eq!(adapter.state(), 0x00);
}

#[test]
fn driver_prints_through_the_register() {
    let sim = SimGpioProvider::new("GPIO-A", 8);
    let adapter: Adapter = ShiftRegisterLcdAdapter::new(&sim, DATA, LATCH, CLOCK, pin_map())
        .unwrap()
        .into();
    let mut lcd = AdapterHD44780Driver::new_4bit(adapter);
    lcd.adapter_mut().initialize().unwrap();
    sim.clear_trace();

    lcd.print("A").unwrap();

    // 'A' = 0x41: high nibble 0x4 then low nibble 0x1, RS high, RW low.
    assert_eq!(
        sim.latched_bytes(DATA, LATCH, CLOCK),
        vec![
            0b0100_0001,
            0b0100_0101,
            0b0100_0001,
            0b0001_0001,
            0b0001_0101,
            0b0001_0001,
        ]
    );
}
