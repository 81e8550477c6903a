use crate::lcd::adapter::LcdAdapter;
use crate::lcd::pin_map::invalid;
use crate::lcd::{
    LcdError, LcdPin, LcdPinMap, LcdReadWriteState, LcdRegisterSelectState, LcdResult,
    MappingFault, PinState,
};
use crate::{GpioOutput, GpioProvider, PinDescriptor, PinMode, PinModes};
use log::{debug, trace, warn};

/// Output pins of a serial-in, parallel-out shift register (e.g. 74HC595).
///
/// ```text
/// Address:  0  1  2  3  4  5  6  7
///  SR pin: QA QB QC QD QE QF QG QH
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShiftOutRegPin {
    QA,
    QB,
    QC,
    QD,
    QE,
    QF,
    QG,
    QH,
}

impl ShiftOutRegPin {
    /// Provider identity of every shift register pin.
    pub const PROVIDER_NAME: &'static str = "ShiftOutReg";

    pub const ALL: [ShiftOutRegPin; 8] = [
        ShiftOutRegPin::QA,
        ShiftOutRegPin::QB,
        ShiftOutRegPin::QC,
        ShiftOutRegPin::QD,
        ShiftOutRegPin::QE,
        ShiftOutRegPin::QF,
        ShiftOutRegPin::QG,
        ShiftOutRegPin::QH,
    ];

    pub fn from_address(address: usize) -> Option<Self> {
        Self::ALL.get(address).copied()
    }

    pub fn address(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ShiftOutRegPin::QA => "QA",
            ShiftOutRegPin::QB => "QB",
            ShiftOutRegPin::QC => "QC",
            ShiftOutRegPin::QD => "QD",
            ShiftOutRegPin::QE => "QE",
            ShiftOutRegPin::QF => "QF",
            ShiftOutRegPin::QG => "QG",
            ShiftOutRegPin::QH => "QH",
        }
    }

    pub fn descriptor(self) -> PinDescriptor {
        PinDescriptor {
            provider: Self::PROVIDER_NAME.to_string(),
            address: self.address(),
            name: self.name().to_string(),
            modes: PinModes::empty()
                .with(PinMode::DigitalOutput)
                .with(PinMode::GpioClock),
        }
    }
}

impl From<ShiftOutRegPin> for PinDescriptor {
    fn from(pin: ShiftOutRegPin) -> Self {
        pin.descriptor()
    }
}

/// Adapter driving the LCD through a single shift-out register.
///
/// The adapter keeps an image of the register outputs. Setting a line only changes its bit in
/// the image; [LcdAdapter::flush] shifts the whole image out over the Data and Clock pins,
/// MSB first, between a LOW and HIGH edge of the Latch pin.
///
/// Only 4-bit mode is supported: eight register outputs cannot carry eight data lines plus
/// RS and EN. Daisy-chained registers are not supported either, so every mapped pin must be one
/// of [ShiftOutRegPin].
#[derive(Debug)]
pub struct ShiftRegisterLcdAdapter<'a> {
    pin_map: LcdPinMap,
    state: u8,
    initialized: bool,
    data_pin: Box<dyn GpioOutput + 'a>,
    latch_pin: Box<dyn GpioOutput + 'a>,
    clock_pin: Box<dyn GpioOutput + 'a>,
}

impl<'a> ShiftRegisterLcdAdapter<'a> {
    /// Amount of outputs of a single register.
    pub const REGISTER_WIDTH: usize = 8;

    /// Validates `pin_map`, then provisions the Data, Latch and Clock pins of `provider` as
    /// outputs, driven LOW.
    ///
    /// # Errors
    /// - `LcdError::InvalidPinMapping` if the map is not valid for a shift register.
    /// - `LcdError::Gpio` if a control pin cannot be provisioned, e.g. because another adapter
    ///   already drives the same register.
    pub fn new(
        provider: &'a dyn GpioProvider,
        data_pin: usize,
        latch_pin: usize,
        clock_pin: usize,
        pin_map: LcdPinMap,
    ) -> LcdResult<Self> {
        Self::validate_pin_map(&pin_map)?;

        let data_pin = provider.provision_output(data_pin, false)?;
        let latch_pin = provider.provision_output(latch_pin, false)?;
        let clock_pin = provider.provision_output(clock_pin, false)?;

        Ok(ShiftRegisterLcdAdapter {
            pin_map,
            state: 0,
            initialized: false,
            data_pin,
            latch_pin,
            clock_pin,
        })
    }

    /// Checks that every mapped pin is a [ShiftOutRegPin] capable of digital output, and that no
    /// two roles share an output.
    pub fn validate_pin_map(pin_map: &LcdPinMap) -> LcdResult<()> {
        pin_map.validate_against(ShiftOutRegPin::PROVIDER_NAME, PinMode::DigitalOutput)?;

        for (role, pin) in pin_map.all_pins() {
            if pin.address() >= Self::REGISTER_WIDTH {
                return Err(invalid(role, pin, MappingFault::ChainedRegister));
            }
        }

        Ok(())
    }

    /// Gets the register image, as it will be shifted out on the next commit.
    pub fn state(&self) -> u8 {
        self.state
    }

    /// Sets or clears the bit of `pin` in the register image. No other bit is touched.
    ///
    /// # Errors
    /// - `LcdError::PinNotMapped` if `pin` is not mapped.
    pub fn set_pin_value(&mut self, pin: LcdPin, state: PinState) -> LcdResult<()> {
        self.ensure_initialized()?;
        let mask = self.bit_address(pin)?;
        self.apply(mask, state);
        Ok(())
    }

    fn bit_address(&self, pin: LcdPin) -> LcdResult<u8> {
        let mapped = self.pin_map.require(pin)?;
        u32::try_from(mapped.address())
            .ok()
            .and_then(|address| 1u8.checked_shl(address))
            .ok_or_else(|| invalid(pin, mapped, MappingFault::ChainedRegister))
    }

    fn apply(&mut self, mask: u8, state: PinState) {
        if state.is_high() {
            self.state |= mask;
        } else {
            self.state &= !mask;
        }
    }

    fn ensure_initialized(&self) -> LcdResult<()> {
        if !self.initialized {
            return Err(LcdError::NotInitialized);
        }
        Ok(())
    }

    fn shift_data_out(&mut self) -> LcdResult<()> {
        trace!("Shifting out {:08b}", self.state);
        self.latch_pin.set_low()?;
        for bit in (0..8).rev() {
            self.data_pin.write(self.state & (1 << bit) != 0)?;
            self.clock_pin.set_high()?;
            self.clock_pin.set_low()?;
        }
        self.latch_pin.set_high()?;
        Ok(())
    }
}

impl LcdAdapter for ShiftRegisterLcdAdapter<'_> {
    fn pin_map(&self) -> &LcdPinMap {
        &self.pin_map
    }

    fn validate(&self, pin_map: &LcdPinMap) -> LcdResult<()> {
        Self::validate_pin_map(pin_map)
    }

    fn initialize(&mut self) -> LcdResult<()> {
        if self.initialized {
            warn!("{:?} is already initialized", self);
            return Ok(());
        }

        self.state = 0;
        self.initialized = true;
        self.shift_data_out()?;

        debug!("Initialized shift register adapter");
        debug!("Using data pin: {}", self.data_pin.address());
        debug!("Using latch pin: {}", self.latch_pin.address());
        debug!("Using clock pin: {}", self.clock_pin.address());
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn set_reg_select_state(&mut self, state: LcdRegisterSelectState) -> LcdResult<()> {
        self.set_pin_value(LcdPin::Rs, state.pin_state())
    }

    fn set_read_write_state(&mut self, state: LcdReadWriteState) -> LcdResult<()> {
        self.ensure_initialized()?;
        if !self.is_mapped(LcdPin::Rw) {
            return Ok(());
        }
        self.set_pin_value(LcdPin::Rw, state.pin_state())
    }

    fn set_enable_state(&mut self, state: PinState) -> LcdResult<()> {
        self.set_pin_value(LcdPin::En, state)
    }

    fn write_4bits(&mut self, value: u8) -> LcdResult<()> {
        self.ensure_initialized()?;

        // Resolve everything first, so a missing line leaves the image untouched.
        let mut masks = [0u8; 4];
        for (mask, pin) in masks.iter_mut().zip(LcdPin::NIBBLE) {
            *mask = self.bit_address(pin)?;
        }
        self.bit_address(LcdPin::En)?;

        for (i, mask) in masks.into_iter().enumerate() {
            self.apply(mask, PinState::from(value & (1 << i) != 0));
        }
        trace!("Writing nibble {:04b}", value & 0x0F);

        self.pulse_enable()
    }

    fn write_8bits(&mut self, _value: u8) -> LcdResult<()> {
        Err(LcdError::NotSupported)
    }

    fn flush(&mut self) -> LcdResult<()> {
        self.ensure_initialized()?;
        self.shift_data_out()
    }
}
