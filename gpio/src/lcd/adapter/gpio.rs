use crate::lcd::adapter::LcdAdapter;
use crate::lcd::{
    LcdError, LcdPin, LcdPinMap, LcdReadWriteState, LcdRegisterSelectState, LcdResult, PinState,
};
use crate::{GpioOutput, GpioProvider, PinMode};
use log::{debug, trace, warn};
use std::fmt::{Debug, Formatter};
use std::thread::sleep;
use std::time::Duration;

/// Adapter driving every LCD line from its own GPIO pin.
///
/// Writes are immediate, so [LcdAdapter::flush] has nothing to do. Both 4-bit and 8-bit modes
/// are supported, the latter only if DATA0..DATA3 are mapped too.
pub struct GpioLcdAdapter<'a> {
    provider: &'a dyn GpioProvider,
    pin_map: LcdPinMap,
    outputs: [Option<Box<dyn GpioOutput + 'a>>; LcdPin::COUNT],
    initialized: bool,
}

impl<'a> GpioLcdAdapter<'a> {
    /// How long the enable line is held high.
    pub const ENABLE_PULSE_WIDTH: Duration = Duration::from_micros(1);

    /// Creates an adapter for pins of `provider`. Nothing is provisioned until
    /// [LcdAdapter::initialize].
    ///
    /// # Errors
    /// - `LcdError::InvalidPinMapping` if a mapped pin belongs to another provider, cannot be a
    ///   digital output, or is shared by two roles.
    pub fn new(provider: &'a dyn GpioProvider, pin_map: LcdPinMap) -> LcdResult<Self> {
        pin_map.validate_against(provider.name(), PinMode::DigitalOutput)?;

        Ok(GpioLcdAdapter {
            provider,
            pin_map,
            outputs: std::array::from_fn(|_| None),
            initialized: false,
        })
    }

    fn ensure_initialized(&self) -> LcdResult<()> {
        if !self.initialized {
            return Err(LcdError::NotInitialized);
        }
        Ok(())
    }

    fn output(&self, pin: LcdPin) -> LcdResult<&dyn GpioOutput> {
        self.outputs[pin.index()]
            .as_deref()
            .ok_or(LcdError::PinNotMapped(pin))
    }

    fn set_pin_value(&mut self, pin: LcdPin, state: PinState) -> LcdResult<()> {
        self.ensure_initialized()?;
        self.output(pin)?.write(state.into())?;
        Ok(())
    }

    /// Writes `value` onto `lines` (bit 0 to the first line), then pulses enable.
    fn write_bits(&mut self, lines: &[LcdPin], value: u8) -> LcdResult<()> {
        self.ensure_initialized()?;

        for &pin in lines.iter().chain([&LcdPin::En]) {
            self.output(pin)?;
        }

        for (i, &pin) in lines.iter().enumerate() {
            self.output(pin)?.write(value & (1 << i) != 0)?;
        }

        self.pulse_enable()
    }
}

impl Debug for GpioLcdAdapter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpioLcdAdapter({:?})", self.provider)
    }
}

impl LcdAdapter for GpioLcdAdapter<'_> {
    fn pin_map(&self) -> &LcdPinMap {
        &self.pin_map
    }

    fn validate(&self, pin_map: &LcdPinMap) -> LcdResult<()> {
        pin_map.validate_against(self.provider.name(), PinMode::DigitalOutput)
    }

    /// Provisions every mapped pin as an output, driven LOW.
    fn initialize(&mut self) -> LcdResult<()> {
        if self.initialized {
            warn!("{:?} is already initialized", self);
            return Ok(());
        }

        let provider = self.provider;
        let mut outputs: [Option<Box<dyn GpioOutput + '_>>; LcdPin::COUNT] =
            std::array::from_fn(|_| None);
        for (role, pin) in self.pin_map.all_pins() {
            debug!("Using {} for {}", pin, role);
            outputs[role.index()] = Some(provider.provision_output(pin.address(), false)?);
        }

        self.outputs = outputs;
        self.initialized = true;
        debug!("Initialized GPIO adapter");
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
        trace!("Writing nibble {:04b}", value & 0x0F);
        self.write_bits(&LcdPin::NIBBLE, value)
    }

    fn write_8bits(&mut self, value: u8) -> LcdResult<()> {
        trace!("Writing byte {:08b}", value);
        self.write_bits(&LcdPin::BYTE, value)
    }

    fn flush(&mut self) -> LcdResult<()> {
        self.ensure_initialized()
    }

    fn pulse_enable(&mut self) -> LcdResult<()> {
        self.set_enable_state(PinState::Low)?;
        self.flush()?;
        self.set_enable_state(PinState::High)?;
        self.flush()?;
        sleep(Self::ENABLE_PULSE_WIDTH);
        self.set_enable_state(PinState::Low)?;
        self.flush()
    }
}
