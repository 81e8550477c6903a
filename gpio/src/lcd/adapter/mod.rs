//! Transports carrying the HD44780 parallel bus signals.
//!
//! See [LcdAdapter] for the contract, [ShiftRegisterLcdAdapter] and [GpioLcdAdapter] for the
//! implementations, and [Adapter] for choosing one of them at runtime.

mod gpio;
mod shift_register;

use crate::lcd::{
    LcdPin, LcdPinMap, LcdReadWriteState, LcdRegisterSelectState, LcdResult, PinState,
};
pub use gpio::*;
pub use shift_register::*;
use std::fmt::Debug;

/// Drives the logical LCD lines over one transport.
///
/// An adapter is bound to one [LcdPinMap] at construction and validates it there, so an adapter
/// that exists always has a valid map. Signal setters change the adapter's private output state;
/// [LcdAdapter::flush] makes that state electrically observable.
///
/// Calls must be serialized by the caller. Every operation except [LcdAdapter::validate] and
/// [LcdAdapter::initialize] fails with `LcdError::NotInitialized` until
/// [LcdAdapter::initialize] has completed.
pub trait LcdAdapter: Debug {
    /// Gets the pin map the adapter was constructed with.
    fn pin_map(&self) -> &LcdPinMap;

    /// Checks the pin map against the transport's requirements.
    ///
    /// # Errors
    /// - `LcdError::InvalidPinMapping` naming the offending role, pin and provider.
    fn validate(&self, pin_map: &LcdPinMap) -> LcdResult<()>;

    /// One-time setup of the transport. Calling it twice is a caller error; the second call only
    /// logs a warning.
    fn initialize(&mut self) -> LcdResult<()>;

    fn is_initialized(&self) -> bool;

    fn set_reg_select_state(&mut self, state: LcdRegisterSelectState) -> LcdResult<()>;

    /// Sets the read/write line. Does nothing if RW is not mapped (write-only wiring).
    fn set_read_write_state(&mut self, state: LcdReadWriteState) -> LcdResult<()>;

    fn set_enable_state(&mut self, state: PinState) -> LcdResult<()>;

    /// Writes the low nibble of `value` onto DATA4..DATA7 (bit 0 to DATA4) and pulses enable.
    ///
    /// # Errors
    /// - `LcdError::PinNotMapped` if one of DATA4..DATA7 or EN is not mapped. Nothing is
    ///   committed in that case.
    fn write_4bits(&mut self, value: u8) -> LcdResult<()>;

    /// Writes `value` onto DATA0..DATA7 (bit 0 to DATA0) and pulses enable.
    ///
    /// # Errors
    /// - `LcdError::NotSupported` if the transport cannot carry 8 data lines.
    fn write_8bits(&mut self, value: u8) -> LcdResult<()>;

    /// Commits the current output state to the transport.
    fn flush(&mut self) -> LcdResult<()>;

    fn is_mapped(&self, pin: LcdPin) -> bool {
        self.pin_map().is_mapped(pin)
    }

    /// Pulses the enable line: LOW, HIGH, LOW, committing after each step.
    ///
    /// Every step is committed on its own, as a serial transport only shows a transition after
    /// the commit that carries it.
    fn pulse_enable(&mut self) -> LcdResult<()> {
        self.set_enable_state(PinState::Low)?;
        self.flush()?;
        self.set_enable_state(PinState::High)?;
        self.flush()?;
        self.set_enable_state(PinState::Low)?;
        self.flush()
    }
}

/// One of the available adapters, selected at construction.
#[derive(Debug)]
pub enum Adapter<'a> {
    ShiftRegister(ShiftRegisterLcdAdapter<'a>),
    Gpio(GpioLcdAdapter<'a>),
}

impl<'a> From<ShiftRegisterLcdAdapter<'a>> for Adapter<'a> {
    fn from(adapter: ShiftRegisterLcdAdapter<'a>) -> Self {
        Adapter::ShiftRegister(adapter)
    }
}

impl<'a> From<GpioLcdAdapter<'a>> for Adapter<'a> {
    fn from(adapter: GpioLcdAdapter<'a>) -> Self {
        Adapter::Gpio(adapter)
    }
}

macro_rules! delegate {
    ($self:ident, $adapter:ident => $call:expr) => {
        match $self {
            Adapter::ShiftRegister($adapter) => $call,
            Adapter::Gpio($adapter) => $call,
        }
    };
}

impl LcdAdapter for Adapter<'_> {
    fn pin_map(&self) -> &LcdPinMap {
        delegate!(self, a => a.pin_map())
    }

    fn validate(&self, pin_map: &LcdPinMap) -> LcdResult<()> {
        delegate!(self, a => a.validate(pin_map))
    }

    fn initialize(&mut self) -> LcdResult<()> {
        delegate!(self, a => a.initialize())
    }

    fn is_initialized(&self) -> bool {
        delegate!(self, a => a.is_initialized())
    }

    fn set_reg_select_state(&mut self, state: LcdRegisterSelectState) -> LcdResult<()> {
        delegate!(self, a => a.set_reg_select_state(state))
    }

    fn set_read_write_state(&mut self, state: LcdReadWriteState) -> LcdResult<()> {
        delegate!(self, a => a.set_read_write_state(state))
    }

    fn set_enable_state(&mut self, state: PinState) -> LcdResult<()> {
        delegate!(self, a => a.set_enable_state(state))
    }

    fn write_4bits(&mut self, value: u8) -> LcdResult<()> {
        delegate!(self, a => a.write_4bits(value))
    }

    fn write_8bits(&mut self, value: u8) -> LcdResult<()> {
        delegate!(self, a => a.write_8bits(value))
    }

    fn flush(&mut self) -> LcdResult<()> {
        delegate!(self, a => a.flush())
    }

    fn pulse_enable(&mut self) -> LcdResult<()> {
        delegate!(self, a => a.pulse_enable())
    }
}
