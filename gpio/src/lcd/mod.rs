//! Character LCD support for HD44780-compatible controllers.
//!
//! The logical signal lines of the controller ([LcdPin]) are bound to physical pins through an
//! [LcdPinMap], which an [adapter](adapter::LcdAdapter) validates against its transport and then
//! drives. The [hd44780] module builds the controller command set on top of any adapter.
pub mod adapter;
pub mod hd44780;
mod pin_map;

use crate::{GpioError, PinMode};
pub use pin_map::*;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Logical signal line of the LCD controller, independent of wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum LcdPin {
    /// Register select.
    Rs,
    /// Read/write.
    Rw,
    /// Enable.
    En,
    Data0,
    Data1,
    Data2,
    Data3,
    Data4,
    Data5,
    Data6,
    Data7,
}

impl LcdPin {
    pub const COUNT: usize = 11;

    pub const ALL: [LcdPin; Self::COUNT] = [
        LcdPin::Rs,
        LcdPin::Rw,
        LcdPin::En,
        LcdPin::Data0,
        LcdPin::Data1,
        LcdPin::Data2,
        LcdPin::Data3,
        LcdPin::Data4,
        LcdPin::Data5,
        LcdPin::Data6,
        LcdPin::Data7,
    ];

    /// Data lines used in 4-bit mode, least significant first.
    pub const NIBBLE: [LcdPin; 4] = [LcdPin::Data4, LcdPin::Data5, LcdPin::Data6, LcdPin::Data7];

    /// Data lines used in 8-bit mode, least significant first.
    pub const BYTE: [LcdPin; 8] = [
        LcdPin::Data0,
        LcdPin::Data1,
        LcdPin::Data2,
        LcdPin::Data3,
        LcdPin::Data4,
        LcdPin::Data5,
        LcdPin::Data6,
        LcdPin::Data7,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LcdPin::Rs => "RS",
            LcdPin::Rw => "RW",
            LcdPin::En => "EN",
            LcdPin::Data0 => "DATA0",
            LcdPin::Data1 => "DATA1",
            LcdPin::Data2 => "DATA2",
            LcdPin::Data3 => "DATA3",
            LcdPin::Data4 => "DATA4",
            LcdPin::Data5 => "DATA5",
            LcdPin::Data6 => "DATA6",
            LcdPin::Data7 => "DATA7",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl Display for LcdPin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Electrical level of a line.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PinState {
    #[default]
    Low,
    High,
}

impl PinState {
    pub fn is_high(self) -> bool {
        self == PinState::High
    }
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value { PinState::High } else { PinState::Low }
    }
}

impl From<PinState> for bool {
    fn from(state: PinState) -> Self {
        state.is_high()
    }
}

/// State of the register select line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LcdRegisterSelectState {
    /// Instruction register, RS driven low.
    Command,
    /// Data register, RS driven high.
    Data,
}

impl LcdRegisterSelectState {
    pub fn pin_state(self) -> PinState {
        match self {
            LcdRegisterSelectState::Command => PinState::Low,
            LcdRegisterSelectState::Data => PinState::High,
        }
    }
}

/// State of the read/write line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LcdReadWriteState {
    /// RW driven high.
    Read,
    /// RW driven low.
    Write,
}

impl LcdReadWriteState {
    pub fn pin_state(self) -> PinState {
        match self {
            LcdReadWriteState::Read => PinState::High,
            LcdReadWriteState::Write => PinState::Low,
        }
    }
}

/// Why a mapped pin was rejected by an adapter.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum MappingFault {
    #[error("provider not supported, expected '{expected}'")]
    ProviderMismatch { expected: String },
    #[error("pin does not support {0:?} mode")]
    UnsupportedMode(PinMode),
    #[error("address already mapped to {0}")]
    SharedAddress(LcdPin),
    #[error("address is beyond a single register, daisy-chained registers are not supported")]
    ChainedRegister,
}

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("invalid mapping of {role} to pin '{pin}' of provider '{provider}': {fault}")]
    InvalidPinMapping {
        role: LcdPin,
        pin: String,
        provider: String,
        fault: MappingFault,
    },
    #[error("LCD pin '{0}' is not mapped")]
    PinNotMapped(LcdPin),
    #[error("LCD has not been initialized, call initialize() first")]
    NotInitialized,
    #[error("the operation is not supported by this adapter")]
    NotSupported,
    #[error("invalid argument")]
    InvalidArgument,
    #[error(transparent)]
    Gpio(#[from] GpioError),
}

pub type LcdResult<T> = Result<T, LcdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_indexed_in_declaration_order() {
        for (i, pin) in LcdPin::ALL.iter().enumerate() {
            assert_eq!(pin.index(), i);
        }
    }

    #[test]
    fn states_carry_their_levels() {
        assert_eq!(LcdRegisterSelectState::Command.pin_state(), PinState::Low);
        assert_eq!(LcdRegisterSelectState::Data.pin_state(), PinState::High);
        assert_eq!(LcdReadWriteState::Read.pin_state(), PinState::High);
        assert_eq!(LcdReadWriteState::Write.pin_state(), PinState::Low);
    }

    #[test]
    fn not_mapped_error_names_the_role() {
        assert_eq!(
            LcdError::PinNotMapped(LcdPin::Data7).to_string(),
            "LCD pin 'DATA7' is not mapped"
        );
    }
}
