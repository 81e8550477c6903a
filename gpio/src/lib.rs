pub mod gpiod;
pub mod lcd;
pub mod sim;

use bitvec::prelude::*;
use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Electrical mode a physical pin can be driven in.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PinMode {
    DigitalInput,
    DigitalOutput,
    GpioClock,
    Pwm,
}

impl PinMode {
    pub const COUNT: usize = 4;

    pub const ALL: [PinMode; Self::COUNT] = [
        PinMode::DigitalInput,
        PinMode::DigitalOutput,
        PinMode::GpioClock,
        PinMode::Pwm,
    ];

    fn index(self) -> usize {
        match self {
            PinMode::DigitalInput => 0,
            PinMode::DigitalOutput => 1,
            PinMode::GpioClock => 2,
            PinMode::Pwm => 3,
        }
    }
}

/// Set of [PinMode]s supported by a pin.
#[derive(Copy, Clone, Default, Eq, PartialEq)]
pub struct PinModes(BitArr!(for PinMode::COUNT, in u8, Lsb0));

impl PinModes {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, mode: PinMode) -> Self {
        self.insert(mode);
        self
    }

    pub fn insert(&mut self, mode: PinMode) {
        self.0.set(mode.index(), true);
    }

    pub fn contains(&self, mode: PinMode) -> bool {
        self.0[mode.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.0.not_any()
    }

    pub fn iter(&self) -> impl Iterator<Item = PinMode> + '_ {
        PinMode::ALL.into_iter().filter(|&mode| self.contains(mode))
    }
}

impl FromIterator<PinMode> for PinModes {
    fn from_iter<T: IntoIterator<Item = PinMode>>(iter: T) -> Self {
        let mut modes = PinModes::empty();
        for mode in iter {
            modes.insert(mode);
        }
        modes
    }
}

impl Debug for PinModes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Immutable description of one physical pin offered by a [GpioProvider].
///
/// The address is 0-based and unique within its provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PinDescriptor {
    provider: String,
    address: usize,
    name: String,
    modes: PinModes,
}

impl PinDescriptor {
    /// Creates a new pin descriptor.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `modes` is empty.
    pub fn new(
        provider: impl Into<String>,
        address: usize,
        name: impl Into<String>,
        modes: PinModes,
    ) -> GpioResult<Self> {
        if modes.is_empty() {
            return Err(GpioError::InvalidArgument);
        }

        Ok(PinDescriptor {
            provider: provider.into(),
            address,
            name: name.into(),
            modes,
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modes(&self) -> PinModes {
        self.modes
    }

    pub fn supports(&self, mode: PinMode) -> bool {
        self.modes.contains(mode)
    }
}

impl Display for PinDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}#{})", self.name, self.provider, self.address)
    }
}

/// A source of physical pins, e.g. a GPIO chip.
///
/// Each address can be provisioned at most once at a time. The claim is released when the
/// returned handle is dropped.
pub trait GpioProvider: Debug {
    /// Gets the identity of the provider, matched against [PinDescriptor::provider].
    fn name(&self) -> &str;

    /// Gets the amount of pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Describes the pin at the given address.
    fn pin(&self, address: usize) -> GpioResult<PinDescriptor>;

    /// Provisions the pin at the given address as a digital output, driven to `initial` right away.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the address is out of range.
    /// - `GpioError::AlreadyInUse` if the pin is already provisioned.
    fn provision_output(
        &self,
        address: usize,
        initial: bool,
    ) -> GpioResult<Box<dyn GpioOutput + '_>>;
}

pub trait GpioOutput: Debug {
    /// Gets the address of the pin within its provider.
    fn address(&self) -> usize;

    /// Writes the state of the GPIO pin.
    fn write(&self, value: bool) -> GpioResult<()>;

    fn set_high(&self) -> GpioResult<()> {
        self.write(true)
    }

    fn set_low(&self) -> GpioResult<()> {
        self.write(false)
    }
}
