//! [GpioProvider] implementation for Linux GPIO character devices using the gpiod library.
use crate::{
    GpioError, GpioOutput, GpioProvider, GpioResult, PinDescriptor, PinMode, PinModes,
};
use bitvec::vec::BitVec;
use log::trace;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::atomic::AtomicU8;

/// GpiodProvider hands out output lines of a single GPIO chip.
///
/// The provider identity is the chip name (e.g. `gpiochip0`).
pub struct GpiodProvider {
    chip: gpiod::Chip,
    name: String,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodProvider {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        let name = chip.name().to_string();
        Self {
            chip,
            name,
            used_pins: BitVec::repeat(false, n),
        }
    }

    /// Opens the chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: impl AsRef<Path>) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path.as_ref())?))
    }
}

impl Debug for GpiodProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodProvider({})", self.name)
    }
}

impl GpioProvider for GpiodProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn pin(&self, address: usize) -> GpioResult<PinDescriptor> {
        if address >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        PinDescriptor::new(
            self.name.as_str(),
            address,
            format!("GPIO{}", address),
            PinModes::empty()
                .with(PinMode::DigitalInput)
                .with(PinMode::DigitalOutput),
        )
    }

    fn provision_output(
        &self,
        address: usize,
        initial: bool,
    ) -> GpioResult<Box<dyn GpioOutput + '_>> {
        if address >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[address] {
            return Err(GpioError::AlreadyInUse);
        }

        let line = self.chip.request_lines(
            gpiod::Options::output([address as u32]).consumer(env!("CARGO_PKG_NAME")),
        )?;
        line.set_values([initial])?;

        self.used_pins.set_aliased(address, true);
        trace!("{:?} provisioned line {} ({})", self, address, initial);

        Ok(Box::new(GpiodOutput {
            provider: self,
            address,
            line,
        }))
    }
}

struct GpiodOutput<'a> {
    provider: &'a GpiodProvider,
    address: usize,
    line: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.provider, self.address)
    }
}

impl GpioOutput for GpiodOutput<'_> {
    fn address(&self) -> usize {
        self.address
    }

    fn write(&self, value: bool) -> GpioResult<()> {
        self.line.set_values([value])?;
        Ok(())
    }
}

impl Drop for GpiodOutput<'_> {
    fn drop(&mut self) {
        self.provider.used_pins.set_aliased(self.address, false);
    }
}
