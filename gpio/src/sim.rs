//! In-memory [GpioProvider] that records every write.
//!
//! Nothing is driven electrically. The recorded trace makes it possible to check the exact signal
//! sequence an adapter produced, and to decode what a shift register would have latched.
use crate::{
    GpioError, GpioOutput, GpioProvider, GpioResult, PinDescriptor, PinMode, PinModes,
};
use bitvec::vec::BitVec;
use log::trace;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// One recorded write: the pin at `address` was driven to `level`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SimEvent {
    pub address: usize,
    pub level: bool,
}

pub struct SimGpioProvider {
    name: String,
    levels: RefCell<BitVec>,
    baseline: RefCell<BitVec>,
    used_pins: BitVec<AtomicU8>,
    trace: RefCell<Vec<SimEvent>>,
}

impl SimGpioProvider {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            levels: RefCell::new(BitVec::repeat(false, count)),
            baseline: RefCell::new(BitVec::repeat(false, count)),
            used_pins: BitVec::repeat(false, count),
            trace: RefCell::new(Vec::new()),
        }
    }

    /// Gets the last level driven on the pin, `None` if the address is out of range.
    pub fn level(&self, address: usize) -> Option<bool> {
        self.levels.borrow().get(address).map(|bit| *bit)
    }

    pub fn is_in_use(&self, address: usize) -> bool {
        self.used_pins.get(address).is_some_and(|bit| *bit)
    }

    /// Gets a copy of every write recorded so far, provisioning included.
    pub fn trace(&self) -> Vec<SimEvent> {
        self.trace.borrow().clone()
    }

    /// Forgets the recorded trace. Current levels become the starting point of the next one.
    pub fn clear_trace(&self) {
        self.trace.borrow_mut().clear();
        *self.baseline.borrow_mut() = self.levels.borrow().clone();
    }

    /// Counts LOW to HIGH transitions of the pin in the recorded trace.
    pub fn rising_edges(&self, address: usize) -> usize {
        let mut last = self.baseline.borrow().get(address).map(|bit| *bit);
        let mut edges = 0;
        for event in self.trace.borrow().iter().filter(|e| e.address == address) {
            if last == Some(false) && event.level {
                edges += 1;
            }
            last = Some(event.level);
        }
        edges
    }

    /// Decodes the bytes a serial-in, parallel-out register wired to `data`, `latch` and `clock`
    /// would have presented, one per latch rising edge.
    ///
    /// Bits are sampled from `data` on every clock rising edge and shifted in MSB-first.
    pub fn latched_bytes(&self, data: usize, latch: usize, clock: usize) -> Vec<u8> {
        let mut levels = self.baseline.borrow().clone();
        let mut register = 0u8;
        let mut bytes = Vec::new();

        for event in self.trace.borrow().iter() {
            let rising = !levels[event.address] && event.level;
            levels.set(event.address, event.level);

            if event.address == clock && rising {
                let bit = levels.get(data).is_some_and(|bit| *bit);
                register = (register << 1) | u8::from(bit);
            } else if event.address == latch && rising {
                bytes.push(register);
            }
        }

        bytes
    }

    fn record(&self, address: usize, level: bool) {
        self.levels.borrow_mut().set(address, level);
        self.trace.borrow_mut().push(SimEvent { address, level });
    }
}

impl Debug for SimGpioProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimGpioProvider({})", self.name)
    }
}

impl GpioProvider for SimGpioProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self) -> GpioResult<usize> {
        Ok(self.used_pins.len())
    }

    fn pin(&self, address: usize) -> GpioResult<PinDescriptor> {
        if address >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        PinDescriptor::new(
            self.name.as_str(),
            address,
            format!("SIM{}", address),
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

        self.used_pins.set_aliased(address, true);
        self.record(address, initial);
        trace!("{:?} provisioned pin {} ({})", self, address, initial);

        Ok(Box::new(SimOutput {
            provider: self,
            address,
        }))
    }
}

struct SimOutput<'a> {
    provider: &'a SimGpioProvider,
    address: usize,
}

impl Debug for SimOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.provider, self.address)
    }
}

impl GpioOutput for SimOutput<'_> {
    fn address(&self) -> usize {
        self.address
    }

    fn write(&self, value: bool) -> GpioResult<()> {
        self.provider.record(self.address, value);
        Ok(())
    }
}

impl Drop for SimOutput<'_> {
    fn drop(&mut self) {
        self.provider.used_pins.set_aliased(self.address, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_claims_the_pin_until_dropped() {
        let sim = SimGpioProvider::new("SIM", 4);
        let out = sim.provision_output(2, false).unwrap();
        assert!(sim.is_in_use(2));
        assert_eq!(
            sim.provision_output(2, false).unwrap_err(),
            GpioError::AlreadyInUse
        );
        drop(out);
        assert!(!sim.is_in_use(2));
        assert!(sim.provision_output(2, true).is_ok());
    }

    #[test]
    fn out_of_range_address_is_rejected() {
        let sim = SimGpioProvider::new("SIM", 4);
        assert_eq!(sim.pin(4).unwrap_err(), GpioError::InvalidArgument);
        assert_eq!(
            sim.provision_output(4, false).unwrap_err(),
            GpioError::InvalidArgument
        );
    }

    #[test]
    fn counts_rising_edges() {
        let sim = SimGpioProvider::new("SIM", 2);
        let out = sim.provision_output(1, false).unwrap();
        out.set_high().unwrap();
        out.set_high().unwrap();
        out.set_low().unwrap();
        out.set_high().unwrap();
        assert_eq!(sim.rising_edges(1), 2);
        assert_eq!(sim.level(1), Some(true));
    }

    #[test]
    fn decodes_msb_first_shift_out() {
        let sim = SimGpioProvider::new("SIM", 3);
        let data = sim.provision_output(0, false).unwrap();
        let latch = sim.provision_output(1, false).unwrap();
        let clock = sim.provision_output(2, false).unwrap();

        let value = 0b1010_0011u8;
        latch.set_low().unwrap();
        for bit in (0..8).rev() {
            data.write(value & (1 << bit) != 0).unwrap();
            clock.set_high().unwrap();
            clock.set_low().unwrap();
        }
        latch.set_high().unwrap();

        assert_eq!(sim.latched_bytes(0, 1, 2), vec![value]);
    }
}
