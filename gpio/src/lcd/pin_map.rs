use crate::PinDescriptor;
use crate::PinMode;
use crate::lcd::{LcdError, LcdPin, LcdResult, MappingFault};

/// Binding of logical [LcdPin] roles to physical pins.
///
/// The map is partial: a role may be left unmapped (e.g. RW on write-only wiring). Each mapped
/// role has exactly one descriptor. The map knows nothing about transports; adapters check it
/// with [LcdPinMap::validate_against] and their own rules.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LcdPinMap {
    pins: [Option<PinDescriptor>; LcdPin::COUNT],
}

impl LcdPinMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `role` to `pin`, builder style.
    pub fn with(mut self, role: LcdPin, pin: impl Into<PinDescriptor>) -> Self {
        self.map(role, pin);
        self
    }

    /// Maps `role` to `pin`, returning the descriptor it was previously mapped to.
    pub fn map(&mut self, role: LcdPin, pin: impl Into<PinDescriptor>) -> Option<PinDescriptor> {
        self.pins[role.index()].replace(pin.into())
    }

    pub fn unmap(&mut self, role: LcdPin) -> Option<PinDescriptor> {
        self.pins[role.index()].take()
    }

    pub fn resolve(&self, role: LcdPin) -> Option<&PinDescriptor> {
        self.pins[role.index()].as_ref()
    }

    /// Same as [LcdPinMap::resolve], but an unmapped role is an error.
    pub fn require(&self, role: LcdPin) -> LcdResult<&PinDescriptor> {
        self.resolve(role).ok_or(LcdError::PinNotMapped(role))
    }

    pub fn is_mapped(&self, role: LcdPin) -> bool {
        self.pins[role.index()].is_some()
    }

    /// Iterates over the mapped roles in [LcdPin::ALL] order.
    pub fn all_pins(&self) -> impl Iterator<Item = (LcdPin, &PinDescriptor)> + '_ {
        LcdPin::ALL
            .into_iter()
            .filter_map(|role| self.resolve(role).map(|pin| (role, pin)))
    }

    pub fn len(&self) -> usize {
        self.pins.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every mapped pin comes from `provider`, supports `mode`, and is not shared
    /// with another role.
    ///
    /// # Errors
    /// - `LcdError::InvalidPinMapping` naming the first offending role and pin.
    pub fn validate_against(&self, provider: &str, mode: PinMode) -> LcdResult<()> {
        for (role, pin) in self.all_pins() {
            if pin.provider() != provider {
                return Err(invalid(
                    role,
                    pin,
                    MappingFault::ProviderMismatch {
                        expected: provider.to_string(),
                    },
                ));
            }

            if !pin.supports(mode) {
                return Err(invalid(role, pin, MappingFault::UnsupportedMode(mode)));
            }

            let shared = self
                .all_pins()
                .take_while(|&(other, _)| other != role)
                .find(|(_, other)| other.address() == pin.address());
            if let Some((other, _)) = shared {
                return Err(invalid(role, pin, MappingFault::SharedAddress(other)));
            }
        }

        Ok(())
    }
}

pub(crate) fn invalid(role: LcdPin, pin: &PinDescriptor, fault: MappingFault) -> LcdError {
    LcdError::InvalidPinMapping {
        role,
        pin: pin.name().to_string(),
        provider: pin.provider().to_string(),
        fault,
    }
}
