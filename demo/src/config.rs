use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "clcd.json";

/// Transport value selecting the simulated provider.
pub const SIM_TRANSPORT: &str = "sim";

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    ShiftRegister,
    Gpio,
}

/// Provider lines feeding the shift register.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub struct ShiftRegisterLines {
    pub data: usize,
    pub latch: usize,
    pub clock: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// `sim`, or the path of a GPIO chip such as `/dev/gpiochip0`.
    pub transport: String,
    pub adapter: AdapterKind,
    pub shift_register: ShiftRegisterLines,
    /// Pin address per LCD line name (`RS`, `EN`, `DATA4`...).
    ///
    /// Addresses are register outputs for the shift register adapter, and chip lines for the
    /// GPIO adapter.
    pub pins: BTreeMap<String, usize>,
}

impl Config {
    fn path() -> String {
        let config_str = var_os("CLCD_CONFIG_FILE");
        let config_str: &OsStr = config_str
            .as_deref()
            .unwrap_or(OsStr::new(DEFAULT_CONFIG_FILE));
        config_str.to_string_lossy().into_owned()
    }

    pub fn try_load() -> Option<Self> {
        let config_str = Self::path();
        let config_path = Path::new(&config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = Self::path();
        let config_path = Path::new(&config_str);
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn is_simulated(&self) -> bool {
        self.transport == SIM_TRANSPORT
    }
}

impl Default for Config {
    /// Simulated shift register wired as RS=QA, RW=QB, EN=QC and DATA4..DATA7=QE..QH.
    fn default() -> Self {
        let pins = [
            ("RS", 0),
            ("RW", 1),
            ("EN", 2),
            ("DATA4", 4),
            ("DATA5", 5),
            ("DATA6", 6),
            ("DATA7", 7),
        ]
        .into_iter()
        .map(|(name, address)| (name.to_string(), address))
        .collect();

        Config {
            transport: SIM_TRANSPORT.to_string(),
            adapter: AdapterKind::ShiftRegister,
            shift_register: ShiftRegisterLines {
                data: 17,
                latch: 27,
                clock: 22,
            },
            pins,
        }
    }
}
