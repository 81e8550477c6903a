use crate::lcd::adapter::LcdAdapter;
use crate::lcd::hd44780::driver::{CursorDirection, HD44780Driver};
use crate::lcd::{LcdReadWriteState, LcdRegisterSelectState, LcdResult};
use log::{debug, trace};
use std::thread::sleep;
use std::time::Duration;

/// Width of the data bus between the adapter and the controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DataLength {
    FourBit,
    EightBit,
}

/// HD44780 driver talking to the controller through an [LcdAdapter].
///
/// Every byte is followed by a fixed wait covering the controller's execution time, so the busy
/// flag is never read and the RW line stays in write mode.
#[derive(Debug)]
pub struct AdapterHD44780Driver<A: LcdAdapter> {
    adapter: A,
    data_length: DataLength,
}

impl<A: LcdAdapter> AdapterHD44780Driver<A> {
    /// Execution time of most instructions is 37 us.
    const EXECUTION_DELAY: Duration = Duration::from_micros(50);
    /// Clear display and return home take up to 1.52 ms.
    const HOME_DELAY: Duration = Duration::from_millis(2);
    /// The controller needs more than 40 ms after power on before the first instruction.
    const POWER_ON_DELAY: Duration = Duration::from_millis(50);
    /// Wait after the first synchronization write, at least 4.1 ms.
    const SYNC_DELAY: Duration = Duration::from_millis(5);
    /// Wait after the later synchronization writes, at least 100 us.
    const SYNC_REPEAT_DELAY: Duration = Duration::from_micros(150);

    pub fn new_4bit(adapter: A) -> Self {
        AdapterHD44780Driver {
            adapter,
            data_length: DataLength::FourBit,
        }
    }

    pub fn new_8bit(adapter: A) -> Self {
        AdapterHD44780Driver {
            adapter,
            data_length: DataLength::EightBit,
        }
    }

    pub fn data_length(&self) -> DataLength {
        self.data_length
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    fn send(&mut self, data: u8, rs: LcdRegisterSelectState) -> LcdResult<()> {
        trace!("Sending data: {:08b}, RS: {:?}", data, rs);

        self.adapter.set_reg_select_state(rs)?;
        self.adapter.set_read_write_state(LcdReadWriteState::Write)?;

        match self.data_length {
            DataLength::EightBit => self.adapter.write_8bits(data)?,
            DataLength::FourBit => {
                self.adapter.write_4bits(data >> 4)?;
                self.adapter.write_4bits(data & 0x0F)?;
            }
        }

        if rs == LcdRegisterSelectState::Command && data <= 0b00000011 {
            sleep(Self::HOME_DELAY);
        } else {
            sleep(Self::EXECUTION_DELAY);
        }

        Ok(())
    }

    /// Writes the upper four bits of a function set instruction as a single bus transfer.
    ///
    /// Used before the controller knows the bus width, so in 4-bit mode only one nibble is sent.
    fn write_sync(&mut self, bits: u8) -> LcdResult<()> {
        trace!("Sync write: {:04b}", bits);
        match self.data_length {
            DataLength::EightBit => self.adapter.write_8bits(bits << 4),
            DataLength::FourBit => self.adapter.write_4bits(bits),
        }
    }
}

impl<A: LcdAdapter> HD44780Driver for AdapterHD44780Driver<A> {
    /// Initializes the adapter if it's not yet, then resets the controller by instruction.
    ///
    /// The reset writes `0011` three times as single transfers, so the controller ends up in
    /// 8-bit mode whatever its previous state was, then `0010` to switch to 4-bit mode if needed.
    fn init(&mut self, multiline: bool, alt_font: bool) -> LcdResult<()> {
        if !self.adapter.is_initialized() {
            self.adapter.initialize()?;
        }

        sleep(Self::POWER_ON_DELAY);
        self.adapter.set_reg_select_state(LcdRegisterSelectState::Command)?;
        self.adapter.set_read_write_state(LcdReadWriteState::Write)?;

        for delay in [Self::SYNC_DELAY, Self::SYNC_REPEAT_DELAY, Self::SYNC_REPEAT_DELAY] {
            self.write_sync(0b0011)?;
            sleep(delay);
        }
        if self.data_length == DataLength::FourBit {
            self.write_sync(0b0010)?;
            sleep(Self::EXECUTION_DELAY);
        }

        self.function_set(self.data_length == DataLength::EightBit, multiline, alt_font)?;
        self.clear_display()?;
        self.set_display_control(true, false, false)?;
        self.set_entry_mode(CursorDirection::Right, false)?;

        debug!("{:?} initialized", self);
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.send(command, LcdRegisterSelectState::Command)
    }

    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.send(data, LcdRegisterSelectState::Data)
    }
}
