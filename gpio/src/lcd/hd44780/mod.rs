//! HD44780 LCD module.
//!
//! [driver::HD44780Driver] is the instruction set, [driver::AdapterHD44780Driver] runs it over any
//! [adapter](crate::lcd::adapter::LcdAdapter). [DisplayExt] adds text helpers on top.
pub mod driver;

use crate::lcd::{LcdError, LcdResult};
use driver::HD44780Driver;
use log::warn;

/// DDRAM address of the first column of each row.
pub const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Amount of columns the DDRAM holds per row.
pub const MAX_COLUMNS: usize = 40;

pub trait DisplayExt {
    /// Writes `s` at the cursor. Non-ASCII characters are written as `?`.
    fn print(&mut self, s: &str) -> LcdResult<()>;

    /// Moves the cursor to the given row and column, both 0-based.
    fn set_cursor(&mut self, row: usize, col: usize) -> LcdResult<()>;
}

impl<T: ?Sized + HD44780Driver> DisplayExt for T {
    fn print(&mut self, s: &str) -> LcdResult<()> {
        for c in s.chars() {
            if c.is_ascii() {
                self.send_data(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.send_data(b'?')?
            }
        }
        Ok(())
    }

    fn set_cursor(&mut self, row: usize, col: usize) -> LcdResult<()> {
        let offset = ROW_OFFSETS.get(row).ok_or(LcdError::InvalidArgument)?;
        if col >= MAX_COLUMNS {
            return Err(LcdError::InvalidArgument);
        }
        self.set_ddram_address(offset + col as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        commands: Vec<u8>,
        data: Vec<u8>,
    }

    impl HD44780Driver for Recorder {
        fn init(&mut self, _multiline: bool, _alt_font: bool) -> LcdResult<()> {
            Ok(())
        }

        fn send_command(&mut self, command: u8) -> LcdResult<()> {
            self.commands.push(command);
            Ok(())
        }

        fn send_data(&mut self, data: u8) -> LcdResult<()> {
            self.data.push(data);
            Ok(())
        }
    }

    #[test]
    fn instructions_encode_their_flags() {
        use super::driver::CursorDirection::{Left, Right};

        let mut lcd = Recorder::default();
        lcd.clear_display().unwrap();
        lcd.return_home().unwrap();
        lcd.set_entry_mode(Right, false).unwrap();
        lcd.set_entry_mode(Left, true).unwrap();
        lcd.set_display_control(true, false, true).unwrap();
        lcd.cursor_shift(true, Right).unwrap();
        lcd.function_set(false, true, false).unwrap();
        lcd.set_cgram_address(0x08).unwrap();
        assert_eq!(
            lcd.commands,
            vec![0x01, 0x02, 0x06, 0x05, 0x0D, 0x1C, 0x28, 0x48]
        );
    }

    #[test]
    fn print_replaces_non_ascii() {
        let mut lcd = Recorder::default();
        lcd.print("zł!").unwrap();
        assert_eq!(lcd.data, b"z?!".to_vec());
    }

    #[test]
    fn set_cursor_uses_row_offsets() {
        let mut lcd = Recorder::default();
        lcd.set_cursor(1, 3).unwrap();
        lcd.set_cursor(3, 0).unwrap();
        assert_eq!(lcd.commands, vec![0x80 | 0x43, 0x80 | 0x54]);
    }

    #[test]
    fn set_cursor_rejects_out_of_range() {
        let mut lcd = Recorder::default();
        assert_eq!(lcd.set_cursor(4, 0), Err(LcdError::InvalidArgument));
        assert_eq!(lcd.set_cursor(0, 40), Err(LcdError::InvalidArgument));
        assert!(lcd.commands.is_empty());
    }
}
