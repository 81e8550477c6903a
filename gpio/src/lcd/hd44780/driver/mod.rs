//! HD44780 instruction set.
//!
//! Every instruction is one byte written with RS low; its highest set bit selects the
//! instruction and the bits below it are its arguments. The trait only knows how to build those
//! bytes. Getting them onto the bus (nibble split, enable pulse, execution delays) is up to the
//! implementor, e.g. [AdapterHD44780Driver] over an [LcdAdapter](crate::lcd::adapter::LcdAdapter).
mod adapter;

use crate::lcd::{LcdError, LcdResult};
pub use adapter::*;
use std::fmt::Debug;

const CLEAR_DISPLAY: u8 = 0x01;
const RETURN_HOME: u8 = 0x02;
const ENTRY_MODE_SET: u8 = 0x04;
const DISPLAY_CONTROL: u8 = 0x08;
const CURSOR_SHIFT: u8 = 0x10;
const FUNCTION_SET: u8 = 0x20;
const SET_CGRAM_ADDRESS: u8 = 0x40;
const SET_DDRAM_ADDRESS: u8 = 0x80;

/// Highest address accepted by [HD44780Driver::set_cgram_address].
pub const MAX_CGRAM_ADDRESS: u8 = 0x3F;
/// Highest address accepted by [HD44780Driver::set_ddram_address].
pub const MAX_DDRAM_ADDRESS: u8 = 0x7F;

fn flag(enabled: bool, bit: u8) -> u8 {
    if enabled { bit } else { 0 }
}

/// Write-only command set of an HD44780 controller.
///
/// Implementors provide [HD44780Driver::init], [HD44780Driver::send_command] and
/// [HD44780Driver::send_data]; the provided methods encode instructions on top of
/// `send_command`. The busy flag is never read, so implementors must wait out each
/// instruction's execution time themselves.
pub trait HD44780Driver: Debug {
    /// Resets the controller and leaves it cleared, with the display on and the cursor moving
    /// right. `multiline` selects 2-line mode and `alt_font` the 5x10 dot font.
    fn init(&mut self, multiline: bool, alt_font: bool) -> LcdResult<()>;

    /// Fills DDRAM with spaces and moves the cursor to address 0.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.send_command(CLEAR_DISPLAY)
    }

    /// Moves the cursor to address 0 and undoes any display shift. DDRAM is kept.
    fn return_home(&mut self) -> LcdResult<()> {
        self.send_command(RETURN_HOME)
    }

    /// Chooses where the cursor goes after each data write, and whether the whole display
    /// shifts along with it.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> LcdResult<()> {
        self.send_command(
            ENTRY_MODE_SET
                | flag(cursor_direction == CursorDirection::Right, 0x02)
                | flag(shift, 0x01),
        )
    }

    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        self.send_command(
            DISPLAY_CONTROL
                | flag(display_on, 0x04)
                | flag(cursor_on, 0x02)
                | flag(blink_on, 0x01),
        )
    }

    /// Moves the cursor one position, or shifts the whole display if `display_shift` is set,
    /// without touching DDRAM.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> LcdResult<()> {
        self.send_command(
            CURSOR_SHIFT
                | flag(display_shift, 0x08)
                | flag(direction == CursorDirection::Right, 0x04),
        )
    }

    /// Sets bus width (`eight_bit`), line count and font.
    ///
    /// Only meaningful right after the reset sequence; the bus width must match what the
    /// implementor actually drives.
    fn function_set(&mut self, eight_bit: bool, two_lines: bool, font: bool) -> LcdResult<()> {
        self.send_command(
            FUNCTION_SET | flag(eight_bit, 0x10) | flag(two_lines, 0x08) | flag(font, 0x04),
        )
    }

    /// Points the following data writes at character generator RAM.
    ///
    /// # Errors
    /// - `LcdError::InvalidArgument` if `address` is above [MAX_CGRAM_ADDRESS]. Nothing is sent.
    fn set_cgram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > MAX_CGRAM_ADDRESS {
            return Err(LcdError::InvalidArgument);
        }
        self.send_command(SET_CGRAM_ADDRESS | address)
    }

    /// Points the following data writes at display RAM, i.e. moves the cursor.
    ///
    /// # Errors
    /// - `LcdError::InvalidArgument` if `address` is above [MAX_DDRAM_ADDRESS]. Nothing is sent.
    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > MAX_DDRAM_ADDRESS {
            return Err(LcdError::InvalidArgument);
        }
        self.send_command(SET_DDRAM_ADDRESS | address)
    }

    /// Writes an instruction byte (RS low).
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Writes a byte to CGRAM or DDRAM, whichever was addressed last (RS high).
    fn send_data(&mut self, data: u8) -> LcdResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    Left,
    Right,
}
