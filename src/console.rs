//! Print macros and `log` backend over the SBI debug console.

use core::fmt::{self, Write};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use sbi_rt::Physical;

/// Writer for print macro.
struct Writer;
impl core::fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        sbi_rt::console_write(Physical::new(
            s.len(),
            s.as_ptr() as usize & 0xffff_ffff,
            (s.as_ptr() as usize >> 32) & 0xffff_ffff,
        ));
        Ok(())
    }
}

/// Print function calling from print macro
pub fn print_for_macro(args: fmt::Arguments) {
    let mut writer = Writer;
    // the SBI console never reports an error
    let _ = writer.write_fmt(args);
}

/// Print to standard output.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::console::print_for_macro(format_args!($($arg)*)));
}

/// Print with linebreak to standard output.
#[macro_export]
macro_rules! println {
    ($fmt:expr) => ($crate::print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::print!(concat!($fmt, "\n"), $($arg)*));
}

/// `log` records to the debug console.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            crate::println!("[{:>5}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the console as `log` backend.
///
/// # Errors
/// Fails if a logger is already installed.
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
