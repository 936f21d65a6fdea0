//! Volume logging facility
//!
//! Routes records from the `log` facade to a sink chosen by the embedder.
//! Records are formatted as `[LEVEL] message`, one per line. Until `init` runs
//! nothing is installed and every record is dropped by the facade.

use alloc::boxed::Box;
use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

#[doc(hidden)]
pub use log;

/// Destination for formatted log lines
pub type Sink = Box<dyn Write + Send>;

/// Global logger instance shared by every mounted volume
pub static LOGGER: Logger = Logger::new();

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Thread-safe logger writing to a replaceable sink
pub struct Logger {
    sink: Mutex<Option<Sink>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Creates a logger with no sink attached
    pub const fn new() -> Logger {
        Logger {
            sink: Mutex::new(None),
        }
    }

    /// Swaps the output sink, returning the previous one
    pub fn set_sink(&self, sink: Sink) -> Option<Sink> {
        self.sink.lock().replace(sink)
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    /// Formats messages as "[LEVEL] message"
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = self.sink.lock().as_mut() {
            // a failing sink has nowhere to report to
            let _ = writeln!(sink, "[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Level used when the embedder has no preference:
/// `Debug` in debug builds, `Info` in release builds
pub fn default_level() -> LevelFilter {
    #[cfg(debug_assertions)]
    {
        LevelFilter::Debug
    }
    #[cfg(not(debug_assertions))]
    {
        LevelFilter::Info
    }
}

/// Installs `LOGGER` as the global logger writing to `sink`
///
/// Calling it again swaps the sink and level. The error only reports that some
/// other logger already owns the facade.
pub fn init(sink: Sink, level: LevelFilter) -> Result<(), SetLoggerError> {
    LOGGER.set_sink(sink);
    log::set_max_level(level);
    if INSTALLED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
    {
        log::set_logger(&LOGGER).inspect_err(|_| INSTALLED.store(false, Ordering::Release))?;
    }
    Ok(())
}

/// Convenience macro for trace-level logging
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => ($crate::logging::log::trace!($($arg)*));
}

/// Convenience macro for debug-level logging
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => ($crate::logging::log::debug!($($arg)*));
}

/// Convenience macro for info-level logging
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => ($crate::logging::log::info!($($arg)*));
}

/// Convenience macro for warning-level logging
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ($crate::logging::log::warn!($($arg)*));
}

/// Convenience macro for error-level logging
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ($crate::logging::log::error!($($arg)*));
}
