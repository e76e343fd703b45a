//! A `log` backend that routes each level to its own destination.
//!
//! By default warnings and errors go to stderr and everything else to stdout.
//! The `grouped-cursor` binary sends every level to stderr so that reports
//! written to stdout stay clean.

use std::io::{self, Write};
use std::sync::Mutex;

use log::{Level, Log, Metadata, Record};

/// The default log level to use if no other is specified
const DEFAULT_LOG_LEVEL: Level = Level::Warn;

/// Return a default writer for a given level. In this case stderr for warn
/// and error and stdout for all others.
fn default_log_dest_for_level(level: Level) -> LogDestination {
    match level {
        Level::Error | Level::Warn => LogDestination::from(io::stderr()),
        Level::Info | Level::Debug | Level::Trace => LogDestination::from(io::stdout()),
    }
}

/// LogDestinationWriter represents a Boxed dynamic trait object for Writing
/// logs to. This will exclusively be exposed behind a [Mutex] and assigned to
/// an owning [Logger].
type LogDestinationWriter = Box<dyn Write + Send + Sync>;

struct LogDestination {
    dest: Mutex<LogDestinationWriter>,
}

impl LogDestination {
    fn lock(&self) -> std::sync::LockResult<std::sync::MutexGuard<'_, LogDestinationWriter>> {
        self.dest.lock()
    }
}

impl<W> From<W> for LogDestination
where
    W: Write + Send + Sync + Sized + 'static,
{
    fn from(writer: W) -> Self {
        let dest = {
            let boxed_dest = Box::new(writer) as LogDestinationWriter;

            Mutex::new(boxed_dest)
        };

        LogDestination { dest }
    }
}

/// Configures and installs the level-routed logger.
pub struct LoggerBuilder {
    logger: Logger,
}

impl LoggerBuilder {
    // A mirror of the module level default rescoped to a static logger constant.
    const DEFAULT_LOG_LEVEL: Level = DEFAULT_LOG_LEVEL;

    /// Log records at `level` and more severe.
    pub fn level(mut self, level: Level) -> Self {
        self.logger.level = level;
        self
    }

    /// Raise the level above the default warn by `verbosity` steps, so 1 is
    /// info, 2 is debug, and 3 or more is trace.
    pub fn verbosity(self, verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Self::DEFAULT_LOG_LEVEL,
            1 => Level::Info,
            2 => Level::Debug,
            _ => Level::Trace,
        };

        self.level(level)
    }

    /// Send records of `level` to `writer`.
    pub fn output<W>(mut self, level: Level, writer: W) -> Self
    where
        W: Write + Send + Sync + 'static,
    {
        *self.logger.as_logdestination_from_level_mut(level) = LogDestination::from(writer);
        self
    }

    /// Install as the global logger.
    pub fn init(self) -> Result<(), String> {
        let max_level = self.logger.level.to_level_filter();
        let boxed_logger = Box::new(self.logger);

        log::set_boxed_logger(boxed_logger).map_err(|e| e.to_string())?;
        log::set_max_level(max_level);

        Ok(())
    }

    #[cfg(test)]
    fn build(self) -> Logger {
        self.logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        let logger = Logger {
            level: Self::DEFAULT_LOG_LEVEL,
            error: default_log_dest_for_level(Level::Error),
            warn: default_log_dest_for_level(Level::Warn),
            info: default_log_dest_for_level(Level::Info),
            debug: default_log_dest_for_level(Level::Debug),
            trace: default_log_dest_for_level(Level::Trace),
        };

        LoggerBuilder { logger }
    }
}

/// A generic logger type that allows an arbitrary destination for each level.
struct Logger {
    level: Level,
    error: LogDestination,
    warn: LogDestination,
    info: LogDestination,
    debug: LogDestination,
    trace: LogDestination,
}

impl Logger {
    fn as_logdestination_from_level(&self, level: Level) -> &LogDestination {
        match level {
            Level::Error => &self.error,
            Level::Warn => &self.warn,
            Level::Info => &self.info,
            Level::Debug => &self.debug,
            Level::Trace => &self.trace,
        }
    }

    fn as_logdestination_from_level_mut(&mut self, level: Level) -> &mut LogDestination {
        match level {
            Level::Error => &mut self.error,
            Level::Warn => &mut self.warn,
            Level::Info => &mut self.info,
            Level::Debug => &mut self.debug,
            Level::Trace => &mut self.trace,
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // More severe levels compare lower.
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let record_level = record.level();
        let level_oriented_log_destination = self.as_logdestination_from_level(record_level);

        if let Ok(mut log_writer) = level_oriented_log_destination.lock() {
            let _ = writeln!(
                log_writer,
                "{}:{} -- {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        for level in [
            Level::Error,
            Level::Warn,
            Level::Info,
            Level::Debug,
            Level::Trace,
        ] {
            if let Ok(mut log_writer) = self.as_logdestination_from_level(level).lock() {
                let _ = log_writer.flush();
            }
        }
    }
}
