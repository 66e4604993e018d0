//! Log infrastructure.
//!
//! The usual five macros apply, with the following conventions:
//!
//! 1. `error!` marks unexpected conditions, e.g. an operation failing in a
//!    way user code cannot trigger.
//! 2. `warn!` marks potentially problematic situations, e.g. a task that
//!    panicked and was turned into a process exit.
//! 3. `info!` shows important lifecycle events: a process or thread being
//!    created or exiting, the kernel halting.
//! 4. `debug!` tracks the high-level arguments of syscalls.
//! 5. `trace!` records the most detailed bookkeeping, e.g. stream handles
//!    closing.
//!
//! Logging is off until `init` is called; tests typically leave it off.

use log::{LevelFilter, Log, Metadata, Record};

pub use log::max_level;

/// Initialize the log infrastructure with the given log level.
///
/// May be called more than once; only the first call installs the logger,
/// every call adjusts the level.
pub fn init(level: LevelFilter) {
    static LOGGER: SimpleLogger = SimpleLogger;
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// A simple logger that tags messages with the calling kernel thread.
struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            match crate::process::current::try_get() {
                Some(thread) => eprintln!(
                    "[{:>5}][T{}] {}",
                    record.level(),
                    thread.tid(),
                    record.args()
                ),
                None => eprintln!("[{:>5}] {}", record.level(), record.args()),
            }
        }
    }

    fn flush(&self) {}
}
