use core::fmt::{self, Display};
use core::sync::atomic::{AtomicU8, Ordering};

use lazy_static::*;
use spin::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    DEBUG,
    VERBOSE,
    INFO,
    WARNING,
    ERROR,
    FATAL,
}

impl LogLevel {
    fn from_u8(value: u8) -> LogLevel {
        match value {
            0 => LogLevel::DEBUG,
            1 => LogLevel::VERBOSE,
            2 => LogLevel::INFO,
            3 => LogLevel::WARNING,
            4 => LogLevel::ERROR,
            _ => LogLevel::FATAL,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::DEBUG => write!(f, "DEBUG  "),
            LogLevel::VERBOSE => write!(f, "VERBOSE"),
            LogLevel::INFO => write!(f, "INFO   "),
            LogLevel::WARNING => write!(f, "WARNING"),
            LogLevel::ERROR => write!(f, "ERROR  "),
            LogLevel::FATAL => write!(f, "FATAL  "),
        }
    }
}

impl core::str::FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim() {
            l if l.eq_ignore_ascii_case("debug") => LogLevel::DEBUG,
            l if l.eq_ignore_ascii_case("verbose") => LogLevel::VERBOSE,
            l if l.eq_ignore_ascii_case("info") => LogLevel::INFO,
            l if l.eq_ignore_ascii_case("warning") || l.eq_ignore_ascii_case("warn") => {
                LogLevel::WARNING
            }
            l if l.eq_ignore_ascii_case("error") => LogLevel::ERROR,
            l if l.eq_ignore_ascii_case("fatal") => LogLevel::FATAL,
            _ => return Err(()),
        };
        Ok(level)
    }
}

/// Receives every formatted record that passes the level filter. The arguments
/// already carry the `[T:thread][LEVEL]: ` prefix.
pub type LogSink = fn(LogLevel, fmt::Arguments);

lazy_static! {
    static ref SINK: RwLock<Option<LogSink>> = RwLock::new(None);
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::INFO as u8);

/// Routes log records to `sink`. Without a sink, records are dropped.
pub fn set_sink(sink: LogSink) {
    *SINK.write() = Some(sink);
}

pub fn clear_sink() {
    *SINK.write() = None;
}

/// Records below `level` are discarded before formatting.
pub fn set_max_level(level: LogLevel) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn max_level() -> LogLevel {
    LogLevel::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

pub fn enabled(level: LogLevel) -> bool {
    level >= max_level()
}

#[doc(hidden)]
pub fn _print(log_level: LogLevel, args: fmt::Arguments) {
    if !enabled(log_level) {
        return;
    }
    // copy the sink out so it never runs under the lock
    let Some(sink) = *SINK.read() else {
        return;
    };
    match crate::current() {
        Some(thread) => sink(log_level, format_args!("[T:{}][{}]: {}", thread.name(), log_level, args)),
        None => sink(log_level, format_args!("[T:-][{}]: {}", log_level, args)),
    }
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::logging::_print($crate::logging::LogLevel::DEBUG, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        $crate::logging::_print($crate::logging::LogLevel::VERBOSE, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::logging::_print($crate::logging::LogLevel::INFO, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::logging::_print($crate::logging::LogLevel::WARNING, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logging::_print($crate::logging::LogLevel::ERROR, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::logging::_print($crate::logging::LogLevel::FATAL, format_args!($($arg)*));
    };
}

#[cfg(test)]
mod tests {
    use std::string::{String, ToString};
    use std::sync::Mutex;
    use std::vec::Vec;

    use super::*;
    use crate::testing::exclusive_runtime;

    static RECORDS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn collect(_level: LogLevel, args: fmt::Arguments) {
        RECORDS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(args.to_string());
    }

    /// Installs the collecting sink at `level`, runs `body`, and returns what
    /// reached the sink. The default filter and an empty sink are restored.
    fn capture(level: LogLevel, body: impl FnOnce()) -> Vec<String> {
        RECORDS.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clear();
        set_max_level(level);
        set_sink(collect);
        body();
        clear_sink();
        set_max_level(LogLevel::INFO);
        core::mem::take(&mut *RECORDS.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    #[test]
    fn records_below_the_filter_never_reach_the_sink() {
        let (_guard, _boot) = exclusive_runtime();
        let records = capture(LogLevel::INFO, || {
            crate::debug!("dropped {}", 1);
            crate::info!("kept {}", 2);
        });
        assert_eq!(records, ["[T:bootstrap][INFO   ]: kept 2"]);
    }

    #[test]
    fn records_name_the_running_thread() {
        let (_guard, _boot) = exclusive_runtime();
        let records = capture(LogLevel::DEBUG, || {
            crate::spawn("chatty", || loop {
                crate::warn!("from the worker");
                crate::yield_now();
            });
            crate::yield_now();
        });
        assert!(records
            .iter()
            .any(|r| r.starts_with("[T:bootstrap][DEBUG  ]: allocated thread chatty")));
        assert!(records.contains(&"[T:chatty][WARNING]: from the worker".to_string()));
    }

    #[test]
    fn records_before_bootstrap_have_no_thread_name() {
        let (_guard, _boot) = exclusive_runtime();
        crate::thread::scheduler::reset();
        let records = capture(LogLevel::DEBUG, || {
            crate::error!("early");
        });
        assert_eq!(records, ["[T:-][ERROR  ]: early"]);
    }

    #[test]
    fn without_a_sink_nothing_is_recorded() {
        let (_guard, _boot) = exclusive_runtime();
        RECORDS.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clear();
        clear_sink();
        crate::fatal!("nobody listening");
        assert!(RECORDS.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).is_empty());
    }

    #[cfg(feature = "yield-trace")]
    #[test]
    fn yield_trace_logs_both_sides_of_a_switch() {
        let (_guard, _boot) = exclusive_runtime();
        let records = capture(LogLevel::DEBUG, || {
            crate::spawn("traced", || loop {
                crate::yield_now();
            });
            crate::yield_now();
        });
        assert!(records
            .iter()
            .any(|r| r.starts_with("[T:bootstrap][DEBUG  ]: leave for traced")));
        assert!(records
            .iter()
            .any(|r| r.starts_with("[T:traced][DEBUG  ]: leave for bootstrap")));
        assert!(records
            .iter()
            .any(|r| r.starts_with("[T:bootstrap][DEBUG  ]: enter (resumed at sp = ")));
    }

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!("Debug".parse::<LogLevel>(), Ok(LogLevel::DEBUG));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::WARNING));
        assert_eq!(" FATAL ".parse::<LogLevel>(), Ok(LogLevel::FATAL));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn levels_order_from_debug_to_fatal() {
        assert!(LogLevel::DEBUG < LogLevel::VERBOSE);
        assert!(LogLevel::ERROR < LogLevel::FATAL);
        for level in [LogLevel::DEBUG, LogLevel::INFO, LogLevel::FATAL] {
            assert_eq!(LogLevel::from_u8(level as u8), level);
        }
    }
}
