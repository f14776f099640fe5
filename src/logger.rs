// A tiny logger for the `log` crate. Records go to stderr, one per line, as
// `timestamp|LEVEL|file:line: message`. Filtering is left entirely to the
// global max level set in `main`.

use std::{
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex},
};

use {jiff::tz::TimeZone, log::Log};

use crate::style::Theme;

/// A logger that writes every record it is given to stderr.
#[derive(Debug)]
pub struct Logger {
    tz: Mutex<Option<TimeZone>>,
}

impl Logger {
    /// Create a new logger and install it as the global logger.
    ///
    /// This fails if a global logger was already installed.
    pub fn init() -> Result<&'static Logger, log::SetLoggerError> {
        let logger = Box::leak(Box::new(Logger { tz: Mutex::new(None) }));
        log::set_logger(logger)?;
        Ok(logger)
    }

    /// Render log timestamps in the given time zone instead of UTC.
    pub fn set_time_zone(&self, tz: TimeZone) {
        // A poisoned lock only means another thread panicked while logging.
        let mut logger_tz =
            self.tz.lock().unwrap_or_else(|poison| poison.into_inner());
        *logger_tz = Some(tz);
    }

    fn now(&self) -> String {
        // `Zoned::now()` might look up the system time zone, which can log,
        // which would recurse back into here. So only use the time zone that
        // was explicitly set.
        let ts = jiff::Timestamp::now();
        let tz = self
            .tz
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone();
        match tz {
            Some(tz) => ts.to_zoned(tz).to_string(),
            None => ts.to_string(),
        }
    }
}

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        let theme = Theme::stderr();
        let now = theme.timestamp(self.now());
        let level = theme.level(record.level());
        match (record.file(), record.line()) {
            (Some(file), Some(line)) => {
                eprintln!(
                    "{now}|{level}|{file}:{line}: {message}",
                    file = relative(file),
                    message = record.args(),
                );
            }
            (Some(file), None) => {
                eprintln!(
                    "{now}|{level}|{file}: {message}",
                    file = relative(file),
                    message = record.args(),
                );
            }
            _ => {
                eprintln!("{now}|{level}: {}", record.args());
            }
        }
    }

    fn flush(&self) {
        // `eprintln!` is unbuffered.
    }
}

fn relative<'p>(path: &'p str) -> &'p str {
    let Some(cwd) = cwd() else { return path };
    let Ok(relative) = Path::new(path).strip_prefix(cwd) else { return path };
    let Some(relative) = relative.to_str() else { return path };
    relative
}

fn cwd() -> Option<&'static Path> {
    static CWD: LazyLock<Option<PathBuf>> =
        LazyLock::new(|| std::env::current_dir().ok());
    CWD.as_deref()
}
