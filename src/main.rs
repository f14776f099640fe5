use std::{env, io::Write, process::ExitCode, sync::LazyLock};

use {
    anyhow::Context,
    jiff::{Timestamp, civil, tz::TimeZone},
};

mod args;
mod cmd;
mod logger;
mod parse;
mod recur;
mod style;
mod task;

static TZ: LazyLock<TimeZone> = LazyLock::new(|| TimeZone::system());

/// The date that Due considers to be today.
///
/// Every occurrence computed is strictly after this date unless a command
/// is given a different date with `-n/--now`.
static TODAY: LazyLock<civil::Date> = LazyLock::new(|| {
    match read_env_due_now() {
        Ok(Some(today)) => {
            log::trace!(
                "setting today to `{today}` from `DUE_NOW` \
                 environment variable",
            );
            today
        }
        Ok(None) => {
            let today = Timestamp::now().to_zoned(TZ.clone()).date();
            log::trace!(
                "`DUE_NOW` environment variable not set, using \
                 current date `{today}`",
            );
            today
        }
        Err(err) => {
            let today = Timestamp::now().to_zoned(TZ.clone()).date();
            log::warn!(
                "reading `DUE_NOW` failed, using current date \
                 `{today}`: {err:#}",
            );
            today
        }
    }
});

/// The exit code used when a next occurrence could not be computed for a
/// well formed rule.
const EXIT_COMPUTATION_FAULT: u8 = 2;

/// Then, as it was, then again it will be.
fn main() -> ExitCode {
    let err = match run() {
        Ok(code) => return code,
        Err(err) => err,
    };
    let root = err.root_cause();
    if root.is::<args::Help>() || root.is::<args::Version>() {
        // If stdout is gone, there's nobody left to tell.
        let _ = writeln!(&mut std::io::stdout(), "{root}");
        return ExitCode::SUCCESS;
    }
    // Look for a broken pipe error. In this case, we generally want
    // to exit "gracefully" with a success exit code. This matches
    // existing Unix convention. We need to handle this explicitly
    // since the Rust runtime doesn't ask for PIPE signals, and thus
    // we get an I/O error instead.
    let mut code = ExitCode::from(1);
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<std::io::Error>() {
            if err.kind() == std::io::ErrorKind::BrokenPipe {
                return ExitCode::from(0);
            }
        }
        // `serde_json` doesn't expose the `std::io::Error` it hit while
        // writing, so broken pipes have to be detected through it.
        if let Some(err) = cause.downcast_ref::<serde_json::Error>() {
            if err.io_error_kind() == Some(std::io::ErrorKind::BrokenPipe) {
                return ExitCode::from(0);
            }
        }
        if let Some(err) = cause.downcast_ref::<recur::Error>() {
            code = match err.kind() {
                recur::ErrorKind::InvalidSpecification => ExitCode::from(1),
                recur::ErrorKind::ComputationFault => {
                    ExitCode::from(EXIT_COMPUTATION_FAULT)
                }
            };
        }
    }
    if std::env::var("RUST_BACKTRACE").map_or(false, |v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        let _ = writeln!(&mut std::io::stderr(), "{:?}", err);
    } else {
        let _ = writeln!(&mut std::io::stderr(), "{:#}", err);
    }
    code
}

fn run() -> anyhow::Result<ExitCode> {
    let duelog = env::var("DUE_LOG").unwrap_or_else(|_| String::new());
    let level = match &*duelog {
        "" | "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        unk => anyhow::bail!("unrecognized log level '{}'", unk),
    };
    log::set_max_level(level);
    // The logger starts out in UTC, since finding the system time zone can
    // itself emit log messages. Once it's known, log timestamps are local.
    let logger = logger::Logger::init()?;
    logger.set_time_zone(TZ.clone());
    cmd::run(&mut lexopt::Parser::from_env())?;
    Ok(ExitCode::SUCCESS)
}

/// Reads today's date from the `DUE_NOW` environment variable.
///
/// The value is either a date in the `YYYYMMDD` format or an RFC 3339
/// timestamp. A timestamp is converted to a date in the system time zone.
fn read_env_due_now() -> anyhow::Result<Option<civil::Date>> {
    let Some(val) = std::env::var_os("DUE_NOW") else { return Ok(None) };
    let Some(val) = val.to_str() else {
        anyhow::bail!(
            "`DUE_NOW` environment variable is not valid UTF-8: {val:?}"
        )
    };
    if let Ok(date) = recur::parse_date(val) {
        return Ok(Some(date));
    }
    let ts = val.parse::<Timestamp>().context(
        "`DUE_NOW` environment variable is neither a `YYYYMMDD` date \
         nor a valid RFC 3339 timestamp",
    )?;
    Ok(Some(ts.to_zoned(TZ.clone()).date()))
}
