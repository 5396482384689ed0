//! Default logging setup for keyset binaries and tests
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::{sync::Mutex, time::Instant};

const TIMESTAMP_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightBlack)));

const TARGET_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Magenta)));

/// Environment variable holding the log filter, e.g. `KEYSET_LOG=keyset_graph=trace`.
pub const FILTER_ENV: &str = "KEYSET_LOG";

/// Environment variable controlling colored output (`auto`, `always` or `never`).
pub const STYLE_ENV: &str = "KEYSET_LOG_STYLE";

fn builder(default_filter: &str) -> env_logger::Builder {
    let start_time = Instant::now();
    let last_target = Mutex::new(String::new());

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or(FILTER_ENV, default_filter)
            .write_style(STYLE_ENV),
    );

    builder.format(move |buf, record| {
        use std::io::Write;

        let timestamp = start_time.elapsed();
        let level = record.level();
        let target = record.target();

        let mut last_target = last_target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if target != *last_target {
            last_target.clear();
            last_target.push_str(target);

            writeln!(
                buf,
                "{} {}",
                format_args!("{style}{timestamp:>9.2?}{style:#}", style = TIMESTAMP_STYLE),
                format_args!("{style}{target}{style:#}", style = TARGET_STYLE)
            )?;
        }
        writeln!(
            buf,
            "{} {} {}",
            format_args!("{style}{timestamp:>9.2?}{style:#}", style = TIMESTAMP_STYLE),
            format_args!(
                "{style}{level:<5}{style:#}",
                style = buf.default_level_style(level),
            ),
            record.args(),
        )
    });

    builder
}

/// Perform the default logging setup used by keyset binaries.
///
/// Logs at `info` unless [`FILTER_ENV`] says otherwise.
///
/// # Panics
///
/// Panics if a global logger was already installed.
pub fn setup() {
    builder("info").init();
}

/// Installs the default logger for use from tests.
///
/// Output goes through the test harness capture, the default filter is `warn`, and repeated calls
/// (one per test) are ignored.
pub fn try_setup_for_tests() {
    let _ = builder("warn").is_test(true).try_init();
}
