//----------------------------------------------------------------------------------------- std lib
use std::io::Write;
use std::time::Instant;
//--------------------------------------------------------------------------------- other libraries
use env_logger::fmt::style::{AnsiColor, Style};
use log::info;
use once_cell::sync::Lazy;
use tracing_subscriber::{Layer as _, fmt::format::FmtSpan, layer::SubscriberExt as _};

// This will get initialized below.
/// Returns the init [`Instant`]
pub static INIT_INSTANT: Lazy<Instant> = Lazy::new(Instant::now);

/// The filter used when `RUST_LOG` isn't set:
/// disables all library crate logs except for ornitag and its sub-crates.
#[must_use]
#[inline]
pub fn default_filter(filter: log::LevelFilter) -> String {
    format!("off,ornitag={}", filter.as_str().to_ascii_lowercase())
}

//---------------------------------------------------------------------------------------------------- Logger init function
#[allow(clippy::module_name_repetitions)]
/// Initializes the logger.
///
/// This enables console logging on all the internals of `ornitag`.
///
/// Functionality is provided by [`log`].
///
/// The levels are:
/// - ERROR
/// - WARN
/// - INFO
/// - DEBUG
/// - TRACE
///
/// # Panics
/// This must only be called _once_.
#[cfg(not(tarpaulin_include))]
#[inline]
pub fn init_logger(filter: log::LevelFilter) {
    // Initialize timer.
    use crate::format_duration;
    let now = Lazy::force(&INIT_INSTANT);

    let env = std::env::var("RUST_LOG").unwrap_or_default();
    let filters = if env.is_empty() {
        default_filter(filter)
    } else {
        env.clone()
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            let (level, color) = match record.level() {
                log::Level::Debug => ("D", AnsiColor::Blue),
                log::Level::Trace => ("T", AnsiColor::Magenta),
                log::Level::Info => ("I", AnsiColor::White),
                log::Level::Warn => ("W", AnsiColor::Yellow),
                log::Level::Error => ("E", AnsiColor::Red),
            };
            let level_style = Style::new().fg_color(Some(color.into())).bold();
            let dimmed = Style::new().dimmed();
            writeln!(
                buf,
                // Longest PATH in the repo: `core/src/metadata/workbook.rs` - `29` characters
                // Longest file in the repo: `core/src/upload.rs`            - `3` digits
                //
                //      Longest PATH ---|        |--- Longest file
                //                      |        |
                //                      v        v
                "| {level_style}{level}{level_style:#} | {dimmed}{}{dimmed:#} | {dimmed}{: >29} @ {: <3}{dimmed:#} | {}",
                format_duration(&now.elapsed()),
                record.file_static().unwrap_or("???"),
                record.line().unwrap_or(0),
                record.args(),
            )
        })
        .write_style(env_logger::WriteStyle::Auto)
        .parse_filters(&filters)
        .init();

    if env.is_empty() {
        info!("Log Level (Flag) ... {filter}");
    } else {
        info!("Log Level (RUST_LOG) ... {env}");
    }
}

/// Initializes the tracing layer.
///
/// When `spans` is set, span open/close events of ornitag's instrumented functions
/// are written to stderr, which shows how long each upload and album step took.
///
/// # Panics
///
/// panics if the tracing filter cannot be parsed.
#[must_use]
#[inline]
pub fn init_tracing(spans: bool) -> impl tracing::Subscriber {
    let subscriber = tracing_subscriber::registry();

    #[allow(clippy::unwrap_used)]
    let filter = tracing_subscriber::EnvFilter::builder()
        .parse("off,ornitag=trace")
        .unwrap();

    let layer = spans.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(filter)
    });

    subscriber.with(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_str_eq;

    #[test]
    fn test_default_filter() {
        assert_str_eq!(
            default_filter(log::LevelFilter::Debug),
            "off,ornitag=debug"
        );
    }
}
