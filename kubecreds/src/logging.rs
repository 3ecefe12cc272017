use std::io::{self, IsTerminal};

use anyhow::bail;
use tracing::{level_filters::LevelFilter, Dispatch};

/// Parses a log level name.
///
/// `fatal` and `panic` map to `error`, `disabled` and the empty string turn
/// logging off. Numeric levels follow zerolog numbering (`-1` trace through
/// `5` panic); anything above that turns logging off.
pub fn parse_level(s: &str) -> anyhow::Result<LevelFilter> {
    let level = match s.to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" | "fatal" | "panic" => LevelFilter::ERROR,
        "" | "disabled" => LevelFilter::OFF,
        other => match other.parse::<i8>() {
            Ok(n) => numeric_level(n),
            Err(_) => bail!("invalid log level {s:?}"),
        },
    };
    Ok(level)
}

fn numeric_level(n: i8) -> LevelFilter {
    match n {
        i8::MIN..=-1 => LevelFilter::TRACE,
        0 => LevelFilter::DEBUG,
        1 => LevelFilter::INFO,
        2 => LevelFilter::WARN,
        3..=5 => LevelFilter::ERROR,
        _ => LevelFilter::OFF,
    }
}

/// Logger for one invocation.
///
/// Built once at startup from the `--log-level` flag. Events are only
/// collected inside [`Logging::scope`]; nothing is installed globally.
#[derive(Clone)]
pub struct Logging {
    dispatch: Dispatch,
}

impl Logging {
    pub fn new(level: &str) -> anyhow::Result<Self> {
        let level = parse_level(level)?;
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_target(false)
            .finish();

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }

    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("fatal").unwrap(), LevelFilter::ERROR);
        assert_eq!(parse_level("disabled").unwrap(), LevelFilter::OFF);
        assert_eq!(parse_level("").unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn parses_numeric_levels() {
        assert_eq!(parse_level("-1").unwrap(), LevelFilter::TRACE);
        assert_eq!(parse_level("-7").unwrap(), LevelFilter::TRACE);
        assert_eq!(parse_level("0").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("1").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("2").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("5").unwrap(), LevelFilter::ERROR);
        assert_eq!(parse_level("7").unwrap(), LevelFilter::OFF);
        assert_eq!(parse_level("127").unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn rejects_out_of_range_number() {
        assert!(parse_level("128").is_err());
        assert!(parse_level("-129").is_err());
        assert!(parse_level("1.5").is_err());
    }

    #[test]
    fn rejects_unknown_level() {
        let err = Logging::new("bogus").err().unwrap();
        assert_eq!(err.to_string(), "invalid log level \"bogus\"");
    }

    #[test]
    fn scope_returns_closure_value() {
        let logging = Logging::new("warn").unwrap();
        assert_eq!(logging.scope(|| 7), 7);
    }
}
