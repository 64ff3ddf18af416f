// File: crates/demo/src/cli.rs
// Summary: Command-line parsing for the demo binary.

use std::path::PathBuf;

use sextant_core::Period;

/// Where market data comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Source {
    /// The analytics service named in the config.
    #[default]
    Remote,
    /// A saved `/api/stock` response.
    Offline(PathBuf),
    /// Plain OHLC rows; price and volume panels only.
    Csv(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub source: Source,
    pub forecast: Option<PathBuf>,
    pub out: PathBuf,
    pub symbol: String,
    pub period: Period,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Args),
    Help,
    Version,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: i32,
    pub message: String,
}

impl ParseError {
    fn usage(message: impl Into<String>) -> Self {
        Self { code: 2, message: format!("{}\n\n{}", message.into(), help_text("sextant-demo")) }
    }
}

#[must_use]
pub fn help_text(bin_name: &str) -> String {
    format!(
        "Sextant dashboard renderer\n\n\
         Usage:\n  {bin_name} [options] SYMBOL [PERIOD]\n\n\
         PERIOD is one of 1mo, 3mo, 6mo, 1y, 2y, 5y (default 6mo).\n\n\
         Options:\n\
         \x20 -c, --config PATH      configuration file (default: ./sextant.toml)\n\
         \x20     --offline PATH     render a saved market payload instead of calling the service\n\
         \x20     --csv PATH         render OHLC rows from a CSV file (price and volume panels)\n\
         \x20     --forecast PATH    saved forecast payload for offline runs\n\
         \x20 -o, --out DIR          output directory (default: target/out)\n\
         \x20 -h, --help             show this help\n\
         \x20 -V, --version          show version\n"
    )
}

#[must_use]
pub fn version_text() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

pub fn parse_args<I, S>(args: I) -> Result<Command, ParseError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut config = None;
    let mut source = Source::Remote;
    let mut forecast = None;
    let mut out = PathBuf::from("target/out");
    let mut positional = Vec::new();

    let mut iter = args.into_iter().map(Into::into);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().ok_or_else(|| ParseError::usage(format!("{flag} needs a value")));
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "-c" | "--config" => config = Some(PathBuf::from(value(&arg)?)),
            "-o" | "--out" => out = PathBuf::from(value(&arg)?),
            "--forecast" => forecast = Some(PathBuf::from(value(&arg)?)),
            "--offline" | "--csv" => {
                if source != Source::Remote {
                    return Err(ParseError::usage("--offline and --csv are mutually exclusive"));
                }
                let path = PathBuf::from(value(&arg)?);
                source = if arg == "--csv" { Source::Csv(path) } else { Source::Offline(path) };
            }
            _ if arg.starts_with('-') => return Err(ParseError::usage(format!("unknown option: {arg}"))),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(symbol) = positional.next() else {
        return Err(ParseError::usage("missing SYMBOL"));
    };
    let period = match positional.next() {
        Some(raw) => Period::parse(&raw).ok_or_else(|| ParseError::usage(format!("unknown period: {raw}")))?,
        None => Period::SixMonths,
    };
    if let Some(extra) = positional.next() {
        return Err(ParseError::usage(format!("unexpected argument: {extra}")));
    }
    if forecast.is_some() && source == Source::Remote {
        return Err(ParseError::usage("--forecast only applies to --offline runs"));
    }

    Ok(Command::Run(Args { config, source, forecast, out, symbol: symbol.trim().to_ascii_uppercase(), period }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Args {
        match parse_args(args.iter().copied()) {
            Ok(Command::Run(a)) => a,
            other => panic!("expected run command, got {other:?}"),
        }
    }

    #[test]
    fn symbol_and_default_period() {
        let a = run(&["aapl"]);
        assert_eq!(a.symbol, "AAPL");
        assert_eq!(a.period, Period::SixMonths);
        assert_eq!(a.source, Source::Remote);
        assert_eq!(a.out, PathBuf::from("target/out"));
    }

    #[test]
    fn offline_with_forecast_and_period() {
        let a = run(&["--offline", "p.json", "--forecast", "f.json", "-o", "shots", "MSFT", "1y"]);
        assert_eq!(a.source, Source::Offline("p.json".into()));
        assert_eq!(a.forecast, Some("f.json".into()));
        assert_eq!(a.out, PathBuf::from("shots"));
        assert_eq!(a.period, Period::OneYear);
    }

    #[test]
    fn help_and_version() {
        assert_eq!(parse_args(["--help"]), Ok(Command::Help));
        assert_eq!(parse_args(["-V", "AAPL"]), Ok(Command::Version));
    }

    #[test]
    fn usage_errors() {
        for args in [
            vec![],
            vec!["--bogus", "AAPL"],
            vec!["AAPL", "7d"],
            vec!["AAPL", "1y", "extra"],
            vec!["--csv", "a.csv", "--offline", "b.json", "AAPL"],
            vec!["--forecast", "f.json", "AAPL"],
            vec!["AAPL", "--out"],
        ] {
            let err = parse_args(args.clone()).expect_err("expected usage error");
            assert_eq!(err.code, 2, "{args:?}");
        }
    }
}
