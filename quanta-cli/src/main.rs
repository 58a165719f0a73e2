//! Quanta command-line calculator
//!
//! Evaluates quantity expressions given as arguments, or one per line on
//! stdin, and prints the result in text or JSON form.
//!
//! Environment:
//! - QUANTA_SYSTEM: default unit system (SI, US, ESU, EMU)
//! - QUANTA_PRECISION: significant digits in text output
//! - RUST_LOG: log filter directives for stderr (default warn)

use clap::{Parser, ValueEnum};
use quanta_core::format::DEFAULT_PRECISION;
use quanta_core::UnitError;
use quanta_units::{lists, Calculator, Dformat, Quantity, SystemType};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "quanta")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Evaluate physical quantity expressions such as '3 km/h + 2 m/s'",
    long_about = "Evaluate physical quantity expressions such as '3 km/h + 2 m/s'.\n\nWithout EXPRESSION, reads one expression per line from stdin."
)]
struct Cli {
    /// Expressions to evaluate
    #[arg(value_name = "EXPRESSION", allow_negative_numbers = true)]
    expressions: Vec<String>,

    /// Convert the result to UNIT (empty for base units)
    #[arg(long, value_name = "UNIT")]
    to: Option<String>,

    /// Unit system: SI, US, ESU, EMU
    #[arg(long, value_name = "SYS", env = "QUANTA_SYSTEM", value_parser = parse_system)]
    system: Option<SystemType>,

    /// Quantity kind used as conversion context (e.g. B)
    #[arg(long)]
    kind: Option<String>,

    /// Express in MKS, MGS, CGS or FPS base units
    #[arg(long, value_name = "FMT", value_parser = parse_format)]
    format: Option<Dformat>,

    /// Significant digits in text output
    #[arg(long, value_name = "N", env = "QUANTA_PRECISION", default_value_t = DEFAULT_PRECISION, value_parser = parse_precision)]
    precision: usize,

    /// Merge units sharing a base or a dimension
    #[arg(long, value_enum)]
    rebase: Option<Rebase>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Print a catalog instead of evaluating
    #[arg(long, value_enum, value_name = "CATALOG")]
    list: Option<Catalog>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Rebase {
    /// Combine units with a common base unit
    Prefixes,
    /// Combine units with a common dimension
    Dimensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Catalog {
    Prefixes,
    Base,
    Derived,
    Logarithmic,
    Temperature,
    Constants,
    Quantities,
    Systems,
}

impl Catalog {
    fn render(self) -> String {
        match self {
            Catalog::Prefixes => lists::prefixes(),
            Catalog::Base => lists::base_units(),
            Catalog::Derived => lists::derived_units(),
            Catalog::Logarithmic => lists::logarithmic_units(),
            Catalog::Temperature => lists::temperature_units(),
            Catalog::Constants => lists::constants(),
            Catalog::Quantities => lists::quantities(),
            Catalog::Systems => lists::unit_systems(),
        }
    }
}

fn parse_system(s: &str) -> Result<SystemType, String> {
    s.parse().map_err(|e: UnitError| e.to_string())
}

fn parse_format(s: &str) -> Result<Dformat, String> {
    s.parse().map_err(|e: UnitError| e.to_string())
}

fn parse_precision(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(n) if (1..=17).contains(&n) => Ok(n),
        _ => Err(format!("invalid precision '{}' (expected 1..=17)", s)),
    }
}

/// Solve one expression and apply the requested transformations
fn evaluate(expr: &str, opts: &Cli) -> quanta_core::Result<Quantity> {
    let calculator = match opts.system {
        Some(system) => Calculator::new().with_system(system),
        None => Calculator::new(),
    };
    let mut quantity = calculator.solve(expr)?;

    quantity = match opts.rebase {
        Some(Rebase::Prefixes) => quantity.rebase_prefixes()?,
        Some(Rebase::Dimensions) => quantity.rebase_dimensions()?,
        None => quantity,
    };

    if let Some(format) = opts.format {
        quantity = match opts.system {
            Some(system) => quantity.convert_format_in(format, system)?,
            None => quantity.convert_format(format)?,
        };
    }

    if opts.to.is_some() || opts.kind.is_some() {
        let target = opts.to.as_deref().unwrap_or("");
        let system = opts.system.unwrap_or_else(|| quantity.unit_system());
        quantity = match &opts.kind {
            Some(kind) => quantity.convert_kind(target, system, kind)?,
            None => quantity.convert_in(target, system)?,
        };
    }

    Ok(quantity)
}

#[derive(Serialize)]
struct ErrorReport {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'static str>,
}

impl From<&UnitError> for ErrorReport {
    fn from(err: &UnitError) -> Self {
        ErrorReport {
            code: err.code(),
            message: err.to_string(),
            suggestion: err.suggestion(),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Evaluation<'a> {
    Solved {
        expression: &'a str,
        result: String,
        #[serde(flatten)]
        quantity: &'a Quantity,
    },
    Failed {
        expression: &'a str,
        error: ErrorReport,
    },
}

/// Render one outcome as a line of output
fn report(expr: &str, outcome: &quanta_core::Result<Quantity>, opts: &Cli) -> String {
    if opts.json {
        let evaluation = match outcome {
            Ok(quantity) => Evaluation::Solved {
                expression: expr,
                result: quantity.render(opts.precision),
                quantity,
            },
            Err(err) => Evaluation::Failed {
                expression: expr,
                error: err.into(),
            },
        };
        return serde_json::to_string(&evaluation)
            .unwrap_or_else(|e| format!("{{\"expression\":{:?},\"error\":{{\"message\":{:?}}}}}", expr, e.to_string()));
    }
    match outcome {
        Ok(quantity) => quantity.render(opts.precision),
        Err(err) => match err.suggestion() {
            Some(hint) => format!("error [{}]: {} ({})", err.code(), err, hint),
            None => format!("error [{}]: {}", err.code(), err),
        },
    }
}

/// `RUST_LOG` directives, or `warn` when unset or malformed
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn init_logging() {
    let filter = log_filter(std::env::var("RUST_LOG").ok());
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(opts: &Cli) -> io::Result<bool> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(catalog) = opts.list {
        write!(out, "{}", catalog.render())?;
        return Ok(true);
    }

    let mut all_ok = true;
    let mut handle = |expr: &str, out: &mut dyn Write| -> io::Result<()> {
        let outcome = evaluate(expr, opts);
        if let Err(err) = &outcome {
            debug!(expression = expr, code = err.code(), "evaluation failed");
            all_ok = false;
        }
        writeln!(out, "{}", report(expr, &outcome, opts))
    };

    if opts.expressions.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            let expr = line.trim();
            if expr.is_empty() || expr.starts_with('#') {
                continue;
            }
            handle(expr, &mut out)?;
        }
    } else {
        for expr in &opts.expressions {
            handle(expr, &mut out)?;
        }
    }

    Ok(all_ok)
}

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            warn!(error = %err, "i/o failure");
            eprintln!("quanta: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn options(list: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("quanta").chain(list.iter().copied())).unwrap()
    }

    fn parse_error(list: &[&str]) -> ErrorKind {
        Cli::try_parse_from(std::iter::once("quanta").chain(list.iter().copied()))
            .unwrap_err()
            .kind()
    }

    #[test]
    fn test_parse_options() {
        let opts = options(&["--to", "m", "--system", "us", "--precision", "4", "23 km"]);
        assert_eq!(opts.to.as_deref(), Some("m"));
        assert_eq!(opts.system, Some(SystemType::US));
        assert_eq!(opts.precision, 4);
        assert_eq!(opts.expressions, vec!["23 km".to_string()]);

        let opts = options(&["--format", "CGS", "--rebase", "prefixes", "--json", "J"]);
        assert_eq!(opts.format, Some(Dformat::CGS));
        assert_eq!(opts.rebase, Some(Rebase::Prefixes));
        assert!(opts.json);

        let opts = options(&["--list", "quantities"]);
        assert_eq!(opts.list, Some(Catalog::Quantities));
        assert!(opts.expressions.is_empty());
    }

    #[test]
    fn test_parse_help_and_errors() {
        assert_eq!(parse_error(&["--help"]), ErrorKind::DisplayHelp);
        assert_eq!(parse_error(&["-V"]), ErrorKind::DisplayVersion);
        assert_eq!(parse_error(&["--to"]), ErrorKind::InvalidValue);
        assert_eq!(parse_error(&["--bogus"]), ErrorKind::UnknownArgument);
        assert_eq!(parse_error(&["--precision", "0"]), ErrorKind::ValueValidation);
        assert_eq!(parse_error(&["--system", "MKS"]), ErrorKind::ValueValidation);
        assert_eq!(parse_error(&["--rebase", "sideways"]), ErrorKind::InvalidValue);
        assert_eq!(parse_error(&["--list", "nope"]), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_env_defaults() {
        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(|name| name.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("system").as_deref(), Some("QUANTA_SYSTEM"));
        assert_eq!(env_of("precision").as_deref(), Some("QUANTA_PRECISION"));
        assert_eq!(env_of("to"), None);
        command.debug_assert();
    }

    #[test]
    fn test_log_filter_directives() {
        assert_eq!(log_filter(None).to_string(), "warn");
        let filter = log_filter(Some("quanta_units=debug".to_string()));
        assert_eq!(filter.to_string(), "quanta_units=debug");
        assert_eq!(log_filter(Some("quanta_units=[".to_string())).to_string(), "warn");
    }

    #[test]
    fn test_evaluate_conversions() {
        let opts = options(&["--to", "m"]);
        assert_eq!(evaluate("23 km", &opts).unwrap().to_string(), "23000*m");

        let opts = options(&["--to", "statA", "--system", "ESU", "--kind", "I"]);
        assert_eq!(evaluate("SI_23 A", &opts).unwrap().to_string(), "6.89523e+10*statA");

        let opts = options(&["--format", "MGS"]);
        assert_eq!(evaluate("23 J", &opts).unwrap().to_string(), "23000*m2*g*s-2");

        let opts = options(&["--rebase", "dimensions"]);
        assert_eq!(evaluate("23*km*au2*s2/h", &opts).unwrap().to_string(), "1.4298e+14*km3*s");
    }

    #[test]
    fn test_report_text_and_json() {
        let opts = options(&[]);
        let ok = evaluate("34*km + 25*m", &opts);
        assert_eq!(report("34*km + 25*m", &ok, &opts), "34.025*km");

        let failed = evaluate("3 m + 2 s", &opts);
        assert!(report("3 m + 2 s", &failed, &opts).starts_with("error ["));

        let opts = options(&["--json"]);
        let json: serde_json::Value = serde_json::from_str(&report("34*km + 25*m", &ok, &opts)).unwrap();
        assert_eq!(json["result"], "34.025*km");
        assert_eq!(json["units"], "km");
        assert_eq!(json["system"], "SI");

        let json: serde_json::Value = serde_json::from_str(&report("3 m + 2 s", &failed, &opts)).unwrap();
        assert_eq!(json["error"]["code"], failed.unwrap_err().code());
    }

    #[test]
    fn test_catalog_names() {
        for catalog in Catalog::value_variants() {
            assert!(catalog.render().lines().count() > 2, "empty catalog {catalog:?}");
        }
    }
}
