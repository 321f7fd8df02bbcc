use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::{Map, Value};

use flatdoc::constants::DEFAULT_INDENT;
use flatdoc::csv::{self, CsvConfig, CsvRef};
use flatdoc::{Diagnostic, DiagnosticCollector, ReadConfig, Severity, SourceMap, WriteConfig};

#[derive(Parser, Debug)]
#[command(name = "flatdoc", version, about = "JSON reformatter/validator and CSV to JSON converter")]
struct Args {
    /// Input file path (.json or .csv). Omit or use '-' to read from stdin.
    input: Option<String>,

    /// Output file path (prints to stdout if omitted).
    #[arg(short, long, value_name = "file")]
    output: Option<String>,

    /// Indentation size.
    #[arg(long, value_name = "number", default_value_t = DEFAULT_INDENT, conflicts_with = "compact")]
    indent: usize,

    /// Write compact JSON without any whitespace.
    #[arg(long)]
    compact: bool,

    /// Only validate the input, write nothing.
    #[arg(long)]
    check: bool,

    /// Treat the input as CSV (implied by a .csv extension).
    #[arg(long)]
    csv: bool,

    /// CSV cell separator, a single ASCII character. \t for tab.
    #[arg(long, value_name = "char", default_value = ",", value_parser = parse_separator)]
    separator: u8,

    /// The CSV input has no header line; rows become arrays.
    #[arg(long)]
    no_header: bool,

    /// Fail on warnings too.
    #[arg(long)]
    strict: bool,

    /// Deepest nesting accepted in JSON input.
    #[arg(long, value_name = "number")]
    max_depth: Option<usize>,

    /// How problems are printed to stderr.
    #[arg(long, value_enum, value_name = "format", default_value_t = DiagnosticsFormat::Text)]
    diagnostics: DiagnosticsFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DiagnosticsFormat {
    Text,
    Json,
}

#[derive(Debug)]
enum InputSource {
    Stdin,
    File(String),
}

impl InputSource {
    fn label(&self) -> &str {
        match self {
            InputSource::Stdin => "<stdin>",
            InputSource::File(path) => path,
        }
    }

    fn is_csv(&self) -> bool {
        match self {
            InputSource::Stdin => false,
            InputSource::File(path) => Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv")),
        }
    }
}

#[derive(Serialize)]
struct DiagnosticsReport<'a> {
    input: &'a str,
    diagnostics: &'a [Diagnostic],
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("ERROR  {err}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the input was free of errors.
fn run() -> Result<bool, Box<dyn Error>> {
    let args = Args::parse();
    let (input_text, input_source) = read_input(args.input.as_deref())?;
    log::debug!("read {} bytes from {}", input_text.len(), input_source.label());
    let write_config = if args.compact {
        WriteConfig::compact()
    } else {
        WriteConfig::pretty(args.indent)
    };

    let mut collector = DiagnosticCollector::new();
    let output_target = OutputTarget::from_arg(args.output.as_deref());

    if args.csv || input_source.is_csv() {
        let config = CsvConfig::new()
            .with_separator(args.separator)
            .with_header(!args.no_header);
        let table = csv::read(&input_text, &config, &mut collector);
        report(&args, &input_source, &input_text, collector.diagnostics())?;
        if should_write(&args, &collector) {
            let value = csv_to_value(&table);
            with_output_writer(output_target.path(), |writer| {
                flatdoc::write(writer, &value, &write_config).map_err(|err| err.into())
            })?;
        }
    } else {
        let mut read_config = ReadConfig::default().with_strict(args.strict);
        if let Some(max_depth) = args.max_depth {
            read_config = read_config.with_max_depth(max_depth);
        }
        let document = flatdoc::read_ref_with(&input_text, &read_config, &mut collector);
        document.check_leaves(&mut collector);
        report(&args, &input_source, &input_text, collector.diagnostics())?;
        if should_write(&args, &collector) {
            if let Some(root) = document.root() {
                with_output_writer(output_target.path(), |writer| {
                    flatdoc::write(writer, &root, &write_config).map_err(|err| err.into())
                })?;
            }
        }
    }

    let failed = is_failure(&args, &collector);
    if failed {
        log::debug!("input has errors, nothing written");
    } else if !args.check {
        if let OutputTarget::File(path) = &output_target {
            println!("✔ Formatted {} → {path}", input_source.label());
        }
    }
    Ok(!failed)
}

fn is_failure(args: &Args, collector: &DiagnosticCollector) -> bool {
    collector.has_errors() || (args.strict && collector.warnings().next().is_some())
}

/// A failed input never replaces the output.
fn should_write(args: &Args, collector: &DiagnosticCollector) -> bool {
    !args.check && !is_failure(args, collector)
}

fn read_input(input: Option<&str>) -> Result<(String, InputSource), Box<dyn Error>> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok((buf, InputSource::Stdin))
        }
        Some(path) => {
            let buf = fs::read_to_string(path)?;
            Ok((buf, InputSource::File(path.to_string())))
        }
    }
}

fn parse_separator(raw: &str) -> Result<u8, String> {
    match raw {
        "\\t" | "\t" => Ok(b'\t'),
        _ if raw.len() == 1 && raw.is_ascii() && raw != "\"" && raw != "\n" => Ok(raw.as_bytes()[0]),
        _ => Err(format!(
            "Invalid separator \"{raw}\". Use a single ASCII character other than a quote or line break"
        )),
    }
}

fn csv_to_value(table: &CsvRef<'_>) -> Value {
    let rows = table.rows().map(|row| {
        if table.has_header() {
            let object: Map<String, Value> = table
                .header()
                .iter()
                .zip(row)
                .map(|(name, entry)| (name.clone(), Value::String(entry.get_string())))
                .collect();
            Value::Object(object)
        } else {
            Value::Array(
                row.iter()
                    .map(|entry| Value::String(entry.get_string()))
                    .collect(),
            )
        }
    });
    Value::Array(rows.collect())
}

fn report(
    args: &Args,
    input_source: &InputSource,
    source: &str,
    diagnostics: &[Diagnostic],
) -> Result<(), Box<dyn Error>> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match args.diagnostics {
        DiagnosticsFormat::Json => {
            let report = DiagnosticsReport {
                input: input_source.label(),
                diagnostics,
            };
            serde_json::to_writer(&mut out, &report)?;
            writeln!(out)?;
        }
        DiagnosticsFormat::Text => {
            let map = SourceMap::new(source);
            for diagnostic in diagnostics {
                let marker = match diagnostic.severity {
                    Severity::Error => "✖",
                    Severity::Warning => "⚠",
                };
                writeln!(out, "{marker} {}: {diagnostic}", input_source.label())?;
                for line in map.context(diagnostic.span, 1) {
                    writeln!(out, "  {line}")?;
                }
            }
        }
    }
    Ok(())
}

#[derive(Clone, Debug)]
enum OutputTarget {
    Stdout,
    File(String),
}

impl OutputTarget {
    fn from_arg(output: Option<&str>) -> Self {
        match output {
            Some(path) if path != "-" => OutputTarget::File(path.to_string()),
            _ => OutputTarget::Stdout,
        }
    }

    fn path(&self) -> Option<&str> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::File(path) => Some(path.as_str()),
        }
    }
}

fn with_output_writer<F>(path: Option<&str>, f: F) -> Result<(), Box<dyn Error>>
where
    F: FnOnce(&mut dyn Write) -> Result<(), Box<dyn Error>>,
{
    match path {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            f(&mut file)
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            f(&mut handle)
        }
    }
}
