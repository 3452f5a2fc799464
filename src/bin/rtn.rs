//! Richtable CLI - normalize HTML tables

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use log::info;
#[cfg(feature = "cli")]
use richtable::{
    diagnostics::{check_document, format_diagnostics},
    normalize_document, parse_tables, serialize, NormalizeOptions, TableError, TableResult,
};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "rtn")]
#[command(version)]
#[command(about = "Richtable - normalize and repair HTML tables", long_about = None)]
struct Cli {
    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Check mode - report structural issues without normalizing
    #[arg(long)]
    check: bool,

    /// Disable colored output (for check mode)
    #[arg(long)]
    no_color: bool,

    /// Dump the normalized tree as JSON instead of markup
    #[arg(long)]
    json: bool,

    /// Prefix of generated header ids
    #[arg(long, default_value = richtable::data::DEFAULT_ID_PREFIX)]
    id_prefix: String,

    /// Do not right-align numeric cells
    #[arg(long)]
    no_numeric_align: bool,

    /// Maximum repair cycles per table (derived from table size by default)
    #[arg(long)]
    max_cycles: Option<usize>,
}

#[cfg(feature = "cli")]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {}", err);
            let code = match err {
                TableError::Parse { .. } | TableError::InvalidInput { .. } => 2,
                TableError::Io { .. } | TableError::Internal { .. } => 3,
            };
            std::process::exit(code);
        }
    }
}

/// Run one invocation, returning the exit code
#[cfg(feature = "cli")]
fn run(cli: &Cli) -> TableResult<i32> {
    let input = match cli.input_file {
        Some(ref path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let mut doc = parse_tables(&input)?;

    if cli.check {
        let result = check_document(&doc);
        println!("{}", format_diagnostics(&result, !cli.no_color));
        return Ok(if result.has_errors() { 1 } else { 0 });
    }

    let mut opts = NormalizeOptions::new()
        .with_id_prefix(cli.id_prefix.as_str())
        .with_numeric_align(!cli.no_numeric_align);
    if let Some(max) = cli.max_cycles {
        opts = opts.with_max_cycles(max);
    }

    let reports = normalize_document(&mut doc, &opts);
    let repairs: usize = reports.iter().map(|report| report.repairs.len()).sum();
    info!(
        "normalized {} table(s) with {} repair(s)",
        reports.len(),
        repairs
    );
    for report in reports.iter().filter(|report| !report.stable) {
        eprintln!(
            "warning: table {:?} did not stabilize after {} cycles",
            report.table, report.cycles
        );
    }

    let result = if cli.json {
        render_json(&doc)?
    } else {
        serialize(&doc)
    };

    match cli.output {
        Some(ref path) => {
            fs::write(path, &result)?;
            info!("output written to {}", path);
        }
        None => println!("{}", result),
    }

    Ok(0)
}

#[cfg(all(feature = "cli", feature = "serde"))]
fn render_json(doc: &richtable::Document) -> TableResult<String> {
    let tree = doc.snapshot(doc.root());
    serde_json::to_string_pretty(&tree).map_err(|err| TableError::internal(err.to_string()))
}

#[cfg(all(feature = "cli", not(feature = "serde")))]
fn render_json(_doc: &richtable::Document) -> TableResult<String> {
    Err(TableError::invalid(
        "JSON output requires the `serde` feature",
    ))
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
}
