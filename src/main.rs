//! Statement Export CLI
//!
//! Reads an ordered transaction extract and writes OFX statement files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- extrato.csv out/extrato.ofx [export.toml]
//! ```
//!
//! Writes `out/extrato_part1.ofx`, `out/extrato_part2.ofx`, ... and prints
//! each written path on stdout.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `info` to control logging verbosity

use log::info;
use statement_export::{
    validate_records, ExportConfig, ExportError, FsSink, RecordReader, Result,
    StatementAssembler,
};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(ExportError::MissingArgument);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let config = match args.get(3) {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };

    let has_headers = config.has_headers;
    let open = || -> Result<RecordReader<BufReader<File>>> {
        let file = File::open(input_path)?;
        Ok(RecordReader::new(BufReader::new(file), has_headers))
    };

    // A bad row or date must leave no files behind, so check the whole
    // input before the streaming pass writes anything.
    let count = validate_records(open()?)?;
    info!("Validated {} records from {}", count, input_path);

    let records = open()?;
    let mut assembler = StatementAssembler::new(config, output_path, FsSink)?;
    let report = assembler.export_stream(records)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for path in &report.written {
        writeln!(handle, "{}", path.display())?;
    }
    for failure in &report.failed {
        eprintln!("Error: {}", failure.error);
    }

    report.into_result().map(|_| ())
}
