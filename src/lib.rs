//! # Statement Export
//!
//! Converts an ordered list of bank transactions into one or more OFX
//! statement files of bounded size.
//!
//! ## Design Principles
//!
//! - **Fixed-point money**: two decimal places via `rust_decimal`, `.` separator
//! - **Bounded documents**: at most `max_group_size` entries per file
//! - **Authoritative balances**: running balances are read, never recomputed
//! - **Fail fast on dates**: a malformed date aborts before any file is written
//! - **Isolated writes**: one failed file does not stop the others
//!
//! ## Example
//!
//! ```no_run
//! use statement_export::{read_records, ExportConfig, FsSink, StatementAssembler};
//! use std::fs::File;
//!
//! let config = ExportConfig::default();
//! let records = read_records(File::open("extrato.csv").unwrap(), config.has_headers).unwrap();
//! let mut assembler = StatementAssembler::new(config, "extrato.ofx", FsSink).unwrap();
//! let report = assembler.export(&records).unwrap();
//! println!("{:?}", report.written);
//! ```

pub mod assembler;
pub mod balance;
pub mod charset;
pub mod chunk;
pub mod config;
pub mod date;
pub mod decimal;
pub mod document;
pub mod error;
pub mod transaction;

pub use assembler::{
    part_path, validate_records, DocumentSink, ExportReport, FsSink, GroupFailure, MemorySink,
    StatementAssembler,
};
pub use balance::StatementPeriod;
pub use charset::Charset;
pub use chunk::{chunk, ExportGroup, DEFAULT_MAX_GROUP_SIZE};
pub use config::{EmptyInputPolicy, EnvelopeConfig, ExportConfig, ReferenceNumbering};
pub use date::{normalize, DateShape, Timestamp};
pub use decimal::Decimal2;
pub use document::{DocumentWriter, RenderContext};
pub use error::{ExportError, Result};
pub use transaction::{read_records, EntryKind, RawRecord, RecordReader, TransactionRecord};
