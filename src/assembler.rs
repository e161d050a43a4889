//! Export orchestration: chunk, render, and hand each document to a sink.
//!
//! Dates are validated for the whole batch before anything is rendered, so
//! a malformed date never leaves a partial set of files behind. Write
//! failures, on the other hand, are isolated per document.

use crate::balance::StatementPeriod;
use crate::chunk::{self, ExportGroup};
use crate::config::{EmptyInputPolicy, ExportConfig, ReferenceNumbering};
use crate::date::{self, Timestamp};
use crate::document::{DocumentWriter, RenderContext};
use crate::error::{ExportError, Result};
use crate::transaction::TransactionRecord;
use chrono::Local;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Derives the path of the `n`-th document from the configured base path.
///
/// `statements/extrato.ofx` becomes `statements/extrato_part3.ofx`; a base
/// without extension just gets the suffix. No filesystem access happens.
pub fn part_path(base: &Path, n: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{}_part{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_part{}", stem, n),
    };
    base.with_file_name(file_name)
}

/// Destination for rendered documents.
pub trait DocumentSink {
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Writes each document to its own file.
#[derive(Debug, Default)]
pub struct FsSink;

impl DocumentSink for FsSink {
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(contents)?;
        writer.flush()
    }
}

/// Keeps documents in memory, in the order they were produced.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub documents: Vec<(PathBuf, Vec<u8>)>,
}

impl DocumentSink for MemorySink {
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.documents.push((path.to_path_buf(), contents.to_vec()));
        Ok(())
    }
}

/// A document that could not be persisted.
#[derive(Debug)]
pub struct GroupFailure {
    pub position: usize,
    pub path: PathBuf,
    pub error: ExportError,
}

/// Outcome of one export run.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Paths written successfully, in group order.
    pub written: Vec<PathBuf>,
    pub failed: Vec<GroupFailure>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }

    /// Converts a partial export into [`ExportError::PartialExport`].
    pub fn into_result(self) -> Result<Vec<PathBuf>> {
        if self.is_complete() {
            Ok(self.written)
        } else {
            Err(ExportError::PartialExport {
                failed: self.failed.len(),
                total: self.total(),
            })
        }
    }
}

/// Turns an ordered list of records into statement documents.
pub struct StatementAssembler<S: DocumentSink> {
    config: ExportConfig,
    base_path: PathBuf,
    sink: S,
}

impl<S: DocumentSink> StatementAssembler<S> {
    pub fn new(config: ExportConfig, base_path: impl Into<PathBuf>, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(StatementAssembler {
            config,
            base_path: base_path.into(),
            sink,
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Exports `records` using the local wall clock as export time.
    pub fn export(&mut self, records: &[TransactionRecord]) -> Result<ExportReport> {
        self.export_at(records, local_now())
    }

    /// Exports `records` with an explicit export time.
    ///
    /// Returns `Err` only for batch-level problems (bad dates, bad
    /// configuration). Per-document write failures are listed in the report.
    pub fn export_at(
        &mut self,
        records: &[TransactionRecord],
        generated_at: Timestamp,
    ) -> Result<ExportReport> {
        let mut order = DateOrder::default();
        for record in records {
            order.check(record)?;
        }

        let mut groups = chunk::chunk(records, self.config.max_group_size)?;
        if groups.is_empty() && self.config.empty_input == EmptyInputPolicy::SingleEmptyDocument {
            groups.push(ExportGroup::empty());
        }

        let mut report = ExportReport::default();
        for group in &groups {
            self.emit(group, &generated_at, &mut report)?;
        }

        log_summary(records.len(), &report);
        Ok(report)
    }

    /// Streaming counterpart of [`export`](Self::export).
    pub fn export_stream<I>(&mut self, records: I) -> Result<ExportReport>
    where
        I: IntoIterator<Item = Result<TransactionRecord>>,
    {
        self.export_stream_at(records, local_now())
    }

    /// Exports a record stream holding at most one group in memory.
    ///
    /// Dates are checked window by window, so a bad date aborts the call
    /// after the preceding documents were written. Run [`validate_records`]
    /// over the same source first to keep the batch all-or-nothing.
    pub fn export_stream_at<I>(&mut self, records: I, generated_at: Timestamp) -> Result<ExportReport>
    where
        I: IntoIterator<Item = Result<TransactionRecord>>,
    {
        let max = self.config.max_group_size;
        let mut records = records.into_iter();
        let mut order = DateOrder::default();
        let mut report = ExportReport::default();
        let mut window = Vec::with_capacity(max.min(DEFAULT_WINDOW_CAPACITY));
        let mut position = 0;
        let mut offset = 0;

        loop {
            window.clear();
            for record in records.by_ref().take(max) {
                let record = record?;
                order.check(&record)?;
                window.push(record);
            }
            if window.is_empty() {
                break;
            }

            position += 1;
            let group = ExportGroup {
                position,
                offset,
                records: &window,
            };
            self.emit(&group, &generated_at, &mut report)?;
            offset += window.len();
        }

        if position == 0 && self.config.empty_input == EmptyInputPolicy::SingleEmptyDocument {
            self.emit(&ExportGroup::empty(), &generated_at, &mut report)?;
        }

        log_summary(offset, &report);
        Ok(report)
    }

    /// Renders one group and hands it to the sink, recording the outcome.
    fn emit(
        &mut self,
        group: &ExportGroup<'_>,
        generated_at: &Timestamp,
        report: &mut ExportReport,
    ) -> Result<()> {
        let path = part_path(&self.base_path, group.position);
        let ctx = RenderContext {
            generated_at: generated_at.clone(),
            first_reference: first_reference(&self.config, group)?,
        };
        let writer = DocumentWriter::new(&self.config.envelope, self.config.charset);
        let text = writer.render(group, &ctx)?;

        if log::log_enabled!(log::Level::Debug) {
            let period = StatementPeriod::for_group(group, generated_at)?;
            let opening = period
                .opening_balance
                .map(|b| b.to_string())
                .unwrap_or_else(|| "?".to_string());
            debug!(
                "Group {}: {} records, {} to {}, balance {} -> {}",
                group.position,
                group.len(),
                period.start,
                period.end,
                opening,
                period.closing_balance
            );
        }

        let bytes = self.config.charset.encode(&text);
        match self.sink.write(&path, &bytes) {
            Ok(()) => report.written.push(path),
            Err(source) => {
                warn!(
                    "Group {}: failed to write {}: {}",
                    group.position,
                    path.display(),
                    source
                );
                report.failed.push(GroupFailure {
                    position: group.position,
                    error: ExportError::WriteFailure {
                        path: path.clone(),
                        source,
                    },
                    path,
                });
            }
        }
        Ok(())
    }
}

const DEFAULT_WINDOW_CAPACITY: usize = 4_096;

fn local_now() -> Timestamp {
    Timestamp::from_datetime(Local::now().naive_local())
}

fn log_summary(records: usize, report: &ExportReport) {
    info!(
        "Exported {} records into {} document(s), {} failed",
        records,
        report.total(),
        report.failed.len()
    );
}

fn first_reference(config: &ExportConfig, group: &ExportGroup<'_>) -> Result<u64> {
    match config.reference_numbering {
        ReferenceNumbering::PerGroup => Ok(config.reference_base),
        ReferenceNumbering::Global => config
            .reference_base
            .checked_add(group.offset as u64)
            .ok_or_else(|| {
                ExportError::InvalidConfig(format!(
                    "reference_base {} overflows at record {}",
                    config.reference_base, group.offset
                ))
            }),
    }
}

/// Checks that every date normalizes; warns when the sequence goes backwards.
#[derive(Debug, Default)]
struct DateOrder {
    previous: Option<Timestamp>,
    seen: usize,
}

impl DateOrder {
    fn check(&mut self, record: &TransactionRecord) -> Result<()> {
        let ts = date::normalize(&record.date)?;
        self.seen += 1;
        if let Some(prev) = &self.previous {
            if ts < *prev {
                warn!(
                    "Record {} dated {} precedes previous record dated {}",
                    self.seen, ts, prev
                );
            }
        }
        self.previous = Some(ts);
        Ok(())
    }
}

/// Reads a whole record stream without keeping it, failing on the first
/// malformed row or date. Returns the number of records seen.
pub fn validate_records<I>(records: I) -> Result<usize>
where
    I: IntoIterator<Item = Result<TransactionRecord>>,
{
    let mut order = DateOrder::default();
    for record in records {
        order.check(&record?)?;
    }
    Ok(order.seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal2;
    use crate::transaction::EntryKind;
    use std::str::FromStr;

    fn record(date: &str, kind: EntryKind, amount: &str, balance: &str) -> TransactionRecord {
        TransactionRecord {
            date: date.to_string(),
            description: "Compra".to_string(),
            kind,
            amount: Decimal2::from_str(amount).unwrap(),
            running_balance: Decimal2::from_str(balance).unwrap(),
        }
    }

    fn now() -> Timestamp {
        date::normalize("20240105083000").unwrap()
    }

    fn config(max: usize) -> ExportConfig {
        ExportConfig {
            max_group_size: max,
            ..ExportConfig::default()
        }
    }

    struct FailingSink {
        fail_position: usize,
        calls: usize,
        written: Vec<PathBuf>,
    }

    impl DocumentSink for FailingSink {
        fn write(&mut self, path: &Path, _contents: &[u8]) -> io::Result<()> {
            self.calls += 1;
            if self.calls == self.fail_position {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.written.push(path.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("out/extrato.ofx"), 1),
            PathBuf::from("out/extrato_part1.ofx")
        );
        assert_eq!(
            part_path(Path::new("extrato.2023.ofx"), 12),
            PathBuf::from("extrato.2023_part12.ofx")
        );
        assert_eq!(part_path(Path::new("extrato"), 2), PathBuf::from("extrato_part2"));
    }

    #[test]
    fn test_one_document_per_group() {
        let records: Vec<_> = (1..=5)
            .map(|d| record(&format!("2023-01-0{}", d), EntryKind::Credit, "1", "1"))
            .collect();
        let mut assembler =
            StatementAssembler::new(config(2), "extrato.ofx", MemorySink::default()).unwrap();
        let report = assembler.export_at(&records, now()).unwrap();

        assert!(report.is_complete());
        assert_eq!(
            report.written,
            vec![
                PathBuf::from("extrato_part1.ofx"),
                PathBuf::from("extrato_part2.ofx"),
                PathBuf::from("extrato_part3.ofx"),
            ]
        );
        assert_eq!(assembler.sink().documents.len(), 3);
    }

    #[test]
    fn test_invalid_date_writes_nothing() {
        let records = vec![
            record("2023-01-01", EntryKind::Credit, "1", "1"),
            record("2023-01-02", EntryKind::Credit, "1", "2"),
            record("02/01/2023", EntryKind::Credit, "1", "3"),
        ];
        let mut assembler =
            StatementAssembler::new(config(2), "extrato.ofx", MemorySink::default()).unwrap();

        let err = assembler.export_at(&records, now()).unwrap_err();
        assert!(matches!(err, ExportError::InvalidDateFormat { .. }));
        assert!(assembler.sink().documents.is_empty());
    }

    #[test]
    fn test_write_failure_does_not_abort_other_groups() {
        let records: Vec<_> = (1..=3)
            .map(|d| record(&format!("2023-01-0{}", d), EntryKind::Credit, "1", "1"))
            .collect();
        let sink = FailingSink {
            fail_position: 2,
            calls: 0,
            written: Vec::new(),
        };
        let mut assembler = StatementAssembler::new(config(1), "extrato.ofx", sink).unwrap();
        let report = assembler.export_at(&records, now()).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.total(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].position, 2);
        assert_eq!(report.failed[0].path, PathBuf::from("extrato_part2.ofx"));
        assert!(matches!(
            report.failed[0].error,
            ExportError::WriteFailure { .. }
        ));
        assert_eq!(
            assembler.into_sink().written,
            vec![
                PathBuf::from("extrato_part1.ofx"),
                PathBuf::from("extrato_part3.ofx"),
            ]
        );
        assert!(matches!(
            report.into_result(),
            Err(ExportError::PartialExport { failed: 1, total: 3 })
        ));
    }

    #[test]
    fn test_empty_input_policies() {
        let mut single =
            StatementAssembler::new(config(10), "extrato.ofx", MemorySink::default()).unwrap();
        let report = single.export_at(&[], now()).unwrap();
        assert_eq!(report.written, vec![PathBuf::from("extrato_part1.ofx")]);

        let none = ExportConfig {
            empty_input: EmptyInputPolicy::NoDocuments,
            ..config(10)
        };
        let mut assembler =
            StatementAssembler::new(none, "extrato.ofx", MemorySink::default()).unwrap();
        let report = assembler.export_at(&[], now()).unwrap();
        assert!(report.written.is_empty());
        assert!(assembler.sink().documents.is_empty());
    }

    #[test]
    fn test_reference_numbering() {
        let records: Vec<_> = (1..=3)
            .map(|d| record(&format!("2023-01-0{}", d), EntryKind::Credit, "1", "1"))
            .collect();
        let groups = chunk::chunk(&records, 2).unwrap();

        let per_group = config(2);
        assert_eq!(first_reference(&per_group, &groups[1]).unwrap(), 100_000);

        let global = ExportConfig {
            reference_numbering: ReferenceNumbering::Global,
            ..config(2)
        };
        assert_eq!(first_reference(&global, &groups[1]).unwrap(), 100_002);
    }

    #[test]
    fn test_global_reference_overflow_is_an_error() {
        let records: Vec<_> = (1..=3)
            .map(|d| record(&format!("2023-01-0{}", d), EntryKind::Credit, "1", "1"))
            .collect();
        let groups = chunk::chunk(&records, 2).unwrap();
        let near_max = ExportConfig {
            reference_numbering: ReferenceNumbering::Global,
            reference_base: u64::MAX - 2,
            ..config(2)
        };
        assert!(first_reference(&near_max, &groups[0]).is_ok());
        assert!(matches!(
            first_reference(&near_max, &groups[1]),
            Err(ExportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_stream_export_matches_slice_export() {
        let records: Vec<_> = (1..=5)
            .map(|d| record(&format!("2023-01-0{}", d), EntryKind::Credit, "1", "1"))
            .collect();

        let mut from_slice =
            StatementAssembler::new(config(2), "extrato.ofx", MemorySink::default()).unwrap();
        from_slice.export_at(&records, now()).unwrap();

        let mut from_stream =
            StatementAssembler::new(config(2), "extrato.ofx", MemorySink::default()).unwrap();
        let report = from_stream
            .export_stream_at(records.iter().cloned().map(Ok), now())
            .unwrap();

        assert_eq!(report.written.len(), 3);
        assert_eq!(
            from_stream.into_sink().documents,
            from_slice.into_sink().documents
        );
    }

    #[test]
    fn test_stream_export_of_nothing_follows_empty_policy() {
        let mut assembler =
            StatementAssembler::new(config(2), "extrato.ofx", MemorySink::default()).unwrap();
        let report = assembler
            .export_stream_at(std::iter::empty(), now())
            .unwrap();
        assert_eq!(report.written, vec![PathBuf::from("extrato_part1.ofx")]);
    }

    #[test]
    fn test_stream_export_stops_at_bad_row() {
        let good = record("2023-01-01", EntryKind::Credit, "1", "1");
        let rows = vec![
            Ok(good.clone()),
            Ok(good.clone()),
            Err(ExportError::InvalidRecord {
                row: 3,
                message: "bad".to_string(),
            }),
            Ok(good),
        ];
        let mut assembler =
            StatementAssembler::new(config(2), "extrato.ofx", MemorySink::default()).unwrap();

        let err = assembler.export_stream_at(rows, now()).unwrap_err();
        assert!(matches!(err, ExportError::InvalidRecord { row: 3, .. }));
        assert_eq!(assembler.sink().documents.len(), 1);
    }

    #[test]
    fn test_validate_records_counts_and_rejects() {
        let good = record("2023-01-01", EntryKind::Credit, "1", "1");
        let mut bad = good.clone();
        bad.date = "01/01/2023".to_string();

        assert_eq!(
            validate_records(vec![Ok(good.clone()), Ok(good.clone())]).unwrap(),
            2
        );
        assert!(matches!(
            validate_records(vec![Ok(good), Ok(bad)]),
            Err(ExportError::InvalidDateFormat { .. })
        ));
    }

    #[test]
    fn test_zero_group_size_rejected_at_construction() {
        assert!(StatementAssembler::new(config(0), "x.ofx", MemorySink::default()).is_err());
    }
}
