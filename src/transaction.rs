//! Transaction models for CSV parsing and internal representation.

use crate::decimal::Decimal2;
use crate::error::{ExportError, Result};
use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

/// Raw transaction row as produced by the upstream extract.
///
/// Column order is `date,description,kind,amount,balance`. Dates stay textual
/// here; they are normalized when a statement is assembled.
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    pub date: String,

    pub description: String,

    /// `CREDIT`/`DEBIT`, or the upstream spellings `CREDITO`/`DEBITO`
    pub kind: String,

    pub amount: Decimal2,

    /// Account balance right after this transaction
    pub balance: Decimal2,
}

impl RawRecord {
    /// Converts the raw row into a typed record.
    ///
    /// `row` is only used for error reporting.
    pub fn parse(self, row: usize) -> Result<TransactionRecord> {
        let kind = EntryKind::from_str(&self.kind).map_err(|message| {
            ExportError::InvalidRecord { row, message }
        })?;

        if self.amount.is_negative() {
            return Err(ExportError::InvalidRecord {
                row,
                message: format!("amount must not be negative, got {}", self.amount),
            });
        }

        Ok(TransactionRecord {
            date: self.date.trim().to_string(),
            description: self.description,
            kind,
            amount: self.amount,
            running_balance: self.balance,
        })
    }
}

/// Direction of a transaction relative to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Credit,
    Debit,
}

impl EntryKind {
    /// Statement type tag written for entries of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            EntryKind::Credit => "CREDIT",
            EntryKind::Debit => "DEBIT",
        }
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CREDIT" | "CREDITO" | "CRÉDITO" => Ok(EntryKind::Credit),
            "DEBIT" | "DEBITO" | "DÉBITO" => Ok(EntryKind::Debit),
            other => Err(format!("unknown transaction kind {:?}", other)),
        }
    }
}

/// One bank transaction, already ordered and balanced upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Textual date in one of the accepted shapes (see [`crate::date`]).
    pub date: String,
    pub description: String,
    pub kind: EntryKind,
    /// Non-negative magnitude.
    pub amount: Decimal2,
    pub running_balance: Decimal2,
}

impl TransactionRecord {
    /// Amount as it affects the balance: negative for debits.
    pub fn signed_amount(&self) -> Decimal2 {
        match self.kind {
            EntryKind::Credit => self.amount,
            EntryKind::Debit => Decimal2::ZERO - self.amount,
        }
    }
}

/// Streams records from a CSV source one row at a time.
///
/// A malformed row is yielded as an error: input is expected to be
/// validated upstream, and a silently dropped row would break the running
/// balances.
pub struct RecordReader<R: Read> {
    rows: DeserializeRecordsIntoIter<R, RawRecord>,
    row: usize,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R, has_headers: bool) -> Self {
        let csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .has_headers(has_headers)
            .from_reader(reader);

        RecordReader {
            rows: csv_reader.into_deserialize(),
            // 1-based, accounting for the header row
            row: usize::from(has_headers),
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<TransactionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.rows.next()?;
        self.row += 1;
        let row = self.row;

        Some(
            result
                .map_err(|e| ExportError::InvalidRecord {
                    row,
                    message: e.to_string(),
                })
                .and_then(|raw| raw.parse(row)),
        )
    }
}

/// Reads every record from a CSV stream into memory.
pub fn read_records<R: Read>(reader: R, has_headers: bool) -> Result<Vec<TransactionRecord>> {
    RecordReader::new(reader, has_headers).collect()
}
