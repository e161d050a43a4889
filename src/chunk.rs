//! Partitioning of records into bounded, ordered groups.

use crate::error::{ExportError, Result};
use crate::transaction::TransactionRecord;

/// Default upper bound of records per statement document.
pub const DEFAULT_MAX_GROUP_SIZE: usize = 30_000;

/// A contiguous run of records destined for one document.
#[derive(Debug, Clone, Copy)]
pub struct ExportGroup<'a> {
    /// 1-based position among the groups of one export.
    pub position: usize,
    /// Index of the first record within the whole export.
    pub offset: usize,
    pub records: &'a [TransactionRecord],
}

impl<'a> ExportGroup<'a> {
    /// A group with no records, used when empty input still yields a document.
    pub fn empty() -> Self {
        ExportGroup {
            position: 1,
            offset: 0,
            records: &[],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&'a TransactionRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&'a TransactionRecord> {
        self.records.last()
    }
}

/// Splits `records` into groups of at most `max_size`, preserving order.
///
/// Every record lands in exactly one group; only the last group may be short.
/// Empty input yields no groups.
pub fn chunk(records: &[TransactionRecord], max_size: usize) -> Result<Vec<ExportGroup<'_>>> {
    if max_size == 0 {
        return Err(ExportError::InvalidConfig(
            "max group size must be at least 1".to_string(),
        ));
    }

    Ok(records
        .chunks(max_size)
        .enumerate()
        .map(|(idx, slice)| ExportGroup {
            position: idx + 1,
            offset: idx * max_size,
            records: slice,
        })
        .collect())
}
