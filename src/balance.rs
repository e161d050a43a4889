//! Date range and balances of one export group.
//!
//! Balances are read from the records, never accumulated: each record's
//! running balance is authoritative.

use crate::chunk::ExportGroup;
use crate::date::{self, Timestamp};
use crate::decimal::Decimal2;
use crate::error::Result;

/// Bounds and balances reported by one statement document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Balance immediately before the first record of the group, or `None`
    /// when it falls outside the representable range.
    pub opening_balance: Option<Decimal2>,
    /// Running balance of the last record of the group.
    pub closing_balance: Decimal2,
}

impl StatementPeriod {
    /// Derives the period of `group`.
    ///
    /// An empty group falls back to `generated_at` for both bounds and to
    /// zero balances.
    pub fn for_group(group: &ExportGroup<'_>, generated_at: &Timestamp) -> Result<Self> {
        match (group.first(), group.last()) {
            (Some(first), Some(last)) => Ok(StatementPeriod {
                start: date::normalize(&first.date)?,
                end: date::normalize(&last.date)?,
                opening_balance: first.running_balance.checked_sub(first.signed_amount()),
                closing_balance: last.running_balance,
            }),
            _ => Ok(StatementPeriod {
                start: generated_at.clone(),
                end: generated_at.clone(),
                opening_balance: Some(Decimal2::ZERO),
                closing_balance: Decimal2::ZERO,
            }),
        }
    }
}
