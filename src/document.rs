//! Rendering of one export group into an OFX 1.x (SGML) statement.
//!
//! The layout is one tag per line with `\n` line endings: a plain-text
//! header block, the sign-on response, then the bank statement response
//! holding the transaction list and the ledger balance.

use crate::balance::StatementPeriod;
use crate::charset::Charset;
use crate::chunk::ExportGroup;
use crate::config::EnvelopeConfig;
use crate::date::{self, Timestamp};
use crate::error::{ExportError, Result};
use crate::transaction::{EntryKind, TransactionRecord};

/// Per-document values that do not come from the records.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Wall-clock time of the export run.
    pub generated_at: Timestamp,
    /// Reference id of the first entry in the document.
    pub first_reference: u64,
}

/// Line-oriented builder for SGML-style documents.
struct Lines(String);

impl Lines {
    fn open(&mut self, tag: &str) {
        self.0.push('<');
        self.0.push_str(tag);
        self.0.push_str(">\n");
    }

    fn close(&mut self, tag: &str) {
        self.0.push_str("</");
        self.0.push_str(tag);
        self.0.push_str(">\n");
    }

    fn field(&mut self, tag: &str, value: &str) {
        self.0.push('<');
        self.0.push_str(tag);
        self.0.push('>');
        self.0.push_str(value);
        self.0.push('\n');
    }

    fn header(&mut self, key: &str, value: &str) {
        self.0.push_str(key);
        self.0.push(':');
        self.0.push_str(value);
        self.0.push('\n');
    }
}

/// Renders statement documents for one institution.
pub struct DocumentWriter<'a> {
    envelope: &'a EnvelopeConfig,
    charset: Charset,
}

impl<'a> DocumentWriter<'a> {
    /// `charset` only decides the declared `ENCODING`/`CHARSET` header
    /// values; byte encoding happens when the document is written.
    pub fn new(envelope: &'a EnvelopeConfig, charset: Charset) -> Self {
        DocumentWriter { envelope, charset }
    }

    /// Renders `group` into the complete document text.
    pub fn render(&self, group: &ExportGroup<'_>, ctx: &RenderContext) -> Result<String> {
        let period = StatementPeriod::for_group(group, &ctx.generated_at)?;
        let mut out = Lines(String::with_capacity(256 + group.len() * 160));

        self.write_header(&mut out);
        out.open("OFX");
        self.write_signon(&mut out, &ctx.generated_at);

        out.open("BANKMSGSRSV1");
        out.open("STMTTRNRS");
        out.field("TRNUID", &self.envelope.transaction_uid);
        self.write_status(&mut out);
        out.open("STMTRS");
        out.field("CURDEF", &self.envelope.currency);
        out.open("BANKACCTFROM");
        out.field("BANKID", &self.envelope.bank_id);
        out.field("ACCTID", &self.envelope.account_id);
        out.field("ACCTTYPE", &self.envelope.account_type);
        out.close("BANKACCTFROM");

        out.open("BANKTRANLIST");
        out.field("DTSTART", &self.stamp(&period.start));
        out.field("DTEND", &self.stamp(&period.end));
        for (idx, record) in group.records.iter().enumerate() {
            let reference = ctx.first_reference.checked_add(idx as u64).ok_or_else(|| {
                ExportError::InvalidConfig(format!(
                    "reference id overflows after {}",
                    ctx.first_reference
                ))
            })?;
            self.write_entry(&mut out, record, reference)?;
        }
        out.close("BANKTRANLIST");

        out.open("LEDGERBAL");
        out.field("BALAMT", &period.closing_balance.to_string());
        out.field("DTASOF", &self.stamp(&period.end));
        out.close("LEDGERBAL");

        out.close("STMTRS");
        out.close("STMTTRNRS");
        out.close("BANKMSGSRSV1");
        out.close("OFX");

        Ok(out.0)
    }

    fn write_header(&self, out: &mut Lines) {
        let env = self.envelope;
        out.header("OFXHEADER", &env.header_version);
        out.header("DATA", &env.data_format);
        out.header("VERSION", &env.version);
        out.header("SECURITY", &env.security);
        out.header("ENCODING", self.charset.header_encoding());
        out.header("CHARSET", self.charset.header_charset());
        out.header("COMPRESSION", &env.compression);
        out.header("OLDFILEUID", "NONE");
        out.header("NEWFILEUID", "NONE");
        out.0.push('\n');
    }

    fn write_signon(&self, out: &mut Lines, generated_at: &Timestamp) {
        out.open("SIGNONMSGSRSV1");
        out.open("SONRS");
        self.write_status(out);
        out.field("DTSERVER", &self.stamp(generated_at));
        out.field("LANGUAGE", &self.envelope.language);
        out.open("FI");
        out.field("ORG", &self.envelope.org);
        out.field("FID", &self.envelope.fid);
        out.close("FI");
        out.close("SONRS");
        out.close("SIGNONMSGSRSV1");
    }

    fn write_status(&self, out: &mut Lines) {
        out.open("STATUS");
        out.field("CODE", "0");
        out.field("SEVERITY", &self.envelope.status_severity);
        out.close("STATUS");
    }

    fn write_entry(&self, out: &mut Lines, record: &TransactionRecord, reference: u64) -> Result<()> {
        let posted = date::normalize(&record.date)?;

        out.open("STMTTRN");
        out.field("TRNTYPE", record.kind.tag());
        out.field("DTPOSTED", &self.stamp(&posted));
        out.field("TRNAMT", &format_amount(record));
        out.field("FITID", &reference.to_string());
        out.field("MEMO", &record.description);
        out.close("STMTTRN");
        Ok(())
    }

    fn stamp(&self, ts: &Timestamp) -> String {
        ts.annotated(&self.envelope.date_offset)
    }
}

/// Two-decimal amount, prefixed with `-` for debits only.
pub fn format_amount(record: &TransactionRecord) -> String {
    match record.kind {
        EntryKind::Credit => record.amount.to_string(),
        EntryKind::Debit => format!("-{}", record.amount),
    }
}
