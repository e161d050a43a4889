//! Export configuration.
//!
//! Every field has a default, so a TOML file only needs the values it
//! overrides:
//!
//! ```toml
//! max_group_size = 10000
//! reference_numbering = "global"
//!
//! [envelope]
//! org = "Banco Exemplo"
//! account_id = "12345-6"
//! ```

use crate::charset::Charset;
use crate::chunk::DEFAULT_MAX_GROUP_SIZE;
use crate::error::{ExportError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// How reference ids are assigned across the documents of one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceNumbering {
    /// Every document restarts at the reference base.
    #[default]
    PerGroup,
    /// Numbering continues across documents, so ids are unique per export.
    Global,
}

/// What an export produces when there are no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyInputPolicy {
    /// One document with an empty transaction list and a zero balance.
    #[default]
    SingleEmptyDocument,
    NoDocuments,
}

/// Static header and institution values written into every document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub header_version: String,
    pub data_format: String,
    pub version: String,
    pub security: String,
    pub compression: String,
    pub language: String,
    pub status_severity: String,
    pub org: String,
    pub fid: String,
    pub transaction_uid: String,
    pub currency: String,
    pub bank_id: String,
    pub account_id: String,
    pub account_type: String,
    /// Appended to every rendered timestamp.
    pub date_offset: String,
}

impl EnvelopeConfig {
    /// Every value paired with its field name.
    fn fields(&self) -> [(&'static str, &str); 15] {
        [
            ("header_version", self.header_version.as_str()),
            ("data_format", self.data_format.as_str()),
            ("version", self.version.as_str()),
            ("security", self.security.as_str()),
            ("compression", self.compression.as_str()),
            ("language", self.language.as_str()),
            ("status_severity", self.status_severity.as_str()),
            ("org", self.org.as_str()),
            ("fid", self.fid.as_str()),
            ("transaction_uid", self.transaction_uid.as_str()),
            ("currency", self.currency.as_str()),
            ("bank_id", self.bank_id.as_str()),
            ("account_id", self.account_id.as_str()),
            ("account_type", self.account_type.as_str()),
            ("date_offset", self.date_offset.as_str()),
        ]
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig {
            header_version: "100".to_string(),
            data_format: "OFXSGML".to_string(),
            version: "102".to_string(),
            security: "NONE".to_string(),
            compression: "NONE".to_string(),
            language: "POR".to_string(),
            status_severity: "INFO".to_string(),
            org: "BANCO".to_string(),
            fid: "001".to_string(),
            transaction_uid: "1001".to_string(),
            currency: "BRL".to_string(),
            bank_id: "001".to_string(),
            account_id: "00000-0".to_string(),
            account_type: "CHECKING".to_string(),
            date_offset: "[-3:GMT]".to_string(),
        }
    }
}

/// Settings for one export run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub max_group_size: usize,
    pub charset: Charset,
    pub reference_numbering: ReferenceNumbering,
    /// First reference id of a document (or of the export, when global).
    pub reference_base: u64,
    pub empty_input: EmptyInputPolicy,
    /// Whether the input CSV starts with a header row.
    pub has_headers: bool,
    pub envelope: EnvelopeConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            charset: Charset::default(),
            reference_numbering: ReferenceNumbering::default(),
            reference_base: 100_000,
            empty_input: EmptyInputPolicy::default(),
            has_headers: false,
            envelope: EnvelopeConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Loads and validates a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: ExportConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_group_size == 0 {
            return Err(ExportError::InvalidConfig(
                "max_group_size must be at least 1".to_string(),
            ));
        }
        if self
            .reference_base
            .checked_add(self.max_group_size as u64)
            .is_none()
        {
            return Err(ExportError::InvalidConfig(format!(
                "reference_base {} leaves no room for {} references",
                self.reference_base, self.max_group_size
            )));
        }
        for (name, value) in self.envelope.fields() {
            if value.contains(['\n', '\r']) {
                return Err(ExportError::InvalidConfig(format!(
                    "envelope.{} must be a single line",
                    name
                )));
            }
        }
        Ok(())
    }
}
