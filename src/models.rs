use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-call decoding options. Every field is optional in serialized form and
/// defaults to off/empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Delimited text: treat the first row as field names instead of data.
    pub has_header_row: bool,
    /// Delimited text: field separator. Comma when unset.
    pub delimiter: Option<char>,
    /// OFX: when a transaction carries no payee name, use its memo instead.
    pub fallback_missing_payee_to_memo: bool,
    /// Delimited text: drop this many leading lines before decoding.
    pub skip_lines: usize,
    /// Propagate decoded memo/notes text into the output.
    pub import_notes: bool,
}

/// A recoverable decode failure, reported to the caller instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub message: String,
    pub internal: String,
}

/// The uniform output transaction shared by the QIF, OFX and CAMT paths.
/// `payee_name` and `imported_payee` always hold the same value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportTransaction {
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub payee_name: Option<String>,
    pub imported_payee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_id: Option<String>,
    pub notes: Option<String>,
}

/// One delimited-text row: named when the file has a header row, positional
/// otherwise. Rows reach the caller without any field mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CsvRecord {
    Named(IndexMap<String, String>),
    Positional(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedTransactions {
    /// Raw delimited rows.
    Rows(Vec<CsvRecord>),
    /// Mapped transactions from the QIF, OFX and CAMT paths.
    Mapped(Vec<ImportTransaction>),
}

/// Outcome of parsing one file. `transactions` is `None` when the OFX or
/// CAMT decoder fails outright; the CSV and QIF paths report failures with an
/// empty sequence instead. Downstream consumers rely on the distinction, so
/// the two shapes are not unified here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseFileResult {
    pub errors: Vec<ParseError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<ParsedTransactions>,
}
