//! Multi-format bank statement parser.
//!
//! Given a statement export — CSV/TSV, QIF, OFX/QFX, or CAMT.053 XML, chosen
//! by file extension — this crate decodes the native format and normalizes
//! the result into one uniform transaction sequence for ledger import.
//! Malformed files are reported as recoverable per-file errors; they never
//! panic and never escape the call. Only I/O failures propagate.

pub mod amount;
pub mod camt;
pub mod error;
pub mod importer;
pub mod models;
pub mod ofx;
pub mod qif;

pub use error::{ImportError, Result};
pub use importer::parse_file;
pub use models::{
    CsvRecord, ImportTransaction, ParseError, ParseFileResult, ParseOptions, ParsedTransactions,
};
