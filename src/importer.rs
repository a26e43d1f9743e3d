use std::fs;
use std::path::Path;

use tracing::{debug, error};

use crate::amount::loosely_parse_amount;
use crate::camt;
use crate::error::Result;
use crate::models::{
    CsvRecord, ImportTransaction, ParseError, ParseFileResult, ParseOptions, ParsedTransactions,
};
use crate::ofx;
use crate::qif;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Parse one statement file, selecting the decoder from the file extension
/// (case-insensitive; content is never inspected to guess a format).
///
/// Decode failures are reported inside the returned [`ParseFileResult`] and
/// never panic or escape; only I/O failures surface as `Err`. An
/// unrecognized extension is reported without touching the filesystem.
pub fn parse_file(filepath: &Path, options: &ParseOptions) -> Result<ParseFileResult> {
    let ext = filepath
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    debug!("dispatching {} ({:?})", filepath.display(), ext);

    match ext.as_deref() {
        Some("qif") => parse_qif(filepath, options),
        Some("csv") | Some("tsv") => parse_csv(filepath, options),
        Some("ofx") | Some("qfx") => parse_ofx(filepath, options),
        Some("xml") => parse_camt(filepath, options),
        _ => Ok(ParseFileResult {
            errors: vec![ParseError {
                message: "Invalid file type".to_string(),
                internal: String::new(),
            }],
            transactions: Some(ParsedTransactions::Mapped(Vec::new())),
        }),
    }
}

// ---------------------------------------------------------------------------
// Delimited text (CSV/TSV)
// ---------------------------------------------------------------------------

fn parse_csv(filepath: &Path, options: &ParseOptions) -> Result<ParseFileResult> {
    let contents = fs::read_to_string(filepath)?;
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(&contents);

    let contents = if options.skip_lines > 0 {
        contents
            .lines()
            .skip(options.skip_lines)
            .collect::<Vec<_>>()
            .join("\r\n")
    } else {
        contents.to_string()
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter.unwrap_or(',') as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut rows = Vec::new();
    let mut headers: Option<Vec<String>> = None;
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                return Ok(ParseFileResult {
                    errors: vec![ParseError {
                        message: format!("Failed parsing: {err}"),
                        internal: err.to_string(),
                    }],
                    transactions: Some(ParsedTransactions::Rows(Vec::new())),
                });
            }
        };
        if options.has_header_row && headers.is_none() {
            headers = Some(record.iter().map(str::to_string).collect());
            continue;
        }
        // Rows pass through unmapped; flexible column counts mean a long row
        // is truncated to the named columns and a short row yields fewer keys.
        rows.push(match &headers {
            Some(names) => CsvRecord::Named(
                names
                    .iter()
                    .cloned()
                    .zip(record.iter().map(str::to_string))
                    .collect(),
            ),
            None => CsvRecord::Positional(record.iter().map(str::to_string).collect()),
        });
    }

    Ok(ParseFileResult {
        errors: Vec::new(),
        transactions: Some(ParsedTransactions::Rows(rows)),
    })
}

// ---------------------------------------------------------------------------
// QIF ledger text
// ---------------------------------------------------------------------------

fn parse_qif(filepath: &Path, options: &ParseOptions) -> Result<ParseFileResult> {
    let contents = fs::read_to_string(filepath)?;

    let data = match qif::parse(&contents) {
        Ok(data) => data,
        Err(err) => {
            return Ok(ParseFileResult {
                errors: vec![ParseError {
                    message: "Failed parsing: doesn’t look like a valid QIF file.".to_string(),
                    internal: err.to_string(),
                }],
                transactions: Some(ParsedTransactions::Mapped(Vec::new())),
            });
        }
    };

    let transactions = data
        .transactions
        .into_iter()
        .map(|trans| ImportTransaction {
            amount: trans.amount.as_deref().and_then(loosely_parse_amount),
            date: trans.date,
            payee_name: trans.payee.clone(),
            imported_payee: trans.payee,
            imported_id: None,
            notes: if options.import_notes {
                trans.memo.filter(|memo| !memo.is_empty())
            } else {
                None
            },
        })
        // QIF needs both fields to count as a transaction.
        .filter(|trans| trans.date.is_some() && trans.amount.is_some())
        .collect();

    Ok(ParseFileResult {
        errors: Vec::new(),
        transactions: Some(ParsedTransactions::Mapped(transactions)),
    })
}

// ---------------------------------------------------------------------------
// OFX/QFX tagged text
// ---------------------------------------------------------------------------

fn parse_ofx(filepath: &Path, options: &ParseOptions) -> Result<ParseFileResult> {
    let contents = fs::read_to_string(filepath)?;

    let decoded = match ofx::parse(&contents) {
        Ok(decoded) => decoded,
        Err(err) => {
            return Ok(ParseFileResult {
                errors: vec![ParseError {
                    message: "Failed importing file".to_string(),
                    internal: err.to_string(),
                }],
                transactions: None,
            });
        }
    };

    // Banks don't always fill NAME; optionally fall back to the memo.
    let use_memo_fallback = options.fallback_missing_payee_to_memo;

    let transactions = decoded
        .into_iter()
        .map(|trans| {
            let payee = trans.name.or_else(|| {
                if use_memo_fallback {
                    trans.memo.clone()
                } else {
                    None
                }
            });
            ImportTransaction {
                amount: Some(trans.amount),
                date: trans.date,
                payee_name: payee.clone(),
                imported_payee: payee,
                imported_id: Some(trans.fit_id),
                notes: if options.import_notes {
                    trans.memo
                } else {
                    None
                },
            }
        })
        .collect();

    Ok(ParseFileResult {
        errors: Vec::new(),
        transactions: Some(ParsedTransactions::Mapped(transactions)),
    })
}

// ---------------------------------------------------------------------------
// CAMT.053 banking XML
// ---------------------------------------------------------------------------

fn parse_camt(filepath: &Path, options: &ParseOptions) -> Result<ParseFileResult> {
    let contents = fs::read_to_string(filepath)?;

    let decoded = match camt::parse(&contents) {
        Ok(decoded) => decoded,
        Err(err) => {
            error!("CAMT decode failed for {}: {err}", filepath.display());
            return Ok(ParseFileResult {
                errors: vec![ParseError {
                    message: "Failed importing file".to_string(),
                    internal: err.to_string(),
                }],
                transactions: None,
            });
        }
    };

    let transactions = decoded
        .into_iter()
        .map(|trans| ImportTransaction {
            amount: Some(trans.amount),
            date: trans.date,
            payee_name: trans.payee_name,
            imported_payee: trans.imported_payee,
            imported_id: None,
            notes: if options.import_notes { trans.notes } else { None },
        })
        .collect();

    Ok(ParseFileResult {
        errors: Vec::new(),
        transactions: Some(ParsedTransactions::Mapped(transactions)),
    })
}
