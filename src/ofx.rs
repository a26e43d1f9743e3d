//! Decoder for OFX/QFX statement downloads.
//!
//! Handles both OFX 1.x (SGML, unclosed tags) and OFX 2.x (XML) bodies with
//! one case-insensitive tag scanner; only the `<STMTTRN>` transaction list
//! is extracted, which also makes bank and credit-card statements look the
//! same.

use chrono::NaiveDate;

use crate::error::{ImportError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct OfxTransaction {
    pub fit_id: String,
    /// Posting date reduced to `yyyy-mm-dd`.
    pub date: Option<String>,
    pub amount: f64,
    pub name: Option<String>,
    pub memo: Option<String>,
}

pub fn parse(contents: &str) -> Result<Vec<OfxTransaction>> {
    let body = ofx_body(contents)
        .ok_or_else(|| ImportError::Ofx("missing <OFX> root element".to_string()))?;

    let mut transactions = Vec::new();
    for block in extract_blocks(body, "STMTTRN") {
        let fit_id = tag_text(block, "FITID")
            .ok_or_else(|| ImportError::Ofx("<STMTTRN> without <FITID>".to_string()))?;
        let amount_raw = tag_text(block, "TRNAMT")
            .ok_or_else(|| ImportError::Ofx(format!("missing <TRNAMT> for FITID={fit_id}")))?;
        let amount: f64 = amount_raw.parse().map_err(|_| {
            ImportError::Ofx(format!("invalid <TRNAMT> for FITID={fit_id}: {amount_raw}"))
        })?;
        let date = tag_text(block, "DTPOSTED")
            .map(|raw| posted_date(&raw))
            .transpose()?;

        transactions.push(OfxTransaction {
            fit_id,
            date,
            amount,
            name: tag_text(block, "NAME"),
            memo: tag_text(block, "MEMO"),
        });
    }
    Ok(transactions)
}

/// The SGML/XML body starts at `<OFX>`; everything before it is the
/// colon-separated header block.
fn ofx_body(contents: &str) -> Option<&str> {
    let upper = contents.to_ascii_uppercase();
    upper.find("<OFX>").map(|idx| &contents[idx..])
}

fn extract_blocks<'a>(content: &'a str, tag: &str) -> Vec<&'a str> {
    let upper = content.to_ascii_uppercase();
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let mut blocks = Vec::new();
    let mut from = 0usize;
    while let Some(rel) = upper[from..].find(&open) {
        let start = from + rel + open.len();
        let rest = &upper[start..];
        let end = match rest.find(&close) {
            Some(e) => start + e,
            // SGML files may leave a block unclosed; stop at the next opener.
            None => match rest.find(&open) {
                Some(n) => start + n,
                None => content.len(),
            },
        };
        blocks.push(&content[start..end]);
        from = end;
    }
    blocks
}

/// Value of the first `<TAG>` in `content`: the text up to the next `<`,
/// which covers both `<TAG>value` (SGML) and `<TAG>value</TAG>` (XML).
/// Empty values count as absent.
fn tag_text(content: &str, tag: &str) -> Option<String> {
    let upper = content.to_ascii_uppercase();
    let open = format!("<{tag}>");
    let start = upper.find(&open)? + open.len();
    let rest = &content[start..];
    let end = rest.find('<').unwrap_or(rest.len());
    let value = decode_entities(rest[..end].trim());
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// OFX datetimes look like `YYYYMMDD`, `YYYYMMDDHHMMSS`, or
/// `YYYYMMDDHHMMSS.XXX[-5:EST]`. Only the date part matters for import.
fn posted_date(raw: &str) -> Result<String> {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 {
        return Err(ImportError::Ofx(format!("invalid <DTPOSTED> value: {raw}")));
    }
    let date = NaiveDate::parse_from_str(&digits[..8], "%Y%m%d")
        .map_err(|_| ImportError::Ofx(format!("invalid <DTPOSTED> value: {raw}")))?;
    Ok(date.format("%Y-%m-%d").to_string())
}
