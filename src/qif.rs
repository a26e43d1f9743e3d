//! Decoder for QIF, the line-oriented Quicken interchange format: a
//! `!Type:` header followed by one field per line, each prefixed with a
//! single detail code, with `^` terminating every record.

use crate::error::{ImportError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QifTransaction {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub number: Option<String>,
    pub memo: Option<String>,
    pub payee: Option<String>,
    pub address: Vec<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub cleared_status: Option<String>,
    pub splits: Vec<QifSplit>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QifSplit {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub memo: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QifFile {
    pub account_type: String,
    pub transactions: Vec<QifTransaction>,
}

pub fn parse(contents: &str) -> Result<QifFile> {
    let mut lines = contents.lines();
    let header = lines.next().map(str::trim).unwrap_or_default();
    let account_type = header
        .find("!Type:")
        .map(|idx| header[idx + "!Type:".len()..].to_string())
        .ok_or_else(|| ImportError::Qif(format!("unexpected header line: {header:?}")))?;

    let mut transactions = Vec::new();
    let mut transaction = QifTransaction::default();
    let mut split = QifSplit::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "^" {
            if split != QifSplit::default() {
                transaction.splits.push(std::mem::take(&mut split));
            }
            transactions.push(std::mem::take(&mut transaction));
            continue;
        }

        let mut chars = line.chars();
        let Some(code) = chars.next() else { continue };
        let value = chars.as_str();
        match code {
            'D' => transaction.date = Some(value.to_string()),
            'T' => transaction.amount = Some(value.to_string()),
            // Legacy duplicate of T written by older exporters.
            'U' => {}
            'N' => transaction.number = Some(value.to_string()),
            'M' => transaction.memo = Some(value.to_string()),
            'A' => transaction.address.push(value.to_string()),
            'P' => transaction.payee = Some(value.replace("&amp;", "&")),
            'L' => match value.split_once(':') {
                Some((category, subcategory)) => {
                    transaction.category = Some(category.to_string());
                    transaction.subcategory = Some(subcategory.to_string());
                }
                None => transaction.category = Some(value.to_string()),
            },
            'C' => transaction.cleared_status = Some(value.to_string()),
            'S' => {
                if split != QifSplit::default() {
                    transaction.splits.push(std::mem::take(&mut split));
                }
                match value.split_once(':') {
                    Some((category, subcategory)) => {
                        split.category = Some(category.to_string());
                        split.subcategory = Some(subcategory.to_string());
                    }
                    None => split.category = Some(value.to_string()),
                }
            }
            'E' => split.memo = Some(value.to_string()),
            '$' => split.amount = Some(value.to_string()),
            other => return Err(ImportError::Qif(format!("unknown detail code: {other:?}"))),
        }
    }

    // A trailing record without its ^ terminator is still kept.
    if split != QifSplit::default() {
        transaction.splits.push(split);
    }
    if transaction != QifTransaction::default() {
        transactions.push(transaction);
    }

    Ok(QifFile {
        account_type,
        transactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "!Type:Bank\n\
D03/03/2024\n\
T-1,000.00\n\
PGrocery Store &amp; Deli\n\
MWeekly shopping\n\
LFood:Groceries\n\
^\n\
D03/04/2024\n\
T250.00\n\
PEmployer\n\
^\n";

    #[test]
    fn parses_header_and_transactions() {
        let data = parse(SAMPLE).unwrap();
        assert_eq!(data.account_type, "Bank");
        assert_eq!(data.transactions.len(), 2);

        let first = &data.transactions[0];
        assert_eq!(first.date.as_deref(), Some("03/03/2024"));
        assert_eq!(first.amount.as_deref(), Some("-1,000.00"));
        assert_eq!(first.memo.as_deref(), Some("Weekly shopping"));
        assert_eq!(first.category.as_deref(), Some("Food"));
        assert_eq!(first.subcategory.as_deref(), Some("Groceries"));
    }

    #[test]
    fn decodes_amp_entity_in_payee() {
        let data = parse(SAMPLE).unwrap();
        assert_eq!(
            data.transactions[0].payee.as_deref(),
            Some("Grocery Store & Deli")
        );
    }

    #[test]
    fn keeps_unterminated_trailing_record() {
        let data = parse("!Type:Bank\nD01/01/2024\nT5.00\n").unwrap();
        assert_eq!(data.transactions.len(), 1);
        assert_eq!(data.transactions[0].amount.as_deref(), Some("5.00"));
    }

    #[test]
    fn skips_blank_lines_and_legacy_u_code() {
        let data = parse("!Type:Bank\n\nD01/01/2024\nU5.00\nT5.00\n\n^\n").unwrap();
        assert_eq!(data.transactions.len(), 1);
        assert_eq!(data.transactions[0].amount.as_deref(), Some("5.00"));
    }

    #[test]
    fn collects_splits() {
        let qif = "!Type:Bank\n\
D01/01/2024\n\
T-100.00\n\
SRent\n\
EJanuary\n\
$-75.00\n\
SUtilities:Power\n\
$-25.00\n\
^\n";
        let data = parse(qif).unwrap();
        let splits = &data.transactions[0].splits;
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].category.as_deref(), Some("Rent"));
        assert_eq!(splits[0].memo.as_deref(), Some("January"));
        assert_eq!(splits[0].amount.as_deref(), Some("-75.00"));
        assert_eq!(splits[1].category.as_deref(), Some("Utilities"));
        assert_eq!(splits[1].subcategory.as_deref(), Some("Power"));
    }

    #[test]
    fn rejects_missing_type_header() {
        assert!(parse("D01/01/2024\nT5.00\n^\n").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn rejects_unknown_detail_code() {
        let err = parse("!Type:Bank\nZbogus\n^\n").unwrap_err();
        assert!(err.to_string().contains("'Z'"));
    }
}
