//! Decoder for CAMT.053 bank-to-customer statements (ISO 20022 XML),
//! deserialized with quick-xml into the handful of elements a ledger import
//! needs: `Document → BkToCstmrStmt → Stmt → Ntry`.

use serde::Deserialize;

use crate::error::Result;

/// One statement entry reduced to close-to-final import fields. Amounts are
/// signed: debits negative, credits positive.
#[derive(Debug, Clone, PartialEq)]
pub struct CamtTransaction {
    pub amount: f64,
    pub date: Option<String>,
    pub payee_name: Option<String>,
    pub imported_payee: Option<String>,
    pub notes: Option<String>,
}

pub fn parse(contents: &str) -> Result<Vec<CamtTransaction>> {
    let document: Document = quick_xml::de::from_str(contents)?;
    let transactions = document
        .statement
        .statements
        .into_iter()
        .flat_map(|statement| statement.entries)
        .map(Entry::into_transaction)
        .collect();
    Ok(transactions)
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "BkToCstmrStmt")]
    statement: BankToCustomerStatement,
}

#[derive(Debug, Deserialize)]
struct BankToCustomerStatement {
    #[serde(rename = "Stmt", default)]
    statements: Vec<Statement>,
}

#[derive(Debug, Deserialize)]
struct Statement {
    #[serde(rename = "Ntry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "Amt")]
    amount: Amount,
    #[serde(rename = "CdtDbtInd")]
    credit_debit: String,
    #[serde(rename = "BookgDt")]
    booking_date: Option<EntryDate>,
    #[serde(rename = "ValDt")]
    value_date: Option<EntryDate>,
    #[serde(rename = "NtryDtls", default)]
    details: Vec<EntryDetails>,
    #[serde(rename = "AddtlNtryInf")]
    additional_info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Amount {
    #[serde(rename = "@Ccy")]
    _currency: Option<String>,
    #[serde(rename = "$text")]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct EntryDate {
    #[serde(rename = "Dt")]
    date: Option<String>,
    #[serde(rename = "DtTm")]
    date_time: Option<String>,
}

impl EntryDate {
    fn day(&self) -> Option<String> {
        self.date.clone().or_else(|| {
            self.date_time
                .as_ref()
                .map(|stamp| stamp.chars().take(10).collect())
        })
    }
}

#[derive(Debug, Deserialize)]
struct EntryDetails {
    #[serde(rename = "TxDtls", default)]
    transactions: Vec<TransactionDetails>,
}

#[derive(Debug, Deserialize)]
struct TransactionDetails {
    #[serde(rename = "RltdPties")]
    parties: Option<RelatedParties>,
    #[serde(rename = "RmtInf")]
    remittance: Option<RemittanceInfo>,
}

#[derive(Debug, Deserialize)]
struct RelatedParties {
    #[serde(rename = "Cdtr")]
    creditor: Option<Party>,
    #[serde(rename = "Dbtr")]
    debtor: Option<Party>,
}

#[derive(Debug, Deserialize)]
struct Party {
    #[serde(rename = "Nm")]
    name: Option<String>,
    // CAMT.053 v8 nests the name one level deeper.
    #[serde(rename = "Pty")]
    party: Option<InnerParty>,
}

#[derive(Debug, Deserialize)]
struct InnerParty {
    #[serde(rename = "Nm")]
    name: Option<String>,
}

impl Party {
    fn name(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.party.as_ref().and_then(|inner| inner.name.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct RemittanceInfo {
    #[serde(rename = "Ustrd", default)]
    unstructured: Vec<String>,
}

impl Entry {
    fn into_transaction(self) -> CamtTransaction {
        let debit = self.credit_debit == "DBIT";
        let amount = if debit {
            -self.amount.value
        } else {
            self.amount.value
        };
        let date = self
            .booking_date
            .as_ref()
            .and_then(EntryDate::day)
            .or_else(|| self.value_date.as_ref().and_then(EntryDate::day));

        let first_details = self
            .details
            .iter()
            .flat_map(|details| details.transactions.iter())
            .next();

        // Money out goes to the creditor, money in comes from the debtor.
        let payee = first_details
            .and_then(|tx| tx.parties.as_ref())
            .and_then(|parties| {
                if debit {
                    parties.creditor.as_ref()
                } else {
                    parties.debtor.as_ref()
                }
            })
            .and_then(Party::name);

        let notes = first_details
            .and_then(|tx| tx.remittance.as_ref())
            .map(|remittance| remittance.unstructured.join(" "))
            .filter(|joined| !joined.is_empty())
            .or(self.additional_info)
            .filter(|info| !info.is_empty());

        CamtTransaction {
            amount,
            date,
            payee_name: payee.clone(),
            imported_payee: payee,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(entries: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<Document xmlns=\"urn:iso:std:iso:20022:tech:xsd:camt.053.001.02\">\n\
<BkToCstmrStmt><Stmt>{entries}</Stmt></BkToCstmrStmt></Document>"
        )
    }

    const DEBIT_ENTRY: &str = "<Ntry>\
<Amt Ccy=\"EUR\">25.50</Amt>\
<CdtDbtInd>DBIT</CdtDbtInd>\
<BookgDt><Dt>2024-05-02</Dt></BookgDt>\
<ValDt><Dt>2024-05-03</Dt></ValDt>\
<NtryDtls><TxDtls>\
<RltdPties><Cdtr><Nm>Hardware Store</Nm></Cdtr><Dbtr><Nm>Account Holder</Nm></Dbtr></RltdPties>\
<RmtInf><Ustrd>Invoice 44</Ustrd><Ustrd>May order</Ustrd></RmtInf>\
</TxDtls></NtryDtls>\
</Ntry>";

    #[test]
    fn debits_are_negative_and_take_the_creditor() {
        let transactions = parse(&statement(DEBIT_ENTRY)).unwrap();
        assert_eq!(transactions.len(), 1);

        let tx = &transactions[0];
        assert_eq!(tx.amount, -25.50);
        assert_eq!(tx.date.as_deref(), Some("2024-05-02"));
        assert_eq!(tx.payee_name.as_deref(), Some("Hardware Store"));
        assert_eq!(tx.imported_payee, tx.payee_name);
        assert_eq!(tx.notes.as_deref(), Some("Invoice 44 May order"));
    }

    #[test]
    fn credits_are_positive_and_take_the_debtor() {
        let entry = "<Ntry>\
<Amt Ccy=\"EUR\">1000.00</Amt>\
<CdtDbtInd>CRDT</CdtDbtInd>\
<BookgDt><Dt>2024-05-06</Dt></BookgDt>\
<NtryDtls><TxDtls>\
<RltdPties><Dbtr><Nm>Employer GmbH</Nm></Dbtr></RltdPties>\
</TxDtls></NtryDtls>\
</Ntry>";
        let transactions = parse(&statement(entry)).unwrap();
        assert_eq!(transactions[0].amount, 1000.00);
        assert_eq!(transactions[0].payee_name.as_deref(), Some("Employer GmbH"));
    }

    #[test]
    fn resolves_pty_nested_names() {
        let entry = "<Ntry>\
<Amt>5.00</Amt>\
<CdtDbtInd>DBIT</CdtDbtInd>\
<BookgDt><Dt>2024-05-07</Dt></BookgDt>\
<NtryDtls><TxDtls>\
<RltdPties><Cdtr><Pty><Nm>Nested Vendor</Nm></Pty></Cdtr></RltdPties>\
</TxDtls></NtryDtls>\
</Ntry>";
        let transactions = parse(&statement(entry)).unwrap();
        assert_eq!(transactions[0].payee_name.as_deref(), Some("Nested Vendor"));
    }

    #[test]
    fn falls_back_to_value_date_and_additional_info() {
        let entry = "<Ntry>\
<Amt>7.00</Amt>\
<CdtDbtInd>DBIT</CdtDbtInd>\
<ValDt><DtTm>2024-05-09T13:45:00</DtTm></ValDt>\
<AddtlNtryInf>Card payment</AddtlNtryInf>\
</Ntry>";
        let transactions = parse(&statement(entry)).unwrap();
        assert_eq!(transactions[0].date.as_deref(), Some("2024-05-09"));
        assert_eq!(transactions[0].payee_name, None);
        assert_eq!(transactions[0].notes.as_deref(), Some("Card payment"));
    }

    #[test]
    fn multiple_statements_are_concatenated() {
        let xml = "<?xml version=\"1.0\"?><Document>\
<BkToCstmrStmt>\
<Stmt><Ntry><Amt>1.00</Amt><CdtDbtInd>CRDT</CdtDbtInd></Ntry></Stmt>\
<Stmt><Ntry><Amt>2.00</Amt><CdtDbtInd>DBIT</CdtDbtInd></Ntry></Stmt>\
</BkToCstmrStmt></Document>";
        let transactions = parse(xml).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].amount, 1.00);
        assert_eq!(transactions[1].amount, -2.00);
    }

    #[test]
    fn rejects_invalid_xml() {
        assert!(parse("not xml at all").is_err());
        assert!(parse("<Document><BkToCstmrStmt><Stmt><Ntry></Ntry></Stmt></BkToCstmrStmt></Document>").is_err());
    }
}
