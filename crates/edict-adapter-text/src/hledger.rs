//! hledger journal output
//!
//! Each record becomes one transaction. Recognised fields:
//!
//! * transaction: `date` (required), `date2`, `status`, `code`,
//!   `description`, `comment`, `currency` (default for every posting)
//! * posting `N`: `accountN`, `statusN`, `amountN`, `currencyN`,
//!   `unitpriceN` or `totalpriceN` with `pricecurrencyN`, `balanceN`,
//!   `commentN`, `virtualN`, `balanced virtualN`
//!
//! A posting line is written only when `accountN` is non-empty. Values are
//! written as given; dates must already be in a format hledger accepts.

use std::io::Write;
use std::sync::LazyLock;

use edict_record::{Record, RecordStream, RecordWriter};
use regex::Regex;
use tracing::debug;

use crate::errors::TextResult;
use crate::postings::{numbered, posting_account, posting_numbers, required, value};

const PROTOCOL: &str = "hledger";

/// Commodity symbols containing any of these must be double-quoted
static QUOTE_COMMODITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[-+\d\s.@*;"}{=]"#).unwrap_or_else(|e| panic!("commodity pattern: {e}"))
});

/// Writes records as hledger transactions
#[derive(Debug, Clone, Copy, Default)]
pub struct HledgerWriter;

impl HledgerWriter {
    /// Create a new hledger writer
    pub fn new() -> Self {
        Self
    }

    /// Format one record as a transaction, including the trailing blank line
    ///
    /// # Errors
    ///
    /// Returns an error when the record has no `date` field.
    pub fn format(&self, record: &Record) -> TextResult<String> {
        let mut text = String::new();
        text.push_str(required(record, PROTOCOL, "date")?);
        if let Some(date2) = value(record, "date2") {
            text.push('=');
            text.push_str(date2);
        }
        if let Some(status) = value(record, "status") {
            text.push(' ');
            text.push_str(status);
        }
        if let Some(code) = value(record, "code") {
            text.push_str(&format!(" ({code})"));
        }
        if let Some(description) = value(record, "description") {
            text.push(' ');
            text.push_str(description);
        }
        if let Some(comment) = value(record, "comment") {
            text.push_str("  ; ");
            text.push_str(comment);
        }
        text.push('\n');

        let default_commodity = value(record, "currency").map(quote_commodity).unwrap_or_default();
        for n in posting_numbers(record) {
            if let Some(line) = posting(record, n, &default_commodity) {
                text.push_str(&line);
                text.push('\n');
            }
        }
        text.push('\n');
        Ok(text)
    }
}

impl RecordWriter for HledgerWriter {
    fn write(&self, output: &mut dyn Write, stream: RecordStream<'_>) -> edict_record::Result<()> {
        let mut count = 0usize;
        for record in stream.records {
            output.write_all(self.format(&record?)?.as_bytes())?;
            count += 1;
        }
        debug!(transaction_count = count, "Finished writing hledger journal");
        Ok(())
    }
}

fn quote_commodity(commodity: &str) -> String {
    if QUOTE_COMMODITY.is_match(commodity) {
        format!("\"{commodity}\"")
    } else {
        commodity.to_string()
    }
}

/// Multi-character commodities are separated from the amount by a space
fn with_commodity(amount: &str, commodity: &str) -> String {
    let separator = if commodity.chars().count() > 1 { " " } else { "" };
    format!("{commodity}{separator}{amount}")
}

fn posting(record: &Record, n: u32, default_commodity: &str) -> Option<String> {
    let account = numbered(record, "account", n)?;

    let commodity = numbered(record, "currency", n)
        .map(quote_commodity)
        .unwrap_or_else(|| default_commodity.to_string());
    let price_commodity = numbered(record, "pricecurrency", n)
        .map(quote_commodity)
        .unwrap_or_else(|| default_commodity.to_string());

    let mut suffix = String::new();
    if let Some(amount) = numbered(record, "amount", n) {
        suffix.push_str(&with_commodity(amount, &commodity));
        if let Some(price) = numbered(record, "unitprice", n) {
            suffix.push_str(" @ ");
            suffix.push_str(&with_commodity(price, &price_commodity));
        } else if let Some(price) = numbered(record, "totalprice", n) {
            suffix.push_str(" @@ ");
            suffix.push_str(&with_commodity(price, &price_commodity));
        }
    }
    if let Some(balance) = numbered(record, "balance", n) {
        suffix.push_str(" = ");
        suffix.push_str(&commodity);
        suffix.push_str(balance);
    }
    if let Some(comment) = numbered(record, "comment", n) {
        suffix.push_str("  ; ");
        suffix.push_str(comment);
    }

    let mut line = String::from("    ");
    if let Some(status) = numbered(record, "status", n) {
        line.push_str(status);
        line.push(' ');
    }
    line.push_str(&posting_account(record, n, account));
    if !suffix.is_empty() {
        line.push_str("  ");
        line.push_str(&suffix);
    }
    Some(line)
}
