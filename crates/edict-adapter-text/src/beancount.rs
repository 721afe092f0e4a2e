//! Beancount journal output
//!
//! The `directive` field selects what a record becomes: empty, `*`, `txn`
//! or `transaction` for a transaction, `open` or `close` for account
//! directives. Transactions use the same numbered posting fields as the
//! hledger writer plus `lotunitpriceN` (`IMPLICIT` writes an empty cost).

use std::io::Write;

use edict_record::{Record, RecordStream, RecordWriter};
use tracing::debug;

use crate::errors::{TextError, TextResult};
use crate::postings::{numbered, posting_account, posting_numbers, required, value};

const PROTOCOL: &str = "beancount";

/// Writes records as Beancount directives
#[derive(Debug, Clone, Copy, Default)]
pub struct BeancountWriter;

impl BeancountWriter {
    /// Create a new beancount writer
    pub fn new() -> Self {
        Self
    }

    /// Format one record as a directive
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `directive` or a missing `date` or
    /// `account`.
    pub fn format(&self, record: &Record) -> TextResult<String> {
        match record.get("directive").unwrap_or_default() {
            "" | "*" | "txn" | "transaction" => transaction(record),
            "open" => {
                let date = required(record, PROTOCOL, "date")?;
                let account = required(record, PROTOCOL, "account")?;
                let mut text = format!("{date} open {account}");
                if let Some(currency) = value(record, "currency") {
                    text.push_str(&format!(" {currency}"));
                }
                if let Some(method) = value(record, "booking method") {
                    text.push_str(&format!(" \"{method}\""));
                }
                if let Some(comment) = value(record, "comment") {
                    text.push_str(&format!(" ; {comment}"));
                }
                text.push('\n');
                Ok(text)
            }
            "close" => {
                let date = required(record, PROTOCOL, "date")?;
                let account = required(record, PROTOCOL, "account")?;
                Ok(format!("{date} close {account}\n"))
            }
            other => Err(TextError::InvalidDirective(other.to_string())),
        }
    }
}

impl RecordWriter for BeancountWriter {
    fn write(&self, output: &mut dyn Write, stream: RecordStream<'_>) -> edict_record::Result<()> {
        let mut count = 0usize;
        for record in stream.records {
            output.write_all(self.format(&record?)?.as_bytes())?;
            count += 1;
        }
        debug!(directive_count = count, "Finished writing beancount journal");
        Ok(())
    }
}

fn transaction(record: &Record) -> TextResult<String> {
    let date = required(record, PROTOCOL, "date")?;
    let mut text = format!("{date} txn");
    // payee is only meaningful next to a narration
    if let Some(description) = value(record, "description") {
        if let Some(payee) = value(record, "payee") {
            text.push_str(&format!(" \"{payee}\""));
        }
        text.push_str(&format!(" \"{description}\""));
    }
    if let Some(comment) = value(record, "comment") {
        text.push_str(&format!(" ; {comment}"));
    }
    text.push('\n');

    let default_currency = value(record, "currency").unwrap_or_default();
    for n in posting_numbers(record) {
        if let Some(line) = posting(record, n, default_currency) {
            text.push_str(&line);
            text.push('\n');
        }
    }
    text.push('\n');
    Ok(text)
}

fn with_currency(number: &str, currency: &str) -> String {
    if currency.is_empty() {
        number.to_string()
    } else {
        format!("{number} {currency}")
    }
}

fn posting(record: &Record, n: u32, default_currency: &str) -> Option<String> {
    let account = numbered(record, "account", n)?;
    let currency = numbered(record, "currency", n).unwrap_or(default_currency);
    let price_currency = numbered(record, "pricecurrency", n).unwrap_or(default_currency);

    let mut suffix = String::new();
    if let Some(amount) = numbered(record, "amount", n) {
        suffix.push_str(&with_currency(amount, currency));
        match numbered(record, "lotunitprice", n) {
            Some("IMPLICIT") => suffix.push_str(" {}"),
            Some(cost) => {
                suffix.push_str(&format!(" {{{}}}", with_currency(cost, price_currency)));
            }
            None => {}
        }
        if let Some(price) = numbered(record, "unitprice", n) {
            suffix.push_str(" @ ");
            suffix.push_str(&with_currency(price, price_currency));
        }
    }
    if let Some(comment) = numbered(record, "comment", n) {
        if !suffix.is_empty() {
            suffix.push(' ');
        }
        suffix.push_str("; ");
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
