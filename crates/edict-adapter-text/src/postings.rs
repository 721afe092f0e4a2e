//! Field conventions shared by the journal writers
//!
//! A transaction record carries its postings in numbered fields:
//! `account1`, `amount1`, `currency1`, ... The posting numbers are the
//! non-negative integer suffixes found on `account` fields.

use std::collections::BTreeSet;

use edict_record::Record;

use crate::errors::{TextError, TextResult};

const ACCOUNT_PREFIX: &str = "account";

/// Posting numbers present in `record`, ascending and without duplicates
pub(crate) fn posting_numbers(record: &Record) -> Vec<u32> {
    record
        .field_names()
        .filter_map(|name| name.strip_prefix(ACCOUNT_PREFIX))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Value of `field` if present and non-empty
pub(crate) fn value<'r>(record: &'r Record, field: &str) -> Option<&'r str> {
    record.get(field).filter(|v| !v.is_empty())
}

/// Value of the numbered field `{name}{n}`, if present and non-empty
pub(crate) fn numbered<'r>(record: &'r Record, name: &str, n: u32) -> Option<&'r str> {
    value(record, &format!("{name}{n}"))
}

/// Value of a field the protocol cannot do without
pub(crate) fn required<'r>(
    record: &'r Record,
    protocol: &'static str,
    field: &str,
) -> TextResult<&'r str> {
    record
        .get(field)
        .ok_or_else(|| TextError::missing_field(protocol, field))
}

/// Wrap the account in `()` for virtual or `[]` for balanced virtual postings
pub(crate) fn posting_account(record: &Record, n: u32, account: &str) -> String {
    if numbered(record, "virtual", n).is_some() {
        format!("({account})")
    } else if numbered(record, "balanced virtual", n).is_some() {
        format!("[{account}]")
    } else {
        account.to_string()
    }
}
