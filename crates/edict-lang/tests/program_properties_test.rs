//! Integration test: observable behaviour of compiled programs
//!
//! Each test compiles real source text and runs it over records or streams.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use edict_lang::{compile, compile_file, Error, RuntimeContext};
use edict_record::{Record, RecordStream};

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs.iter().copied().collect()
}

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn capture_logs() -> (RuntimeContext, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let context = RuntimeContext::new("csv", "csv")
        .with_log_sink(move |message| sink.lock().unwrap().push(message.to_string()));
    (context, seen)
}

#[test]
fn test_transform_never_mutates_input() -> Result<()> {
    let program = compile(r#"{a} = {a} . "-suffix" if true then {b} = "set" fi"#)?;
    let input = record(&[("a", "x"), ("z", "keep")]);
    let snapshot = input.clone();

    let output = program.transform(&input, &RuntimeContext::default())?;

    assert_eq!(input, snapshot);
    assert_eq!(output.get("a"), Some("x-suffix"));
    assert_eq!(output.get("b"), Some("set"));
    Ok(())
}

#[test]
fn test_first_match_wins_skips_side_effects() -> Result<()> {
    let program = compile(
        r#"
        if {a} == "1" then {b} = "first"
        elif log("second condition evaluated") then {b} = "second"
        elif {a} / 0 == 1 then {b} = "third"
        fi
        "#,
    )?;
    let (context, seen) = capture_logs();

    let output = program.transform(&record(&[("a", "1")]), &context)?;

    assert_eq!(output.get("b"), Some("first"));
    assert!(seen.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn test_later_condition_runs_when_earlier_fail() -> Result<()> {
    let program = compile(
        r#"
        if {a} == "1" then {b} = "first"
        elif log("checked", {a}) then {b} = "second"
        fi
        "#,
    )?;
    let (context, seen) = capture_logs();

    let output = program.transform(&record(&[("a", "2")]), &context)?;

    assert_eq!(output.get("b"), Some("second"));
    assert_eq!(*seen.lock().unwrap(), vec!["checked 2"]);
    Ok(())
}

#[test]
fn test_decimal_arithmetic_is_exact() -> Result<()> {
    let program = compile("{sum} = 0.1 + 0.2 {exact} = 0.1 + 0.2 == 0.3")?;
    let output = program.transform(&Record::new(), &RuntimeContext::default())?;
    assert_eq!(output.get("sum"), Some("0.3"));
    assert_eq!(output.get("exact"), Some("true"));
    Ok(())
}

#[test]
fn test_modulo_follows_divisor_sign() -> Result<()> {
    let program = compile("{m} = (-7) % 3 {n} = 7 % -3")?;
    let output = program.transform(&Record::new(), &RuntimeContext::default())?;
    assert_eq!(output.get("m"), Some("2"));
    assert_eq!(output.get("n"), Some("-2"));
    Ok(())
}

#[test]
fn test_case_insensitive_default_field_scenario() -> Result<()> {
    let program = compile(
        r#"default_field(a) case_insensitive(true)
           if "foo" then {b} = "hit" else {b} = "miss" fi"#,
    )?;
    let context = RuntimeContext::default();

    let hit = program.transform(&record(&[("a", "FOO"), ("b", "x")]), &context)?;
    assert_eq!(hit.iter().collect::<Vec<_>>(), vec![("a", "FOO"), ("b", "hit")]);

    let miss = program.transform(&record(&[("a", "bar"), ("b", "x")]), &context)?;
    assert_eq!(miss.iter().collect::<Vec<_>>(), vec![("a", "bar"), ("b", "miss")]);
    Ok(())
}

#[test]
fn test_case_insensitive_dynamic_operand() -> Result<()> {
    let program = compile(
        r#"case_insensitive(true)
           if {a} == {pattern} then {same} = "yes" fi
           if {a} ~ "OO" then {contains} = "yes" fi"#,
    )?;
    let output = program.transform(
        &record(&[("a", "FOO"), ("pattern", "foo")]),
        &RuntimeContext::default(),
    )?;
    assert_eq!(output.get("same"), Some("yes"));
    assert_eq!(output.get("contains"), Some("yes"));
    Ok(())
}

#[test]
fn test_case_insensitive_uses_full_case_folding() -> Result<()> {
    let program = compile(
        r#"case_insensitive(true)
           if {a} == "STRASSE" then {hit} = "yes" fi
           if {a} ~ "SS" then {contains} = "yes" fi
           {folded} = casefold({a})"#,
    )?;
    let output = program.transform(&record(&[("a", "straße")]), &RuntimeContext::default())?;
    assert_eq!(output.get("hit"), Some("yes"));
    assert_eq!(output.get("contains"), Some("yes"));
    assert_eq!(output.get("folded"), Some("strasse"));
    Ok(())
}

#[test]
fn test_output_fields_govern_stream_schema() -> Result<()> {
    let program = compile(r#"output_fields("b", "a") {c} = "extra""#)?;
    let stream = RecordStream::from_records(
        vec!["a".to_string(), "b".to_string()],
        vec![record(&[("a", "1"), ("b", "2")])],
    );

    let output = program.apply(stream, RuntimeContext::default())?;
    assert_eq!(output.fields, vec!["b", "a"]);
    let records = output.collect_records()?;
    assert_eq!(records[0].iter().collect::<Vec<_>>(), vec![("b", "2"), ("a", "1")]);
    Ok(())
}

#[test]
fn test_schema_union_when_rule_never_fires() -> Result<()> {
    let program = compile(r#"if {a} == "never" then {c} = "x" fi"#)?;
    let stream = RecordStream::from_records(
        vec!["a".to_string(), "b".to_string()],
        vec![record(&[("a", "1"), ("b", "2")])],
    );

    let output = program.apply(stream, RuntimeContext::default())?;
    assert_eq!(output.fields, vec!["a", "b", "c"]);
    let records = output.collect_records()?;
    assert_eq!(records[0].get("c"), None);
    Ok(())
}

#[test]
fn test_field_reference_pattern_is_prepare_error() {
    let err = compile(r#"if {a} ~ {b} then {c} = "1" fi"#).unwrap_err();
    match err {
        Error::Prepare(message) => assert!(message.contains("pattern must be a literal")),
        other => panic!("expected prepare error, got {other:?}"),
    }
}

/// Counts how many items the program pulled from its input
struct CountingIter {
    remaining: std::vec::IntoIter<Record>,
    pulled: Rc<Cell<usize>>,
}

impl Iterator for CountingIter {
    type Item = edict_record::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.remaining.next()?;
        self.pulled.set(self.pulled.get() + 1);
        Some(Ok(next))
    }
}

#[test]
fn test_sort_orders_output_after_reading_everything() -> Result<()> {
    let program = compile("sort(as_number({n})) {seen} = {n}")?;
    let input = ["3", "10", "1", "2"]
        .iter()
        .map(|n| record(&[("n", n)]))
        .collect::<Vec<_>>();
    let pulled = Rc::new(Cell::new(0));
    let stream = RecordStream::new(
        vec!["n".to_string()],
        CountingIter {
            remaining: input.into_iter(),
            pulled: Rc::clone(&pulled),
        },
    );

    let mut output = program.apply(stream, RuntimeContext::default())?;
    assert_eq!(pulled.get(), 4);

    let first = output.records.next().transpose()?;
    assert_eq!(first.as_ref().and_then(|r| r.get("n")), Some("1"));

    let rest: Vec<String> = output
        .records
        .map(|item| item.map(|r| r.get("n").unwrap_or_default().to_string()))
        .collect::<edict_record::Result<_>>()?;
    assert_eq!(rest, vec!["2", "3", "10"]);
    Ok(())
}

#[test]
fn test_sort_by_raw_field_is_textual() -> Result<()> {
    let program = compile("sort({n})")?;
    let stream = RecordStream::from_records(
        vec!["n".to_string()],
        ["3", "10", "1"].iter().map(|n| record(&[("n", n)])).collect(),
    );
    let records = program.apply(stream, RuntimeContext::default())?.collect_records()?;
    let order: Vec<&str> = records.iter().filter_map(|r| r.get("n")).collect();
    assert_eq!(order, vec!["1", "10", "3"]);
    Ok(())
}

#[test]
fn test_runtime_error_reports_node_and_record() -> Result<()> {
    let program = compile("{total} = as_number({amount}) + 1")?;
    let err = program
        .transform(&record(&[("amount", "twelve")]), &RuntimeContext::default())
        .unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("Error in as_number({amount}):"));
    assert!(text.ends_with("Error occurred while processing record:\n\tamount: twelve"));
    Ok(())
}

#[test]
fn test_numbers_hold_twenty_eight_digits() -> Result<()> {
    let program = compile("{n} = as_number({n}) + 1")?;
    let context = RuntimeContext::default();

    let output = program.transform(&record(&[("n", "1234567890123456789012345677")]), &context)?;
    assert_eq!(output.get("n"), Some("1234567890123456789012345678"));

    let err = program
        .transform(&record(&[("n", "123456789012345678901234567890")]), &context)
        .unwrap_err();
    assert!(err.to_string().contains("does not fit a decimal of 28 significant digits"));
    Ok(())
}

#[test]
fn test_rule_file_from_disk() -> Result<()> {
    let program = compile_file(data_path("categorize.edict"))?;
    let context = RuntimeContext::default();

    let coffee = program.transform(
        &record(&[("date", "03/02/2024"), ("payee", "Corner COFFEE"), ("amount", "-4.50")]),
        &context,
    )?;
    assert_eq!(
        coffee.iter().collect::<Vec<_>>(),
        vec![
            ("date", "2024-02-03"),
            ("payee", "Corner COFFEE"),
            ("amount", "4.50"),
            ("category", "expenses:food"),
        ]
    );

    let large = program.transform(
        &record(&[("date", "01/03/2024"), ("payee", "Landlord"), ("amount", "-1,150.00")]),
        &context,
    )?;
    assert_eq!(large.get("category"), Some("expenses:large"));
    assert_eq!(large.get("note"), Some("over 100 by 1050.00"));

    let bakery = program.transform(
        &record(&[("date", "02/03/2024"), ("payee", "Bakery Smith"), ("amount", "-3")]),
        &context,
    )?;
    assert_eq!(bakery.get("category"), Some("expenses:food"));

    assert_eq!(
        program.fields(&["date", "payee", "amount"]),
        vec!["date", "payee", "amount", "category", "note"]
    );
    Ok(())
}

#[test]
fn test_file_import_resolves_relative_to_importer() -> Result<()> {
    let program = compile_file(data_path("with_import.edict"))?;
    let context = RuntimeContext::new("csv", "pattern");

    let output = program.transform(&record(&[("payee", "Two  Spaces")]), &context)?;

    assert_eq!(output.get("payee"), Some("Two Spaces"));
    assert_eq!(output.get("label"), Some("Two Spaces via csv"));
    assert_eq!(program.fields(&["payee"]), vec!["payee", "source", "label"]);
    Ok(())
}

#[test]
fn test_import_cycle_on_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("a.edict"), "import(\"b.edict\")")?;
    std::fs::write(dir.path().join("b.edict"), "import(\"a.edict\")")?;

    let err = compile_file(dir.path().join("a.edict")).unwrap_err();
    let mut cause: &dyn std::error::Error = &err;
    while let Some(next) = cause.source() {
        cause = next;
    }
    assert!(cause.to_string().contains("import cycle"));
    Ok(())
}
