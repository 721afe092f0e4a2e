//! Protocol argument loading
//!
//! Arguments come from an optional JSON file holding a flat object, then from
//! repeated `-a KEY=VALUE` flags. Flags override file entries with the same key.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use edict_record::ProtocolArgs;
use serde::Deserialize;

/// A scalar JSON value accepted as a protocol argument
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArgValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl ArgValue {
    fn into_string(self) -> String {
        match self {
            ArgValue::Text(text) => text,
            ArgValue::Number(number) => number.to_string(),
            ArgValue::Flag(flag) => flag.to_string(),
        }
    }
}

/// Parse one `KEY=VALUE` flag; the value may itself contain `=`
pub fn parse_key_value(text: &str) -> Result<(String, String)> {
    let Some((key, value)) = text.split_once('=') else {
        bail!("expected KEY=VALUE, got {text:?}");
    };
    if key.is_empty() {
        bail!("empty key in {text:?}");
    }
    Ok((key.to_string(), value.to_string()))
}

/// Read a JSON object of scalar values
pub fn read_args_file(path: &Path) -> Result<ProtocolArgs> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open args file '{}'", path.display()))?;
    let values: BTreeMap<String, ArgValue> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| {
            format!(
                "Args file '{}' must hold a JSON object of string, number or boolean values",
                path.display()
            )
        })?;
    Ok(values
        .into_iter()
        .map(|(key, value)| (key, value.into_string()))
        .collect())
}

/// Merge the args file (if any) with command-line pairs
pub fn protocol_args(file: Option<&Path>, pairs: &[(String, String)]) -> Result<ProtocolArgs> {
    let mut args = match file {
        Some(path) => read_args_file(path)?,
        None => ProtocolArgs::new(),
    };
    args.extend(pairs.iter().cloned());
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("pattern={a}={b}").unwrap(),
            ("pattern".to_string(), "{a}={b}".to_string())
        );
        assert_eq!(
            parse_key_value("delimiter=").unwrap(),
            ("delimiter".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_args_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"delimiter": ";", "pattern": "{{a}}", "width": 3, "strict": true}}"#)
            .unwrap();

        let pairs = vec![("delimiter".to_string(), "|".to_string())];
        let args = protocol_args(Some(file.path()), &pairs).unwrap();

        assert_eq!(args.get("delimiter"), Some("|"));
        assert_eq!(args.get("pattern"), Some("{a}"));
        assert_eq!(args.get("width"), Some("3"));
        assert_eq!(args.get("strict"), Some("true"));
    }

    #[test]
    fn test_args_file_rejects_nested_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pattern": ["a", "b"]}}"#).unwrap();

        let err = read_args_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("must hold a JSON object"));
    }

    #[test]
    fn test_missing_args_file() {
        let err = read_args_file(Path::new("/nonexistent/args.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open args file"));
    }
}
