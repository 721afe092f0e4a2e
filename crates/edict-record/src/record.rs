//! Record type

use indexmap::IndexMap;

/// A single row: field names mapped to string values, in field order.
///
/// Overwriting an existing field keeps its position; new fields are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: IndexMap<String, String>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Set a field, returning the previous value if there was one
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(field.into(), value.into())
    }

    /// Remove a field, keeping the order of the remaining fields
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.values.shift_remove(field)
    }

    /// Check whether the record has the given field
    pub fn contains_field(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(field, value)` pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Build a new record holding exactly `fields`, in that order.
    ///
    /// Fields missing from this record are skipped.
    pub fn select<S: AsRef<str>>(&self, fields: &[S]) -> Record {
        fields
            .iter()
            .filter_map(|field| {
                let field = field.as_ref();
                self.get(field).map(|value| (field.to_string(), value.to_string()))
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Record {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position_of_existing_field() {
        let mut record: Record = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(record.insert("a", "3"), Some("1".to_string()));
        record.insert("c", "4");

        let names: Vec<_> = record.field_names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(record.get("a"), Some("3"));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut record: Record = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        record.remove("a");
        let names: Vec<_> = record.field_names().collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_select_orders_and_drops() {
        let record: Record = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let selected = record.select(&["c", "missing", "a"]);

        let pairs: Vec<_> = selected.iter().collect();
        assert_eq!(pairs, vec![("c", "3"), ("a", "1")]);
    }

    #[test]
    fn test_missing_field() {
        let record = Record::new();
        assert!(record.get("nope").is_none());
        assert!(record.is_empty());
    }
}
