//! Ordered field sets

use indexmap::IndexSet;

/// A set of field names that remembers insertion order.
///
/// Equality ignores order, so two sets holding the same names compare equal.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    names: IndexSet<String>,
}

impl FieldSet {
    /// Create an empty field set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; returns `false` if it was already present
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Check whether a field is present
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Remove every field
    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over names in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Consume the set into an ordered list of names
    pub fn into_vec(self) -> Vec<String> {
        self.names.into_iter().collect()
    }
}

impl PartialEq for FieldSet {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for FieldSet {}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for FieldSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &FieldSet) -> Vec<&str> {
        set.iter().collect()
    }

    #[test]
    fn test_empty() {
        let set = FieldSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(names(&set), Vec::<&str>::new());
    }

    #[test]
    fn test_insert_keeps_first_position() {
        let mut set: FieldSet = ["b"].into_iter().collect();
        assert!(set.insert("c"));
        assert!(!set.insert("c"));
        assert!(!set.insert("b"));
        assert_eq!(names(&set), vec!["b", "c"]);
    }

    #[test]
    fn test_equality_ignores_order() {
        let left: FieldSet = ["a", "b"].into_iter().collect();
        let right: FieldSet = ["b", "a"].into_iter().collect();
        assert_eq!(left, right);

        let other: FieldSet = ["a"].into_iter().collect();
        assert_ne!(left, other);
    }

    #[test]
    fn test_extend_appends_new_names() {
        let mut set: FieldSet = ["c", "b", "a"].into_iter().collect();
        set.extend(["b", "c", "d"]);
        assert_eq!(names(&set), vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_clear_then_reuse() {
        let mut set: FieldSet = ["a", "b"].into_iter().collect();
        set.clear();
        assert!(set.is_empty());
        set.extend(["b", "c"]);
        assert_eq!(set.into_vec(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_contains() {
        let set: FieldSet = ["x"].into_iter().collect();
        assert!(set.contains("x"));
        assert!(!set.contains("y"));
    }
}
