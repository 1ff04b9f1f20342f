use std::collections::BTreeMap;

use super::model::FieldKey;

/// Per-field validation messages. An absent key and an empty message both
/// mean the field has no error.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldErrors(BTreeMap<FieldKey, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `key`. Empty messages are dropped so that rule
    /// helpers returning `""` for "valid" can be pushed unconditionally.
    pub fn push(&mut self, key: FieldKey, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() {
            return;
        }
        self.0.insert(key, message);
    }

    pub fn with(mut self, key: FieldKey, message: impl Into<String>) -> Self {
        self.push(key, message);
        self
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.0
            .iter()
            .find(|(candidate, _)| candidate.as_str() == key)
            .map(|(_, message)| message.as_str())
            .filter(|message| !message.is_empty())
    }

    pub(crate) fn set(&mut self, key: FieldKey, message: String) {
        self.0.insert(key, message);
    }

    pub(crate) fn remove(&mut self, key: FieldKey) -> Option<String> {
        self.0.remove(&key)
    }

    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.get(key).is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.0.values().any(|message| !message.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.values().filter(|message| !message.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_errors()
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> + '_ {
        self.0
            .iter()
            .filter(|(_, message)| !message.is_empty())
            .map(|(key, message)| (*key, message.as_str()))
    }

    pub fn first(&self) -> Option<(FieldKey, &str)> {
        self.iter().next()
    }
}

impl FromIterator<(FieldKey, String)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (FieldKey, String)>>(iter: I) -> Self {
        let mut errors = FieldErrors::new();
        for (key, message) in iter {
            errors.push(key, message);
        }
        errors
    }
}

impl<const N: usize> From<[(FieldKey, &str); N]> for FieldErrors {
    fn from(entries: [(FieldKey, &str); N]) -> Self {
        entries
            .into_iter()
            .map(|(key, message)| (key, message.to_string()))
            .collect()
    }
}
