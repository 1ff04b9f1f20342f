use std::fmt::{Display, Formatter};

use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl PartialEq<&str> for FieldKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Current value of one field: free text for most inputs, a flag for checkboxes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Flag(_) => FieldKind::Flag,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Text,
    Flag,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => f.write_str("text"),
            FieldKind::Flag => f.write_str("flag"),
        }
    }
}

/// The kind of input element that produced a change event.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum InputKind {
    #[default]
    Text,
    Email,
    Password,
    Number,
    Date,
    Select,
    TextArea,
    Checkbox,
}

impl InputKind {
    /// Converts a raw change event into the value stored for the field.
    /// Checkboxes store whether they are checked; every other input stores the raw text.
    pub fn coerce(self, raw: &str, checked: bool) -> FieldValue {
        match self {
            InputKind::Checkbox => FieldValue::Flag(checked),
            _ => FieldValue::Text(raw.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ApplyError {
    #[error("field is not part of this form")]
    UnknownField,
    #[error("field expects a {expected} value")]
    TypeMismatch { expected: FieldKind },
}

pub trait FieldType: Sized {
    const KIND: FieldKind;

    fn to_field_value(&self) -> FieldValue;
    fn from_field_value(value: FieldValue) -> Option<Self>;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(text) => Some(text),
            FieldValue::Flag(_) => None,
        }
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Flag;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Flag(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        value.as_flag()
    }
}

/// Typed access to a single field of a form model.
pub trait FieldLens<T>: Copy + Send + Sync + 'static {
    type Value: Clone + PartialEq + Send + Sync + 'static;

    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a Self::Value;
    fn set(self, model: &mut T, value: Self::Value);
}

/// A form's values. The set of field keys is fixed for the lifetime of a model:
/// `apply` may only overwrite existing fields.
pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    fn fields() -> Self::Fields;
    fn field_keys(&self) -> Vec<FieldKey>;
    fn value(&self, key: &str) -> Option<FieldValue>;
    fn apply(&mut self, key: &str, value: FieldValue) -> Result<(), ApplyError>;

    fn resolve_key(&self, key: &str) -> Option<FieldKey> {
        self.field_keys()
            .into_iter()
            .find(|candidate| candidate.as_str() == key)
    }

    fn text(&self, key: &str) -> String {
        self.value(key)
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Untyped form values for forms without a dedicated model struct.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormValues {
    entries: Vec<(FieldKey, FieldValue)>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.as_str() == key)
        {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((FieldKey::new(key), value)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FormModel for FormValues {
    type Fields = ();

    fn fields() -> Self::Fields {}

    fn field_keys(&self) -> Vec<FieldKey> {
        self.entries.iter().map(|(key, _)| *key).collect()
    }

    fn value(&self, key: &str) -> Option<FieldValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.as_str() == key)
            .map(|(_, value)| value.clone())
    }

    fn apply(&mut self, key: &str, value: FieldValue) -> Result<(), ApplyError> {
        let (_, slot) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.as_str() == key)
            .ok_or(ApplyError::UnknownField)?;
        if slot.kind() != value.kind() {
            return Err(ApplyError::TypeMismatch {
                expected: slot.kind(),
            });
        }
        *slot = value;
        Ok(())
    }
}
