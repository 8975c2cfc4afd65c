//! Field and FieldManager definitions

use serde::{Deserialize, Serialize};

/// Index of a field inside a [`FieldManager`]
pub type FieldId = usize;

/// Index of a value inside a [`Field`]
pub type ValueId = usize;

/// Errors raised while building fields
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Field has no values")]
    NoValues,

    #[error("Default value {default_value} out of range (field has {len} values)")]
    DefaultOutOfRange { default_value: ValueId, len: usize },
}

/// A configurable dimension: metadata plus an ordered list of values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawField<M, V>")]
pub struct Field<M, V> {
    /// Caller-defined metadata (label, category, ...)
    pub meta: M,
    default_value: ValueId,
    values: Vec<V>,
}

impl<M, V> Field<M, V> {
    /// Create a field, checking that the default indexes one of the values
    pub fn new(meta: M, default_value: ValueId, values: Vec<V>) -> Result<Self, FieldError> {
        if values.is_empty() {
            return Err(FieldError::NoValues);
        }
        if default_value >= values.len() {
            return Err(FieldError::DefaultOutOfRange {
                default_value,
                len: values.len(),
            });
        }

        Ok(Self {
            meta,
            default_value,
            values,
        })
    }

    /// Index of the value selected when a configurator starts
    pub fn default_value(&self) -> ValueId {
        self.default_value
    }

    /// All values in declaration order
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Resolve a value id
    pub fn value(&self, value_id: ValueId) -> Option<&V> {
        self.values.get(value_id)
    }
}

/// Unchecked serialized form; deserialization goes through [`Field::new`]
#[derive(Deserialize)]
struct RawField<M, V> {
    meta: M,
    default_value: ValueId,
    values: Vec<V>,
}

impl<M, V> TryFrom<RawField<M, V>> for Field<M, V> {
    type Error = FieldError;

    fn try_from(raw: RawField<M, V>) -> Result<Self, Self::Error> {
        Field::new(raw.meta, raw.default_value, raw.values)
    }
}

/// Immutable ordered collection of fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldManager<M, V> {
    fields: Vec<Field<M, V>>,
}

impl<M, V> FieldManager<M, V> {
    pub fn new(fields: Vec<Field<M, V>>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field<M, V>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get a field by id
    pub fn field(&self, field_id: FieldId) -> Option<&Field<M, V>> {
        self.fields.get(field_id)
    }

    /// Get the values of a field
    pub fn values(&self, field_id: FieldId) -> Option<&[V]> {
        self.field(field_id).map(Field::values)
    }

    /// Resolve a value of a field; `None` if either id is invalid
    pub fn value(&self, field_id: FieldId, value_id: ValueId) -> Option<&V> {
        self.field(field_id)?.value(value_id)
    }
}
