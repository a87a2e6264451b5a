//! Named, typed component fields
//!
//! Components declare the fields an editor or a scene file may set. Values
//! travel as [`FieldValue`] and whole sets are written in RON, e.g.
//!
//! ```ron
//! {
//!     "speed": Float(2.5),
//!     "axis": Vec3((0.0, 1.0, 0.0)),
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::scene::component::Component;

/// Kind of a component field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// `true` / `false`
    Bool,
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// UTF-8 string
    Text,
    /// Three-component vector
    Vec3,
}

/// Value of a component field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Text value
    Text(String),
    /// Vector value
    Vec3([f32; 3]),
}

impl FieldValue {
    /// Kind of this value
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::Int(_) => FieldKind::Int,
            Self::Float(_) => FieldKind::Float,
            Self::Text(_) => FieldKind::Text,
            Self::Vec3(_) => FieldKind::Vec3,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer payload
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Float payload; integers widen
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Vector payload
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3([x, y, z]) => Some(Vec3::new(*x, *y, *z)),
            _ => None,
        }
    }

    /// Convert to `kind`, allowing the integer to float widening only
    #[allow(clippy::cast_precision_loss)]
    fn coerce(self, kind: FieldKind) -> Option<Self> {
        match (self, kind) {
            (Self::Int(value), FieldKind::Float) => Some(Self::Float(value as f64)),
            (value, kind) if value.kind() == kind => Some(value),
            _ => None,
        }
    }
}

impl From<Vec3> for FieldValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3([value.x, value.y, value.z])
    }
}

/// Declaration of one configurable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name
    pub name: &'static str,
    /// Expected kind
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Create a descriptor
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Field access errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// The component declares no field with this name
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The value has the wrong kind
    #[error("Field '{field}' expects {expected:?}, got {found:?}")]
    KindMismatch {
        /// Field name
        field: String,
        /// Declared kind
        expected: FieldKind,
        /// Kind of the supplied value
        found: FieldKind,
    },

    /// The component rejected the value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason given by the component
        reason: String,
    },

    /// A field set could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Ordered collection of field assignments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeMap<String, FieldValue>);

impl FieldSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a RON map of field names to values
    pub fn from_ron(text: &str) -> Result<Self, FieldError> {
        ron::from_str(text).map_err(|e| FieldError::Parse(e.to_string()))
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, FieldError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| FieldError::Parse(e.to_string()))
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    /// Look up a value
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Number of assignments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate assignments in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Set one field after checking it against the component's declarations
pub fn set_checked(
    component: &mut dyn Component,
    name: &str,
    value: FieldValue,
) -> Result<(), FieldError> {
    let descriptor = component
        .fields()
        .into_iter()
        .find(|descriptor| descriptor.name == name)
        .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;

    let found = value.kind();
    let value = value.coerce(descriptor.kind).ok_or(FieldError::KindMismatch {
        field: name.to_string(),
        expected: descriptor.kind,
        found,
    })?;

    component.set_field(name, value)
}

/// Apply every assignment in `set`, stopping at the first failure
pub fn apply_fields(component: &mut dyn Component, set: &FieldSet) -> Result<(), FieldError> {
    for (name, value) in set.iter() {
        set_checked(component, name, value.clone())?;
    }
    Ok(())
}

/// Current value of every declared field
pub fn snapshot(component: &dyn Component) -> FieldSet {
    let mut set = FieldSet::new();
    for descriptor in component.fields() {
        if let Some(value) = component.field(descriptor.name) {
            set.insert(descriptor.name, value);
        }
    }
    set
}
