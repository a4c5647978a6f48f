//! The tagged value model accepted by the canonical walker, plus the
//! marshal capabilities a value can carry.

use std::fmt;

/// Error type returned by marshal hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Capability for values that produce a pre-formed JSON fragment.
///
/// The fragment must be well-formed JSON; the walker emits it verbatim
/// without recanonicalization, so the implementor vouches for its
/// canonical form.
pub trait MarshalJson: fmt::Debug {
    /// Returns the JSON fragment for this value.
    fn marshal_json(&self) -> Result<Vec<u8>, HookError>;
}

/// Capability for values that produce bytes to be emitted as a JSON
/// string, with UTF-8 coercion and escaping applied.
pub trait MarshalText: fmt::Debug {
    /// Returns the text bytes for this value.
    fn marshal_text(&self) -> Result<Vec<u8>, HookError>;
}

/// Pre-encoded JSON carried through the walker verbatim.
///
/// The caller vouches for canonicalness. Empty bytes emit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawJson(
    /// The pre-encoded fragment.
    pub Vec<u8>,
);

impl From<Vec<u8>> for RawJson {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for RawJson {
    fn from(fragment: &str) -> Self {
        Self(fragment.as_bytes().to_vec())
    }
}

/// Whether a record field holds a plain value or an embedded aggregate.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Ordinary named field.
    Plain,
    /// Embedded aggregate; when the tag supplies no key name, its fields
    /// are hoisted into the enclosing record.
    Embedded(&'static Shape),
}

/// Static description of one record field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Source field name, used as the output key when the tag names none.
    pub name: &'static str,
    /// Tag in the `name,option,...` micro-grammar. `-` excludes the field;
    /// recognised options are `omitempty` and `string`.
    pub tag: &'static str,
    /// Plain or embedded.
    pub kind: FieldKind,
}

/// Static description of a composite record type.
///
/// Shapes are declared as `static` items; the address of the static is the
/// type identity under which the flattened field plan is cached for the
/// lifetime of the process.
#[derive(Debug)]
pub struct Shape {
    /// Type name used in diagnostics.
    pub name: &'static str,
    /// Declared fields in source order.
    pub fields: &'static [FieldDef],
}

/// A composite record value: a shape plus field values in declaration
/// order. Embedded fields hold `Value::Record` (or `Value::Null` for an
/// absent aggregate).
#[derive(Debug)]
pub struct Record {
    pub(crate) shape: &'static Shape,
    pub(crate) values: Vec<Value>,
}

impl Record {
    /// Pairs a shape with its field values, given in declaration order.
    pub fn new(shape: &'static Shape, values: Vec<Value>) -> Self {
        Self { shape, values }
    }

    /// The record's shape.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }
}

/// A marshallable value: the tagged sum over every shape the canonical
/// walker accepts.
#[derive(Debug)]
pub enum Value {
    /// JSON `null`; also stands in for absent references and nil blobs.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Binary floating point, at most double precision.
    Float(f64),
    /// Arbitrary-precision decimal literal; must parse as a JSON number.
    Number(String),
    /// Text string.
    String(String),
    /// Untyped byte blob, emitted as a base64 JSON string.
    Bytes(Vec<u8>),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Mapping; keys must be `Value::String`.
    Map(Vec<(Value, Value)>),
    /// Composite record with static shape metadata.
    Record(Record),
    /// Pre-encoded JSON emitted verbatim.
    Raw(RawJson),
    /// Value with the custom-marshal capability.
    Custom {
        /// Originating type name, carried into [`crate::Error::Marshaler`].
        type_name: &'static str,
        /// The hook producing the JSON fragment.
        hook: Box<dyn MarshalJson>,
    },
    /// Value with the text-marshal capability.
    Text {
        /// Originating type name, carried into [`crate::Error::Marshaler`].
        type_name: &'static str,
        /// The hook producing the string bytes.
        hook: Box<dyn MarshalText>,
    },
}

impl Value {
    /// Wraps a custom-marshal hook, recording its type name for
    /// diagnostics.
    pub fn custom<T: MarshalJson + 'static>(hook: T) -> Self {
        Value::Custom {
            type_name: std::any::type_name::<T>(),
            hook: Box::new(hook),
        }
    }

    /// Wraps a text-marshal hook, recording its type name for diagnostics.
    pub fn text<T: MarshalText + 'static>(hook: T) -> Self {
        Value::Text {
            type_name: std::any::type_name::<T>(),
            hook: Box::new(hook),
        }
    }

    /// Wraps a byte blob.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// Wraps a decimal literal.
    pub fn number(literal: impl Into<String>) -> Self {
        Value::Number(literal.into())
    }

    /// Short shape description for diagnostics.
    pub(crate) fn kind(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "boolean".into(),
            Value::Int(_) => "integer".into(),
            Value::Uint(_) => "unsigned integer".into(),
            Value::Float(_) => "float".into(),
            Value::Number(_) => "number literal".into(),
            Value::String(_) => "string".into(),
            Value::Bytes(_) => "bytes".into(),
            Value::Array(_) => "array".into(),
            Value::Map(_) => "map".into(),
            Value::Record(record) => format!("record {}", record.shape.name),
            Value::Raw(_) => "raw JSON".into(),
            Value::Custom { type_name, .. } => format!("custom marshaler {type_name}"),
            Value::Text { type_name, .. } => format!("text marshaler {type_name}"),
        }
    }

    /// Emptiness for `omitempty`: false, numeric zero, null, or a
    /// zero-length string, literal, blob, sequence, or mapping. Records
    /// are never empty.
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(v) => !v,
            Value::Int(v) => *v == 0,
            Value::Uint(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Number(literal) => literal.is_empty(),
            Value::String(text) => text.is_empty(),
            Value::Bytes(bytes) => bytes.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            Value::Raw(raw) => raw.0.is_empty(),
            Value::Record(_) | Value::Custom { .. } | Value::Text { .. } => false,
        }
    }

    /// Whether the `string` field option applies to this shape.
    pub(crate) fn is_quotable(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::Uint(_)
                | Value::Float(_)
                | Value::Number(_)
                | Value::String(_)
        )
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Uint(v as u64)
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        // widening to f64 would grow the shortest representation, so a
        // finite f32 travels as its own shortest decimal
        if v.is_finite() {
            Value::Number(ryu::Buffer::new().format_finite(v).to_string())
        } else {
            Value::Float(f64::from(v))
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<RawJson> for Value {
    fn from(v: RawJson) -> Self {
        Value::Raw(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::from_number(&n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (Value::String(key), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::from_number(n),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(key, value)| (Value::String(key.clone()), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Value {
    fn from_number(n: &serde_json::Number) -> Self {
        if let Some(v) = n.as_i64() {
            Value::Int(v)
        } else if let Some(v) = n.as_u64() {
            Value::Uint(v)
        } else {
            // a finite f64; its serde_json rendering is already a valid
            // JSON number lexeme
            Value::Number(n.to_string())
        }
    }
}
