//! The canonical value walker and the one-shot marshal entry points.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::Error;
use crate::objects::{self, Member};
use crate::plan::{self, FieldPlan};
use crate::value::{Record, Value};
use crate::{numbers, pool, strings};

/// Serializes a value to its canonical encoding.
///
/// On error nothing is returned; the emission buffer is discarded, never
/// handed back partially filled.
pub fn to_vec(value: &Value) -> Result<Vec<u8>, Error> {
    let mut buf = pool::acquire();
    let result = append_value(&mut buf, value);
    let encoded = result.map(|()| buf.clone());
    pool::release(buf);
    encoded
}

/// Serializes a value to a canonical string.
pub fn to_string(value: &Value) -> Result<String, Error> {
    let bytes = to_vec(value)?;
    Ok(String::from_utf8(bytes).expect("canonical output is UTF-8"))
}

/// Serializes a value and writes the canonical bytes to `writer`.
pub fn to_writer<W: Write>(mut writer: W, value: &Value) -> Result<(), Error> {
    let bytes = to_vec(value)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Appends the canonical encoding of `value`. Capability variants take
/// precedence over structural dispatch; within the structural shapes,
/// composite branches funnel their members through the object emitter.
///
/// Recursion is synchronous and unbounded; a cyclic input does not
/// terminate.
pub(crate) fn append_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), Error> {
    match value {
        Value::Raw(raw) => {
            if raw.0.is_empty() {
                buf.extend_from_slice(b"null");
            } else {
                buf.extend_from_slice(&raw.0);
            }
        }
        Value::Custom { type_name, hook } => {
            let type_name = *type_name;
            let fragment = hook.marshal_json().map_err(|source| Error::Marshaler {
                type_name,
                source,
            })?;
            if fragment.is_empty() {
                return Err(Error::Marshaler {
                    type_name,
                    source: "hook returned an empty fragment".into(),
                });
            }
            buf.extend_from_slice(&fragment);
        }
        Value::Text { type_name, hook } => {
            let type_name = *type_name;
            let text = hook.marshal_text().map_err(|source| Error::Marshaler {
                type_name,
                source,
            })?;
            strings::append_string(buf, &text);
        }
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Int(v) => numbers::append_int(buf, *v),
        Value::Uint(v) => numbers::append_uint(buf, *v),
        Value::Float(v) => numbers::append_float(buf, *v)?,
        Value::Number(literal) => numbers::append_literal(buf, literal)?,
        Value::String(text) => strings::append_string(buf, text.as_bytes()),
        Value::Bytes(bytes) => {
            buf.push(b'"');
            buf.extend_from_slice(STANDARD.encode(bytes).as_bytes());
            buf.push(b'"');
        }
        Value::Array(items) => {
            buf.push(b'[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    buf.push(b',');
                }
                append_value(buf, item)?;
            }
            buf.push(b']');
        }
        Value::Map(entries) => append_map(buf, entries)?,
        Value::Record(record) => append_record(buf, record)?,
    }
    Ok(())
}

/// Encodes each entry into isolated sub-buffers and defers ordering to the
/// object emitter.
fn append_map(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), Error> {
    let mut members = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let Value::String(key) = key else {
            return Err(Error::UnsupportedType(format!(
                "map keyed by {}",
                key.kind()
            )));
        };
        let mut key_bytes = Vec::with_capacity(key.len() + 2);
        strings::append_string(&mut key_bytes, key.as_bytes());
        let mut value_bytes = Vec::new();
        append_value(&mut value_bytes, value)?;
        members.push(Member {
            key: key_bytes,
            value: value_bytes,
        });
    }
    objects::append_object(buf, members)
}

fn append_record(buf: &mut Vec<u8>, record: &Record) -> Result<(), Error> {
    let plans = plan::plan_for(record.shape());
    let mut members = Vec::with_capacity(plans.len());
    for field in plans.iter() {
        let Some(value) = field_value(record, field)? else {
            continue;
        };
        if field.omit_empty && value.is_empty() {
            continue;
        }
        let mut key_bytes = Vec::with_capacity(field.key.len() + 2);
        strings::append_string(&mut key_bytes, field.key.as_bytes());
        let mut value_bytes = Vec::new();
        if field.quote && value.is_quotable() {
            let mut inner = Vec::new();
            append_value(&mut inner, value)?;
            strings::append_string(&mut value_bytes, &inner);
        } else {
            append_value(&mut value_bytes, value)?;
        }
        members.push(Member {
            key: key_bytes,
            value: value_bytes,
        });
    }
    objects::append_object(buf, members)
}

/// Walks a plan's index path through embedded aggregates. `None` means
/// the field is unreachable through an absent aggregate and is skipped.
fn field_value<'a>(record: &'a Record, field: &FieldPlan) -> Result<Option<&'a Value>, Error> {
    let mut current = record;
    let (last, through) = field
        .path
        .split_last()
        .expect("field plans carry a non-empty path");
    for &index in through {
        match current.values.get(index) {
            Some(Value::Record(inner)) => current = inner,
            Some(Value::Null) => return Ok(None),
            Some(other) => {
                return Err(Error::UnsupportedValue(format!(
                    "record {} holds {} where its shape declares an embedded record",
                    current.shape().name,
                    other.kind()
                )));
            }
            None => return Err(arity_error(current)),
        }
    }
    match current.values.get(*last) {
        Some(value) => Ok(Some(value)),
        None => Err(arity_error(current)),
    }
}

fn arity_error(record: &Record) -> Error {
    Error::UnsupportedValue(format!(
        "record {} carries {} values but its shape declares {} fields",
        record.shape().name,
        record.values.len(),
        record.shape().fields.len()
    ))
}
