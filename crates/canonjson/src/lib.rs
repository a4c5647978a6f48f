//! Canonical JSON serialization: a deterministic, byte-exact encoding in
//! which semantically equal values always produce identical bytes.
//!
//! Ordinary JSON leaves whitespace, member order, number formatting, and
//! string escaping up to the emitter, which breaks byte equality for
//! content addressing, signing, and diffable records. This crate pins all
//! four down:
//!
//! - no whitespace; object members sorted bytewise on their encoded keys
//! - integral numbers as plain digits, everything else in normalized
//!   `2.5E-2` form derived from the shortest round-trip decimal
//! - strings escape only what JSON syntax forbids; ill-formed UTF-8 is
//!   coerced to U+FFFD
//!
//! [`to_vec`] is the one-shot entry point; [`Encoder`] streams a sequence
//! of values to a sink, one per line. Inputs are [`Value`] trees,
//! convertible from `serde_json::Value`; composite record types declare a
//! static [`Shape`] so field tags, embedding, and key conflicts resolve
//! the same way on every run.
#![deny(missing_docs)]

/// Canonical walker and one-shot marshal entry points.
mod encode;
/// Error taxonomy.
mod errors;
/// Canonical number formatting.
mod numbers;
/// Object member ordering and emission.
mod objects;
/// Field plans for record shapes.
mod plan;
/// Emission buffer free-list.
mod pool;
/// Streaming encoder.
mod stream;
/// Canonical string formatting.
mod strings;
/// The tagged value model and marshal capabilities.
mod value;

pub use encode::{to_string, to_vec, to_writer};
pub use errors::Error;
pub use stream::Encoder;
pub use value::{
    FieldDef, FieldKind, HookError, MarshalJson, MarshalText, RawJson, Record, Shape, Value,
};
