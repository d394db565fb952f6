//! Snapshot comparator: decides whether two documents are the same for
//! persistence purposes.
//!
//! Documents are compared through their canonical JSON form. Object keys are
//! ordered, so construction order never matters; arrays keep their order, so
//! reordering a list is a real edit. Numbers compare by value: `1`, `1.0` and
//! `-0.0`/`0.0` collapse to one representation.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// The document has no JSON shape (e.g. a map with non-string keys). This is a
/// bug in the document type or its mutators, not a runtime condition.
#[derive(Debug, Error)]
#[error("document cannot be snapshotted: {0}")]
pub struct SnapshotError(#[from] serde_json::Error);

/// Canonical form of a document at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Value);

impl Snapshot {
    pub fn capture<D: Serialize + ?Sized>(document: &D) -> Result<Self, SnapshotError> {
        let value = serde_json::to_value(document)?;
        Ok(Self(canonicalize(value)))
    }

    /// Canonical encoding; equal snapshots encode to identical bytes.
    #[cfg(test)]
    pub fn encode(&self) -> String {
        self.0.to_string()
    }
}

/// Structural equality of two documents.
pub fn equal<D: Serialize + ?Sized>(a: &D, b: &D) -> Result<bool, SnapshotError> {
    Ok(Snapshot::capture(a)? == Snapshot::capture(b)?)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(normalize_number(n)),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect::<Map<String, Value>>())
        }
        other => other,
    }
}

/// 2^63 and 2^64: the first integral floats outside `i64` and `u64`.
const I64_END: f64 = 9_223_372_036_854_775_808.0;
const U64_END: f64 = 18_446_744_073_709_551_616.0;

/// Integral floats become integers whenever an integer type holds them
/// exactly, so `2^60` and `2^60 as f64` compare equal.
fn normalize_number(n: Number) -> Number {
    if !n.is_f64() {
        return n;
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => Number::from(0),
        Some(f) if f.fract() == 0.0 && (-I64_END..I64_END).contains(&f) => {
            Number::from(f as i64)
        }
        Some(f) if f.fract() == 0.0 && (0.0..U64_END).contains(&f) => Number::from(f as u64),
        _ => n,
    }
}
