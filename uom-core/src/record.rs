//! Records of diagnostics from the learning loop.
//!
//! A [`Record`] is a key-value map the agent fills with per-episode
//! statistics. It is purely observational: no learning rule reads it
//! back, and dropping every record leaves the learned operators
//! unchanged.
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// A single floating-point value, typically a metric.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array of floating-point values.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

/// A key-value store of diagnostics.
#[derive(Debug)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<'_, String, RecordValue> {
        self.0.keys()
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Merges the entries of another record into this one.
    pub fn merge(mut self, other: Record) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Gets a scalar value by key.
    pub fn get_scalar(&self, k: &str) -> Option<f32> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    /// Gets a 1-dimensional array by key.
    pub fn get_array1(&self, k: &str) -> Option<&[f32]> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Gets a string value by key.
    pub fn get_string(&self, k: &str) -> Option<&str> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, RecordValue};

    #[test]
    fn test_insert_and_get() {
        let mut record = Record::from_scalar("episode_return", 1.5);
        record.insert("steps", RecordValue::Scalar(10.0));
        assert_eq!(record.get_scalar("episode_return"), Some(1.5));
        assert_eq!(record.get_scalar("steps"), Some(10.0));
        assert_eq!(record.get_scalar("missing"), None);
    }

    #[test]
    fn test_merge() {
        let r1 = Record::from_scalar("a", 1.0);
        let r2 = Record::from_scalar("b", 2.0);
        let merged = r1.merge(r2);
        assert_eq!(merged.get_scalar("a"), Some(1.0));
        assert_eq!(merged.get_scalar("b"), Some(2.0));
    }
}
