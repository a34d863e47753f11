//! Records of values produced during training.
//!
//! ```rust
//! use deepq_core::record::{Record, RecordValue};
//!
//! let record = Record::from_slice(&[
//!     ("loss", RecordValue::Scalar(0.5)),
//!     ("n_updates", RecordValue::Scalar(10.0)),
//! ]);
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
//! ```
use crate::error::DqnError;
use std::collections::HashMap;

/// Possible types of values in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, typically a metric like loss.
    Scalar(f32),
}

/// A set of named values.
#[derive(Debug)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates a record from key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Gets the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Gets a scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, DqnError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            None => Err(DqnError::RecordKeyError(k.to_string())),
        }
    }
}
