//! Fixed route encoding
//!
//! The categorical route encoding is learned at training time and shipped in
//! the artifact manifest as an ordered label list; a label's position is its
//! numeric code. It is loaded once with the model and never re-fitted from
//! request data.

use anyhow::{bail, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RouteEncoder {
    index: HashMap<String, usize>,
}

impl RouteEncoder {
    /// Build from training-time labels; duplicates are rejected
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = HashMap::new();
        for (i, label) in labels.into_iter().map(Into::<String>::into).enumerate() {
            if index.contains_key(&label) {
                bail!("Duplicate route label {:?} in encoding table", label);
            }
            index.insert(label, i);
        }
        Ok(Self { index })
    }

    pub fn encode(&self, route_id: &str) -> Option<usize> {
        self.index.get(route_id).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
