//! Per-endpoint tallies.

use std::collections::HashMap;

use crate::error::Result;
use crate::metric::ledger::Merge;
use crate::request::{RequestRecord, UNKNOWN_ENDPOINT};

/// Numeric state one metric kind keeps per endpoint.
pub trait Tally: Clone + Default + Send + 'static {
    /// Contribution of a single finished request.
    /// Fails without side effects when the record lacks a needed attribute.
    fn sample(record: &RequestRecord) -> Result<Self>;

    /// Add another tally into this one.
    fn absorb(&mut self, other: &Self);

    /// Reported statistic (raw count, ratio or mean).
    fn value(&self) -> f64;
}

/// Endpoint identifier -> tally. Buckets are created on first write.
#[derive(Debug, Clone)]
pub struct EndpointTable<T> {
    buckets: HashMap<String, T>,
}

impl<T: Tally> Default for EndpointTable<T> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }
}

impl<T: Tally> EndpointTable<T> {
    /// Table with the `"other"` bucket pre-seeded at zero.
    pub fn seeded() -> Self {
        let mut buckets = HashMap::new();
        buckets.insert(UNKNOWN_ENDPOINT.to_string(), T::default());
        Self { buckets }
    }

    pub fn add(&mut self, endpoint: &str, delta: &T) {
        match self.buckets.get_mut(endpoint) {
            Some(t) => t.absorb(delta),
            None => {
                self.buckets.insert(endpoint.to_string(), delta.clone());
            }
        }
    }

    /// Hand out the current contents and keep every known endpoint at zero.
    pub fn rotate(&mut self) -> Self {
        let zeroed = self
            .buckets
            .keys()
            .map(|k| (k.clone(), T::default()))
            .collect();
        Self {
            buckets: std::mem::replace(&mut self.buckets, zeroed),
        }
    }

    pub fn get(&self, endpoint: &str) -> Option<&T> {
        self.buckets.get(endpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Tally summed across all endpoints.
    pub fn overall(&self) -> T {
        let mut acc = T::default();
        for t in self.buckets.values() {
            acc.absorb(t);
        }
        acc
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<T: Tally> Merge for EndpointTable<T> {
    fn merge(&mut self, other: &Self) {
        for (endpoint, t) in &other.buckets {
            self.add(endpoint, t);
        }
    }
}
