use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracespec_core::model::span::ObservedTrace;
use tracespec_core::model::spec::TraceSpecification;
use tracespec_core::query::StatusResponse;

/// Keyed map the façade resolves trace ids and spec names against.
///
/// Inserting an existing key replaces the previous value and returns it.
pub trait KeyedStore<V>: Send + Sync {
    fn insert(&self, key: String, value: V) -> Option<V>;
    fn get(&self, key: &str) -> Option<V>;
    /// All values ordered by key.
    fn values(&self) -> Vec<V>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct MemoryStore<V> {
    inner: RwLock<BTreeMap<String, V>>,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<V> KeyedStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync,
{
    fn insert(&self, key: String, value: V) -> Option<V> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value)
    }

    fn get(&self, key: &str) -> Option<V> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn values(&self) -> Vec<V> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub type TraceBackend = Arc<dyn KeyedStore<ObservedTrace>>;
pub type SpecBackend = Arc<dyn KeyedStore<TraceSpecification>>;

#[derive(Clone)]
pub struct Store {
    pub(crate) traces: TraceBackend,
    pub(crate) specs: SpecBackend,
}

impl Store {
    pub fn in_memory() -> Self {
        Self::with_backends(
            Arc::new(MemoryStore::default()),
            Arc::new(MemoryStore::default()),
        )
    }

    pub fn with_backends(traces: TraceBackend, specs: SpecBackend) -> Self {
        Self { traces, specs }
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            traces_count: self.traces.len(),
            specs_count: self.specs.len(),
        }
    }
}
