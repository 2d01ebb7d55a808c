
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use crate::vectors::Vector;

/// Concurrent mapping from a key to a shared, interior-mutable vector.
///
/// Lookups hand out `Arc`s so no map shard stays locked while a vector is
/// being updated; updates to the vector itself are unsynchronized.
#[derive(Debug)]
pub struct VectorStore<K: Eq + Hash, V> {
    vectors: DashMap<K, Arc<V>>,
}

impl<K: Eq + Hash, V> Default for VectorStore<K, V> {
    fn default() -> Self {
        Self { vectors: DashMap::new() }
    }
}

impl<K, V> VectorStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Vector,
{

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.vectors.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.vectors.contains_key(key)
    }

    pub fn insert(&self, key: K, vector: V) {
        self.vectors.insert(key, Arc::new(vector));
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.vectors.remove(key).map(|(_, vector)| vector)
    }

    /// Returns the stored vector, creating it with `create` on first sight.
    /// Concurrent first sightings agree on a single vector.
    pub fn get_or_insert_with<F>(&self, key: K, create: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        // fast path avoids taking the shard write lock
        if let Some(entry) = self.vectors.get(&key) {
            return Arc::clone(entry.value());
        }
        let entry = self.vectors.entry(key).or_insert_with(|| Arc::new(create()));
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn keys(&self) -> Vec<K> {
        self.vectors.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn entries(&self) -> Vec<(K, Arc<V>)> {
        self.vectors.iter()
        .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
        .collect()
    }

    pub fn normalize_all(&self) {
        for entry in self.vectors.iter() {
            entry.value().normalize();
        }
    }
}

pub type TermStore<V> = VectorStore<String, V>;
pub type DocumentStore<V> = VectorStore<usize, V>;
