//! A map over integer keys split into independently locked buckets.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;

/// Keys a [`ConcurrentMap`] can shard on.
pub trait IntegerKey: Copy + Ord + Send {
    /// `self mod bucket_count`, taken as the non-negative remainder so that
    /// negative keys land in the same bucket as `key + bucket_count`.
    fn bucket_index(self, bucket_count: usize) -> usize;
}

macro_rules! impl_integer_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntegerKey for $t {
                #[inline]
                fn bucket_index(self, bucket_count: usize) -> usize {
                    (self as i128).rem_euclid(bucket_count as i128) as usize
                }
            }
        )*
    };
}

impl_integer_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Exclusive handle to one value; the bucket stays locked until it is dropped.
pub type Access<'a, V> = MappedMutexGuard<'a, V>;

pub struct ConcurrentMap<K, V> {
    buckets: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K: IntegerKey, V> ConcurrentMap<K, V> {
    pub fn new(bucket_count: usize) -> Self {
        let buckets = (0..bucket_count.max(1))
            .map(|_| Mutex::new(BTreeMap::new()))
            .collect();
        Self { buckets }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket(&self, key: K) -> &Mutex<BTreeMap<K, V>> {
        &self.buckets[key.bucket_index(self.buckets.len())]
    }

    /// Lock the bucket owning `key` and hand out its value, inserting
    /// `V::default()` first if the key is absent.
    pub fn access(&self, key: K) -> Access<'_, V>
    where
        V: Default,
    {
        MutexGuard::map(self.bucket(key).lock(), |map| map.entry(key).or_default())
    }

    pub fn erase(&self, key: K) {
        self.bucket(key).lock().remove(&key);
    }

    /// Merge all buckets into one ordered map.
    ///
    /// Buckets are locked one after another, never together, so the result
    /// is consistent per bucket only. Writers racing with the merge may or
    /// may not be observed.
    pub fn snapshot(&self) -> BTreeMap<K, V>
    where
        V: Clone,
    {
        let mut result = BTreeMap::new();
        for bucket in &self.buckets {
            let guard = bucket.lock();
            result.extend(guard.iter().map(|(k, v)| (*k, v.clone())));
        }
        result
    }

    /// Like [`snapshot`](Self::snapshot), but moves the values out.
    pub fn into_ordinary_map(self) -> BTreeMap<K, V> {
        let mut result = BTreeMap::new();
        for bucket in self.buckets {
            result.append(&mut bucket.into_inner());
        }
        result
    }
}
