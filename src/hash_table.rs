//! Open-addressed bucket-to-linked-index multimap (spec §4.1, component C1).
//!
//! `HashTable` does not store keys or values itself — it stores, per bucket,
//! the head of a singly linked list threaded through a flat `next` array
//! indexed by the caller's own payload index. Concurrent insertion is
//! lock-free: the only shared-memory write is an atomic exchange on the
//! bucket head (spec §5 "Shared resources").

use crate::contract::contract;
use std::sync::atomic::{AtomicU32, Ordering};

/// Sentinel marking the end of a bucket chain (`~0u32` in the spec).
pub const SENTINEL: u32 = u32::MAX;

/// Open-addressed bucket-to-linked-index multimap over 32-bit keys.
pub struct HashTable {
    hash_mask: u32,
    heads: Vec<AtomicU32>,
    next: Vec<AtomicU32>,
}

impl HashTable {
    /// `hash_size` must be a power of two and non-zero (spec §4.1 Failure).
    /// `index_size` is the anticipated number of payload indices; `Add`
    /// grows past it on demand.
    pub fn new(hash_size: u32, index_size: u32) -> Self {
        contract!(hash_size > 0, "hash_size must be non-zero");
        contract!(hash_size.is_power_of_two(), "hash_size must be a power of two");

        let heads = (0..hash_size).map(|_| AtomicU32::new(SENTINEL)).collect();
        let next = (0..index_size).map(|_| AtomicU32::new(SENTINEL)).collect();

        Self {
            hash_mask: hash_size - 1,
            heads,
            next,
        }
    }

    pub fn hash_size(&self) -> u32 {
        self.heads.len() as u32
    }

    pub fn index_size(&self) -> u32 {
        self.next.len() as u32
    }

    fn bucket(&self, key: u32) -> usize {
        (key & self.hash_mask) as usize
    }

    /// Returns the head of the bucket chain for `key`, or [`SENTINEL`].
    pub fn first(&self, key: u32) -> u32 {
        self.heads[self.bucket(key)].load(Ordering::Acquire)
    }

    /// Returns the next index in the chain after `i`. Self-loops are a
    /// contract violation (spec §7 `SelfLoop`): they would turn a
    /// traversal into an infinite loop.
    pub fn next(&self, i: u32) -> u32 {
        contract!((i as usize) < self.next.len(), "Next(i) with i out of range");
        let n = self.next[i as usize].load(Ordering::Acquire);
        contract!(n != i, "hash table chain must not self-loop");
        n
    }

    pub fn is_valid(i: u32) -> bool {
        i != SENTINEL
    }

    /// Single-threaded head-insert: grows `next` to fit `i` if needed, then
    /// links `i` in front of its bucket's chain.
    pub fn add(&mut self, key: u32, i: u32) {
        if i as usize >= self.next.len() {
            let new_len = (i as usize + 1).max(32).next_power_of_two();
            log::trace!("HashTable::add growing index array to {new_len}");
            self.next.resize_with(new_len, || AtomicU32::new(SENTINEL));
        }

        let bucket = self.bucket(key);
        let prior = self.heads[bucket].load(Ordering::Relaxed);
        self.next[i as usize].store(prior, Ordering::Relaxed);
        self.heads[bucket].store(i, Ordering::Relaxed);
    }

    /// Lock-free head-insert via atomic exchange. `i` must already be within
    /// `index_size` (no concurrent resize, spec §4.1). Safe to call from
    /// many threads concurrently provided every `i` is distinct, since each
    /// thread only ever writes its own `next[i]` slot.
    pub fn add_concurrent(&self, key: u32, i: u32) {
        contract!((i as usize) < self.next.len(), "AddConcurrent requires i < index_size");
        let bucket = self.bucket(key);
        let prior = self.heads[bucket].swap(i, Ordering::AcqRel);
        self.next[i as usize].store(prior, Ordering::Release);
    }

    /// Unlinks `(key, i)`; a no-op if `i` is not present in its bucket.
    pub fn remove(&mut self, key: u32, i: u32) {
        if i as usize >= self.next.len() {
            return;
        }
        let bucket = self.bucket(key);
        let head = self.heads[bucket].load(Ordering::Relaxed);
        if head == i {
            let n = self.next[i as usize].load(Ordering::Relaxed);
            self.heads[bucket].store(n, Ordering::Relaxed);
            return;
        }

        let mut cur = head;
        while Self::is_valid(cur) {
            let n = self.next[cur as usize].load(Ordering::Relaxed);
            if n == i {
                let after = self.next[i as usize].load(Ordering::Relaxed);
                self.next[cur as usize].store(after, Ordering::Relaxed);
                return;
            }
            cur = n;
        }
    }

    /// Resets every bucket head to [`SENTINEL`] in O(H).
    pub fn clear(&mut self) {
        for head in &self.heads {
            head.store(SENTINEL, Ordering::Relaxed);
        }
    }

    /// Iterates the chain reachable from `first(key)`.
    pub fn iter_bucket(&self, key: u32) -> HashTableIter<'_> {
        HashTableIter {
            table: self,
            cur: self.first(key),
        }
    }
}

pub struct HashTableIter<'a> {
    table: &'a HashTable,
    cur: u32,
}

impl<'a> Iterator for HashTableIter<'a> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if !HashTable::is_valid(self.cur) {
            return None;
        }
        let cur = self.cur;
        self.cur = self.table.next(cur);
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two_size() {
        HashTable::new(3, 8);
    }

    #[test]
    #[should_panic]
    fn rejects_zero_size() {
        HashTable::new(0, 8);
    }

    #[test]
    fn round_trip_single_threaded() {
        let mut table = HashTable::new(16, 0);
        let keys: Vec<u32> = (0..100).map(|i| i * 7 + 3).collect();
        for (i, &k) in keys.iter().enumerate() {
            table.add(k, i as u32);
        }

        // Property 9: for every key, the set of indices reachable from
        // First(k) equals the set of i with matching bucket.
        for probe_key in 0..16u32 {
            let expected: HashSet<u32> = keys
                .iter()
                .enumerate()
                .filter(|(_, &k)| k & 15 == probe_key & 15)
                .map(|(i, _)| i as u32)
                .collect();
            let actual: HashSet<u32> = table.iter_bucket(probe_key).collect();
            assert_eq!(actual, expected, "bucket {probe_key}");
        }
    }

    #[test]
    fn remove_unlinks_and_is_silent_on_missing() {
        let mut table = HashTable::new(8, 4);
        table.add(1, 0);
        table.add(1, 1);
        table.add(1, 2);
        table.remove(1, 1);
        let remaining: Vec<u32> = table.iter_bucket(1).collect();
        assert_eq!(remaining, vec![2, 0]);

        // removing again, or an index never added, is silent
        table.remove(1, 1);
        table.remove(99, 999);
    }

    #[test]
    fn clear_empties_every_bucket() {
        let mut table = HashTable::new(8, 4);
        table.add(3, 0);
        table.clear();
        assert_eq!(table.first(3), SENTINEL);
    }

    #[test]
    fn concurrent_insertion_is_linearizable_per_bucket() {
        let table = Arc::new(HashTable::new(64, 2000));
        let mut handles = vec![];
        for t in 0..8u32 {
            let table = Arc::clone(&table);
            handles.push(thread::spawn(move || {
                for j in 0..250u32 {
                    let i = t * 250 + j;
                    table.add_concurrent(i % 64, i);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let mut all_seen: Vec<u32> = (0..64).flat_map(|k| table.iter_bucket(k).collect::<Vec<_>>()).collect();
        all_seen.sort_unstable();
        let expected: Vec<u32> = (0..2000).collect();
        assert_eq!(all_seen, expected);
    }
}
