// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A keyed cache that owns the handles stored in it.

use std::collections::HashMap;
use std::hash::Hash;

/// A create-or-overwrite cache of backend handles, keyed by a small enum.
///
/// `H::default()` is the null handle: [`Registry::get`] returns it on a miss, and callers
/// treat it as "not yet created". The registry never destroys anything itself; the owner
/// drains it with [`Registry::destroy_all`] during teardown.
#[derive(Debug)]
pub struct Registry<K, H> {
    entries: HashMap<K, H>,
    order: Vec<K>,
}

impl<K, H> Default for Registry<K, H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K, H> Registry<K, H>
where
    K: Copy + Eq + Hash,
    H: Copy + Default + PartialEq,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handle` under `key`, returning the handle it replaced, if any.
    ///
    /// The caller owns the returned handle and must destroy it.
    pub fn add(&mut self, key: K, handle: H) -> Option<H> {
        let previous = self.entries.insert(key, handle);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    /// Returns the handle stored under `key`, or the null handle on a miss.
    pub fn get(&self, key: K) -> H {
        self.entries.get(&key).copied().unwrap_or_default()
    }

    /// Returns `true` if a non-null handle is stored under `key`.
    pub fn contains(&self, key: K) -> bool {
        self.get(key) != H::default()
    }

    /// Returns the stored handle, creating and storing it first if the slot is null.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        create: impl FnOnce() -> Result<H, E>,
    ) -> Result<H, E> {
        let existing = self.get(key);
        if existing != H::default() {
            return Ok(existing);
        }
        let handle = create()?;
        self.add(key, handle);
        Ok(handle)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry, yielding them in reverse insertion order.
    pub fn drain(&mut self) -> Vec<(K, H)> {
        let mut drained = Vec::with_capacity(self.order.len());
        for key in self.order.drain(..).rev() {
            if let Some(handle) = self.entries.remove(&key) {
                drained.push((key, handle));
            }
        }
        drained
    }

    /// Drains the registry, handing each handle to `destroy` in reverse insertion order.
    pub fn destroy_all(&mut self, mut destroy: impl FnMut(K, H)) {
        for (key, handle) in self.drain() {
            destroy(key, handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        A,
        B,
    }

    #[test]
    fn test_miss_returns_null_handle() {
        let reg: Registry<Key, u64> = Registry::new();
        assert_eq!(reg.get(Key::A), 0);
        assert!(!reg.contains(Key::A));
    }

    #[test]
    fn test_add_overwrites_and_returns_previous() {
        let mut reg = Registry::new();
        assert_eq!(reg.add(Key::A, 7u64), None);
        assert_eq!(reg.add(Key::A, 9u64), Some(7));
        assert_eq!(reg.get(Key::A), 9);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_create_or_fetch_creates_once() {
        let mut reg: Registry<Key, u64> = Registry::new();
        let mut calls = 0;
        for _ in 0..3 {
            let h = reg
                .get_or_try_insert_with::<()>(Key::B, || {
                    calls += 1;
                    Ok(42)
                })
                .unwrap();
            assert_eq!(h, 42);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_failed_creation_leaves_slot_empty() {
        let mut reg: Registry<Key, u64> = Registry::new();
        assert!(reg.get_or_try_insert_with(Key::A, || Err("boom")).is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_drain_is_reverse_insertion_order() {
        let mut reg = Registry::new();
        reg.add(Key::A, 1u64);
        reg.add(Key::B, 2u64);
        assert_eq!(reg.drain(), vec![(Key::B, 2), (Key::A, 1)]);
        assert!(reg.is_empty());
        assert_eq!(reg.get(Key::A), 0);
    }

    #[test]
    fn test_destroy_all_visits_every_handle_once() {
        let mut reg = Registry::new();
        reg.add(Key::A, 1u64);
        reg.add(Key::B, 2u64);
        let mut destroyed = Vec::new();
        reg.destroy_all(|_, h| destroyed.push(h));
        assert_eq!(destroyed, vec![2, 1]);
        assert!(!reg.contains(Key::B));
    }
}
