/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Generational arena holding extension instances, indexed by the token the engine hands back on upcalls.

use parking_lot::RwLock;

use crate::sys;

/// Identifies an arena slot and the generation of its occupant.
///
/// Tokens of removed entries stay stale forever: the slot's generation moves on when it is reused.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct InstanceToken {
    index: u32,
    generation: u32,
}

impl InstanceToken {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Encodes the token as the instance pointer given to the engine. Never null.
    pub fn to_sys(self) -> sys::GDExtensionClassInstancePtr {
        let packed = (u64::from(self.generation) << 32) | (u64::from(self.index) + 1);
        packed as usize as sys::GDExtensionClassInstancePtr
    }

    /// Decodes an instance pointer produced by [`to_sys()`](Self::to_sys); `None` for null.
    pub fn from_sys(ptr: sys::GDExtensionClassInstancePtr) -> Option<Self> {
        let packed = ptr as usize as u64;
        let low = packed & u64::from(u32::MAX);
        if low == 0 {
            return None;
        }

        Some(Self {
            index: (low - 1) as u32,
            generation: (packed >> 32) as u32,
        })
    }
}

struct Slot<V> {
    generation: u32,
    value: Option<V>,
}

struct Slots<V> {
    slots: Vec<Slot<V>>,
    free: Vec<u32>,
    len: usize,
}

/// Pool of values addressed by [`InstanceToken`].
///
/// Values are handed out by clone (typically `Arc`), so no lock is held while the caller works with them.
pub struct Arena<V> {
    inner: RwLock<Slots<V>>,
}

impl<V: Clone> Arena<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Slots {
                slots: Vec::new(),
                free: Vec::new(),
                len: 0,
            }),
        }
    }

    /// Stores the value built by `make`, which receives the token it will be stored under.
    pub fn insert_with(&self, make: impl FnOnce(InstanceToken) -> V) -> InstanceToken {
        let mut inner = self.inner.write();

        let index = match inner.free.pop() {
            Some(index) => index,
            None => {
                inner.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                (inner.slots.len() - 1) as u32
            }
        };

        let slot = &mut inner.slots[index as usize];
        let token = InstanceToken::new(index, slot.generation);
        slot.value = Some(make(token));
        inner.len += 1;

        token
    }

    /// Returns the value stored under `token`, or `None` if it was removed.
    pub fn get(&self, token: InstanceToken) -> Option<V> {
        let inner = self.inner.read();
        let slot = inner.slots.get(token.index as usize)?;

        if slot.generation == token.generation {
            slot.value.clone()
        } else {
            None
        }
    }

    /// Removes and returns the value under `token`. Stale tokens remove nothing.
    pub fn remove(&self, token: InstanceToken) -> Option<V> {
        let mut inner = self.inner.write();
        let slot = inner.slots.get_mut(token.index as usize)?;

        if slot.generation != token.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(token.index);
        inner.len -= 1;

        Some(value)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for Arena<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_sys_encoding() {
        let token = InstanceToken::new(0, 0);
        assert!(!token.to_sys().is_null());
        assert_eq!(InstanceToken::from_sys(token.to_sys()), Some(token));

        let token = InstanceToken::new(41, 7);
        assert_eq!(InstanceToken::from_sys(token.to_sys()), Some(token));
        assert_eq!(InstanceToken::from_sys(std::ptr::null_mut()), None);
    }

    #[test]
    fn removed_tokens_go_stale() {
        let arena = Arena::new();
        let first = arena.insert_with(|token| (token, "first"));
        assert_eq!(arena.get(first), Some((first, "first")));

        assert_eq!(arena.remove(first).map(|(_, v)| v), Some("first"));
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.remove(first), None);

        // Slot is reused with a new generation.
        let second = arena.insert_with(|token| (token, "second"));
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn len_tracks_live_values() {
        let arena = Arena::new();
        let tokens: Vec<_> = (0..5).map(|i| arena.insert_with(|_| i)).collect();
        assert_eq!(arena.len(), 5);

        arena.remove(tokens[1]);
        arena.remove(tokens[3]);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.get(tokens[4]), Some(4));
    }

    proptest::proptest! {
        // `Some(i)` removes the i-th token handed out so far, `None` inserts.
        #[test]
        fn arena_matches_model(ops in proptest::collection::vec(proptest::option::of(0usize..32), 0..64)) {
            let arena = Arena::new();
            let mut issued = Vec::new();
            let mut live = std::collections::HashMap::new();

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    None => {
                        let token = arena.insert_with(|_| step);
                        issued.push(token);
                        live.insert(token, step);
                    }
                    Some(i) if i < issued.len() => {
                        let token = issued[i];
                        proptest::prop_assert_eq!(arena.remove(token), live.remove(&token));
                    }
                    Some(_) => {}
                }

                proptest::prop_assert_eq!(arena.len(), live.len());
            }

            for token in issued {
                proptest::prop_assert_eq!(arena.get(token), live.get(&token).copied());
            }
        }
    }
}
