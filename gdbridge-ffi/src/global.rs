/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

/// Lazily initialized global with mutable access.
///
/// Usable in `static` items thanks to its `const` constructor. The initialization function runs on first [`lock()`](Self::lock),
/// and again after [`take()`](Self::take) reset the value, which is how per-session state is cleared on deinitialization.
pub struct Global<T> {
    value: Mutex<Option<T>>,
    init_fn: fn() -> T,
}

/// Guard that temporarily gives access to a `Global<T>`'s inner value.
pub type GlobalGuard<'a, T> = MappedMutexGuard<'a, T>;

impl<T> Global<T> {
    /// Create `Global<T>`, providing a lazy initialization function.
    pub const fn new(init_fn: fn() -> T) -> Self {
        Self {
            value: parking_lot::const_mutex(None),
            init_fn,
        }
    }

    /// Create `Global<T>` with `T::default()` as initialization function.
    ///
    /// Inherent rather than the `Default` trait, because the latter is not `const`.
    pub const fn default() -> Self
    where
        T: Default,
    {
        Self::new(T::default)
    }

    /// Returns a guard that gives shared or mutable access to the value, initializing it if necessary.
    ///
    /// Blocks until the internal mutex is available. Not re-entrant: locking again on the same thread deadlocks.
    pub fn lock(&self) -> GlobalGuard<'_, T> {
        let init_fn = self.init_fn;
        MutexGuard::map(self.value.lock(), |slot| slot.get_or_insert_with(init_fn))
    }

    /// Removes the current value, so that the next [`lock()`](Self::lock) re-initializes.
    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    static MAP: Global<HashMap<i32, &'static str>> = Global::default();
    static VEC: Global<Vec<i32>> = Global::new(|| vec![1, 2, 3]);
    static RESET: Global<Vec<i32>> = Global::new(|| vec![0]);

    #[test]
    fn test_global_map() {
        {
            let mut map = MAP.lock();
            map.insert(2, "two");
            map.insert(3, "three");
        }

        MAP.lock().insert(1, "one");

        let map = MAP.lock();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(&"one"));
        assert_eq!(map.get(&3), Some(&"three"));
    }

    #[test]
    fn test_global_vec() {
        VEC.lock().push(4);

        let vec = VEC.lock();
        assert_eq!(*vec, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_global_take_reinitializes() {
        RESET.lock().push(9);
        assert_eq!(RESET.take(), Some(vec![0, 9]));
        assert_eq!(*RESET.lock(), vec![0]);
    }
}
