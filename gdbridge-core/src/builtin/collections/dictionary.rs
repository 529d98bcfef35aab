/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::marker::PhantomData;

use crate::builtin::*;
use crate::log::godot_error;
use crate::meta::error::ConvertError;
use crate::meta::{FromGodot, GodotConvert, GodotType, ToGodot};
use crate::sys;
use sys::types::OpaqueDictionary;
use sys::{interface_fn, GodotFfi, VariantType};

/// Proxy over an engine `Dictionary`.
///
/// Keys and values are stored as variants by the engine; `K` and `V` are the types this view converts to on access.
/// Clones share the engine dictionary.
pub struct Dictionary<K: ArrayElement = Variant, V: ArrayElement = Variant> {
    opaque: OpaqueDictionary,
    _phantom: PhantomData<(K, V)>,
}

impl<K: ArrayElement, V: ArrayElement> Dictionary<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_opaque(opaque: OpaqueDictionary) -> Self {
        Self {
            opaque,
            _phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        // SAFETY: `size` takes no arguments and returns int.
        let len: i64 = unsafe { builtin_call(VariantType::Dictionary, "size", self.sys(), |_| {}) };
        sys::conv::int_to_usize(len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value for `key`, or `None` if absent or not convertible to `V`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_variant(&key.to_variant())
            .and_then(|value| V::try_from_variant(&value).ok())
    }

    fn get_variant(&self, key: &Variant) -> Option<Variant> {
        // SAFETY: the engine returns a pointer to the stored value, or null if the key is absent.
        unsafe {
            let ptr = interface_fn!(dictionary_operator_index_const)(self.sys_const(), key.var_sys_const());
            sys::ptr_then(ptr, |ptr| Variant::borrow_var_sys(ptr).clone())
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let key = key.to_variant();

        // SAFETY: `has` takes one Variant and returns bool.
        unsafe {
            builtin_call(VariantType::Dictionary, "has", self.sys(), |frame| {
                frame.arg(&key);
            })
        }
    }

    /// Inserts or overwrites `key`, returning the previous value if it converts to `V`.
    pub fn insert(&mut self, key: &K, value: &V) -> Option<V> {
        let key = key.to_variant();
        let previous = self.get_variant(&key);

        // SAFETY: the mutable index operator inserts a nil slot for new keys and returns it.
        unsafe {
            let ptr = interface_fn!(dictionary_operator_index)(self.sys_mut(), key.var_sys_const());
            if ptr.is_null() {
                godot_error!("engine refused to insert key {key} into dictionary");
                return None;
            }
            *Variant::borrow_var_sys_mut(ptr) = value.to_variant();
        }

        previous.and_then(|value| V::try_from_variant(&value).ok())
    }

    /// Removes `key`, returning its value if present and convertible to `V`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let key = key.to_variant();
        let previous = self.get_variant(&key)?;

        // SAFETY: `erase` takes one Variant and returns bool.
        let _erased: bool = unsafe {
            builtin_call(VariantType::Dictionary, "erase", self.sys_mut(), |frame| {
                frame.arg(&key);
            })
        };

        V::try_from_variant(&previous).ok()
    }

    /// Keys in engine order (insertion order).
    pub fn keys(&self) -> Array<K> {
        // SAFETY: `keys` takes no arguments and returns Array.
        unsafe { builtin_call(VariantType::Dictionary, "keys", self.sys(), |_| {}) }
    }

    pub fn clear(&mut self) {
        // SAFETY: `clear` takes no arguments and returns nothing.
        unsafe { builtin_call::<()>(VariantType::Dictionary, "clear", self.sys_mut(), |_| {}) }
    }

    /// Lazy iterator over `(key, value)` pairs.
    ///
    /// Takes a snapshot of the keys; each step looks up one value. Entries whose key or value does not convert are skipped.
    pub fn iter(&self) -> DictionaryIter<'_, K, V> {
        DictionaryIter {
            dictionary: self,
            keys: self.keys(),
            next: 0,
        }
    }
}

// SAFETY: layout is the engine's Dictionary handle; copies and destruction go through the engine.
unsafe impl<K: ArrayElement, V: ArrayElement> GodotFfi for Dictionary<K, V> {
    const VARIANT_TYPE: VariantType = VariantType::Dictionary;

    sys::ffi_methods! { type Opaque = OpaqueDictionary; }
}

impl<K: ArrayElement, V: ArrayElement> GodotType for Dictionary<K, V> {}

impl<K: ArrayElement, V: ArrayElement> GodotConvert for Dictionary<K, V> {
    type Via = Self;
}

impl<K: ArrayElement, V: ArrayElement> ToGodot for Dictionary<K, V> {
    fn to_godot(&self) -> Self::Via {
        self.clone()
    }
}

impl<K: ArrayElement, V: ArrayElement> FromGodot for Dictionary<K, V> {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }
}

impl<'a, K: ArrayElement, V: ArrayElement> sys::FrameArg<'a> for &'a Dictionary<K, V> {
    fn push_into(self, frame: &mut sys::CallFrame<'a>) {
        // SAFETY: the borrow keeps the dictionary alive for the frame's lifetime.
        unsafe { frame.push_sys(self.sys_const()) }
    }
}

impl<K: ArrayElement, V: ArrayElement> Default for Dictionary<K, V> {
    fn default() -> Self {
        // SAFETY: the default constructor initializes an empty dictionary.
        unsafe {
            Self::new_with_uninit(|dst| sys::builtin_lifecycle_api().construct_default(VariantType::Dictionary, dst))
        }
    }
}

impl<K: ArrayElement, V: ArrayElement> Clone for Dictionary<K, V> {
    fn clone(&self) -> Self {
        // SAFETY: self is a live dictionary.
        unsafe { Self::new_from_sys(self.sys_const()) }
    }
}

impl<K: ArrayElement, V: ArrayElement> Drop for Dictionary<K, V> {
    fn drop(&mut self) {
        // SAFETY: self is live and not used afterwards.
        unsafe { sys::builtin_lifecycle_api().destroy(VariantType::Dictionary, self.sys_mut()) }
    }
}

impl<K: ArrayElement, V: ArrayElement> PartialEq for Dictionary<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.to_variant() == other.to_variant()
    }
}

impl<K: ArrayElement, V: ArrayElement> fmt::Debug for Dictionary<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_variant())
    }
}

impl<K: ArrayElement, V: ArrayElement> FromIterator<(K, V)> for Dictionary<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dictionary = Self::new();
        for (key, value) in iter {
            dictionary.insert(&key, &value);
        }
        dictionary
    }
}

/// Iterator over a [`Dictionary`], see [`Dictionary::iter()`].
pub struct DictionaryIter<'a, K: ArrayElement, V: ArrayElement> {
    dictionary: &'a Dictionary<K, V>,
    keys: Array<K>,
    next: usize,
}

impl<K: ArrayElement, V: ArrayElement> Iterator for DictionaryIter<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        while self.next < self.keys.len() {
            let index = self.next;
            self.next += 1;

            let Some(key) = self.keys.get(index) else {
                continue;
            };
            if let Some(value) = self.dictionary.get(&key) {
                return Some((key, value));
            }
        }

        None
    }
}
