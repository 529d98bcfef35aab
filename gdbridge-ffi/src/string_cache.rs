/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use crate as sys;
use sys::types::OpaqueStringName;

/// Engine `StringName`s built from static keys, kept alive for the cache's lifetime.
///
/// Used while loading method tables, where the engine wants names but the bridge's `StringName` type is not yet usable.
pub struct StringCache<'a> {
    // Box for address stability: later insertions must not move earlier names.
    instances_by_str: HashMap<&'static str, Box<OpaqueStringName>>,
    interface: &'a sys::EngineInterface,
    builtin_lifecycle: &'a sys::BuiltinLifecycleTable,
}

impl<'a> StringCache<'a> {
    pub fn new(
        interface: &'a sys::EngineInterface,
        builtin_lifecycle: &'a sys::BuiltinLifecycleTable,
    ) -> Self {
        Self {
            instances_by_str: HashMap::new(),
            interface,
            builtin_lifecycle,
        }
    }

    /// Get a pointer to a `StringName`. Reuses cached instances, only deallocates on destruction of this cache.
    pub fn fetch(&mut self, key: &'static str) -> sys::GDExtensionStringNamePtr {
        if let Some(opaque_box) = self.instances_by_str.get_mut(key) {
            return opaque_box.as_mut_ptr();
        }

        let Some(construct) = self.interface.string_name_new_with_utf8_chars_and_len else {
            sys::abort_with("interface entry 'string_name_new_with_utf8_chars_and_len' is missing");
        };

        let mut opaque_box = Box::new(OpaqueStringName::zeroed());

        // SAFETY: destination is writable storage of StringName size; the engine placement-constructs into it.
        unsafe {
            construct(
                opaque_box.as_mut_ptr(),
                key.as_ptr() as *const std::ffi::c_char,
                key.len() as sys::GDExtensionInt,
            );
        }

        let sname_ptr = opaque_box.as_mut_ptr();
        self.instances_by_str.insert(key, opaque_box);
        sname_ptr
    }

    pub fn len(&self) -> usize {
        self.instances_by_str.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances_by_str.is_empty()
    }
}

/// Destroy all string names.
impl Drop for StringCache<'_> {
    fn drop(&mut self) {
        for (_, mut opaque_box) in self.instances_by_str.drain() {
            // SAFETY: every cached name was constructed by the engine in `fetch()`.
            unsafe {
                self.builtin_lifecycle
                    .destroy(sys::VariantType::StringName, opaque_box.as_mut_ptr());
            }
        }
    }
}
