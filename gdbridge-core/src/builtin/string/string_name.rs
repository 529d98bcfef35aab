/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::builtin::macros::opaque_builtin;
use crate::builtin::GString;
use crate::sys;
use sys::types::OpaqueStringName;
use sys::{interface_fn, GodotFfi, VariantType};

/// Interned engine string, used for class, method, property and signal names.
#[repr(transparent)]
pub struct StringName {
    opaque: OpaqueStringName,
}

impl StringName {
    fn from_opaque(opaque: OpaqueStringName) -> Self {
        Self { opaque }
    }

    #[doc(hidden)]
    pub fn string_sys(&self) -> sys::GDExtensionStringNamePtr {
        self.sys()
    }

    /// Borrows an engine `StringName` passed into a callback.
    ///
    /// # Safety
    /// `ptr` must point to a live `StringName` outliving `'a`.
    #[doc(hidden)]
    pub unsafe fn borrow_string_sys<'a>(ptr: sys::GDExtensionConstStringNamePtr) -> &'a StringName {
        &*(ptr as *const StringName)
    }
}

opaque_builtin!(StringName => VariantType::StringName, OpaqueStringName);

impl Default for StringName {
    fn default() -> Self {
        // SAFETY: the default constructor initializes an empty name.
        unsafe {
            Self::new_with_uninit(|dst| sys::builtin_lifecycle_api().construct_default(VariantType::StringName, dst))
        }
    }
}

impl From<&str> for StringName {
    fn from(s: &str) -> Self {
        // SAFETY: `s` is valid UTF-8 of the given byte length.
        unsafe {
            Self::new_with_uninit(|dst| {
                interface_fn!(string_name_new_with_utf8_chars_and_len)(
                    dst,
                    s.as_ptr() as *const std::ffi::c_char,
                    sys::conv::usize_to_int(s.len()),
                )
            })
        }
    }
}

impl From<&GString> for StringName {
    fn from(s: &GString) -> Self {
        // SAFETY: constructor 2 of StringName takes one String.
        unsafe {
            Self::new_with_uninit(|dst| {
                sys::builtin_lifecycle_api().construct_with(VariantType::StringName, 2, dst, &[s.sys_const()])
            })
        }
    }
}

impl PartialEq for StringName {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for StringName {}

impl Hash for StringName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state)
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", GString::from(self))
    }
}

impl fmt::Debug for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{:?}", self.to_string())
    }
}
