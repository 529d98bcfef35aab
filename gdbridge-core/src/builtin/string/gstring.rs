/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::macros::opaque_builtin;
use crate::builtin::{builtin_call, NodePath, StringName};
use crate::sys;
use sys::types::OpaqueString;
use sys::{interface_fn, GodotFfi, StringEncoding, VariantType};

/// The engine's reference-counted string.
///
/// Internally UTF-32. The bridge offers UTF-8 and UTF-16 views; [`preferred_view()`](Self::preferred_view) picks the one
/// selected by the `variant_string_encoding` option.
#[repr(transparent)]
pub struct GString {
    opaque: OpaqueString,
}

/// Text of a [`GString`] in one of the two host encodings.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum StringView {
    Utf8(String),
    Utf16(Vec<u16>),
}

impl GString {
    /// Construct a new empty `GString`.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_opaque(opaque: OpaqueString) -> Self {
        Self { opaque }
    }

    /// Number of characters (code points).
    pub fn len(&self) -> usize {
        // SAFETY: `length` takes no arguments and returns int.
        let len: i64 = unsafe { builtin_call(VariantType::String, "length", self.sys(), |_| {}) };
        sys::conv::int_to_usize(len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_utf16(units: &[u16]) -> Self {
        // SAFETY: the engine constructs the string from `units.len()` UTF-16 code units.
        unsafe {
            Self::new_with_uninit(|dst| {
                interface_fn!(string_new_with_utf16_chars_and_len)(
                    dst,
                    units.as_ptr(),
                    sys::conv::usize_to_int(units.len()),
                )
            })
        }
    }

    pub fn from_chars(chars: &[char]) -> Self {
        // SAFETY: char has the layout of u32, and every value is a valid code point.
        unsafe {
            Self::new_with_uninit(|dst| {
                interface_fn!(string_new_with_utf32_chars_and_len)(
                    dst,
                    chars.as_ptr() as *const u32,
                    sys::conv::usize_to_int(chars.len()),
                )
            })
        }
    }

    /// UTF-8 view of the string.
    pub fn to_utf8(&self) -> String {
        let bytes = self.read_units::<u8>(|ptr, len| {
            // SAFETY: `ptr` is null (length query) or points to `len` writable bytes.
            unsafe { interface_fn!(string_to_utf8_chars)(self.sys_const(), ptr as *mut std::ffi::c_char, len) }
        });

        String::from_utf8(bytes).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
    }

    /// UTF-16 view of the string.
    pub fn to_utf16(&self) -> Vec<u16> {
        self.read_units(|ptr, len| {
            // SAFETY: see to_utf8().
            unsafe { interface_fn!(string_to_utf16_chars)(self.sys_const(), ptr, len) }
        })
    }

    /// Code points of the string.
    pub fn chars(&self) -> Vec<char> {
        let units: Vec<u32> = self.read_units(|ptr, len| {
            // SAFETY: see to_utf8().
            unsafe { interface_fn!(string_to_utf32_chars)(self.sys_const(), ptr, len) }
        });

        units
            .into_iter()
            .map(|c| char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    /// Text in the encoding chosen at initialization.
    pub fn preferred_view(&self) -> StringView {
        match sys::config().variant_string_encoding {
            StringEncoding::Utf8 => StringView::Utf8(self.to_utf8()),
            StringEncoding::Utf16 => StringView::Utf16(self.to_utf16()),
        }
    }

    // Two-pass read: the engine reports the length for a null buffer, then fills the buffer.
    fn read_units<U: Copy + Default>(&self, read: impl Fn(*mut U, sys::GDExtensionInt) -> sys::GDExtensionInt) -> Vec<U> {
        let len = sys::conv::int_to_usize(read(std::ptr::null_mut(), 0));

        let mut buf = vec![U::default(); len];
        let written = read(buf.as_mut_ptr(), sys::conv::usize_to_int(len));
        buf.truncate(sys::conv::int_to_usize(written));
        buf
    }

    #[doc(hidden)]
    pub fn string_sys(&self) -> sys::GDExtensionStringPtr {
        self.sys()
    }
}

opaque_builtin!(GString => VariantType::String, OpaqueString);

impl Default for GString {
    fn default() -> Self {
        // SAFETY: the default constructor initializes an empty string.
        unsafe {
            Self::new_with_uninit(|dst| sys::builtin_lifecycle_api().construct_default(VariantType::String, dst))
        }
    }
}

impl From<&str> for GString {
    fn from(s: &str) -> Self {
        // SAFETY: `s` is valid UTF-8 of the given byte length.
        unsafe {
            Self::new_with_uninit(|dst| {
                interface_fn!(string_new_with_utf8_chars_and_len)(
                    dst,
                    s.as_ptr() as *const std::ffi::c_char,
                    sys::conv::usize_to_int(s.len()),
                )
            })
        }
    }
}

impl From<&String> for GString {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<String> for GString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&StringName> for GString {
    fn from(name: &StringName) -> Self {
        // SAFETY: constructor 2 of String takes one StringName.
        unsafe {
            Self::new_with_uninit(|dst| {
                sys::builtin_lifecycle_api().construct_with(VariantType::String, 2, dst, &[name.sys_const()])
            })
        }
    }
}

impl From<&NodePath> for GString {
    fn from(path: &NodePath) -> Self {
        // SAFETY: constructor 3 of String takes one NodePath.
        unsafe {
            Self::new_with_uninit(|dst| {
                sys::builtin_lifecycle_api().construct_with(VariantType::String, 3, dst, &[path.sys_const()])
            })
        }
    }
}

impl PartialEq for GString {
    fn eq(&self, other: &Self) -> bool {
        self.chars() == other.chars()
    }
}

impl Eq for GString {}

impl PartialEq<&str> for GString {
    fn eq(&self, other: &&str) -> bool {
        self.to_utf8() == *other
    }
}

impl fmt::Display for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_utf8())
    }
}

impl fmt::Debug for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GString({:?})", self.to_utf8())
    }
}
