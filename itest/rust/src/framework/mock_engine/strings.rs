/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_char;

use gdbridge::sys;
use sys::VariantType;

use super::values::{read_string, write_typed, Value};

/// Empty for null or zero-length input, which the C side may pass as a dangling pointer.
unsafe fn units<'a, U>(ptr: *const U, len: sys::GDExtensionInt) -> &'a [U] {
    match usize::try_from(len) {
        Ok(len) if len > 0 && !ptr.is_null() => std::slice::from_raw_parts(ptr, len),
        _ => &[],
    }
}

/// Copies `units` into the caller's buffer (if any) and returns the full length, so callers can size a second pass.
unsafe fn copy_out<U: Copy>(units: &[U], buf: *mut U, max: sys::GDExtensionInt) -> sys::GDExtensionInt {
    if !buf.is_null() {
        let count = units.len().min(usize::try_from(max).unwrap_or(0));
        std::ptr::copy_nonoverlapping(units.as_ptr(), buf, count);
    }
    units.len() as sys::GDExtensionInt
}

pub unsafe extern "C" fn string_new_with_utf8_chars_and_len(
    r_dest: sys::GDExtensionUninitializedStringPtr,
    contents: *const c_char,
    size: sys::GDExtensionInt,
) {
    let text = String::from_utf8_lossy(units(contents as *const u8, size)).into_owned();
    write_typed(VariantType::String, r_dest, Value::String(text));
}

pub unsafe extern "C" fn string_new_with_utf16_chars_and_len(
    r_dest: sys::GDExtensionUninitializedStringPtr,
    contents: *const u16,
    char_count: sys::GDExtensionInt,
) {
    let text = String::from_utf16_lossy(units(contents, char_count));
    write_typed(VariantType::String, r_dest, Value::String(text));
}

pub unsafe extern "C" fn string_new_with_utf32_chars_and_len(
    r_dest: sys::GDExtensionUninitializedStringPtr,
    contents: *const u32,
    char_count: sys::GDExtensionInt,
) {
    let text: String = units(contents, char_count)
        .iter()
        .map(|&c| char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    write_typed(VariantType::String, r_dest, Value::String(text));
}

pub unsafe extern "C" fn string_to_utf8_chars(
    p_self: sys::GDExtensionConstStringPtr,
    r_text: *mut c_char,
    max: sys::GDExtensionInt,
) -> sys::GDExtensionInt {
    let text = read_string(p_self);
    copy_out(text.as_bytes(), r_text as *mut u8, max)
}

pub unsafe extern "C" fn string_to_utf16_chars(
    p_self: sys::GDExtensionConstStringPtr,
    r_text: *mut u16,
    max: sys::GDExtensionInt,
) -> sys::GDExtensionInt {
    let units: Vec<u16> = read_string(p_self).encode_utf16().collect();
    copy_out(&units, r_text, max)
}

pub unsafe extern "C" fn string_to_utf32_chars(
    p_self: sys::GDExtensionConstStringPtr,
    r_text: *mut u32,
    max: sys::GDExtensionInt,
) -> sys::GDExtensionInt {
    let chars: Vec<u32> = read_string(p_self).chars().map(u32::from).collect();
    copy_out(&chars, r_text, max)
}

pub unsafe extern "C" fn string_name_new_with_utf8_chars_and_len(
    r_dest: sys::GDExtensionUninitializedStringNamePtr,
    contents: *const c_char,
    size: sys::GDExtensionInt,
) {
    let text = String::from_utf8_lossy(units(contents as *const u8, size)).into_owned();
    write_typed(VariantType::StringName, r_dest, Value::StringName(text));
}
