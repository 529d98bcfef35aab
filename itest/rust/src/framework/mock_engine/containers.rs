/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Index operators and builtin methods of strings, containers, callables and signals.

use std::ffi::{c_int, c_void};
use std::ptr;

use gdbridge::sys;
use sys::VariantType;

use super::callables;
use super::logging::engine_error;
use super::values::{
    keys_equal, read_string, read_typed, read_variant, write_typed, write_variant, ArrayData, DictionaryData,
    PackedData, Slot, Value,
};

unsafe fn array_of(ptr: *const c_void) -> Option<ArrayData> {
    match read_typed(VariantType::Array, ptr) {
        Value::Array(data) => Some(data),
        _ => None,
    }
}

unsafe fn dictionary_of(ptr: *const c_void) -> Option<DictionaryData> {
    match read_typed(VariantType::Dictionary, ptr) {
        Value::Dictionary(data) => Some(data),
        _ => None,
    }
}

/// Packed arrays are boxed per handle; elements are edited in place.
unsafe fn packed_mut<'a>(ptr: *mut c_void) -> Option<&'a mut PackedData> {
    (*(ptr as *const *mut PackedData)).as_mut()
}

unsafe fn arg(args: *const sys::GDExtensionConstTypePtr, index: usize) -> *const c_void {
    *args.add(index)
}

unsafe fn int_arg(args: *const sys::GDExtensionConstTypePtr, index: usize) -> i64 {
    *(arg(args, index) as *const i64)
}

unsafe fn write_int(ret: sys::GDExtensionTypePtr, value: usize) {
    *(ret as *mut i64) = value as i64;
}

unsafe fn write_bool(ret: sys::GDExtensionTypePtr, value: bool) {
    *(ret as *mut u8) = sys::conv::bool_to_sys(value);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Index operators

pub unsafe extern "C" fn array_operator_index(
    p_self: sys::GDExtensionTypePtr,
    p_index: sys::GDExtensionInt,
) -> sys::GDExtensionVariantPtr {
    array_operator_index_const(p_self, p_index)
}

pub unsafe extern "C" fn array_operator_index_const(
    p_self: sys::GDExtensionConstTypePtr,
    p_index: sys::GDExtensionInt,
) -> sys::GDExtensionVariantPtr {
    let (Some(data), Ok(index)) = (array_of(p_self), usize::try_from(p_index)) else {
        return ptr::null_mut();
    };

    let slots = data.lock();
    slots.get(index).map_or(ptr::null_mut(), Slot::ptr)
}

pub unsafe extern "C" fn dictionary_operator_index(
    p_self: sys::GDExtensionTypePtr,
    p_key: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionVariantPtr {
    let Some(data) = dictionary_of(p_self) else {
        return ptr::null_mut();
    };

    let key = read_variant(p_key);
    let mut entries = data.lock();
    if let Some((_, slot)) = entries.iter().find(|(k, _)| keys_equal(k, &key)) {
        return slot.ptr();
    }

    let slot = Slot::new(Value::Nil);
    let ptr = slot.ptr();
    entries.push((key, slot));
    ptr
}

pub unsafe extern "C" fn dictionary_operator_index_const(
    p_self: sys::GDExtensionConstTypePtr,
    p_key: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionVariantPtr {
    let Some(data) = dictionary_of(p_self) else {
        return ptr::null_mut();
    };

    let key = read_variant(p_key);
    let entries = data.lock();
    entries
        .iter()
        .find(|(k, _)| keys_equal(k, &key))
        .map_or(ptr::null_mut(), |(_, slot)| slot.ptr())
}

unsafe fn packed_element(p_self: sys::GDExtensionTypePtr, p_index: sys::GDExtensionInt) -> *mut c_void {
    packed_mut(p_self).map_or(ptr::null_mut(), |data| data.element_ptr(p_index))
}

macro_rules! packed_index_fns {
    ($($name:ident -> $Elem:ty;)+) => {
        $(
            pub unsafe extern "C" fn $name(p_self: sys::GDExtensionTypePtr, p_index: sys::GDExtensionInt) -> *mut $Elem {
                packed_element(p_self, p_index) as *mut $Elem
            }
        )+
    };
}

packed_index_fns! {
    packed_byte_array_operator_index -> u8;
    packed_int32_array_operator_index -> i32;
    packed_int64_array_operator_index -> i64;
    packed_float32_array_operator_index -> f32;
    packed_float64_array_operator_index -> f64;
    packed_string_array_operator_index -> c_void;
    packed_vector2_array_operator_index -> c_void;
    packed_vector3_array_operator_index -> c_void;
    packed_color_array_operator_index -> c_void;
    packed_vector4_array_operator_index -> c_void;
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Builtin methods

type Args = *const sys::GDExtensionConstTypePtr;

unsafe extern "C" fn string_length(base: sys::GDExtensionTypePtr, _args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    write_int(ret, read_string(base).chars().count());
}

unsafe extern "C" fn array_size(base: sys::GDExtensionTypePtr, _args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    write_int(ret, array_of(base).map_or(0, |data| data.lock().len()));
}

unsafe extern "C" fn array_push_back(base: sys::GDExtensionTypePtr, args: Args, _ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let value = read_variant(arg(args, 0));
    if let Some(data) = array_of(base) {
        data.lock().push(Slot::new(value));
    }
}

unsafe extern "C" fn array_resize(base: sys::GDExtensionTypePtr, args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let len = usize::try_from(int_arg(args, 0)).unwrap_or(0);
    if len > MAX_RESIZE_LEN {
        write_int(ret, ERR_OUT_OF_MEMORY);
        return;
    }

    // Dropped after unlocking: releasing a callable runs extension code.
    let removed = array_of(base).map(|data| {
        let mut slots = data.lock();
        if len < slots.len() {
            slots.split_off(len)
        } else {
            slots.resize_with(len, || Slot::new(Value::Nil));
            Vec::new()
        }
    });
    drop(removed);

    write_int(ret, 0);
}

unsafe extern "C" fn array_clear(base: sys::GDExtensionTypePtr, _args: Args, _ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let removed = array_of(base).map(|data| std::mem::take(&mut *data.lock()));
    drop(removed);
}

unsafe extern "C" fn array_remove_at(base: sys::GDExtensionTypePtr, args: Args, _ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let index = int_arg(args, 0);
    let removed = array_of(base).and_then(|data| {
        let mut slots = data.lock();
        usize::try_from(index)
            .ok()
            .filter(|&i| i < slots.len())
            .map(|i| slots.remove(i))
    });

    if removed.is_none() {
        engine_error(&format!("Array::remove_at: index {index} out of bounds"));
    }
}

unsafe extern "C" fn dictionary_size(base: sys::GDExtensionTypePtr, _args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    write_int(ret, dictionary_of(base).map_or(0, |data| data.lock().len()));
}

unsafe extern "C" fn dictionary_has(base: sys::GDExtensionTypePtr, args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let key = read_variant(arg(args, 0));
    let found = dictionary_of(base).is_some_and(|data| data.lock().iter().any(|(k, _)| keys_equal(k, &key)));
    write_bool(ret, found);
}

unsafe extern "C" fn dictionary_erase(base: sys::GDExtensionTypePtr, args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let key = read_variant(arg(args, 0));
    let removed = dictionary_of(base).and_then(|data| {
        let mut entries = data.lock();
        let index = entries.iter().position(|(k, _)| keys_equal(k, &key))?;
        Some(entries.remove(index))
    });

    write_bool(ret, removed.is_some());
}

unsafe extern "C" fn dictionary_keys(base: sys::GDExtensionTypePtr, _args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let keys = dictionary_of(base).map_or_else(Vec::new, |data| data.lock().iter().map(|(k, _)| k.clone()).collect());
    write_typed(VariantType::Array, ret, Value::new_array(keys));
}

unsafe extern "C" fn dictionary_clear(base: sys::GDExtensionTypePtr, _args: Args, _ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let removed = dictionary_of(base).map(|data| std::mem::take(&mut *data.lock()));
    drop(removed);
}

unsafe extern "C" fn callable_callv(base: sys::GDExtensionTypePtr, args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let call_args: Vec<Value> = array_of(arg(args, 0)).map_or_else(Vec::new, |data| data.lock().iter().map(Slot::get).collect());

    let result = match read_typed(VariantType::Callable, base) {
        Value::Callable(Some(callable)) => match callables::call(&callable, &call_args) {
            Ok(value) => value,
            Err(code) => {
                engine_error(&format!("Error calling custom callable (error code {code})"));
                Value::Nil
            }
        },
        _ => {
            engine_error("Attempt to call an invalid Callable");
            Value::Nil
        }
    };

    write_variant(ret, result);
}

unsafe extern "C" fn signal_get_name(base: sys::GDExtensionTypePtr, _args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let name = match read_typed(VariantType::Signal, base) {
        Value::Signal(signal) => signal.name,
        _ => String::new(),
    };
    write_typed(VariantType::StringName, ret, Value::StringName(name));
}

unsafe extern "C" fn packed_size(base: sys::GDExtensionTypePtr, _args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    write_int(ret, packed_mut(base).map_or(0, |data| data.len()));
}

unsafe extern "C" fn packed_push_back(base: sys::GDExtensionTypePtr, args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let pushed = match packed_mut(base) {
        Some(data) => {
            data.push_arg(arg(args, 0));
            true
        }
        None => false,
    };
    write_bool(ret, pushed);
}

unsafe extern "C" fn packed_resize(base: sys::GDExtensionTypePtr, args: Args, ret: sys::GDExtensionTypePtr, _argc: c_int) {
    let len = usize::try_from(int_arg(args, 0)).unwrap_or(0);
    if len > MAX_RESIZE_LEN {
        write_int(ret, ERR_OUT_OF_MEMORY);
        return;
    }
    if let Some(data) = packed_mut(base) {
        data.resize(len);
    }
    write_int(ret, 0);
}

unsafe extern "C" fn packed_clear(base: sys::GDExtensionTypePtr, _args: Args, _ret: sys::GDExtensionTypePtr, _argc: c_int) {
    if let Some(data) = packed_mut(base) {
        data.clear();
    }
}

const SIZE_HASH: i64 = 3173160232;
const RESIZE_HASH: i64 = 848867239;

/// Longest array `resize` accepts; longer requests fail like an allocation failure in the engine.
const MAX_RESIZE_LEN: usize = 1 << 24;
const ERR_OUT_OF_MEMORY: usize = 6;
const CLEAR_HASH: i64 = 3218959716;

fn packed_push_hash(ty: VariantType) -> i64 {
    match ty {
        VariantType::PackedByteArray | VariantType::PackedInt32Array | VariantType::PackedInt64Array => 694024632,
        VariantType::PackedFloat32Array | VariantType::PackedFloat64Array => 4094791666,
        VariantType::PackedStringArray => 816187996,
        VariantType::PackedVector2Array => 4188891560,
        VariantType::PackedVector3Array => 3295363524,
        VariantType::PackedColorArray => 1007858200,
        _ => 3289167688,
    }
}

type BuiltinFn = unsafe extern "C" fn(sys::GDExtensionTypePtr, Args, sys::GDExtensionTypePtr, c_int);

/// Method and its hash, for the methods this engine implements.
fn builtin_method(ty: VariantType, name: &str) -> Option<(i64, BuiltinFn)> {
    let found: (i64, BuiltinFn) = match (ty, name) {
        (VariantType::String, "length") => (SIZE_HASH, string_length),
        (VariantType::Array, "size") => (SIZE_HASH, array_size),
        (VariantType::Array, "push_back") => (3316032543, array_push_back),
        (VariantType::Array, "resize") => (RESIZE_HASH, array_resize),
        (VariantType::Array, "clear") => (CLEAR_HASH, array_clear),
        (VariantType::Array, "remove_at") => (2823966027, array_remove_at),
        (VariantType::Dictionary, "size") => (SIZE_HASH, dictionary_size),
        (VariantType::Dictionary, "has") => (3680194679, dictionary_has),
        (VariantType::Dictionary, "erase") => (1776646889, dictionary_erase),
        (VariantType::Dictionary, "keys") => (4144163970, dictionary_keys),
        (VariantType::Dictionary, "clear") => (CLEAR_HASH, dictionary_clear),
        (VariantType::Callable, "callv") => (413578926, callable_callv),
        (VariantType::Signal, "get_name") => (2002593661, signal_get_name),
        (ty, "size") if ty.is_packed_array() => (SIZE_HASH, packed_size),
        (ty, "push_back") if ty.is_packed_array() => (packed_push_hash(ty), packed_push_back),
        (ty, "resize") if ty.is_packed_array() => (RESIZE_HASH, packed_resize),
        (ty, "clear") if ty.is_packed_array() => (CLEAR_HASH, packed_clear),
        _ => return None,
    };

    Some(found)
}

pub unsafe extern "C" fn variant_get_ptr_builtin_method(
    p_type: sys::GDExtensionVariantType,
    p_method: sys::GDExtensionConstStringNamePtr,
    p_hash: sys::GDExtensionInt,
) -> sys::GDExtensionPtrBuiltInMethod {
    let ty = VariantType::try_from_sys(p_type)?;
    let name = read_string(p_method);

    match builtin_method(ty, &name) {
        Some((hash, method)) if hash == p_hash => Some(method),
        _ => None,
    }
}
