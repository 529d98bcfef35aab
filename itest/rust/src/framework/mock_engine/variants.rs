/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Variant operations and the per-type constructor tables.

use gdbridge::sys;
use sys::VariantType;

use super::objects;
use super::values::{
    default_value, drop_typed, drop_variant, hash_value, peek_variant, read_string, read_typed, read_variant, stringify,
    values_equal, write_typed, write_variant, SignalData, Value,
};

pub unsafe extern "C" fn variant_new_copy(r_dest: sys::GDExtensionUninitializedVariantPtr, p_src: sys::GDExtensionConstVariantPtr) {
    write_variant(r_dest, read_variant(p_src));
}

pub unsafe extern "C" fn variant_new_nil(r_dest: sys::GDExtensionUninitializedVariantPtr) {
    write_variant(r_dest, Value::Nil);
}

pub unsafe extern "C" fn variant_destroy(p_self: sys::GDExtensionVariantPtr) {
    drop_variant(p_self);
}

pub unsafe extern "C" fn variant_get_type(p_self: sys::GDExtensionConstVariantPtr) -> sys::GDExtensionVariantType {
    peek_variant(p_self, |value| value.variant_type().sys())
}

pub unsafe extern "C" fn variant_stringify(p_self: sys::GDExtensionConstVariantPtr, r_ret: sys::GDExtensionStringPtr) {
    let text = peek_variant(p_self, stringify);
    write_typed(VariantType::String, r_ret, Value::String(text));
}

pub unsafe extern "C" fn variant_hash(p_self: sys::GDExtensionConstVariantPtr) -> sys::GDExtensionInt {
    peek_variant(p_self, hash_value)
}

pub unsafe extern "C" fn variant_equal(
    p_a: sys::GDExtensionConstVariantPtr,
    p_b: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionBool {
    let (a, b) = (read_variant(p_a), read_variant(p_b));
    sys::conv::bool_to_sys(values_equal(&a, &b))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Per-type functions, instantiated once per variant type

fn ty_of(ordinal: u32) -> VariantType {
    VariantType::from_sys(ordinal)
}

unsafe extern "C" fn from_type<const N: u32>(dst: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
    write_variant(dst, read_typed(ty_of(N), src));
}

unsafe extern "C" fn to_type<const N: u32>(dst: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    write_typed(ty_of(N), dst, read_variant(src));
}

unsafe extern "C" fn ctor_default<const N: u32>(dst: sys::GDExtensionUninitializedTypePtr, _args: *const sys::GDExtensionConstTypePtr) {
    write_typed(ty_of(N), dst, default_value(ty_of(N)));
}

unsafe extern "C" fn ctor_copy<const N: u32>(dst: sys::GDExtensionUninitializedTypePtr, args: *const sys::GDExtensionConstTypePtr) {
    let ty = ty_of(N);
    write_typed(ty, dst, read_typed(ty, *args));
}

/// `String` from `StringName`/`NodePath`, and the reverse directions.
unsafe extern "C" fn ctor_from_text<const N: u32>(dst: sys::GDExtensionUninitializedTypePtr, args: *const sys::GDExtensionConstTypePtr) {
    write_typed(ty_of(N), dst, Value::String(read_string(*args)));
}

/// `Signal(Object*, StringName)`.
unsafe extern "C" fn signal_from_object(dst: sys::GDExtensionUninitializedTypePtr, args: *const sys::GDExtensionConstTypePtr) {
    let object = *(*args as *const sys::GDExtensionObjectPtr);
    let signal = SignalData {
        object_id: objects::from_ptr(object).map_or(0, |o| o.id()),
        name: read_string(*args.add(1)),
    };
    write_typed(VariantType::Signal, dst, Value::Signal(signal));
}

unsafe extern "C" fn dtor<const N: u32>(ptr: sys::GDExtensionTypePtr) {
    drop_typed(ty_of(N), ptr);
}

type FromTypeFn = unsafe extern "C" fn(sys::GDExtensionUninitializedVariantPtr, sys::GDExtensionTypePtr);
type ToTypeFn = unsafe extern "C" fn(sys::GDExtensionUninitializedTypePtr, sys::GDExtensionVariantPtr);
type CtorFn = unsafe extern "C" fn(sys::GDExtensionUninitializedTypePtr, *const sys::GDExtensionConstTypePtr);
type DtorFn = unsafe extern "C" fn(sys::GDExtensionTypePtr);

macro_rules! per_type {
    ($f:ident as $Fn:ty) => {
        per_type!(@ $f as $Fn; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31 32 33 34 35 36 37 38)
    };
    (@ $f:ident as $Fn:ty; $($n:literal)*) => {
        [$($f::<$n> as $Fn),*]
    };
}

static FROM_TYPE: [FromTypeFn; sys::VARIANT_TYPE_COUNT] = per_type!(from_type as FromTypeFn);
static TO_TYPE: [ToTypeFn; sys::VARIANT_TYPE_COUNT] = per_type!(to_type as ToTypeFn);
static CTOR_DEFAULT: [CtorFn; sys::VARIANT_TYPE_COUNT] = per_type!(ctor_default as CtorFn);
static CTOR_COPY: [CtorFn; sys::VARIANT_TYPE_COUNT] = per_type!(ctor_copy as CtorFn);
static CTOR_FROM_TEXT: [CtorFn; sys::VARIANT_TYPE_COUNT] = per_type!(ctor_from_text as CtorFn);
static DTOR: [DtorFn; sys::VARIANT_TYPE_COUNT] = per_type!(dtor as DtorFn);

pub unsafe extern "C" fn get_variant_from_type_constructor(
    p_type: sys::GDExtensionVariantType,
) -> sys::GDExtensionVariantFromTypeConstructorFunc {
    let ty = VariantType::try_from_sys(p_type).filter(|&ty| ty != VariantType::Nil)?;
    Some(FROM_TYPE[ty.ord()])
}

pub unsafe extern "C" fn get_variant_to_type_constructor(
    p_type: sys::GDExtensionVariantType,
) -> sys::GDExtensionTypeFromVariantConstructorFunc {
    let ty = VariantType::try_from_sys(p_type).filter(|&ty| ty != VariantType::Nil)?;
    Some(TO_TYPE[ty.ord()])
}

pub unsafe extern "C" fn variant_get_ptr_constructor(
    p_type: sys::GDExtensionVariantType,
    p_constructor: i32,
) -> sys::GDExtensionPtrConstructor {
    let ty = VariantType::try_from_sys(p_type).filter(|ty| ty.is_handle_kind())?;

    match (ty, p_constructor) {
        (_, 0) => Some(CTOR_DEFAULT[ty.ord()]),
        (_, 1) => Some(CTOR_COPY[ty.ord()]),
        (VariantType::String, 2 | 3) | (VariantType::StringName | VariantType::NodePath, 2) => {
            Some(CTOR_FROM_TEXT[ty.ord()])
        }
        (VariantType::Signal, 2) => Some(signal_from_object),
        _ => None,
    }
}

pub unsafe extern "C" fn variant_get_ptr_destructor(p_type: sys::GDExtensionVariantType) -> sys::GDExtensionPtrDestructor {
    let ty = VariantType::try_from_sys(p_type).filter(|ty| ty.is_handle_kind())?;
    Some(DTOR[ty.ord()])
}
