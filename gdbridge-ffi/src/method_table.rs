/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Per-type tables of engine functions, loaded once from the interface.

use std::collections::HashMap;

use crate as sys;
use sys::{VariantType, VARIANT_TYPE_COUNT};

pub type VariantFromTypeFn =
    unsafe extern "C" fn(sys::GDExtensionUninitializedVariantPtr, sys::GDExtensionTypePtr);
pub type TypeFromVariantFn =
    unsafe extern "C" fn(sys::GDExtensionUninitializedTypePtr, sys::GDExtensionVariantPtr);
pub type PtrConstructorFn =
    unsafe extern "C" fn(sys::GDExtensionUninitializedTypePtr, *const sys::GDExtensionConstTypePtr);
pub type PtrDestructorFn = unsafe extern "C" fn(sys::GDExtensionTypePtr);
pub type BuiltinMethodBind = unsafe extern "C" fn(
    p_base: sys::GDExtensionTypePtr,
    p_args: *const sys::GDExtensionConstTypePtr,
    r_return: sys::GDExtensionTypePtr,
    p_argument_count: std::ffi::c_int,
);

/// Constructor indices the bridge loads per type: 0 default, 1 copy, 2 and 3 conversions (e.g. `String` from `StringName`).
pub const CONSTRUCTORS_PER_TYPE: usize = 4;

pub const CONSTRUCTOR_DEFAULT: usize = 0;
pub const CONSTRUCTOR_COPY: usize = 1;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Lifecycle

/// Conversion, construction and destruction functions for every variant kind.
pub struct BuiltinLifecycleTable {
    from_type: [sys::GDExtensionVariantFromTypeConstructorFunc; VARIANT_TYPE_COUNT],
    to_type: [sys::GDExtensionTypeFromVariantConstructorFunc; VARIANT_TYPE_COUNT],
    constructors: [[sys::GDExtensionPtrConstructor; CONSTRUCTORS_PER_TYPE]; VARIANT_TYPE_COUNT],
    destructors: [sys::GDExtensionPtrDestructor; VARIANT_TYPE_COUNT],
}

impl BuiltinLifecycleTable {
    /// # Safety
    /// `interface` must come from the engine and stay valid for the duration of the call.
    pub unsafe fn load(interface: &sys::EngineInterface) -> Self {
        let get_from = require(interface.get_variant_from_type_constructor, "get_variant_from_type_constructor");
        let get_to = require(interface.get_variant_to_type_constructor, "get_variant_to_type_constructor");
        let get_ctor = require(interface.variant_get_ptr_constructor, "variant_get_ptr_constructor");
        let get_dtor = require(interface.variant_get_ptr_destructor, "variant_get_ptr_destructor");

        let mut table = Self {
            from_type: [None; VARIANT_TYPE_COUNT],
            to_type: [None; VARIANT_TYPE_COUNT],
            constructors: [[None; CONSTRUCTORS_PER_TYPE]; VARIANT_TYPE_COUNT],
            destructors: [None; VARIANT_TYPE_COUNT],
        };

        // Nil has no from/to constructors; Variant itself is handled by variant_new_copy/variant_destroy.
        for ty in VariantType::ALL.into_iter().skip(1) {
            let i = ty.ord();
            table.from_type[i] = get_from(ty.sys());
            table.to_type[i] = get_to(ty.sys());

            if ty.is_handle_kind() {
                for (index, slot) in table.constructors[i].iter_mut().enumerate() {
                    *slot = get_ctor(ty.sys(), index as i32);
                }
                table.destructors[i] = get_dtor(ty.sys());
            }
        }

        sys::out!("loaded builtin lifecycle table");
        table
    }

    pub fn variant_from_type(&self, ty: VariantType) -> VariantFromTypeFn {
        self.from_type[ty.ord()]
            .unwrap_or_else(|| missing("variant-from-type constructor", ty))
    }

    pub fn variant_to_type(&self, ty: VariantType) -> TypeFromVariantFn {
        self.to_type[ty.ord()].unwrap_or_else(|| missing("type-from-variant constructor", ty))
    }

    pub fn constructor(&self, ty: VariantType, index: usize) -> Option<PtrConstructorFn> {
        self.constructors[ty.ord()].get(index).copied().flatten()
    }

    /// # Safety
    /// `dst` must point to writable, uninitialized storage of `ty`'s size.
    pub unsafe fn construct_default(&self, ty: VariantType, dst: sys::GDExtensionUninitializedTypePtr) {
        let ctor = self
            .constructor(ty, CONSTRUCTOR_DEFAULT)
            .unwrap_or_else(|| missing("default constructor", ty));

        ctor(dst, std::ptr::null());
    }

    /// # Safety
    /// `dst` must point to writable, uninitialized storage of `ty`'s size; `src` to a live value of type `ty`.
    pub unsafe fn construct_copy(
        &self,
        ty: VariantType,
        dst: sys::GDExtensionUninitializedTypePtr,
        src: sys::GDExtensionConstTypePtr,
    ) {
        let ctor = self
            .constructor(ty, CONSTRUCTOR_COPY)
            .unwrap_or_else(|| missing("copy constructor", ty));

        let args = [src];
        ctor(dst, args.as_ptr());
    }

    /// # Safety
    /// `dst` must point to writable, uninitialized storage of `ty`'s size; `args` must match constructor `index`.
    pub unsafe fn construct_with(
        &self,
        ty: VariantType,
        index: usize,
        dst: sys::GDExtensionUninitializedTypePtr,
        args: &[sys::GDExtensionConstTypePtr],
    ) {
        let ctor = self
            .constructor(ty, index)
            .unwrap_or_else(|| missing("constructor", ty));

        ctor(dst, args.as_ptr());
    }

    /// Runs the engine destructor, if the type has one. Plain-data kinds have none.
    ///
    /// # Safety
    /// `ptr` must point to a live value of type `ty`, which is no longer used afterwards.
    pub unsafe fn destroy(&self, ty: VariantType, ptr: sys::GDExtensionTypePtr) {
        if let Some(dtor) = self.destructors[ty.ord()] {
            dtor(ptr);
        }
    }
}

fn require<T>(entry: Option<T>, name: &str) -> T {
    entry.unwrap_or_else(|| sys::abort_with(&format!("interface entry '{name}' is missing")))
}

#[cold]
fn missing(what: &str, ty: VariantType) -> ! {
    sys::abort_with(&format!("engine provides no {what} for {ty:?}"))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Builtin methods

/// `(type, method, hash)` of every builtin method the bridge calls.
const BUILTIN_METHODS: &[(VariantType, &str, i64)] = &[
    (VariantType::String, "length", 3173160232),
    (VariantType::Array, "size", 3173160232),
    (VariantType::Array, "push_back", 3316032543),
    (VariantType::Array, "resize", 848867239),
    (VariantType::Array, "clear", 3218959716),
    (VariantType::Array, "remove_at", 2823966027),
    (VariantType::Dictionary, "size", 3173160232),
    (VariantType::Dictionary, "has", 3680194679),
    (VariantType::Dictionary, "erase", 1776646889),
    (VariantType::Dictionary, "keys", 4144163970),
    (VariantType::Dictionary, "clear", 3218959716),
    (VariantType::Callable, "callv", 413578926),
    (VariantType::Signal, "get_name", 2002593661),
];

/// Packed arrays share one method set; only `push_back` hashes differ per element type.
const PACKED_PUSH_BACK: &[(VariantType, i64)] = &[
    (VariantType::PackedByteArray, 694024632),
    (VariantType::PackedInt32Array, 694024632),
    (VariantType::PackedInt64Array, 694024632),
    (VariantType::PackedFloat32Array, 4094791666),
    (VariantType::PackedFloat64Array, 4094791666),
    (VariantType::PackedStringArray, 816187996),
    (VariantType::PackedVector2Array, 4188891560),
    (VariantType::PackedVector3Array, 3295363524),
    (VariantType::PackedColorArray, 1007858200),
    (VariantType::PackedVector4Array, 3289167688),
];

/// Builtin methods of variant types, keyed by `(type, name)`.
pub struct BuiltinMethodTable {
    methods: HashMap<(VariantType, &'static str), BuiltinMethodBind>,
}

impl BuiltinMethodTable {
    /// Resolves every method the bridge uses. Methods the engine doesn't know are skipped with a trace;
    /// calls to them fail later at the call site.
    ///
    /// # Safety
    /// `interface` must come from the engine.
    pub unsafe fn load(interface: &sys::EngineInterface, strings: &mut sys::StringCache) -> Self {
        let get_method = require(interface.variant_get_ptr_builtin_method, "variant_get_ptr_builtin_method");

        let packed = PACKED_PUSH_BACK.iter().flat_map(|&(ty, push_hash)| {
            [
                (ty, "size", 3173160232),
                (ty, "push_back", push_hash),
                (ty, "resize", 848867239),
                (ty, "clear", 3218959716),
            ]
        });

        let mut methods = HashMap::new();
        for (ty, name, hash) in BUILTIN_METHODS.iter().copied().chain(packed) {
            let sname = strings.fetch(name);

            match get_method(ty.sys(), sname, hash) {
                Some(method) => {
                    methods.insert((ty, name), method);
                }
                None => sys::out!("builtin method {ty:?}::{name} (hash {hash}) not provided"),
            }
        }

        Self { methods }
    }

    pub fn get(&self, ty: VariantType, name: &'static str) -> Option<BuiltinMethodBind> {
        self.methods.get(&(ty, name)).copied()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
