/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::GString;
use crate::meta::error::ConvertError;
use crate::meta::{FromGodot, GodotType, ToGodot};
use crate::sys;
use sys::types::OpaqueVariant;
use sys::{interface_fn, GodotFfi, VariantType};

mod value;

pub use value::VariantValue;

/// The engine's tagged dynamic value: 24 bytes of payload plus a kind discriminator.
///
/// The bridge never interprets payloads itself. Construction, copy, comparison and destruction all go through the
/// engine, and typed access goes through [`FromGodot`] / [`ToGodot`] or the [`VariantValue`] sum type.
#[repr(transparent)]
pub struct Variant {
    opaque: OpaqueVariant,
}

impl Variant {
    /// Create an empty variant (`null` value in GDScript).
    pub fn nil() -> Self {
        // SAFETY: variant_new_nil initializes the destination.
        unsafe { Self::new_with_var_uninit(|ptr| interface_fn!(variant_new_nil)(ptr)) }
    }

    /// Checks whether the variant is empty (`null` value in GDScript).
    pub fn is_nil(&self) -> bool {
        self.get_type() == VariantType::Nil
    }

    /// Kind currently stored in this variant.
    pub fn get_type(&self) -> VariantType {
        // SAFETY: self is a live variant.
        let raw = unsafe { interface_fn!(variant_get_type)(self.var_sys_const()) };
        VariantType::from_sys(raw)
    }

    /// Copies a directly representable value into a new variant, using the engine's constructor for `T`'s kind.
    pub fn from_ffi<T: GodotFfi>(value: &T) -> Self {
        // SAFETY: `value` is a live `T`; the engine constructor for T::VARIANT_TYPE reads exactly that layout.
        unsafe {
            let from_type = sys::builtin_lifecycle_api().variant_from_type(T::VARIANT_TYPE);
            Self::new_with_var_uninit(|dst| from_type(dst, value.sys()))
        }
    }

    /// Converts to `T`, or returns an error if the kind or value does not fit.
    pub fn try_to<T: FromGodot>(&self) -> Result<T, ConvertError> {
        T::try_from_variant(self)
    }

    /// Converts to `T`; on mismatch returns `T::default()` and `false` instead of an error.
    pub fn to_host_or_zero<T: FromGodot + Default>(&self) -> (T, bool) {
        match T::try_from_variant(self) {
            Ok(value) => (value, true),
            Err(_) => (T::default(), false),
        }
    }

    /// Encodes a host value of any kind.
    pub fn from_host(value: &VariantValue) -> Self {
        value.to_variant()
    }

    /// Decodes into a [`VariantValue`], requiring that the variant holds `expected`.
    pub fn to_host(&self, expected: VariantType) -> Result<VariantValue, ConvertError> {
        let actual = self.get_type();
        if actual != expected {
            return Err(ConvertError::bad_type(expected, actual));
        }

        VariantValue::decode(self, expected)
    }

    /// Decodes into a [`VariantValue`] of whatever kind the variant holds.
    pub fn value(&self) -> Result<VariantValue, ConvertError> {
        VariantValue::decode(self, self.get_type())
    }

    /// Engine string representation, as `str()` in GDScript.
    pub fn stringify(&self) -> GString {
        // SAFETY: the engine constructs a String into the uninitialized destination.
        unsafe {
            GString::new_with_uninit(|dst| interface_fn!(variant_stringify)(self.var_sys_const(), dst))
        }
    }

    /// Engine hash of the contained value.
    pub fn hash(&self) -> i64 {
        // SAFETY: self is a live variant.
        unsafe { interface_fn!(variant_hash)(self.var_sys_const()) }
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Pointer access

    #[doc(hidden)]
    pub fn var_sys(&self) -> sys::GDExtensionVariantPtr {
        sys::force_mut_ptr(self.opaque.as_ptr())
    }

    #[doc(hidden)]
    pub fn var_sys_const(&self) -> sys::GDExtensionConstVariantPtr {
        self.opaque.as_ptr()
    }

    #[doc(hidden)]
    pub fn var_sys_mut(&mut self) -> sys::GDExtensionVariantPtr {
        self.opaque.as_mut_ptr()
    }

    /// # Safety
    /// `init_fn` must fully initialize the variant it receives.
    #[doc(hidden)]
    pub unsafe fn new_with_var_uninit(init_fn: impl FnOnce(sys::GDExtensionUninitializedVariantPtr)) -> Self {
        let mut raw = OpaqueVariant::zeroed();
        init_fn(raw.as_mut_ptr());
        Self { opaque: raw }
    }

    /// Reinterprets an engine variant pointer as a reference.
    ///
    /// # Safety
    /// `ptr` must point to a live variant that outlives `'a` and is not mutated meanwhile.
    #[doc(hidden)]
    pub unsafe fn borrow_var_sys<'a>(ptr: sys::GDExtensionConstVariantPtr) -> &'a Variant {
        &*(ptr as *const Variant)
    }

    /// # Safety
    /// `ptr` must point to a live variant that outlives `'a` and is not aliased meanwhile.
    #[doc(hidden)]
    pub unsafe fn borrow_var_sys_mut<'a>(ptr: sys::GDExtensionVariantPtr) -> &'a mut Variant {
        &mut *(ptr as *mut Variant)
    }

    /// Reinterprets an engine `argv` of variants.
    ///
    /// # Safety
    /// `args` must point to `count` pointers to live variants, all outliving `'a`.
    #[doc(hidden)]
    pub unsafe fn borrow_ref_slice<'a>(args: *const sys::GDExtensionConstVariantPtr, count: usize) -> Vec<&'a Variant> {
        if args.is_null() || count == 0 {
            return Vec::new();
        }

        std::slice::from_raw_parts(args, count)
            .iter()
            .map(|&ptr| Self::borrow_var_sys(ptr))
            .collect()
    }
}

// SAFETY: Variant's layout is the engine's Variant; copies and destruction go through variant_new_copy/variant_destroy.
unsafe impl GodotFfi for Variant {
    const VARIANT_TYPE: VariantType = VariantType::Nil;

    fn sys(&self) -> sys::GDExtensionTypePtr {
        self.var_sys()
    }

    fn sys_mut(&mut self) -> sys::GDExtensionTypePtr {
        self.var_sys_mut()
    }

    unsafe fn new_from_sys(ptr: sys::GDExtensionConstTypePtr) -> Self {
        Self::new_with_var_uninit(|dst| interface_fn!(variant_new_copy)(dst, ptr))
    }

    unsafe fn new_with_uninit(init_fn: impl FnOnce(sys::GDExtensionUninitializedTypePtr)) -> Self {
        Self::new_with_var_uninit(init_fn)
    }

    unsafe fn take_from_sys(ptr: sys::GDExtensionTypePtr) -> Self {
        Self {
            opaque: std::ptr::read(ptr as *const OpaqueVariant),
        }
    }

    unsafe fn move_return_ptr(mut self, dst: sys::GDExtensionTypePtr, call_type: sys::PtrcallType) {
        match call_type {
            sys::PtrcallType::Standard => {
                std::ptr::write(dst as *mut OpaqueVariant, self.opaque);
                std::mem::forget(self);
            }
            sys::PtrcallType::Virtual => {
                std::ptr::swap(dst as *mut OpaqueVariant, &mut self.opaque);
            }
        }
    }
}

impl GodotType for Variant {
    fn ffi_to_variant(&self) -> Variant {
        self.clone()
    }

    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        Ok(variant.clone())
    }
}

impl<'a> sys::FrameArg<'a> for &'a Variant {
    fn push_into(self, frame: &mut sys::CallFrame<'a>) {
        // SAFETY: the borrow keeps the variant alive for the frame's lifetime.
        unsafe { frame.push_sys(self.var_sys_const()) }
    }
}

impl Clone for Variant {
    fn clone(&self) -> Self {
        // SAFETY: self is a live variant.
        unsafe { Self::new_from_sys(self.var_sys_const()) }
    }
}

impl Drop for Variant {
    fn drop(&mut self) {
        // SAFETY: self is live and not used afterwards.
        unsafe { interface_fn!(variant_destroy)(self.var_sys_mut()) }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::nil()
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        // SAFETY: both are live variants.
        let equal = unsafe { interface_fn!(variant_equal)(self.var_sys_const(), other.var_sys_const()) };
        sys::conv::bool_from_sys(equal)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stringify())
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variant({:?}: {})", self.get_type(), self.stringify())
    }
}

/// Shorthand for [`ToGodot::to_variant`] on several values.
pub fn to_variants<T: ToGodot>(values: &[T]) -> Vec<Variant> {
    values.iter().map(ToGodot::to_variant).collect()
}
