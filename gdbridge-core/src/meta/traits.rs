/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::Variant;
use crate::meta::error::ConvertError;
use crate::sys;

// Re-export sys traits in this module, so all are in one place.
pub use sys::GodotFfi;

/// Type that is directly representable in the engine, and can be placed into a [`Variant`].
///
/// Conversions go through the engine's per-kind variant constructors; the bridge never interprets payloads itself.
/// Host types without a direct representation implement [`GodotConvert`](crate::meta::GodotConvert) instead.
pub trait GodotType: GodotFfi + 'static {
    /// Copies `self` into a new variant of kind [`VARIANT_TYPE`](GodotFfi::VARIANT_TYPE).
    fn ffi_to_variant(&self) -> Variant {
        Variant::from_ffi(self)
    }

    /// Reads a value out of `variant`, which must hold exactly this kind.
    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        let actual = variant.get_type();
        if actual != Self::VARIANT_TYPE {
            return Err(ConvertError::bad_type(Self::VARIANT_TYPE, actual));
        }

        // SAFETY: kind was checked above; the engine constructs a `Self` from the variant payload.
        let value = unsafe {
            let to_type = sys::builtin_lifecycle_api().variant_to_type(Self::VARIANT_TYPE);
            Self::new_with_uninit(|dst| to_type(dst, variant.var_sys()))
        };

        Ok(value)
    }
}

impl GodotType for i64 {}
impl GodotType for f64 {}
impl GodotType for bool {}

impl GodotType for () {
    fn ffi_to_variant(&self) -> Variant {
        Variant::nil()
    }

    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        match variant.get_type() {
            sys::VariantType::Nil => Ok(()),
            actual => Err(ConvertError::bad_type(sys::VariantType::Nil, actual)),
        }
    }
}

/// Raw object pointers. Null maps to a nil variant and back.
impl GodotType for sys::GDExtensionObjectPtr {
    fn ffi_to_variant(&self) -> Variant {
        if self.is_null() {
            Variant::nil()
        } else {
            Variant::from_ffi(self)
        }
    }

    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        match variant.get_type() {
            sys::VariantType::Nil => Ok(std::ptr::null_mut()),
            sys::VariantType::Object => {
                // SAFETY: kind checked; the engine writes the object pointer (or null for a freed object).
                let ptr = unsafe {
                    let to_type = sys::builtin_lifecycle_api().variant_to_type(sys::VariantType::Object);
                    Self::new_with_uninit(|dst| to_type(dst, variant.var_sys()))
                };
                Ok(ptr)
            }
            actual => Err(ConvertError::bad_type(sys::VariantType::Object, actual)),
        }
    }
}
