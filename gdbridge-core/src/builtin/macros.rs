/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Wires a `#[repr(C)]` plain-data type into the marshalling traits: pointer calls pass it by value, variants copy it.
macro_rules! pod_builtin {
    ($T:ty => $variant_type:expr) => {
        // SAFETY: `#[repr(C)]` with the engine's field order and single-precision scalars.
        unsafe impl $crate::sys::GodotFfi for $T {
            const VARIANT_TYPE: $crate::sys::VariantType = $variant_type;

            $crate::sys::ffi_methods! { type Pod; }
        }

        impl $crate::meta::GodotType for $T {}

        $crate::impl_godot_as_self!($T);

        impl<'a> $crate::sys::FrameArg<'a> for $T {
            fn push_into(self, frame: &mut $crate::sys::CallFrame<'a>) {
                frame.push_pod(self);
            }
        }
    };
}

/// Wires an engine-handle builtin (an `opaque` field plus `from_opaque()`) into the marshalling traits.
///
/// Pointer-call arguments reference the value in place; the frame does not copy it.
macro_rules! opaque_builtin {
    ($T:ty => $variant_type:expr, $Opaque:ty) => {
        // SAFETY: `#[repr(transparent)]`-equivalent wrapper around the engine's handle, copied and destroyed by the engine.
        unsafe impl $crate::sys::GodotFfi for $T {
            const VARIANT_TYPE: $crate::sys::VariantType = $variant_type;

            $crate::sys::ffi_methods! { type Opaque = $Opaque; }
        }

        impl $crate::meta::GodotType for $T {}

        $crate::impl_godot_as_self!($T);

        impl<'a> $crate::sys::FrameArg<'a> for &'a $T {
            fn push_into(self, frame: &mut $crate::sys::CallFrame<'a>) {
                // SAFETY: the borrow keeps the value alive for the frame's lifetime.
                unsafe { frame.push_sys($crate::sys::GodotFfi::sys_const(self)) }
            }
        }

        impl Clone for $T {
            fn clone(&self) -> Self {
                // SAFETY: `self` is a live value of this type.
                unsafe { <Self as $crate::sys::GodotFfi>::new_from_sys($crate::sys::GodotFfi::sys_const(self)) }
            }
        }

        impl Drop for $T {
            fn drop(&mut self) {
                // SAFETY: the value is live and not used after this.
                unsafe {
                    $crate::sys::builtin_lifecycle_api()
                        .destroy($variant_type, $crate::sys::GodotFfi::sys_mut(self));
                }
            }
        }
    };
}

pub(crate) use {opaque_builtin, pod_builtin};
