/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate as sys;

/// Types that can directly and fully represent some engine type.
///
/// Adds methods to convert from and to engine FFI pointers. See [`ffi_methods!`](crate::ffi_methods) for ergonomic implementation.
///
/// # Safety
///
/// The in-memory representation of `Self` must be exactly the engine's representation of [`VARIANT_TYPE`](Self::VARIANT_TYPE),
/// and [`from_arg_ptr`](GodotFfi::from_arg_ptr) / [`move_return_ptr`](GodotFfi::move_return_ptr) must properly initialize and
/// clean up values given the [`PtrcallType`] provided by the caller.
pub unsafe trait GodotFfi: Sized {
    const VARIANT_TYPE: sys::VariantType;

    /// Return engine opaque pointer, for an immutable operation.
    ///
    /// This is a `*mut` pointer despite taking `&self`, because most of the engine API is not const-correct.
    fn sys(&self) -> sys::GDExtensionTypePtr;

    /// Return engine opaque pointer, for a mutable operation.
    fn sys_mut(&mut self) -> sys::GDExtensionTypePtr {
        self.sys()
    }

    fn sys_const(&self) -> sys::GDExtensionConstTypePtr {
        self.sys()
    }

    /// Copy-constructs from an engine value, leaving the source untouched.
    ///
    /// # Safety
    /// `ptr` must point to a live value of this type.
    unsafe fn new_from_sys(ptr: sys::GDExtensionConstTypePtr) -> Self;

    /// Construct uninitialized opaque data, then initialize it with `init_fn` function.
    ///
    /// # Safety
    /// `init_fn` must fully initialize the (uninitialized) _type ptr_ it receives.
    unsafe fn new_with_uninit(init_fn: impl FnOnce(sys::GDExtensionUninitializedTypePtr)) -> Self;

    /// Moves an engine value out of `ptr`. Afterwards, the storage behind `ptr` counts as uninitialized.
    ///
    /// # Safety
    /// `ptr` must point to a live value of this type, which nobody else will destroy.
    unsafe fn take_from_sys(ptr: sys::GDExtensionTypePtr) -> Self;

    /// Construct from a pointer to an argument in a call.
    ///
    /// # Safety
    /// `ptr` must encode `Self` according to the given `call_type`'s encoding of argument values.
    unsafe fn from_arg_ptr(ptr: sys::GDExtensionConstTypePtr, _call_type: PtrcallType) -> Self {
        Self::new_from_sys(ptr)
    }

    /// Move self into the pointer `dst`, which is treated as uninitialized.
    ///
    /// # Safety
    /// `dst` must be able to accept a value of type `Self` encoded according to `call_type`'s encoding of return values.
    unsafe fn move_return_ptr(self, dst: sys::GDExtensionTypePtr, call_type: PtrcallType);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// An indication of what type of pointer call is being made.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub enum PtrcallType {
    /// Standard pointer call: every argument is passed as a pointer to a value of that type, and the
    /// return value must be moved into the return pointer.
    #[default]
    Standard,

    /// Engine upcall into a virtual method. Behaves like [`PtrcallType::Standard`], except that objects arrive as
    /// `Object**` and the return buffer already holds a default-initialized value.
    Virtual,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros to implement `GodotFfi` for the two representations the bridge uses.

/// Implements the pointer methods of [`GodotFfi`].
///
/// Two shapes are supported:
/// - `type Pod;` for `#[repr(C)]` plain-data types whose bits are the engine's bits (math types, `Rid`, primitives).
/// - `type Opaque = OpaqueX;` for handle-backed builtins with an `opaque` field and a `from_opaque()` constructor.
///   Copies go through the engine copy constructor of `Self::VARIANT_TYPE`.
#[macro_export]
macro_rules! ffi_methods {
    (type Pod;) => {
        fn sys(&self) -> $crate::GDExtensionTypePtr {
            self as *const Self as $crate::GDExtensionTypePtr
        }

        unsafe fn new_from_sys(ptr: $crate::GDExtensionConstTypePtr) -> Self {
            std::ptr::read(ptr as *const Self)
        }

        unsafe fn new_with_uninit(init_fn: impl FnOnce($crate::GDExtensionUninitializedTypePtr)) -> Self {
            let mut raw = std::mem::MaybeUninit::<Self>::uninit();
            init_fn(raw.as_mut_ptr() as $crate::GDExtensionUninitializedTypePtr);
            raw.assume_init()
        }

        unsafe fn take_from_sys(ptr: $crate::GDExtensionTypePtr) -> Self {
            std::ptr::read(ptr as *const Self)
        }

        unsafe fn move_return_ptr(self, dst: $crate::GDExtensionTypePtr, _call_type: $crate::PtrcallType) {
            std::ptr::write(dst as *mut Self, self)
        }
    };

    (type Opaque = $Opaque:ty;) => {
        fn sys(&self) -> $crate::GDExtensionTypePtr {
            $crate::force_mut_ptr(self.opaque.as_ptr())
        }

        fn sys_mut(&mut self) -> $crate::GDExtensionTypePtr {
            self.opaque.as_mut_ptr()
        }

        unsafe fn new_from_sys(ptr: $crate::GDExtensionConstTypePtr) -> Self {
            Self::new_with_uninit(|dst| {
                $crate::builtin_lifecycle_api().construct_copy(
                    <Self as $crate::GodotFfi>::VARIANT_TYPE,
                    dst,
                    ptr,
                )
            })
        }

        unsafe fn new_with_uninit(init_fn: impl FnOnce($crate::GDExtensionUninitializedTypePtr)) -> Self {
            let mut raw = <$Opaque>::zeroed();
            init_fn(raw.as_mut_ptr());
            Self::from_opaque(raw)
        }

        unsafe fn take_from_sys(ptr: $crate::GDExtensionTypePtr) -> Self {
            Self::from_opaque(std::ptr::read(ptr as *const $Opaque))
        }

        unsafe fn move_return_ptr(mut self, dst: $crate::GDExtensionTypePtr, call_type: $crate::PtrcallType) {
            match call_type {
                $crate::PtrcallType::Standard => {
                    std::ptr::write(dst as *mut $Opaque, self.opaque);
                    std::mem::forget(self);
                }
                // The engine pre-initialized `dst`; swapping hands our value over and lets `self` destroy the old one.
                $crate::PtrcallType::Virtual => {
                    std::ptr::swap(dst as *mut $Opaque, &mut self.opaque);
                }
            }
        }
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementations for primitives; wider host types convert into these in gdbridge-core.

// SAFETY: i64 is the engine's int.
unsafe impl GodotFfi for i64 {
    const VARIANT_TYPE: sys::VariantType = sys::VariantType::Int;

    ffi_methods! { type Pod; }
}

// SAFETY: f64 is the engine's float in pointer calls.
unsafe impl GodotFfi for f64 {
    const VARIANT_TYPE: sys::VariantType = sys::VariantType::Float;

    ffi_methods! { type Pod; }
}

// SAFETY: bool and GDExtensionBool share their layout; reads normalize non-0/1 bytes.
unsafe impl GodotFfi for bool {
    const VARIANT_TYPE: sys::VariantType = sys::VariantType::Bool;

    fn sys(&self) -> sys::GDExtensionTypePtr {
        self as *const Self as sys::GDExtensionTypePtr
    }

    unsafe fn new_from_sys(ptr: sys::GDExtensionConstTypePtr) -> Self {
        sys::conv::bool_from_sys(*(ptr as *const sys::GDExtensionBool))
    }

    unsafe fn new_with_uninit(init_fn: impl FnOnce(sys::GDExtensionUninitializedTypePtr)) -> Self {
        let mut raw: sys::GDExtensionBool = 0;
        init_fn(&mut raw as *mut sys::GDExtensionBool as sys::GDExtensionUninitializedTypePtr);
        sys::conv::bool_from_sys(raw)
    }

    unsafe fn take_from_sys(ptr: sys::GDExtensionTypePtr) -> Self {
        Self::new_from_sys(ptr)
    }

    unsafe fn move_return_ptr(self, dst: sys::GDExtensionTypePtr, _call_type: PtrcallType) {
        *(dst as *mut sys::GDExtensionBool) = sys::conv::bool_to_sys(self);
    }
}

/// Raw object pointers. Arguments and returns are passed as `Object**`.
// SAFETY: pointer-sized, same representation as the engine's `Object*`.
unsafe impl GodotFfi for sys::GDExtensionObjectPtr {
    const VARIANT_TYPE: sys::VariantType = sys::VariantType::Object;

    ffi_methods! { type Pod; }
}

/// Unit, for methods without a return value. Reads nothing and writes nothing.
// SAFETY: no bits to represent.
unsafe impl GodotFfi for () {
    const VARIANT_TYPE: sys::VariantType = sys::VariantType::Nil;

    fn sys(&self) -> sys::GDExtensionTypePtr {
        std::ptr::null_mut()
    }

    unsafe fn new_from_sys(_ptr: sys::GDExtensionConstTypePtr) -> Self {}

    unsafe fn new_with_uninit(_init_fn: impl FnOnce(sys::GDExtensionUninitializedTypePtr)) -> Self {}

    unsafe fn take_from_sys(_ptr: sys::GDExtensionTypePtr) -> Self {}

    unsafe fn move_return_ptr(self, _dst: sys::GDExtensionTypePtr, _call_type: PtrcallType) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_move_through_sys() {
        let mut slot = 0i64;
        unsafe {
            42i64.move_return_ptr(&mut slot as *mut i64 as sys::GDExtensionTypePtr, PtrcallType::Standard);
            assert_eq!(i64::take_from_sys(&mut slot as *mut i64 as sys::GDExtensionTypePtr), 42);
        }
    }

    #[test]
    fn bool_normalizes() {
        let byte: u8 = 2;
        let value = unsafe { bool::new_from_sys(&byte as *const u8 as sys::GDExtensionConstTypePtr) };
        assert!(value);

        let built = unsafe { bool::new_with_uninit(|dst| *(dst as *mut u8) = 1) };
        assert!(built);
    }
}
