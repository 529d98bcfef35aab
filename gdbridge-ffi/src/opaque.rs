/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Stores an opaque object of a certain size, with very restricted operations.
///
/// The bridge never looks inside: payloads are created, copied and destroyed exclusively by engine functions.
/// Due to `align(8)` and not `packed` repr, this type may be bigger than `N` bytes on 32-bit targets.
#[cfg_attr(target_pointer_width = "32", repr(C, align(4)))]
#[cfg_attr(target_pointer_width = "64", repr(C, align(8)))]
#[derive(Copy, Clone)]
pub struct Opaque<const N: usize> {
    storage: [u8; N],
    marker: std::marker::PhantomData<*const u8>, // disable Send/Sync
}

impl<const N: usize> Opaque<N> {
    /// All-zero storage. Only meaningful as a destination the engine constructs into.
    pub const fn zeroed() -> Self {
        Self {
            storage: [0; N],
            marker: std::marker::PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_void {
        self.storage.as_ptr() as *const std::ffi::c_void
    }

    pub fn as_mut_ptr(&mut self) -> *mut std::ffi::c_void {
        self.storage.as_mut_ptr() as *mut std::ffi::c_void
    }
}

impl<const N: usize> std::fmt::Debug for Opaque<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Opaque<{N}>")
    }
}

/// Engine sizes of handle-backed builtin types (single-precision, 64-bit build).
pub mod types {
    use super::Opaque;

    pub type OpaqueVariant = Opaque<24>;
    pub type OpaqueString = Opaque<8>;
    pub type OpaqueStringName = Opaque<8>;
    pub type OpaqueNodePath = Opaque<8>;
    pub type OpaqueArray = Opaque<8>;
    pub type OpaqueDictionary = Opaque<8>;
    pub type OpaqueCallable = Opaque<16>;
    pub type OpaqueSignal = Opaque<16>;
    pub type OpaquePackedArray = Opaque<16>;
}

crate::static_assert_eq_size!(types::OpaqueVariant, [u64; 3], "Variant must span three words");
crate::static_assert_eq_size!(types::OpaqueCallable, [u64; 2]);
