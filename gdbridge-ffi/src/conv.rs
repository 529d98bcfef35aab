/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Conversions between Rust primitives and their C ABI counterparts.

use std::mem::size_of;

use crate as sys;
use crate::static_assert;

/// Infallibly convert `u32` into a `usize`.
///
/// The bridge only supports targets where `u32` can be infallibly converted into a `usize`.
pub fn u32_to_usize(i: u32) -> usize {
    static_assert!(
        size_of::<u32>() <= size_of::<usize>(),
        "gdbridge only supports targets where u32 <= usize"
    );

    i as usize
}

/// Converts an engine length/index, clamping negative values (engine error returns) to zero.
pub fn int_to_usize(i: sys::GDExtensionInt) -> usize {
    usize::try_from(i).unwrap_or(0)
}

/// Converts a host length/index into the engine's integer type, saturating on overflow.
pub fn usize_to_int(i: usize) -> sys::GDExtensionInt {
    sys::GDExtensionInt::try_from(i).unwrap_or(sys::GDExtensionInt::MAX)
}

/// Converts a rust-bool into a sys-bool.
pub const fn bool_to_sys(value: bool) -> sys::GDExtensionBool {
    value as sys::GDExtensionBool
}

/// Converts a sys-bool into a rust-bool; any non-zero value is `true`.
pub const fn bool_from_sys(value: sys::GDExtensionBool) -> bool {
    value != 0
}

pub const SYS_TRUE: sys::GDExtensionBool = bool_to_sys(true);
pub const SYS_FALSE: sys::GDExtensionBool = bool_to_sys(false);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sys_bool() {
        assert_eq!(bool_to_sys(true), SYS_TRUE);
        assert_eq!(bool_to_sys(false), SYS_FALSE);
        assert!(bool_from_sys(7));
        assert!(!bool_from_sys(SYS_FALSE));
    }

    #[test]
    fn int_conversions() {
        assert_eq!(int_to_usize(-1), 0);
        assert_eq!(int_to_usize(42), 42);
        assert_eq!(usize_to_int(3), 3);
        assert_eq!(u32_to_usize(u32::MAX), u32::MAX as usize);
    }
}
