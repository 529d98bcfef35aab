/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Functions and macros that are not very specific to the bridge, but come in handy.

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros

/// Verifies a condition at compile time.
#[macro_export]
macro_rules! static_assert {
    ($cond:expr) => {
        const _: () = assert!($cond);
    };
    ($cond:expr, $msg:literal) => {
        const _: () = assert!($cond, $msg);
    };
}

/// Verifies at compile time that two types `T` and `U` have the same size.
#[macro_export]
macro_rules! static_assert_eq_size {
    ($T:ty, $U:ty) => {
        $crate::static_assert!(std::mem::size_of::<$T>() == std::mem::size_of::<$U>());
    };
    ($T:ty, $U:ty, $msg:literal) => {
        $crate::static_assert!(std::mem::size_of::<$T>() == std::mem::size_of::<$U>(), $msg);
    };
}

/// Trace output.
#[cfg(feature = "trace")]
#[macro_export]
macro_rules! out {
    ()                          => (eprintln!());
    ($fmt:literal)              => (eprintln!($fmt));
    ($fmt:literal, $($arg:tt)*) => (eprintln!($fmt, $($arg)*));
}

/// Trace output.
#[cfg(not(feature = "trace"))]
#[macro_export]
macro_rules! out {
    ()                          => ({});
    ($fmt:literal)              => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt); });
    ($fmt:literal, $($arg:tt)*) => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt, $($arg)*); };)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Utility functions

/// Explicitly cast away `const` from a pointer, similar to C++ `const_cast`.
pub fn force_mut_ptr<T>(ptr: *const T) -> *mut T {
    ptr as *mut T
}

/// If `ptr` is not null, returns `Some(mapper(ptr))`; otherwise `None`.
#[inline]
pub fn ptr_then<T, R, F>(ptr: *mut T, mapper: F) -> Option<R>
where
    F: FnOnce(*mut T) -> R,
{
    if ptr.is_null() {
        None
    } else {
        Some(mapper(ptr))
    }
}

/// Null-terminated copy of `s`, with interior NULs replaced so that the engine sees the whole message.
pub fn to_c_string(s: &str) -> std::ffi::CString {
    let bytes: Vec<u8> = s.bytes().map(|b| if b == 0 { b'?' } else { b }).collect();

    // Interior NULs were replaced above.
    std::ffi::CString::new(bytes).unwrap_or_default()
}

/// Returns an ad-hoc hash of any object.
pub fn hash_value<T: std::hash::Hash>(t: &T) -> u64 {
    use std::hash::Hasher;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    t.hash(&mut hasher);
    hasher.finish()
}

/// Prints a diagnostic to stderr and aborts the process.
///
/// Used where no logging channel is available yet (binding missing) and unwinding into the engine is not an option.
#[cold]
pub fn abort_with(msg: &str) -> ! {
    eprintln!("gdbridge: fatal: {msg}");
    std::process::abort()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_string_replaces_interior_nul() {
        let c = to_c_string("ab\0c");
        assert_eq!(c.as_bytes(), b"ab?c");
    }

    #[test]
    fn ptr_then_null() {
        let mut value = 5;
        assert_eq!(ptr_then(std::ptr::null_mut::<i32>(), |_| 1), None);
        assert_eq!(ptr_then(&mut value as *mut i32, |p| unsafe { *p }), Some(5));
    }
}
