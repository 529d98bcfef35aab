/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Internal crate of [**gdbridge**](https://docs.rs/gdbridge)
//!
//! Low-level surface of the engine's extension C ABI: pointer typedefs, the interface function table, opaque storage,
//! per-type lifecycle tables and the pointer-call frame. Do not depend on this crate directly; use `gdbridge` instead.

#![cfg_attr(test, allow(unused))]

mod binding;
mod call_frame;
mod global;
mod godot_ffi;
mod init_level;
mod interface;
mod method_table;
mod opaque;
mod string_cache;
mod toolbox;
mod variant_type;

pub mod conv;

pub use binding::{
    builtin_lifecycle_api, builtin_method_table, config, deinitialize, get_interface, get_library, initialize,
    is_initialized, load_builtin_method_table, BridgeConfig, StringEncoding, VirtualFallback,
};
pub use call_frame::{CallFrame, FrameArg, RetSlot, MAX_INLINE_ARGS, RET_WORDS};
pub use global::{Global, GlobalGuard};
pub use godot_ffi::{GodotFfi, PtrcallType};
pub use init_level::InitLevel;
pub use interface::*;
pub use method_table::{
    BuiltinLifecycleTable, BuiltinMethodBind, BuiltinMethodTable, PtrConstructorFn, CONSTRUCTORS_PER_TYPE,
    CONSTRUCTOR_COPY, CONSTRUCTOR_DEFAULT,
};
pub use opaque::{types, Opaque};
pub use string_cache::StringCache;
pub use toolbox::*;
pub use variant_type::{VariantType, VARIANT_TYPE_COUNT};

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Fetches a function of the engine interface table.
///
/// Aborts with a diagnostic if the engine left the entry empty; a missing entry is a setup error that cannot be recovered.
#[macro_export]
#[doc(hidden)]
macro_rules! interface_fn {
    ($name:ident) => {{
        unsafe {
            $crate::get_interface()
                .$name
                .unwrap_or_else(|| $crate::missing_interface_fn(stringify!($name)))
        }
    }};
}

#[doc(hidden)]
#[cold]
pub fn missing_interface_fn(name: &str) -> ! {
    abort_with(&format!("interface entry '{name}' is missing"))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[doc(hidden)]
#[inline]
pub fn default_call_error() -> GDExtensionCallError {
    GDExtensionCallError {
        error: GDEXTENSION_CALL_OK,
        argument: -1,
        expected: -1,
    }
}

/// Human-readable reason for a failed engine call, from the error struct the engine filled in.
#[doc(hidden)]
pub fn call_error_reason(err: &GDExtensionCallError, arg_types: &[VariantType]) -> String {
    let GDExtensionCallError {
        error,
        argument,
        expected,
    } = *err;

    let argc = arg_types.len();
    match error {
        GDEXTENSION_CALL_OK => "no error".to_string(),
        GDEXTENSION_CALL_ERROR_INVALID_METHOD => "method not found".to_string(),
        GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT => {
            let from = usize::try_from(argument)
                .ok()
                .and_then(|i| arg_types.get(i))
                .copied()
                .unwrap_or(VariantType::Nil);
            let to = VariantType::from_sys(expected as GDExtensionVariantType);
            let i = argument + 1;

            format!("cannot convert argument #{i} from {from:?} to {to:?}")
        }
        GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS => {
            format!("too many arguments; expected {expected}, but called with {argc}")
        }
        GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS => {
            format!("too few arguments; expected {expected}, but called with {argc}")
        }
        GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL => "instance is null".to_string(),
        GDEXTENSION_CALL_ERROR_METHOD_NOT_CONST => "method is not const".to_string(),
        GDBRIDGE_CUSTOM_CALL_ERROR => "host callable failed".to_string(),
        _ => format!("unknown reason (error code {error})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_error_reasons() {
        let mut err = default_call_error();
        assert_eq!(call_error_reason(&err, &[]), "no error");

        err.error = GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT;
        err.argument = 1;
        err.expected = VariantType::Int as i32;
        assert_eq!(
            call_error_reason(&err, &[VariantType::Bool, VariantType::String]),
            "cannot convert argument #2 from String to Int"
        );

        err.error = GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS;
        err.expected = 3;
        assert_eq!(
            call_error_reason(&err, &[VariantType::Bool]),
            "too few arguments; expected 3, but called with 1"
        );
    }
}
