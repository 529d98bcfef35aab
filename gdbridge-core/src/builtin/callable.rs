/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_void;
use std::fmt;

use crate::builtin::macros::opaque_builtin;
use crate::builtin::{builtin_call, GString, VarArray, Variant};
use crate::private::handle_panic;
use crate::sys;
use sys::types::OpaqueCallable;
use sys::{interface_fn, GodotFfi, VariantType};

/// A first-class function: an object method, or a host closure wrapped with [`from_fn()`](Self::from_fn).
#[repr(transparent)]
pub struct Callable {
    opaque: OpaqueCallable,
}

impl Callable {
    fn from_opaque(opaque: OpaqueCallable) -> Self {
        Self { opaque }
    }

    /// Wraps a host closure, callable from the engine (e.g. as a signal handler).
    ///
    /// The closure receives the call arguments and returns the call result, or `Err(())` to report a failed call.
    /// `name` appears in the engine's string representation of the callable.
    pub fn from_fn<F>(name: impl Into<String>, function: F) -> Self
    where
        F: FnMut(&[&Variant]) -> Result<Variant, ()> + Send + 'static,
    {
        let userdata = Box::new(FnUserdata {
            name: name.into(),
            function,
        });

        let mut info = sys::GDExtensionCallableCustomInfo {
            callable_userdata: Box::into_raw(userdata) as *mut c_void,
            // SAFETY: the library pointer is set at initialization and constant afterwards.
            token: unsafe { sys::get_library() },
            object_id: 0,
            call_func: Some(rust_callable_call::<F>),
            is_valid_func: Some(rust_callable_is_valid),
            free_func: Some(rust_callable_free::<F>),
            hash_func: Some(rust_callable_hash::<F>),
            equal_func: Some(rust_callable_equal),
            to_string_func: Some(rust_callable_to_string::<F>),
        };

        // SAFETY: the engine takes ownership of the userdata and releases it through free_func.
        unsafe { Self::new_with_uninit(|dst| interface_fn!(callable_custom_create)(dst, &mut info)) }
    }

    /// Calls the callable with arguments given as an array.
    pub fn callv(&self, args: &VarArray) -> Variant {
        // SAFETY: `callv` takes one Array and returns Variant.
        unsafe {
            builtin_call(VariantType::Callable, "callv", self.sys(), |frame| {
                frame.arg(args);
            })
        }
    }

    /// Calls the callable with the given arguments.
    pub fn call(&self, args: &[Variant]) -> Variant {
        let args: VarArray = args.iter().cloned().collect();
        self.callv(&args)
    }
}

opaque_builtin!(Callable => VariantType::Callable, OpaqueCallable);

impl Default for Callable {
    fn default() -> Self {
        // SAFETY: the default constructor initializes an invalid (null) callable.
        unsafe {
            Self::new_with_uninit(|dst| sys::builtin_lifecycle_api().construct_default(VariantType::Callable, dst))
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Variant::from_ffi(self) == Variant::from_ffi(other)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", Variant::from_ffi(self))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Callbacks for host closures

struct FnUserdata<F> {
    name: String,
    function: F,
}

unsafe extern "C" fn rust_callable_call<F>(
    callable_userdata: *mut c_void,
    p_args: *const sys::GDExtensionConstVariantPtr,
    p_argument_count: sys::GDExtensionInt,
    r_return: sys::GDExtensionVariantPtr,
    r_error: *mut sys::GDExtensionCallError,
) where
    F: FnMut(&[&Variant]) -> Result<Variant, ()>,
{
    let userdata = &mut *(callable_userdata as *mut FnUserdata<F>);
    let args = Variant::borrow_ref_slice(p_args, sys::conv::int_to_usize(p_argument_count));

    let name = &userdata.name;
    let function = &mut userdata.function;
    let result = handle_panic(|| format!("callable '{name}'"), || function(args.as_slice()));

    match result {
        Ok(Ok(value)) => {
            *Variant::borrow_var_sys_mut(r_return) = value;
            (*r_error).error = sys::GDEXTENSION_CALL_OK;
        }
        Ok(Err(())) | Err(_) => {
            (*r_error).error = sys::GDBRIDGE_CUSTOM_CALL_ERROR;
        }
    }
}

unsafe extern "C" fn rust_callable_free<F>(callable_userdata: *mut c_void) {
    drop(Box::from_raw(callable_userdata as *mut FnUserdata<F>));
}

unsafe extern "C" fn rust_callable_is_valid(_callable_userdata: *mut c_void) -> sys::GDExtensionBool {
    sys::conv::SYS_TRUE
}

unsafe extern "C" fn rust_callable_hash<F>(callable_userdata: *mut c_void) -> u32 {
    let userdata = &*(callable_userdata as *const FnUserdata<F>);

    // Identity hash: two closures are never equal, so the address is enough.
    let addr = userdata as *const FnUserdata<F> as usize;
    (sys::hash_value(&addr) & u64::from(u32::MAX)) as u32
}

unsafe extern "C" fn rust_callable_equal(a: *mut c_void, b: *mut c_void) -> sys::GDExtensionBool {
    sys::conv::bool_to_sys(a == b)
}

unsafe extern "C" fn rust_callable_to_string<F>(
    callable_userdata: *mut c_void,
    r_is_valid: *mut sys::GDExtensionBool,
    r_out: sys::GDExtensionStringPtr,
) {
    let userdata = &*(callable_userdata as *const FnUserdata<F>);

    *(r_out as *mut GString) = GString::from(userdata.name.as_str());
    *r_is_valid = sys::conv::SYS_TRUE;
}
