/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::Arc;

use gdbridge::sys;
use sys::VariantType;

use super::values::{Slot, TypedBuf, Value};

/// Callable implemented by the extension. Releases the extension's userdata when the last copy goes away.
pub struct CustomCallable {
    info: sys::GDExtensionCallableCustomInfo,
}

// SAFETY: the userdata of host callables is `Send`; the bridge guarantees thread-safe call functions.
unsafe impl Send for CustomCallable {}
unsafe impl Sync for CustomCallable {}

impl CustomCallable {
    pub fn hash_code(&self) -> u32 {
        match self.info.hash_func {
            // SAFETY: userdata is live until `free_func` ran in `drop()`.
            Some(hash) => unsafe { hash(self.info.callable_userdata) },
            None => 0,
        }
    }
}

impl Drop for CustomCallable {
    fn drop(&mut self) {
        if let Some(free) = self.info.free_func {
            // SAFETY: this is the last reference to the userdata.
            unsafe { free(self.info.callable_userdata) };
        }
    }
}

pub unsafe extern "C" fn callable_custom_create(
    r_callable: sys::GDExtensionUninitializedTypePtr,
    info: *mut sys::GDExtensionCallableCustomInfo,
) {
    let callable = Arc::new(CustomCallable { info: *info });
    *(r_callable as *mut *const CustomCallable) = Arc::into_raw(callable);
}

/// Invokes the callable. Returns the extension's error code on failure.
pub fn call(callable: &CustomCallable, args: &[Value]) -> Result<Value, sys::GDExtensionCallErrorType> {
    let Some(call_func) = callable.info.call_func else {
        return Err(sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD);
    };

    let cells: Vec<Slot> = args.iter().cloned().map(Slot::new).collect();
    let argv: Vec<sys::GDExtensionConstVariantPtr> = cells.iter().map(|cell| cell.ptr().cast_const()).collect();
    let ret = Slot::new(Value::Nil);
    let mut err = sys::default_call_error();

    // SAFETY: the arguments and the return cell are initialized variants that outlive the call.
    unsafe {
        call_func(
            callable.info.callable_userdata,
            argv.as_ptr(),
            argv.len() as sys::GDExtensionInt,
            ret.ptr(),
            &mut err,
        )
    };

    if err.error == sys::GDEXTENSION_CALL_OK {
        Ok(ret.get())
    } else {
        Err(err.error)
    }
}

/// Same userdata, or equal according to the extension.
pub fn equal(a: Option<&Arc<CustomCallable>>, b: Option<&Arc<CustomCallable>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
        (Some(a), Some(b)) => match a.info.equal_func {
            // SAFETY: both userdata pointers are live while their callables are.
            Some(equal) if a.info.equal_func == b.info.equal_func => unsafe {
                sys::conv::bool_from_sys(equal(a.info.callable_userdata, b.info.callable_userdata))
            },
            _ => false,
        },
        _ => false,
    }
}

pub fn stringify(callable: Option<&Arc<CustomCallable>>) -> String {
    let Some(callable) = callable else {
        return "<null callable>".to_string();
    };
    let Some(to_string) = callable.info.to_string_func else {
        return "Callable".to_string();
    };

    let out = TypedBuf::new(VariantType::String, Value::String(String::new()));
    let mut is_valid = sys::conv::SYS_FALSE;

    // SAFETY: `out` is an initialized String that the extension may assign to.
    unsafe { to_string(callable.info.callable_userdata, &mut is_valid, out.ptr()) };

    if sys::conv::bool_from_sys(is_valid) {
        out.get().text()
    } else {
        "Callable".to_string()
    }
}
