/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::macros::opaque_builtin;
use crate::builtin::{builtin_call, StringName, Variant};
use crate::obj::{GodotClass, Gd};
use crate::sys;
use sys::types::OpaqueSignal;
use sys::{GodotFfi, VariantType};

/// A signal of a specific object, as a first-class value.
#[repr(transparent)]
pub struct Signal {
    opaque: OpaqueSignal,
}

impl Signal {
    fn from_opaque(opaque: OpaqueSignal) -> Self {
        Self { opaque }
    }

    /// Refers to signal `name` of `object`. Does not check whether the signal exists.
    pub fn from_object_signal<T: GodotClass>(object: &Gd<T>, name: &str) -> Self {
        let name = StringName::from(name);
        let object_ptr = object.raw_ptr();

        // SAFETY: constructor 2 of Signal takes (Object*, StringName); objects are passed as `Object**`.
        unsafe {
            Self::new_with_uninit(|dst| {
                let args = [
                    &object_ptr as *const sys::GDExtensionObjectPtr as sys::GDExtensionConstTypePtr,
                    name.sys_const(),
                ];
                sys::builtin_lifecycle_api().construct_with(VariantType::Signal, 2, dst, &args)
            })
        }
    }

    /// Name of the signal.
    pub fn name(&self) -> StringName {
        // SAFETY: `get_name` takes no arguments and returns StringName.
        unsafe { builtin_call(VariantType::Signal, "get_name", self.sys(), |_| {}) }
    }
}

opaque_builtin!(Signal => VariantType::Signal, OpaqueSignal);

impl Default for Signal {
    fn default() -> Self {
        // SAFETY: the default constructor initializes a null signal.
        unsafe {
            Self::new_with_uninit(|dst| sys::builtin_lifecycle_api().construct_default(VariantType::Signal, dst))
        }
    }
}

impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        Variant::from_ffi(self) == Variant::from_ffi(other)
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signal({})", self.name())
    }
}
