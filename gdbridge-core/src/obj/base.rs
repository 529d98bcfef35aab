/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::marker::PhantomData;

use crate::meta::error::BridgeError;
use crate::obj::raw_gd::Ownership;
use crate::obj::{Gd, GodotClass};
use crate::registry::Handle;
use crate::sys;

/// Engine object underneath an extension instance, held inside the host state.
///
/// The base is a plain pointer that is never recorded in the pointer registry and takes no reference. It therefore acts like a
/// weak pointer and breaks the cycle between a refcounted object and the host state it owns.
///
/// The engine destroys the base object only after freeing the instance, so the pointer is valid for as long as the host state
/// exists.
pub struct Base<T: GodotClass> {
    handle: Handle,
    _class: PhantomData<fn() -> T>,
}

impl<T: GodotClass> Base<T> {
    pub(crate) fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            _class: PhantomData,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    #[doc(hidden)]
    pub fn obj_sys(&self) -> sys::GDExtensionObjectPtr {
        self.handle.ptr_unchecked()
    }

    /// Borrowed wrapper of the base object, for calling engine methods on it.
    ///
    /// The wrapper takes no reference: it does not keep the object alive and disposing it changes nothing on the engine side.
    pub fn to_gd(&self) -> Result<Gd<T>, BridgeError> {
        // SAFETY: the base outlives the host state that holds `self`.
        unsafe { Gd::from_sys(self.obj_sys(), Ownership::Borrow, None) }
    }
}

impl<T: GodotClass> fmt::Debug for Base<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base {{ class: {}, ptr: {:?} }}", T::CLASS_NAME, self.obj_sys())
    }
}
