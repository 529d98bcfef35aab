/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Process-wide registries: object pointers, classes, and extension instances.
//!
//! The registries are installed at the `Core` init level and removed at its deinit. Tests can install their own.

use std::sync::Arc;

use crate::classes::Object;
use crate::meta::error::BridgeError;
use crate::obj::Gd;
use crate::sys;

pub mod callbacks;

mod classes;
mod extension;
mod instances;
mod pointers;
mod virtuals;

pub use classes::{ClassEntry, ClassRegistry, ClassTag, MethodBind, CORE_API_JSON};
pub use extension::{register_class, unregister_class, ExtensionClass, ExtensionClassInfo, ExtensionInstance, StateInit};
pub use instances::{Arena, InstanceToken};
pub use pointers::{EngineLookup, Handle, HandleKind, InstanceLookup, PointerRegistry};
pub use virtuals::{VirtualFn, VirtualSlot, VirtualTable, VirtualTableBuilder};

pub(crate) use extension::unregister_class_by_name;

/// Arena of live extension instances.
pub type InstanceArena = Arena<Arc<ExtensionInstance>>;

/// The three registries the bridge consults on every boundary crossing.
pub struct Registries {
    pub pointers: PointerRegistry,
    pub classes: ClassRegistry,
    pub instances: InstanceArena,
}

impl Registries {
    /// Registries backed by the engine, knowing the core classes.
    pub fn new() -> Self {
        Self {
            pointers: PointerRegistry::new(),
            classes: ClassRegistry::with_core_classes(),
            instances: InstanceArena::new(),
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRIES: sys::Global<Option<Arc<Registries>>> = sys::Global::default();

/// Makes `registries` the process-wide registries. Returns the previously installed ones.
pub fn install(registries: Arc<Registries>) -> Option<Arc<Registries>> {
    REGISTRIES.lock().replace(registries)
}

/// Removes the process-wide registries. Wrappers still alive afterwards fail with [`ErrorKind::NotInitialized`].
///
/// [`ErrorKind::NotInitialized`]: crate::meta::error::ErrorKind::NotInitialized
pub fn uninstall() -> Option<Arc<Registries>> {
    REGISTRIES.lock().take()
}

/// Currently installed registries.
///
/// The lock is released before returning, so callers never hold it across an engine call.
pub fn get() -> Result<Arc<Registries>, BridgeError> {
    REGISTRIES.lock().clone().ok_or_else(BridgeError::not_initialized)
}

pub fn is_installed() -> bool {
    REGISTRIES.lock().is_some()
}

/// Asks the engine to construct an object of class `name`, returning an owning wrapper.
pub fn construct(name: &str) -> Result<Gd<Object>, BridgeError> {
    Gd::<Object>::construct_by_name(name)
}

/// Engine-side dynamic cast of `object` to the class `target`. `None` if the object is not a `target`.
pub fn cast(object: &Gd<Object>, target: &str) -> Option<Gd<Object>> {
    object.cast_by_name(target).ok()
}
