/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Host-defined subclasses of engine classes: the class trait, per-instance records, and engine-side registration.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::builtin::{StringName, Variant};
use crate::log::godot_warn;
use crate::meta::error::{BridgeError, ErrorKind};
use crate::meta::{ClassName, PropertyInfo};
use crate::obj::{Base, GodotClass};
use crate::private::handle_panic;
use crate::registry::{callbacks, ClassEntry, Handle, InstanceToken, VirtualSlot, VirtualTable, VirtualTableBuilder};
use crate::sys;
use sys::{interface_fn, VirtualFallback};

/// Host type that extends an engine class.
///
/// Implemented next to [`GodotClass`], whose `Base` names the engine class being extended. Every hook except `init` is
/// optional; hooks run on whichever engine thread raised the event.
#[allow(unused_variables)]
pub trait ExtensionClass: GodotClass + Send + Sync {
    /// Creates the host state. `base` refers to the engine object being constructed.
    fn init(base: Base<Self::Base>) -> Self;

    /// Declares the virtual methods this class overrides.
    fn register_virtuals(virtuals: &mut VirtualTableBuilder<Self>) {}

    fn on_notification(&mut self, what: i32) {}

    /// Dynamic property read, consulted after the engine's own properties. `None` if unknown.
    fn get_property(&self, name: &str) -> Option<Variant> {
        None
    }

    /// Dynamic property write. Returns whether the property was handled.
    fn set_property(&mut self, name: &str, value: &Variant) -> bool {
        false
    }

    /// Dynamic properties, as shown in the editor.
    fn property_list(&self) -> Vec<PropertyInfo> {
        Vec::new()
    }

    /// Value the editor reverts `name` to, if it can be reverted.
    fn property_get_revert(&self, name: &str) -> Option<Variant> {
        None
    }

    /// Replaces the engine's default string representation, if `Some`.
    fn to_string(&self) -> Option<String> {
        None
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Type-erased [`ExtensionClass::init`], producing the boxed state of one class in an instance's chain.
pub type StateInit = fn(Handle) -> Result<Box<dyn Any + Send + Sync>, BridgeError>;

/// Registration-time information of an extension class. Handed to the engine as class userdata.
pub struct ExtensionClassInfo {
    pub class: ClassName,
    pub parent: ClassName,

    /// Nearest engine class in the chain; the engine object of every instance is of this class.
    pub engine_base: ClassName,

    /// Info of the parent, if the parent is itself an extension class.
    pub parent_extension: Option<Arc<ExtensionClassInfo>>,

    pub vtable: VirtualTable,
    pub init_state: StateInit,
}

impl ExtensionClassInfo {
    /// Override of `name` in this class or the nearest extension ancestor that has one.
    ///
    /// Without any, the fallback of this class applies: `None` lets the engine run its default.
    pub fn resolve_virtual(&self, name: &str, fallback: VirtualFallback) -> Option<&VirtualSlot> {
        let mut current = Some(self);
        while let Some(info) = current {
            if let Some(slot) = info.vtable.get(name) {
                return Some(slot);
            }
            current = info.parent_extension.as_deref();
        }

        self.vtable.fallback_slot(name, fallback)
    }

    /// Extension ancestors, nearest first. Excludes `self`.
    pub fn extension_ancestors(&self) -> impl Iterator<Item = &ExtensionClassInfo> {
        std::iter::successors(self.parent_extension.as_deref(), |info| info.parent_extension.as_deref())
    }
}

impl fmt::Debug for ExtensionClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionClassInfo")
            .field("class", &self.class)
            .field("parent", &self.parent)
            .field("engine_base", &self.engine_base)
            .field("overrides", &self.vtable.len())
            .finish()
    }
}

fn init_state<T: ExtensionClass>(base: Handle) -> Result<Box<dyn Any + Send + Sync>, BridgeError> {
    let class = T::class_name();

    // Host init() runs before the arena is locked, so it may call back into the bridge.
    let state = handle_panic(|| format!("{class}::init()"), || T::init(Base::from_handle(base)))
        .map_err(|msg| BridgeError::engine(format!("{class}::init() failed: {msg}")))?;

    Ok(Box::new(state))
}

type State = RwLock<Box<dyn Any + Send + Sync>>;

/// Host half of an extension object: state plus a link to the engine twin.
///
/// Holds one state per extension class in the chain, the instance's own class first. Lives in the instance arena from
/// the engine's create hook until its free hook.
pub struct ExtensionInstance {
    token: InstanceToken,
    class: ClassName,
    base: Handle,
    states: Vec<(TypeId, State)>,
}

impl ExtensionInstance {
    pub(crate) fn new(
        token: InstanceToken,
        class: ClassName,
        base: Handle,
        state: Box<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            token,
            class,
            base,
            states: vec![state_entry(state)],
        }
    }

    /// Adds the states of extension ancestors, nearest first.
    pub(crate) fn with_ancestor_states(mut self, states: Vec<Box<dyn Any + Send + Sync>>) -> Self {
        self.states.extend(states.into_iter().map(state_entry));
        self
    }

    pub fn token(&self) -> InstanceToken {
        self.token
    }

    pub fn class(&self) -> &ClassName {
        &self.class
    }

    /// Handle of the engine twin. Plain, as the twin outlives the instance.
    pub fn base(&self) -> Handle {
        self.base
    }

    /// Shared access to the state of type `T`. Fails with [`ErrorKind::AlreadyBound`] while that state is borrowed
    /// mutably.
    pub fn with_state<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, BridgeError> {
        let guard = self.state::<T>()?.try_read().ok_or_else(|| self.bound_error("shared"))?;
        let state = guard.downcast_ref::<T>().ok_or_else(|| self.type_error::<T>())?;
        Ok(f(state))
    }

    /// Exclusive access to the state of type `T`. Fails with [`ErrorKind::AlreadyBound`] while that state is borrowed,
    /// which includes re-entrant upcalls from inside `f`.
    pub fn with_state_mut<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, BridgeError> {
        let mut guard = self.state::<T>()?.try_write().ok_or_else(|| self.bound_error("exclusive"))?;
        let state = guard.downcast_mut::<T>().ok_or_else(|| self.type_error::<T>())?;
        Ok(f(state))
    }

    fn state<T: 'static>(&self) -> Result<&State, BridgeError> {
        self.states
            .iter()
            .find(|(type_id, _)| *type_id == TypeId::of::<T>())
            .map(|(_, state)| state)
            .ok_or_else(|| self.type_error::<T>())
    }

    fn bound_error(&self, access: &str) -> BridgeError {
        BridgeError::new(
            ErrorKind::AlreadyBound,
            format!("{} instance {:?}: {access} access conflicts with an active borrow", self.class, self.token),
        )
    }

    fn type_error<T>(&self) -> BridgeError {
        BridgeError::new(
            ErrorKind::WrongKind,
            format!("{} instance does not hold a {}", self.class, type_name::<T>()),
        )
    }
}

fn state_entry(state: Box<dyn Any + Send + Sync>) -> (TypeId, State) {
    ((*state).type_id(), RwLock::new(state))
}

impl fmt::Debug for ExtensionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionInstance")
            .field("token", &self.token)
            .field("class", &self.class)
            .field("base", &self.base)
            .finish()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Registration

/// Registers `T` with the class registry and the engine.
///
/// The parent must be a known engine class or a registered extension class. Registering a class again replaces the
/// previous registration.
pub fn register_class<T: ExtensionClass>() -> Result<(), BridgeError> {
    let registries = crate::registry::get()?;
    let class = T::class_name();
    let parent = <T::Base as GodotClass>::class_name();

    let Some(parent_entry) = registries.classes.get(parent.as_str()) else {
        return Err(BridgeError::engine(format!(
            "cannot register {class}: parent class {parent} is unknown"
        )));
    };

    let parent_extension = parent_entry.extension.clone();
    let engine_base = match &parent_extension {
        Some(parent_info) => parent_info.engine_base.clone(),
        None => parent.clone(),
    };

    let mut builder = VirtualTableBuilder::<T>::new();
    T::register_virtuals(&mut builder);
    let vtable = builder
        .build(class.clone())
        .with_engine_virtuals(registries.classes.virtual_methods(engine_base.as_str()));

    let info = Arc::new(ExtensionClassInfo {
        class: class.clone(),
        parent: parent.clone(),
        engine_base,
        parent_extension,
        vtable,
        init_state: init_state::<T>,
    });

    let was_extension = registries.classes.get(class.as_str()).is_some_and(|entry| entry.is_extension());

    let mut entry = ClassEntry::new(class.as_str(), Some(parent.as_str()))
        .with_refcounted(T::IS_REFCOUNTED || registries.classes.is_refcounted(parent.as_str()));
    entry.extension = Some(info.clone());
    let previous = registries.classes.register(entry)?;

    // The engine still points at the old class userdata, which `previous` keeps alive until it is retired.
    if was_extension {
        unregister_in_engine(&class);
    }
    drop(previous);

    let creation_info = callbacks::creation_info::<T>(Arc::as_ptr(&info));
    let class_sname = class.to_string_name();
    let parent_sname = parent.to_string_name();

    // SAFETY: class userdata stays alive in the registry entry until the class is unregistered.
    unsafe {
        interface_fn!(classdb_register_extension_class)(
            sys::get_library(),
            class_sname.string_sys(),
            parent_sname.string_sys(),
            &creation_info,
        );
    }

    crate::out!("registered extension class {class} : {parent}");
    Ok(())
}

/// Removes `T` from the engine and the class registry.
pub fn unregister_class<T: ExtensionClass>() -> Result<(), BridgeError> {
    unregister_class_by_name(&T::class_name())
}

pub(crate) fn unregister_class_by_name(class: &ClassName) -> Result<(), BridgeError> {
    let registries = crate::registry::get()?;

    match registries.classes.get(class.as_str()) {
        Some(entry) if entry.is_extension() => {
            unregister_in_engine(class);
            registries.classes.unregister(class.as_str());
            Ok(())
        }
        _ => {
            godot_warn!("cannot unregister {class}: not a registered extension class");
            Err(BridgeError::engine(format!("{class} is not a registered extension class")))
        }
    }
}

fn unregister_in_engine(class: &ClassName) {
    let class_sname = StringName::from(class.as_str());

    // SAFETY: the class was registered with the engine by this library.
    unsafe {
        interface_fn!(classdb_unregister_extension_class)(sys::get_library(), class_sname.string_sys());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(state: Box<dyn Any + Send + Sync>) -> ExtensionInstance {
        ExtensionInstance::new(
            InstanceToken::new(1, 0),
            ClassName::new("Counter"),
            Handle::plain(0x80 as sys::GDExtensionObjectPtr),
            state,
        )
    }

    #[test]
    fn state_access() {
        let instance = instance(Box::new(5i64));

        instance.with_state_mut(|n: &mut i64| *n += 1).unwrap();
        assert_eq!(instance.with_state(|n: &i64| *n).unwrap(), 6);

        let err = instance.with_state(|_: &String| ()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongKind);
    }

    #[test]
    fn ancestor_states_are_found_by_type() {
        let instance = instance(Box::new(5i64)).with_ancestor_states(vec![Box::new(String::from("parent"))]);

        instance.with_state_mut(|s: &mut String| s.push('!')).unwrap();
        assert_eq!(instance.with_state(|s: &String| s.clone()).unwrap(), "parent!");

        // Borrowing one state leaves the others free.
        let inner = instance.with_state_mut(|_: &mut i64| instance.with_state(|s: &String| s.len())).unwrap();
        assert_eq!(inner, Ok(7));

        let err = instance.with_state(|_: &f32| ()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongKind);
    }

    #[test]
    fn reentrant_access_reports_already_bound() {
        let instance = instance(Box::new(0i64));

        let inner = instance
            .with_state_mut(|_: &mut i64| instance.with_state(|n: &i64| *n))
            .unwrap();
        assert_eq!(inner.unwrap_err().kind(), ErrorKind::AlreadyBound);

        // Shared borrows nest.
        let nested = instance.with_state(|_: &i64| instance.with_state(|n: &i64| *n)).unwrap();
        assert_eq!(nested, Ok(0));
    }
}
