/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Per-class tables of virtual-method overrides, built once at registration and queried by the engine.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use crate::builtin::{
    Aabb, Basis, Color, Plane, Projection, Quaternion, Rect2, Rect2i, Rid, Transform2D, Transform3D, Vector2, Vector2i, Vector3,
    Vector3i, Vector4, Vector4i,
};
use crate::log::godot_warn;
use crate::meta::error::{BridgeError, ErrorKind};
use crate::meta::{ClassName, ParamTuple, ToGodot};
use crate::registry::ExtensionInstance;
use crate::sys;
use sys::{GodotFfi, VariantType, VirtualFallback};

/// Type-erased override: decodes the engine's argument array, runs host code on the instance, encodes the return value.
pub type VirtualFn = Box<
    dyn Fn(&ExtensionInstance, *const sys::GDExtensionConstTypePtr, sys::GDExtensionTypePtr) -> Result<(), BridgeError>
        + Send
        + Sync,
>;

/// One entry of a [`VirtualTable`]. Its address is the userdata the engine passes back on each virtual call.
pub struct VirtualSlot {
    class: ClassName,
    name: String,

    /// `None` for the stub handed out when overrides are mandatory.
    handler: Option<VirtualFn>,

    /// Return kind of a stub, if the schema declares one.
    zero_return: Option<VariantType>,
}

impl VirtualSlot {
    pub fn class(&self) -> &ClassName {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_override(&self) -> bool {
        self.handler.is_some()
    }

    /// Runs the override for `instance`. `method` is the name the engine called, reported by the deny stub.
    ///
    /// # Safety
    /// `args` must hold the arguments of this virtual method in virtual-call layout, and `ret` must point to a return buffer
    /// of the method's return type.
    pub(crate) unsafe fn dispatch(
        &self,
        method: &str,
        instance: &ExtensionInstance,
        args: *const sys::GDExtensionConstTypePtr,
        ret: sys::GDExtensionTypePtr,
    ) -> Result<(), BridgeError> {
        match &self.handler {
            Some(handler) => handler(instance, args, ret),
            None => {
                godot_warn!(
                    "virtual method {}::{} is not overridden and engine defaults are disabled; returning zero",
                    self.class,
                    method
                );
                write_zero_return(self.zero_return, ret);
                Ok(())
            }
        }
    }
}

/// Zeroes a virtual-call return buffer of kind `ty`.
///
/// Handle kinds arrive default-initialized and are left as they are; plain-data kinds arrive uninitialized.
///
/// # Safety
/// `ret` must be null or point to a return buffer of kind `ty`.
unsafe fn write_zero_return(ty: Option<VariantType>, ret: sys::GDExtensionTypePtr) {
    let Some(size) = ty.and_then(zero_return_size) else {
        return;
    };

    if !ret.is_null() {
        std::ptr::write_bytes(ret as *mut u8, 0, size);
    }
}

/// Byte size of a plain-data return value, for which all-zero bits are the zero value.
fn zero_return_size(ty: VariantType) -> Option<usize> {
    let size = match ty {
        VariantType::Bool => size_of::<sys::GDExtensionBool>(),
        VariantType::Int => size_of::<i64>(),
        VariantType::Float => size_of::<f64>(),
        VariantType::Vector2 => size_of::<Vector2>(),
        VariantType::Vector2i => size_of::<Vector2i>(),
        VariantType::Rect2 => size_of::<Rect2>(),
        VariantType::Rect2i => size_of::<Rect2i>(),
        VariantType::Vector3 => size_of::<Vector3>(),
        VariantType::Vector3i => size_of::<Vector3i>(),
        VariantType::Transform2D => size_of::<Transform2D>(),
        VariantType::Vector4 => size_of::<Vector4>(),
        VariantType::Vector4i => size_of::<Vector4i>(),
        VariantType::Plane => size_of::<Plane>(),
        VariantType::Quaternion => size_of::<Quaternion>(),
        VariantType::Aabb => size_of::<Aabb>(),
        VariantType::Basis => size_of::<Basis>(),
        VariantType::Transform3D => size_of::<Transform3D>(),
        VariantType::Projection => size_of::<Projection>(),
        VariantType::Color => size_of::<Color>(),
        VariantType::Rid => size_of::<Rid>(),
        VariantType::Object => size_of::<sys::GDExtensionObjectPtr>(),
        _ => return None,
    };

    Some(size)
}

impl fmt::Debug for VirtualSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualSlot")
            .field("class", &self.class)
            .field("name", &self.name)
            .field("is_override", &self.is_override())
            .field("zero_return", &self.zero_return)
            .finish()
    }
}

/// Overrides of one extension class, keyed by engine virtual-method name.
///
/// Slots are boxed so their addresses stay stable for as long as the table lives.
#[derive(Debug)]
pub struct VirtualTable {
    class: ClassName,
    slots: HashMap<String, Box<VirtualSlot>>,

    /// Stubs of engine virtuals with a known return kind.
    deny_stubs: HashMap<String, Box<VirtualSlot>>,

    /// Stub for names the schema doesn't declare.
    deny_stub: Box<VirtualSlot>,
}

impl VirtualTable {
    /// Table without overrides.
    pub fn empty(class: ClassName) -> Self {
        VirtualTableBuilder::<()>::new().build(class)
    }

    pub fn class(&self) -> &ClassName {
        &self.class
    }

    /// Declares the engine's virtual methods with their return kinds, so the stub for a missing override can zero the
    /// right number of bytes.
    pub fn with_engine_virtuals(mut self, virtuals: impl IntoIterator<Item = (String, Option<VariantType>)>) -> Self {
        for (name, zero_return) in virtuals {
            if self.slots.contains_key(&name) {
                continue;
            }

            let stub = VirtualSlot {
                class: self.class.clone(),
                name: name.clone(),
                handler: None,
                zero_return,
            };
            self.deny_stubs.insert(name, Box::new(stub));
        }

        self
    }

    /// Slot the engine should call for `name`.
    ///
    /// `None` tells the engine to run its own default, which only happens if `fallback` allows it.
    pub fn resolve(&self, name: &str, fallback: VirtualFallback) -> Option<&VirtualSlot> {
        self.get(name).or_else(|| self.fallback_slot(name, fallback))
    }

    /// Override of `name` in this table alone.
    pub fn get(&self, name: &str) -> Option<&VirtualSlot> {
        self.slots.get(name).map(|slot| &**slot)
    }

    /// What a missing override of `name` resolves to: nothing, or a stub that zeroes the return value.
    pub fn fallback_slot(&self, name: &str, fallback: VirtualFallback) -> Option<&VirtualSlot> {
        match fallback {
            VirtualFallback::Allow => None,
            VirtualFallback::Deny => Some(self.deny_stubs.get(name).map_or(&*self.deny_stub, |stub| &**stub)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Names of all overridden methods, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Collects the overrides of an extension class whose state is `T`.
///
/// ```ignore
/// fn register_virtuals(virtuals: &mut VirtualTableBuilder<Self>) {
///     virtuals.add("_process", |this: &mut Self, (delta,): (f64,)| this.elapsed += delta);
/// }
/// ```
pub struct VirtualTableBuilder<T> {
    handlers: HashMap<String, VirtualFn>,
    _state: PhantomData<fn(&mut T)>,
}

impl<T: Send + Sync + 'static> VirtualTableBuilder<T> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            _state: PhantomData,
        }
    }

    /// Overrides the virtual method `name`. A later override of the same name replaces the earlier one.
    ///
    /// Arguments are decoded into `Args`; the handler gets exclusive access to the instance state.
    pub fn add<Args, Ret, F>(&mut self, name: &str, function: F) -> &mut Self
    where
        Args: ParamTuple,
        Ret: ToGodot,
        F: Fn(&mut T, Args) -> Ret + Send + Sync + 'static,
    {
        let method = name.to_string();

        let handler: VirtualFn = Box::new(move |instance, args, ret| {
            // SAFETY: the engine passes `Args::LEN` arguments of this method's signature.
            let args = unsafe { Args::from_ptrcall_args(args, sys::PtrcallType::Virtual) }.map_err(|err| {
                BridgeError::new(
                    ErrorKind::WrongKind,
                    format!("arguments of {}::{method}: {err}", instance.class()),
                )
            })?;

            let value = instance.with_state_mut(|state: &mut T| function(state, args))?;

            // SAFETY: `ret` points to a buffer of the method's return type, which is `Ret::Via`.
            unsafe { value.to_godot().move_return_ptr(ret, sys::PtrcallType::Virtual) };
            Ok(())
        });

        self.handlers.insert(name.to_string(), handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn build(self, class: ClassName) -> VirtualTable {
        let slots = self
            .handlers
            .into_iter()
            .map(|(name, handler)| {
                let slot = VirtualSlot {
                    class: class.clone(),
                    name: name.clone(),
                    handler: Some(handler),
                    zero_return: None,
                };
                (name, Box::new(slot))
            })
            .collect();

        let deny_stub = Box::new(VirtualSlot {
            class: class.clone(),
            name: String::from("<not overridden>"),
            handler: None,
            zero_return: None,
        });

        VirtualTable {
            class,
            slots,
            deny_stubs: HashMap::new(),
            deny_stub,
        }
    }
}

impl<T: Send + Sync + 'static> Default for VirtualTableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Handle, InstanceToken};

    #[derive(Default)]
    struct Mover {
        elapsed: f64,
        steps: i64,
    }

    fn instance_of(state: Mover) -> ExtensionInstance {
        ExtensionInstance::new(
            InstanceToken::new(0, 0),
            ClassName::new("Mover"),
            Handle::plain(0x100 as sys::GDExtensionObjectPtr),
            Box::new(state),
        )
    }

    fn table() -> VirtualTable {
        let mut builder = VirtualTableBuilder::<Mover>::new();
        builder
            .add("_process", |this: &mut Mover, (delta,): (f64,)| {
                this.elapsed += delta;
                this.steps += 1;
            })
            .add("_get_steps", |this: &mut Mover, (): ()| this.steps);

        builder.build(ClassName::new("Mover"))
    }

    #[test]
    fn override_updates_state_and_returns() {
        let table = table();
        let instance = instance_of(Mover::default());

        let delta = 0.25f64;
        let args = [&delta as *const f64 as sys::GDExtensionConstTypePtr];
        let process = table.resolve("_process", VirtualFallback::Allow).unwrap();
        unsafe { process.dispatch("_process", &instance, args.as_ptr(), std::ptr::null_mut()) }.unwrap();
        unsafe { process.dispatch("_process", &instance, args.as_ptr(), std::ptr::null_mut()) }.unwrap();

        let mut ret = 0i64;
        let get_steps = table.resolve("_get_steps", VirtualFallback::Allow).unwrap();
        unsafe { get_steps.dispatch("_get_steps", &instance, std::ptr::null(), &mut ret as *mut i64 as sys::GDExtensionTypePtr) }
            .unwrap();

        assert_eq!(ret, 2);
        let elapsed = instance.with_state(|this: &Mover| this.elapsed).unwrap();
        assert_eq!(elapsed, 0.5);
    }

    #[test]
    fn missing_override_follows_fallback() {
        let table = table().with_engine_virtuals([
            ("_get_speed".to_string(), Some(VariantType::Float)),
            ("_get_bounds".to_string(), Some(VariantType::Rect2)),
            ("_process".to_string(), None),
        ]);
        assert_eq!(table.len(), 2);
        assert!(table.resolve("_process", VirtualFallback::Deny).unwrap().is_override());

        assert!(table.resolve("_get_speed", VirtualFallback::Allow).is_none());

        let stub = table.resolve("_get_speed", VirtualFallback::Deny).unwrap();
        assert!(!stub.is_override());

        let instance = instance_of(Mover::default());
        let mut ret = 7.5f64;
        unsafe { stub.dispatch("_get_speed", &instance, std::ptr::null(), &mut ret as *mut f64 as sys::GDExtensionTypePtr) }
            .unwrap();
        assert_eq!(ret, 0.0);

        let mut bounds = Rect2::new(Vector2::new(1.0, 2.0), Vector2::new(3.0, 4.0));
        let stub = table.resolve("_get_bounds", VirtualFallback::Deny).unwrap();
        unsafe { stub.dispatch("_get_bounds", &instance, std::ptr::null(), &mut bounds as *mut Rect2 as sys::GDExtensionTypePtr) }
            .unwrap();
        assert_eq!(bounds, Rect2::default());

        // Undeclared names get the generic stub, which cannot know the buffer's size.
        let mut untouched = 7i64;
        let stub = table.resolve("_ready", VirtualFallback::Deny).unwrap();
        unsafe { stub.dispatch("_ready", &instance, std::ptr::null(), &mut untouched as *mut i64 as sys::GDExtensionTypePtr) }
            .unwrap();
        assert_eq!(untouched, 7);
    }

    #[test]
    fn state_type_mismatch_is_reported() {
        let mut builder = VirtualTableBuilder::<String>::new();
        builder.add("_touch", |this: &mut String, (): ()| this.push('x'));
        let table = builder.build(ClassName::new("Mover"));

        let instance = instance_of(Mover::default());
        let slot = table.resolve("_touch", VirtualFallback::Allow).unwrap();
        let err = unsafe { slot.dispatch("_touch", &instance, std::ptr::null(), std::ptr::null_mut()) }.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongKind);
    }
}
