/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::{StringName, Variant};
use crate::log::godot_error;
use crate::meta::error::{BridgeError, CallError, ErrorKind};
use crate::meta::{ClassName, MethodInfo};
use crate::obj::{refcount, InstanceId};
use crate::registry::{Handle, HandleKind, MethodBind, Registries};
use crate::sys;
use sys::{interface_fn, CallFrame, GodotFfi, VariantType};

/// How a new wrapper relates to the engine's reference count. Ignored for objects that are not refcounted.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Ownership {
    /// Freshly constructed through the host: the wrapper calls `init_ref` and owns the only reference.
    Constructed,

    /// The engine handed over one reference, which the wrapper now owns.
    Transferred,

    /// The engine lent the object; the wrapper takes its own reference.
    Retain,

    /// The engine lent the object; the wrapper takes no reference and does not extend its life.
    Borrow,
}

/// Whether a wrapper participates in the object's lifetime.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WrapperRole {
    /// Holds exactly one reference, if the object is refcounted.
    Owned,

    /// Contributes no reference.
    Borrowed,
}

/// Untyped object wrapper: a registry handle plus class identity and ownership state.
///
/// This should not be used directly; [`Gd<T>`](super::Gd) adds the static class on top.
#[doc(hidden)]
pub struct RawGd {
    handle: Handle,
    class: ClassName,
    id: Option<InstanceId>,
    role: WrapperRole,
    refcounted: bool,
    disposed: bool,
}

impl RawGd {
    /// Records `ptr` in the pointer registry and applies `ownership` to its reference count.
    ///
    /// `kind` overrides the handle shape the class registry would choose.
    ///
    /// # Safety
    /// `ptr` must be null or point to a live engine object.
    pub(crate) unsafe fn wrap(
        ptr: sys::GDExtensionObjectPtr,
        ownership: Ownership,
        kind: Option<HandleKind>,
    ) -> Result<Self, BridgeError> {
        if ptr.is_null() {
            return Err(BridgeError::invalid_handle("engine returned a null object"));
        }

        let registries = crate::registry::get()?;
        let id = InstanceId::of_object(ptr);
        let class = dynamic_class_name(&registries, ptr);

        let refcounted = id.is_some_and(InstanceId::is_ref_counted) || registries.classes.is_refcounted(class.as_str());
        let kind = kind.unwrap_or_else(|| {
            registries
                .classes
                .handle_kind(class.as_str(), sys::config().use_checked_handles_default)
        });

        let handle = registries.pointers.record(ptr, kind, id, &class)?;

        let counted = match (refcounted, ownership) {
            (false, _) | (_, Ownership::Transferred | Ownership::Borrow) => Ok(()),
            (true, Ownership::Constructed) => refcount::init_ref(ptr),
            (true, Ownership::Retain) => refcount::reference(ptr),
        };
        if let Err(err) = counted {
            registries.pointers.forget(&handle);
            return Err(err);
        }

        let role = match ownership {
            Ownership::Borrow => WrapperRole::Borrowed,
            _ => WrapperRole::Owned,
        };

        crate::out!("wrap {class} {ptr:?} as {role:?} ({ownership:?}, {kind:?})");
        Ok(Self {
            handle,
            class,
            id,
            role,
            refcounted,
            disposed: false,
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Dynamic class of the object when it was wrapped.
    pub fn class(&self) -> &ClassName {
        &self.class
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.id
    }

    pub fn role(&self) -> WrapperRole {
        self.role
    }

    pub fn is_refcounted(&self) -> bool {
        self.refcounted
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Pointer of the object, if this wrapper is still usable and (for checked handles) the object is alive.
    pub fn resolve(&self) -> Result<sys::GDExtensionObjectPtr, BridgeError> {
        if self.disposed {
            return Err(BridgeError::invalid_handle(format!("{} wrapper was disposed", self.class)));
        }

        crate::registry::get()?.pointers.resolve(&self.handle)
    }

    /// Liveness check that does not depend on the handle kind.
    pub fn is_instance_valid(&self) -> bool {
        !self.disposed && self.id.is_some_and(InstanceId::lookup_validity)
    }

    /// Releases this wrapper's hold on the object. A second call reports [`ErrorKind::DoubleDispose`] and changes nothing.
    pub fn dispose(&mut self) -> Result<(), BridgeError> {
        if self.disposed {
            return Err(BridgeError::new(
                ErrorKind::DoubleDispose,
                format!("{} at {:?}", self.class, self.handle.ptr_unchecked()),
            ));
        }

        self.disposed = true;
        self.release()
    }

    fn release(&self) -> Result<(), BridgeError> {
        let registries = crate::registry::get()?;
        registries.pointers.forget(&self.handle);

        if self.role == WrapperRole::Owned && self.refcounted {
            let ptr = registries.pointers.resolve(&self.handle)?;

            if refcount::unreference(ptr)? {
                crate::out!("last reference to {} {ptr:?} released; destroying", self.class);

                // SAFETY: the count reached zero, so nothing else refers to the object.
                unsafe { interface_fn!(object_destroy)(ptr) };
            }
        }

        Ok(())
    }

    /// Destroys a non-refcounted object and disposes this wrapper.
    pub fn free(&mut self) -> Result<(), BridgeError> {
        if self.refcounted {
            return Err(BridgeError::engine(format!(
                "cannot free refcounted {}; dispose its wrappers instead",
                self.class
            )));
        }

        let ptr = self.resolve()?;
        self.disposed = true;
        crate::registry::get()?.pointers.forget(&self.handle);

        // SAFETY: `ptr` was verified live above (checked handles) or is live by caller contract (plain handles).
        unsafe { interface_fn!(object_destroy)(ptr) };
        Ok(())
    }

    /// Another wrapper of the same object with the same role. Owned copies of refcounted objects take a reference.
    pub(crate) fn duplicate(&self) -> Result<Self, BridgeError> {
        let ptr = self.resolve()?;
        let registries = crate::registry::get()?;
        let handle = registries.pointers.record(ptr, self.handle.kind(), self.id, &self.class)?;

        if self.role == WrapperRole::Owned && self.refcounted {
            if let Err(err) = refcount::reference(ptr) {
                registries.pointers.forget(&handle);
                return Err(err);
            }
        }

        Ok(Self {
            handle,
            class: self.class.clone(),
            id: self.id,
            role: self.role,
            refcounted: self.refcounted,
            disposed: false,
        })
    }

    /// Like [`duplicate()`](Self::duplicate), but infallible: a wrapper that cannot be duplicated yields a disposed one.
    pub(crate) fn duplicate_or_disposed(&self) -> Self {
        self.duplicate().unwrap_or_else(|err| {
            if !self.disposed {
                godot_error!("cannot duplicate wrapper: {err}");
            }

            Self {
                handle: self.handle,
                class: self.class.clone(),
                id: self.id,
                role: self.role,
                refcounted: self.refcounted,
                disposed: true,
            }
        })
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Calls

    /// Method bind of `method`, looked up from the dynamic class first and `static_class` second.
    fn method_bind(
        &self,
        registries: &Registries,
        static_class: &str,
        method: &str,
    ) -> Result<(MethodBind, MethodInfo), BridgeError> {
        match registries.classes.method_bind(self.class.as_str(), method) {
            Ok(found) => Ok(found),
            Err(_) if static_class != self.class.as_str() => registries.classes.method_bind(static_class, method),
            Err(err) => Err(err),
        }
    }

    /// Pointer call of `method`. Returns the method's metadata next to the value, for ownership handling of objects.
    pub(crate) fn ptrcall<'a, R: GodotFfi>(
        &self,
        static_class: &str,
        method: &str,
        args: impl FnOnce(&mut CallFrame<'a>),
    ) -> Result<(R, MethodInfo), BridgeError> {
        let ptr = self.resolve()?;
        let registries = crate::registry::get()?;
        let (bind, info) = self.method_bind(&registries, static_class, method)?;
        drop(registries);

        let mut frame = CallFrame::new();
        args(&mut frame);
        let slot = frame.ret::<R>();

        // SAFETY: the bind's signature was declared by the class schema; callers push matching arguments.
        unsafe { frame.ptrcall(bind.as_sys(), ptr) };

        let value = frame.take_ret(slot);
        frame.free();
        Ok((value, info))
    }

    /// Variant call of `method`: arguments are checked and converted by the engine.
    pub(crate) fn varcall(&self, static_class: &str, method: &str, args: &[Variant]) -> Result<Variant, CallError> {
        let class = self.class.as_str();
        let bridge_err = |err| CallError::from_bridge(class, method, err);

        let ptr = self.resolve().map_err(bridge_err)?;
        let registries = crate::registry::get().map_err(bridge_err)?;
        let (bind, _info) = self.method_bind(&registries, static_class, method).map_err(bridge_err)?;
        drop(registries);

        let argv: Vec<sys::GDExtensionConstVariantPtr> = args.iter().map(Variant::var_sys_const).collect();
        let mut err = sys::default_call_error();

        // SAFETY: `argv` points to live variants for the duration of the call; the engine initializes the result.
        let result = unsafe {
            Variant::new_with_var_uninit(|dst| {
                interface_fn!(object_method_bind_call)(
                    bind.as_sys(),
                    ptr,
                    argv.as_ptr(),
                    sys::conv::usize_to_int(argv.len()),
                    dst,
                    &mut err,
                )
            })
        };

        if err.error != sys::GDEXTENSION_CALL_OK {
            let arg_types: Vec<VariantType> = args.iter().map(Variant::get_type).collect();
            return Err(CallError::from_engine(class, method, &err, &arg_types));
        }

        Ok(result)
    }
}

impl Drop for RawGd {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }

        self.disposed = true;
        match self.release() {
            Ok(()) => {}
            // Wrappers outliving the registries (e.g. in statics) have nothing left to release.
            Err(err) if err.kind() == ErrorKind::NotInitialized => {}
            Err(err) => godot_error!("releasing {} wrapper: {err}", self.class),
        }
    }
}

impl fmt::Debug for RawGd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawGd")
            .field("class", &self.class)
            .field("ptr", &self.handle.ptr_unchecked())
            .field("id", &self.id)
            .field("role", &self.role)
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Most-derived class of the object at `ptr`, as the engine reports it (extension classes included).
///
/// # Safety
/// `ptr` must point to a live engine object.
unsafe fn dynamic_class_name(registries: &Registries, ptr: sys::GDExtensionObjectPtr) -> ClassName {
    let mut found = false;
    let name = StringName::new_with_uninit(|dst| {
        found = sys::conv::bool_from_sys(interface_fn!(object_get_class_name)(ptr, sys::get_library(), dst));
    });

    if found {
        ClassName::new(&name.to_string())
    } else {
        registries
            .pointers
            .class_of(ptr)
            .unwrap_or_else(|| ClassName::new("Object"))
    }
}
