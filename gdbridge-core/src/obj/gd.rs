/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::builtin::{ArrayElement, Variant};
use crate::classes::Object;
use crate::meta::error::{BridgeError, CallError, ConvertError};
use crate::meta::{ClassName, FromGodot, GodotConvert, ReturnOwnership, ToGodot};
use crate::obj::raw_gd::{Ownership, RawGd, WrapperRole};
use crate::obj::{refcount, GodotClass, Inherits, InstanceId};
use crate::registry::{ExtensionClass, ExtensionInstance, Handle, HandleKind};
use crate::sys;
use sys::{interface_fn, CallFrame, GodotFfi};

/// Smart pointer to objects owned by the engine.
///
/// `Gd<T>` wraps an engine object of class `T` (or a subclass). What it does with the object's lifetime depends on the class
/// and on how the wrapper was obtained:
///
/// - **Refcounted** objects (`RefCounted` and subclasses): an owning `Gd` holds exactly one reference, released when the
///   wrapper is disposed or dropped. The last release destroys the object.
/// - **Manually managed** objects: the wrapper never destroys the object. Call [`free()`](Self::free) to destroy it.
/// - **Borrowed** wrappers (e.g. [`Base::to_gd()`](super::Base::to_gd)) take no reference at all.
///
/// Depending on the class, the handle inside is _checked_: each use verifies that the object is still alive, and fails with
/// [`ErrorKind::InvalidHandle`](crate::meta::error::ErrorKind::InvalidHandle) otherwise.
///
/// `Gd` is not `Send`: wrappers stay on the thread that obtained them.
pub struct Gd<T: GodotClass> {
    raw: RawGd,
    _class: PhantomData<*const T>,
}

impl<T: GodotClass> Gd<T> {
    /// Asks the engine to construct an object of class `T`, returning an owning wrapper.
    ///
    /// Refcounted objects start with a count of 1, held by the returned wrapper.
    pub fn try_new() -> Result<Self, BridgeError> {
        let object = Gd::<Object>::construct_by_name(T::CLASS_NAME)?;
        Ok(Gd::from_raw(object.raw))
    }

    /// Looks up an object by instance ID. The returned wrapper retains refcounted objects.
    pub fn from_instance_id(id: InstanceId) -> Result<Self, BridgeError> {
        // SAFETY: the engine accepts any ID and returns null for unknown ones.
        let ptr = unsafe { interface_fn!(object_get_instance_from_id)(id.to_u64()) };
        if ptr.is_null() {
            return Err(BridgeError::invalid_handle(format!("no object with instance ID {id}")));
        }

        // SAFETY: the engine just confirmed the object is alive.
        unsafe { Self::from_sys(ptr, Ownership::Retain, None) }
    }

    /// Wraps an engine pointer, verifying that the object is a `T`.
    ///
    /// # Safety
    /// `ptr` must be null or point to a live engine object.
    pub(crate) unsafe fn from_sys(
        ptr: sys::GDExtensionObjectPtr,
        ownership: Ownership,
        kind: Option<HandleKind>,
    ) -> Result<Self, BridgeError> {
        let raw = RawGd::wrap(ptr, ownership, kind)?;
        let gd = Self::from_raw(raw);

        if T::CLASS_NAME != Object::CLASS_NAME {
            crate::registry::get()?.classes.cast_ptr(ptr, T::CLASS_NAME)?;
        }

        Ok(gd)
    }

    pub(crate) fn from_raw(raw: RawGd) -> Self {
        Self {
            raw,
            _class: PhantomData,
        }
    }

    /// Returns the instance ID of this object, or `None` if the engine reported none when it was wrapped.
    pub fn instance_id(&self) -> Option<InstanceId> {
        self.raw.instance_id()
    }

    /// Dynamic class of the object, as reported by the engine when it was wrapped.
    pub fn dynamic_class(&self) -> &ClassName {
        self.raw.class()
    }

    pub fn handle(&self) -> Handle {
        self.raw.handle()
    }

    pub fn role(&self) -> WrapperRole {
        self.raw.role()
    }

    /// Engine pointer, without liveness check. Only for passing back through the ABI.
    #[doc(hidden)]
    pub fn raw_ptr(&self) -> sys::GDExtensionObjectPtr {
        self.raw.handle().ptr_unchecked()
    }

    /// Engine pointer, verified for checked handles.
    pub fn resolve(&self) -> Result<sys::GDExtensionObjectPtr, BridgeError> {
        self.raw.resolve()
    }

    /// Returns `true` if the object is still alive on the engine side and this wrapper was not disposed.
    pub fn is_instance_valid(&self) -> bool {
        self.raw.is_instance_valid()
    }

    pub fn is_disposed(&self) -> bool {
        self.raw.is_disposed()
    }

    /// Releases this wrapper's hold on the object now rather than on drop.
    ///
    /// Disposing the last owning wrapper of a refcounted object destroys it. Disposing twice is reported as
    /// [`ErrorKind::DoubleDispose`](crate::meta::error::ErrorKind::DoubleDispose) and has no effect.
    pub fn dispose(&mut self) -> Result<(), BridgeError> {
        self.raw.dispose()
    }

    /// Destroys a manually managed object. Fails for refcounted objects.
    pub fn free(&mut self) -> Result<(), BridgeError> {
        self.raw.free()
    }

    /// Converts into a wrapper of a base class. No engine call, no reference count change.
    pub fn upcast<Base>(self) -> Gd<Base>
    where
        Base: GodotClass,
        T: Inherits<Base>,
    {
        Gd::from_raw(self.raw)
    }

    /// Converts into a wrapper of a subclass, if the object is one. Keeps the same reference; `Err` returns `self`.
    pub fn try_cast<Derived: GodotClass>(self) -> Result<Gd<Derived>, Self> {
        if self.is_class(Derived::CLASS_NAME) {
            Ok(Gd::from_raw(self.raw))
        } else {
            Err(self)
        }
    }

    /// New wrapper of the same object as class `U`. Owning wrappers of refcounted objects take another reference.
    pub fn try_cast_ref<U: GodotClass>(&self) -> Result<Gd<U>, BridgeError> {
        let ptr = self.raw.resolve()?;
        crate::registry::get()?.classes.cast_ptr(ptr, U::CLASS_NAME)?;
        Ok(Gd::from_raw(self.raw.duplicate()?))
    }

    /// Untyped counterpart of [`try_cast_ref()`](Self::try_cast_ref).
    pub(crate) fn cast_by_name(&self, target: &str) -> Result<Gd<Object>, BridgeError> {
        let ptr = self.raw.resolve()?;
        crate::registry::get()?.classes.cast_ptr(ptr, target)?;
        Ok(Gd::from_raw(self.raw.duplicate()?))
    }

    /// Whether the object is an instance of `class` (or a subclass), according to the engine's cast.
    pub fn is_class(&self, class: &str) -> bool {
        let cast = || crate::registry::get()?.classes.cast_ptr(self.raw.resolve()?, class);
        cast().is_ok()
    }

    /// Current reference count of a refcounted object.
    pub fn reference_count(&self) -> Result<i64, BridgeError> {
        if !self.raw.is_refcounted() {
            return Err(BridgeError::engine(format!("{} is not refcounted", self.raw.class())));
        }

        refcount::get_reference_count(self.raw.resolve()?)
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Calls

    /// Pointer call of an engine method. `args` pushes the arguments in declaration order.
    ///
    /// ```ignore
    /// let len: i64 = phaser.ptrcall("get_range_min_hz", |_| {})?;
    /// phaser.ptrcall::<()>("set_range_min_hz", |frame| { frame.arg(40.0); })?;
    /// ```
    pub fn ptrcall<'a, R: GodotFfi>(
        &self,
        method: &str,
        args: impl FnOnce(&mut CallFrame<'a>),
    ) -> Result<R, BridgeError> {
        self.raw.ptrcall(T::CLASS_NAME, method, args).map(|(value, _info)| value)
    }

    /// Pointer call of an engine method returning an object.
    ///
    /// The method's [`ReturnOwnership`] decides how the result is wrapped; objects that must be verified on each use get
    /// checked handles.
    pub fn ptrcall_object<'a, U: GodotClass>(
        &self,
        method: &str,
        args: impl FnOnce(&mut CallFrame<'a>),
    ) -> Result<Option<Gd<U>>, BridgeError> {
        let (ptr, info) = self.raw.ptrcall::<sys::GDExtensionObjectPtr>(T::CLASS_NAME, method, args)?;
        if ptr.is_null() {
            return Ok(None);
        }

        let (ownership, kind) = match info.return_ownership {
            ReturnOwnership::Transferred => (Ownership::Transferred, None),
            ReturnOwnership::Borrowed => (Ownership::Retain, None),
            ReturnOwnership::MustAssertInstanceId => (Ownership::Retain, Some(HandleKind::Checked)),
            ReturnOwnership::LifetimeBound => (Ownership::Borrow, Some(HandleKind::Checked)),
        };

        // SAFETY: the engine just returned the object, so it is alive.
        unsafe { Gd::from_sys(ptr, ownership, kind) }.map(Some)
    }

    /// Variant call: arguments and return value are checked and converted by the engine.
    pub fn call(&self, method: &str, args: &[Variant]) -> Result<Variant, CallError> {
        self.raw.varcall(T::CLASS_NAME, method, args)
    }
}

impl Gd<Object> {
    /// Constructs an object of the class named `class`, returning an owning wrapper.
    pub fn construct_by_name(class: &str) -> Result<Self, BridgeError> {
        let ptr = crate::registry::get()?.classes.construct_raw(class)?;

        // SAFETY: freshly constructed, so alive.
        match unsafe { RawGd::wrap(ptr, Ownership::Constructed, None) } {
            Ok(raw) => Ok(Self::from_raw(raw)),
            Err(err) => {
                // SAFETY: nothing else knows about the object yet.
                unsafe { interface_fn!(object_destroy)(ptr) };
                Err(err)
            }
        }
    }
}

impl<T: ExtensionClass> Gd<T> {
    /// Shared access to the host state of an extension object.
    ///
    /// Fails with [`ErrorKind::AlreadyBound`](crate::meta::error::ErrorKind::AlreadyBound) while the state is mutably borrowed.
    pub fn with_instance<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, BridgeError> {
        self.extension_instance()?.with_state(f)
    }

    /// Exclusive access to the host state of an extension object.
    pub fn with_instance_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, BridgeError> {
        self.extension_instance()?.with_state_mut(f)
    }

    fn extension_instance(&self) -> Result<Arc<ExtensionInstance>, BridgeError> {
        let ptr = self.raw.resolve()?;
        let registries = crate::registry::get()?;

        let token = registries.pointers.instance_of(ptr).ok_or_else(|| {
            BridgeError::invalid_handle(format!("{} at {ptr:?} has no extension instance", T::CLASS_NAME))
        })?;

        registries
            .instances
            .get(token)
            .ok_or_else(|| BridgeError::invalid_handle(format!("{} instance {token:?} was freed", T::CLASS_NAME)))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Trait impls

impl<T: GodotClass> Clone for Gd<T> {
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.duplicate_or_disposed())
    }
}

/// Identity comparison: two wrappers are equal if they refer to the same object.
impl<T: GodotClass> PartialEq for Gd<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw_ptr() == other.raw_ptr()
    }
}

impl<T: GodotClass> Eq for Gd<T> {}

impl<T: GodotClass> fmt::Debug for Gd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gd")
            .field("class", self.raw.class())
            .field("id", &self.raw.instance_id())
            .field("role", &self.raw.role())
            .finish()
    }
}

/// Objects travel as `Object*`. Dead or disposed objects are passed as null.
impl<'a, T: GodotClass> sys::FrameArg<'a> for &'a Gd<T> {
    fn push_into(self, frame: &mut CallFrame<'a>) {
        frame.push_object(self.raw.resolve().unwrap_or(std::ptr::null_mut()));
    }
}

impl<T: GodotClass> GodotConvert for Gd<T> {
    type Via = sys::GDExtensionObjectPtr;
}

impl<T: GodotClass> ToGodot for Gd<T> {
    fn to_godot(&self) -> Self::Via {
        self.raw.resolve().unwrap_or(std::ptr::null_mut())
    }
}

impl<T: GodotClass> FromGodot for Gd<T> {
    fn try_from_godot(ptr: Self::Via) -> Result<Self, ConvertError> {
        if ptr.is_null() {
            return Err(ConvertError::dead_object());
        }

        // SAFETY: the value came from the engine (variant or call), which hands out live objects only.
        let raw = unsafe { RawGd::wrap(ptr, Ownership::Retain, None) }.map_err(|err| ConvertError::new(err.to_string()))?;

        let gd = Gd::<T>::from_raw(raw);
        if T::CLASS_NAME == Object::CLASS_NAME || gd.is_class(T::CLASS_NAME) {
            Ok(gd)
        } else {
            Err(ConvertError::wrong_class(T::class_name()))
        }
    }
}

impl<T: GodotClass> GodotConvert for Option<Gd<T>> {
    type Via = sys::GDExtensionObjectPtr;
}

impl<T: GodotClass> ToGodot for Option<Gd<T>> {
    fn to_godot(&self) -> Self::Via {
        self.as_ref().map_or(std::ptr::null_mut(), ToGodot::to_godot)
    }
}

impl<T: GodotClass> FromGodot for Option<Gd<T>> {
    fn try_from_godot(ptr: Self::Via) -> Result<Self, ConvertError> {
        if ptr.is_null() {
            Ok(None)
        } else {
            Gd::try_from_godot(ptr).map(Some)
        }
    }
}

impl<T: GodotClass> ArrayElement for Gd<T> {}
impl<T: GodotClass> ArrayElement for Option<Gd<T>> {}

impl<T: GodotClass> From<Gd<T>> for Variant {
    fn from(gd: Gd<T>) -> Self {
        gd.to_variant()
    }
}
