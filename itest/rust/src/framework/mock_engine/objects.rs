/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine objects: identity, reference count, extension binding and the pointer-call entry points.

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use gdbridge::sys;
use parking_lot::Mutex;
use sys::VariantType;

use super::classdb::{self, CallFailure, EngineClass, ExtensionClassDef, MethodDef};
use super::logging::engine_error;
use super::values::{self, read_typed, read_variant, write_typed, write_variant, Value};

pub const NOTIFICATION_POSTINITIALIZE: i32 = 0;
pub const NOTIFICATION_PREDELETE: i32 = 1;

const REFCOUNTED_ID_BIT: u64 = 1 << 63;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static LIVE: sys::Global<HashMap<u64, &'static MockObject>> = sys::Global::default();
static DESTROYED: sys::Global<Vec<u64>> = sys::Global::default();

/// Extension class bound to an engine object by `object_set_instance`.
#[derive(Clone)]
pub struct ExtensionBinding {
    pub class: Arc<ExtensionClassDef>,
    pub instance: sys::GDExtensionClassInstancePtr,
}

#[derive(Default)]
struct ObjectState {
    extension: Option<ExtensionBinding>,
    properties: HashMap<String, Value>,
    connections: Vec<(String, Value)>,
    children: Vec<&'static MockObject>,
}

/// Engine object. Leaked on construction, so pointers stay dereferenceable after destruction; `alive` tells them apart.
pub struct MockObject {
    id: u64,
    class: &'static EngineClass,
    alive: AtomicBool,
    refcount: AtomicI64,
    state: Mutex<ObjectState>,
}

// SAFETY: the raw instance pointer is an opaque token of the bridge; all mutable state sits behind atomics or the mutex.
unsafe impl Send for MockObject {}
unsafe impl Sync for MockObject {}

impl MockObject {
    fn create(class: &'static EngineClass) -> &'static MockObject {
        let mut id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        if classdb::engine_class_is_refcounted(class) {
            id |= REFCOUNTED_ID_BIT;
        }

        let object: &'static MockObject = Box::leak(Box::new(MockObject {
            id,
            class,
            alive: AtomicBool::new(true),
            refcount: AtomicI64::new(0),
            state: Mutex::new(ObjectState::default()),
        }));

        LIVE.lock().insert(id, object);
        object
    }

    pub fn ptr(&self) -> sys::GDExtensionObjectPtr {
        self as *const MockObject as sys::GDExtensionObjectPtr
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn engine_class(&self) -> &'static EngineClass {
        self.class
    }

    /// Most-derived class, extension classes included.
    pub fn class_name(&self) -> String {
        match self.extension() {
            Some(binding) => binding.class.name.clone(),
            None => self.class.name.to_string(),
        }
    }

    pub fn describe(&self) -> String {
        format!("<{}#{}>", self.class_name(), self.id as i64)
    }

    pub fn extension(&self) -> Option<ExtensionBinding> {
        self.state.lock().extension.clone()
    }

    fn bind_extension(&self, binding: ExtensionBinding) {
        self.state.lock().extension = Some(binding);
    }

    // Reference counting, without automatic destruction: the bridge destroys objects whose count reached zero.

    pub fn init_ref(&self) -> bool {
        self.refcount.store(1, Ordering::Release);
        true
    }

    pub fn reference(&self) -> bool {
        self.refcount.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Returns whether the count reached zero.
    pub fn unreference(&self) -> bool {
        self.refcount.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub fn reference_count(&self) -> i64 {
        self.refcount.load(Ordering::Acquire)
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.state.lock().properties.get(name).cloned()
    }

    pub fn set_property(&self, name: &str, value: Value) {
        let previous = self.state.lock().properties.insert(name.to_string(), value);
        drop(previous);
    }

    pub fn connect(&self, signal: &str, callable: Value) {
        self.state.lock().connections.push((signal.to_string(), callable));
    }

    pub fn connections(&self, signal: &str) -> Vec<Value> {
        let state = self.state.lock();
        state
            .connections
            .iter()
            .filter(|(name, _)| name == signal)
            .map(|(_, callable)| callable.clone())
            .collect()
    }

    pub fn add_child(&self, child: &'static MockObject) {
        self.state.lock().children.push(child);
    }

    pub fn child(&self, index: i64) -> Option<&'static MockObject> {
        let index = usize::try_from(index).ok()?;
        self.state.lock().children.get(index).copied()
    }

    pub fn child_count(&self) -> i64 {
        self.state.lock().children.len() as i64
    }
}

/// # Safety
/// `ptr` must be null or returned by this engine.
pub unsafe fn from_ptr(ptr: *const c_void) -> Option<&'static MockObject> {
    (ptr as *const MockObject).as_ref()
}

pub fn lookup(id: u64) -> Option<&'static MockObject> {
    LIVE.lock().get(&id).copied()
}

pub fn was_destroyed(id: u64) -> bool {
    DESTROYED.lock().contains(&id)
}

/// New engine object of `class`, with a reference count of zero.
pub fn construct(class: &'static EngineClass) -> &'static MockObject {
    MockObject::create(class)
}

/// Engine-side destruction: notifies and frees the extension instance, then destroys children.
pub fn destroy(object: &'static MockObject) {
    if !object.is_alive() {
        engine_error(&format!("object_destroy: {} was already destroyed", object.id as i64));
        return;
    }

    if let Some(binding) = object.extension() {
        let info = &binding.class.info;

        // SAFETY: the instance was bound by the bridge and is freed exactly once, here.
        unsafe {
            if let Some(notify) = info.notification_func {
                notify(binding.instance, NOTIFICATION_PREDELETE, sys::conv::SYS_TRUE);
            }
            if let Some(free) = info.free_instance_func {
                free(info.class_userdata, binding.instance);
            }
        }
    }

    let state = std::mem::take(&mut *object.state.lock());
    object.alive.store(false, Ordering::Release);
    LIVE.lock().remove(&object.id);
    DESTROYED.lock().push(object.id);

    for &child in &state.children {
        if child.is_alive() {
            destroy(child);
        }
    }
    drop(state);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions

pub unsafe extern "C" fn classdb_construct_object(class_name: sys::GDExtensionConstStringNamePtr) -> sys::GDExtensionObjectPtr {
    let name = values::read_string(class_name);

    if let Some(extension) = classdb::extension_class(&name) {
        let Some(create) = extension.info.create_instance_func else {
            engine_error(&format!("extension class {name} has no create function"));
            return ptr::null_mut();
        };

        let object = create(extension.info.class_userdata);
        if let Some(object) = from_ptr(object) {
            if let (Some(binding), Some(notify)) = (object.extension(), extension.info.notification_func) {
                notify(binding.instance, NOTIFICATION_POSTINITIALIZE, sys::conv::SYS_FALSE);
            }
        }
        return object;
    }

    match classdb::engine_class(&name) {
        Some(class) if class.instantiable => construct(class).ptr(),
        Some(_) => {
            engine_error(&format!("class {name} is not instantiable"));
            ptr::null_mut()
        }
        None => {
            engine_error(&format!("cannot construct unknown class {name}"));
            ptr::null_mut()
        }
    }
}

pub unsafe extern "C" fn object_destroy(object: sys::GDExtensionObjectPtr) {
    match from_ptr(object) {
        Some(object) => destroy(object),
        None => engine_error("object_destroy: null object"),
    }
}

pub unsafe extern "C" fn object_get_instance_id(object: sys::GDExtensionConstObjectPtr) -> sys::GDObjectInstanceID {
    from_ptr(object).filter(|o| o.is_alive()).map_or(0, MockObject::id)
}

pub unsafe extern "C" fn object_get_instance_from_id(id: sys::GDObjectInstanceID) -> sys::GDExtensionObjectPtr {
    lookup(id).map_or(ptr::null_mut(), MockObject::ptr)
}

pub unsafe extern "C" fn object_get_class_name(
    object: sys::GDExtensionConstObjectPtr,
    _library: sys::GDExtensionClassLibraryPtr,
    r_class_name: sys::GDExtensionUninitializedStringNamePtr,
) -> sys::GDExtensionBool {
    let name = from_ptr(object).map_or_else(|| "Object".to_string(), MockObject::class_name);
    write_typed(VariantType::StringName, r_class_name, Value::StringName(name));
    sys::conv::SYS_TRUE
}

pub unsafe extern "C" fn object_set_instance(
    object: sys::GDExtensionObjectPtr,
    class_name: sys::GDExtensionConstStringNamePtr,
    instance: sys::GDExtensionClassInstancePtr,
) {
    let name = values::read_string(class_name);
    let (Some(object), Some(class)) = (from_ptr(object), classdb::extension_class(&name)) else {
        engine_error(&format!("object_set_instance: unknown object or extension class {name}"));
        return;
    };

    object.bind_extension(ExtensionBinding { class, instance });
}

pub unsafe extern "C" fn object_cast_to(
    object: sys::GDExtensionConstObjectPtr,
    class_tag: *mut c_void,
) -> sys::GDExtensionObjectPtr {
    let (Some(object), Some(target)) = (from_ptr(object), classdb::class_of_tag(class_tag)) else {
        return ptr::null_mut();
    };

    if object.is_alive() && classdb::inherits(&object.class_name(), &target) {
        object.ptr()
    } else {
        ptr::null_mut()
    }
}

pub unsafe extern "C" fn ref_get_object(reference: sys::GDExtensionConstRefPtr) -> sys::GDExtensionObjectPtr {
    *(reference as *const sys::GDExtensionObjectPtr)
}

pub unsafe extern "C" fn ref_set_object(reference: sys::GDExtensionRefPtr, object: sys::GDExtensionObjectPtr) {
    *(reference as *mut sys::GDExtensionObjectPtr) = object;
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Method calls

unsafe fn method_of(bind: sys::GDExtensionMethodBindPtr) -> Option<&'static MethodDef> {
    (bind as *const MethodDef).as_ref()
}

pub unsafe extern "C" fn object_method_bind_ptrcall(
    bind: sys::GDExtensionMethodBindPtr,
    object: sys::GDExtensionObjectPtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
) {
    let Some(method) = method_of(bind) else {
        engine_error("ptrcall: null method bind");
        return;
    };

    let params = if method.vararg { &[][..] } else { method.params };
    let values: Vec<Value> = params
        .iter()
        .enumerate()
        .map(|(i, &ty)| read_typed(ty, *args.add(i)))
        .collect();

    let result = match from_ptr(object).filter(|o| o.is_alive()) {
        Some(object) => (method.func)(object, &values),
        None => Err(CallFailure::new(sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL)),
    };

    let value = result.unwrap_or_else(|failure| {
        engine_error(&format!("ptrcall {}::{} failed with code {}", method.class, method.name, failure.error));
        Value::Nil
    });

    if let Some(ret_ty) = method.ret {
        write_typed(ret_ty, ret, value);
    }
}

pub unsafe extern "C" fn object_method_bind_call(
    bind: sys::GDExtensionMethodBindPtr,
    object: sys::GDExtensionObjectPtr,
    args: *const sys::GDExtensionConstVariantPtr,
    argc: sys::GDExtensionInt,
    r_ret: sys::GDExtensionUninitializedVariantPtr,
    r_error: *mut sys::GDExtensionCallError,
) {
    let argc = usize::try_from(argc).unwrap_or(0);
    let values: Vec<Value> = (0..argc).map(|i| read_variant(*args.add(i))).collect();

    let result = match (method_of(bind), from_ptr(object).filter(|o| o.is_alive())) {
        (None, _) => Err(CallFailure::new(sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD)),
        (Some(_), None) => Err(CallFailure::new(sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL)),
        (Some(method), Some(object)) => check_args(method, values).and_then(|values| (method.func)(object, &values)),
    };

    let mut err = sys::default_call_error();
    let value = match result {
        Ok(value) => value,
        Err(failure) => {
            err.error = failure.error;
            err.argument = failure.argument;
            err.expected = failure.expected;
            Value::Nil
        }
    };

    write_variant(r_ret, value);
    if !r_error.is_null() {
        *r_error = err;
    }
}

/// Arity and type checks of a variant call. Converts int arguments where floats are expected.
fn check_args(method: &MethodDef, values: Vec<Value>) -> Result<Vec<Value>, CallFailure> {
    let expected = method.params.len();
    if values.len() < expected {
        return Err(CallFailure::arity(sys::GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS, expected));
    }
    if values.len() > expected && !method.vararg {
        return Err(CallFailure::arity(sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS, expected));
    }

    let mut values = values;
    for (i, &param) in method.params.iter().enumerate() {
        let actual = values[i].variant_type();
        let compatible = param == VariantType::Nil
            || actual == param
            || (param == VariantType::Float && actual == VariantType::Int)
            || (param == VariantType::StringName && actual == VariantType::String)
            || (param == VariantType::String && actual == VariantType::StringName)
            || (param == VariantType::Object && actual == VariantType::Nil);

        if !compatible {
            return Err(CallFailure::argument(i, param));
        }
        let value = std::mem::replace(&mut values[i], Value::Nil);
        values[i] = values::coerce(param, value);
    }

    Ok(values)
}
