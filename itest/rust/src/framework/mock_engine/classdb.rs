/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Class database of the test engine: a fixed set of engine classes with their methods, plus registered extension classes.

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

use gdbridge::sys;
use parking_lot::Mutex;
use sys::VariantType as T;

use super::callables;
use super::logging::engine_error;
use super::objects::{self, MockObject};
use super::values::{read_string, TypedBuf, Value};

/// Why an engine call failed, in the fields of the C call error.
#[derive(Copy, Clone, Debug)]
pub struct CallFailure {
    pub error: sys::GDExtensionCallErrorType,
    pub argument: i32,
    pub expected: i32,
}

impl CallFailure {
    pub fn new(error: sys::GDExtensionCallErrorType) -> Self {
        Self {
            error,
            argument: -1,
            expected: -1,
        }
    }

    pub fn arity(error: sys::GDExtensionCallErrorType, expected: usize) -> Self {
        Self {
            expected: expected as i32,
            ..Self::new(error)
        }
    }

    pub fn argument(index: usize, expected: T) -> Self {
        Self {
            error: sys::GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT,
            argument: index as i32,
            expected: expected.sys() as i32,
        }
    }
}

pub type MethodFn = fn(&'static MockObject, &[Value]) -> Result<Value, CallFailure>;

/// Method bind. Its address is the bind pointer handed to the bridge.
pub struct MethodDef {
    pub class: &'static str,
    pub name: &'static str,
    pub hash: i64,
    pub params: &'static [T],

    /// `None` for methods without return value; `Some(Nil)` for methods returning a variant.
    pub ret: Option<T>,
    pub vararg: bool,
    pub func: MethodFn,
}

const fn method(
    class: &'static str,
    name: &'static str,
    hash: i64,
    params: &'static [T],
    ret: Option<T>,
    func: MethodFn,
) -> MethodDef {
    MethodDef {
        class,
        name,
        hash,
        params,
        ret,
        vararg: false,
        func,
    }
}

pub struct EngineClass {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub refcounted: bool,
    pub instantiable: bool,
    pub methods: &'static [MethodDef],
}

const fn class(
    name: &'static str,
    parent: Option<&'static str>,
    instantiable: bool,
    methods: &'static [MethodDef],
) -> EngineClass {
    EngineClass {
        name,
        parent,
        refcounted: false,
        instantiable,
        methods,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Engine classes

pub const INTERSECT_RAY_HASH: i64 = 1590275562;
pub const PHASER_DEFAULT_RANGE_MIN_HZ: f64 = 440.0;

static OBJECT_METHODS: [MethodDef; 9] = [
    method("Object", "get_class", 201670096, &[], Some(T::String), object_get_class),
    method("Object", "is_class", 3927539163, &[T::String], Some(T::Bool), object_is_class),
    method("Object", "set", 3776071444, &[T::StringName, T::Nil], None, object_set),
    method("Object", "get", 2760726917, &[T::StringName], Some(T::Nil), object_get),
    method("Object", "notification", 4023243586, &[T::Int, T::Bool], None, object_notification),
    method("Object", "to_string", 2841200299, &[], Some(T::String), object_to_string),
    method("Object", "connect", 1518946055, &[T::StringName, T::Callable, T::Int], Some(T::Int), object_connect),
    MethodDef {
        vararg: true,
        ..method("Object", "emit_signal", 4047867050, &[T::StringName], Some(T::Int), object_emit_signal)
    },
    method("Object", "get_instance_id", 3905245786, &[], Some(T::Int), object_get_instance_id),
];

static REFCOUNTED_METHODS: [MethodDef; 4] = [
    method("RefCounted", "init_ref", 2240911060, &[], Some(T::Bool), |o, _| Ok(Value::Bool(o.init_ref()))),
    method("RefCounted", "reference", 2240911060, &[], Some(T::Bool), |o, _| Ok(Value::Bool(o.reference()))),
    method("RefCounted", "unreference", 2240911060, &[], Some(T::Bool), |o, _| Ok(Value::Bool(o.unreference()))),
    method("RefCounted", "get_reference_count", 3905245786, &[], Some(T::Int), |o, _| {
        Ok(Value::Int(o.reference_count()))
    }),
];

static NODE_METHODS: [MethodDef; 3] = [
    method("Node", "add_child", 3863233950, &[T::Object], None, node_add_child),
    method("Node", "get_child", 541253412, &[T::Int], Some(T::Object), |o, args| {
        Ok(Value::Object(o.child(args[0].as_int())))
    }),
    method("Node", "get_child_count", 894402480, &[], Some(T::Int), |o, _| Ok(Value::Int(o.child_count()))),
];

static PHASER_METHODS: [MethodDef; 2] = [
    method("AudioEffectPhaser", "set_range_min_hz", 373806689, &[T::Float], None, |o, args| {
        o.set_property("range_min_hz", Value::Float(args[0].as_float()));
        Ok(Value::Nil)
    }),
    method("AudioEffectPhaser", "get_range_min_hz", 1740695150, &[], Some(T::Float), |o, _| {
        Ok(o.property("range_min_hz").unwrap_or(Value::Float(PHASER_DEFAULT_RANGE_MIN_HZ)))
    }),
];

static TRANSITION_METHODS: [MethodDef; 2] = [
    method(
        "AnimationNodeStateMachineTransition",
        "set_advance_condition",
        3304788590,
        &[T::StringName],
        None,
        transition_set_advance_condition,
    ),
    method(
        "AnimationNodeStateMachineTransition",
        "get_advance_condition",
        2002593661,
        &[],
        Some(T::StringName),
        |o, _| Ok(o.property("advance_condition").unwrap_or(Value::StringName(String::new()))),
    ),
];

static SPACE_STATE_METHODS: [MethodDef; 1] = [method(
    "PhysicsDirectSpaceState2D",
    "intersect_ray",
    INTERSECT_RAY_HASH,
    &[T::Vector2, T::Vector2],
    Some(T::Dictionary),
    space_state_intersect_ray,
)];

const MANY_INTS: [T; 40] = [T::Int; 40];

static ARITY_PROBE_METHODS: [MethodDef; 3] = [
    method("ArityProbe", "none", 100_001, &[], Some(T::Int), |_, _| Ok(Value::Int(7))),
    method("ArityProbe", "sum3", 100_003, &[T::Int, T::Int, T::Int], Some(T::Int), sum_ints),
    method("ArityProbe", "sum_many", 100_040, &MANY_INTS, Some(T::Int), sum_ints),
];

static ENGINE_CLASSES: [EngineClass; 14] = [
    class("Object", None, true, &OBJECT_METHODS),
    EngineClass {
        refcounted: true,
        ..class("RefCounted", Some("Object"), true, &REFCOUNTED_METHODS)
    },
    class("Resource", Some("RefCounted"), true, &[]),
    class("Node", Some("Object"), true, &NODE_METHODS),
    class("CanvasItem", Some("Node"), false, &[]),
    class("Control", Some("CanvasItem"), true, &[]),
    class("Container", Some("Control"), true, &[]),
    class("TabContainer", Some("Container"), true, &[]),
    class("AudioEffect", Some("Resource"), false, &[]),
    class("AudioEffectPhaser", Some("AudioEffect"), true, &PHASER_METHODS),
    class("AnimationNodeStateMachineTransition", Some("Resource"), true, &TRANSITION_METHODS),
    class("PhysicsDirectSpaceState2D", Some("Object"), false, &SPACE_STATE_METHODS),
    class("PhysicsDirectSpaceState2DExtension", Some("PhysicsDirectSpaceState2D"), true, &[]),
    class("ArityProbe", Some("Object"), true, &ARITY_PROBE_METHODS),
];

pub fn engine_class(name: &str) -> Option<&'static EngineClass> {
    ENGINE_CLASSES.iter().find(|class| class.name == name)
}

pub fn engine_class_is_refcounted(class: &EngineClass) -> bool {
    let mut current = Some(class);
    while let Some(class) = current {
        if class.refcounted {
            return true;
        }
        current = class.parent.and_then(engine_class);
    }
    false
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Extension classes

/// Extension class as registered through `classdb_register_extension_class`.
pub struct ExtensionClassDef {
    pub name: String,
    pub parent: String,
    pub info: sys::GDExtensionClassCreationInfo,

    /// Memoized `get_virtual_call_data` answers, as addresses (0 for "use the engine's default").
    virtuals: Mutex<HashMap<String, usize>>,
}

// SAFETY: the creation info holds function pointers and the bridge's class userdata, which the bridge shares across threads.
unsafe impl Send for ExtensionClassDef {}
unsafe impl Sync for ExtensionClassDef {}

impl ExtensionClassDef {
    /// Userdata for calls of virtual method `name`, or `None` if the class does not override it.
    pub fn virtual_call_data(&self, name: &str) -> Option<*mut c_void> {
        if let Some(&cached) = self.virtuals.lock().get(name) {
            return (cached != 0).then_some(cached as *mut c_void);
        }

        let get_data = self.info.get_virtual_call_data_func?;
        let sname = TypedBuf::new(T::StringName, Value::StringName(name.to_string()));

        // SAFETY: the userdata was registered with this class and lives until it is unregistered.
        let data = unsafe { get_data(self.info.class_userdata, sname.ptr()) };
        self.virtuals.lock().insert(name.to_string(), data as usize);

        (!data.is_null()).then_some(data)
    }
}

static EXTENSIONS: sys::Global<HashMap<String, Arc<ExtensionClassDef>>> = sys::Global::default();
static TAGS: sys::Global<HashMap<String, usize>> = sys::Global::default();

pub fn extension_class(name: &str) -> Option<Arc<ExtensionClassDef>> {
    EXTENSIONS.lock().get(name).cloned()
}

pub fn class_exists(name: &str) -> bool {
    engine_class(name).is_some() || extension_class(name).is_some()
}

fn parent_of(name: &str) -> Option<String> {
    if let Some(extension) = extension_class(name) {
        return Some(extension.parent.clone());
    }
    engine_class(name)?.parent.map(str::to_string)
}

/// Whether `derived` is `base` or one of its subclasses.
pub fn inherits(derived: &str, base: &str) -> bool {
    let mut current = Some(derived.to_string());
    while let Some(class) = current {
        if class == base {
            return true;
        }
        current = parent_of(&class);
    }
    false
}

/// Class name behind a tag handed out by `classdb_get_class_tag`.
pub fn class_of_tag(tag: *mut c_void) -> Option<String> {
    // SAFETY: tags are leaked boxed strings of this module; unknown pointers are rejected first.
    let known = TAGS.lock().values().any(|&t| t == tag as usize);
    known.then(|| unsafe { (*(tag as *const String)).clone() })
}

pub unsafe extern "C" fn classdb_get_class_tag(class_name: sys::GDExtensionConstStringNamePtr) -> *mut c_void {
    let name = read_string(class_name);
    if !class_exists(&name) {
        return ptr::null_mut();
    }

    let mut tags = TAGS.lock();
    let tag = tags
        .entry(name.clone())
        .or_insert_with(|| Box::into_raw(Box::new(name)) as usize);
    *tag as *mut c_void
}

pub unsafe extern "C" fn classdb_get_method_bind(
    class_name: sys::GDExtensionConstStringNamePtr,
    method_name: sys::GDExtensionConstStringNamePtr,
    hash: sys::GDExtensionInt,
) -> sys::GDExtensionMethodBindPtr {
    let class = read_string(class_name);
    let method = read_string(method_name);

    let Some(found) = engine_class(&class).and_then(|c| c.methods.iter().find(|m| m.name == method)) else {
        engine_error(&format!("no method bind {class}::{method}"));
        return ptr::null();
    };

    if found.hash != hash {
        engine_error(&format!("hash mismatch for {class}::{method}: expected {}, got {hash}", found.hash));
        return ptr::null();
    }

    found as *const MethodDef as sys::GDExtensionMethodBindPtr
}

pub unsafe extern "C" fn classdb_register_extension_class(
    _library: sys::GDExtensionClassLibraryPtr,
    class_name: sys::GDExtensionConstStringNamePtr,
    parent_name: sys::GDExtensionConstStringNamePtr,
    funcs: *const sys::GDExtensionClassCreationInfo,
) {
    let name = read_string(class_name);
    let parent = read_string(parent_name);

    if !class_exists(&parent) {
        engine_error(&format!("cannot register {name}: unknown parent class {parent}"));
        return;
    }
    if funcs.is_null() {
        engine_error(&format!("cannot register {name}: no creation info"));
        return;
    }

    let def = Arc::new(ExtensionClassDef {
        name: name.clone(),
        parent,
        info: *funcs,
        virtuals: Mutex::new(HashMap::new()),
    });

    let previous = EXTENSIONS.lock().insert(name.clone(), def);
    if previous.is_some() {
        engine_error(&format!("class {name} was registered twice"));
    }
}

pub unsafe extern "C" fn classdb_unregister_extension_class(
    _library: sys::GDExtensionClassLibraryPtr,
    class_name: sys::GDExtensionConstStringNamePtr,
) {
    let name = read_string(class_name);
    let removed = EXTENSIONS.lock().remove(&name);
    if removed.is_none() {
        engine_error(&format!("cannot unregister unknown extension class {name}"));
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Extension hooks, as the engine invokes them

pub fn extension_get(object: &MockObject, name: &str) -> Option<Value> {
    let binding = object.extension()?;
    let get = binding.class.info.get_func?;

    let sname = TypedBuf::new(T::StringName, Value::StringName(name.to_string()));
    let ret = TypedBuf::new(T::Nil, Value::Nil);

    // SAFETY: the instance is bound to a live object; `ret` is an initialized variant.
    let found = unsafe { get(binding.instance, sname.ptr(), ret.ptr()) };
    sys::conv::bool_from_sys(found).then(|| ret.get())
}

pub fn extension_set(object: &MockObject, name: &str, value: &Value) -> bool {
    let Some(binding) = object.extension() else {
        return false;
    };
    let Some(set) = binding.class.info.set_func else {
        return false;
    };

    let sname = TypedBuf::new(T::StringName, Value::StringName(name.to_string()));
    let value = TypedBuf::new(T::Nil, value.clone());

    // SAFETY: see `extension_get()`.
    sys::conv::bool_from_sys(unsafe { set(binding.instance, sname.ptr(), value.ptr()) })
}

pub fn extension_notify(object: &MockObject, what: i32, reversed: bool) {
    let Some(binding) = object.extension() else {
        return;
    };

    if let Some(notify) = binding.class.info.notification_func {
        // SAFETY: see `extension_get()`.
        unsafe { notify(binding.instance, what, sys::conv::bool_to_sys(reversed)) };
    }
}

pub fn extension_to_string(object: &MockObject) -> Option<String> {
    let binding = object.extension()?;
    let to_string = binding.class.info.to_string_func?;

    let out = TypedBuf::new(T::String, Value::String(String::new()));
    let mut is_valid = sys::conv::SYS_FALSE;

    // SAFETY: see `extension_get()`; `out` is an initialized String.
    unsafe { to_string(binding.instance, &mut is_valid, out.ptr()) };
    sys::conv::bool_from_sys(is_valid).then(|| out.get().text())
}

/// Entry of a property list reported by an extension class.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportedProperty {
    pub name: String,
    pub variant_type: T,
    pub class_name: String,
    pub hint_string: String,
    pub usage: u32,
}

/// Property list the editor would show for `object`, fetched and released through the extension hooks.
pub fn extension_property_list(object: &MockObject) -> Vec<ReportedProperty> {
    let Some(binding) = object.extension() else {
        return Vec::new();
    };
    let info = &binding.class.info;
    let (Some(get_list), Some(free_list)) = (info.get_property_list_func, info.free_property_list_func) else {
        return Vec::new();
    };

    let mut count = 0u32;
    // SAFETY: see `extension_get()`; the list is valid until handed back to `free_list`.
    unsafe {
        let list = get_list(binding.instance, &mut count);
        let reported = (0..count as usize)
            .map(|i| {
                let entry = &*list.add(i);
                ReportedProperty {
                    name: read_string(entry.name),
                    variant_type: T::from_sys(entry.type_),
                    class_name: read_string(entry.class_name),
                    hint_string: read_string(entry.hint_string),
                    usage: entry.usage,
                }
            })
            .collect();

        free_list(binding.instance, list, count);
        reported
    }
}

/// Value the editor's revert button would restore, if the property can be reverted.
pub fn extension_property_revert(object: &MockObject, name: &str) -> Option<Value> {
    let binding = object.extension()?;
    let can_revert = binding.class.info.property_can_revert_func?;
    let get_revert = binding.class.info.property_get_revert_func?;

    let sname = TypedBuf::new(T::StringName, Value::StringName(name.to_string()));

    // SAFETY: see `extension_get()`.
    unsafe {
        if !sys::conv::bool_from_sys(can_revert(binding.instance, sname.ptr())) {
            return None;
        }

        let ret = TypedBuf::new(T::Nil, Value::Nil);
        sys::conv::bool_from_sys(get_revert(binding.instance, sname.ptr(), ret.ptr())).then(|| ret.get())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Method implementations

fn object_get_class(object: &'static MockObject, _args: &[Value]) -> Result<Value, CallFailure> {
    Ok(Value::String(object.class_name()))
}

fn object_is_class(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    Ok(Value::Bool(inherits(&object.class_name(), &args[0].text())))
}

fn object_set(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    let name = args[0].text();
    if !extension_set(object, &name, &args[1]) {
        object.set_property(&name, args[1].clone());
    }
    Ok(Value::Nil)
}

fn object_get(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    let name = args[0].text();
    let value = object
        .property(&name)
        .or_else(|| extension_get(object, &name))
        .unwrap_or(Value::Nil);
    Ok(value)
}

fn object_notification(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    extension_notify(object, args[0].as_int() as i32, args[1].as_bool());
    Ok(Value::Nil)
}

fn object_to_string(object: &'static MockObject, _args: &[Value]) -> Result<Value, CallFailure> {
    let text = extension_to_string(object).unwrap_or_else(|| object.describe());
    Ok(Value::String(text))
}

fn object_connect(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    object.connect(&args[0].text(), args[1].clone());
    Ok(Value::Int(0))
}

fn object_emit_signal(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    let signal = args[0].text();
    for callable in object.connections(&signal) {
        if let Value::Callable(Some(callable)) = callable {
            if let Err(code) = callables::call(&callable, &args[1..]) {
                engine_error(&format!("handler of signal {signal} failed with code {code}"));
            }
        }
    }
    Ok(Value::Int(0))
}

fn object_get_instance_id(object: &'static MockObject, _args: &[Value]) -> Result<Value, CallFailure> {
    Ok(Value::Int(object.id() as i64))
}

fn node_add_child(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    match &args[0] {
        Value::Object(Some(child)) if child.is_alive() => {
            object.add_child(*child);
            Ok(Value::Nil)
        }
        _ => Err(CallFailure::argument(0, T::Object)),
    }
}

fn transition_set_advance_condition(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    let condition = Value::StringName(args[0].text());
    object.set_property("advance_condition", condition);
    object_emit_signal(object, &[Value::StringName("advance_condition_changed".to_string())])
        .map(|_| Value::Nil)
}

/// Answers from the extension's `_intersect_ray` override if there is one, else reports no hit (empty dictionary).
fn space_state_intersect_ray(object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    let Some(binding) = object.extension() else {
        return Ok(Value::new_dictionary(Vec::new()));
    };
    let Some(data) = binding.class.virtual_call_data("_intersect_ray") else {
        return Ok(Value::new_dictionary(Vec::new()));
    };
    let Some(call) = binding.class.info.call_virtual_with_data_func else {
        return Ok(Value::new_dictionary(Vec::new()));
    };

    let name = TypedBuf::new(T::StringName, Value::StringName("_intersect_ray".to_string()));
    let from = TypedBuf::new(T::Vector2, args[0].clone());
    let to = TypedBuf::new(T::Vector2, args[1].clone());
    let argv = [from.ptr() as sys::GDExtensionConstTypePtr, to.ptr() as sys::GDExtensionConstTypePtr];
    let ret = TypedBuf::new(T::Dictionary, Value::new_dictionary(Vec::new()));

    // SAFETY: `data` came from this class's `get_virtual_call_data`; arguments and return are initialized.
    unsafe { call(binding.instance, name.ptr(), data, argv.as_ptr(), ret.ptr()) };
    Ok(ret.get())
}

fn sum_ints(_object: &'static MockObject, args: &[Value]) -> Result<Value, CallFailure> {
    Ok(Value::Int(args.iter().map(Value::as_int).sum()))
}

/// Engine-side free of an object, as if a script called `free()` on it.
pub fn free_from_engine(ptr: sys::GDExtensionObjectPtr) {
    // SAFETY: callers pass pointers they got from this engine.
    if let Some(object) = unsafe { objects::from_ptr(ptr) } {
        objects::destroy(object);
    }
}
