/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! What the engine stores behind variants, strings and containers.
//!
//! Memory layout of the handles the bridge sees:
//! - variant (24 bytes): word 0 is a boxed [`Value`], null for nil; a zeroed cell is therefore a valid nil;
//! - `String`, `StringName`, `NodePath`: boxed Rust string;
//! - `Array`, `Dictionary`: `Arc` pointer, shared between copies;
//! - `Callable`: `Arc` pointer or null;
//! - `Signal`, packed arrays: boxed data, deep-copied.

use std::collections::hash_map::DefaultHasher;
use std::ffi::c_void;
use std::hash::{Hash, Hasher};
use std::ptr;
use std::sync::Arc;

use gdbridge::sys;
use parking_lot::Mutex;
use sys::VariantType;

use super::callables::{self, CustomCallable};
use super::objects::{self, MockObject};

pub type ArrayData = Arc<Mutex<Vec<Slot>>>;
pub type DictionaryData = Arc<Mutex<Vec<(Value, Slot)>>>;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    StringName(String),
    NodePath(String),

    /// Plain-data kinds (vectors, matrices, colors, RIDs) as their raw bytes.
    Pod(VariantType, Vec<u8>),

    /// Does not keep the object alive; `None` also for objects that died.
    Object(Option<&'static MockObject>),
    Callable(Option<Arc<CustomCallable>>),
    Signal(SignalData),
    Dictionary(DictionaryData),
    Array(ArrayData),
    Packed(PackedData),
}

#[derive(Clone, Default, Debug, Eq, PartialEq)]
pub struct SignalData {
    pub object_id: u64,
    pub name: String,
}

impl Value {
    pub fn variant_type(&self) -> VariantType {
        match self {
            Value::Nil => VariantType::Nil,
            Value::Bool(_) => VariantType::Bool,
            Value::Int(_) => VariantType::Int,
            Value::Float(_) => VariantType::Float,
            Value::String(_) => VariantType::String,
            Value::StringName(_) => VariantType::StringName,
            Value::NodePath(_) => VariantType::NodePath,
            Value::Pod(ty, _) => *ty,
            Value::Object(_) => VariantType::Object,
            Value::Callable(_) => VariantType::Callable,
            Value::Signal(_) => VariantType::Signal,
            Value::Dictionary(_) => VariantType::Dictionary,
            Value::Array(_) => VariantType::Array,
            Value::Packed(data) => data.variant_type(),
        }
    }

    pub fn new_array(values: Vec<Value>) -> Self {
        Value::Array(Arc::new(Mutex::new(values.into_iter().map(Slot::new).collect())))
    }

    pub fn new_dictionary(entries: Vec<(Value, Value)>) -> Self {
        let entries = entries.into_iter().map(|(k, v)| (k, Slot::new(v))).collect();
        Value::Dictionary(Arc::new(Mutex::new(entries)))
    }

    /// Text of string-like values, empty for everything else.
    pub fn text(&self) -> String {
        match self {
            Value::String(s) | Value::StringName(s) | Value::NodePath(s) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
            Value::Bool(b) => i64::from(*b),
            _ => 0,
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            _ => false,
        }
    }
}

/// Zero value of each type, as the engine's default constructors produce it.
pub fn default_value(ty: VariantType) -> Value {
    match ty {
        VariantType::Nil => Value::Nil,
        VariantType::Bool => Value::Bool(false),
        VariantType::Int => Value::Int(0),
        VariantType::Float => Value::Float(0.0),
        VariantType::String => Value::String(String::new()),
        VariantType::StringName => Value::StringName(String::new()),
        VariantType::NodePath => Value::NodePath(String::new()),
        VariantType::Object => Value::Object(None),
        VariantType::Callable => Value::Callable(None),
        VariantType::Signal => Value::Signal(SignalData::default()),
        VariantType::Dictionary => Value::new_dictionary(Vec::new()),
        VariantType::Array => Value::new_array(Vec::new()),
        ty if ty.is_packed_array() => Value::Packed(PackedData::empty(ty)),
        ty => Value::Pod(ty, vec![0; pod_size(ty)]),
    }
}

/// Converts `value` for storage as `ty`, the way the engine's typed slots do. Mismatches become the zero value.
pub fn coerce(ty: VariantType, value: Value) -> Value {
    if ty == VariantType::Nil || value.variant_type() == ty {
        return value;
    }

    match (ty, value) {
        (VariantType::Float, Value::Int(i)) => Value::Float(i as f64),
        (VariantType::Int, Value::Float(f)) => Value::Int(f as i64),
        (VariantType::String, Value::StringName(s) | Value::NodePath(s)) => Value::String(s),
        (VariantType::StringName, Value::String(s)) => Value::StringName(s),
        (VariantType::NodePath, Value::String(s)) => Value::NodePath(s),
        (ty, _) => default_value(ty),
    }
}

pub fn pod_size(ty: VariantType) -> usize {
    match ty {
        VariantType::Bool => 1,
        VariantType::Int | VariantType::Float | VariantType::Object | VariantType::Rid => 8,
        VariantType::Vector2 | VariantType::Vector2i => 8,
        VariantType::Vector3 | VariantType::Vector3i => 12,
        VariantType::Rect2 | VariantType::Rect2i => 16,
        VariantType::Vector4 | VariantType::Vector4i | VariantType::Plane | VariantType::Quaternion => 16,
        VariantType::Color => 16,
        VariantType::Transform2D | VariantType::Aabb => 24,
        VariantType::Basis => 36,
        VariantType::Transform3D => 48,
        VariantType::Projection => 64,
        _ => 0,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Variant cells

/// 24-byte variant storage, aligned like the bridge's opaque variant.
#[repr(C, align(8))]
pub struct VariantCell([u64; 3]);

/// Variant with a stable address, so that index operators can hand out pointers into containers.
pub struct Slot(Box<VariantCell>);

impl Slot {
    pub fn new(value: Value) -> Self {
        let slot = Slot(Box::new(VariantCell([0; 3])));
        // SAFETY: the cell is zeroed, i.e. an initialized nil.
        unsafe { write_variant(slot.ptr(), value) };
        slot
    }

    pub fn ptr(&self) -> *mut c_void {
        &*self.0 as *const VariantCell as *mut c_void
    }

    pub fn get(&self) -> Value {
        // SAFETY: the cell always holds an initialized variant.
        unsafe { read_variant(self.ptr()) }
    }
}

impl Clone for Slot {
    fn clone(&self) -> Self {
        Slot::new(self.get())
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        // SAFETY: see `get()`.
        unsafe { drop_variant(self.ptr()) }
    }
}

/// Overwrites the cell at `dst` without releasing what it held before.
///
/// # Safety
/// `dst` must point to 24 writable, 8-aligned bytes.
pub unsafe fn write_variant(dst: *mut c_void, value: Value) {
    let boxed = match value {
        Value::Nil => ptr::null_mut(),
        value => Box::into_raw(Box::new(value)),
    };

    let cell = dst as *mut u64;
    cell.write(boxed as u64);
    cell.add(1).write(0);
    cell.add(2).write(0);
}

/// # Safety
/// `src` must point to an initialized variant cell.
pub unsafe fn peek_variant<R>(src: *const c_void, f: impl FnOnce(&Value) -> R) -> R {
    let boxed = *(src as *const *const Value);
    match boxed.as_ref() {
        Some(value) => f(value),
        None => f(&Value::Nil),
    }
}

/// # Safety
/// `src` must point to an initialized variant cell.
pub unsafe fn read_variant(src: *const c_void) -> Value {
    peek_variant(src, Value::clone)
}

/// Moves the value out, leaving nil behind.
///
/// # Safety
/// `src` must point to an initialized variant cell.
pub unsafe fn take_variant(src: *mut c_void) -> Value {
    let word = src as *mut *mut Value;
    let boxed = std::mem::replace(&mut *word, ptr::null_mut());

    if boxed.is_null() {
        Value::Nil
    } else {
        *Box::from_raw(boxed)
    }
}

/// # Safety
/// `src` must point to an initialized variant cell.
pub unsafe fn drop_variant(src: *mut c_void) {
    drop(take_variant(src));
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Typed storage

unsafe fn word(ptr: *const c_void) -> *mut c_void {
    *(ptr as *const *mut c_void)
}

unsafe fn set_word(ptr: *mut c_void, value: *mut c_void) {
    *(ptr as *mut *mut c_void) = value;
}

/// # Safety
/// `ptr` must be null or a string handle word of this module.
pub unsafe fn read_string(ptr: *const c_void) -> String {
    if ptr.is_null() {
        return String::new();
    }

    (word(ptr) as *const String).as_ref().cloned().unwrap_or_default()
}

unsafe fn clone_arc<T>(raw: *mut c_void) -> Option<Arc<T>> {
    if raw.is_null() {
        return None;
    }

    Arc::increment_strong_count(raw as *const T);
    Some(Arc::from_raw(raw as *const T))
}

/// Value stored at `ptr` as type `ty`. `Nil` reads a variant cell.
///
/// # Safety
/// `ptr` must point to an initialized value of type `ty`.
pub unsafe fn read_typed(ty: VariantType, ptr: *const c_void) -> Value {
    match ty {
        VariantType::Nil => read_variant(ptr),
        VariantType::Bool => Value::Bool(*(ptr as *const u8) != 0),
        VariantType::Int => Value::Int(*(ptr as *const i64)),
        VariantType::Float => Value::Float(*(ptr as *const f64)),
        VariantType::String => Value::String(read_string(ptr)),
        VariantType::StringName => Value::StringName(read_string(ptr)),
        VariantType::NodePath => Value::NodePath(read_string(ptr)),
        VariantType::Object => Value::Object(objects::from_ptr(word(ptr))),
        VariantType::Callable => Value::Callable(clone_arc(word(ptr))),
        VariantType::Signal => Value::Signal(
            (word(ptr) as *const SignalData)
                .as_ref()
                .cloned()
                .unwrap_or_default(),
        ),
        VariantType::Dictionary => match clone_arc(word(ptr)) {
            Some(data) => Value::Dictionary(data),
            None => default_value(ty),
        },
        VariantType::Array => match clone_arc(word(ptr)) {
            Some(data) => Value::Array(data),
            None => default_value(ty),
        },
        ty if ty.is_packed_array() => Value::Packed(
            (word(ptr) as *const PackedData)
                .as_ref()
                .cloned()
                .unwrap_or_else(|| PackedData::empty(ty)),
        ),
        ty => {
            let bytes = std::slice::from_raw_parts(ptr as *const u8, pod_size(ty));
            Value::Pod(ty, bytes.to_vec())
        }
    }
}

/// Initializes `dst` as type `ty` from `value`, without releasing previous contents.
///
/// # Safety
/// `dst` must point to writable storage for type `ty` (at least 8 bytes, 24 for variants).
pub unsafe fn write_typed(ty: VariantType, dst: *mut c_void, value: Value) {
    if ty == VariantType::Nil {
        write_variant(dst, value);
        return;
    }

    match coerce(ty, value) {
        Value::Nil => {}
        Value::Bool(b) => *(dst as *mut u8) = u8::from(b),
        Value::Int(i) => *(dst as *mut i64) = i,
        Value::Float(f) => *(dst as *mut f64) = f,
        Value::String(s) | Value::StringName(s) | Value::NodePath(s) => {
            set_word(dst, Box::into_raw(Box::new(s)) as *mut c_void)
        }
        Value::Object(object) => {
            let ptr = object.filter(|o| o.is_alive()).map_or(ptr::null_mut(), MockObject::ptr);
            set_word(dst, ptr)
        }
        Value::Callable(callable) => {
            let raw = callable.map_or(ptr::null_mut(), |c| Arc::into_raw(c) as *mut c_void);
            set_word(dst, raw)
        }
        Value::Signal(signal) => set_word(dst, Box::into_raw(Box::new(signal)) as *mut c_void),
        Value::Dictionary(data) => set_word(dst, Arc::into_raw(data) as *mut c_void),
        Value::Array(data) => set_word(dst, Arc::into_raw(data) as *mut c_void),
        Value::Packed(data) => set_word(dst, Box::into_raw(Box::new(data)) as *mut c_void),
        Value::Pod(_, bytes) => ptr::copy_nonoverlapping(bytes.as_ptr(), dst as *mut u8, bytes.len()),
    }
}

/// Releases what `ptr` holds as type `ty`. Null handles are ignored.
///
/// # Safety
/// `ptr` must point to an initialized value of type `ty`.
pub unsafe fn drop_typed(ty: VariantType, ptr: *mut c_void) {
    let raw = match ty {
        VariantType::Nil => return drop_variant(ptr),
        ty if ty.is_handle_kind() => word(ptr),
        _ => return,
    };
    if raw.is_null() {
        return;
    }
    set_word(ptr, ptr::null_mut());

    match ty {
        VariantType::String | VariantType::StringName | VariantType::NodePath => drop(Box::from_raw(raw as *mut String)),
        VariantType::Callable => drop(Arc::from_raw(raw as *const CustomCallable)),
        VariantType::Signal => drop(Box::from_raw(raw as *mut SignalData)),
        VariantType::Dictionary => drop(DictionaryData::from_raw(raw as *const _)),
        VariantType::Array => drop(ArrayData::from_raw(raw as *const _)),
        _ => drop(Box::from_raw(raw as *mut PackedData)),
    }
}

/// Value of a given type at a stable heap address. Used for arguments and returns of engine-initiated calls.
pub struct TypedBuf {
    ty: VariantType,
    buf: Box<[u64; 8]>,
}

impl TypedBuf {
    pub fn new(ty: VariantType, value: Value) -> Self {
        let buf = Box::new([0u64; 8]);
        // SAFETY: 64 zeroed bytes fit every type.
        unsafe { write_typed(ty, buf.as_ptr() as *mut c_void, value) };
        Self { ty, buf }
    }

    pub fn ptr(&self) -> *mut c_void {
        self.buf.as_ptr() as *mut c_void
    }

    pub fn get(&self) -> Value {
        // SAFETY: initialized in `new()`; callbacks may only replace the value with another of the same type.
        unsafe { read_typed(self.ty, self.ptr()) }
    }
}

impl Drop for TypedBuf {
    fn drop(&mut self) {
        // SAFETY: see `get()`.
        unsafe { drop_typed(self.ty, self.ptr()) }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Packed arrays

/// Engine-owned string inside a packed string array. The bridge reads and assigns it through `*mut GString`.
#[repr(transparent)]
pub struct StringHandle(*mut String);

impl StringHandle {
    pub fn new(text: String) -> Self {
        Self(Box::into_raw(Box::new(text)))
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: the pointer is either null (after the bridge dropped the value) or a live box.
        unsafe { self.0.as_ref().map_or("", String::as_str) }
    }
}

impl Clone for StringHandle {
    fn clone(&self) -> Self {
        Self::new(self.as_str().to_string())
    }
}

impl Drop for StringHandle {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: allocated in `new()`, or by the bridge through the String constructors of this engine.
            drop(unsafe { Box::from_raw(self.0) });
        }
    }
}

impl PartialEq for StringHandle {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl std::fmt::Debug for StringHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PackedData {
    Byte(Vec<u8>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(Vec<StringHandle>),
    Vector2(Vec<[f32; 2]>),
    Vector3(Vec<[f32; 3]>),
    Color(Vec<[f32; 4]>),
    Vector4(Vec<[f32; 4]>),
}

macro_rules! for_each_packed {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            PackedData::Byte($v) => $body,
            PackedData::Int32($v) => $body,
            PackedData::Int64($v) => $body,
            PackedData::Float32($v) => $body,
            PackedData::Float64($v) => $body,
            PackedData::String($v) => $body,
            PackedData::Vector2($v) => $body,
            PackedData::Vector3($v) => $body,
            PackedData::Color($v) => $body,
            PackedData::Vector4($v) => $body,
        }
    };
}

impl PackedData {
    pub fn empty(ty: VariantType) -> Self {
        match ty {
            VariantType::PackedByteArray => Self::Byte(Vec::new()),
            VariantType::PackedInt32Array => Self::Int32(Vec::new()),
            VariantType::PackedInt64Array => Self::Int64(Vec::new()),
            VariantType::PackedFloat32Array => Self::Float32(Vec::new()),
            VariantType::PackedFloat64Array => Self::Float64(Vec::new()),
            VariantType::PackedStringArray => Self::String(Vec::new()),
            VariantType::PackedVector2Array => Self::Vector2(Vec::new()),
            VariantType::PackedVector3Array => Self::Vector3(Vec::new()),
            VariantType::PackedColorArray => Self::Color(Vec::new()),
            _ => Self::Vector4(Vec::new()),
        }
    }

    pub fn variant_type(&self) -> VariantType {
        match self {
            Self::Byte(_) => VariantType::PackedByteArray,
            Self::Int32(_) => VariantType::PackedInt32Array,
            Self::Int64(_) => VariantType::PackedInt64Array,
            Self::Float32(_) => VariantType::PackedFloat32Array,
            Self::Float64(_) => VariantType::PackedFloat64Array,
            Self::String(_) => VariantType::PackedStringArray,
            Self::Vector2(_) => VariantType::PackedVector2Array,
            Self::Vector3(_) => VariantType::PackedVector3Array,
            Self::Color(_) => VariantType::PackedColorArray,
            Self::Vector4(_) => VariantType::PackedVector4Array,
        }
    }

    pub fn len(&self) -> usize {
        for_each_packed!(self, v => v.len())
    }

    /// Address of element `index`, null if out of range.
    pub fn element_ptr(&mut self, index: i64) -> *mut c_void {
        let Ok(index) = usize::try_from(index) else {
            return ptr::null_mut();
        };

        for_each_packed!(self, v => v.get_mut(index).map_or(ptr::null_mut(), |e| e as *mut _ as *mut c_void))
    }

    /// Appends the element pointed to by `arg`, in pointer-call encoding (integers as `i64`, floats as `f64`).
    ///
    /// # Safety
    /// `arg` must point to a value of the call encoding of this array's element type.
    pub unsafe fn push_arg(&mut self, arg: *const c_void) {
        match self {
            Self::Byte(v) => v.push(*(arg as *const i64) as u8),
            Self::Int32(v) => v.push(*(arg as *const i64) as i32),
            Self::Int64(v) => v.push(*(arg as *const i64)),
            Self::Float32(v) => v.push(*(arg as *const f64) as f32),
            Self::Float64(v) => v.push(*(arg as *const f64)),
            Self::String(v) => v.push(StringHandle::new(read_string(arg))),
            Self::Vector2(v) => v.push(*(arg as *const [f32; 2])),
            Self::Vector3(v) => v.push(*(arg as *const [f32; 3])),
            Self::Color(v) => v.push(*(arg as *const [f32; 4])),
            Self::Vector4(v) => v.push(*(arg as *const [f32; 4])),
        }
    }

    pub fn resize(&mut self, len: usize) {
        match self {
            Self::String(v) => v.resize_with(len, || StringHandle::new(String::new())),
            Self::Byte(v) => v.resize(len, 0),
            Self::Int32(v) => v.resize(len, 0),
            Self::Int64(v) => v.resize(len, 0),
            Self::Float32(v) => v.resize(len, 0.0),
            Self::Float64(v) => v.resize(len, 0.0),
            Self::Vector2(v) => v.resize(len, [0.0; 2]),
            Self::Vector3(v) => v.resize(len, [0.0; 3]),
            Self::Color(v) | Self::Vector4(v) => v.resize(len, [0.0; 4]),
        }
    }

    pub fn clear(&mut self) {
        self.resize(0);
    }

    fn element_texts(&self) -> Vec<String> {
        fn tuple(components: &[f32]) -> String {
            let parts: Vec<String> = components.iter().map(f32::to_string).collect();
            format!("({})", parts.join(", "))
        }

        match self {
            Self::Byte(v) => v.iter().map(u8::to_string).collect(),
            Self::Int32(v) => v.iter().map(i32::to_string).collect(),
            Self::Int64(v) => v.iter().map(i64::to_string).collect(),
            Self::Float32(v) => v.iter().map(|f| format!("{f:?}")).collect(),
            Self::Float64(v) => v.iter().map(|f| format!("{f:?}")).collect(),
            Self::String(v) => v.iter().map(|s| format!("{:?}", s.as_str())).collect(),
            Self::Vector2(v) => v.iter().map(|e| tuple(e)).collect(),
            Self::Vector3(v) => v.iter().map(|e| tuple(e)).collect(),
            Self::Color(v) | Self::Vector4(v) => v.iter().map(|e| tuple(e)).collect(),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Comparison, hashing, printing

fn snapshot_array(data: &ArrayData) -> Vec<Value> {
    data.lock().iter().map(Slot::get).collect()
}

fn snapshot_dictionary(data: &DictionaryData) -> Vec<(Value, Value)> {
    data.lock().iter().map(|(k, v)| (k.clone(), v.get())).collect()
}

/// Variant `==`: numbers compare across int and float, `String` and `StringName` compare by content.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::String(x) | Value::StringName(x), Value::String(y) | Value::StringName(y)) => x == y,
        (Value::NodePath(x), Value::NodePath(y)) => x == y,
        (Value::Pod(tx, x), Value::Pod(ty, y)) => tx == ty && x == y,
        (Value::Object(x), Value::Object(y)) => match (x, y) {
            (Some(x), Some(y)) => ptr::eq(*x, *y),
            (None, None) => true,
            _ => false,
        },
        (Value::Callable(x), Value::Callable(y)) => callables::equal(x.as_ref(), y.as_ref()),
        (Value::Signal(x), Value::Signal(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (snapshot_array(x), snapshot_array(y));
            x.len() == y.len() && x.iter().zip(&y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Dictionary(x), Value::Dictionary(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (snapshot_dictionary(x), snapshot_dictionary(y));
            x.len() == y.len()
                && x.iter().zip(&y).all(|((kx, vx), (ky, vy))| keys_equal(kx, ky) && values_equal(vx, vy))
        }
        (Value::Packed(x), Value::Packed(y)) => x == y,
        _ => false,
    }
}

/// Dictionary key identity: same type and equal value.
pub fn keys_equal(a: &Value, b: &Value) -> bool {
    a.variant_type() == b.variant_type() && values_equal(a, b)
}

pub fn hash_value(value: &Value) -> i64 {
    if let Value::Callable(Some(callable)) = value {
        return i64::from(callable.hash_code());
    }

    let mut hasher = DefaultHasher::new();
    value.variant_type().sys().hash(&mut hasher);
    stringify(value).hash(&mut hasher);
    hasher.finish() as i64
}

fn pod_components(ty: VariantType, bytes: &[u8]) -> Vec<String> {
    let ints = matches!(
        ty,
        VariantType::Vector2i | VariantType::Vector3i | VariantType::Vector4i | VariantType::Rect2i
    );

    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let raw = [chunk[0], chunk[1], chunk[2], chunk[3]];
            if ints {
                i32::from_ne_bytes(raw).to_string()
            } else {
                f32::from_ne_bytes(raw).to_string()
            }
        })
        .collect()
}

/// Text representation, as `str()` prints it.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Nil => "<null>".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{f:?}"),
        Value::String(s) | Value::StringName(s) | Value::NodePath(s) => s.clone(),
        Value::Pod(VariantType::Rid, bytes) => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            format!("RID({})", u64::from_ne_bytes(raw))
        }
        Value::Pod(ty, bytes) => format!("({})", pod_components(*ty, bytes).join(", ")),
        Value::Object(Some(object)) if object.is_alive() => object.describe(),
        Value::Object(Some(_)) => "<Freed Object>".to_string(),
        Value::Object(None) => "<null>".to_string(),
        Value::Callable(callable) => callables::stringify(callable.as_ref()),
        Value::Signal(signal) => format!("{}::[signal]{}", signal.object_id, signal.name),
        Value::Array(data) => {
            let items: Vec<String> = snapshot_array(data).iter().map(nested).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Dictionary(data) => {
            let entries: Vec<String> = snapshot_dictionary(data)
                .iter()
                .map(|(k, v)| format!("{}: {}", nested(k), nested(v)))
                .collect();
            if entries.is_empty() {
                "{ }".to_string()
            } else {
                format!("{{ {} }}", entries.join(", "))
            }
        }
        Value::Packed(data) => format!("[{}]", data.element_texts().join(", ")),
    }
}

/// Strings are quoted inside containers.
fn nested(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::StringName(s) => format!("&{s:?}"),
        other => stringify(other),
    }
}
