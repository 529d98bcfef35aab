/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::marker::PhantomData;

use crate::builtin::*;
use crate::meta::error::{BridgeError, ConvertError, ErrorKind};
use crate::meta::{FromGodot, GodotConvert, GodotType, ToGodot};
use crate::sys;
use sys::types::OpaqueArray;
use sys::{interface_fn, GodotFfi, VariantType};

/// Element type of [`Array`] and [`Dictionary`].
///
/// Implemented for every type with a variant conversion in both directions.
pub trait ArrayElement: ToGodot + FromGodot + 'static {}

macro_rules! impl_array_element {
    ($($T:ty),* $(,)?) => {
        $( impl ArrayElement for $T {} )*
    };
}

impl_array_element!(
    Variant, bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, GString, StringName, NodePath, Rid,
    Callable, Signal, VarArray, Dictionary, Vector2, Vector2i, Vector3, Vector3i, Vector4, Vector4i, Rect2, Rect2i,
    Aabb, Plane, Quaternion, Basis, Transform2D, Transform3D, Projection, Color,
);

/// Proxy over an engine `Array`.
///
/// The engine array stores variants; `T` is the element type this view converts to and from on access. Elements that
/// don't convert to `T` (e.g. after [`resize()`](Self::resize) filled in nil) read as `None` from [`get()`](Self::get).
///
/// Clones share the engine array, like GDScript arrays.
pub struct Array<T: ArrayElement = Variant> {
    opaque: OpaqueArray,
    _phantom: PhantomData<T>,
}

/// Untyped array, `Array<Variant>`.
pub type VarArray = Array<Variant>;

impl<T: ArrayElement> Array<T> {
    /// Constructs an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_opaque(opaque: OpaqueArray) -> Self {
        Self {
            opaque,
            _phantom: PhantomData,
        }
    }

    /// Number of elements in the array.
    pub fn len(&self) -> usize {
        // SAFETY: `size` takes no arguments and returns int.
        let len: i64 = unsafe { builtin_call(VariantType::Array, "size", self.sys(), |_| {}) };
        sys::conv::int_to_usize(len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, index: usize) -> Option<&Variant> {
        if index >= self.len() {
            return None;
        }

        // SAFETY: index is in bounds; the returned slot lives as long as the array is not resized, which needs &mut self.
        unsafe {
            let ptr = interface_fn!(array_operator_index_const)(self.sys_const(), sys::conv::usize_to_int(index));
            sys::ptr_then(ptr, |ptr| Variant::borrow_var_sys(ptr))
        }
    }

    /// Element at `index`, converted to `T`.
    pub fn try_get(&self, index: usize) -> Result<T, BridgeError> {
        let variant = self.slot(index).ok_or_else(|| out_of_bounds(index, self.len()))?;
        Ok(T::try_from_variant(variant)?)
    }

    /// Element at `index`, or `None` if out of bounds or not convertible to `T`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.try_get(index).ok()
    }

    /// Overwrites the element at `index`.
    pub fn set(&mut self, index: usize, value: &T) -> Result<(), BridgeError> {
        let len = self.len();
        if index >= len {
            return Err(out_of_bounds(index, len));
        }

        // SAFETY: index is in bounds; the slot holds a live variant which the assignment destroys and replaces.
        unsafe {
            let ptr = interface_fn!(array_operator_index)(self.sys_mut(), sys::conv::usize_to_int(index));
            if ptr.is_null() {
                return Err(out_of_bounds(index, len));
            }
            *Variant::borrow_var_sys_mut(ptr) = value.to_variant();
        }

        Ok(())
    }

    /// Appends an element.
    pub fn push(&mut self, value: &T) {
        let variant = value.to_variant();

        // SAFETY: `push_back` takes one Variant and returns nothing.
        unsafe {
            builtin_call::<()>(VariantType::Array, "push_back", self.sys_mut(), |frame| {
                frame.arg(&variant);
            })
        }
    }

    /// Removes and returns the element at `index`. Later elements shift down.
    ///
    /// Returns `None` if out of bounds. If the element does not convert to `T`, it is still removed.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let removed = self.slot(index).map(T::try_from_variant)?;

        // SAFETY: `remove_at` takes one int and returns nothing.
        unsafe {
            builtin_call::<()>(VariantType::Array, "remove_at", self.sys_mut(), |frame| {
                frame.arg(sys::conv::usize_to_int(index));
            })
        }

        removed.ok()
    }

    /// Grows or shrinks the array. New elements are nil.
    ///
    /// Fails with [`ErrorKind::EngineError`] if the engine cannot allocate the new length.
    pub fn resize(&mut self, new_len: usize) -> Result<(), BridgeError> {
        // SAFETY: `resize` takes one int and returns an error code.
        let code: i64 = unsafe {
            builtin_call(VariantType::Array, "resize", self.sys_mut(), |frame| {
                frame.arg(sys::conv::usize_to_int(new_len));
            })
        };

        match code {
            0 => Ok(()),
            code => Err(BridgeError::engine(format!(
                "resizing {:?} to {new_len} failed with engine error {code}",
                VariantType::Array
            ))),
        }
    }

    pub fn clear(&mut self) {
        // SAFETY: `clear` takes no arguments and returns nothing.
        unsafe { builtin_call::<()>(VariantType::Array, "clear", self.sys_mut(), |_| {}) }
    }

    /// Lazy iterator; each step reads one element from the engine.
    pub fn iter(&self) -> ArrayIter<'_, T> {
        ArrayIter { array: self, next: 0 }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

fn out_of_bounds(index: usize, len: usize) -> BridgeError {
    BridgeError::new(ErrorKind::EngineError, format!("array index {index} out of bounds (len {len})"))
}

// SAFETY: layout is the engine's Array handle; copies and destruction go through the engine.
unsafe impl<T: ArrayElement> GodotFfi for Array<T> {
    const VARIANT_TYPE: VariantType = VariantType::Array;

    sys::ffi_methods! { type Opaque = OpaqueArray; }
}

impl<T: ArrayElement> GodotType for Array<T> {}

impl<T: ArrayElement> GodotConvert for Array<T> {
    type Via = Self;
}

impl<T: ArrayElement> ToGodot for Array<T> {
    fn to_godot(&self) -> Self::Via {
        self.clone()
    }
}

impl<T: ArrayElement> FromGodot for Array<T> {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }
}

impl<'a, T: ArrayElement> sys::FrameArg<'a> for &'a Array<T> {
    fn push_into(self, frame: &mut sys::CallFrame<'a>) {
        // SAFETY: the borrow keeps the array alive for the frame's lifetime.
        unsafe { frame.push_sys(self.sys_const()) }
    }
}

impl<T: ArrayElement> Default for Array<T> {
    fn default() -> Self {
        // SAFETY: the default constructor initializes an empty array.
        unsafe {
            Self::new_with_uninit(|dst| sys::builtin_lifecycle_api().construct_default(VariantType::Array, dst))
        }
    }
}

impl<T: ArrayElement> Clone for Array<T> {
    fn clone(&self) -> Self {
        // SAFETY: self is a live array.
        unsafe { Self::new_from_sys(self.sys_const()) }
    }
}

impl<T: ArrayElement> Drop for Array<T> {
    fn drop(&mut self) {
        // SAFETY: self is live and not used afterwards.
        unsafe { sys::builtin_lifecycle_api().destroy(VariantType::Array, self.sys_mut()) }
    }
}

impl<T: ArrayElement> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.to_variant() == other.to_variant()
    }
}

impl<T: ArrayElement> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_variant())
    }
}

impl<T: ArrayElement> From<&[T]> for Array<T> {
    fn from(values: &[T]) -> Self {
        let mut array = Self::new();
        for value in values {
            array.push(value);
        }
        array
    }
}

impl<T: ArrayElement> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        for value in iter {
            array.push(&value);
        }
        array
    }
}

impl<'a, T: ArrayElement> IntoIterator for &'a Array<T> {
    type Item = T;
    type IntoIter = ArrayIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [`Array`], see [`Array::iter()`].
///
/// Elements that don't convert to `T` are skipped.
pub struct ArrayIter<'a, T: ArrayElement> {
    array: &'a Array<T>,
    next: usize,
}

impl<T: ArrayElement> Iterator for ArrayIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.next < self.array.len() {
            let index = self.next;
            self.next += 1;

            if let Some(value) = self.array.get(index) {
                return Some(value);
            }
        }

        None
    }
}
