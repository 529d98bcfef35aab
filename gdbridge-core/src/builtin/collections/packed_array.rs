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
use sys::types::OpaquePackedArray;
use sys::{interface_fn, CallFrame, GodotFfi, VariantType};

/// Element type of a [`PackedArray`].
///
/// Each element type corresponds to one engine packed-array kind with contiguous storage.
pub trait PackedElement: Clone + PartialEq + fmt::Debug + 'static {
    #[doc(hidden)]
    const PACKED_TYPE: VariantType;

    /// Pointer to the element at `index`, or null if out of range.
    ///
    /// # Safety
    /// `array` must point to a live packed array of kind `PACKED_TYPE`.
    #[doc(hidden)]
    unsafe fn element_ptr(array: sys::GDExtensionTypePtr, index: sys::GDExtensionInt) -> *mut Self;

    /// Appends `self` as the argument of the `push_back` builtin.
    #[doc(hidden)]
    fn push_arg<'a>(&'a self, frame: &mut CallFrame<'a>);
}

macro_rules! impl_packed_element {
    ($T:ty => $Kind:ident, $index_fn:ident, |$value:ident, $frame:ident| $push:expr) => {
        impl PackedElement for $T {
            const PACKED_TYPE: VariantType = VariantType::$Kind;

            unsafe fn element_ptr(array: sys::GDExtensionTypePtr, index: sys::GDExtensionInt) -> *mut Self {
                interface_fn!($index_fn)(array, index) as *mut Self
            }

            fn push_arg<'a>(&'a self, $frame: &mut CallFrame<'a>) {
                let $value = self;
                $push;
            }
        }
    };
}

// Scalars are widened by the frame (int64, double), like every pointer-call argument.
impl_packed_element!(u8 => PackedByteArray, packed_byte_array_operator_index, |v, frame| frame.arg(*v));
impl_packed_element!(i32 => PackedInt32Array, packed_int32_array_operator_index, |v, frame| frame.arg(*v));
impl_packed_element!(i64 => PackedInt64Array, packed_int64_array_operator_index, |v, frame| frame.arg(*v));
impl_packed_element!(f32 => PackedFloat32Array, packed_float32_array_operator_index, |v, frame| frame.arg(*v));
impl_packed_element!(f64 => PackedFloat64Array, packed_float64_array_operator_index, |v, frame| frame.arg(*v));
impl_packed_element!(GString => PackedStringArray, packed_string_array_operator_index, |v, frame| frame.arg(v));
impl_packed_element!(Vector2 => PackedVector2Array, packed_vector2_array_operator_index, |v, frame| frame.arg(*v));
impl_packed_element!(Vector3 => PackedVector3Array, packed_vector3_array_operator_index, |v, frame| frame.arg(*v));
impl_packed_element!(Color => PackedColorArray, packed_color_array_operator_index, |v, frame| frame.arg(*v));
impl_packed_element!(Vector4 => PackedVector4Array, packed_vector4_array_operator_index, |v, frame| frame.arg(*v));

/// Proxy over one of the engine's packed arrays: contiguous, copy-on-write storage of one element type.
pub struct PackedArray<T: PackedElement> {
    opaque: OpaquePackedArray,
    _phantom: PhantomData<T>,
}

pub type PackedByteArray = PackedArray<u8>;
pub type PackedInt32Array = PackedArray<i32>;
pub type PackedInt64Array = PackedArray<i64>;
pub type PackedFloat32Array = PackedArray<f32>;
pub type PackedFloat64Array = PackedArray<f64>;
pub type PackedStringArray = PackedArray<GString>;
pub type PackedVector2Array = PackedArray<Vector2>;
pub type PackedVector3Array = PackedArray<Vector3>;
pub type PackedColorArray = PackedArray<Color>;
pub type PackedVector4Array = PackedArray<Vector4>;

impl<T: PackedElement> PackedArray<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_opaque(opaque: OpaquePackedArray) -> Self {
        Self {
            opaque,
            _phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        // SAFETY: `size` takes no arguments and returns int.
        let len: i64 = unsafe { builtin_call(T::PACKED_TYPE, "size", self.sys(), |_| {}) };
        sys::conv::int_to_usize(len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&self, index: usize) -> Option<*mut T> {
        if index >= self.len() {
            return None;
        }

        // SAFETY: index is in bounds for a live array of the element's kind.
        let ptr = unsafe { T::element_ptr(self.sys(), sys::conv::usize_to_int(index)) };
        (!ptr.is_null()).then_some(ptr)
    }

    pub fn get(&self, index: usize) -> Option<T> {
        // SAFETY: element() returns pointers to live elements only.
        self.element(index).map(|ptr| unsafe { (*ptr).clone() })
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), BridgeError> {
        let ptr = self.element(index).ok_or_else(|| {
            BridgeError::new(
                ErrorKind::EngineError,
                format!("packed array index {index} out of bounds (len {})", self.len()),
            )
        })?;

        // SAFETY: `ptr` points to a live element; assignment drops the old value.
        unsafe { *ptr = value };
        Ok(())
    }

    pub fn push(&mut self, value: &T) {
        // SAFETY: `push_back` takes one element and returns bool.
        let _pushed: bool = unsafe {
            builtin_call(T::PACKED_TYPE, "push_back", self.sys_mut(), |frame| value.push_arg(frame))
        };
    }

    /// Grows or shrinks the array. New elements are zero. Fails if the engine cannot allocate the new length.
    pub fn resize(&mut self, new_len: usize) -> Result<(), BridgeError> {
        // SAFETY: `resize` takes one int and returns an error code.
        let code: i64 = unsafe {
            builtin_call(T::PACKED_TYPE, "resize", self.sys_mut(), |frame| {
                frame.arg(sys::conv::usize_to_int(new_len));
            })
        };

        match code {
            0 => Ok(()),
            code => Err(BridgeError::engine(format!(
                "resizing {:?} to {new_len} failed with engine error {code}",
                T::PACKED_TYPE
            ))),
        }
    }

    pub fn clear(&mut self) {
        // SAFETY: `clear` takes no arguments and returns nothing.
        unsafe { builtin_call::<()>(T::PACKED_TYPE, "clear", self.sys_mut(), |_| {}) }
    }

    pub fn iter(&self) -> PackedArrayIter<'_, T> {
        PackedArrayIter { array: self, next: 0 }
    }

    /// Copies all elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

// SAFETY: layout is the engine's packed array; copies and destruction go through the engine.
unsafe impl<T: PackedElement> GodotFfi for PackedArray<T> {
    const VARIANT_TYPE: VariantType = T::PACKED_TYPE;

    sys::ffi_methods! { type Opaque = OpaquePackedArray; }
}

impl<T: PackedElement> GodotType for PackedArray<T> {}

impl<T: PackedElement> GodotConvert for PackedArray<T> {
    type Via = Self;
}

impl<T: PackedElement> ToGodot for PackedArray<T> {
    fn to_godot(&self) -> Self::Via {
        self.clone()
    }
}

impl<T: PackedElement> FromGodot for PackedArray<T> {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }
}

impl<T: PackedElement> ArrayElement for PackedArray<T> {}

impl<'a, T: PackedElement> sys::FrameArg<'a> for &'a PackedArray<T> {
    fn push_into(self, frame: &mut CallFrame<'a>) {
        // SAFETY: the borrow keeps the array alive for the frame's lifetime.
        unsafe { frame.push_sys(self.sys_const()) }
    }
}

impl<T: PackedElement> Default for PackedArray<T> {
    fn default() -> Self {
        // SAFETY: the default constructor initializes an empty array.
        unsafe { Self::new_with_uninit(|dst| sys::builtin_lifecycle_api().construct_default(T::PACKED_TYPE, dst)) }
    }
}

impl<T: PackedElement> Clone for PackedArray<T> {
    fn clone(&self) -> Self {
        // SAFETY: self is a live array.
        unsafe { Self::new_from_sys(self.sys_const()) }
    }
}

impl<T: PackedElement> Drop for PackedArray<T> {
    fn drop(&mut self) {
        // SAFETY: self is live and not used afterwards.
        unsafe { sys::builtin_lifecycle_api().destroy(T::PACKED_TYPE, self.sys_mut()) }
    }
}

impl<T: PackedElement> PartialEq for PackedArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.to_vec() == other.to_vec()
    }
}

impl<T: PackedElement> fmt::Debug for PackedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PackedElement> From<&[T]> for PackedArray<T> {
    fn from(values: &[T]) -> Self {
        values.iter().cloned().collect()
    }
}

impl<T: PackedElement> FromIterator<T> for PackedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        for value in iter {
            array.push(&value);
        }
        array
    }
}

/// Iterator over a [`PackedArray`], copying one element per step.
pub struct PackedArrayIter<'a, T: PackedElement> {
    array: &'a PackedArray<T>,
    next: usize,
}

impl<T: PackedElement> Iterator for PackedArrayIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let value = self.array.get(self.next)?;
        self.next += 1;
        Some(value)
    }
}
