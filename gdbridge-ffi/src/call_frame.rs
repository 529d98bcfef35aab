/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Argument buffer for the engine's pointer-call convention.
//!
//! A pointer call passes `const void** argv` (one pointer per argument, pointing at the argument's value) and one
//! `void* ret` pointing at storage for the return value. [`CallFrame`] owns the values that need storage (scalars, short
//! vectors), references those that already live somewhere (strings, arrays), and lays out `argv` right before the call.

use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use crate as sys;
use sys::{BuiltinMethodBind, GodotFfi};

/// Arguments stored without heap allocation. Frames with more arguments spill to the heap.
pub const MAX_INLINE_ARGS: usize = 32;

/// Words of inline value storage; enough for 16 arguments of two words each.
const INLINE_VALUE_WORDS: usize = 64;

/// Return buffer size in words. Fits the largest builtin passed by value (`Projection`, 64 bytes).
pub const RET_WORDS: usize = 8;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Small vector

/// Vector that keeps up to `N` elements inline and moves to the heap beyond that.
#[derive(Debug)]
enum InlineVec<T: Copy + Default, const N: usize> {
    Inline { buf: [T; N], len: usize },
    Heap(Vec<T>),
}

impl<T: Copy + Default, const N: usize> InlineVec<T, N> {
    fn new() -> Self {
        Self::Inline {
            buf: [T::default(); N],
            len: 0,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Inline { len, .. } => *len,
            Self::Heap(vec) => vec.len(),
        }
    }

    fn is_spilled(&self) -> bool {
        matches!(self, Self::Heap(_))
    }

    fn push(&mut self, value: T) {
        match self {
            Self::Inline { buf, len } if *len < N => {
                buf[*len] = value;
                *len += 1;
            }
            Self::Inline { buf, len } => {
                let mut vec = Vec::with_capacity(N * 2);
                vec.extend_from_slice(&buf[..*len]);
                vec.push(value);
                *self = Self::Heap(vec);
            }
            Self::Heap(vec) => vec.push(value),
        }
    }

    /// Appends `count` default elements, returning the index of the first.
    fn extend_default(&mut self, count: usize) -> usize {
        let start = self.len();
        for _ in 0..count {
            self.push(T::default());
        }
        start
    }

    fn clear(&mut self) {
        match self {
            Self::Inline { len, .. } => *len = 0,
            Self::Heap(vec) => vec.clear(),
        }
    }

    fn as_slice(&self) -> &[T] {
        match self {
            Self::Inline { buf, len } => &buf[..*len],
            Self::Heap(vec) => vec,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Self::Inline { buf, len } => &mut buf[..*len],
            Self::Heap(vec) => vec,
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Frame

#[derive(Copy, Clone, Debug)]
enum Slot {
    /// Value copied into the frame, at this word offset of the value pool.
    Inline { offset: usize },

    /// Value living outside the frame, borrowed for the frame's lifetime.
    Ref(sys::GDExtensionConstTypePtr),
}

impl Default for Slot {
    fn default() -> Self {
        Slot::Inline { offset: 0 }
    }
}

/// Typed handle to a reserved return slot. Consumed by [`CallFrame::take_ret`].
#[must_use]
pub struct RetSlot<R> {
    _marker: PhantomData<fn() -> R>,
}

/// Packed argument buffer for one pointer call.
///
/// Single-use: fill with [`arg()`](Self::arg), reserve the result with [`ret()`](Self::ret), call, then read back with
/// [`take_ret()`](Self::take_ret). Borrowed arguments must outlive `'a`. The frame is `!Send` and never leaves the thread that
/// built it. It does not touch reference counts of what it holds.
pub struct CallFrame<'a> {
    slots: InlineVec<Slot, MAX_INLINE_ARGS>,
    values: InlineVec<u64, INLINE_VALUE_WORDS>,
    argv: InlineVec<usize, MAX_INLINE_ARGS>,
    ret: [u64; RET_WORDS],
    ret_reserved: bool,
    _marker: PhantomData<(&'a (), *const ())>,
}

impl<'a> CallFrame<'a> {
    pub fn new() -> Self {
        Self {
            slots: InlineVec::new(),
            values: InlineVec::new(),
            argv: InlineVec::new(),
            ret: [0; RET_WORDS],
            ret_reserved: false,
            _marker: PhantomData,
        }
    }

    /// Appends an argument.
    pub fn arg<A: FrameArg<'a>>(&mut self, value: A) -> &mut Self {
        value.push_into(self);
        self
    }

    /// Copies a plain-data value into the next slot.
    ///
    /// `T` must have the exact layout the engine expects for this argument, and an alignment of at most 8.
    pub fn push_pod<T: Copy>(&mut self, value: T) {
        debug_assert!(align_of::<T>() <= align_of::<u64>(), "over-aligned frame value");

        let words = size_of::<T>().div_ceil(size_of::<u64>()).max(1);
        let offset = self.values.extend_default(words);

        let dst = self.values.as_mut_slice()[offset..].as_mut_ptr() as *mut u8;

        // SAFETY: `words` words were just reserved at `offset`; they cover size_of::<T>() bytes with u64 alignment.
        unsafe {
            std::ptr::copy_nonoverlapping(&value as *const T as *const u8, dst, size_of::<T>());
        }

        self.slots.push(Slot::Inline { offset });
    }

    /// References a value that lives outside the frame.
    ///
    /// # Safety
    /// `ptr` must point to a live value of the type the engine expects for this argument, for at least `'a`.
    pub unsafe fn push_sys(&mut self, ptr: sys::GDExtensionConstTypePtr) {
        self.slots.push(Slot::Ref(ptr));
    }

    /// Appends an object argument (`Object*`, passed as `Object**`). Null is allowed.
    pub fn push_object(&mut self, object: sys::GDExtensionObjectPtr) {
        self.push_pod(object);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the frame outgrew its inline storage.
    pub fn is_spilled(&self) -> bool {
        self.slots.is_spilled() || self.values.is_spilled()
    }

    /// Reserves the return slot for a value of type `R`.
    pub fn ret<R: GodotFfi>(&mut self) -> RetSlot<R> {
        debug_assert!(size_of::<R>() <= RET_WORDS * size_of::<u64>(), "return type exceeds frame buffer");
        debug_assert!(!self.ret_reserved, "return slot reserved twice");

        self.ret = [0; RET_WORDS];
        self.ret_reserved = true;
        RetSlot {
            _marker: PhantomData,
        }
    }

    /// Pointer to the return buffer, for the engine to write into.
    pub fn ret_ptr(&mut self) -> sys::GDExtensionTypePtr {
        self.ret.as_mut_ptr() as sys::GDExtensionTypePtr
    }

    /// Moves the return value out of the frame.
    ///
    /// Must only be called after the engine call has written the value reserved by `slot`.
    pub fn take_ret<R: GodotFfi>(&mut self, slot: RetSlot<R>) -> R {
        let RetSlot { .. } = slot;
        self.ret_reserved = false;

        // SAFETY: the engine constructed an `R` in the buffer during the call; the buffer is large and aligned enough (see ret()).
        unsafe { R::take_from_sys(self.ret_ptr()) }
    }

    /// Lays out and returns the `argv` array expected by the engine.
    ///
    /// The pointer stays valid until the frame is moved or modified.
    pub fn array(&mut self) -> *const sys::GDExtensionConstTypePtr {
        self.argv.clear();

        let base = self.values.as_slice().as_ptr();
        for slot in self.slots.as_slice() {
            let address = match *slot {
                // Offsets were produced by push_pod() and lie within the value pool.
                Slot::Inline { offset } => base.wrapping_add(offset) as usize,
                Slot::Ref(ptr) => ptr as usize,
            };
            self.argv.push(address);
        }

        self.argv.as_slice().as_ptr() as *const sys::GDExtensionConstTypePtr
    }

    /// Invokes an engine method bind with this frame's arguments.
    ///
    /// # Safety
    /// `method` must be a valid bind whose signature matches the pushed arguments and reserved return; `object` a live instance.
    pub unsafe fn ptrcall(&mut self, method: sys::GDExtensionMethodBindPtr, object: sys::GDExtensionObjectPtr) {
        let argv = self.array();
        let ret = self.ret_ptr();

        sys::out!("ptrcall: {} args", self.len());
        sys::interface_fn!(object_method_bind_ptrcall)(method, object, argv, ret);
    }

    /// Invokes a builtin method on `base` with this frame's arguments.
    ///
    /// # Safety
    /// `base` must point to a live value of the method's builtin type; arguments and return must match the method signature.
    pub unsafe fn ptrcall_builtin(&mut self, method: BuiltinMethodBind, base: sys::GDExtensionTypePtr) {
        let argc = self.len() as std::ffi::c_int;
        let argv = self.array();
        let ret = self.ret_ptr();

        method(base, argv, ret, argc);
    }

    /// Releases the frame. Equivalent to dropping it; spelled out at call sites that end a boundary crossing.
    pub fn free(self) {}
}

impl Default for CallFrame<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Argument marshalling

/// Values that can be appended to a [`CallFrame`].
///
/// Integers are widened to the engine's `int64`, floats to `double`; borrowed values must outlive the frame.
pub trait FrameArg<'a> {
    fn push_into(self, frame: &mut CallFrame<'a>);
}

macro_rules! impl_frame_arg_widened {
    ($Via:ty: $($T:ty),+) => {
        $(
            impl<'a> FrameArg<'a> for $T {
                fn push_into(self, frame: &mut CallFrame<'a>) {
                    frame.push_pod(self as $Via);
                }
            }
        )+
    };
}

impl_frame_arg_widened!(i64: i8, i16, i32, i64, u8, u16, u32, u64);
impl_frame_arg_widened!(f64: f32, f64);

impl<'a> FrameArg<'a> for bool {
    fn push_into(self, frame: &mut CallFrame<'a>) {
        frame.push_pod(sys::conv::bool_to_sys(self));
    }
}

impl<'a> FrameArg<'a> for sys::GDExtensionObjectPtr {
    fn push_into(self, frame: &mut CallFrame<'a>) {
        frame.push_object(self);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    unsafe fn read_arg<T: Copy>(argv: *const sys::GDExtensionConstTypePtr, index: usize) -> T {
        std::ptr::read(*argv.add(index) as *const T)
    }

    #[test]
    fn empty_frame() {
        let mut frame = CallFrame::new();
        assert!(frame.is_empty());

        let argv = frame.array();
        assert!(!argv.is_null());
        assert!(!frame.is_spilled());
    }

    #[test]
    fn mixed_args_keep_layout() {
        let outside = [7u64, 8, 9];

        let mut frame = CallFrame::new();
        frame.arg(3i32).arg(true).arg(2.5f32);
        frame.push_pod([1.0f32, 2.0, 3.0]);
        unsafe { frame.push_sys(outside.as_ptr() as sys::GDExtensionConstTypePtr) };

        assert_eq!(frame.len(), 5);
        let argv = frame.array();

        unsafe {
            assert_eq!(read_arg::<i64>(argv, 0), 3);
            assert_eq!(read_arg::<u8>(argv, 1), 1);
            assert_eq!(read_arg::<f64>(argv, 2), 2.5);
            assert_eq!(read_arg::<[f32; 3]>(argv, 3), [1.0, 2.0, 3.0]);
            assert_eq!(*argv.add(4), outside.as_ptr() as sys::GDExtensionConstTypePtr);
        }
    }

    #[test]
    fn object_arg_is_double_pointer() {
        let mut target = 0u8;
        let object = &mut target as *mut u8 as sys::GDExtensionObjectPtr;

        let mut frame = CallFrame::new();
        frame.arg(object).arg(std::ptr::null_mut::<std::ffi::c_void>());

        let argv = frame.array();
        unsafe {
            assert_eq!(read_arg::<sys::GDExtensionObjectPtr>(argv, 0), object);
            assert!(read_arg::<sys::GDExtensionObjectPtr>(argv, 1).is_null());
        }
    }

    #[test]
    fn ret_slot_round_trip() {
        let mut frame = CallFrame::new();
        let slot = frame.ret::<i64>();

        unsafe { 99i64.move_return_ptr(frame.ret_ptr(), sys::PtrcallType::Standard) };
        assert_eq!(frame.take_ret(slot), 99);
        frame.free();
    }

    #[test]
    fn wide_values_spill() {
        let mut frame = CallFrame::new();
        for i in 0..20 {
            // 48 bytes each, like Transform3D.
            frame.push_pod([i as f32; 12]);
        }

        assert!(frame.is_spilled());
        let argv = frame.array();
        for i in 0..20 {
            let value = unsafe { read_arg::<[f32; 12]>(argv, i) };
            assert_eq!(value, [i as f32; 12]);
        }
    }

    proptest! {
        #[test]
        fn any_arity_reads_back(values in prop::collection::vec(any::<i64>(), 0..80)) {
            let mut frame = CallFrame::new();
            for v in &values {
                frame.arg(*v);
            }

            prop_assert_eq!(frame.len(), values.len());
            prop_assert_eq!(frame.is_spilled(), values.len() > MAX_INLINE_ARGS);

            let argv = frame.array();
            for (i, v) in values.iter().enumerate() {
                prop_assert_eq!(unsafe { read_arg::<i64>(argv, i) }, *v);
            }
        }
    }
}
