/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::meta::error::ConvertError;
use crate::meta::FromGodot;
use crate::sys;
use crate::sys::GodotFfi;

/// Represents a parameter list as Rust tuple where each tuple element is one parameter.
///
/// Used for engine upcalls into host code, where arguments arrive in pointer-call layout.
pub trait ParamTuple: Sized {
    /// The number of elements in this parameter list.
    const LEN: usize;

    /// Decodes `Self::LEN` arguments from `args`.
    ///
    /// # Safety
    /// `args` must point to at least `Self::LEN` pointers, each pointing to a value of the respective parameter's `Via` type
    /// encoded according to `call_type`.
    #[doc(hidden)]
    unsafe fn from_ptrcall_args(
        args: *const sys::GDExtensionConstTypePtr,
        call_type: sys::PtrcallType,
    ) -> Result<Self, ConvertError>;
}

macro_rules! impl_param_tuple {
    ($len:literal; $($P:ident : $n:tt),*) => {
        impl<$($P: FromGodot),*> ParamTuple for ($($P,)*) {
            const LEN: usize = $len;

            #[allow(unused_variables)]
            unsafe fn from_ptrcall_args(
                args: *const sys::GDExtensionConstTypePtr,
                call_type: sys::PtrcallType,
            ) -> Result<Self, ConvertError> {
                Ok(($(
                    {
                        let via = <$P::Via as GodotFfi>::from_arg_ptr(*args.add($n), call_type);
                        $P::try_from_godot(via)?
                    },
                )*))
            }
        }
    };
}

impl_param_tuple!(0;);
impl_param_tuple!(1; P0: 0);
impl_param_tuple!(2; P0: 0, P1: 1);
impl_param_tuple!(3; P0: 0, P1: 1, P2: 2);
impl_param_tuple!(4; P0: 0, P1: 1, P2: 2, P3: 3);
impl_param_tuple!(5; P0: 0, P1: 1, P2: 2, P3: 3, P4: 4);
impl_param_tuple!(6; P0: 0, P1: 1, P2: 2, P3: 3, P4: 4, P5: 5);
impl_param_tuple!(7; P0: 0, P1: 1, P2: 2, P3: 3, P4: 4, P5: 5, P6: 6);
impl_param_tuple!(8; P0: 0, P1: 1, P2: 2, P3: 3, P4: 4, P5: 5, P6: 6, P7: 7);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_scalars_in_order() {
        let delta = 0.5f64;
        let count = 7i64;
        let flag = 1u8;
        let args = [
            &delta as *const f64 as sys::GDExtensionConstTypePtr,
            &count as *const i64 as sys::GDExtensionConstTypePtr,
            &flag as *const u8 as sys::GDExtensionConstTypePtr,
        ];

        let (d, c, f) =
            unsafe { <(f32, i32, bool)>::from_ptrcall_args(args.as_ptr(), sys::PtrcallType::Virtual) }.unwrap();

        assert_eq!((d, c, f), (0.5, 7, true));
        assert_eq!(<(f32, i32, bool)>::LEN, 3);
    }

    #[test]
    fn out_of_range_argument_fails() {
        let big = i64::MAX;
        let args = [&big as *const i64 as sys::GDExtensionConstTypePtr];

        let result = unsafe { <(i32,)>::from_ptrcall_args(args.as_ptr(), sys::PtrcallType::Standard) };
        assert!(result.is_err());
    }
}
