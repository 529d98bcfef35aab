/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod impls;

use crate::builtin::Variant;
use crate::meta::error::ConvertError;
use crate::meta::GodotType;

/// Indicates that a type can be passed to/from the engine, either directly or through an intermediate "via" type.
///
/// The associated type `Via` specifies _how_ this type is passed across the boundary. For example, `i32` travels as the
/// engine's `i64`, and `String` as [`GString`](crate::builtin::GString).
///
/// [`GodotType`] is the stronger bound: it expresses that a type is _directly_ representable in the engine.
/// Every `GodotType` also implements `GodotConvert` with `Via = Self`.
pub trait GodotConvert {
    /// The type through which `Self` is represented in the engine.
    type Via: GodotType;
}

/// Defines the canonical conversion to the engine for a type.
///
/// It is assumed that if [`FromGodot`] is implemented, converting to the engine and back returns a value equal to the
/// starting value.
pub trait ToGodot: GodotConvert {
    /// Converts this type to the engine type by reference, usually by cloning.
    fn to_godot(&self) -> Self::Via;

    /// Converts this type to a [`Variant`].
    fn to_variant(&self) -> Variant {
        self.to_godot().ffi_to_variant()
    }
}

/// Defines the canonical conversion from the engine for a type.
pub trait FromGodot: Sized + GodotConvert {
    /// Converts the engine representation to this type, returning `Err` on failure.
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError>;

    /// Performs the conversion from a [`Variant`], returning `Err` on failure.
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        let via = <Self::Via as GodotType>::ffi_from_variant(variant)?;
        Self::try_from_godot(via)
    }
}

#[macro_export]
#[doc(hidden)]
macro_rules! impl_godot_as_self {
    ($T:ty) => {
        impl $crate::meta::GodotConvert for $T {
            type Via = $T;
        }

        impl $crate::meta::ToGodot for $T {
            #[inline]
            fn to_godot(&self) -> Self::Via {
                self.clone()
            }
        }

        impl $crate::meta::FromGodot for $T {
            #[inline]
            fn try_from_godot(via: Self::Via) -> Result<Self, $crate::meta::error::ConvertError> {
                Ok(via)
            }
        }
    };
}
