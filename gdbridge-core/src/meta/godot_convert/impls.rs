/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::{GString, Variant};
use crate::impl_godot_as_self;
use crate::meta::error::ConvertError;
use crate::meta::{FromGodot, GodotConvert, ToGodot};
use crate::sys;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Directly representable types

impl_godot_as_self!(i64);
impl_godot_as_self!(f64);
impl_godot_as_self!(bool);
impl_godot_as_self!(());
impl_godot_as_self!(sys::GDExtensionObjectPtr);

impl GodotConvert for Variant {
    type Via = Variant;
}

impl ToGodot for Variant {
    fn to_godot(&self) -> Self::Via {
        self.clone()
    }

    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

impl FromGodot for Variant {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }

    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        Ok(variant.clone())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scalars narrower than the engine's 64-bit int and float

macro_rules! impl_godot_scalar {
    ($Via:ty: $($T:ty),+) => {
        $(
            impl GodotConvert for $T {
                type Via = $Via;
            }

            impl ToGodot for $T {
                fn to_godot(&self) -> Self::Via {
                    <$Via>::from(*self)
                }
            }

            impl FromGodot for $T {
                fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
                    <$T>::try_from(via).map_err(|_| ConvertError::bad_value(via))
                }
            }
        )+
    };
}

impl_godot_scalar!(i64: i8, i16, i32, u8, u16, u32);

/// `u64` travels bit-for-bit as `i64`, like instance IDs do.
impl GodotConvert for u64 {
    type Via = i64;
}

impl ToGodot for u64 {
    fn to_godot(&self) -> Self::Via {
        *self as i64
    }
}

impl FromGodot for u64 {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via as u64)
    }
}

impl GodotConvert for f32 {
    type Via = f64;
}

impl ToGodot for f32 {
    fn to_godot(&self) -> Self::Via {
        f64::from(*self)
    }
}

impl FromGodot for f32 {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via as f32)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Host strings

impl GodotConvert for String {
    type Via = GString;
}

impl ToGodot for String {
    fn to_godot(&self) -> Self::Via {
        GString::from(self.as_str())
    }
}

impl FromGodot for String {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via.to_string())
    }
}

impl GodotConvert for &str {
    type Via = GString;
}

impl ToGodot for &str {
    fn to_godot(&self) -> Self::Via {
        GString::from(*self)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::error::FromVariantError;

    #[test]
    fn narrowing_checks_range() {
        assert_eq!(i32::try_from_godot(-5), Ok(-5));
        assert_eq!(u8::try_from_godot(255), Ok(255));

        let err = u8::try_from_godot(256).unwrap_err();
        assert_eq!(err.kind(), &FromVariantError::BadValue);
        assert_eq!(err.value(), Some("256"));
    }

    #[test]
    fn u64_is_bit_identical() {
        let id = (1u64 << 63) | 1000;
        let via = id.to_godot();
        assert!(via < 0);
        assert_eq!(u64::try_from_godot(via), Ok(id));
    }

    #[test]
    fn widening() {
        assert_eq!(7u16.to_godot(), 7i64);
        assert_eq!(0.5f32.to_godot(), 0.5f64);
        assert_eq!(f32::try_from_godot(0.25), Ok(0.25));
    }
}
