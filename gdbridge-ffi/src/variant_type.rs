/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate as sys;

macro_rules! variant_types {
    ($( $Name:ident = $ord:literal, )*) => {
        /// Discriminator of the engine's 24-byte `Variant`.
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[repr(u32)]
        pub enum VariantType {
            $( $Name = $ord, )*
        }

        impl VariantType {
            /// All kinds, ordered by their engine ordinal.
            pub const ALL: [VariantType; VARIANT_TYPE_COUNT] = [ $( Self::$Name, )* ];

            /// Converts an engine ordinal; `None` for values outside the known range.
            pub fn try_from_sys(enumerator: sys::GDExtensionVariantType) -> Option<Self> {
                match enumerator {
                    $( $ord => Some(Self::$Name), )*
                    _ => None,
                }
            }
        }
    };
}

/// Number of variant kinds known to the bridge (`Variant::Type::VARIANT_MAX`).
pub const VARIANT_TYPE_COUNT: usize = 39;

variant_types! {
    Nil = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Vector2 = 5,
    Vector2i = 6,
    Rect2 = 7,
    Rect2i = 8,
    Vector3 = 9,
    Vector3i = 10,
    Transform2D = 11,
    Vector4 = 12,
    Vector4i = 13,
    Plane = 14,
    Quaternion = 15,
    Aabb = 16,
    Basis = 17,
    Transform3D = 18,
    Projection = 19,
    Color = 20,
    StringName = 21,
    NodePath = 22,
    Rid = 23,
    Object = 24,
    Callable = 25,
    Signal = 26,
    Dictionary = 27,
    Array = 28,
    PackedByteArray = 29,
    PackedInt32Array = 30,
    PackedInt64Array = 31,
    PackedFloat32Array = 32,
    PackedFloat64Array = 33,
    PackedStringArray = 34,
    PackedVector2Array = 35,
    PackedVector3Array = 36,
    PackedColorArray = 37,
    PackedVector4Array = 38,
}

impl VariantType {
    /// Like [`try_from_sys`](Self::try_from_sys), but maps unknown ordinals to `Nil`.
    ///
    /// Engine versions newer than the bridge may report kinds it doesn't know about; those are treated as opaque nil.
    #[doc(hidden)]
    pub fn from_sys(enumerator: sys::GDExtensionVariantType) -> Self {
        Self::try_from_sys(enumerator).unwrap_or_else(|| {
            crate::out!("unknown variant type {enumerator}, treated as Nil");
            Self::Nil
        })
    }

    #[doc(hidden)]
    pub fn sys(self) -> sys::GDExtensionVariantType {
        self as sys::GDExtensionVariantType
    }

    /// Index into per-type tables.
    #[inline]
    pub fn ord(self) -> usize {
        self as usize
    }

    /// Kinds whose payload lives behind an engine handle and needs explicit copy/destroy.
    pub fn is_handle_kind(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::StringName
                | Self::NodePath
                | Self::Callable
                | Self::Signal
                | Self::Dictionary
                | Self::Array
                | Self::PackedByteArray
                | Self::PackedInt32Array
                | Self::PackedInt64Array
                | Self::PackedFloat32Array
                | Self::PackedFloat64Array
                | Self::PackedStringArray
                | Self::PackedVector2Array
                | Self::PackedVector3Array
                | Self::PackedColorArray
                | Self::PackedVector4Array
        )
    }

    pub fn is_packed_array(self) -> bool {
        (Self::PackedByteArray.ord()..=Self::PackedVector4Array.ord()).contains(&self.ord())
    }
}

impl std::fmt::Display for VariantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_dense() {
        for (i, ty) in VariantType::ALL.iter().enumerate() {
            assert_eq!(ty.ord(), i);
            assert_eq!(VariantType::try_from_sys(i as u32), Some(*ty));
        }

        assert_eq!(VariantType::try_from_sys(VARIANT_TYPE_COUNT as u32), None);
        assert_eq!(VariantType::from_sys(1000), VariantType::Nil);
    }

    #[test]
    fn handle_kinds() {
        assert!(VariantType::String.is_handle_kind());
        assert!(VariantType::PackedVector4Array.is_handle_kind());
        assert!(!VariantType::Vector3.is_handle_kind());
        assert!(!VariantType::Object.is_handle_kind());

        assert!(VariantType::PackedByteArray.is_packed_array());
        assert!(!VariantType::Array.is_packed_array());
    }
}
