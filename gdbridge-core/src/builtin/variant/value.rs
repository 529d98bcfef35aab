/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::*;
use crate::classes::Object;
use crate::meta::error::ConvertError;
use crate::meta::{FromGodot, ToGodot};
use crate::obj::Gd;
use crate::sys::VariantType;

macro_rules! variant_values {
    ($( $Kind:ident($T:ty), )*) => {
        /// Host-side sum type over every variant kind.
        ///
        /// Obtained from [`Variant::to_host()`] or [`Variant::value()`]; encoded back with [`Variant::from_host()`].
        /// Object payloads are wrappers resolved through the pointer registry; `None` stands for a null or freed object.
        #[derive(Clone, PartialEq, Debug)]
        pub enum VariantValue {
            Nil,
            $( $Kind($T), )*
        }

        impl VariantValue {
            pub fn variant_type(&self) -> VariantType {
                match self {
                    Self::Nil => VariantType::Nil,
                    $( Self::$Kind(_) => VariantType::$Kind, )*
                }
            }

            pub fn to_variant(&self) -> Variant {
                match self {
                    Self::Nil => Variant::nil(),
                    $( Self::$Kind(value) => value.to_variant(), )*
                }
            }

            pub(super) fn decode(variant: &Variant, kind: VariantType) -> Result<Self, ConvertError> {
                let value = match kind {
                    VariantType::Nil => Self::Nil,
                    $( VariantType::$Kind => Self::$Kind(<$T>::try_from_variant(variant)?), )*
                };

                Ok(value)
            }
        }
    };
}

variant_values! {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(GString),
    Vector2(Vector2),
    Vector2i(Vector2i),
    Rect2(Rect2),
    Rect2i(Rect2i),
    Vector3(Vector3),
    Vector3i(Vector3i),
    Transform2D(Transform2D),
    Vector4(Vector4),
    Vector4i(Vector4i),
    Plane(Plane),
    Quaternion(Quaternion),
    Aabb(Aabb),
    Basis(Basis),
    Transform3D(Transform3D),
    Projection(Projection),
    Color(Color),
    StringName(StringName),
    NodePath(NodePath),
    Rid(Rid),
    Object(Option<Gd<Object>>),
    Callable(Callable),
    Signal(Signal),
    Dictionary(Dictionary),
    Array(VarArray),
    PackedByteArray(PackedByteArray),
    PackedInt32Array(PackedInt32Array),
    PackedInt64Array(PackedInt64Array),
    PackedFloat32Array(PackedFloat32Array),
    PackedFloat64Array(PackedFloat64Array),
    PackedStringArray(PackedStringArray),
    PackedVector2Array(PackedVector2Array),
    PackedVector3Array(PackedVector3Array),
    PackedColorArray(PackedColorArray),
    PackedVector4Array(PackedVector4Array),
}
