/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::sys::VariantType;

/// How the engine hands over an object returned by a method.
///
/// Decides whether a returned refcounted object arrives with a reference the host now owns, and whether the wrapper
/// must verify liveness on each use.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ReturnOwnership {
    /// The engine keeps ownership. Refcounted results are retained by the wrapper with a new reference.
    #[default]
    Borrowed,

    /// The engine passes one reference to the caller. The wrapper adopts it without calling `reference()`.
    Transferred,

    /// Like [`Borrowed`](Self::Borrowed), but the engine may free the object at any point: the wrapper uses a checked handle.
    MustAssertInstanceId,

    /// The object lives as long as its owner (e.g. a child the parent controls). Never retained; always a checked handle.
    LifetimeBound,
}

impl ReturnOwnership {
    /// Parses the schema spelling (`"borrowed"`, `"transferred"`, `"must_assert_instance_id"`, `"lifetime_bound"`).
    pub fn from_schema(name: &str) -> Option<Self> {
        let ownership = match name {
            "borrowed" => Self::Borrowed,
            "transferred" => Self::Transferred,
            "must_assert_instance_id" => Self::MustAssertInstanceId,
            "lifetime_bound" => Self::LifetimeBound,
            _ => return None,
        };

        Some(ownership)
    }

    /// Whether wrappers of returned objects must verify the instance ID before each use.
    pub fn requires_checked_handle(self) -> bool {
        matches!(self, Self::MustAssertInstanceId | Self::LifetimeBound)
    }
}

/// Metadata of one engine method, as stored in the class registry.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MethodInfo {
    pub name: String,

    /// Hash of the method signature, required by the engine to hand out a method bind.
    pub hash: i64,

    pub is_virtual: bool,
    pub is_vararg: bool,
    pub return_ownership: ReturnOwnership,

    /// Kind of the return value. `None` for `void` and for `Variant` returns.
    pub return_type: Option<VariantType>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, hash: i64) -> Self {
        Self {
            name: name.into(),
            hash,
            is_virtual: false,
            is_vararg: false,
            return_ownership: ReturnOwnership::default(),
            return_type: None,
        }
    }

    pub fn with_return_ownership(mut self, ownership: ReturnOwnership) -> Self {
        self.return_ownership = ownership;
        self
    }

    pub fn with_return_type(mut self, return_type: Option<VariantType>) -> Self {
        self.return_type = return_type;
        self
    }
}

/// Maps a schema type spelling (`"int"`, `"Vector2"`, `"Node"`, ...) to the kind of value it denotes.
///
/// `None` for `void` and `Variant`. Names that are not builtin types are classes and map to `Object`.
pub fn return_type_from_schema(name: &str) -> Option<VariantType> {
    let ty = match name {
        "" | "void" | "Variant" => return None,
        "bool" => VariantType::Bool,
        "int" => VariantType::Int,
        "float" => VariantType::Float,
        "String" => VariantType::String,
        "Vector2" => VariantType::Vector2,
        "Vector2i" => VariantType::Vector2i,
        "Rect2" => VariantType::Rect2,
        "Rect2i" => VariantType::Rect2i,
        "Vector3" => VariantType::Vector3,
        "Vector3i" => VariantType::Vector3i,
        "Transform2D" => VariantType::Transform2D,
        "Vector4" => VariantType::Vector4,
        "Vector4i" => VariantType::Vector4i,
        "Plane" => VariantType::Plane,
        "Quaternion" => VariantType::Quaternion,
        "AABB" => VariantType::Aabb,
        "Basis" => VariantType::Basis,
        "Transform3D" => VariantType::Transform3D,
        "Projection" => VariantType::Projection,
        "Color" => VariantType::Color,
        "StringName" => VariantType::StringName,
        "NodePath" => VariantType::NodePath,
        "RID" => VariantType::Rid,
        "Callable" => VariantType::Callable,
        "Signal" => VariantType::Signal,
        "Dictionary" => VariantType::Dictionary,
        "Array" => VariantType::Array,
        "PackedByteArray" => VariantType::PackedByteArray,
        "PackedInt32Array" => VariantType::PackedInt32Array,
        "PackedInt64Array" => VariantType::PackedInt64Array,
        "PackedFloat32Array" => VariantType::PackedFloat32Array,
        "PackedFloat64Array" => VariantType::PackedFloat64Array,
        "PackedStringArray" => VariantType::PackedStringArray,
        "PackedVector2Array" => VariantType::PackedVector2Array,
        "PackedVector3Array" => VariantType::PackedVector3Array,
        "PackedColorArray" => VariantType::PackedColorArray,
        "PackedVector4Array" => VariantType::PackedVector4Array,
        _ if name.starts_with("typedarray::") => VariantType::Array,
        _ => VariantType::Object,
    };

    Some(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_from_schema() {
        assert_eq!(
            ReturnOwnership::from_schema("transferred"),
            Some(ReturnOwnership::Transferred)
        );
        assert_eq!(ReturnOwnership::from_schema("owned"), None);

        assert!(ReturnOwnership::LifetimeBound.requires_checked_handle());
        assert!(!ReturnOwnership::Borrowed.requires_checked_handle());
    }

    #[test]
    fn return_type_spellings() {
        assert_eq!(return_type_from_schema("void"), None);
        assert_eq!(return_type_from_schema("Variant"), None);
        assert_eq!(return_type_from_schema("int"), Some(VariantType::Int));
        assert_eq!(return_type_from_schema("AABB"), Some(VariantType::Aabb));
        assert_eq!(return_type_from_schema("typedarray::Node"), Some(VariantType::Array));
        assert_eq!(return_type_from_schema("Node2D"), Some(VariantType::Object));
    }
}
