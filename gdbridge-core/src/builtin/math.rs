/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Plain-data builtins: vectors, rectangles, transforms and colors.
//!
//! Each type has the engine's exact single-precision layout, so it is passed by value in pointer calls and copied into
//! variants through the engine's constructors. Arithmetic is left to `glam`: every type converts to and from its `glam`
//! counterpart.

use glam::{Affine2, Affine3A, IVec2, IVec3, IVec4, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

use crate::builtin::macros::pod_builtin;
use crate::sys::VariantType;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Vectors

macro_rules! impl_vector {
    ($Vector:ident($($field:ident),+): $scalar:ty, $Glam:ty, $Kind:ident $(; $($derive:ident),+)?) => {
        #[derive(Copy, Clone, PartialEq, Debug, Default $($(, $derive)+)?)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(C)]
        pub struct $Vector {
            $( pub $field: $scalar, )+
        }

        impl $Vector {
            pub const fn new($($field: $scalar),+) -> Self {
                Self { $($field),+ }
            }

            pub fn from_glam(v: $Glam) -> Self {
                Self::new($(v.$field),+)
            }

            pub fn to_glam(self) -> $Glam {
                <$Glam>::new($(self.$field),+)
            }
        }

        impl From<$Glam> for $Vector {
            fn from(v: $Glam) -> Self {
                Self::from_glam(v)
            }
        }

        impl From<$Vector> for $Glam {
            fn from(v: $Vector) -> Self {
                v.to_glam()
            }
        }

        pod_builtin!($Vector => VariantType::$Kind);
    };
}

impl_vector!(Vector2(x, y): f32, Vec2, Vector2);
impl_vector!(Vector2i(x, y): i32, IVec2, Vector2i; Eq, Hash);
impl_vector!(Vector3(x, y, z): f32, Vec3, Vector3);
impl_vector!(Vector3i(x, y, z): i32, IVec3, Vector3i; Eq, Hash);
impl_vector!(Vector4(x, y, z, w): f32, Vec4, Vector4);
impl_vector!(Vector4i(x, y, z, w): i32, IVec4, Vector4i; Eq, Hash);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Rectangles, boxes, planes

/// 2D axis-aligned rectangle.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Rect2 {
    pub position: Vector2,
    pub size: Vector2,
}

impl Rect2 {
    pub const fn new(position: Vector2, size: Vector2) -> Self {
        Self { position, size }
    }

    pub fn end(self) -> Vector2 {
        Vector2::from_glam(self.position.to_glam() + self.size.to_glam())
    }
}

pod_builtin!(Rect2 => VariantType::Rect2);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Rect2i {
    pub position: Vector2i,
    pub size: Vector2i,
}

impl Rect2i {
    pub const fn new(position: Vector2i, size: Vector2i) -> Self {
        Self { position, size }
    }
}

pod_builtin!(Rect2i => VariantType::Rect2i);

/// 3D axis-aligned bounding box.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Aabb {
    pub position: Vector3,
    pub size: Vector3,
}

impl Aabb {
    pub const fn new(position: Vector3, size: Vector3) -> Self {
        Self { position, size }
    }
}

pod_builtin!(Aabb => VariantType::Aabb);

/// Plane in Hessian normal form: all points `p` with `normal.dot(p) == d`.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Plane {
    pub normal: Vector3,
    pub d: f32,
}

impl Plane {
    pub const fn new(normal: Vector3, d: f32) -> Self {
        Self { normal, d }
    }
}

pod_builtin!(Plane => VariantType::Plane);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Rotations and transforms

#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_glam(q: Quat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }

    pub fn to_glam(self) -> Quat {
        Quat::from_xyzw(self.x, self.y, self.z, self.w)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pod_builtin!(Quaternion => VariantType::Quaternion);

/// 3x3 matrix, stored as rows like the engine does.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Basis {
    pub rows: [Vector3; 3],
}

impl Basis {
    pub const IDENTITY: Self = Self::from_rows(
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
    );

    pub const fn from_rows(x: Vector3, y: Vector3, z: Vector3) -> Self {
        Self { rows: [x, y, z] }
    }

    // glam is column-major.
    pub fn from_glam(mat: Mat3) -> Self {
        let rows = mat.transpose();
        Self::from_rows(
            Vector3::from_glam(rows.x_axis),
            Vector3::from_glam(rows.y_axis),
            Vector3::from_glam(rows.z_axis),
        )
    }

    pub fn to_glam(self) -> Mat3 {
        let [x, y, z] = self.rows;
        Mat3::from_cols(x.to_glam(), y.to_glam(), z.to_glam()).transpose()
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pod_builtin!(Basis => VariantType::Basis);

/// 2D affine transform: two basis columns and an origin.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Transform2D {
    pub a: Vector2,
    pub b: Vector2,
    pub origin: Vector2,
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        a: Vector2::new(1.0, 0.0),
        b: Vector2::new(0.0, 1.0),
        origin: Vector2::new(0.0, 0.0),
    };

    pub fn from_glam(affine: Affine2) -> Self {
        Self {
            a: Vector2::from_glam(affine.matrix2.x_axis),
            b: Vector2::from_glam(affine.matrix2.y_axis),
            origin: Vector2::from_glam(affine.translation),
        }
    }

    pub fn to_glam(self) -> Affine2 {
        Affine2::from_cols(self.a.to_glam(), self.b.to_glam(), self.origin.to_glam())
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pod_builtin!(Transform2D => VariantType::Transform2D);

#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Transform3D {
    pub basis: Basis,
    pub origin: Vector3,
}

impl Transform3D {
    pub fn from_glam(affine: Affine3A) -> Self {
        Self {
            basis: Basis::from_glam(Mat3::from(affine.matrix3)),
            origin: Vector3::from_glam(Vec3::from(affine.translation)),
        }
    }

    pub fn to_glam(self) -> Affine3A {
        Affine3A::from_mat3_translation(self.basis.to_glam(), self.origin.to_glam())
    }
}

pod_builtin!(Transform3D => VariantType::Transform3D);

/// 4x4 matrix, stored as columns.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Projection {
    pub cols: [Vector4; 4],
}

impl Projection {
    pub fn from_glam(mat: Mat4) -> Self {
        Self {
            cols: [
                Vector4::from_glam(mat.x_axis),
                Vector4::from_glam(mat.y_axis),
                Vector4::from_glam(mat.z_axis),
                Vector4::from_glam(mat.w_axis),
            ],
        }
    }

    pub fn to_glam(self) -> Mat4 {
        let [x, y, z, w] = self.cols;
        Mat4::from_cols(x.to_glam(), y.to_glam(), z.to_glam(), w.to_glam())
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::from_glam(Mat4::IDENTITY)
    }
}

pod_builtin!(Projection => VariantType::Projection);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Color

/// RGBA color with components in `[0, 1]` for standard range.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn from_rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_glam(v: Vec4) -> Self {
        Self::from_rgba(v.x, v.y, v.z, v.w)
    }

    pub fn to_glam(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

pod_builtin!(Color => VariantType::Color);

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_engine() {
        assert_eq!(std::mem::size_of::<Vector2>(), 8);
        assert_eq!(std::mem::size_of::<Rect2i>(), 16);
        assert_eq!(std::mem::size_of::<Transform2D>(), 24);
        assert_eq!(std::mem::size_of::<Basis>(), 36);
        assert_eq!(std::mem::size_of::<Transform3D>(), 48);
        assert_eq!(std::mem::size_of::<Projection>(), 64);
    }

    #[test]
    fn basis_rows_transpose_through_glam() {
        let basis = Basis::from_rows(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 5.0, 6.0),
            Vector3::new(7.0, 8.0, 9.0),
        );

        let mat = basis.to_glam();
        assert_eq!(mat.x_axis, Vec3::new(1.0, 4.0, 7.0));
        assert_eq!(Basis::from_glam(mat), basis);
    }

    #[test]
    fn integer_builtins_are_hashable() {
        let cells: std::collections::HashSet<Rect2i> = [
            Rect2i::new(Vector2i::new(0, 0), Vector2i::new(2, 2)),
            Rect2i::new(Vector2i::new(0, 0), Vector2i::new(2, 2)),
            Rect2i::new(Vector2i::new(1, 0), Vector2i::new(2, 2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(cells.len(), 2);

        let voxels: std::collections::HashSet<_> = [Vector3i::new(1, 2, 3), Vector3i::new(1, 2, 3)].into_iter().collect();
        assert_eq!(voxels.len(), 1);
        assert_eq!(Vector4i::new(1, 2, 3, 4), Vector4i::from_glam(IVec4::new(1, 2, 3, 4)));
    }

    #[test]
    fn transform2d_glam() {
        let xform = Transform2D::from_glam(Affine2::from_translation(Vec2::new(3.0, -1.0)));
        assert_eq!(xform.origin, Vector2::new(3.0, -1.0));
        assert_eq!(xform.a, Vector2::new(1.0, 0.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let color = Color::from_rgba(0.5, 0.25, 1.0, 1.0);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(serde_json::from_str::<Color>(&json).unwrap(), color);
    }
}
