/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Meta-information about classes, methods and properties, and the conversion traits between host and engine values.
//!
//! # Conversions
//!
//! Values cross the boundary in two representations:
//! - _pointer calls_ pass the engine's native layout of a type ([`GodotFfi`]),
//! - _variant calls_ pass everything as [`Variant`](crate::builtin::Variant) ([`GodotType`]).
//!
//! Host types that have no direct engine counterpart convert through an intermediate type: see [`GodotConvert`].

mod class_name;
mod godot_convert;
mod method_info;
mod param_tuple;
mod property_info;
mod traits;

pub mod error;

pub use class_name::ClassName;
pub use godot_convert::{FromGodot, GodotConvert, ToGodot};
pub use method_info::{return_type_from_schema, MethodInfo, ReturnOwnership};
pub use param_tuple::ParamTuple;
pub use property_info::{PropertyInfo, PROPERTY_USAGE_DEFAULT};
pub use traits::{GodotFfi, GodotType};
