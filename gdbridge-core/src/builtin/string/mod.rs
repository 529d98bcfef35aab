/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! String types: [`GString`], [`StringName`] and [`NodePath`].
//!
//! The three are distinct engine kinds and never implicitly conflated; conversions between them go through the
//! engine's constructors.

mod gstring;
mod node_path;
mod string_name;

pub use gstring::{GString, StringView};
pub use node_path::NodePath;
pub use string_name::StringName;
