/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Types and traits related to objects.
//!
//! The most important symbols in this module are:
//! * [`GodotClass`], which is implemented for every class the bridge can wrap (either engine- or extension-provided).
//! * [`Gd`], a smart pointer that manages the lifetime of engine objects.

mod base;
mod gd;
mod instance_id;
mod raw_gd;
mod traits;

pub(crate) mod refcount;

pub use base::*;
pub use gd::*;
pub use instance_id::*;
pub use raw_gd::{Ownership, RawGd, WrapperRole};
pub use traits::*;
