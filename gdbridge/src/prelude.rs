/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub use super::builtin::*;
pub use super::classes::{Object, RefCounted};
pub use super::engine_class;
pub use super::init::{ExtensionLibrary, InitLevel};
pub use super::log::{godot_error, godot_print, godot_script_error, godot_warn};
pub use super::meta::error::{BridgeError, CallError, ConvertError, ErrorKind};
pub use super::meta::{FromGodot, GodotConvert, ToGodot};
pub use super::obj::{Base, Gd, GodotClass, Inherits, InstanceId};
pub use super::registry::{ExtensionClass, VirtualTableBuilder};
