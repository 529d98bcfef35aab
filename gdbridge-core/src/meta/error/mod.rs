/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Errors of the bridge.
//!
//! All errors are recovered at the boundary: operations return them to the caller, or log them and fall back to empty
//! wrappers and zero values. None of them unwinds into the engine.

mod bridge_error;
mod call_error;
mod convert_error;

pub use bridge_error::*;
pub use call_error::*;
pub use convert_error::*;
