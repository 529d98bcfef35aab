/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Built-in types like `Vector2`, `GString` and `Variant`.
//!
//! Two representations coexist:
//! - **Payload types** (vectors, matrices, `Color`, `Rid`) are `#[repr(C)]` copies of the engine's bits. They convert to and
//!   from `glam` types for arithmetic; the bridge never does arithmetic on engine memory.
//! - **Handle types** (`Variant`, strings, containers, `Callable`, `Signal`) wrap an engine-owned value in opaque storage.
//!   Every operation on them, including copy and destruction, goes through the engine.

mod callable;
mod collections;
mod math;
mod rid;
mod signal;
mod string;
mod variant;

pub(crate) mod macros;

pub use callable::Callable;
pub use collections::*;
pub use math::*;
pub use rid::Rid;
pub use signal::Signal;
pub use string::*;
pub use variant::{to_variants, Variant, VariantValue};

pub use crate::sys::VariantType;

use crate::sys;
use sys::{CallFrame, GodotFfi};

/// Invokes builtin method `method` of type `ty` on the value at `base`, with arguments pushed by `args`.
///
/// Builtin methods are resolved once at `Core` init level; calling one the engine did not provide is an internal invariant
/// violation.
///
/// # Safety
/// `base` must point to a live value of type `ty`. Pushed arguments and `R` must match the method's signature.
pub(crate) unsafe fn builtin_call<'a, R: GodotFfi>(
    ty: VariantType,
    method: &'static str,
    base: sys::GDExtensionTypePtr,
    args: impl FnOnce(&mut CallFrame<'a>),
) -> R {
    let Some(bind) = sys::builtin_method_table().get(ty, method) else {
        crate::fatal!("builtin method {ty:?}::{method} is not available");
    };

    let mut frame = CallFrame::new();
    args(&mut frame);
    let ret = frame.ret::<R>();

    frame.ptrcall_builtin(bind, base);

    let result = frame.take_ret(ret);
    frame.free();
    result
}
