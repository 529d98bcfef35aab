/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Bridge between Rust host code and an engine's extension interface
//!
//! `gdbridge` sits between host code and the engine's C function table. It owns the host side of every boundary crossing:
//!
//! * **Object wrappers.** [`Gd<T>`](obj::Gd) holds an engine object and applies the engine's reference counting rules;
//!   plain or checked handles decide whether liveness is verified on each use.
//! * **Calls.** Pointer calls marshal arguments into a [`CallFrame`](sys::CallFrame) in the engine's native layout;
//!   variant calls go through [`Variant`](builtin::Variant).
//! * **Classes.** Engine classes are described by a schema ([`ClassRegistry::load_api_json()`](registry::ClassRegistry::load_api_json));
//!   extension classes implement [`ExtensionClass`](registry::ExtensionClass) and get instance state, virtual overrides,
//!   properties and notifications routed to them.
//!
//! The engine drives the library through the entry points in [`init`].
//!
//! ## Cargo features
//!
//! * **`serde`**: `Serialize` and `Deserialize` for the math builtins.

#[doc(inline)]
pub use gdbridge_core::{builtin, classes, log, meta, obj, registry};

#[doc(hidden)]
pub use gdbridge_core::sys;

/// Entry points and init levels of the extension library.
pub mod init {
    pub use gdbridge_core::init::*;
}

#[doc(hidden)]
pub use gdbridge_core::private;

pub use gdbridge_core::engine_class;

pub mod prelude;
