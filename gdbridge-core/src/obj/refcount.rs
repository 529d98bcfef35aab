/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Intrusive reference counting of `RefCounted` objects, through the engine's own method binds.
//!
//! Policy, per host wrapper role:
//! - constructed by the host: `init_ref` once, `unreference` on dispose;
//! - returned with ownership transferred: no increment, `unreference` on dispose;
//! - returned borrowed and retained: `reference`, `unreference` on dispose;
//! - borrowed without retaining: no count changes at all.

use crate::meta::error::BridgeError;
use crate::sys;
use sys::{CallFrame, GodotFfi};

const REFCOUNTED: &str = "RefCounted";

fn call_refcounted<R: GodotFfi>(ptr: sys::GDExtensionObjectPtr, method: &str) -> Result<R, BridgeError> {
    let registries = crate::registry::get()?;
    let (bind, _) = registries.classes.method_bind(REFCOUNTED, method)?;

    let mut frame = CallFrame::new();
    let slot = frame.ret::<R>();

    // SAFETY: all four refcount methods take no arguments; `ptr` is a live RefCounted.
    unsafe { frame.ptrcall(bind.as_sys(), ptr) };

    let value = frame.take_ret(slot);
    frame.free();
    Ok(value)
}

/// Sets the count of a freshly constructed object to 1. Must be called exactly once per object.
pub(crate) fn init_ref(ptr: sys::GDExtensionObjectPtr) -> Result<(), BridgeError> {
    crate::out!("init_ref {ptr:?}");
    call_refcounted::<bool>(ptr, "init_ref").map(drop)
}

pub(crate) fn reference(ptr: sys::GDExtensionObjectPtr) -> Result<(), BridgeError> {
    crate::out!("reference {ptr:?}");
    call_refcounted::<bool>(ptr, "reference").map(drop)
}

/// Decrements the count. Returns `true` if it reached zero, in which case the caller must destroy the object.
pub(crate) fn unreference(ptr: sys::GDExtensionObjectPtr) -> Result<bool, BridgeError> {
    crate::out!("unreference {ptr:?}");
    call_refcounted::<bool>(ptr, "unreference")
}

/// Current count of the object at `ptr`.
pub(crate) fn get_reference_count(ptr: sys::GDExtensionObjectPtr) -> Result<i64, BridgeError> {
    call_refcounted::<i64>(ptr, "get_reference_count")
}
