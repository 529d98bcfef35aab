/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Pointer identity: which engine objects the host currently tracks, and whether checked handles are still valid.

use dashmap::DashMap;

use crate::meta::error::BridgeError;
use crate::meta::ClassName;
use crate::obj::InstanceId;
use crate::registry::InstanceToken;
use crate::sys;

/// Shape of a [`Handle`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum HandleKind {
    /// Raw pointer; the caller guarantees the engine doesn't free the object behind the host's back.
    Plain,

    /// Pointer plus instance ID, verified against the engine's live-instance table before each use.
    Checked,
}

/// Host-side token for an engine object.
///
/// Stores the address rather than a raw pointer, so handles can live in the process-wide registries. The bridge never
/// dereferences it; it is only passed back through the ABI after [`PointerRegistry::resolve()`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Handle {
    addr: usize,
    checked_id: Option<InstanceId>,
}

impl Handle {
    pub fn plain(ptr: sys::GDExtensionObjectPtr) -> Self {
        Self {
            addr: ptr as usize,
            checked_id: None,
        }
    }

    pub fn checked(ptr: sys::GDExtensionObjectPtr, id: InstanceId) -> Self {
        Self {
            addr: ptr as usize,
            checked_id: Some(id),
        }
    }

    pub fn kind(&self) -> HandleKind {
        match self.checked_id {
            Some(_) => HandleKind::Checked,
            None => HandleKind::Plain,
        }
    }

    /// Instance ID verified on resolve; `None` for plain handles.
    pub fn checked_id(&self) -> Option<InstanceId> {
        self.checked_id
    }

    /// The stored pointer, without validity check.
    pub fn ptr_unchecked(&self) -> sys::GDExtensionObjectPtr {
        self.addr as sys::GDExtensionObjectPtr
    }

    pub fn is_null(&self) -> bool {
        self.addr == 0
    }
}

/// Maps instance IDs to live objects. The engine implements it; tests substitute their own.
pub trait InstanceLookup: Send + Sync {
    /// Returns the object with the given ID, or null if no such object is alive.
    fn object_from_id(&self, id: InstanceId) -> sys::GDExtensionObjectPtr;
}

/// [`InstanceLookup`] through the engine's `object_get_instance_from_id`.
pub struct EngineLookup;

impl InstanceLookup for EngineLookup {
    fn object_from_id(&self, id: InstanceId) -> sys::GDExtensionObjectPtr {
        // SAFETY: the engine accepts any ID and returns null for unknown ones.
        unsafe { sys::interface_fn!(object_get_instance_from_id)(id.to_u64()) }
    }
}

#[derive(Clone, Debug)]
struct PointerEntry {
    class: ClassName,
    wrappers: usize,
    instance: Option<InstanceToken>,
}

/// Tracks every engine object the host holds a wrapper for.
///
/// One entry per engine pointer, shared by all wrappers of that pointer. Extension instances are attached to their engine
/// twin's entry, so that any wrapper recorded for the twin finds its host state.
pub struct PointerRegistry {
    entries: DashMap<usize, PointerEntry>,
    lookup: Box<dyn InstanceLookup>,
}

impl PointerRegistry {
    pub fn new() -> Self {
        Self::with_lookup(Box::new(EngineLookup))
    }

    pub fn with_lookup(lookup: Box<dyn InstanceLookup>) -> Self {
        Self {
            entries: DashMap::new(),
            lookup,
        }
    }

    /// Starts tracking one more wrapper of `ptr` and returns its handle.
    ///
    /// `id` is required for [`HandleKind::Checked`]; plain handles ignore it.
    pub fn record(
        &self,
        ptr: sys::GDExtensionObjectPtr,
        kind: HandleKind,
        id: Option<InstanceId>,
        class: &ClassName,
    ) -> Result<Handle, BridgeError> {
        if ptr.is_null() {
            return Err(BridgeError::invalid_handle(format!("cannot record null {class}")));
        }

        let handle = match (kind, id) {
            (HandleKind::Plain, _) => Handle::plain(ptr),
            (HandleKind::Checked, Some(id)) => Handle::checked(ptr, id),
            (HandleKind::Checked, None) => {
                return Err(BridgeError::invalid_handle(format!(
                    "{class} at {ptr:?} has no instance ID; cannot create a checked handle"
                )));
            }
        };

        self.entries
            .entry(handle.addr)
            .and_modify(|entry| entry.wrappers += 1)
            .or_insert_with(|| PointerEntry {
                class: class.clone(),
                wrappers: 1,
                instance: None,
            });

        Ok(handle)
    }

    /// Returns the engine pointer behind `handle`, verifying liveness for checked handles.
    pub fn resolve(&self, handle: &Handle) -> Result<sys::GDExtensionObjectPtr, BridgeError> {
        if handle.is_null() {
            return Err(BridgeError::invalid_handle("null handle"));
        }

        let ptr = handle.ptr_unchecked();
        if let Some(id) = handle.checked_id {
            let live = self.lookup.object_from_id(id);

            // A recycled address with another ID is a different object.
            if live.is_null() || live != ptr {
                return Err(BridgeError::invalid_handle(format!("instance {id} was freed")));
            }
        }

        Ok(ptr)
    }

    /// Stops tracking one wrapper of the handle's object. Never touches engine state.
    pub fn forget(&self, handle: &Handle) {
        if let Some(mut entry) = self.entries.get_mut(&handle.addr) {
            entry.wrappers = entry.wrappers.saturating_sub(1);
        }

        self.entries
            .remove_if(&handle.addr, |_, entry| entry.wrappers == 0 && entry.instance.is_none());
    }

    /// Links the extension instance `token` to its engine twin at `ptr`.
    pub fn attach_instance(&self, ptr: sys::GDExtensionObjectPtr, class: &ClassName, token: InstanceToken) {
        self.entries
            .entry(ptr as usize)
            .and_modify(|entry| entry.instance = Some(token))
            .or_insert_with(|| PointerEntry {
                class: class.clone(),
                wrappers: 0,
                instance: Some(token),
            });
    }

    /// Unlinks the extension instance of `ptr`, returning its token.
    pub fn detach_instance(&self, ptr: sys::GDExtensionObjectPtr) -> Option<InstanceToken> {
        let addr = ptr as usize;
        let token = self.entries.get_mut(&addr).and_then(|mut entry| entry.instance.take());

        self.entries
            .remove_if(&addr, |_, entry| entry.wrappers == 0 && entry.instance.is_none());
        token
    }

    /// Extension instance attached to `ptr`, if any.
    pub fn instance_of(&self, ptr: sys::GDExtensionObjectPtr) -> Option<InstanceToken> {
        self.entries.get(&(ptr as usize)).and_then(|entry| entry.instance)
    }

    /// Class recorded for `ptr` when it was first tracked.
    pub fn class_of(&self, ptr: sys::GDExtensionObjectPtr) -> Option<ClassName> {
        self.entries.get(&(ptr as usize)).map(|entry| entry.class.clone())
    }

    /// Number of live host wrappers for `ptr`.
    pub fn wrapper_count(&self, ptr: sys::GDExtensionObjectPtr) -> usize {
        self.entries.get(&(ptr as usize)).map_or(0, |entry| entry.wrappers)
    }

    /// Number of tracked engine objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PointerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Object table standing in for the engine.
    #[derive(Default)]
    struct FakeLookup {
        live: Mutex<HashMap<u64, usize>>,
    }

    impl InstanceLookup for std::sync::Arc<FakeLookup> {
        fn object_from_id(&self, id: InstanceId) -> sys::GDExtensionObjectPtr {
            self.live
                .lock()
                .get(&id.to_u64())
                .map_or(std::ptr::null_mut(), |&addr| addr as sys::GDExtensionObjectPtr)
        }
    }

    fn fake_ptr(addr: usize) -> sys::GDExtensionObjectPtr {
        addr as sys::GDExtensionObjectPtr
    }

    fn setup() -> (std::sync::Arc<FakeLookup>, PointerRegistry) {
        let lookup = std::sync::Arc::new(FakeLookup::default());
        let registry = PointerRegistry::with_lookup(Box::new(lookup.clone()));
        (lookup, registry)
    }

    #[test]
    fn record_then_resolve_returns_pointer() {
        let (lookup, registry) = setup();
        let class = ClassName::new("Node");
        let id = InstanceId::try_from_u64(7).unwrap();
        lookup.live.lock().insert(7, 0x1000);

        let plain = registry.record(fake_ptr(0x2000), HandleKind::Plain, None, &class).unwrap();
        let checked = registry.record(fake_ptr(0x1000), HandleKind::Checked, Some(id), &class).unwrap();

        assert_eq!(registry.resolve(&plain).unwrap(), fake_ptr(0x2000));
        assert_eq!(registry.resolve(&checked).unwrap(), fake_ptr(0x1000));
        assert_eq!(checked.kind(), HandleKind::Checked);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn checked_handle_invalid_after_free() {
        let (lookup, registry) = setup();
        let class = ClassName::new("Node");
        let id = InstanceId::try_from_u64(9).unwrap();
        lookup.live.lock().insert(9, 0x1000);

        let handle = registry.record(fake_ptr(0x1000), HandleKind::Checked, Some(id), &class).unwrap();
        lookup.live.lock().remove(&9);

        let err = registry.resolve(&handle).unwrap_err();
        assert_eq!(err.kind(), crate::meta::error::ErrorKind::InvalidHandle);

        // Address reused by another object.
        lookup.live.lock().insert(9, 0x3000);
        assert!(registry.resolve(&handle).is_err());
    }

    #[test]
    fn forget_counts_wrappers() {
        let (_lookup, registry) = setup();
        let class = ClassName::new("Resource");

        let a = registry.record(fake_ptr(0x10), HandleKind::Plain, None, &class).unwrap();
        let b = registry.record(fake_ptr(0x10), HandleKind::Plain, None, &class).unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.wrapper_count(fake_ptr(0x10)), 2);

        registry.forget(&a);
        assert_eq!(registry.wrapper_count(fake_ptr(0x10)), 1);
        registry.forget(&b);
        assert!(registry.is_empty());
    }

    #[test]
    fn instance_outlives_wrappers() {
        let (_lookup, registry) = setup();
        let class = ClassName::new("MyNode");
        let token = InstanceToken::new(3, 1);

        registry.attach_instance(fake_ptr(0x40), &class, token);
        let handle = registry.record(fake_ptr(0x40), HandleKind::Plain, None, &class).unwrap();
        registry.forget(&handle);

        assert_eq!(registry.instance_of(fake_ptr(0x40)), Some(token));
        assert_eq!(registry.detach_instance(fake_ptr(0x40)), Some(token));
        assert!(registry.is_empty());
    }

    #[test]
    fn null_and_missing_id_are_rejected() {
        let (_lookup, registry) = setup();
        let class = ClassName::new("Node");

        assert!(registry.record(std::ptr::null_mut(), HandleKind::Plain, None, &class).is_err());
        assert!(registry.record(fake_ptr(0x8), HandleKind::Checked, None, &class).is_err());
        assert!(registry.resolve(&Handle::plain(std::ptr::null_mut())).is_err());
    }
}
