/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::atomic::{AtomicUsize, Ordering};

use gdbridge::obj::WrapperRole;
use gdbridge::prelude::*;
use gdbridge::registry::{self, HandleKind};

use crate::framework::{self, mock_engine, AudioEffectPhaser, Node, Resource};

static FREED_COUNTED: AtomicUsize = AtomicUsize::new(0);

/// Refcounted extension class that counts how often the engine frees an instance.
pub struct CountedResource {
    base: Base<Resource>,
}

impl GodotClass for CountedResource {
    type Base = Resource;
    const CLASS_NAME: &'static str = "CountedResource";
}

unsafe impl Inherits<Resource> for CountedResource {}
unsafe impl Inherits<RefCounted> for CountedResource {}
unsafe impl Inherits<Object> for CountedResource {}

impl ExtensionClass for CountedResource {
    fn init(base: Base<Resource>) -> Self {
        Self { base }
    }
}

impl Drop for CountedResource {
    fn drop(&mut self) {
        FREED_COUNTED.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn refcount_follows_owning_wrappers() {
    let _engine = framework::setup();
    let freed_before = FREED_COUNTED.load(Ordering::SeqCst);

    let mut counted = Gd::<CountedResource>::try_new().unwrap();
    let id = counted.instance_id().unwrap();
    let ptr = counted.raw_ptr();
    assert!(id.is_ref_counted());
    assert_eq!(counted.reference_count().unwrap(), 1);

    let mut resource = counted.try_cast_ref::<Resource>().unwrap();
    let mut refcounted = resource.try_cast_ref::<RefCounted>().unwrap();
    let mut object = refcounted.try_cast_ref::<Object>().unwrap();

    for wrapper_ptr in [resource.raw_ptr(), refcounted.raw_ptr(), object.raw_ptr()] {
        assert_eq!(wrapper_ptr, ptr);
    }
    assert_eq!(counted.reference_count().unwrap(), 4);
    assert_eq!(registry::get().unwrap().pointers.wrapper_count(ptr), 4);

    object.dispose().unwrap();
    assert_eq!(counted.reference_count().unwrap(), 3);
    refcounted.dispose().unwrap();
    assert_eq!(counted.reference_count().unwrap(), 2);
    resource.dispose().unwrap();
    assert_eq!(counted.reference_count().unwrap(), 1);
    assert_eq!(FREED_COUNTED.load(Ordering::SeqCst), freed_before);

    counted.dispose().unwrap();
    assert!(!mock_engine::is_alive(id.to_u64()));
    assert!(mock_engine::was_destroyed(id.to_u64()));
    assert_eq!(FREED_COUNTED.load(Ordering::SeqCst), freed_before + 1);
    assert_eq!(registry::get().unwrap().pointers.wrapper_count(ptr), 0);
    assert!(registry::get().unwrap().pointers.instance_of(ptr).is_none());

    drop((counted, resource, refcounted, object));
    assert_eq!(FREED_COUNTED.load(Ordering::SeqCst), freed_before + 1, "free hook runs once");
}

#[test]
fn base_wrapper_takes_no_reference() {
    let _engine = framework::setup();
    let counted = Gd::<CountedResource>::try_new().unwrap();

    let base = counted.with_instance(|this| this.base.to_gd()).unwrap().unwrap();
    assert_eq!(base.role(), WrapperRole::Borrowed);
    assert_eq!(base.raw_ptr(), counted.raw_ptr());
    assert_eq!(counted.reference_count().unwrap(), 1);

    drop(base);
    assert_eq!(counted.reference_count().unwrap(), 1);
}

#[test]
fn dropping_last_wrapper_destroys() {
    let _engine = framework::setup();
    let phaser = Gd::<AudioEffectPhaser>::try_new().unwrap();
    let id = phaser.instance_id().unwrap();
    let second = phaser.clone();

    drop(phaser);
    assert!(mock_engine::is_alive(id.to_u64()));
    assert_eq!(second.reference_count().unwrap(), 1);

    drop(second);
    assert!(!mock_engine::is_alive(id.to_u64()));
}

#[test]
fn double_dispose_is_reported() {
    let _engine = framework::setup();
    let phaser = Gd::<AudioEffectPhaser>::try_new().unwrap();
    let mut alias = phaser.clone();
    assert_eq!(phaser.reference_count().unwrap(), 2);

    alias.dispose().unwrap();
    assert!(alias.is_disposed());
    assert_eq!(phaser.reference_count().unwrap(), 1);

    let err = alias.dispose().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DoubleDispose);
    assert_eq!(phaser.reference_count().unwrap(), 1, "second dispose changes nothing");

    let err = alias.resolve().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);
}

#[test]
fn refcounted_object_cannot_be_freed() {
    let _engine = framework::setup();
    let mut phaser = Gd::<AudioEffectPhaser>::try_new().unwrap();

    let err = phaser.free().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);
    assert!(phaser.is_instance_valid());
    assert_eq!(phaser.reference_count().unwrap(), 1);
}

#[test]
fn checked_child_after_engine_free() {
    let _engine = framework::setup();
    let mut parent = Gd::<Node>::try_new().unwrap();
    let child = Gd::<Node>::try_new().unwrap();
    assert_eq!(child.handle().kind(), HandleKind::Checked);

    parent
        .ptrcall::<()>("add_child", |frame| {
            frame.arg(&child);
        })
        .unwrap();
    let count: i64 = parent.ptrcall("get_child_count", |_| {}).unwrap();
    assert_eq!(count, 1);

    let borrowed = parent
        .ptrcall_object::<Node>("get_child", |frame| {
            frame.arg(0);
        })
        .unwrap()
        .expect("child exists");
    assert_eq!(borrowed.role(), WrapperRole::Borrowed);
    assert_eq!(borrowed.handle().kind(), HandleKind::Checked);
    assert_eq!(borrowed.raw_ptr(), child.raw_ptr());
    assert_eq!(borrowed.resolve().unwrap(), child.raw_ptr());

    mock_engine::free_from_engine(child.raw_ptr());

    let err = borrowed.resolve().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);
    assert!(!borrowed.is_instance_valid());
    assert!(!child.is_instance_valid());
    assert_eq!(child.get_class().unwrap_err().kind(), ErrorKind::InvalidHandle);

    parent.free().unwrap();
}

#[test]
fn freeing_parent_invalidates_children() {
    let _engine = framework::setup();
    let mut parent = Gd::<Node>::try_new().unwrap();
    let child = Gd::<Node>::try_new().unwrap();
    parent
        .ptrcall::<()>("add_child", |frame| {
            frame.arg(&child);
        })
        .unwrap();

    parent.free().unwrap();
    assert!(parent.is_disposed());
    assert!(!child.is_instance_valid());
    assert_eq!(parent.free().unwrap_err().kind(), ErrorKind::InvalidHandle);
}

#[test]
fn lookup_by_instance_id() {
    let _engine = framework::setup();
    let mut node = Gd::<Node>::try_new().unwrap();
    let id = node.instance_id().unwrap();

    let found = Gd::<Node>::from_instance_id(id).unwrap();
    assert_eq!(found, node);
    assert_eq!(found.role(), WrapperRole::Owned);
    drop(found);

    node.free().unwrap();
    let err = Gd::<Node>::from_instance_id(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);

    // The ID recorded at wrap time stays readable after the object is gone.
    assert_eq!(node.instance_id(), Some(id));
}

#[test]
fn refcounted_via_instance_id_retains() {
    let _engine = framework::setup();
    let phaser = Gd::<AudioEffectPhaser>::try_new().unwrap();
    let id = phaser.instance_id().unwrap();

    let found = Gd::<Resource>::from_instance_id(id).unwrap();
    assert_eq!(phaser.reference_count().unwrap(), 2);

    drop(phaser);
    assert!(mock_engine::is_alive(id.to_u64()));
    assert_eq!(found.reference_count().unwrap(), 1);
}
