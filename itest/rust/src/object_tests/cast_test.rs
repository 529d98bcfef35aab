/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::obj::WrapperRole;
use gdbridge::prelude::*;
use gdbridge::registry;

use crate::framework::{self, AudioEffectPhaser, Container, Control, Node, Resource, TabContainer};

#[test]
fn tab_container_cast_chain() {
    let _engine = framework::setup();
    let mut tabs = Gd::<TabContainer>::try_new().unwrap();
    let ptr = tabs.raw_ptr();

    let container = tabs.try_cast_ref::<Container>().unwrap();
    let control = container.try_cast_ref::<Control>().unwrap();
    let node = control.try_cast_ref::<Node>().unwrap();

    assert_eq!(container.raw_ptr(), ptr);
    assert_eq!(control.raw_ptr(), ptr);
    assert_eq!(node.raw_ptr(), ptr);
    assert_eq!(node.dynamic_class().as_str(), "TabContainer");

    let err = node.try_cast_ref::<Resource>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CastFailed);

    tabs.free().unwrap();
    assert!(!node.is_instance_valid());
}

#[test]
fn upcast_and_downcast() {
    let _engine = framework::setup();
    let tabs = Gd::<TabContainer>::try_new().unwrap();
    let ptr = tabs.raw_ptr();

    let object: Gd<Object> = tabs.upcast::<Control>().upcast();
    assert_eq!(object.raw_ptr(), ptr);

    let object = match object.try_cast::<Resource>() {
        Ok(_) => panic!("TabContainer is not a Resource"),
        Err(object) => object,
    };

    let mut control = object.try_cast::<Control>().unwrap();
    assert_eq!(control.raw_ptr(), ptr);
    assert_eq!(control.role(), WrapperRole::Owned);

    control.free().unwrap();
}

#[test]
fn cast_by_class_name() {
    let _engine = framework::setup();
    let mut node = Gd::<Node>::try_new().unwrap();
    let object = node.clone().upcast::<Object>();

    let registries = registry::get().unwrap();
    assert!(registries.classes.inherits("TabContainer", "CanvasItem"));
    assert!(!registries.classes.inherits("Node", "TabContainer"));
    drop(registries);

    assert!(registry::cast(&object, "Node").is_some());
    assert!(registry::cast(&object, "Control").is_none());

    node.free().unwrap();
    assert!(registry::cast(&object, "Node").is_none());
}

#[test]
fn refcounted_cast_takes_reference() {
    let _engine = framework::setup();
    let phaser = Gd::<AudioEffectPhaser>::try_new().unwrap();

    let resource = phaser.try_cast_ref::<Resource>().unwrap();
    assert_eq!(phaser.reference_count().unwrap(), 2);

    drop(resource);
    assert_eq!(phaser.reference_count().unwrap(), 1);

    let object = phaser.upcast::<Object>();
    let refcounted = object.try_cast::<RefCounted>().unwrap();
    assert_eq!(refcounted.reference_count().unwrap(), 1, "moving casts keep the same reference");
}

#[test]
fn abstract_class_cannot_be_constructed() {
    let _engine = framework::setup();

    let err = Gd::<Object>::construct_by_name("CanvasItem").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);

    let err = Gd::<Object>::construct_by_name("NoSuchClass").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);
    framework::mock_engine::take_messages();
}
