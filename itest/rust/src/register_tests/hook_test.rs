/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::builtin::VariantType;
use gdbridge::meta::PropertyInfo;
use gdbridge::prelude::*;
use gdbridge::registry;

use crate::framework::{self, mock_engine, Node};

/// Node that records the engine hooks it receives and exposes one dynamic property, `speed`.
pub struct HookRecorder {
    base: Base<Node>,
    speed: i64,
    notifications: Vec<i32>,
}

impl HookRecorder {
    const DEFAULT_SPEED: i64 = 10;
}

impl GodotClass for HookRecorder {
    type Base = Node;
    const CLASS_NAME: &'static str = "HookRecorder";
}

unsafe impl Inherits<Node> for HookRecorder {}
unsafe impl Inherits<Object> for HookRecorder {}

impl ExtensionClass for HookRecorder {
    fn init(base: Base<Node>) -> Self {
        Self {
            base,
            speed: Self::DEFAULT_SPEED,
            notifications: Vec::new(),
        }
    }

    fn on_notification(&mut self, what: i32) {
        self.notifications.push(what);
    }

    fn get_property(&self, name: &str) -> Option<Variant> {
        match name {
            "speed" => Some(self.speed.to_variant()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Variant) -> bool {
        match (name, value.try_to::<i64>()) {
            ("speed", Ok(speed)) => {
                self.speed = speed;
                true
            }
            _ => false,
        }
    }

    fn property_list(&self) -> Vec<PropertyInfo> {
        let mut speed = PropertyInfo::new("speed", VariantType::Int);
        speed.hint_string = "0,100".to_string();
        vec![speed]
    }

    fn property_get_revert(&self, name: &str) -> Option<Variant> {
        (name == "speed").then(|| Self::DEFAULT_SPEED.to_variant())
    }

    fn to_string(&self) -> Option<String> {
        Some(format!("HookRecorder(speed={})", self.speed))
    }
}

#[test]
fn postinitialize_is_delivered() {
    let _engine = framework::setup();

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    let notifications = recorder.with_instance(|this| this.notifications.clone()).unwrap();
    assert_eq!(notifications, [mock_engine::NOTIFICATION_POSTINITIALIZE]);

    recorder.notify(42).unwrap();
    mock_engine::engine_notify(recorder.raw_ptr(), 7);

    let notifications = recorder.with_instance(|this| this.notifications.clone()).unwrap();
    assert_eq!(notifications, [mock_engine::NOTIFICATION_POSTINITIALIZE, 42, 7]);

    recorder.free().unwrap();
}

#[test]
fn dynamic_property_get_set() {
    let _engine = framework::setup();

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    assert_eq!(recorder.get("speed").unwrap().try_to::<i64>(), Ok(HookRecorder::DEFAULT_SPEED));

    recorder.set("speed", &55.to_variant()).unwrap();
    assert_eq!(recorder.with_instance(|this| this.speed), Ok(55));
    assert_eq!(mock_engine::engine_get(recorder.raw_ptr(), "speed").map(|v| v.as_int()), Some(55));

    // Rejected by the class, so the engine stores it as a plain property.
    recorder.set("speed", &"fast".to_variant()).unwrap();
    assert_eq!(recorder.with_instance(|this| this.speed), Ok(55));

    recorder.set("label", &"runner".to_variant()).unwrap();
    assert_eq!(recorder.get("label").unwrap().try_to::<String>(), Ok("runner".to_string()));
    assert!(recorder.get("missing").unwrap().is_nil());

    recorder.free().unwrap();
}

#[test]
fn property_list_and_revert() {
    let _engine = framework::setup();

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();

    let properties = mock_engine::property_list(recorder.raw_ptr());
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].name, "speed");
    assert_eq!(properties[0].variant_type, VariantType::Int);
    assert_eq!(properties[0].hint_string, "0,100");
    assert_eq!(properties[0].usage, gdbridge::meta::PROPERTY_USAGE_DEFAULT);

    let revert = mock_engine::property_revert(recorder.raw_ptr(), "speed");
    assert_eq!(revert.map(|v| v.as_int()), Some(HookRecorder::DEFAULT_SPEED));
    assert!(mock_engine::property_revert(recorder.raw_ptr(), "label").is_none());

    recorder.free().unwrap();
}

#[test]
fn custom_to_string() {
    let _engine = framework::setup();

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    recorder.with_instance_mut(|this| this.speed = 3).unwrap();

    assert_eq!(recorder.to_gstring().unwrap(), "HookRecorder(speed=3)");
    assert_eq!(mock_engine::engine_to_string(recorder.raw_ptr()).as_deref(), Some("HookRecorder(speed=3)"));

    let mut plain = Gd::<Node>::try_new().unwrap();
    assert!(plain.to_gstring().unwrap().to_string().starts_with("<Node#"));

    plain.free().unwrap();
    recorder.free().unwrap();
}

#[test]
fn nested_borrow_is_rejected() {
    let _engine = framework::setup();

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    let alias = recorder.clone();

    let inner = recorder
        .with_instance_mut(|this| {
            this.speed += 1;
            alias.with_instance(|other| other.speed)
        })
        .unwrap();
    assert_eq!(inner.unwrap_err().kind(), ErrorKind::AlreadyBound);

    let shared = recorder.with_instance(|_| alias.with_instance(|other| other.speed)).unwrap();
    assert_eq!(shared, Ok(HookRecorder::DEFAULT_SPEED + 1));

    drop(alias);
    recorder.free().unwrap();
}

#[test]
fn base_refers_to_own_object() {
    let _engine = framework::setup();

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    let base = recorder.with_instance(|this| this.base.to_gd()).unwrap().unwrap();

    assert_eq!(base.raw_ptr(), recorder.raw_ptr());
    assert_eq!(base.get_class().unwrap(), "HookRecorder");
    assert!(base.is_class("Node"));

    drop(base);
    recorder.free().unwrap();
}

#[test]
fn instance_dropped_when_freed() {
    let _engine = framework::setup();

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    let registries = registry::get().unwrap();
    let live_instances = registries.instances.len();

    recorder.free().unwrap();

    assert_eq!(registries.instances.len(), live_instances - 1);
    assert_eq!(registries.pointers.instance_of(recorder.raw_ptr()), None);
    assert_eq!(recorder.with_instance(|this| this.speed).unwrap_err().kind(), ErrorKind::InvalidHandle);
}

#[test]
fn construct_by_class_name() {
    let _engine = framework::setup();

    let object = registry::construct("HookRecorder").unwrap();
    assert_eq!(object.get_class().unwrap(), "HookRecorder");

    let mut recorder = object.try_cast::<HookRecorder>().unwrap();
    assert_eq!(recorder.with_instance(|this| this.speed), Ok(HookRecorder::DEFAULT_SPEED));

    recorder.free().unwrap();
}
