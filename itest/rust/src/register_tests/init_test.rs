/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::init::{self, InitLevel};
use gdbridge::prelude::*;
use gdbridge::registry::{self, register_class, unregister_class};
use gdbridge::sys;

use super::hook_test::HookRecorder;
use super::virtual_test::EmptySpaceState;
use crate::framework::{self, mock_engine, IntegrationTests, Node};

#[test]
fn test_classes_registered_at_scene_level() {
    let _engine = framework::setup();
    let registries = registry::get().unwrap();

    for class in ["FixedHitSpaceState", "EmptySpaceState", "HookRecorder", "CountedResource"] {
        let entry = registries.classes.get(class).unwrap_or_else(|| panic!("{class} not registered"));
        assert!(entry.is_extension(), "{class}");
    }

    assert!(registries.classes.inherits("FixedHitSpaceState", "PhysicsDirectSpaceState2D"));
    assert!(registries.classes.inherits("HookRecorder", "Object"));
    assert!(!registries.classes.inherits("HookRecorder", "Resource"));
    assert!(registries.classes.is_refcounted("CountedResource"));
    assert!(!registries.classes.is_refcounted("HookRecorder"));
}

#[test]
fn shutdown_removes_registries() {
    let _engine = framework::setup();

    framework::stop::<IntegrationTests>();
    assert!(!sys::is_initialized());
    assert!(!registry::is_installed());
    assert_eq!(registry::get().err().map(|e| e.kind()), Some(ErrorKind::NotInitialized));

    framework::start::<IntegrationTests>();
    assert!(sys::is_initialized());

    let mut node = Gd::<Node>::try_new().unwrap();
    assert!(node.is_instance_valid());
    node.free().unwrap();

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    recorder.free().unwrap();
}

#[test]
fn levels_unload_and_reload() {
    let _engine = framework::setup();

    // Nothing is registered at Editor level; Scene classes survive.
    init::on_level_deinit::<IntegrationTests>(InitLevel::Editor);
    assert!(registry::get().unwrap().classes.get("HookRecorder").is_some());

    // Last loaded level: classes and registries go away, the binding stays.
    init::on_level_deinit::<IntegrationTests>(InitLevel::Scene);
    assert!(!registry::is_installed());
    assert!(sys::is_initialized());
    assert_eq!(
        Gd::<HookRecorder>::try_new().err().map(|e| e.kind()),
        Some(ErrorKind::NotInitialized)
    );
    mock_engine::take_messages();

    init::on_level_init::<IntegrationTests>(InitLevel::Scene);
    init::on_level_init::<IntegrationTests>(InitLevel::Editor);
    assert!(registry::get().unwrap().classes.get("HookRecorder").is_some());

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    recorder.free().unwrap();
}

#[test]
fn registering_twice_warns_and_replaces() {
    let _engine = framework::setup();

    register_class::<HookRecorder>().unwrap();
    framework::expect_warning("class registered twice: HookRecorder");

    let mut recorder = Gd::<HookRecorder>::try_new().unwrap();
    assert_eq!(recorder.get_class().unwrap(), "HookRecorder");
    recorder.free().unwrap();
}

#[test]
fn unregister_and_register_again() {
    let _engine = framework::setup();

    unregister_class::<EmptySpaceState>().unwrap();
    assert!(registry::get().unwrap().classes.get("EmptySpaceState").is_none());
    assert!(Gd::<EmptySpaceState>::try_new().is_err());
    mock_engine::take_messages();

    let err = unregister_class::<EmptySpaceState>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);
    framework::expect_warning("cannot unregister EmptySpaceState");

    register_class::<EmptySpaceState>().unwrap();
    let mut space = Gd::<EmptySpaceState>::try_new().unwrap();
    space.free().unwrap();
}

#[test]
fn unknown_parent_is_rejected() {
    let _engine = framework::setup();

    struct Unlisted;

    impl GodotClass for Unlisted {
        type Base = Object;
        const CLASS_NAME: &'static str = "UnlistedEngineClass";
    }

    struct Orphan;

    impl GodotClass for Orphan {
        type Base = Unlisted;
        const CLASS_NAME: &'static str = "OrphanRecorder";
    }

    impl ExtensionClass for Orphan {
        fn init(_base: Base<Unlisted>) -> Self {
            Orphan
        }
    }

    let err = register_class::<Orphan>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);
    assert!(err.to_string().contains("parent class UnlistedEngineClass is unknown"), "{err}");
    assert!(registry::get().unwrap().classes.get("OrphanRecorder").is_none());
}
