/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Test harness: the mock engine, the engine classes the tests use, and the library entry point driving the init sequence.
//!
//! Every test starts with `let _engine = framework::setup();`. The returned guard serializes tests, since the binding and
//! the registries are process-wide.

pub mod mock_engine;

use gdbridge::init::{self, BridgeConfig, ExtensionLibrary, InitLevel};
use gdbridge::prelude::*;
use gdbridge::{registry, sys};
use parking_lot::{const_mutex, Mutex, MutexGuard};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Engine classes

engine_class!(pub Resource: RefCounted, Object; refcounted);
engine_class!(pub Node: Object);
engine_class!(pub CanvasItem: Node, Object);
engine_class!(pub Control: CanvasItem, Node, Object);
engine_class!(pub Container: Control, CanvasItem, Node, Object);
engine_class!(pub TabContainer: Container, Control, CanvasItem, Node, Object);
engine_class!(pub AudioEffect: Resource, RefCounted, Object; refcounted);
engine_class!(pub AudioEffectPhaser: AudioEffect, Resource, RefCounted, Object; refcounted);
engine_class!(pub AnimationNodeStateMachineTransition: Resource, RefCounted, Object; refcounted);
engine_class!(pub PhysicsDirectSpaceState2D: Object);
engine_class!(pub PhysicsDirectSpaceState2DExtension: PhysicsDirectSpaceState2D, Object);
engine_class! {
    /// Engine class with methods of 0, 3 and 40 integer parameters that return the sum of their arguments.
    pub ArityProbe: Object
}

/// Schema of the engine classes above, as the engine's API dump describes them.
pub const TEST_API_JSON: &str = r#"{
    "classes": [
        { "name": "Resource", "inherits": "RefCounted", "is_refcounted": true },
        {
            "name": "Node",
            "inherits": "Object",
            "handle": "checked",
            "methods": [
                { "name": "add_child", "hash": 3863233950 },
                { "name": "get_child", "hash": 541253412, "return_ownership": "lifetime_bound" },
                { "name": "get_child_count", "hash": 894402480 }
            ]
        },
        { "name": "CanvasItem", "inherits": "Node", "is_instantiable": false },
        { "name": "Control", "inherits": "CanvasItem" },
        { "name": "Container", "inherits": "Control" },
        { "name": "TabContainer", "inherits": "Container" },
        { "name": "AudioEffect", "inherits": "Resource", "is_refcounted": true, "is_instantiable": false },
        {
            "name": "AudioEffectPhaser",
            "inherits": "AudioEffect",
            "is_refcounted": true,
            "methods": [
                { "name": "set_range_min_hz", "hash": 373806689 },
                { "name": "get_range_min_hz", "hash": 1740695150 }
            ]
        },
        {
            "name": "AnimationNodeStateMachineTransition",
            "inherits": "Resource",
            "is_refcounted": true,
            "methods": [
                { "name": "set_advance_condition", "hash": 3304788590 },
                { "name": "get_advance_condition", "hash": 2002593661 }
            ],
            "signals": [ { "name": "advance_condition_changed" } ]
        },
        {
            "name": "PhysicsDirectSpaceState2D",
            "inherits": "Object",
            "is_instantiable": false,
            "methods": [
                { "name": "intersect_ray", "hash": 1590275562 }
            ]
        },
        {
            "name": "PhysicsDirectSpaceState2DExtension",
            "inherits": "PhysicsDirectSpaceState2D",
            "methods": [
                { "name": "_intersect_ray", "is_virtual": true, "return_value": { "type": "Dictionary" } }
            ]
        },
        {
            "name": "ArityProbe",
            "inherits": "Object",
            "methods": [
                { "name": "none", "hash": 100001 },
                { "name": "sum3", "hash": 100003 },
                { "name": "sum_many", "hash": 100040 }
            ]
        }
    ]
}"#;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Library entry point

/// Extension library of the test process. Loads the test schema and queues the test classes at `Scene` level.
pub struct IntegrationTests;

unsafe impl ExtensionLibrary for IntegrationTests {
    fn on_level_init(level: InitLevel) {
        if level == InitLevel::Scene {
            load_test_schema();
            crate::register_tests::queue_test_classes();
        }
    }
}

/// Same library, but with engine defaults for virtual methods disabled.
pub struct DenyDefaultsTests;

unsafe impl ExtensionLibrary for DenyDefaultsTests {
    fn config() -> BridgeConfig {
        BridgeConfig::new().with_virtual_dispatch_fallback(init::VirtualFallback::Deny)
    }

    fn on_level_init(level: InitLevel) {
        IntegrationTests::on_level_init(level);
    }
}

fn load_test_schema() {
    let loaded = registry::get().and_then(|registries| registries.classes.load_api_json(TEST_API_JSON));
    if let Err(err) = loaded {
        godot_error!("test schema not loaded: {err}");
    }
}

static ENGINE_LOCK: Mutex<()> = const_mutex(());

/// Initializes the binding on first use and serializes the calling test against all others.
///
/// Messages logged before the test starts are discarded.
pub fn setup() -> MutexGuard<'static, ()> {
    let guard = ENGINE_LOCK.lock();
    if !sys::is_initialized() {
        start::<IntegrationTests>();
    }

    mock_engine::take_messages();
    guard
}

/// Runs the engine's load sequence for library `E`: entry point, then every level from the library's minimum upwards.
pub fn start<E: ExtensionLibrary>() {
    // The interface table is copied by the binding; leaking keeps the pattern of a static engine table.
    let interface: &'static sys::EngineInterface = Box::leak(Box::new(mock_engine::interface()));

    // SAFETY: the table is fully populated and the mock's library token is stable.
    let min_level = unsafe { init::initialise_extension::<E>(interface, mock_engine::library()) };

    for level in InitLevel::ALL {
        if level >= min_level {
            init::on_level_init::<E>(level);
        }
    }
}

/// Runs the engine's unload sequence for library `E`.
pub fn stop<E: ExtensionLibrary>() {
    for level in InitLevel::ALL.into_iter().rev() {
        init::on_level_deinit::<E>(level);
    }
    init::deinitialise_extension();
}

/// Restarts the binding with library `E` until dropped, then returns to [`IntegrationTests`].
pub struct Restarted<E: ExtensionLibrary> {
    _library: std::marker::PhantomData<E>,
}

impl<E: ExtensionLibrary> Restarted<E> {
    pub fn new() -> Self {
        stop::<IntegrationTests>();
        start::<E>();
        Self {
            _library: std::marker::PhantomData,
        }
    }
}

impl<E: ExtensionLibrary> Drop for Restarted<E> {
    fn drop(&mut self) {
        stop::<E>();
        start::<IntegrationTests>();
    }
}

/// Asserts that exactly one warning containing `needle` was logged since the last drain.
pub fn expect_warning(needle: &str) {
    let messages = mock_engine::take_messages();
    let matching = messages
        .iter()
        .filter(|m| m.level == mock_engine::LogLevel::Warning && m.text.contains(needle))
        .count();

    assert_eq!(matching, 1, "expected one warning containing {needle:?}, got {messages:#?}");
}
