/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::init::{self, VirtualFallback};
use gdbridge::prelude::*;
use gdbridge::registry::{self, register_class, unregister_class};

use crate::framework::{
    self, mock_engine, DenyDefaultsTests, PhysicsDirectSpaceState2D, PhysicsDirectSpaceState2DExtension, Restarted,
};

/// Space state that reports the same hit for every ray.
pub struct FixedHitSpaceState {
    base: Base<PhysicsDirectSpaceState2DExtension>,
    queries: Vec<(Vector2, Vector2)>,
}

impl FixedHitSpaceState {
    const HIT_POSITION: Vector2 = Vector2::new(1.0, 2.0);
    const HIT_NORMAL: Vector2 = Vector2::new(0.0, 1.0);

    fn intersect_ray(&mut self, from: Vector2, to: Vector2) -> Dictionary {
        self.queries.push((from, to));

        let mut hit = Dictionary::new();
        hit.insert(&"position".to_variant(), &Self::HIT_POSITION.to_variant());
        hit.insert(&"normal".to_variant(), &Self::HIT_NORMAL.to_variant());

        let collider_id = self.base.to_gd().ok().and_then(|gd| gd.instance_id());
        hit.insert(&"collider_id".to_variant(), &collider_id.map_or(0, InstanceId::to_i64).to_variant());
        hit
    }
}

impl GodotClass for FixedHitSpaceState {
    type Base = PhysicsDirectSpaceState2DExtension;
    const CLASS_NAME: &'static str = "FixedHitSpaceState";
}

unsafe impl Inherits<PhysicsDirectSpaceState2DExtension> for FixedHitSpaceState {}
unsafe impl Inherits<PhysicsDirectSpaceState2D> for FixedHitSpaceState {}
unsafe impl Inherits<Object> for FixedHitSpaceState {}

impl ExtensionClass for FixedHitSpaceState {
    fn init(base: Base<PhysicsDirectSpaceState2DExtension>) -> Self {
        Self {
            base,
            queries: Vec::new(),
        }
    }

    fn register_virtuals(virtuals: &mut VirtualTableBuilder<Self>) {
        virtuals.add("_intersect_ray", |this: &mut Self, (from, to): (Vector2, Vector2)| {
            this.intersect_ray(from, to)
        });
    }
}

/// Space state without overrides: every query goes to the engine's default.
pub struct EmptySpaceState;

impl GodotClass for EmptySpaceState {
    type Base = PhysicsDirectSpaceState2DExtension;
    const CLASS_NAME: &'static str = "EmptySpaceState";
}

unsafe impl Inherits<PhysicsDirectSpaceState2DExtension> for EmptySpaceState {}
unsafe impl Inherits<PhysicsDirectSpaceState2D> for EmptySpaceState {}
unsafe impl Inherits<Object> for EmptySpaceState {}

impl ExtensionClass for EmptySpaceState {
    fn init(_base: Base<PhysicsDirectSpaceState2DExtension>) -> Self {
        Self
    }
}

/// Subclass of a host class, without overrides of its own.
pub struct DerivedSpaceState {
    extra_queries: u32,
}

impl GodotClass for DerivedSpaceState {
    type Base = FixedHitSpaceState;
    const CLASS_NAME: &'static str = "DerivedSpaceState";
}

unsafe impl Inherits<FixedHitSpaceState> for DerivedSpaceState {}
unsafe impl Inherits<PhysicsDirectSpaceState2DExtension> for DerivedSpaceState {}
unsafe impl Inherits<PhysicsDirectSpaceState2D> for DerivedSpaceState {}
unsafe impl Inherits<Object> for DerivedSpaceState {}

impl ExtensionClass for DerivedSpaceState {
    fn init(_base: Base<FixedHitSpaceState>) -> Self {
        Self { extra_queries: 0 }
    }
}

fn cast_ray<T: Inherits<Object>>(space: &Gd<T>, from: Vector2, to: Vector2) -> Dictionary {
    space
        .ptrcall("intersect_ray", |frame| {
            frame.arg(from).arg(to);
        })
        .unwrap()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[test]
fn override_answers_engine_query() {
    let _engine = framework::setup();

    let mut space = Gd::<FixedHitSpaceState>::try_new().unwrap();
    let from = Vector2::new(-10.0, 0.0);
    let to = Vector2::new(10.0, 5.0);

    let hit = cast_ray(&space, from, to);

    assert_eq!(hit.get(&"position".to_variant()).unwrap().try_to::<Vector2>(), Ok(Vector2::new(1.0, 2.0)));
    assert_eq!(hit.get(&"normal".to_variant()).unwrap().try_to::<Vector2>(), Ok(Vector2::new(0.0, 1.0)));

    let collider = hit.get(&"collider_id".to_variant()).unwrap();
    assert_eq!(collider.try_to::<i64>(), Ok(space.instance_id().unwrap().to_i64()));

    let queries = space.with_instance(|this| this.queries.clone()).unwrap();
    assert_eq!(queries, [(from, to)]);

    space.free().unwrap();
}

#[test]
fn override_reached_through_base_class_wrapper() {
    let _engine = framework::setup();

    let mut space = Gd::<FixedHitSpaceState>::try_new().unwrap();
    let base: Gd<PhysicsDirectSpaceState2D> = space.clone().upcast();

    let hit = cast_ray(&base, Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0));
    assert_eq!(hit.len(), 3);
    assert_eq!(base.get_class().unwrap(), "FixedHitSpaceState");

    drop(base);
    space.free().unwrap();
}

#[test]
fn missing_override_uses_engine_default() {
    let _engine = framework::setup();
    assert_eq!(init::config().virtual_dispatch_fallback, VirtualFallback::Allow);

    let mut space = Gd::<EmptySpaceState>::try_new().unwrap();
    let hit = cast_ray(&space, Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));

    assert!(hit.is_empty());
    assert!(mock_engine::take_messages().is_empty());

    space.free().unwrap();
}

#[test]
fn missing_override_denied_returns_zero_and_warns() {
    let _engine = framework::setup();
    let _deny = Restarted::<DenyDefaultsTests>::new();
    mock_engine::take_messages();

    assert_eq!(init::config().virtual_dispatch_fallback, VirtualFallback::Deny);

    let mut space = Gd::<EmptySpaceState>::try_new().unwrap();
    let hit = cast_ray(&space, Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));

    assert!(hit.is_empty());
    framework::expect_warning("EmptySpaceState::_intersect_ray");

    space.free().unwrap();
}

#[test]
fn override_still_runs_when_defaults_denied() {
    let _engine = framework::setup();
    let _deny = Restarted::<DenyDefaultsTests>::new();
    mock_engine::take_messages();

    let mut space = Gd::<FixedHitSpaceState>::try_new().unwrap();
    let hit = cast_ray(&space, Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));

    assert_eq!(hit.get(&"normal".to_variant()).unwrap().try_to::<Vector2>(), Ok(Vector2::new(0.0, 1.0)));
    assert!(mock_engine::take_messages().is_empty());

    space.free().unwrap();
}

#[test]
fn subclass_inherits_parent_override() {
    let _engine = framework::setup();
    register_class::<DerivedSpaceState>().unwrap();

    let info = registry::get().unwrap().classes.extension_info("DerivedSpaceState").unwrap();
    assert_eq!(info.engine_base.as_str(), "PhysicsDirectSpaceState2DExtension");
    assert!(info.vtable.is_empty());

    let mut space = Gd::<DerivedSpaceState>::try_new().unwrap();
    assert_eq!(space.get_class().unwrap(), "DerivedSpaceState");

    let from = Vector2::new(3.0, 4.0);
    let to = Vector2::new(5.0, 6.0);
    let hit = cast_ray(&space, from, to);
    assert_eq!(hit.get(&"position".to_variant()).unwrap().try_to::<Vector2>(), Ok(Vector2::new(1.0, 2.0)));

    // The parent's override ran on the parent's share of the instance state.
    let parent: Gd<FixedHitSpaceState> = space.clone().upcast();
    let queries = parent.with_instance(|this| this.queries.clone()).unwrap();
    assert_eq!(queries, [(from, to)]);
    assert_eq!(space.with_instance(|this| this.extra_queries).unwrap(), 0);
    assert!(mock_engine::take_messages().is_empty());

    drop(parent);
    space.free().unwrap();
    unregister_class::<DerivedSpaceState>().unwrap();
}
