/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::prelude::*;
use gdbridge::sys;

use crate::framework::{self, mock_engine, ArityProbe, AudioEffectPhaser, Node};

#[test]
fn phaser_setter_then_getter() {
    let _engine = framework::setup();
    let phaser = Gd::<AudioEffectPhaser>::try_new().unwrap();

    let initial: f64 = phaser.ptrcall("get_range_min_hz", |_| {}).unwrap();
    assert_eq!(initial, mock_engine::PHASER_DEFAULT_RANGE_MIN_HZ);

    phaser
        .ptrcall::<()>("set_range_min_hz", |frame| {
            frame.arg(40.0);
        })
        .unwrap();

    let range_min_hz: f64 = phaser.ptrcall("get_range_min_hz", |_| {}).unwrap();
    assert_eq!(range_min_hz, 40.0);
    assert_eq!(phaser.reference_count().unwrap(), 1);
}

#[test]
fn phaser_varcall_converts_int_to_float() {
    let _engine = framework::setup();
    let phaser = Gd::<AudioEffectPhaser>::try_new().unwrap();

    let ret = phaser.call("set_range_min_hz", &[120.to_variant()]).unwrap();
    assert!(ret.is_nil());

    let range_min_hz = phaser.call("get_range_min_hz", &[]).unwrap();
    assert_eq!(range_min_hz.try_to::<f64>(), Ok(120.0));
}

#[test]
fn object_methods_through_ancestors() {
    let _engine = framework::setup();
    let phaser = Gd::<AudioEffectPhaser>::try_new().unwrap();

    assert_eq!(phaser.get_class().unwrap(), GString::from("AudioEffectPhaser"));
    assert!(phaser.is_class("Resource"));
    assert!(!phaser.is_class("Node"));
    assert_eq!(phaser.dynamic_class().as_str(), "AudioEffectPhaser");
}

#[test]
fn ptrcall_without_args() {
    let _engine = framework::setup();
    let mut probe = Gd::<ArityProbe>::try_new().unwrap();

    let value: i64 = probe.ptrcall("none", |_| {}).unwrap();
    assert_eq!(value, 7);

    probe.free().unwrap();
}

#[test]
fn ptrcall_median_arity() {
    let _engine = framework::setup();
    let mut probe = Gd::<ArityProbe>::try_new().unwrap();

    let sum: i64 = probe
        .ptrcall("sum3", |frame| {
            frame.arg(1).arg(20u8).arg(300i64);
        })
        .unwrap();
    assert_eq!(sum, 321);

    probe.free().unwrap();
}

#[test]
fn ptrcall_many_args() {
    let _engine = framework::setup();
    let mut probe = Gd::<ArityProbe>::try_new().unwrap();

    let sum: i64 = probe
        .ptrcall("sum_many", |frame| {
            for i in 1..=40i64 {
                frame.arg(i);
            }
        })
        .unwrap();
    assert_eq!(sum, (1..=40).sum::<i64>());

    probe.free().unwrap();
}

#[test]
fn varcall_many_args() {
    let _engine = framework::setup();
    let mut probe = Gd::<ArityProbe>::try_new().unwrap();

    let args: Vec<Variant> = (1..=40i64).map(|i| i.to_variant()).collect();
    let sum = probe.call("sum_many", &args).unwrap();
    assert_eq!(sum.try_to::<i64>(), Ok(820));

    probe.free().unwrap();
}

#[test]
fn varcall_wrong_arity() {
    let _engine = framework::setup();
    let mut probe = Gd::<ArityProbe>::try_new().unwrap();

    let err = probe.call("sum3", &[1.to_variant(), 2.to_variant()]).unwrap_err();
    assert_eq!(err.code(), sys::GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS);
    assert_eq!(err.reason(), "too few arguments; expected 3, but called with 2");

    let err = probe.call("none", &[1.to_variant()]).unwrap_err();
    assert_eq!(err.code(), sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS);
    assert_eq!(err.class_name(), "ArityProbe");
    assert_eq!(err.method_name(), "none");

    probe.free().unwrap();
}

#[test]
fn varcall_wrong_type() {
    let _engine = framework::setup();
    let mut probe = Gd::<ArityProbe>::try_new().unwrap();

    let args = [1.to_variant(), "two".to_variant(), 3.to_variant()];
    let err = probe.call("sum3", &args).unwrap_err();
    assert_eq!(err.code(), sys::GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT);
    assert_eq!(err.reason(), "cannot convert argument #2 from String to Int");

    probe.free().unwrap();
}

#[test]
fn call_unknown_method() {
    let _engine = framework::setup();
    let mut node = Gd::<Node>::try_new().unwrap();

    let err = node.call("fly_to_moon", &[]).unwrap_err();
    assert_eq!(err.code(), sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD);

    let err = node.ptrcall::<i64>("fly_to_moon", |_| {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);

    node.free().unwrap();
}

#[test]
fn call_on_freed_object() {
    let _engine = framework::setup();
    let mut node = Gd::<Node>::try_new().unwrap();
    let alias = node.clone();

    node.free().unwrap();

    let err = alias.call("get_child_count", &[]).unwrap_err();
    assert_eq!(err.code(), sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL);
}
