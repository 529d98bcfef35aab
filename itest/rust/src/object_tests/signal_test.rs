/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::Arc;

use gdbridge::prelude::*;
use parking_lot::Mutex;

use crate::framework::{self, mock_engine, AnimationNodeStateMachineTransition, Node};

const SIGNAL: &str = "advance_condition_changed";

/// Argument seen by a handler, decoded inside the handler since variants stay on the emitting thread.
#[derive(Clone, PartialEq, Debug)]
enum SeenArg {
    Int(i64),
    Text(String),
    Other(VariantType),
}

impl SeenArg {
    fn decode(arg: &Variant) -> Self {
        match arg.get_type() {
            VariantType::Int => arg.try_to::<i64>().map_or(Self::Other(VariantType::Int), Self::Int),
            VariantType::String => arg.try_to::<String>().map_or(Self::Other(VariantType::String), Self::Text),
            other => Self::Other(other),
        }
    }
}

/// Callable that records the arguments of every invocation.
fn recording_callable(name: &str) -> (Callable, Arc<Mutex<Vec<Vec<SeenArg>>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    let callable = Callable::from_fn(name, move |args| {
        recorded.lock().push(args.iter().map(|arg| SeenArg::decode(arg)).collect());
        Ok(Variant::nil())
    });

    (callable, calls)
}

#[test]
fn engine_emitted_signal_reaches_host_callable() {
    let _engine = framework::setup();

    let transition = Gd::<AnimationNodeStateMachineTransition>::try_new().unwrap();
    let (callable, calls) = recording_callable("on_advance_condition_changed");

    transition.connect(SIGNAL, &callable).unwrap();
    assert_eq!(mock_engine::connection_count(transition.raw_ptr(), SIGNAL), 1);

    let condition = StringName::from("can_jump");
    transition
        .ptrcall::<()>("set_advance_condition", |frame| {
            frame.arg(&condition);
        })
        .unwrap();

    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_empty());

    let stored: StringName = transition.ptrcall("get_advance_condition", |_| {}).unwrap();
    assert_eq!(stored, condition);
}

#[test]
fn host_emitted_signal_forwards_arguments() {
    let _engine = framework::setup();

    let mut node = Gd::<Node>::try_new().unwrap();
    let (callable, calls) = recording_callable("on_renamed");

    node.connect("renamed", &callable).unwrap();
    node.connect("renamed", &callable).unwrap();
    assert_eq!(mock_engine::connection_count(node.raw_ptr(), "renamed"), 2);

    node.emit_signal("renamed", &[7.to_variant(), "seven".to_variant()]).unwrap();

    {
        let calls = calls.lock();
        assert_eq!(calls.len(), 2);
        for args in calls.iter() {
            assert_eq!(args, &[SeenArg::Int(7), SeenArg::Text("seven".to_string())]);
        }
    }

    node.free().unwrap();
}

#[test]
fn failing_handler_is_reported_by_engine() {
    let _engine = framework::setup();

    let transition = Gd::<AnimationNodeStateMachineTransition>::try_new().unwrap();
    let failing = Callable::from_fn("rejects_everything", |_args| Err(()));
    transition.connect(SIGNAL, &failing).unwrap();

    transition.emit_signal(SIGNAL, &[]).unwrap();

    let errors: Vec<_> = mock_engine::take_messages()
        .into_iter()
        .filter(|m| m.level == mock_engine::LogLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert!(errors[0].text.contains(SIGNAL));
}

#[test]
fn callable_invoked_directly() {
    let _engine = framework::setup();

    let sum = Callable::from_fn("sum", |args| {
        let total: i64 = args.iter().filter_map(|arg| arg.try_to::<i64>().ok()).sum();
        Ok(total.to_variant())
    });

    let result = sum.call(&[1.to_variant(), 2.to_variant(), 39.to_variant()]);
    assert_eq!(result.try_to::<i64>(), Ok(42));

    let packed: VarArray = [5.to_variant(), 6.to_variant()].as_slice().into();
    assert_eq!(sum.callv(&packed).try_to::<i64>(), Ok(11));

    assert_eq!(sum.to_variant().stringify(), GString::from("sum"));
    assert_eq!(sum, sum.clone());
}

#[test]
fn failing_callable_returns_nil() {
    let _engine = framework::setup();

    let failing = Callable::from_fn("fails", |_args| Err(()));
    let result = failing.call(&[]);

    assert!(result.is_nil());
    assert_eq!(mock_engine::take_messages().len(), 1);
}

#[test]
fn signal_value_names_its_signal() {
    let _engine = framework::setup();

    let transition = Gd::<AnimationNodeStateMachineTransition>::try_new().unwrap();
    let signal = Signal::from_object_signal(&transition, SIGNAL);

    assert_eq!(signal.name(), StringName::from(SIGNAL));
    assert_eq!(signal, Signal::from_object_signal(&transition, SIGNAL));
    assert_ne!(signal, Signal::from_object_signal(&transition, "changed"));
}
