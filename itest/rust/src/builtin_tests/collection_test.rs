/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::prelude::*;

use crate::framework::{self, Node};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Array

#[test]
fn array_push_get_set() {
    let _engine = framework::setup();

    let mut array = Array::<i64>::new();
    assert!(array.is_empty());

    array.push(&10);
    array.push(&20);
    array.push(&30);
    assert_eq!(array.len(), 3);
    assert_eq!(array.get(1), Some(20));
    assert_eq!(array.get(3), None);

    array.set(1, &25).unwrap();
    assert_eq!(array.to_vec(), [10, 25, 30]);

    let err = array.set(3, &40).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);
}

#[test]
fn array_remove_shifts_elements() {
    let _engine = framework::setup();

    let mut array: Array<GString> = ["a", "b", "c"].iter().map(|&s| GString::from(s)).collect();

    assert_eq!(array.remove(0), Some(GString::from("a")));
    assert_eq!(array.remove(5), None);
    assert_eq!(array.to_vec(), [GString::from("b"), GString::from("c")]);
}

#[test]
fn array_resize_fills_nil() {
    let _engine = framework::setup();

    let mut array = Array::<i64>::from([1, 2].as_slice());
    array.resize(4).unwrap();

    assert_eq!(array.len(), 4);
    assert_eq!(array.get(3), None);
    assert!(array.try_get(3).is_err());

    let untyped = VarArray::from([array.to_variant()].as_slice());
    let inner = untyped.get(0).unwrap().try_to::<VarArray>().unwrap();
    assert!(inner.get(2).unwrap().is_nil());

    array.resize(1).unwrap();
    assert_eq!(array.to_vec(), [1]);

    let err = array.resize(1 << 30).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);
    assert_eq!(array.to_vec(), [1]);

    array.clear();
    assert!(array.is_empty());
}

#[test]
fn array_clones_share_storage() {
    let _engine = framework::setup();

    let mut array = VarArray::new();
    let alias = array.clone();

    array.push(&"shared".to_variant());
    assert_eq!(alias.len(), 1);
    assert_eq!(alias, array);
}

#[test]
fn array_of_objects() {
    let _engine = framework::setup();

    let nodes: Array<Gd<Node>> = (0..3).map(|_| Gd::<Node>::try_new().unwrap()).collect();
    let ids: Vec<_> = nodes.iter().map(|n| n.instance_id()).collect();

    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(Option::is_some));

    for mut node in nodes.iter() {
        node.free().unwrap();
    }
    assert_eq!(nodes.get(0), None);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Dictionary

#[test]
fn dictionary_insert_get_remove() {
    let _engine = framework::setup();

    let mut dict = Dictionary::<StringName, i64>::new();
    assert!(dict.is_empty());

    assert_eq!(dict.insert(&"hp".into(), &100), None);
    assert_eq!(dict.insert(&"mp".into(), &30), None);
    assert_eq!(dict.insert(&"hp".into(), &90), Some(100));

    assert_eq!(dict.len(), 2);
    assert_eq!(dict.get(&"hp".into()), Some(90));
    assert!(dict.contains_key(&"mp".into()));
    assert!(!dict.contains_key(&"xp".into()));

    assert_eq!(dict.remove(&"mp".into()), Some(30));
    assert_eq!(dict.remove(&"mp".into()), None);
    assert_eq!(dict.len(), 1);

    dict.clear();
    assert!(dict.is_empty());
}

#[test]
fn dictionary_keeps_insertion_order() {
    let _engine = framework::setup();

    let dict: Dictionary<i64, GString> = [(3, "three"), (1, "one"), (2, "two")]
        .into_iter()
        .map(|(k, v)| (k, GString::from(v)))
        .collect();

    assert_eq!(dict.keys().to_vec(), [3, 1, 2]);

    let entries: Vec<(i64, String)> = dict.iter().map(|(k, v)| (k, v.to_string())).collect();
    assert_eq!(entries, [(3, "three".to_string()), (1, "one".to_string()), (2, "two".to_string())]);
}

#[test]
fn dictionary_skips_unconvertible_values() {
    let _engine = framework::setup();

    let mut untyped = Dictionary::new();
    untyped.insert(&"n".to_variant(), &5.to_variant());
    untyped.insert(&"s".to_variant(), &"five".to_variant());

    let typed = untyped.to_variant().try_to::<Dictionary<GString, i64>>().unwrap();
    assert_eq!(typed.len(), 2);
    assert_eq!(typed.get(&"s".into()), None);

    let entries: Vec<_> = typed.iter().collect();
    assert_eq!(entries, [(GString::from("n"), 5)]);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Packed arrays

#[test]
fn packed_array_operations() {
    let _engine = framework::setup();

    let mut bytes = PackedByteArray::new();
    bytes.push(&1);
    bytes.push(&255);
    assert_eq!(bytes.len(), 2);
    assert_eq!(bytes.get(1), Some(255));

    bytes.set(0, 7).unwrap();
    assert!(bytes.set(9, 7).is_err());
    assert_eq!(bytes.to_vec(), [7, 255]);

    bytes.resize(4).unwrap();
    assert_eq!(bytes.to_vec(), [7, 255, 0, 0]);
    assert!(bytes.resize(1 << 30).is_err());
    assert_eq!(bytes.len(), 4);

    bytes.clear();
    assert!(bytes.is_empty());
}

#[test]
fn packed_arrays_of_structs() {
    let _engine = framework::setup();

    let points = [Vector2::new(1.0, 2.0), Vector2::new(-3.5, 0.25)];
    let packed = PackedVector2Array::from(points.as_slice());
    assert_eq!(packed.to_vec(), points);

    let colors: PackedColorArray = [Color::from_rgba(1.0, 0.0, 0.0, 1.0)].into_iter().collect();
    assert_eq!(colors.get(0), Some(Color::from_rgba(1.0, 0.0, 0.0, 1.0)));

    let names = PackedStringArray::from([GString::from("x"), GString::from("y")].as_slice());
    let joined: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    assert_eq!(joined, ["x", "y"]);

    let floats = PackedFloat64Array::from([0.5, 1.5].as_slice());
    let variant = floats.to_variant();
    assert_eq!(variant.try_to::<PackedFloat64Array>(), Ok(floats));
}
