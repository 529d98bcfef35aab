/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::builtin::VariantType;
use gdbridge::meta::error::FromVariantError;
use gdbridge::prelude::*;

use crate::framework::{self, Node};

#[test]
fn dictionary_with_mixed_values() {
    let _engine = framework::setup();

    let mut node = Gd::<Node>::try_new().unwrap();
    let numbers: VarArray = [1, 2, 3].iter().map(ToGodot::to_variant).collect();

    let mut dict = Dictionary::<GString, Variant>::new();
    dict.insert(&"i".into(), &42.to_variant());
    dict.insert(&"s".into(), &"hello".to_variant());
    dict.insert(&"a".into(), &numbers.to_variant());
    dict.insert(&"o".into(), &node.to_variant());

    let value = |key: &str| dict.get(&GString::from(key)).expect("key present");

    let i = value("i");
    assert_eq!(i.get_type(), VariantType::Int);
    assert_eq!(i.try_to::<i64>(), Ok(42));

    let s = value("s");
    assert_eq!(s.get_type(), VariantType::String);
    assert_eq!(s.try_to::<String>(), Ok("hello".to_string()));

    let a = value("a");
    assert_eq!(a.get_type(), VariantType::Array);
    let a = a.try_to::<VarArray>().unwrap();
    let elements: Vec<i64> = a.iter().map(|v| v.try_to::<i64>().unwrap()).collect();
    assert_eq!(elements, [1, 2, 3]);

    let o = value("o");
    assert_eq!(o.get_type(), VariantType::Object);
    let o = o.try_to::<Gd<Node>>().unwrap();
    assert_eq!(o.raw_ptr(), node.raw_ptr());
    assert_eq!(o.instance_id(), node.instance_id());

    drop(o);
    node.free().unwrap();
}

#[test]
fn host_values_round_trip() {
    let _engine = framework::setup();

    let mut node = Gd::<Node>::try_new().unwrap();
    let list: VarArray = ["x".to_variant(), 1.5.to_variant()].as_slice().into();
    let ints = PackedInt32Array::from([4, -5, 6].as_slice());

    let values = [
        VariantValue::Bool(true),
        VariantValue::Int(-7),
        VariantValue::Float(2.5),
        VariantValue::String("text".into()),
        VariantValue::Vector2(Vector2::new(1.0, -2.0)),
        VariantValue::Vector3i(Vector3i::new(1, 2, 3)),
        VariantValue::Rect2(Rect2::new(Vector2::new(0.0, 1.0), Vector2::new(3.0, 4.0))),
        VariantValue::Color(Color::from_rgba(0.1, 0.2, 0.3, 1.0)),
        VariantValue::Quaternion(Quaternion::IDENTITY),
        VariantValue::Basis(Basis::IDENTITY),
        VariantValue::Transform2D(Transform2D::IDENTITY),
        VariantValue::StringName("name".into()),
        VariantValue::NodePath("Root/Child".into()),
        VariantValue::Rid(Rid::new(9)),
        VariantValue::Object(Some(node.clone().upcast())),
        VariantValue::Array(list),
        VariantValue::PackedInt32Array(ints),
    ];

    for value in values {
        let kind = value.variant_type();
        let variant = Variant::from_host(&value);

        assert_eq!(variant.get_type(), kind);
        assert_eq!(variant.to_host(kind).as_ref(), Ok(&value), "{kind:?}");
        assert_eq!(variant.value(), Ok(value));
    }

    node.free().unwrap();
}

#[test]
fn to_host_rejects_other_kind() {
    let _engine = framework::setup();

    let variant = 42.to_variant();
    let err = variant.to_host(VariantType::String).unwrap_err();

    assert_eq!(
        err.kind(),
        &FromVariantError::BadType {
            expected: VariantType::String,
            actual: VariantType::Int,
        }
    );
    assert_eq!(Variant::nil().to_host(VariantType::Nil), Ok(VariantValue::Nil));
}

#[test]
fn to_host_or_zero_reports_mismatch() {
    let _engine = framework::setup();

    assert_eq!(5.to_variant().to_host_or_zero::<i64>(), (5, true));
    assert_eq!("5".to_variant().to_host_or_zero::<i64>(), (0, false));
    assert_eq!(Variant::nil().to_host_or_zero::<GString>(), (GString::new(), false));
}

#[test]
fn narrowing_conversions_are_checked() {
    let _engine = framework::setup();

    let big = 300.to_variant();
    assert_eq!(big.try_to::<u16>(), Ok(300));
    assert_eq!(big.try_to::<u8>().unwrap_err().kind(), &FromVariantError::BadValue);
    assert_eq!((-1).to_variant().try_to::<u32>().unwrap_err().value(), Some("-1"));

    assert_eq!(3.to_variant().try_to::<f64>().map_err(|e| e.kind().clone()), Err(FromVariantError::BadType {
        expected: VariantType::Float,
        actual: VariantType::Int,
    }));
}

#[test]
fn freed_object_reads_as_null() {
    let _engine = framework::setup();

    let mut node = Gd::<Node>::try_new().unwrap();
    let variant = node.to_variant();
    node.free().unwrap();

    assert_eq!(variant.try_to::<Option<Gd<Node>>>(), Ok(None));
    assert_eq!(variant.try_to::<Gd<Node>>().unwrap_err().kind(), &FromVariantError::DeadObject);
    assert_eq!(variant.value(), Ok(VariantValue::Object(None)));
}

#[test]
fn object_of_wrong_class_is_rejected() {
    let _engine = framework::setup();

    let mut object = Gd::<Object>::try_new().unwrap();
    let variant = object.to_variant();

    let err = variant.try_to::<Gd<Node>>().unwrap_err();
    assert!(matches!(err.kind(), FromVariantError::WrongClass { .. }), "{err}");

    object.free().unwrap();
}

#[test]
fn engine_equality_hash_and_text() {
    let _engine = framework::setup();

    assert_eq!(42.to_variant(), 42.to_variant());
    assert_ne!(42.to_variant(), 43.to_variant());
    assert_eq!(42.to_variant().hash(), 42.to_variant().hash());
    assert_eq!("abc".to_variant().hash(), "abc".to_variant().hash());

    assert_eq!(42.to_variant().stringify(), "42");
    assert_eq!(Variant::nil().stringify(), "<null>");
    assert_eq!(true.to_variant().to_string(), "true");

    let list: VarArray = [1.to_variant(), "two".to_variant()].as_slice().into();
    assert_eq!(list.to_variant().stringify(), "[1, \"two\"]");
}
