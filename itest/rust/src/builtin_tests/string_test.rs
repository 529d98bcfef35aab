/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::builtin::StringView;
use gdbridge::prelude::*;
use proptest::prelude::*;

use crate::framework;

#[test]
fn gstring_basics() {
    let _engine = framework::setup();

    let empty = GString::new();
    assert!(empty.is_empty());
    assert_eq!(empty, GString::default());

    let text = GString::from("Grüße, 世界");
    assert_eq!(text.len(), 9);
    assert_eq!(text.to_string(), "Grüße, 世界");
    assert_eq!(format!("{text:?}"), "GString(\"Grüße, 世界\")");
}

#[test]
fn gstring_from_code_units() {
    let _engine = framework::setup();

    let crab: Vec<u16> = "🦀 rust".encode_utf16().collect();
    let from_utf16 = GString::from_utf16(&crab);
    assert_eq!(from_utf16, "🦀 rust");
    assert_eq!(from_utf16.len(), 6);
    assert_eq!(from_utf16.to_utf16(), crab);

    let chars = ['a', 'ß', '🦀'];
    let from_chars = GString::from_chars(&chars);
    assert_eq!(from_chars.chars(), chars);
    assert_eq!(from_chars.to_utf8(), "aß🦀");
}

#[test]
fn preferred_view_follows_config() {
    let _engine = framework::setup();

    let text = GString::from("view");
    assert_eq!(text.preferred_view(), StringView::Utf8("view".to_string()));
}

#[test]
fn string_name_and_node_path_conversions() {
    let _engine = framework::setup();

    let name = StringName::from("_ready");
    let text = GString::from(&name);
    assert_eq!(text, "_ready");
    assert_eq!(StringName::from(&text), name);
    assert_eq!(name.to_string(), "_ready");

    let path = NodePath::from("Root/Player:position");
    assert_eq!(GString::from(&path), "Root/Player:position");
    assert_eq!(NodePath::from(&GString::from("Root/Player:position")), path);
    assert_ne!(path, NodePath::default());
}

#[test]
fn string_kinds_convert_through_variant() {
    let _engine = framework::setup();

    let variant = StringName::from("signal_name").to_variant();
    assert_eq!(variant.get_type(), VariantType::StringName);
    assert_eq!(variant.try_to::<StringName>(), Ok(StringName::from("signal_name")));
    assert!(variant.try_to::<GString>().is_err());

    let host: String = "plain".to_variant().try_to().unwrap();
    assert_eq!(host, "plain");
}

proptest! {
    #[test]
    fn utf8_round_trip(text in any::<String>()) {
        let _engine = framework::setup();

        let gstring = GString::from(text.as_str());
        prop_assert_eq!(gstring.to_utf8(), text.clone());
        prop_assert_eq!(gstring.len(), text.chars().count());
    }

    #[test]
    fn utf16_round_trip(text in any::<String>()) {
        let _engine = framework::setup();

        let units: Vec<u16> = text.encode_utf16().collect();
        let gstring = GString::from_utf16(&units);
        prop_assert_eq!(gstring.to_utf16(), units);
        prop_assert_eq!(gstring.to_utf8(), text);
    }
}
