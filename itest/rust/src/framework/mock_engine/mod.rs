/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! In-process engine that implements the extension interface, so the bridge can be tested without a running editor.
//!
//! Objects are leaked on purpose: destroyed objects stay addressable as tombstones, which lets tests observe use-after-free
//! attempts through the bridge's instance-ID checks instead of crashing.

mod callables;
mod classdb;
mod containers;
mod logging;
mod objects;
mod strings;
mod values;
mod variants;

use gdbridge::sys;

pub use classdb::{ReportedProperty, PHASER_DEFAULT_RANGE_MIN_HZ};
pub use logging::{take_messages, LogLevel, LoggedMessage};
pub use objects::{was_destroyed, NOTIFICATION_POSTINITIALIZE};
pub use values::Value;

/// Interface table with every entry filled in.
pub fn interface() -> sys::EngineInterface {
    sys::EngineInterface {
        get_godot_version: Some(logging::get_godot_version),

        print_error: Some(logging::print_error),
        print_warning: Some(logging::print_warning),
        print_script_error: Some(logging::print_script_error),

        variant_new_copy: Some(variants::variant_new_copy),
        variant_new_nil: Some(variants::variant_new_nil),
        variant_destroy: Some(variants::variant_destroy),
        variant_get_type: Some(variants::variant_get_type),
        variant_stringify: Some(variants::variant_stringify),
        variant_hash: Some(variants::variant_hash),
        variant_equal: Some(variants::variant_equal),
        get_variant_from_type_constructor: Some(variants::get_variant_from_type_constructor),
        get_variant_to_type_constructor: Some(variants::get_variant_to_type_constructor),
        variant_get_ptr_constructor: Some(variants::variant_get_ptr_constructor),
        variant_get_ptr_destructor: Some(variants::variant_get_ptr_destructor),
        variant_get_ptr_builtin_method: Some(containers::variant_get_ptr_builtin_method),

        string_new_with_utf8_chars_and_len: Some(strings::string_new_with_utf8_chars_and_len),
        string_new_with_utf16_chars_and_len: Some(strings::string_new_with_utf16_chars_and_len),
        string_new_with_utf32_chars_and_len: Some(strings::string_new_with_utf32_chars_and_len),
        string_to_utf8_chars: Some(strings::string_to_utf8_chars),
        string_to_utf16_chars: Some(strings::string_to_utf16_chars),
        string_to_utf32_chars: Some(strings::string_to_utf32_chars),
        string_name_new_with_utf8_chars_and_len: Some(strings::string_name_new_with_utf8_chars_and_len),

        array_operator_index: Some(containers::array_operator_index),
        array_operator_index_const: Some(containers::array_operator_index_const),
        dictionary_operator_index: Some(containers::dictionary_operator_index),
        dictionary_operator_index_const: Some(containers::dictionary_operator_index_const),

        packed_byte_array_operator_index: Some(containers::packed_byte_array_operator_index),
        packed_int32_array_operator_index: Some(containers::packed_int32_array_operator_index),
        packed_int64_array_operator_index: Some(containers::packed_int64_array_operator_index),
        packed_float32_array_operator_index: Some(containers::packed_float32_array_operator_index),
        packed_float64_array_operator_index: Some(containers::packed_float64_array_operator_index),
        packed_string_array_operator_index: Some(containers::packed_string_array_operator_index),
        packed_vector2_array_operator_index: Some(containers::packed_vector2_array_operator_index),
        packed_vector3_array_operator_index: Some(containers::packed_vector3_array_operator_index),
        packed_color_array_operator_index: Some(containers::packed_color_array_operator_index),
        packed_vector4_array_operator_index: Some(containers::packed_vector4_array_operator_index),

        classdb_construct_object: Some(objects::classdb_construct_object),
        classdb_get_class_tag: Some(classdb::classdb_get_class_tag),
        classdb_get_method_bind: Some(classdb::classdb_get_method_bind),
        object_method_bind_ptrcall: Some(objects::object_method_bind_ptrcall),
        object_method_bind_call: Some(objects::object_method_bind_call),
        object_cast_to: Some(objects::object_cast_to),
        object_destroy: Some(objects::object_destroy),
        object_get_instance_id: Some(objects::object_get_instance_id),
        object_get_instance_from_id: Some(objects::object_get_instance_from_id),
        object_get_class_name: Some(objects::object_get_class_name),
        object_set_instance: Some(objects::object_set_instance),
        ref_get_object: Some(objects::ref_get_object),
        ref_set_object: Some(objects::ref_set_object),

        classdb_register_extension_class: Some(classdb::classdb_register_extension_class),
        classdb_unregister_extension_class: Some(classdb::classdb_unregister_extension_class),

        callable_custom_create: Some(callables::callable_custom_create),
    }
}

static LIBRARY_TOKEN: u8 = 0;

/// Opaque library handle passed to the extension's entry point.
pub fn library() -> sys::GDExtensionClassLibraryPtr {
    &LIBRARY_TOKEN as *const u8 as sys::GDExtensionClassLibraryPtr
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Engine-side operations for tests

/// Frees the object as the engine would, bypassing the bridge.
pub fn free_from_engine(object: sys::GDExtensionObjectPtr) {
    classdb::free_from_engine(object);
}

pub fn is_alive(instance_id: u64) -> bool {
    objects::lookup(instance_id).is_some_and(|o| o.is_alive())
}

/// Properties the engine sees when it lists the object's properties (e.g. for the inspector).
pub fn property_list(object: sys::GDExtensionObjectPtr) -> Vec<ReportedProperty> {
    // SAFETY: callers pass pointers they got from this engine.
    unsafe { objects::from_ptr(object) }.map_or_else(Vec::new, classdb::extension_property_list)
}

/// Revert value the engine would offer for `property`, if any.
pub fn property_revert(object: sys::GDExtensionObjectPtr, property: &str) -> Option<Value> {
    // SAFETY: see `property_list()`.
    let object = unsafe { objects::from_ptr(object) }?;
    classdb::extension_property_revert(object, property)
}

/// Property read as a script would do it: engine storage first, then the extension.
pub fn engine_get(object: sys::GDExtensionObjectPtr, property: &str) -> Option<Value> {
    // SAFETY: see `property_list()`.
    let object = unsafe { objects::from_ptr(object) }?;
    object.property(property).or_else(|| classdb::extension_get(object, property))
}

/// Engine notification, delivered to the extension instance if there is one.
pub fn engine_notify(object: sys::GDExtensionObjectPtr, what: i32) {
    // SAFETY: see `property_list()`.
    if let Some(object) = unsafe { objects::from_ptr(object) } {
        classdb::extension_notify(object, what, false);
    }
}

pub fn engine_to_string(object: sys::GDExtensionObjectPtr) -> Option<String> {
    // SAFETY: see `property_list()`.
    let object = unsafe { objects::from_ptr(object) }?;
    classdb::extension_to_string(object)
}

/// Values stored by the engine for `signal` connections, in connection order.
pub fn connection_count(object: sys::GDExtensionObjectPtr, signal: &str) -> usize {
    // SAFETY: see `property_list()`.
    unsafe { objects::from_ptr(object) }.map_or(0, |o| o.connections(signal).len())
}
