/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! C declarations of the engine's extension interface.
//!
//! Mirrors the shape of a bindgen-generated `gdextension_interface.h`: raw pointer typedefs, plain `#[repr(C)]` structs,
//! and one function table whose fields are `Option<unsafe extern "C" fn ...>`. Only the subset used by the bridge is declared.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_void};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scalars

pub type GDExtensionBool = u8;
pub type GDExtensionInt = i64;
pub type GDObjectInstanceID = u64;
pub type GDExtensionVariantType = u32;
pub type GDExtensionInitializationLevel = u32;
pub type GDExtensionCallErrorType = u32;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Opaque pointers

pub type GDExtensionVariantPtr = *mut c_void;
pub type GDExtensionConstVariantPtr = *const c_void;
pub type GDExtensionUninitializedVariantPtr = *mut c_void;
pub type GDExtensionStringNamePtr = *mut c_void;
pub type GDExtensionConstStringNamePtr = *const c_void;
pub type GDExtensionUninitializedStringNamePtr = *mut c_void;
pub type GDExtensionStringPtr = *mut c_void;
pub type GDExtensionConstStringPtr = *const c_void;
pub type GDExtensionUninitializedStringPtr = *mut c_void;
pub type GDExtensionObjectPtr = *mut c_void;
pub type GDExtensionConstObjectPtr = *const c_void;
pub type GDExtensionTypePtr = *mut c_void;
pub type GDExtensionConstTypePtr = *const c_void;
pub type GDExtensionUninitializedTypePtr = *mut c_void;
pub type GDExtensionMethodBindPtr = *const c_void;
pub type GDExtensionRefPtr = *mut c_void;
pub type GDExtensionConstRefPtr = *const c_void;
pub type GDExtensionClassInstancePtr = *mut c_void;
pub type GDExtensionClassLibraryPtr = *mut c_void;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Enumerators

pub const GDEXTENSION_INITIALIZATION_CORE: GDExtensionInitializationLevel = 0;
pub const GDEXTENSION_INITIALIZATION_SERVERS: GDExtensionInitializationLevel = 1;
pub const GDEXTENSION_INITIALIZATION_SCENE: GDExtensionInitializationLevel = 2;
pub const GDEXTENSION_INITIALIZATION_EDITOR: GDExtensionInitializationLevel = 3;

pub const GDEXTENSION_CALL_OK: GDExtensionCallErrorType = 0;
pub const GDEXTENSION_CALL_ERROR_INVALID_METHOD: GDExtensionCallErrorType = 1;
pub const GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT: GDExtensionCallErrorType = 2;
pub const GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS: GDExtensionCallErrorType = 3;
pub const GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS: GDExtensionCallErrorType = 4;
pub const GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL: GDExtensionCallErrorType = 5;
pub const GDEXTENSION_CALL_ERROR_METHOD_NOT_CONST: GDExtensionCallErrorType = 6;

/// Not an engine code: set by host callables that fail in host code.
pub const GDBRIDGE_CUSTOM_CALL_ERROR: GDExtensionCallErrorType = 40;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Structs

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct GDExtensionCallError {
    pub error: GDExtensionCallErrorType,
    pub argument: i32,
    pub expected: i32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionGodotVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub string: *const c_char,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionPropertyInfo {
    pub type_: GDExtensionVariantType,
    pub name: GDExtensionStringNamePtr,
    pub class_name: GDExtensionStringNamePtr,
    pub hint: u32,
    pub hint_string: GDExtensionStringPtr,
    pub usage: u32,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct GDExtensionClassCreationInfo {
    pub is_virtual: GDExtensionBool,
    pub is_abstract: GDExtensionBool,
    pub is_exposed: GDExtensionBool,
    pub set_func: GDExtensionClassSet,
    pub get_func: GDExtensionClassGet,
    pub get_property_list_func: GDExtensionClassGetPropertyList,
    pub free_property_list_func: GDExtensionClassFreePropertyList,
    pub property_can_revert_func: GDExtensionClassPropertyCanRevert,
    pub property_get_revert_func: GDExtensionClassPropertyGetRevert,
    pub notification_func: GDExtensionClassNotification,
    pub to_string_func: GDExtensionClassToString,
    pub reference_func: GDExtensionClassReference,
    pub unreference_func: GDExtensionClassUnreference,
    pub create_instance_func: GDExtensionClassCreateInstance,
    pub free_instance_func: GDExtensionClassFreeInstance,
    pub get_virtual_call_data_func: GDExtensionClassGetVirtualCallData,
    pub call_virtual_with_data_func: GDExtensionClassCallVirtualWithData,
    pub class_userdata: *mut c_void,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct GDExtensionCallableCustomInfo {
    pub callable_userdata: *mut c_void,
    pub token: *mut c_void,
    pub object_id: GDObjectInstanceID,
    pub call_func: GDExtensionCallableCustomCall,
    pub is_valid_func: GDExtensionCallableCustomIsValid,
    pub free_func: GDExtensionCallableCustomFree,
    pub hash_func: GDExtensionCallableCustomHash,
    pub equal_func: GDExtensionCallableCustomEqual,
    pub to_string_func: GDExtensionCallableCustomToString,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Callback types (engine -> extension)

pub type GDExtensionClassCreateInstance =
    Option<unsafe extern "C" fn(p_class_userdata: *mut c_void) -> GDExtensionObjectPtr>;
pub type GDExtensionClassFreeInstance = Option<
    unsafe extern "C" fn(p_class_userdata: *mut c_void, p_instance: GDExtensionClassInstancePtr),
>;
pub type GDExtensionClassNotification = Option<
    unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr, p_what: i32, p_reversed: GDExtensionBool),
>;
pub type GDExtensionClassSet = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: GDExtensionConstStringNamePtr,
        p_value: GDExtensionConstVariantPtr,
    ) -> GDExtensionBool,
>;
pub type GDExtensionClassGet = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: GDExtensionConstStringNamePtr,
        r_ret: GDExtensionVariantPtr,
    ) -> GDExtensionBool,
>;
pub type GDExtensionClassGetPropertyList = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        r_count: *mut u32,
    ) -> *const GDExtensionPropertyInfo,
>;
pub type GDExtensionClassFreePropertyList = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_list: *const GDExtensionPropertyInfo,
        p_count: u32,
    ),
>;
pub type GDExtensionClassPropertyCanRevert = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: GDExtensionConstStringNamePtr,
    ) -> GDExtensionBool,
>;
pub type GDExtensionClassPropertyGetRevert = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: GDExtensionConstStringNamePtr,
        r_ret: GDExtensionVariantPtr,
    ) -> GDExtensionBool,
>;
pub type GDExtensionClassToString = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        r_is_valid: *mut GDExtensionBool,
        p_out: GDExtensionStringPtr,
    ),
>;
pub type GDExtensionClassReference =
    Option<unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr)>;
pub type GDExtensionClassUnreference =
    Option<unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr)>;
pub type GDExtensionClassGetVirtualCallData = Option<
    unsafe extern "C" fn(
        p_class_userdata: *mut c_void,
        p_name: GDExtensionConstStringNamePtr,
    ) -> *mut c_void,
>;
pub type GDExtensionClassCallVirtualWithData = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: GDExtensionConstStringNamePtr,
        p_virtual_call_userdata: *mut c_void,
        p_args: *const GDExtensionConstTypePtr,
        r_ret: GDExtensionTypePtr,
    ),
>;

pub type GDExtensionCallableCustomCall = Option<
    unsafe extern "C" fn(
        callable_userdata: *mut c_void,
        p_args: *const GDExtensionConstVariantPtr,
        p_argument_count: GDExtensionInt,
        r_return: GDExtensionVariantPtr,
        r_error: *mut GDExtensionCallError,
    ),
>;
pub type GDExtensionCallableCustomIsValid =
    Option<unsafe extern "C" fn(callable_userdata: *mut c_void) -> GDExtensionBool>;
pub type GDExtensionCallableCustomFree =
    Option<unsafe extern "C" fn(callable_userdata: *mut c_void)>;
pub type GDExtensionCallableCustomHash =
    Option<unsafe extern "C" fn(callable_userdata: *mut c_void) -> u32>;
pub type GDExtensionCallableCustomEqual = Option<
    unsafe extern "C" fn(callable_userdata_a: *mut c_void, callable_userdata_b: *mut c_void) -> GDExtensionBool,
>;
pub type GDExtensionCallableCustomToString = Option<
    unsafe extern "C" fn(
        callable_userdata: *mut c_void,
        r_is_valid: *mut GDExtensionBool,
        r_out: GDExtensionStringPtr,
    ),
>;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Builtin lifecycle function types (returned by the engine)

pub type GDExtensionVariantFromTypeConstructorFunc =
    Option<unsafe extern "C" fn(GDExtensionUninitializedVariantPtr, GDExtensionTypePtr)>;
pub type GDExtensionTypeFromVariantConstructorFunc =
    Option<unsafe extern "C" fn(GDExtensionUninitializedTypePtr, GDExtensionVariantPtr)>;
pub type GDExtensionPtrConstructor =
    Option<unsafe extern "C" fn(p_base: GDExtensionUninitializedTypePtr, p_args: *const GDExtensionConstTypePtr)>;
pub type GDExtensionPtrDestructor = Option<unsafe extern "C" fn(p_base: GDExtensionTypePtr)>;
pub type GDExtensionPtrBuiltInMethod = Option<
    unsafe extern "C" fn(
        p_base: GDExtensionTypePtr,
        p_args: *const GDExtensionConstTypePtr,
        r_return: GDExtensionTypePtr,
        p_argument_count: c_int,
    ),
>;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface table (extension -> engine)

/// Function table the engine hands to the extension at load time.
///
/// Every entry is optional on the C side; the bridge treats a missing entry as a fatal setup error on first use.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct EngineInterface {
    pub get_godot_version: Option<unsafe extern "C" fn(r_version: *mut GDExtensionGodotVersion)>,

    // Logging.
    pub print_error: Option<
        unsafe extern "C" fn(
            p_description: *const c_char,
            p_function: *const c_char,
            p_file: *const c_char,
            p_line: i32,
            p_editor_notify: GDExtensionBool,
        ),
    >,
    pub print_warning: Option<
        unsafe extern "C" fn(
            p_description: *const c_char,
            p_function: *const c_char,
            p_file: *const c_char,
            p_line: i32,
            p_editor_notify: GDExtensionBool,
        ),
    >,
    pub print_script_error: Option<
        unsafe extern "C" fn(
            p_description: *const c_char,
            p_function: *const c_char,
            p_file: *const c_char,
            p_line: i32,
            p_editor_notify: GDExtensionBool,
        ),
    >,

    // Variant.
    pub variant_new_copy:
        Option<unsafe extern "C" fn(r_dest: GDExtensionUninitializedVariantPtr, p_src: GDExtensionConstVariantPtr)>,
    pub variant_new_nil: Option<unsafe extern "C" fn(r_dest: GDExtensionUninitializedVariantPtr)>,
    pub variant_destroy: Option<unsafe extern "C" fn(p_self: GDExtensionVariantPtr)>,
    pub variant_get_type:
        Option<unsafe extern "C" fn(p_self: GDExtensionConstVariantPtr) -> GDExtensionVariantType>,
    pub variant_stringify:
        Option<unsafe extern "C" fn(p_self: GDExtensionConstVariantPtr, r_ret: GDExtensionStringPtr)>,
    pub variant_hash: Option<unsafe extern "C" fn(p_self: GDExtensionConstVariantPtr) -> GDExtensionInt>,
    pub variant_equal: Option<
        unsafe extern "C" fn(p_a: GDExtensionConstVariantPtr, p_b: GDExtensionConstVariantPtr) -> GDExtensionBool,
    >,
    pub get_variant_from_type_constructor: Option<
        unsafe extern "C" fn(p_type: GDExtensionVariantType) -> GDExtensionVariantFromTypeConstructorFunc,
    >,
    pub get_variant_to_type_constructor: Option<
        unsafe extern "C" fn(p_type: GDExtensionVariantType) -> GDExtensionTypeFromVariantConstructorFunc,
    >,
    pub variant_get_ptr_constructor: Option<
        unsafe extern "C" fn(p_type: GDExtensionVariantType, p_constructor: i32) -> GDExtensionPtrConstructor,
    >,
    pub variant_get_ptr_destructor:
        Option<unsafe extern "C" fn(p_type: GDExtensionVariantType) -> GDExtensionPtrDestructor>,
    pub variant_get_ptr_builtin_method: Option<
        unsafe extern "C" fn(
            p_type: GDExtensionVariantType,
            p_method: GDExtensionConstStringNamePtr,
            p_hash: GDExtensionInt,
        ) -> GDExtensionPtrBuiltInMethod,
    >,

    // String, StringName.
    pub string_new_with_utf8_chars_and_len: Option<
        unsafe extern "C" fn(r_dest: GDExtensionUninitializedStringPtr, p_contents: *const c_char, p_size: GDExtensionInt),
    >,
    pub string_new_with_utf16_chars_and_len: Option<
        unsafe extern "C" fn(r_dest: GDExtensionUninitializedStringPtr, p_contents: *const u16, p_char_count: GDExtensionInt),
    >,
    pub string_new_with_utf32_chars_and_len: Option<
        unsafe extern "C" fn(r_dest: GDExtensionUninitializedStringPtr, p_contents: *const u32, p_char_count: GDExtensionInt),
    >,
    pub string_to_utf8_chars: Option<
        unsafe extern "C" fn(
            p_self: GDExtensionConstStringPtr,
            r_text: *mut c_char,
            p_max_write_length: GDExtensionInt,
        ) -> GDExtensionInt,
    >,
    pub string_to_utf16_chars: Option<
        unsafe extern "C" fn(
            p_self: GDExtensionConstStringPtr,
            r_text: *mut u16,
            p_max_write_length: GDExtensionInt,
        ) -> GDExtensionInt,
    >,
    pub string_to_utf32_chars: Option<
        unsafe extern "C" fn(
            p_self: GDExtensionConstStringPtr,
            r_text: *mut u32,
            p_max_write_length: GDExtensionInt,
        ) -> GDExtensionInt,
    >,
    pub string_name_new_with_utf8_chars_and_len: Option<
        unsafe extern "C" fn(
            r_dest: GDExtensionUninitializedStringNamePtr,
            p_contents: *const c_char,
            p_size: GDExtensionInt,
        ),
    >,

    // Array, Dictionary.
    pub array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionVariantPtr>,
    pub array_operator_index_const:
        Option<unsafe extern "C" fn(p_self: GDExtensionConstTypePtr, p_index: GDExtensionInt) -> GDExtensionVariantPtr>,
    pub dictionary_operator_index: Option<
        unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_key: GDExtensionConstVariantPtr) -> GDExtensionVariantPtr,
    >,
    pub dictionary_operator_index_const: Option<
        unsafe extern "C" fn(p_self: GDExtensionConstTypePtr, p_key: GDExtensionConstVariantPtr) -> GDExtensionVariantPtr,
    >,

    // Packed arrays.
    pub packed_byte_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut u8>,
    pub packed_int32_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut i32>,
    pub packed_int64_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut i64>,
    pub packed_float32_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut f32>,
    pub packed_float64_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut f64>,
    pub packed_string_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionStringPtr>,
    pub packed_vector2_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionTypePtr>,
    pub packed_vector3_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionTypePtr>,
    pub packed_color_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionTypePtr>,
    pub packed_vector4_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionTypePtr>,

    // Objects and ClassDB.
    pub classdb_construct_object:
        Option<unsafe extern "C" fn(p_classname: GDExtensionConstStringNamePtr) -> GDExtensionObjectPtr>,
    pub classdb_get_class_tag: Option<unsafe extern "C" fn(p_classname: GDExtensionConstStringNamePtr) -> *mut std::ffi::c_void>,
    pub classdb_get_method_bind: Option<
        unsafe extern "C" fn(
            p_classname: GDExtensionConstStringNamePtr,
            p_methodname: GDExtensionConstStringNamePtr,
            p_hash: GDExtensionInt,
        ) -> GDExtensionMethodBindPtr,
    >,
    pub object_method_bind_ptrcall: Option<
        unsafe extern "C" fn(
            p_method_bind: GDExtensionMethodBindPtr,
            p_instance: GDExtensionObjectPtr,
            p_args: *const GDExtensionConstTypePtr,
            r_ret: GDExtensionTypePtr,
        ),
    >,
    pub object_method_bind_call: Option<
        unsafe extern "C" fn(
            p_method_bind: GDExtensionMethodBindPtr,
            p_instance: GDExtensionObjectPtr,
            p_args: *const GDExtensionConstVariantPtr,
            p_arg_count: GDExtensionInt,
            r_ret: GDExtensionUninitializedVariantPtr,
            r_error: *mut GDExtensionCallError,
        ),
    >,
    pub object_cast_to: Option<
        unsafe extern "C" fn(p_object: GDExtensionConstObjectPtr, p_class_tag: *mut std::ffi::c_void) -> GDExtensionObjectPtr,
    >,
    pub object_destroy: Option<unsafe extern "C" fn(p_o: GDExtensionObjectPtr)>,
    pub object_get_instance_id:
        Option<unsafe extern "C" fn(p_object: GDExtensionConstObjectPtr) -> GDObjectInstanceID>,
    pub object_get_instance_from_id:
        Option<unsafe extern "C" fn(p_instance_id: GDObjectInstanceID) -> GDExtensionObjectPtr>,
    pub object_get_class_name: Option<
        unsafe extern "C" fn(
            p_object: GDExtensionConstObjectPtr,
            p_library: GDExtensionClassLibraryPtr,
            r_class_name: GDExtensionUninitializedStringNamePtr,
        ) -> GDExtensionBool,
    >,
    pub object_set_instance: Option<
        unsafe extern "C" fn(
            p_o: GDExtensionObjectPtr,
            p_classname: GDExtensionConstStringNamePtr,
            p_instance: GDExtensionClassInstancePtr,
        ),
    >,
    pub ref_get_object: Option<unsafe extern "C" fn(p_ref: GDExtensionConstRefPtr) -> GDExtensionObjectPtr>,
    pub ref_set_object: Option<unsafe extern "C" fn(p_ref: GDExtensionRefPtr, p_object: GDExtensionObjectPtr)>,

    // Extension classes.
    pub classdb_register_extension_class: Option<
        unsafe extern "C" fn(
            p_library: GDExtensionClassLibraryPtr,
            p_class_name: GDExtensionConstStringNamePtr,
            p_parent_class_name: GDExtensionConstStringNamePtr,
            p_extension_funcs: *const GDExtensionClassCreationInfo,
        ),
    >,
    pub classdb_unregister_extension_class: Option<
        unsafe extern "C" fn(p_library: GDExtensionClassLibraryPtr, p_class_name: GDExtensionConstStringNamePtr),
    >,

    // Callables.
    pub callable_custom_create: Option<
        unsafe extern "C" fn(r_callable: GDExtensionUninitializedTypePtr, p_callable_custom_info: *mut GDExtensionCallableCustomInfo),
    >,
}
