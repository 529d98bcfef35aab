/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Callbacks that are passed as function pointers to the engine upon extension class registration.
//!
//! Each one runs host code under panic containment and falls back to a neutral return value on failure.
#![allow(clippy::missing_safety_doc)]

use std::ffi::c_void;
use std::sync::Arc;

use crate::builtin::{GString, StringName, Variant};
use crate::meta::error::BridgeError;
use crate::private::handle_callback;
use crate::registry::{ExtensionClass, ExtensionClassInfo, ExtensionInstance, Handle, InstanceToken, Registries, VirtualSlot};
use crate::sys;
use sys::interface_fn;

/// Creation info with the hooks for `T`. `info` becomes the class userdata.
pub(crate) fn creation_info<T: ExtensionClass>(info: *const ExtensionClassInfo) -> sys::GDExtensionClassCreationInfo {
    sys::GDExtensionClassCreationInfo {
        is_virtual: sys::conv::SYS_FALSE,
        is_abstract: sys::conv::SYS_FALSE,
        is_exposed: sys::conv::SYS_TRUE,
        set_func: Some(set_property::<T>),
        get_func: Some(get_property::<T>),
        get_property_list_func: Some(get_property_list::<T>),
        free_property_list_func: Some(free_property_list),
        property_can_revert_func: Some(property_can_revert::<T>),
        property_get_revert_func: Some(property_get_revert::<T>),
        notification_func: Some(on_notification::<T>),
        to_string_func: Some(to_string::<T>),
        reference_func: None,
        unreference_func: None,
        create_instance_func: Some(create::<T>),
        free_instance_func: Some(free),
        get_virtual_call_data_func: Some(get_virtual_call_data),
        call_virtual_with_data_func: Some(call_virtual_with_data),
        class_userdata: info as *mut c_void,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Lifecycle

/// Engine constructor of an extension object.
///
/// Constructs the nearest engine ancestor, then the host states of every extension class in the chain, and links the two.
/// Returns null if either side fails; an engine object that was already constructed is destroyed again.
pub unsafe extern "C" fn create<T: ExtensionClass>(class_userdata: *mut c_void) -> sys::GDExtensionObjectPtr {
    // SAFETY: userdata is the `ExtensionClassInfo` registered with this class, kept alive by the class registry.
    let info = &*(class_userdata as *const ExtensionClassInfo);

    handle_callback(|| format!("create {}", T::CLASS_NAME), || create_instance::<T>(info)).unwrap_or(std::ptr::null_mut())
}

fn create_instance<T: ExtensionClass>(info: &ExtensionClassInfo) -> Result<sys::GDExtensionObjectPtr, BridgeError> {
    let registries = crate::registry::get()?;
    let base_ptr = registries.classes.construct_raw(info.engine_base.as_str())?;

    match bind_instance::<T>(&registries, info, base_ptr) {
        Ok(()) => Ok(base_ptr),
        Err(err) => {
            // SAFETY: `base_ptr` was constructed above and nothing else refers to it.
            unsafe { interface_fn!(object_destroy)(base_ptr) };
            Err(err)
        }
    }
}

fn bind_instance<T: ExtensionClass>(
    registries: &Registries,
    info: &ExtensionClassInfo,
    base_ptr: sys::GDExtensionObjectPtr,
) -> Result<(), BridgeError> {
    let class = T::class_name();
    let base_handle = Handle::plain(base_ptr);

    let state = (info.init_state)(base_handle)?;
    let ancestor_states = info
        .extension_ancestors()
        .map(|ancestor| (ancestor.init_state)(base_handle))
        .collect::<Result<Vec<_>, _>>()?;

    let token = registries.instances.insert_with(|token| {
        let instance = ExtensionInstance::new(token, class.clone(), base_handle, state);
        Arc::new(instance.with_ancestor_states(ancestor_states))
    });

    let class_sname = class.to_string_name();
    // SAFETY: `base_ptr` is live; the token encoding is never null.
    unsafe { interface_fn!(object_set_instance)(base_ptr, class_sname.string_sys(), token.to_sys()) };

    registries.pointers.attach_instance(base_ptr, &class, token);
    crate::out!("created {class} instance {token:?} at {base_ptr:?}");
    Ok(())
}

/// Engine destructor hook: drops the host state and unlinks it from the engine twin.
pub unsafe extern "C" fn free(_class_userdata: *mut c_void, instance: sys::GDExtensionClassInstancePtr) {
    handle_callback(
        || "free extension instance",
        || {
            let registries = crate::registry::get()?;
            let token = token_from_sys(instance)?;

            let removed = registries
                .instances
                .remove(token)
                .ok_or_else(|| BridgeError::invalid_handle(format!("instance {token:?} was already freed")))?;

            registries.pointers.detach_instance(removed.base().ptr_unchecked());
            crate::out!("freed {} instance {token:?}", removed.class());
            Ok(())
        },
    );
}

fn token_from_sys(instance: sys::GDExtensionClassInstancePtr) -> Result<InstanceToken, BridgeError> {
    InstanceToken::from_sys(instance).ok_or_else(|| BridgeError::invalid_handle("null instance pointer"))
}

fn instance_from_sys(instance: sys::GDExtensionClassInstancePtr) -> Result<Arc<ExtensionInstance>, BridgeError> {
    let token = token_from_sys(instance)?;
    crate::registry::get()?
        .instances
        .get(token)
        .ok_or_else(|| BridgeError::invalid_handle(format!("instance {token:?} is not alive")))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Notifications, properties, to_string

pub unsafe extern "C" fn on_notification<T: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    what: i32,
    _reversed: sys::GDExtensionBool,
) {
    handle_callback(
        || format!("{}::on_notification({what})", T::CLASS_NAME),
        || instance_from_sys(instance)?.with_state_mut(|this: &mut T| this.on_notification(what)),
    );
}

pub unsafe extern "C" fn get_property<T: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    ret: sys::GDExtensionVariantPtr,
) -> sys::GDExtensionBool {
    // This string is not ours, so we must not destroy it.
    let property = StringName::borrow_string_sys(name).to_string();

    let value = handle_callback(
        || format!("{}::get_property({property})", T::CLASS_NAME),
        || instance_from_sys(instance)?.with_state(|this: &T| this.get_property(&property)),
    );

    match value.flatten() {
        Some(value) => {
            *Variant::borrow_var_sys_mut(ret) = value;
            sys::conv::SYS_TRUE
        }
        None => sys::conv::SYS_FALSE,
    }
}

pub unsafe extern "C" fn set_property<T: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    value: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionBool {
    let property = StringName::borrow_string_sys(name).to_string();
    let value = Variant::borrow_var_sys(value);

    let handled = handle_callback(
        || format!("{}::set_property({property})", T::CLASS_NAME),
        || instance_from_sys(instance)?.with_state_mut(|this: &mut T| this.set_property(&property, value)),
    );

    sys::conv::bool_to_sys(handled.unwrap_or(false))
}

/// Property list handed to the engine. Names and hint strings are boxed engine strings, released in [`free_property_list`].
pub unsafe extern "C" fn get_property_list<T: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    count: *mut u32,
) -> *const sys::GDExtensionPropertyInfo {
    let list = handle_callback(
        || format!("{}::property_list()", T::CLASS_NAME),
        || instance_from_sys(instance)?.with_state(|this: &T| this.property_list()),
    )
    .unwrap_or_default();

    let list_sys: Box<[sys::GDExtensionPropertyInfo]> = list
        .into_iter()
        .take(u32::MAX as usize)
        .map(|info| sys::GDExtensionPropertyInfo {
            type_: info.variant_type.sys(),
            name: Box::into_raw(Box::new(StringName::from(info.name.as_str()))) as sys::GDExtensionStringNamePtr,
            class_name: Box::into_raw(Box::new(StringName::from(info.class_name.as_str())))
                as sys::GDExtensionStringNamePtr,
            hint: info.hint,
            hint_string: Box::into_raw(Box::new(GString::from(info.hint_string.as_str()))) as sys::GDExtensionStringPtr,
            usage: info.usage,
        })
        .collect();

    *count = list_sys.len() as u32;
    Box::into_raw(list_sys) as *const sys::GDExtensionPropertyInfo
}

pub unsafe extern "C" fn free_property_list(
    _instance: sys::GDExtensionClassInstancePtr,
    list: *const sys::GDExtensionPropertyInfo,
    count: u32,
) {
    if list.is_null() {
        return;
    }

    // SAFETY: `list` and `count` come from `get_property_list`, which leaked a boxed slice of that length.
    let slice = std::ptr::slice_from_raw_parts_mut(list as *mut sys::GDExtensionPropertyInfo, sys::conv::u32_to_usize(count));
    let list_sys = Box::from_raw(slice);

    for info in list_sys.iter() {
        drop(Box::from_raw(info.name as *mut StringName));
        drop(Box::from_raw(info.class_name as *mut StringName));
        drop(Box::from_raw(info.hint_string as *mut GString));
    }
}

unsafe fn revert_value<T: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
) -> Option<Variant> {
    let property = StringName::borrow_string_sys(name).to_string();

    handle_callback(
        || format!("{}::property_get_revert({property})", T::CLASS_NAME),
        || instance_from_sys(instance)?.with_state(|this: &T| this.property_get_revert(&property)),
    )
    .flatten()
}

pub unsafe extern "C" fn property_can_revert<T: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionBool {
    sys::conv::bool_to_sys(revert_value::<T>(instance, name).is_some())
}

pub unsafe extern "C" fn property_get_revert<T: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    ret: sys::GDExtensionVariantPtr,
) -> sys::GDExtensionBool {
    let Some(revert) = revert_value::<T>(instance, name) else {
        return sys::conv::SYS_FALSE;
    };

    *Variant::borrow_var_sys_mut(ret) = revert;
    sys::conv::SYS_TRUE
}

pub unsafe extern "C" fn to_string<T: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    is_valid: *mut sys::GDExtensionBool,
    out_string: sys::GDExtensionStringPtr,
) {
    let string = handle_callback(
        || format!("{}::to_string()", T::CLASS_NAME),
        || instance_from_sys(instance)?.with_state(|this: &T| ExtensionClass::to_string(this)),
    )
    .flatten();

    // Note: is_valid comes uninitialized and must be set.
    match string {
        Some(string) => {
            *(out_string as *mut GString) = GString::from(string);
            *is_valid = sys::conv::SYS_TRUE;
        }
        None => *is_valid = sys::conv::SYS_FALSE,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Virtual dispatch

/// Queried once per class and method name. Returns the slot to pass back on calls, or null for the engine's default.
pub unsafe extern "C" fn get_virtual_call_data(
    class_userdata: *mut c_void,
    name: sys::GDExtensionConstStringNamePtr,
) -> *mut c_void {
    // SAFETY: userdata is the `ExtensionClassInfo` registered with this class, kept alive by the class registry.
    let info = &*(class_userdata as *const ExtensionClassInfo);
    let method = StringName::borrow_string_sys(name).to_string();

    let slot = info.resolve_virtual(&method, sys::config().virtual_dispatch_fallback);
    crate::out!("virtual {}::{method} -> {}", info.class, if slot.is_some() { "host" } else { "engine" });

    slot.map_or(std::ptr::null_mut(), |slot| slot as *const VirtualSlot as *mut c_void)
}

/// Single trampoline for all overrides. `userdata` is the slot returned by [`get_virtual_call_data`].
pub unsafe extern "C" fn call_virtual_with_data(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    userdata: *mut c_void,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
) {
    // SAFETY: slots live as long as their class's virtual table.
    let slot = &*(userdata as *const VirtualSlot);

    handle_callback(
        || format!("virtual {}::{}", slot.class(), slot.name()),
        || {
            let instance = instance_from_sys(instance)?;
            let method = if slot.is_override() {
                slot.name().to_string()
            } else {
                StringName::borrow_string_sys(name).to_string()
            };
            slot.dispatch(&method, &instance, args, ret)
        },
    );
}
