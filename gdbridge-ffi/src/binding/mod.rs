/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Process-wide storage of the engine binding: interface table, library pointer, lifecycle tables and configuration.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::OnceLock;

use crate as sys;
use sys::{BuiltinLifecycleTable, BuiltinMethodTable, EngineInterface, GDExtensionClassLibraryPtr};

mod config;

pub use config::{BridgeConfig, StringEncoding, VirtualFallback};

pub(crate) struct GodotBinding {
    interface: EngineInterface,
    library: ClassLibraryPtr,
    builtin_lifecycle: BuiltinLifecycleTable,
    builtin_methods: OnceLock<BuiltinMethodTable>,
    config: BridgeConfig,
}

/// Newtype around `GDExtensionClassLibraryPtr` so we can implement `Sync` and `Send` manually for this.
struct ClassLibraryPtr(GDExtensionClassLibraryPtr);

// SAFETY: only the pointer value is shared. Whoever dereferences it on the engine side must follow the engine's threading rules.
unsafe impl Sync for ClassLibraryPtr {}
// SAFETY: See `Sync` impl safety doc.
unsafe impl Send for ClassLibraryPtr {}

static BINDING: AtomicPtr<GodotBinding> = AtomicPtr::new(ptr::null_mut());

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Public API

/// Installs the engine binding.
///
/// A second call while a binding is installed is ignored with a warning on stderr; the first binding stays active.
///
/// # Safety
///
/// - `interface` must point to a fully populated table that outlives this call (it is copied).
/// - `library` must be the pointer given by the engine at load time.
/// - Must not run concurrently with [`deinitialize`].
pub unsafe fn initialize(
    interface: *const EngineInterface,
    library: GDExtensionClassLibraryPtr,
    config: BridgeConfig,
) {
    let interface = *interface;
    log_engine_version(&interface);

    let binding = Box::into_raw(Box::new(GodotBinding {
        builtin_lifecycle: BuiltinLifecycleTable::load(&interface),
        interface,
        library: ClassLibraryPtr(library),
        builtin_methods: OnceLock::new(),
        config,
    }));

    if BINDING
        .compare_exchange(ptr::null_mut(), binding, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        eprintln!("WARNING: gdbridge binding is already initialized; ignoring second initialization");
        drop(Box::from_raw(binding));
    }
}

/// Removes the engine binding. No-op if none is installed.
///
/// # Safety
///
/// No reference obtained from [`get_interface`], [`builtin_lifecycle_api`] or [`builtin_method_table`] may be used afterwards.
pub unsafe fn deinitialize() {
    let binding = BINDING.swap(ptr::null_mut(), Ordering::AcqRel);
    if !binding.is_null() {
        drop(Box::from_raw(binding));
    }
}

#[inline]
pub fn is_initialized() -> bool {
    !BINDING.load(Ordering::Acquire).is_null()
}

/// # Safety
///
/// The binding must not be deinitialized while the returned reference is in use.
#[inline]
pub unsafe fn get_interface() -> &'static EngineInterface {
    &get_binding().interface
}

/// # Safety
///
/// See [`get_interface`].
#[inline]
pub unsafe fn get_library() -> GDExtensionClassLibraryPtr {
    get_binding().library.0
}

/// # Safety
///
/// See [`get_interface`].
#[inline]
pub unsafe fn builtin_lifecycle_api() -> &'static BuiltinLifecycleTable {
    &get_binding().builtin_lifecycle
}

/// Loads the builtin method table. Needs `StringName` support, so runs at the `Core` init level, not at binding time.
///
/// Idempotent.
///
/// # Safety
///
/// See [`get_interface`].
pub unsafe fn load_builtin_method_table() {
    let binding = get_binding();
    binding.builtin_methods.get_or_init(|| {
        let mut strings = sys::StringCache::new(&binding.interface, &binding.builtin_lifecycle);
        let table = BuiltinMethodTable::load(&binding.interface, &mut strings);
        sys::out!("loaded {} builtin methods", table.len());
        table
    });
}

/// # Safety
///
/// See [`get_interface`]. Aborts if [`load_builtin_method_table`] has not run.
#[inline]
pub unsafe fn builtin_method_table() -> &'static BuiltinMethodTable {
    get_binding()
        .builtin_methods
        .get()
        .unwrap_or_else(|| sys::abort_with("builtin methods used before the Core init level was loaded"))
}

/// Configuration of the active binding, or the default configuration if none is installed.
pub fn config() -> BridgeConfig {
    let binding = BINDING.load(Ordering::Acquire);
    if binding.is_null() {
        BridgeConfig::default()
    } else {
        // SAFETY: non-null pointers in BINDING always come from Box::into_raw in initialize().
        unsafe { (*binding).config }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Crate-local implementation

#[inline]
fn get_binding() -> &'static GodotBinding {
    let binding = BINDING.load(Ordering::Acquire);
    if binding.is_null() {
        sys::abort_with("engine not available; make sure the extension was initialized and you are not calling it from unit tests");
    }

    // SAFETY: non-null pointers in BINDING always come from Box::into_raw in initialize(), and stay alive until deinitialize().
    unsafe { &*binding }
}

unsafe fn log_engine_version(interface: &EngineInterface) {
    let Some(get_godot_version) = interface.get_godot_version else {
        return;
    };

    let mut version = sys::GDExtensionGodotVersion {
        major: 0,
        minor: 0,
        patch: 0,
        string: ptr::null(),
    };
    get_godot_version(&mut version);

    let sys::GDExtensionGodotVersion { major, minor, patch, .. } = version;
    sys::out!("initialize gdbridge against engine {major}.{minor}.{patch}");
}
