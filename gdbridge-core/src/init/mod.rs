/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Library entry points: binding installation, per-level initialization and class registration.
//!
//! The engine drives the sequence:
//! 1. [`initialise_extension()`] once, right after loading the library;
//! 2. [`on_level_init()`] for every level from [`ExtensionLibrary::min_level()`] upwards;
//! 3. [`on_level_deinit()`] for the same levels in reverse;
//! 4. [`deinitialise_extension()`] once, before unloading.

use std::sync::Arc;

use crate::log::godot_warn;
use crate::meta::error::BridgeError;
use crate::meta::ClassName;
use crate::private::handle_panic;
use crate::registry::{self, ExtensionClass, Registries};
use crate::{out, sys};

pub use sys::{BridgeConfig, InitLevel, StringEncoding, VirtualFallback};

/// Defines the entry point of an extension library.
///
/// Every library has exactly one implementation of this trait, usually on an empty type tag:
///
/// ```ignore
/// struct MyExtension;
///
/// unsafe impl ExtensionLibrary for MyExtension {
///     fn on_level_init(level: InitLevel) {
///         if level == InitLevel::Scene {
///             gdbridge::init::queue_class::<Player>();
///         }
///     }
/// }
/// ```
///
/// # Safety
/// The bridge cannot enforce safety guarantees outside host code. Engine-side code (scripts, other extensions) must not free
/// objects behind plain handles while the host still uses them.
pub unsafe trait ExtensionLibrary {
    /// Configuration installed together with the binding.
    fn config() -> BridgeConfig {
        BridgeConfig::default()
    }

    /// Lowest level at which the library is loaded (`Scene` by default).
    fn min_level() -> InitLevel {
        InitLevel::Scene
    }

    /// Custom logic when a level is loaded. Runs before the queued classes of that level are registered.
    #[allow(unused_variables)]
    fn on_level_init(level: InitLevel) {
        // Nothing by default.
    }

    /// Custom logic when a level is unloaded. Runs after the classes of that level were unregistered.
    #[allow(unused_variables)]
    fn on_level_deinit(level: InitLevel) {
        // Nothing by default.
    }
}

/// Configuration of the active binding.
pub fn config() -> BridgeConfig {
    sys::config()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Class queue

type RegisterFn = fn() -> Result<(), BridgeError>;

struct QueuedClass {
    name: ClassName,
    level: InitLevel,
    register: RegisterFn,
}

/// Classes waiting for their init level.
static QUEUED: sys::Global<Vec<QueuedClass>> = sys::Global::default();

/// Classes registered by the init sequence, in registration order.
static REGISTERED: sys::Global<Vec<(InitLevel, ClassName)>> = sys::Global::default();

/// Loaded levels, so that skipped lower levels can be caught up.
static LOADED: sys::Global<Vec<InitLevel>> = sys::Global::default();

/// Queues `T` for registration at `T::INIT_LEVEL`.
///
/// Classes below the library's lowest level are registered together with that level. If a level at or above
/// `T::INIT_LEVEL` is already loaded, the class is registered immediately.
pub fn queue_class<T: ExtensionClass>() {
    let level = T::INIT_LEVEL;
    let loaded = LOADED.lock().iter().copied().filter(|&lvl| lvl >= level).max();

    if let Some(loaded) = loaded {
        register_now(T::class_name(), loaded, registry::register_class::<T>);
        return;
    }

    QUEUED.lock().push(QueuedClass {
        name: T::class_name(),
        level,
        register: registry::register_class::<T>,
    });
}

fn register_now(name: ClassName, level: InitLevel, register: RegisterFn) {
    match register() {
        Ok(()) => {
            out!("registered class {name} at level {level:?}");
            REGISTERED.lock().push((level, name));
        }
        Err(err) => godot_warn!("class {name} was not registered: {err}"),
    }
}

/// Registers every queued class whose level is at most `level`. They are unregistered when `level` unloads.
fn register_queued(level: InitLevel) {
    let due: Vec<QueuedClass> = {
        let mut queued = QUEUED.lock();
        let (due, rest) = std::mem::take(&mut *queued).into_iter().partition(|class| class.level <= level);
        *queued = rest;
        due
    };

    for class in due {
        register_now(class.name, level, class.register);
    }
}

fn unregister_level(level: InitLevel) {
    let classes: Vec<ClassName> = {
        let mut registered = REGISTERED.lock();
        let (at_level, rest) = std::mem::take(&mut *registered).into_iter().partition(|(lvl, _)| *lvl == level);
        *registered = rest;
        at_level.into_iter().map(|(_, name)| name).collect()
    };

    // Reverse order, so subclasses go before their parents.
    for name in classes.iter().rev() {
        if let Err(err) = registry::unregister_class_by_name(name) {
            godot_warn!("unregistering {name}: {err}");
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Entry points

/// Installs the engine binding with `E`'s configuration. Returns the lowest level the engine must initialize.
///
/// # Safety
/// - `interface` must point to a fully populated table; `library` must be the engine's pointer for this library.
/// - Must be called once, from the main thread, before any other bridge function.
pub unsafe fn initialise_extension<E: ExtensionLibrary>(
    interface: *const sys::EngineInterface,
    library: sys::GDExtensionClassLibraryPtr,
) -> InitLevel {
    let config = E::config();
    let ctx = || "error when loading extension library";

    // SAFETY: forwarded from the caller.
    let installed = handle_panic(ctx, || unsafe { sys::initialize(interface, library, config) });
    if installed.is_ok() {
        out!("extension library initialized with {config:?}");
    }

    E::min_level()
}

/// Loads `level`: core tasks on the first level, then the library's hook, then the queued classes of the level.
///
/// If the engine skips lower levels (it may reload from `Scene` upwards only), those are loaded first.
pub fn on_level_init<E: ExtensionLibrary>(level: InitLevel) {
    let ctx = || format!("failed to initialize level `{level:?}`");

    let _ = handle_panic(ctx, || {
        for lower in InitLevel::ALL {
            if lower < level && lower >= E::min_level() && !LOADED.lock().contains(&lower) {
                load_level::<E>(lower);
            }
        }

        if !LOADED.lock().contains(&level) {
            load_level::<E>(level);
        }
    });
}

fn load_level<E: ExtensionLibrary>(level: InitLevel) {
    if LOADED.lock().is_empty() {
        load_core();
    }

    LOADED.lock().push(level);
    E::on_level_init(level);
    register_queued(level);
}

fn load_core() {
    // SAFETY: called from the main thread after initialise_extension(), once per load.
    unsafe { sys::load_builtin_method_table() };

    if registry::is_installed() {
        out!("registries already installed; keeping them");
    } else {
        registry::install(Arc::new(Registries::new()));
    }
}

/// Unloads `level`: the classes registered at it (in reverse order), then the library's hook.
///
/// Unloading the lowest loaded level removes the process registries.
pub fn on_level_deinit<E: ExtensionLibrary>(level: InitLevel) {
    let ctx = || format!("failed to deinitialize level `{level:?}`");

    let _ = handle_panic(ctx, || {
        let was_loaded = {
            let mut loaded = LOADED.lock();
            let before = loaded.len();
            loaded.retain(|&lvl| lvl != level);
            loaded.len() != before
        };
        if !was_loaded {
            return;
        }

        unregister_level(level);
        E::on_level_deinit(level);

        if LOADED.lock().is_empty() {
            registry::uninstall();
            out!("registries removed");
        }
    });
}

/// Removes the engine binding. Levels still loaded are torn down without running library hooks.
pub fn deinitialise_extension() {
    let remaining = std::mem::take(&mut *LOADED.lock());
    for level in remaining.into_iter().rev() {
        unregister_level(level);
    }

    QUEUED.lock().clear();
    registry::uninstall();

    // SAFETY: after this point the bridge is not used until the next initialise_extension().
    unsafe { sys::deinitialize() };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        struct Lib;
        unsafe impl ExtensionLibrary for Lib {}

        assert_eq!(Lib::min_level(), InitLevel::Scene);
        assert_eq!(Lib::config(), BridgeConfig::default());
        assert_eq!(config().virtual_dispatch_fallback, VirtualFallback::Allow);
    }
}
