/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Printing and logging functionality.
//!
//! Messages go through the engine's logging interface once the binding is installed, and to stderr before that
//! (e.g. in unit tests, or when the engine rejected the extension).

// https://stackoverflow.com/a/40234666
#[macro_export]
#[doc(hidden)]
macro_rules! inner_function {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! inner_godot_msg {
    ($godot_fn:ident; $fmt:literal $(, $args:expr)* $(,)?) => {{
        let msg = format!($fmt $(, $args)*);
        $crate::log::print_engine_message(
            $crate::log::MessageLevel::$godot_fn,
            &msg,
            $crate::inner_function!(),
            file!(),
            line!(),
        );
    }};
}

/// Pushes a warning message to the engine's debugger and to the OS terminal.
#[macro_export]
macro_rules! godot_warn {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_godot_msg!(Warning; $fmt $(, $args)*)
    };
}

/// Pushes an error message to the engine's debugger and to the OS terminal.
#[macro_export]
macro_rules! godot_error {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_godot_msg!(Error; $fmt $(, $args)*)
    };
}

/// Logs a script error to the engine's debugger and to the OS terminal.
#[macro_export]
macro_rules! godot_script_error {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_godot_msg!(ScriptError; $fmt $(, $args)*)
    };
}

/// Prints to stdout, like the engine's `print()`.
#[macro_export]
macro_rules! godot_print {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        println!($fmt $(, $args)*)
    };
}

/// Logs an error and aborts the process.
///
/// Reserved for broken internal invariants: unwinding is not an option while the engine is on the stack.
#[macro_export]
macro_rules! fatal {
    ($fmt:literal $(, $args:expr)* $(,)?) => {{
        $crate::godot_error!($fmt $(, $args)*);
        std::process::abort()
    }};
}

pub use crate::{fatal, godot_error, godot_print, godot_script_error, godot_warn};

use crate::sys;

#[doc(hidden)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MessageLevel {
    Warning,
    Error,
    ScriptError,
}

#[doc(hidden)]
pub fn print_engine_message(level: MessageLevel, msg: &str, function: &str, file: &str, line: u32) {
    if !sys::is_initialized() {
        eprintln!("[{level:?}] {msg}");
        return;
    }

    let msg = sys::to_c_string(msg);
    let function = sys::to_c_string(function);
    let file = sys::to_c_string(file);
    let line = i32::try_from(line).unwrap_or(i32::MAX);

    let print_fn = match level {
        MessageLevel::Warning => sys::interface_fn!(print_warning),
        MessageLevel::Error => sys::interface_fn!(print_error),
        MessageLevel::ScriptError => sys::interface_fn!(print_script_error),
    };

    // SAFETY: all strings are NUL-terminated and live until the call returns.
    unsafe {
        print_fn(
            msg.as_ptr(),
            function.as_ptr(),
            file.as_ptr(),
            line,
            sys::conv::SYS_FALSE, // no editor toast
        );
    }
}
