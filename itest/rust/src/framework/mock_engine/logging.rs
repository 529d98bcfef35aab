/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::{c_char, CStr};

use gdbridge::sys;
use sys::Global;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Error,
    Warning,
    ScriptError,
}

/// Message printed through the engine, by the extension or by the engine itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoggedMessage {
    pub level: LogLevel,
    pub text: String,
}

static MESSAGES: Global<Vec<LoggedMessage>> = Global::default();

fn record(level: LogLevel, text: String) {
    eprintln!("[engine {level:?}] {text}");
    MESSAGES.lock().push(LoggedMessage { level, text });
}

/// Errors the engine raises on its own, e.g. for failed calls.
pub fn engine_error(text: &str) {
    record(LogLevel::Error, text.to_string());
}

/// Drains everything logged since the last call.
pub fn take_messages() -> Vec<LoggedMessage> {
    std::mem::take(&mut *MESSAGES.lock())
}

unsafe fn text(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

pub unsafe extern "C" fn print_error(
    description: *const c_char,
    _function: *const c_char,
    _file: *const c_char,
    _line: i32,
    _editor_notify: sys::GDExtensionBool,
) {
    record(LogLevel::Error, text(description));
}

pub unsafe extern "C" fn print_warning(
    description: *const c_char,
    _function: *const c_char,
    _file: *const c_char,
    _line: i32,
    _editor_notify: sys::GDExtensionBool,
) {
    record(LogLevel::Warning, text(description));
}

pub unsafe extern "C" fn print_script_error(
    description: *const c_char,
    _function: *const c_char,
    _file: *const c_char,
    _line: i32,
    _editor_notify: sys::GDExtensionBool,
) {
    record(LogLevel::ScriptError, text(description));
}

pub unsafe extern "C" fn get_godot_version(r_version: *mut sys::GDExtensionGodotVersion) {
    *r_version = sys::GDExtensionGodotVersion {
        major: 4,
        minor: 3,
        patch: 0,
        string: c"4.3.0.stable.mock".as_ptr(),
    };
}
