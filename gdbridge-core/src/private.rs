/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Panic containment for code running on engine threads.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::log::godot_error;
use crate::meta::error::BridgeError;

/// Executes `code`. If a panic is thrown, it is caught and an error message is printed to the engine.
///
/// Every `extern "C"` entry point runs host code through this function: unwinding across the C ABI is undefined behavior.
/// Returns `Err(message)` in case of a panic.
pub fn handle_panic<E, F, R, S>(error_context: E, code: F) -> Result<R, String>
where
    E: FnOnce() -> S,
    F: FnOnce() -> R,
    S: std::fmt::Display,
{
    match catch_unwind(AssertUnwindSafe(code)) {
        Ok(result) => Ok(result),
        Err(err) => {
            let msg = format_panic_message(extract_panic_message(&*err));
            godot_error!("host function panicked.\n  Context: {}\n  {msg}", error_context());
            Err(msg)
        }
    }
}

/// Like [`handle_panic`], but for code that reports bridge errors: both panics and errors are logged.
///
/// Returns `None` if either occurred, so callbacks can fall back to their default return value.
pub(crate) fn handle_callback<E, F, R, S>(error_context: E, code: F) -> Option<R>
where
    E: FnOnce() -> S,
    F: FnOnce() -> Result<R, BridgeError>,
    S: std::fmt::Display,
{
    match handle_panic(error_context, code) {
        Ok(Ok(result)) => Some(result),
        Ok(Err(err)) => {
            godot_error!("{err}");
            None
        }
        Err(_panic) => None,
    }
}

/// Logs the error of a fallible operation and returns the default value instead.
pub(crate) fn log_or_default<T: Default>(result: Result<T, BridgeError>) -> T {
    result.unwrap_or_else(|err| {
        godot_error!("{err}");
        T::default()
    })
}

pub(crate) fn extract_panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("(panic of type ID {:?})", err.type_id())
    }
}

fn format_panic_message(msg: String) -> String {
    // If the message contains newlines, print all of the lines after a line break, and indent them.
    let lbegin = "\n  ";
    let indented = msg.replace('\n', lbegin);

    if indented.len() != msg.len() {
        format!("[panic]{lbegin}{indented}")
    } else {
        format!("[panic]  {msg}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::error::ErrorKind;

    #[test]
    fn panic_is_contained() {
        let result: Result<i32, String> = handle_panic(|| "test", || panic!("boom"));
        assert_eq!(result, Err("[panic]  boom".to_string()));

        let result = handle_panic(|| "test", || 5);
        assert_eq!(result, Ok(5));
    }

    #[test]
    fn multiline_panic_is_indented() {
        let result: Result<(), String> = handle_panic(|| "test", || panic!("first\nsecond"));
        assert_eq!(result, Err("[panic]\n  first\n  second".to_string()));
    }

    #[test]
    fn callback_errors_become_none() {
        let ok = handle_callback(|| "ctx", || Ok::<_, BridgeError>(3));
        assert_eq!(ok, Some(3));

        let err: Option<()> = handle_callback(|| "ctx", || Err(BridgeError::new(ErrorKind::CastFailed, "nope")));
        assert_eq!(err, None);

        assert_eq!(log_or_default::<i64>(Err(BridgeError::new(ErrorKind::EngineError, "x"))), 0);
    }
}
