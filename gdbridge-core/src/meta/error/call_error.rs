/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

use crate::meta::error::BridgeError;
use crate::sys;
use crate::sys::VariantType;

/// Error capable of representing failed function calls.
///
/// Returned from _varcall_ functions such as [`Gd::call()`](crate::obj::Gd::call): arguments and return values are passed as
/// `Variant`, and the engine validates them at runtime. Allows to inspect the involved class and method.
///
/// # Possible error causes
/// - **Invalid method**: the method does not exist on the object.
/// - **Argument mismatch**: too many or too few arguments, or an argument of the wrong type.
/// - **Dead object**: the object was freed before the call.
/// - **Host failure**: a host callable failed or panicked.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CallError {
    class_name: String,
    method_name: String,
    code: sys::GDExtensionCallErrorType,
    reason: String,
}

impl CallError {
    /// Error reported by the engine through a `GDExtensionCallError` struct.
    pub(crate) fn from_engine(
        class_name: &str,
        method_name: &str,
        err: &sys::GDExtensionCallError,
        arg_types: &[VariantType],
    ) -> Self {
        Self {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            code: err.error,
            reason: sys::call_error_reason(err, arg_types),
        }
    }

    /// The call did not reach the engine, because the bridge failed first (dead object, unknown method, ...).
    pub(crate) fn from_bridge(class_name: &str, method_name: &str, err: BridgeError) -> Self {
        let code = match err.kind() {
            crate::meta::error::ErrorKind::InvalidHandle => sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL,
            _ => sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD,
        };

        Self {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            code,
            reason: err.to_string(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Engine error code (`GDEXTENSION_CALL_ERROR_*`).
    pub fn code(&self) -> sys::GDExtensionCallErrorType {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to call {}::{}: {}",
            self.class_name, self.method_name, self.reason
        )
    }
}

impl Error for CallError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::error::ErrorKind;

    #[test]
    fn engine_reason_is_formatted() {
        let err = sys::GDExtensionCallError {
            error: sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS,
            argument: 0,
            expected: 1,
        };

        let call_err = CallError::from_engine("Node", "set_name", &err, &[VariantType::String, VariantType::Int]);
        assert_eq!(
            call_err.to_string(),
            "failed to call Node::set_name: too many arguments; expected 1, but called with 2"
        );
        assert_eq!(call_err.code(), sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS);
    }

    #[test]
    fn bridge_failure_maps_code() {
        let err = CallError::from_bridge("Node", "get_owner", BridgeError::new(ErrorKind::InvalidHandle, "freed"));
        assert_eq!(err.code(), sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL);
        assert_eq!(err.method_name(), "get_owner");
    }
}
