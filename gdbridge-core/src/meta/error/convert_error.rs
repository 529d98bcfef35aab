/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

use crate::meta::error::{BridgeError, ErrorKind};
use crate::meta::ClassName;
use crate::sys::VariantType;

/// Reason why a value could not be decoded from the engine.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FromVariantError {
    /// Variant holds a different kind than requested.
    BadType {
        expected: VariantType,
        actual: VariantType,
    },

    /// Object is alive but not an instance of the requested class.
    WrongClass { expected: ClassName },

    /// Object was freed, or is null where a non-null object was requested.
    DeadObject,

    /// Kind is right, but the value does not fit the host type (e.g. out-of-range integer).
    BadValue,
}

/// Represents errors that can occur when converting values from the engine.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ConvertError {
    kind: FromVariantError,
    value: Option<String>,
}

impl ConvertError {
    /// Construct with a user-defined message, for conversions implemented outside the bridge.
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            kind: FromVariantError::BadValue,
            value: Some(user_message.into()),
        }
    }

    pub fn bad_type(expected: VariantType, actual: VariantType) -> Self {
        Self {
            kind: FromVariantError::BadType { expected, actual },
            value: None,
        }
    }

    pub fn wrong_class(expected: ClassName) -> Self {
        Self {
            kind: FromVariantError::WrongClass { expected },
            value: None,
        }
    }

    pub fn dead_object() -> Self {
        Self {
            kind: FromVariantError::DeadObject,
            value: None,
        }
    }

    /// Value out of range for the host type; `value` is its debug rendering.
    pub fn bad_value(value: impl fmt::Debug) -> Self {
        Self {
            kind: FromVariantError::BadValue,
            value: Some(format!("{value:?}")),
        }
    }

    pub fn kind(&self) -> &FromVariantError {
        &self.kind
    }

    /// Rendering of the value that failed to convert, if known.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FromVariantError::BadType { expected, actual } => {
                write!(f, "expected type {expected:?}, got {actual:?}")?;
            }
            FromVariantError::WrongClass { expected } => {
                write!(f, "expected class {expected}")?;
            }
            FromVariantError::DeadObject => {
                write!(f, "object is null or was freed")?;
            }
            FromVariantError::BadValue => {
                write!(f, "value cannot be represented in target type")?;
            }
        }

        if let Some(value) = &self.value {
            write!(f, ": {value}")?;
        }

        Ok(())
    }
}

impl Error for ConvertError {}

impl From<ConvertError> for BridgeError {
    fn from(err: ConvertError) -> Self {
        let kind = match err.kind {
            FromVariantError::BadType { .. } | FromVariantError::BadValue => ErrorKind::WrongKind,
            FromVariantError::WrongClass { .. } => ErrorKind::CastFailed,
            FromVariantError::DeadObject => ErrorKind::InvalidHandle,
        };

        BridgeError::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = ConvertError::bad_type(VariantType::Int, VariantType::String);
        assert_eq!(err.to_string(), "expected type Int, got String");

        let err = ConvertError::bad_value(300i64);
        assert_eq!(err.to_string(), "value cannot be represented in target type: 300");
        assert_eq!(err.value(), Some("300"));
    }

    #[test]
    fn maps_to_bridge_error() {
        let err: BridgeError = ConvertError::bad_type(VariantType::Bool, VariantType::Nil).into();
        assert_eq!(err.kind(), ErrorKind::WrongKind);

        let err: BridgeError = ConvertError::wrong_class(ClassName::new("Node")).into();
        assert_eq!(err.kind(), ErrorKind::CastFailed);

        let err: BridgeError = ConvertError::dead_object().into();
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
    }
}
