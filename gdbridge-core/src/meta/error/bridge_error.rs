/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

/// Category of a [`BridgeError`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A checked handle no longer maps to a live object, or the wrapper is null.
    InvalidHandle,

    /// A variant holds a different kind than requested.
    WrongKind,

    /// A dynamic cast found that the object is not an instance of the target class.
    CastFailed,

    /// A wrapper was disposed twice. The second dispose has no effect.
    DoubleDispose,

    /// A class name was registered twice; the last registration wins.
    ReentrantRegister,

    /// The engine rejected an operation, or does not know a class or method.
    EngineError,

    /// An extension instance is already borrowed in a conflicting way.
    AlreadyBound,

    /// The bridge is used before the registries were installed, or after they were removed.
    NotInitialized,

    /// A class schema document could not be read.
    InvalidSchema,
}

impl ErrorKind {
    fn description(self) -> &'static str {
        match self {
            Self::InvalidHandle => "invalid handle",
            Self::WrongKind => "wrong variant kind",
            Self::CastFailed => "cast failed",
            Self::DoubleDispose => "double dispose",
            Self::ReentrantRegister => "class registered twice",
            Self::EngineError => "engine error",
            Self::AlreadyBound => "instance already bound",
            Self::NotInitialized => "bridge not initialized",
            Self::InvalidSchema => "invalid class schema",
        }
    }
}

/// Error returned by bridge operations.
///
/// Carries an [`ErrorKind`] to match on, and a human-readable context describing the failed operation.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct BridgeError {
    kind: ErrorKind,
    context: String,
}

impl BridgeError {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub(crate) fn invalid_handle(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidHandle, context)
    }

    pub(crate) fn engine(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::EngineError, context)
    }

    pub(crate) fn not_initialized() -> Self {
        Self::new(
            ErrorKind::NotInitialized,
            "registries are not installed; was the Core init level loaded?",
        )
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "{}", self.kind.description())
        } else {
            write!(f, "{}: {}", self.kind.description(), self.context)
        }
    }
}

impl Error for BridgeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = BridgeError::new(ErrorKind::CastFailed, "Node -> Resource");
        assert_eq!(err.to_string(), "cast failed: Node -> Resource");
        assert_eq!(err.kind(), ErrorKind::CastFailed);

        let err = BridgeError::new(ErrorKind::DoubleDispose, "");
        assert_eq!(err.to_string(), "double dispose");
    }
}
