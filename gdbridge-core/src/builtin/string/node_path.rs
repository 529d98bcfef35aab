/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::macros::opaque_builtin;
use crate::builtin::GString;
use crate::sys;
use sys::types::OpaqueNodePath;
use sys::{GodotFfi, VariantType};

/// Pre-parsed scene tree path.
#[repr(transparent)]
pub struct NodePath {
    opaque: OpaqueNodePath,
}

impl NodePath {
    fn from_opaque(opaque: OpaqueNodePath) -> Self {
        Self { opaque }
    }
}

opaque_builtin!(NodePath => VariantType::NodePath, OpaqueNodePath);

impl Default for NodePath {
    fn default() -> Self {
        // SAFETY: the default constructor initializes an empty path.
        unsafe {
            Self::new_with_uninit(|dst| sys::builtin_lifecycle_api().construct_default(VariantType::NodePath, dst))
        }
    }
}

impl From<&GString> for NodePath {
    fn from(s: &GString) -> Self {
        // SAFETY: constructor 2 of NodePath takes one String.
        unsafe {
            Self::new_with_uninit(|dst| {
                sys::builtin_lifecycle_api().construct_with(VariantType::NodePath, 2, dst, &[s.sys_const()])
            })
        }
    }
}

impl From<&str> for NodePath {
    fn from(s: &str) -> Self {
        Self::from(&GString::from(s))
    }
}

impl PartialEq for NodePath {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for NodePath {}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", GString::from(self))
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "^{:?}", self.to_string())
    }
}
