/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::builtin::StringName;

/// Name of an engine or extension class.
///
/// Cheap to clone and usable as a map key from any thread. Converted to a [`StringName`] only at the point where an
/// engine function needs one, since the engine may not be loaded when names are created.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassName {
    name: Arc<str>,
}

impl ClassName {
    pub fn new(name: &str) -> Self {
        Self { name: Arc::from(name) }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Engine string name. Requires a loaded binding.
    pub fn to_string_name(&self) -> StringName {
        StringName::from(self.as_str())
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassName({:?})", self.as_str())
    }
}

impl Borrow<str> for ClassName {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
