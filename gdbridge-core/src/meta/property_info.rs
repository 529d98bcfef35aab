/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::sys::VariantType;

/// Property usage flags `PROPERTY_USAGE_STORAGE | PROPERTY_USAGE_EDITOR`.
pub const PROPERTY_USAGE_DEFAULT: u32 = 6;

/// Describes a dynamic property of an extension instance, for the editor's property list.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PropertyInfo {
    pub variant_type: VariantType,
    pub name: String,

    /// Class of object-typed properties; empty otherwise.
    pub class_name: String,

    pub hint: u32,
    pub hint_string: String,
    pub usage: u32,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, variant_type: VariantType) -> Self {
        Self {
            variant_type,
            name: name.into(),
            class_name: String::new(),
            hint: 0,
            hint_string: String::new(),
            usage: PROPERTY_USAGE_DEFAULT,
        }
    }
}
