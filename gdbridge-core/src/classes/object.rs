/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Methods of `Object`, available on every wrapper.

use crate::builtin::{Callable, GString, StringName, Variant};
use crate::classes::Object;
use crate::meta::error::{BridgeError, CallError};
use crate::meta::ToGodot;
use crate::obj::{Gd, Inherits};

/// Flags of [`Gd::connect_flags()`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ConnectFlags {
    bits: u32,
}

impl ConnectFlags {
    pub const DEFAULT: Self = Self { bits: 0 };
    pub const DEFERRED: Self = Self { bits: 1 };
    pub const PERSIST: Self = Self { bits: 2 };
    pub const ONE_SHOT: Self = Self { bits: 4 };
    pub const REFERENCE_COUNTED: Self = Self { bits: 8 };

    pub const fn ord(self) -> u32 {
        self.bits
    }
}

impl std::ops::BitOr for ConnectFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

/// Engine `Error` code for success.
const OK: i64 = 0;

impl<T: Inherits<Object>> Gd<T> {
    /// Most-derived class name, as reported by the object itself.
    pub fn get_class(&self) -> Result<GString, BridgeError> {
        self.ptrcall("get_class", |_| {})
    }

    /// Reads a property. Extension classes answer through [`ExtensionClass::get_property()`](crate::registry::ExtensionClass::get_property).
    ///
    /// Unknown properties yield nil.
    pub fn get(&self, property: &str) -> Result<Variant, BridgeError> {
        let property = StringName::from(property);
        self.ptrcall("get", |frame| {
            frame.arg(&property);
        })
    }

    pub fn set(&self, property: &str, value: &Variant) -> Result<(), BridgeError> {
        let property = StringName::from(property);
        self.ptrcall("set", |frame| {
            frame.arg(&property);
            frame.arg(value);
        })
    }

    /// Sends notification `what` through the class hierarchy, base classes first.
    pub fn notify(&self, what: i32) -> Result<(), BridgeError> {
        self.ptrcall("notification", |frame| {
            frame.arg(what);
            frame.arg(false);
        })
    }

    /// Textual form of the object. Extension classes may override it with
    /// [`ExtensionClass::to_string()`](crate::registry::ExtensionClass::to_string).
    pub fn to_gstring(&self) -> Result<GString, BridgeError> {
        self.ptrcall("to_string", |_| {})
    }

    /// Connects `signal` to `callable` with default flags.
    pub fn connect(&self, signal: &str, callable: &Callable) -> Result<(), BridgeError> {
        self.connect_flags(signal, callable, ConnectFlags::DEFAULT)
    }

    pub fn connect_flags(&self, signal: &str, callable: &Callable, flags: ConnectFlags) -> Result<(), BridgeError> {
        let signal_name = StringName::from(signal);
        let code: i64 = self.ptrcall("connect", |frame| {
            frame.arg(&signal_name);
            frame.arg(callable);
            frame.arg(flags.ord());
        })?;

        if code != OK {
            return Err(BridgeError::engine(format!("connecting signal `{signal}` failed with error {code}")));
        }
        Ok(())
    }

    /// Emits `signal` with `args`. Vararg method, so this goes through a variant call.
    pub fn emit_signal(&self, signal: &str, args: &[Variant]) -> Result<(), CallError> {
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(StringName::from(signal).to_variant());
        call_args.extend(args.iter().cloned());

        self.call("emit_signal", &call_args).map(drop)
    }
}
