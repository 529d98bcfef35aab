/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::num::NonZeroU64;

use crate::meta::error::ConvertError;
use crate::meta::{FromGodot, GodotConvert, ToGodot};
use crate::sys;
use sys::interface_fn;

/// Represents a non-zero instance ID.
///
/// The engine hands out IDs as `u64`, scripts see them as `i64`; the signed form is the canonical one in the public API.
/// IDs of `RefCounted` objects have their highest bit set.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct InstanceId {
    value: NonZeroU64,
}

impl InstanceId {
    const REF_COUNTED_BIT: u64 = 1 << 63;

    /// Constructs an instance ID from an integer, or `None` if the integer is zero.
    ///
    /// This does *not* check if the instance is valid.
    pub fn try_from_i64(id: i64) -> Option<Self> {
        Self::try_from_u64(id as u64)
    }

    pub fn try_from_u64(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(|value| Self { value })
    }

    pub fn to_i64(self) -> i64 {
        self.to_u64() as i64
    }

    pub fn to_u64(self) -> u64 {
        self.value.get()
    }

    /// Returns if the object being referred to inherits `RefCounted`.
    ///
    /// Involves no engine round-trip; the information is encoded in the ID itself.
    pub fn is_ref_counted(self) -> bool {
        self.to_u64() & Self::REF_COUNTED_BIT != 0
    }

    /// Asks the engine whether an object with this ID is still alive.
    pub fn lookup_validity(self) -> bool {
        // SAFETY: the engine accepts any ID and returns null for unknown ones.
        let ptr = unsafe { interface_fn!(object_get_instance_from_id)(self.to_u64()) };
        !ptr.is_null()
    }

    /// ID of the object at `ptr`, or `None` if the engine reports 0 (object under destruction).
    ///
    /// # Safety
    /// `ptr` must point to a live engine object.
    pub(crate) unsafe fn of_object(ptr: sys::GDExtensionObjectPtr) -> Option<Self> {
        Self::try_from_u64(interface_fn!(object_get_instance_id)(ptr))
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_i64())
    }
}

impl Debug for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "InstanceId({})", self.to_i64())
    }
}

impl GodotConvert for InstanceId {
    type Via = i64;
}

impl ToGodot for InstanceId {
    fn to_godot(&self) -> Self::Via {
        self.to_i64()
    }
}

impl FromGodot for InstanceId {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Self::try_from_i64(via).ok_or_else(|| ConvertError::bad_value(via))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(InstanceId::try_from_i64(0), None);
        assert!(InstanceId::try_from_godot(0).is_err());
    }

    #[test]
    fn ref_counted_bit() {
        let plain = InstanceId::try_from_u64(17).unwrap();
        assert!(!plain.is_ref_counted());

        let refc = InstanceId::try_from_u64(17 | (1 << 63)).unwrap();
        assert!(refc.is_ref_counted());
        assert!(refc.to_i64() < 0);
        assert_eq!(InstanceId::try_from_i64(refc.to_i64()), Some(refc));
    }
}
