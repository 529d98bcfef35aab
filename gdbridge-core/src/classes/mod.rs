/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine classes known to the bridge.
//!
//! Only the two classes every engine has are declared here: [`Object`] and [`RefCounted`]. Others are declared where they are
//! used, with [`engine_class!`](crate::engine_class), and made known to the class registry through
//! [`ClassRegistry::load_api_json()`](crate::registry::ClassRegistry::load_api_json).

mod object;

pub use object::ConnectFlags;

use crate::obj::{GodotClass, NoBase};

/// Declares a marker type for an engine class.
///
/// The first type after the colon is the direct parent; further types are the remaining ancestors, up to `Object`. They are
/// needed because [`Inherits`](crate::obj::Inherits) is not transitive on its own.
///
/// ```ignore
/// engine_class!(pub Node: Object);
/// engine_class!(pub Node3D: Node, Object);
/// engine_class!(pub Resource: RefCounted, Object; refcounted);
/// ```
///
/// Method stubs are plain functions over [`Gd::ptrcall()`](crate::obj::Gd::ptrcall) and [`Gd::call()`](crate::obj::Gd::call).
#[macro_export]
macro_rules! engine_class {
    (@refcounted refcounted) => { true };

    ($(#[$attr:meta])* $vis:vis $Class:ident : $Parent:ty $(, $Ancestor:ty)* $(; $refcounted:ident)?) => {
        $(#[$attr])*
        #[derive(Debug)]
        $vis enum $Class {}

        impl $crate::obj::GodotClass for $Class {
            type Base = $Parent;
            const CLASS_NAME: &'static str = stringify!($Class);
            $( const IS_REFCOUNTED: bool = $crate::engine_class!(@refcounted $refcounted); )?
        }

        // SAFETY: the caller lists the parent and ancestors of the class.
        unsafe impl $crate::obj::Inherits<$Parent> for $Class {}
        $(
            unsafe impl $crate::obj::Inherits<$Ancestor> for $Class {}
        )*
    };
}

/// Root of the class hierarchy.
#[derive(Debug)]
pub enum Object {}

impl GodotClass for Object {
    type Base = NoBase;

    const CLASS_NAME: &'static str = "Object";
    const IS_REFCOUNTED: bool = false;
}

engine_class! {
    /// Base class of all objects with an intrusive reference count.
    ///
    /// Wrappers of refcounted objects take part in the count; see [`Gd`](crate::obj::Gd) for the rules.
    pub RefCounted: Object; refcounted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::Inherits;

    engine_class!(Node: Object);
    engine_class!(Node3D: Node, Object);
    engine_class!(Resource: RefCounted, Object; refcounted);

    fn assert_inherits<Derived: Inherits<Base>, Base: GodotClass>() {}

    #[test]
    fn declared_hierarchy() {
        assert_inherits::<Node3D, Node>();
        assert_inherits::<Node3D, Object>();
        assert_inherits::<Resource, RefCounted>();

        assert!(Node3D::inherits::<Object>());
        assert!(!Node::inherits::<RefCounted>());
        assert_eq!(Node3D::CLASS_NAME, "Node3D");
    }

    #[test]
    fn refcounted_flag() {
        assert!(!Object::IS_REFCOUNTED);
        assert!(!Node3D::IS_REFCOUNTED);
        assert!(RefCounted::IS_REFCOUNTED);
        assert!(Resource::IS_REFCOUNTED);
    }
}
