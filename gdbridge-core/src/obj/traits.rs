/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::meta::ClassName;
use crate::sys::InitLevel;

/// Makes `T` eligible to be managed by the engine and stored in [`Gd<T>`][crate::obj::Gd] pointers.
///
/// Engine classes get their implementation from [`engine_class!`](crate::engine_class); extension classes implement it by hand
/// next to [`ExtensionClass`](crate::registry::ExtensionClass).
pub trait GodotClass: Sized + 'static {
    /// The immediate superclass of `T`. [`NoBase`] for `Object`.
    type Base: GodotClass;

    /// Name under which the class is known to the engine.
    const CLASS_NAME: &'static str;

    /// Whether instances take part in the engine's intrusive reference counting.
    const IS_REFCOUNTED: bool = <Self::Base as GodotClass>::IS_REFCOUNTED;

    /// Initialization level, during which this class is registered (extension classes only).
    const INIT_LEVEL: InitLevel = <Self::Base as GodotClass>::INIT_LEVEL;

    fn class_name() -> ClassName {
        ClassName::new(Self::CLASS_NAME)
    }

    /// Returns whether `Self` inherits from `Base`, according to the static hierarchy. Reflexive.
    fn inherits<Base: GodotClass>() -> bool {
        if Self::CLASS_NAME == Base::CLASS_NAME {
            true
        } else if <Self::Base as GodotClass>::CLASS_NAME == NoBase::CLASS_NAME {
            false
        } else {
            Self::Base::inherits::<Base>()
        }
    }
}

/// Type representing the absence of a base class, at the root of the hierarchy.
///
/// `NoBase` is the base class of exactly one class: [`Object`][crate::classes::Object].
pub enum NoBase {}

impl GodotClass for NoBase {
    type Base = NoBase;

    const CLASS_NAME: &'static str = "";
    const IS_REFCOUNTED: bool = false;
    const INIT_LEVEL: InitLevel = InitLevel::Core;
}

/// Non-strict inheritance relationship in the class hierarchy.
///
/// `Derived: Inherits<Base>` means that either `Derived` is a subclass of `Base`, or the class `Base` itself.
/// Enables [`Gd::upcast()`](crate::obj::Gd::upcast), which needs no engine round-trip.
///
/// # Safety
///
/// This trait must only be implemented for subclasses of `Base`: upcasting a `Gd<Self>` to `Gd<Base>` must always be valid.
pub unsafe trait Inherits<Base: GodotClass>: GodotClass {}

// SAFETY: every class is a subclass of itself.
unsafe impl<T: GodotClass> Inherits<T> for T {}

#[cfg(test)]
mod tests {
    use super::*;

    enum Root {}
    enum Middle {}
    enum Leaf {}

    impl GodotClass for Root {
        type Base = NoBase;
        const CLASS_NAME: &'static str = "Root";
    }

    impl GodotClass for Middle {
        type Base = Root;
        const CLASS_NAME: &'static str = "Middle";
        const IS_REFCOUNTED: bool = true;
    }

    impl GodotClass for Leaf {
        type Base = Middle;
        const CLASS_NAME: &'static str = "Leaf";
    }

    #[test]
    fn static_inheritance() {
        assert!(Leaf::inherits::<Leaf>());
        assert!(Leaf::inherits::<Middle>());
        assert!(Leaf::inherits::<Root>());
        assert!(!Root::inherits::<Leaf>());
        assert!(!Middle::inherits::<Leaf>());
    }

    #[test]
    fn refcounted_is_inherited() {
        assert!(!Root::IS_REFCOUNTED);
        assert!(Middle::IS_REFCOUNTED);
        assert!(Leaf::IS_REFCOUNTED);
        assert_eq!(Leaf::class_name().as_str(), "Leaf");
    }
}
