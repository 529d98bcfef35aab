/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Step in the engine's initialization process.
///
/// Initialization and deinitialization are split into multiple levels, like a stack. At each level,
/// a different amount of engine functionality is available. Deinitialization happens in reverse order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum InitLevel {
    /// First level loaded by the engine. Builtin types are available, classes are not.
    Core,

    /// Second level. Only server classes and builtins are available.
    Servers,

    /// Third level. Most classes are available; extension classes are usually registered here.
    Scene,

    /// Fourth level, only in the editor. All classes are available.
    Editor,
}

impl InitLevel {
    /// All levels in initialization order.
    pub const ALL: [InitLevel; 4] = [Self::Core, Self::Servers, Self::Scene, Self::Editor];

    #[doc(hidden)]
    pub fn from_sys(level: crate::GDExtensionInitializationLevel) -> Self {
        match level {
            crate::GDEXTENSION_INITIALIZATION_CORE => Self::Core,
            crate::GDEXTENSION_INITIALIZATION_SERVERS => Self::Servers,
            crate::GDEXTENSION_INITIALIZATION_SCENE => Self::Scene,
            crate::GDEXTENSION_INITIALIZATION_EDITOR => Self::Editor,
            _ => {
                eprintln!("WARNING: unknown initialization level {level}");
                Self::Scene
            }
        }
    }

    #[doc(hidden)]
    pub fn to_sys(self) -> crate::GDExtensionInitializationLevel {
        match self {
            Self::Core => crate::GDEXTENSION_INITIALIZATION_CORE,
            Self::Servers => crate::GDEXTENSION_INITIALIZATION_SERVERS,
            Self::Scene => crate::GDEXTENSION_INITIALIZATION_SCENE,
            Self::Editor => crate::GDEXTENSION_INITIALIZATION_EDITOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sys_round_trip() {
        for level in InitLevel::ALL {
            assert_eq!(InitLevel::from_sys(level.to_sys()), level);
        }
        assert!(InitLevel::Core < InitLevel::Editor);
    }
}
