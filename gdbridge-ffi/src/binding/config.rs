/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// What happens when the engine asks for a virtual method that no host class in the chain overrides.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum VirtualFallback {
    /// Report "no override", so the engine runs its own default.
    #[default]
    Allow,

    /// Claim the slot with a stub that logs a warning instead of running the engine default.
    Deny,
}

/// Which encoding `GString` prefers when handing out a text view.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum StringEncoding {
    #[default]
    Utf8,
    Utf16,
}

/// Options recognized at extension initialization.
///
/// ```
/// use gdbridge_ffi::{BridgeConfig, VirtualFallback};
///
/// let config = BridgeConfig::new()
///     .with_checked_handles_default(true)
///     .with_virtual_dispatch_fallback(VirtualFallback::Deny);
///
/// assert!(config.use_checked_handles_default);
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct BridgeConfig {
    /// Handle shape for classes whose lifetime model is ambiguous (not refcounted, no explicit handle kind registered).
    pub use_checked_handles_default: bool,

    pub virtual_dispatch_fallback: VirtualFallback,

    pub variant_string_encoding: StringEncoding,
}

impl BridgeConfig {
    pub const fn new() -> Self {
        Self {
            use_checked_handles_default: false,
            virtual_dispatch_fallback: VirtualFallback::Allow,
            variant_string_encoding: StringEncoding::Utf8,
        }
    }

    pub const fn with_checked_handles_default(mut self, checked: bool) -> Self {
        self.use_checked_handles_default = checked;
        self
    }

    pub const fn with_virtual_dispatch_fallback(mut self, fallback: VirtualFallback) -> Self {
        self.virtual_dispatch_fallback = fallback;
        self
    }

    pub const fn with_variant_string_encoding(mut self, encoding: StringEncoding) -> Self {
        self.variant_string_encoding = encoding;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config, BridgeConfig::new());
        assert!(!config.use_checked_handles_default);
        assert_eq!(config.virtual_dispatch_fallback, VirtualFallback::Allow);
        assert_eq!(config.variant_string_encoding, StringEncoding::Utf8);
    }

    #[test]
    fn builder() {
        let config = BridgeConfig::new().with_variant_string_encoding(StringEncoding::Utf16);
        assert_eq!(config.variant_string_encoding, StringEncoding::Utf16);
        assert!(!config.use_checked_handles_default);
    }
}
