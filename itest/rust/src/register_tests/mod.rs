/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod hook_test;
mod init_test;
mod virtual_test;

use gdbridge::init::queue_class;

/// Extension classes of the test library, queued when the `Scene` level loads.
pub fn queue_test_classes() {
    queue_class::<virtual_test::FixedHitSpaceState>();
    queue_class::<virtual_test::EmptySpaceState>();
    queue_class::<hook_test::HookRecorder>();
    queue_class::<crate::object_tests::lifetime_test::CountedResource>();
}
