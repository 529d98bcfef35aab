/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Container proxies over engine-owned storage.
//!
//! None of the proxies copies the container: element access and iteration go through the engine one element at a time.
//! Cloning a proxy shares the engine container (engine `Array` and `Dictionary` are reference types).

mod array;
mod dictionary;
mod packed_array;

pub use array::{Array, ArrayElement, ArrayIter, VarArray};
pub use dictionary::{Dictionary, DictionaryIter};
pub use packed_array::{
    PackedArray, PackedArrayIter, PackedByteArray, PackedColorArray, PackedElement, PackedFloat32Array,
    PackedFloat64Array, PackedInt32Array, PackedInt64Array, PackedStringArray, PackedVector2Array,
    PackedVector3Array, PackedVector4Array,
};
