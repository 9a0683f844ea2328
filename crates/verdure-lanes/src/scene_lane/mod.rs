// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scene lanes: frustum culling followed by level-of-detail assignment.

pub mod culling;
pub mod lod;

pub use culling::{compute_frustum, filter_visible, is_visible, CullingLane, CullingStats};
pub use lod::{LodAssignment, LodLevel, LodTable, LodTableError, MaterialDetail};
