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

//! # Verdure Lanes
//!
//! Hot-path stages run once per frame on the scene inputs. Each lane is a pure
//! transformation of its inputs: the visibility filter keeps the objects whose
//! bounding spheres reach into the camera frustum, and the LOD selector picks
//! a detail level for each of them from the committed complexity tier.

#![warn(missing_docs)]

pub mod scene_lane;
