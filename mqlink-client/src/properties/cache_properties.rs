// Copyright 2023 The mqlink Authors
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

use serde::Deserialize;
use serde::Serialize;

/// Session caching settings, read from the `cache` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheProperties {
    /// Wrap the broker factory in a caching factory when pooling is off.
    pub enabled: bool,

    /// Cache message consumers per session.
    pub consumers: bool,

    /// Cache message producers per session.
    pub producers: bool,

    /// Idle sessions kept per acknowledge mode.
    #[serde(alias = "sessionCacheSize")]
    pub session_cache_size: usize,
}

impl Default for CacheProperties {
    fn default() -> Self {
        CacheProperties {
            enabled: true,
            consumers: false,
            producers: true,
            session_cache_size: 1,
        }
    }
}
