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

pub mod cache_properties;
pub mod connection_properties;
pub mod connection_properties_builder;
pub mod connection_properties_validation;
pub mod pool_properties;

pub use cache_properties::CacheProperties;
pub use connection_properties::ConnectionProperties;
pub use connection_properties::PackagesProperties;
pub use connection_properties_builder::ConnectionPropertiesBuilder;
pub use connection_properties_validation::ConnectionPropertiesValidator;
pub use pool_properties::PoolProperties;
