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

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::factory::PooledConnectionFactory;

/// Trait defining a shutdown hook.
///
/// Implemented by resources that must be released when the application shuts down. The
/// `before_shutdown` method is called as part of the shutdown sequence.
pub trait ShutdownHook {
    fn before_shutdown(&self);
}

pub type ArcShutdownHook = Arc<dyn ShutdownHook + Send + Sync + 'static>;

/// Runs the wrapped hook at most once, however often shutdown is requested.
pub struct OnceShutdownHook {
    hook: ArcShutdownHook,
    fired: AtomicBool,
}

impl OnceShutdownHook {
    pub fn new(hook: ArcShutdownHook) -> Self {
        Self {
            hook,
            fired: AtomicBool::new(false),
        }
    }

    /// `true` once the wrapped hook has run.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

impl ShutdownHook for OnceShutdownHook {
    fn before_shutdown(&self) {
        if !self.fired.swap(true, Ordering::AcqRel) {
            self.hook.before_shutdown();
        }
    }
}

/// Stops a pooled connection factory.
pub struct StopPoolHook {
    factory: Arc<PooledConnectionFactory>,
}

impl StopPoolHook {
    pub fn new(factory: Arc<PooledConnectionFactory>) -> Self {
        Self { factory }
    }
}

impl ShutdownHook for StopPoolHook {
    fn before_shutdown(&self) {
        self.factory.stop();
    }
}
