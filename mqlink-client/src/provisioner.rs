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

//! Connection factory provisioning.
//!
//! [`ConnectionFactoryProvisioner::provision`] turns validated [`ConnectionProperties`] and an
//! ordered list of customizers into exactly one [`ConnectionFactoryHandle`]. The variant is
//! chosen by a fixed precedence, first match wins:
//!
//! 1. `pool.enabled`: a [`PooledConnectionFactory`]; the pooling capability must be available.
//! 2. `cache.enabled` (the default): a [`CachingConnectionFactory`].
//! 3. otherwise the plain [`BrokerConnectionFactory`].

use std::fmt;
use std::sync::Arc;

use mqlink_error::MqLinkError;
use mqlink_error::MqLinkResult;
use tracing::info;

use crate::connection::Connection;
use crate::factory::ArcConnectionFactoryCustomizer;
use crate::factory::BrokerConnectionFactory;
use crate::factory::BrokerConnectionFactoryBuilder;
use crate::factory::CachingConnectionFactory;
use crate::factory::ConnectionFactory;
use crate::factory::PooledConnectionFactory;
use crate::lifecycle::OnceShutdownHook;
use crate::lifecycle::ShutdownHook;
use crate::lifecycle::StopPoolHook;
use crate::properties::ConnectionProperties;
use crate::properties::ConnectionPropertiesValidator;

/// Whether this runtime can build pooled connection factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingCapability {
    Available,
    Unavailable,
}

impl PoolingCapability {
    /// Available when the crate is built with the `pool` feature.
    ///
    /// The feature only picks this default; an explicit
    /// [`with_pooling_capability`](ConnectionFactoryProvisioner::with_pooling_capability) wins.
    pub fn detect() -> Self {
        if cfg!(feature = "pool") {
            PoolingCapability::Available
        } else {
            PoolingCapability::Unavailable
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        matches!(self, PoolingCapability::Available)
    }
}

impl Default for PoolingCapability {
    fn default() -> Self {
        Self::detect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFactoryKind {
    Pooled,
    Cached,
    Plain,
}

impl fmt::Display for ConnectionFactoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionFactoryKind::Pooled => write!(f, "pooled"),
            ConnectionFactoryKind::Cached => write!(f, "caching"),
            ConnectionFactoryKind::Plain => write!(f, "plain"),
        }
    }
}

/// The provisioned connection factory, shared read-only for the lifetime of the application.
///
/// Call [`shutdown`](ConnectionFactoryHandle::shutdown) at teardown; for the pooled variant it
/// stops the pool, exactly once.
pub enum ConnectionFactoryHandle {
    Pooled {
        factory: Arc<PooledConnectionFactory>,
        shutdown_hook: OnceShutdownHook,
    },
    Cached(Arc<CachingConnectionFactory>),
    Plain(Arc<BrokerConnectionFactory>),
}

impl ConnectionFactoryHandle {
    fn pooled(factory: PooledConnectionFactory) -> Self {
        let factory = Arc::new(factory);
        let shutdown_hook = OnceShutdownHook::new(Arc::new(StopPoolHook::new(factory.clone())));
        ConnectionFactoryHandle::Pooled {
            factory,
            shutdown_hook,
        }
    }

    pub fn kind(&self) -> ConnectionFactoryKind {
        match self {
            ConnectionFactoryHandle::Pooled { .. } => ConnectionFactoryKind::Pooled,
            ConnectionFactoryHandle::Cached(_) => ConnectionFactoryKind::Cached,
            ConnectionFactoryHandle::Plain(_) => ConnectionFactoryKind::Plain,
        }
    }

    pub fn as_pooled(&self) -> Option<&Arc<PooledConnectionFactory>> {
        match self {
            ConnectionFactoryHandle::Pooled { factory, .. } => Some(factory),
            _ => None,
        }
    }

    pub fn as_cached(&self) -> Option<&Arc<CachingConnectionFactory>> {
        match self {
            ConnectionFactoryHandle::Cached(factory) => Some(factory),
            _ => None,
        }
    }

    pub fn as_plain(&self) -> Option<&Arc<BrokerConnectionFactory>> {
        match self {
            ConnectionFactoryHandle::Plain(factory) => Some(factory),
            _ => None,
        }
    }

    /// The customized broker factory, wrapped or not.
    pub fn broker_factory(&self) -> &BrokerConnectionFactory {
        match self {
            ConnectionFactoryHandle::Pooled { factory, .. } => factory.target(),
            ConnectionFactoryHandle::Cached(factory) => factory.target(),
            ConnectionFactoryHandle::Plain(factory) => factory,
        }
    }

    /// Runs the teardown hook of the provisioned variant. Repeated calls do nothing.
    pub fn shutdown(&self) {
        if let ConnectionFactoryHandle::Pooled { shutdown_hook, .. } = self {
            shutdown_hook.before_shutdown();
        }
    }
}

impl ConnectionFactory for ConnectionFactoryHandle {
    fn create_connection(&self) -> MqLinkResult<Connection> {
        match self {
            ConnectionFactoryHandle::Pooled { factory, .. } => factory.create_connection(),
            ConnectionFactoryHandle::Cached(factory) => factory.create_connection(),
            ConnectionFactoryHandle::Plain(factory) => factory.create_connection(),
        }
    }
}

impl fmt::Debug for ConnectionFactoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionFactoryHandle")
            .field("kind", &self.kind())
            .field("broker_url", &self.broker_factory().broker_url().as_str())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionFactoryProvisioner {
    pooling: PoolingCapability,
}

impl ConnectionFactoryProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the detected pooling capability.
    pub fn with_pooling_capability(mut self, pooling: PoolingCapability) -> Self {
        self.pooling = pooling;
        self
    }

    #[inline]
    pub fn pooling_capability(&self) -> PoolingCapability {
        self.pooling
    }

    /// Chooses the factory variant for `properties`.
    pub fn select(&self, properties: &ConnectionProperties) -> MqLinkResult<ConnectionFactoryKind> {
        if properties.pool.enabled {
            if !self.pooling.is_available() {
                return Err(MqLinkError::capability_unavailable(
                    "pooled-connection-factory",
                    "pool.enabled",
                ));
            }
            return Ok(ConnectionFactoryKind::Pooled);
        }
        if properties.cache.enabled {
            return Ok(ConnectionFactoryKind::Cached);
        }
        Ok(ConnectionFactoryKind::Plain)
    }

    /// Validates `properties`, builds the broker factory, applies `customizers` in order and
    /// wraps the result in the selected variant.
    ///
    /// No connection is opened. Any error is a configuration error that should abort startup.
    pub fn provision(
        &self,
        properties: &ConnectionProperties,
        customizers: &[ArcConnectionFactoryCustomizer],
    ) -> MqLinkResult<ConnectionFactoryHandle> {
        let broker_url = ConnectionPropertiesValidator::validate(properties)?;
        let kind = self.select(properties)?;
        let broker_factory = BrokerConnectionFactoryBuilder::new(properties, customizers)
            .with_broker_url(broker_url)
            .build()?;

        let handle = match kind {
            ConnectionFactoryKind::Pooled => {
                ConnectionFactoryHandle::pooled(PooledConnectionFactory::new(broker_factory, &properties.pool))
            }
            ConnectionFactoryKind::Cached => ConnectionFactoryHandle::Cached(Arc::new(CachingConnectionFactory::new(
                broker_factory,
                &properties.cache,
            ))),
            ConnectionFactoryKind::Plain => ConnectionFactoryHandle::Plain(Arc::new(broker_factory)),
        };
        info!(
            "provisioned {} connection factory for {} ({} customizers)",
            kind,
            handle.broker_factory().broker_url(),
            customizers.len()
        );
        Ok(handle)
    }
}
