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

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use mqlink_error::MqLinkResult;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;

use super::BrokerConnectionFactory;
use super::ConnectionFactory;
use crate::connection::session::EndpointPolicy;
use crate::connection::session::SessionCore;
use crate::connection::AcknowledgeMode;
use crate::connection::Connection;
use crate::connection::ConnectionOwner;
use crate::connection::PhysicalConnection;
use crate::properties::CacheProperties;

/// Connection factory that shares one connection and caches its sessions.
///
/// Every connection handle refers to the same underlying connection, and closing a handle
/// leaves it open. Closed sessions return to a per-acknowledge-mode cache holding up to
/// `session_cache_size` idle sessions; sessions beyond that are closed. Cached sessions keep
/// their producers (and consumers, when enabled) for reuse.
pub struct CachingConnectionFactory {
    target: BrokerConnectionFactory,
    cache: Arc<SessionCache>,
}

struct SessionCache {
    policy: EndpointPolicy,
    session_cache_size: usize,
    shared: Mutex<Option<Arc<PhysicalConnection>>>,
    idle: Mutex<HashMap<AcknowledgeMode, VecDeque<Arc<SessionCore>>>>,
}

impl CachingConnectionFactory {
    pub fn new(target: BrokerConnectionFactory, cache: &CacheProperties) -> Self {
        Self {
            target,
            cache: Arc::new(SessionCache {
                policy: EndpointPolicy {
                    cache_producers: cache.producers,
                    cache_consumers: cache.consumers,
                    anonymous_producers: false,
                },
                session_cache_size: cache.session_cache_size.max(1),
                shared: Mutex::new(None),
                idle: Mutex::new(HashMap::new()),
            }),
        }
    }

    #[inline]
    pub fn target(&self) -> &BrokerConnectionFactory {
        &self.target
    }

    #[inline]
    pub fn session_cache_size(&self) -> usize {
        self.cache.session_cache_size
    }

    #[inline]
    pub fn is_cache_producers(&self) -> bool {
        self.cache.policy.cache_producers
    }

    #[inline]
    pub fn is_cache_consumers(&self) -> bool {
        self.cache.policy.cache_consumers
    }

    /// Idle sessions currently cached for `ack_mode`.
    pub fn cached_session_count(&self, ack_mode: AcknowledgeMode) -> usize {
        self.cache.idle.lock().get(&ack_mode).map_or(0, VecDeque::len)
    }

    /// Closes the shared connection and every cached session. The next
    /// [`create_connection`](ConnectionFactory::create_connection) opens a new connection.
    pub fn reset(&self) {
        let shared = self.cache.shared.lock().take();
        self.cache.clear_idle();
        if let Some(connection) = shared {
            info!("resetting shared connection {}", connection.id());
            connection.close();
        }
    }
}

impl SessionCache {
    fn clear_idle(&self) {
        let drained: Vec<_> = self.idle.lock().drain().flat_map(|(_, sessions)| sessions).collect();
        for session in drained {
            session.close();
        }
    }
}

impl ConnectionFactory for CachingConnectionFactory {
    fn create_connection(&self) -> MqLinkResult<Connection> {
        let physical = {
            let mut shared = self.cache.shared.lock();
            match shared.as_ref() {
                Some(connection) if !connection.is_closed() => connection.clone(),
                _ => {
                    self.cache.clear_idle();
                    let connection = self.target.open_physical();
                    *shared = Some(connection.clone());
                    connection
                }
            }
        };
        Ok(Connection::new(physical, self.cache.clone()))
    }
}

impl ConnectionOwner for SessionCache {
    fn open_session(
        &self,
        physical: &Arc<PhysicalConnection>,
        ack_mode: AcknowledgeMode,
    ) -> MqLinkResult<Arc<SessionCore>> {
        let cached = {
            let mut idle = self.idle.lock();
            let sessions = idle.entry(ack_mode).or_default();
            let mut found = None;
            while let Some(session) = sessions.pop_front() {
                if !session.is_closed() && session.connection_id() == physical.id() {
                    found = Some(session);
                    break;
                }
                session.close();
            }
            found
        };

        physical.acquire_session_slot();
        match cached {
            Some(session) => {
                debug!("found cached session {} for {:?}", session.id(), ack_mode);
                Ok(session)
            }
            None => {
                let session = SessionCore::new(physical, ack_mode, self.policy);
                debug!("created new cached session {} for {:?}", session.id(), ack_mode);
                Ok(session)
            }
        }
    }

    fn release_session(&self, session: &Arc<SessionCore>, physical: &Arc<PhysicalConnection>) {
        physical.release_session_slot();
        if physical.is_closed() || session.is_closed() {
            session.close();
            return;
        }
        let mut idle = self.idle.lock();
        let sessions = idle.entry(session.ack_mode()).or_default();
        if sessions.len() < self.session_cache_size {
            sessions.push_back(session.clone());
        } else {
            drop(idle);
            debug!("session cache full, closing session {}", session.id());
            session.close();
        }
    }

    fn release_connection(&self, physical: &Arc<PhysicalConnection>, _sessions: Vec<Arc<SessionCore>>) {
        // The shared connection stays open until reset.
        debug!("ignoring close of shared connection {}", physical.id());
    }
}
