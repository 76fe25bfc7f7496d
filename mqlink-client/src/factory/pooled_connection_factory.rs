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
use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use mqlink_error::ConnectionError;
use mqlink_error::MqLinkResult;
use parking_lot::Condvar;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::BrokerConnectionFactory;
use super::ConnectionFactory;
use crate::connection::session::EndpointPolicy;
use crate::connection::session::SessionCore;
use crate::connection::AcknowledgeMode;
use crate::connection::Connection;
use crate::connection::ConnectionOwner;
use crate::connection::PhysicalConnection;
use crate::properties::PoolProperties;

const EVICTOR_THREAD_NAME: &str = "mqlink-pool-evictor";

/// Connection factory backed by a bounded pool of shared connections.
///
/// At most `max_connections` connections are open at a time. A connection handle from this
/// factory is a lease: closing or dropping it releases the lease and leaves the connection open
/// for the next caller. Requests reuse an unleased connection first, then open a new one while
/// below capacity, then share the least-leased connection.
///
/// Sessions are limited per connection; see [`PoolProperties::maximum_active_session_per_connection`].
///
/// The pool must be [`stop`](PooledConnectionFactory::stop)ped at shutdown.
pub struct PooledConnectionFactory {
    pool: Arc<ConnectionPool>,
    evictor: Mutex<Option<JoinHandle<()>>>,
}

struct ConnectionPool {
    target: BrokerConnectionFactory,
    settings: PoolProperties,
    entries: Mutex<Vec<PooledEntry>>,
    session_released: Condvar,
    evictor_lock: Mutex<()>,
    evictor_wakeup: Condvar,
    stopped: AtomicBool,
}

struct PooledEntry {
    connection: Arc<PhysicalConnection>,
    references: usize,
    last_used: Instant,
}

impl PooledEntry {
    fn new(connection: Arc<PhysicalConnection>, references: usize) -> Self {
        Self {
            connection,
            references,
            last_used: Instant::now(),
        }
    }

    fn is_usable(&self, settings: &PoolProperties) -> bool {
        !self.connection.is_closed() && !(settings.reconnect_on_exception && self.connection.is_failed())
    }

    fn is_evictable(&self, settings: &PoolProperties, now: Instant) -> bool {
        if self.connection.is_closed() {
            return true;
        }
        if self.references > 0 || self.connection.active_sessions() > 0 {
            return false;
        }
        if settings.reconnect_on_exception && self.connection.is_failed() {
            return true;
        }
        let idle = settings
            .idle_timeout()
            .is_some_and(|timeout| now.saturating_duration_since(self.last_used) > timeout);
        let expired = settings
            .expiry_timeout()
            .is_some_and(|timeout| now.saturating_duration_since(self.connection.created_at()) > timeout);
        idle || expired
    }
}

impl PooledConnectionFactory {
    pub fn new(target: BrokerConnectionFactory, settings: &PoolProperties) -> Self {
        let pool = Arc::new(ConnectionPool {
            target,
            settings: settings.clone(),
            entries: Mutex::new(Vec::with_capacity(settings.max_connections)),
            session_released: Condvar::new(),
            evictor_lock: Mutex::new(()),
            evictor_wakeup: Condvar::new(),
            stopped: AtomicBool::new(false),
        });
        if settings.create_connection_on_startup {
            let connection = pool.target.open_physical();
            pool.entries.lock().push(PooledEntry::new(connection, 0));
        }
        let evictor = settings
            .time_between_expiration_check()
            .and_then(|period| spawn_evictor(Arc::downgrade(&pool), period));
        info!(
            "pooled connection factory created for {}, max connections {}, max sessions per connection {}",
            pool.target.broker_url(),
            settings.max_connections,
            settings.maximum_active_session_per_connection
        );
        Self {
            pool,
            evictor: Mutex::new(evictor),
        }
    }

    #[inline]
    pub fn target(&self) -> &BrokerConnectionFactory {
        &self.pool.target
    }

    #[inline]
    pub fn settings(&self) -> &PoolProperties {
        &self.pool.settings
    }

    /// Open connections currently held by the pool.
    pub fn connection_count(&self) -> usize {
        self.pool.entries.lock().len()
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.pool.is_stopped()
    }

    /// Closes unleased connections that are idle, expired or failed.
    pub fn evict(&self) {
        self.pool.evict();
    }

    /// Closes every pooled connection and stops the evictor. Blocked session requests fail with
    /// [`ConnectionError::PoolStopped`], as does every later request. Calling it again does
    /// nothing.
    pub fn stop(&self) {
        if self.pool.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let drained: Vec<PooledEntry> = self.pool.entries.lock().drain(..).collect();
        let closed = drained.len();
        for entry in drained {
            entry.connection.close();
        }
        self.pool.session_released.notify_all();
        {
            let _guard = self.pool.evictor_lock.lock();
            self.pool.evictor_wakeup.notify_all();
        }
        if let Some(evictor) = self.evictor.lock().take() {
            if evictor.join().is_err() {
                warn!("{} thread panicked", EVICTOR_THREAD_NAME);
            }
        }
        info!("pooled connection factory stopped, {} connections closed", closed);
    }
}

impl ConnectionFactory for PooledConnectionFactory {
    fn create_connection(&self) -> MqLinkResult<Connection> {
        let connection = self.pool.lease()?;
        Ok(Connection::new(connection, self.pool.clone()))
    }
}

impl ConnectionPool {
    #[inline]
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn lease(&self) -> MqLinkResult<Arc<PhysicalConnection>> {
        if self.is_stopped() {
            return Err(ConnectionError::PoolStopped.into());
        }
        let mut entries = self.entries.lock();
        self.evict_locked(&mut entries);

        let settings = &self.settings;
        let unleased = entries
            .iter()
            .position(|entry| entry.references == 0 && entry.is_usable(settings));
        let index = match unleased {
            Some(index) => index,
            None if entries.len() < settings.max_connections => {
                entries.push(PooledEntry::new(self.target.open_physical(), 0));
                entries.len() - 1
            }
            None => {
                let least_leased = |usable_only: bool| {
                    entries
                        .iter()
                        .enumerate()
                        .filter(|(_, entry)| !usable_only || entry.is_usable(settings))
                        .min_by_key(|(_, entry)| entry.references)
                        .map(|(index, _)| index)
                };
                match least_leased(true).or_else(|| least_leased(false)) {
                    Some(index) => index,
                    None => {
                        entries.push(PooledEntry::new(self.target.open_physical(), 0));
                        entries.len() - 1
                    }
                }
            }
        };

        let entry = &mut entries[index];
        entry.references += 1;
        entry.last_used = Instant::now();
        debug!(
            "leased pooled connection {} ({} leases)",
            entry.connection.id(),
            entry.references
        );
        Ok(entry.connection.clone())
    }

    fn evict(&self) {
        let mut entries = self.entries.lock();
        self.evict_locked(&mut entries);
    }

    fn evict_locked(&self, entries: &mut Vec<PooledEntry>) {
        let now = Instant::now();
        entries.retain(|entry| {
            if entry.is_evictable(&self.settings, now) {
                debug!("evicting pooled connection {}", entry.connection.id());
                entry.connection.close();
                false
            } else {
                true
            }
        });
    }
}

impl ConnectionOwner for ConnectionPool {
    fn open_session(
        &self,
        physical: &Arc<PhysicalConnection>,
        ack_mode: AcknowledgeMode,
    ) -> MqLinkResult<Arc<SessionCore>> {
        let settings = &self.settings;
        let max_sessions = settings.maximum_active_session_per_connection;
        let deadline = settings.block_if_full_timeout().map(|timeout| Instant::now() + timeout);

        let mut entries = self.entries.lock();
        loop {
            if self.is_stopped() {
                return Err(ConnectionError::PoolStopped.into());
            }
            if physical.is_closed() {
                return Err(ConnectionError::closed(physical.id().as_str()).into());
            }
            if physical.active_sessions() < max_sessions {
                physical.acquire_session_slot();
                break;
            }
            if !settings.block_if_full {
                warn!("pooled connection {} has no free session", physical.id());
                return Err(ConnectionError::PoolExhausted {
                    max_sessions,
                    timeout_ms: 0,
                }
                .into());
            }
            let timed_out = match deadline {
                Some(deadline) => self.session_released.wait_until(&mut entries, deadline).timed_out(),
                None => {
                    self.session_released.wait(&mut entries);
                    false
                }
            };
            if timed_out && physical.active_sessions() >= max_sessions && !self.is_stopped() {
                warn!(
                    "timed out waiting for a session on pooled connection {}",
                    physical.id()
                );
                return Err(ConnectionError::PoolExhausted {
                    max_sessions,
                    timeout_ms: settings.block_if_full_timeout.max(0) as u64,
                }
                .into());
            }
        }
        drop(entries);

        let policy = EndpointPolicy {
            anonymous_producers: settings.use_anonymous_producers,
            ..EndpointPolicy::default()
        };
        Ok(SessionCore::new(physical, ack_mode, policy))
    }

    fn release_session(&self, session: &Arc<SessionCore>, physical: &Arc<PhysicalConnection>) {
        {
            let _entries = self.entries.lock();
            if session.close() {
                physical.release_session_slot();
            }
        }
        self.session_released.notify_all();
    }

    fn release_connection(&self, physical: &Arc<PhysicalConnection>, sessions: Vec<Arc<SessionCore>>) {
        let mut entries = self.entries.lock();
        let mut returned = 0;
        for session in &sessions {
            if session.close() {
                physical.release_session_slot();
                returned += 1;
            }
        }
        if returned > 0 {
            debug!(
                "closed {} sessions left open on a lease of pooled connection {}",
                returned,
                physical.id()
            );
        }
        if let Some(entry) = entries
            .iter_mut()
            .find(|entry| entry.connection.id() == physical.id())
        {
            entry.references = entry.references.saturating_sub(1);
            entry.last_used = Instant::now();
            debug!(
                "released pooled connection {} ({} leases)",
                physical.id(),
                entry.references
            );
        }
        drop(entries);
        if returned > 0 {
            self.session_released.notify_all();
        }
    }
}

fn spawn_evictor(pool: Weak<ConnectionPool>, period: Duration) -> Option<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(EVICTOR_THREAD_NAME.to_string())
        .spawn(move || {
            info!("Starting {}, period {:?}", EVICTOR_THREAD_NAME, period);
            while let Some(pool) = pool.upgrade() {
                {
                    let mut guard = pool.evictor_lock.lock();
                    if !pool.is_stopped() {
                        pool.evictor_wakeup.wait_for(&mut guard, period);
                    }
                }
                if pool.is_stopped() {
                    break;
                }
                pool.evict();
            }
            info!("{} stopped", EVICTOR_THREAD_NAME);
        })
        .map_err(|e| warn!("failed to start {}: {}", EVICTOR_THREAD_NAME, e))
        .ok()
}
