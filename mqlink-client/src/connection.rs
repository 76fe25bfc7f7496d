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

//! Logical broker connections.
//!
//! Connections are lazy: creating one never touches the network, the broker transport is
//! established by whoever drives the connection. A [`Connection`] is a handle over a shared
//! physical connection; what closing the handle means depends on the factory that created it.

pub mod destination;
pub mod message_endpoint;
pub mod session;

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Instant;

use cheetah_string::CheetahString;
use mqlink_error::ConnectionError;
use mqlink_error::MqLinkResult;
use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;
use uuid::Uuid;

pub use self::destination::AcknowledgeMode;
pub use self::destination::Destination;
pub use self::message_endpoint::MessageConsumer;
pub use self::message_endpoint::MessageProducer;
pub use self::session::Session;
use self::session::EndpointPolicy;
use self::session::SessionCore;
use crate::factory::broker_url::BrokerUrl;

/// The broker-side connection shared by every handle a factory gives out for it.
pub(crate) struct PhysicalConnection {
    id: CheetahString,
    broker_url: BrokerUrl,
    client_id: Option<CheetahString>,
    user: Option<CheetahString>,
    created_at: Instant,
    start_count: AtomicUsize,
    closed: AtomicBool,
    failed: AtomicBool,
    active_sessions: AtomicUsize,
    session_seq: AtomicU64,
}

impl PhysicalConnection {
    pub(crate) fn new(
        broker_url: BrokerUrl,
        client_id: Option<CheetahString>,
        user: Option<CheetahString>,
    ) -> Arc<Self> {
        let connection = Arc::new(Self {
            id: CheetahString::from_string(format!("ID:{}", Uuid::new_v4())),
            broker_url,
            client_id,
            user,
            created_at: Instant::now(),
            start_count: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            active_sessions: AtomicUsize::new(0),
            session_seq: AtomicU64::new(1),
        });
        debug!("connection {} created for {}", connection.id, connection.broker_url);
        connection
    }

    #[inline]
    pub(crate) fn id(&self) -> &CheetahString {
        &self.id
    }

    #[inline]
    pub(crate) fn created_at(&self) -> Instant {
        self.created_at
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Acquire)
    }

    /// Started while at least one handle sharing it is started.
    #[inline]
    pub(crate) fn is_started(&self) -> bool {
        !self.is_closed() && self.start_count.load(Ordering::Acquire) > 0
    }

    fn retain_start(&self) {
        if self.start_count.fetch_add(1, Ordering::AcqRel) == 0 {
            debug!("connection {} started", self.id);
        }
    }

    fn release_start(&self) {
        let previous = self
            .start_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous == Ok(1) {
            debug!("connection {} stopped", self.id);
        }
    }

    pub(crate) fn next_session_seq(&self) -> u64 {
        self.session_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn acquire_session_slot(&self) {
        self.active_sessions.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release_session_slot(&self) {
        let _ = self
            .active_sessions
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    pub(crate) fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.start_count.store(0, Ordering::Release);
            debug!("connection {} closed", self.id);
        }
    }
}

/// The factory side of a connection: decides how sessions are opened and what closing a
/// connection or session handle does.
pub(crate) trait ConnectionOwner: Send + Sync {
    fn open_session(
        &self,
        physical: &Arc<PhysicalConnection>,
        ack_mode: AcknowledgeMode,
    ) -> MqLinkResult<Arc<SessionCore>> {
        physical.acquire_session_slot();
        Ok(SessionCore::new(physical, ack_mode, EndpointPolicy::default()))
    }

    fn release_session(&self, session: &Arc<SessionCore>, physical: &Arc<PhysicalConnection>) {
        if session.close() {
            physical.release_session_slot();
        }
    }

    /// Called once per handle on close. `sessions` are the still-live sessions opened through
    /// that handle.
    fn release_connection(&self, physical: &Arc<PhysicalConnection>, sessions: Vec<Arc<SessionCore>>);
}

/// Owner of connections handed out by a plain factory: closing the handle closes the
/// connection.
pub(crate) struct DirectOwner;

impl ConnectionOwner for DirectOwner {
    fn release_connection(&self, physical: &Arc<PhysicalConnection>, _sessions: Vec<Arc<SessionCore>>) {
        physical.close();
    }
}

/// A connection handle.
///
/// `start` and `stop` are tracked per handle: a physical connection shared by several handles
/// keeps delivering until the last started handle stops or closes.
pub struct Connection {
    physical: Arc<PhysicalConnection>,
    owner: Arc<dyn ConnectionOwner>,
    closed: AtomicBool,
    locally_started: AtomicBool,
    sessions: Mutex<Vec<Weak<SessionCore>>>,
}

impl Connection {
    pub(crate) fn new(physical: Arc<PhysicalConnection>, owner: Arc<dyn ConnectionOwner>) -> Self {
        Self {
            physical,
            owner,
            closed: AtomicBool::new(false),
            locally_started: AtomicBool::new(false),
            sessions: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> &CheetahString {
        &self.physical.id
    }

    #[inline]
    pub fn broker_url(&self) -> &BrokerUrl {
        &self.physical.broker_url
    }

    #[inline]
    pub fn client_id(&self) -> Option<&CheetahString> {
        self.physical.client_id.as_ref()
    }

    #[inline]
    pub fn user(&self) -> Option<&CheetahString> {
        self.physical.user.as_ref()
    }

    /// Starts message delivery on the underlying connection.
    pub fn start(&self) -> MqLinkResult<()> {
        self.ensure_open()?;
        if !self.locally_started.swap(true, Ordering::AcqRel) {
            self.physical.retain_start();
        }
        Ok(())
    }

    /// Withdraws this handle's start. The underlying connection stops once no handle sharing it
    /// is started.
    pub fn stop(&self) -> MqLinkResult<()> {
        self.ensure_open()?;
        if self.locally_started.swap(false, Ordering::AcqRel) {
            self.physical.release_start();
        }
        Ok(())
    }

    /// Whether the underlying connection is delivering messages.
    pub fn is_started(&self) -> bool {
        !self.is_closed() && self.physical.is_started()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.physical.is_closed()
    }

    /// Active sessions on the underlying connection, across all handles sharing it.
    pub fn active_sessions(&self) -> usize {
        self.physical.active_sessions()
    }

    pub fn create_session(&self, ack_mode: AcknowledgeMode) -> MqLinkResult<Session> {
        self.ensure_open()?;
        let core = self.owner.open_session(&self.physical, ack_mode)?;
        {
            let mut sessions = self.sessions.lock();
            sessions.retain(|session| session.strong_count() > 0);
            sessions.push(Arc::downgrade(&core));
        }
        Ok(Session::new(core, self.physical.clone(), self.owner.clone()))
    }

    /// Marks the underlying connection as broken. Pooled factories evict it once it is no
    /// longer in use.
    pub fn report_failure(&self) {
        if !self.physical.failed.swap(true, Ordering::AcqRel) {
            warn!("connection {} reported a failure", self.physical.id);
        }
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.locally_started.swap(false, Ordering::AcqRel) {
            self.physical.release_start();
        }
        let sessions = self
            .sessions
            .lock()
            .drain(..)
            .filter_map(|session| session.upgrade())
            .collect();
        self.owner.release_connection(&self.physical, sessions);
    }

    fn ensure_open(&self) -> MqLinkResult<()> {
        if self.is_closed() {
            return Err(ConnectionError::closed(self.physical.id.as_str()).into());
        }
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.physical.id)
            .field("broker_url", &self.physical.broker_url.as_str())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_connection() -> Connection {
        let url: BrokerUrl = "tcp://localhost:61616".parse().unwrap();
        Connection::new(
            PhysicalConnection::new(url, Some("client-1".into()), None),
            Arc::new(DirectOwner),
        )
    }

    #[test]
    fn connection_is_lazy_and_startable() {
        let connection = direct_connection();
        assert!(connection.id().as_str().starts_with("ID:"));
        assert_eq!(connection.client_id().map(|id| id.as_str()), Some("client-1"));
        assert!(!connection.is_started());

        connection.start().unwrap();
        connection.start().unwrap();
        assert!(connection.is_started());
        connection.stop().unwrap();
        assert!(!connection.is_started());
    }

    #[test]
    fn shared_connection_stops_with_last_started_handle() {
        let url: BrokerUrl = "tcp://localhost:61616".parse().unwrap();
        let physical = PhysicalConnection::new(url, None, None);
        let owner: Arc<dyn ConnectionOwner> = Arc::new(DirectOwner);
        let first = Connection::new(physical.clone(), owner.clone());
        let second = Connection::new(physical.clone(), owner);

        first.start().unwrap();
        second.start().unwrap();
        first.stop().unwrap();
        assert!(second.is_started());
        assert!(first.is_started());

        second.stop().unwrap();
        assert!(!physical.is_started());
    }

    #[test]
    fn closed_connection_rejects_sessions() {
        let connection = direct_connection();
        connection.close();
        connection.close();
        assert!(connection.is_closed());
        assert!(connection.create_session(AcknowledgeMode::Auto).is_err());
        assert!(connection.start().is_err());
    }

    #[test]
    fn sessions_track_active_count() {
        let connection = direct_connection();
        let first = connection.create_session(AcknowledgeMode::Auto).unwrap();
        let second = connection.create_session(AcknowledgeMode::Client).unwrap();
        assert_eq!(connection.active_sessions(), 2);
        assert_ne!(first.id(), second.id());
        assert_eq!(second.acknowledge_mode(), AcknowledgeMode::Client);

        first.close();
        assert!(first.is_closed());
        assert_eq!(connection.active_sessions(), 1);

        drop(second);
        assert_eq!(connection.active_sessions(), 0);
    }

    #[test]
    fn uncached_session_creates_distinct_endpoints() {
        let connection = direct_connection();
        let session = connection.create_session(AcknowledgeMode::Auto).unwrap();
        let orders = Destination::queue("orders");

        let first = session.create_producer(orders.clone()).unwrap();
        let second = session.create_producer(orders.clone()).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(!first.is_anonymous());

        let consumer = session.create_consumer(orders.clone()).unwrap();
        assert_eq!(consumer.destination(), &orders);

        session.close();
        assert!(session.create_producer(orders).is_err());
    }

    #[test]
    fn closing_connection_invalidates_sessions() {
        let connection = direct_connection();
        let session = connection.create_session(AcknowledgeMode::Auto).unwrap();
        connection.close();
        assert!(session.is_closed());
        assert!(session.create_consumer(Destination::topic("prices")).is_err());
    }
}
