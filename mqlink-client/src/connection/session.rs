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
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use cheetah_string::CheetahString;
use mqlink_error::ConnectionError;
use mqlink_error::MqLinkResult;
use parking_lot::Mutex;

use super::destination::AcknowledgeMode;
use super::destination::Destination;
use super::message_endpoint::MessageConsumer;
use super::message_endpoint::MessageProducer;
use super::ConnectionOwner;
use super::PhysicalConnection;

/// Producer/consumer reuse rules of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EndpointPolicy {
    pub cache_producers: bool,
    pub cache_consumers: bool,
    pub anonymous_producers: bool,
}

/// The session state that outlives a [`Session`] handle when the session is cached.
pub(crate) struct SessionCore {
    id: CheetahString,
    connection_id: CheetahString,
    ack_mode: AcknowledgeMode,
    policy: EndpointPolicy,
    closed: AtomicBool,
    endpoint_seq: AtomicU64,
    producers: Mutex<HashMap<Destination, MessageProducer>>,
    consumers: Mutex<HashMap<Destination, MessageConsumer>>,
    anonymous_producer: Mutex<Option<CheetahString>>,
}

impl SessionCore {
    pub(crate) fn new(connection: &PhysicalConnection, ack_mode: AcknowledgeMode, policy: EndpointPolicy) -> Arc<Self> {
        Arc::new(Self {
            id: CheetahString::from_string(format!("{}:{}", connection.id(), connection.next_session_seq())),
            connection_id: connection.id().clone(),
            ack_mode,
            policy,
            closed: AtomicBool::new(false),
            endpoint_seq: AtomicU64::new(1),
            producers: Mutex::new(HashMap::new()),
            consumers: Mutex::new(HashMap::new()),
            anonymous_producer: Mutex::new(None),
        })
    }

    #[inline]
    pub(crate) fn id(&self) -> &CheetahString {
        &self.id
    }

    #[inline]
    pub(crate) fn connection_id(&self) -> &CheetahString {
        &self.connection_id
    }

    #[inline]
    pub(crate) fn ack_mode(&self) -> AcknowledgeMode {
        self.ack_mode
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns `true` for the call that actually closed the session.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.producers.lock().clear();
        self.consumers.lock().clear();
        self.anonymous_producer.lock().take();
        true
    }

    fn next_endpoint_id(&self) -> CheetahString {
        CheetahString::from_string(format!(
            "{}:{}",
            self.id,
            self.endpoint_seq.fetch_add(1, Ordering::Relaxed)
        ))
    }

    fn create_producer(&self, destination: Destination) -> MessageProducer {
        if self.policy.anonymous_producers {
            let id = self
                .anonymous_producer
                .lock()
                .get_or_insert_with(|| self.next_endpoint_id())
                .clone();
            return MessageProducer::new(id, destination, true);
        }
        if self.policy.cache_producers {
            return self
                .producers
                .lock()
                .entry(destination)
                .or_insert_with_key(|destination| {
                    MessageProducer::new(self.next_endpoint_id(), destination.clone(), false)
                })
                .clone();
        }
        MessageProducer::new(self.next_endpoint_id(), destination, false)
    }

    fn create_consumer(&self, destination: Destination) -> MessageConsumer {
        if self.policy.cache_consumers {
            return self
                .consumers
                .lock()
                .entry(destination)
                .or_insert_with_key(|destination| MessageConsumer::new(self.next_endpoint_id(), destination.clone()))
                .clone();
        }
        MessageConsumer::new(self.next_endpoint_id(), destination)
    }
}

/// A session handle.
///
/// Closing (or dropping) the handle hands the session back to the factory that created it: a
/// caching factory may keep it for reuse, other factories close it.
pub struct Session {
    core: Arc<SessionCore>,
    connection: Arc<PhysicalConnection>,
    owner: Arc<dyn ConnectionOwner>,
    closed: AtomicBool,
}

impl Session {
    pub(crate) fn new(
        core: Arc<SessionCore>,
        connection: Arc<PhysicalConnection>,
        owner: Arc<dyn ConnectionOwner>,
    ) -> Self {
        Self {
            core,
            connection,
            owner,
            closed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> &CheetahString {
        self.core.id()
    }

    #[inline]
    pub fn connection_id(&self) -> &CheetahString {
        self.core.connection_id()
    }

    #[inline]
    pub fn acknowledge_mode(&self) -> AcknowledgeMode {
        self.core.ack_mode()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.core.is_closed() || self.connection.is_closed()
    }

    pub fn create_producer(&self, destination: Destination) -> MqLinkResult<MessageProducer> {
        self.ensure_open()?;
        Ok(self.core.create_producer(destination))
    }

    pub fn create_consumer(&self, destination: Destination) -> MqLinkResult<MessageConsumer> {
        self.ensure_open()?;
        Ok(self.core.create_consumer(destination))
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.owner.release_session(&self.core, &self.connection);
    }

    fn ensure_open(&self) -> MqLinkResult<()> {
        if self.is_closed() {
            return Err(ConnectionError::session_closed(self.core.id().as_str()).into());
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", self.core.id())
            .field("ack_mode", &self.core.ack_mode())
            .field("closed", &self.is_closed())
            .finish()
    }
}
