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

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cheetah_string::CheetahString;
use mqlink_error::MqLinkResult;
use tracing::debug;

use super::broker_url::BrokerUrl;
use super::customizer::ArcConnectionFactoryCustomizer;
use super::ConnectionFactory;
use crate::connection::Connection;
use crate::connection::DirectOwner;
use crate::connection::PhysicalConnection;
use crate::properties::ConnectionProperties;
use crate::properties::ConnectionPropertiesValidator;

/// The plain broker connection factory.
///
/// Every [`create_connection`](ConnectionFactory::create_connection) call yields an independent
/// connection, and closing it closes the connection. This is also the base factory the caching
/// and pooled factories wrap. Its attributes are mutable so customizers can adjust them.
#[derive(Clone)]
pub struct BrokerConnectionFactory {
    broker_url: BrokerUrl,
    user: Option<CheetahString>,
    password: Option<CheetahString>,
    client_id: Option<CheetahString>,
    close_timeout: Duration,
    send_timeout: Duration,
    non_blocking_redelivery: bool,
    trust_all_packages: bool,
    trusted_packages: Vec<CheetahString>,
}

impl BrokerConnectionFactory {
    pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(broker_url: BrokerUrl) -> Self {
        Self {
            broker_url,
            user: None,
            password: None,
            client_id: None,
            close_timeout: Self::DEFAULT_CLOSE_TIMEOUT,
            send_timeout: Duration::ZERO,
            non_blocking_redelivery: false,
            trust_all_packages: false,
            trusted_packages: Vec::new(),
        }
    }

    #[inline]
    pub fn broker_url(&self) -> &BrokerUrl {
        &self.broker_url
    }

    #[inline]
    pub fn set_broker_url(&mut self, broker_url: BrokerUrl) {
        self.broker_url = broker_url;
    }

    #[inline]
    pub fn user(&self) -> Option<&CheetahString> {
        self.user.as_ref()
    }

    #[inline]
    pub fn set_user(&mut self, user: impl Into<CheetahString>) {
        self.user = Some(user.into());
    }

    #[inline]
    pub fn password(&self) -> Option<&CheetahString> {
        self.password.as_ref()
    }

    #[inline]
    pub fn set_password(&mut self, password: impl Into<CheetahString>) {
        self.password = Some(password.into());
    }

    #[inline]
    pub fn client_id(&self) -> Option<&CheetahString> {
        self.client_id.as_ref()
    }

    #[inline]
    pub fn set_client_id(&mut self, client_id: impl Into<CheetahString>) {
        self.client_id = Some(client_id.into());
    }

    #[inline]
    pub fn close_timeout(&self) -> Duration {
        self.close_timeout
    }

    #[inline]
    pub fn set_close_timeout(&mut self, close_timeout: Duration) {
        self.close_timeout = close_timeout;
    }

    /// `Duration::ZERO` waits forever.
    #[inline]
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    #[inline]
    pub fn set_send_timeout(&mut self, send_timeout: Duration) {
        self.send_timeout = send_timeout;
    }

    #[inline]
    pub fn non_blocking_redelivery(&self) -> bool {
        self.non_blocking_redelivery
    }

    #[inline]
    pub fn set_non_blocking_redelivery(&mut self, enabled: bool) {
        self.non_blocking_redelivery = enabled;
    }

    #[inline]
    pub fn trust_all_packages(&self) -> bool {
        self.trust_all_packages
    }

    #[inline]
    pub fn set_trust_all_packages(&mut self, trust_all: bool) {
        self.trust_all_packages = trust_all;
    }

    #[inline]
    pub fn trusted_packages(&self) -> &[CheetahString] {
        &self.trusted_packages
    }

    #[inline]
    pub fn set_trusted_packages(&mut self, packages: Vec<CheetahString>) {
        self.trusted_packages = packages;
    }

    pub(crate) fn open_physical(&self) -> Arc<PhysicalConnection> {
        PhysicalConnection::new(self.broker_url.clone(), self.client_id.clone(), self.user.clone())
    }
}

impl ConnectionFactory for BrokerConnectionFactory {
    fn create_connection(&self) -> MqLinkResult<Connection> {
        Ok(Connection::new(self.open_physical(), Arc::new(DirectOwner)))
    }
}

impl fmt::Debug for BrokerConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConnectionFactory")
            .field("broker_url", &self.broker_url.as_str())
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "******"))
            .field("client_id", &self.client_id)
            .field("close_timeout", &self.close_timeout)
            .field("send_timeout", &self.send_timeout)
            .field("non_blocking_redelivery", &self.non_blocking_redelivery)
            .field("trust_all_packages", &self.trust_all_packages)
            .field("trusted_packages", &self.trusted_packages)
            .finish()
    }
}

/// Builds the base [`BrokerConnectionFactory`] from properties, then applies customizers in
/// registration order.
pub struct BrokerConnectionFactoryBuilder<'a> {
    properties: &'a ConnectionProperties,
    customizers: &'a [ArcConnectionFactoryCustomizer],
    broker_url: Option<BrokerUrl>,
}

impl<'a> BrokerConnectionFactoryBuilder<'a> {
    pub fn new(properties: &'a ConnectionProperties, customizers: &'a [ArcConnectionFactoryCustomizer]) -> Self {
        Self {
            properties,
            customizers,
            broker_url: None,
        }
    }

    /// Uses an already validated broker URL instead of resolving it from the properties.
    pub fn with_broker_url(mut self, broker_url: BrokerUrl) -> Self {
        self.broker_url = Some(broker_url);
        self
    }

    pub fn build(mut self) -> MqLinkResult<BrokerConnectionFactory> {
        let broker_url = match self.broker_url.take() {
            Some(broker_url) => broker_url,
            None => ConnectionPropertiesValidator::validate_broker_url(self.properties)?,
        };
        let mut factory = BrokerConnectionFactory::new(broker_url);
        self.configure(&mut factory);
        for (index, customizer) in self.customizers.iter().enumerate() {
            debug!("applying connection factory customizer #{}", index);
            customizer.customize(&mut factory);
        }
        Ok(factory)
    }

    fn configure(&self, factory: &mut BrokerConnectionFactory) {
        let properties = self.properties;
        if let Some(user) = &properties.user {
            factory.set_user(user.clone());
        }
        if let Some(password) = &properties.password {
            factory.set_password(password.clone());
        }
        factory.set_close_timeout(Duration::from_millis(properties.close_timeout));
        factory.set_send_timeout(Duration::from_millis(properties.send_timeout));
        factory.set_non_blocking_redelivery(properties.non_blocking_redelivery);
        if let Some(trust_all) = properties.packages.trust_all {
            factory.set_trust_all_packages(trust_all);
        }
        if !properties.packages.trusted.is_empty() {
            factory.set_trusted_packages(properties.packages.trusted.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::AcknowledgeMode;

    fn properties() -> ConnectionProperties {
        ConnectionProperties::builder()
            .broker_url("tcp://localhost:61616")
            .credentials("admin", "secret")
            .close_timeout(500)
            .send_timeout(2_000)
            .non_blocking_redelivery(true)
            .trusted_package("com.example.orders")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_copies_properties() {
        let properties = properties();
        let factory = BrokerConnectionFactoryBuilder::new(&properties, &[]).build().unwrap();

        assert_eq!(factory.broker_url().as_str(), "tcp://localhost:61616");
        assert_eq!(factory.user().map(|u| u.as_str()), Some("admin"));
        assert_eq!(factory.password().map(|p| p.as_str()), Some("secret"));
        assert_eq!(factory.close_timeout(), Duration::from_millis(500));
        assert_eq!(factory.send_timeout(), Duration::from_secs(2));
        assert!(factory.non_blocking_redelivery());
        assert!(!factory.trust_all_packages());
        assert_eq!(factory.trusted_packages().len(), 1);
    }

    #[test]
    fn builder_uses_embedded_broker_when_in_memory() {
        let properties = ConnectionProperties::builder().in_memory(true).build().unwrap();
        let factory = BrokerConnectionFactoryBuilder::new(&properties, &[]).build().unwrap();
        assert!(factory.broker_url().is_in_memory());
        assert_eq!(factory.broker_url().as_str(), ConnectionProperties::EMBEDDED_BROKER_URL);
    }

    #[test]
    fn builder_applies_customizers_in_order() {
        let properties = properties();
        let customizers: Vec<ArcConnectionFactoryCustomizer> = vec![
            Arc::new(|factory: &mut BrokerConnectionFactory| factory.set_client_id("first")),
            Arc::new(|factory: &mut BrokerConnectionFactory| factory.set_trust_all_packages(true)),
            Arc::new(|factory: &mut BrokerConnectionFactory| factory.set_client_id("second")),
        ];
        let factory = BrokerConnectionFactoryBuilder::new(&properties, &customizers)
            .build()
            .unwrap();
        assert_eq!(factory.client_id().map(|id| id.as_str()), Some("second"));
        assert!(factory.trust_all_packages());
    }

    #[test]
    fn builder_prefers_supplied_broker_url() {
        let properties = ConnectionProperties::default();
        assert!(BrokerConnectionFactoryBuilder::new(&properties, &[]).build().is_err());

        let url: BrokerUrl = "ssl://broker.internal:61617".parse().unwrap();
        let factory = BrokerConnectionFactoryBuilder::new(&properties, &[])
            .with_broker_url(url.clone())
            .build()
            .unwrap();
        assert_eq!(factory.broker_url(), &url);
    }

    #[test]
    fn plain_factory_creates_independent_connections() {
        let properties = properties();
        let factory = BrokerConnectionFactoryBuilder::new(&properties, &[]).build().unwrap();

        let first = factory.create_connection().unwrap();
        let second = factory.create_connection().unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(first.user().map(|u| u.as_str()), Some("admin"));

        first.close();
        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert!(second.create_session(AcknowledgeMode::Auto).is_ok());
    }

    #[test]
    fn debug_masks_password() {
        let properties = properties();
        let factory = BrokerConnectionFactoryBuilder::new(&properties, &[]).build().unwrap();
        let rendered = format!("{factory:?}");
        assert!(!rendered.contains("secret"));
    }
}
