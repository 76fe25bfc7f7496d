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

use std::io::Write;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use mqlink_client::factory::BrokerConnectionFactory;
use mqlink_client::AcknowledgeMode;
use mqlink_client::ArcConnectionFactoryCustomizer;
use mqlink_client::ConnectionFactory;
use mqlink_client::ConnectionFactoryKind;
use mqlink_client::ConnectionFactoryProvisioner;
use mqlink_client::ConnectionProperties;
use mqlink_client::Destination;
use mqlink_client::PoolingCapability;
use mqlink_error::ConfigurationError;
use mqlink_error::ConnectionError;
use mqlink_error::MqLinkError;

fn provisioner() -> ConnectionFactoryProvisioner {
    ConnectionFactoryProvisioner::new().with_pooling_capability(PoolingCapability::Available)
}

fn base_properties() -> ConnectionProperties {
    ConnectionProperties::builder()
        .broker_url("tcp://localhost:61616")
        .build_unvalidated()
}

#[test]
fn pool_enabled_provisions_pooled_factory() {
    let mut properties = base_properties();
    properties.pool.enabled = true;
    properties.pool.max_connections = 10;

    let handle = provisioner().provision(&properties, &[]).unwrap();
    assert_eq!(handle.kind(), ConnectionFactoryKind::Pooled);
    let pooled = handle.as_pooled().unwrap();
    assert_eq!(pooled.settings().max_connections, 10);
    assert_eq!(pooled.target().broker_url().as_str(), "tcp://localhost:61616");
    handle.shutdown();
}

#[test]
fn pool_wins_over_cache() {
    let properties = ConnectionProperties::builder()
        .broker_url("tcp://localhost:61616")
        .pool_enabled(true)
        .cache_enabled(true)
        .build()
        .unwrap();
    let handle = provisioner().provision(&properties, &[]).unwrap();
    assert_eq!(handle.kind(), ConnectionFactoryKind::Pooled);
    assert!(handle.as_cached().is_none());
    handle.shutdown();
}

#[test]
fn default_properties_provision_caching_factory() {
    let properties = ConnectionProperties::builder()
        .broker_url("tcp://localhost:61616")
        .session_cache_size(5)
        .build()
        .unwrap();

    let handle = provisioner().provision(&properties, &[]).unwrap();
    assert_eq!(handle.kind(), ConnectionFactoryKind::Cached);
    let cached = handle.as_cached().unwrap();
    assert_eq!(cached.session_cache_size(), 5);
    assert!(cached.is_cache_producers());
    assert!(!cached.is_cache_consumers());
}

#[test]
fn disabled_pool_and_cache_provision_plain_factory() {
    let properties = ConnectionProperties::builder()
        .broker_url("tcp://localhost:61616")
        .cache_enabled(false)
        .build()
        .unwrap();

    let handle = provisioner().provision(&properties, &[]).unwrap();
    assert_eq!(handle.kind(), ConnectionFactoryKind::Plain);

    let first = handle.create_connection().unwrap();
    let second = handle.create_connection().unwrap();
    assert_ne!(first.id(), second.id());
    handle.shutdown();
}

#[test]
fn pool_without_capability_is_a_configuration_error() {
    let properties = ConnectionProperties::builder()
        .broker_url("tcp://localhost:61616")
        .pool_enabled(true)
        .build()
        .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let customizers: Vec<ArcConnectionFactoryCustomizer> = vec![Arc::new(move |_: &mut BrokerConnectionFactory| {
        counter.fetch_add(1, Ordering::SeqCst);
    })];

    let err = ConnectionFactoryProvisioner::new()
        .with_pooling_capability(PoolingCapability::Unavailable)
        .provision(&properties, &customizers)
        .unwrap_err();
    assert!(err.is_configuration_error());
    assert_eq!(err.config_key(), Some("pool.enabled"));
    assert!(matches!(
        err,
        MqLinkError::Configuration(ConfigurationError::CapabilityUnavailable {
            capability: "pooled-connection-factory",
            ..
        })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn customizers_run_once_in_registration_order() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let first_seen = seen.clone();
    let second_seen = seen.clone();
    let customizers: Vec<ArcConnectionFactoryCustomizer> = vec![
        Arc::new(move |factory: &mut BrokerConnectionFactory| {
            first_seen.lock().push("first");
            factory.set_client_id("orders-service");
            factory.set_trust_all_packages(true);
        }),
        Arc::new(move |factory: &mut BrokerConnectionFactory| {
            second_seen.lock().push("second");
            factory.set_client_id("billing-service");
        }),
    ];

    let handle = provisioner().provision(&base_properties(), &customizers).unwrap();
    assert_eq!(*seen.lock(), vec!["first", "second"]);

    let factory = handle.broker_factory();
    assert_eq!(factory.client_id().map(|id| id.as_str()), Some("billing-service"));
    assert!(factory.trust_all_packages());

    let connection = handle.create_connection().unwrap();
    assert_eq!(connection.client_id().map(|id| id.as_str()), Some("billing-service"));
    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn customizers_apply_to_the_wrapped_factory() {
    let mut properties = base_properties();
    properties.pool.enabled = true;
    let customizers: Vec<ArcConnectionFactoryCustomizer> = vec![Arc::new(|factory: &mut BrokerConnectionFactory| {
        factory.set_client_id("pooled-client")
    })];

    let handle = provisioner().provision(&properties, &customizers).unwrap();
    let pooled = handle.as_pooled().unwrap();
    assert_eq!(
        pooled.target().client_id().map(|id| id.as_str()),
        Some("pooled-client")
    );
    handle.shutdown();
}

#[test]
fn missing_broker_url_is_rejected() {
    let properties = ConnectionProperties::default();
    let err = provisioner().provision(&properties, &[]).unwrap_err();
    assert!(err.is_configuration_error());
    assert_eq!(err.config_key(), Some("brokerUrl"));
}

#[test]
fn malformed_broker_url_is_rejected() {
    for url in ["", "localhost:61616", "tcp://", "tcp://localhost:notaport"] {
        let mut properties = base_properties();
        properties.broker_url = Some(url.into());
        let err = provisioner().provision(&properties, &[]).unwrap_err();
        assert_eq!(err.config_key(), Some("brokerUrl"), "url {url:?}");
    }
}

#[test]
fn in_memory_uses_embedded_broker() {
    let properties = ConnectionProperties::builder().in_memory(true).build().unwrap();
    let handle = provisioner().provision(&properties, &[]).unwrap();
    assert!(handle.broker_factory().broker_url().is_in_memory());
}

#[test]
fn password_without_user_is_rejected() {
    let mut properties = base_properties();
    properties.password = Some("secret".into());
    let err = provisioner().provision(&properties, &[]).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn provisioning_opens_no_connection() {
    let mut properties = base_properties();
    properties.pool.enabled = true;
    properties.pool.create_connection_on_startup = false;

    let handle = provisioner().provision(&properties, &[]).unwrap();
    assert_eq!(handle.as_pooled().unwrap().connection_count(), 0);
    handle.shutdown();
}

#[test]
fn shutdown_stops_pool_once() {
    let mut properties = base_properties();
    properties.pool.enabled = true;

    let handle = provisioner().provision(&properties, &[]).unwrap();
    let connection = handle.create_connection().unwrap();
    let session = connection.create_session(AcknowledgeMode::Auto).unwrap();
    session.create_producer(Destination::queue("orders")).unwrap();

    handle.shutdown();
    handle.shutdown();

    let pooled = handle.as_pooled().unwrap();
    assert!(pooled.is_stopped());
    assert!(connection.is_closed());

    let err = handle.create_connection().unwrap_err();
    assert!(matches!(err, MqLinkError::Connection(ConnectionError::PoolStopped)));
}

#[test]
fn cached_handles_keep_shared_connection_started_until_last_stop() {
    let handle = provisioner().provision(&base_properties(), &[]).unwrap();
    assert_eq!(handle.kind(), ConnectionFactoryKind::Cached);
    let orders = handle.create_connection().unwrap();
    let billing = handle.create_connection().unwrap();
    assert_eq!(orders.id(), billing.id());

    orders.start().unwrap();
    billing.start().unwrap();
    orders.stop().unwrap();
    assert!(billing.is_started());

    // closing a started handle withdraws its start as well
    orders.start().unwrap();
    billing.stop().unwrap();
    orders.close();
    assert!(!billing.is_closed());
    assert!(!billing.is_started());

    billing.start().unwrap();
    assert!(billing.is_started());
}

#[test]
fn cached_handle_is_shared_across_threads() {
    let handle = Arc::new(provisioner().provision(&base_properties(), &[]).unwrap());
    let ids: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                scope.spawn(move || {
                    let connection = handle.create_connection().unwrap();
                    let session = connection.create_session(AcknowledgeMode::Auto).unwrap();
                    session.create_producer(Destination::topic("prices")).unwrap();
                    connection.id().clone()
                })
            })
            .collect();
        workers.into_iter().map(|worker| worker.join().unwrap()).collect()
    });
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn properties_file_drives_selection() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(
        file,
        r#"
broker_url = "failover:(tcp://broker-a:61616,tcp://broker-b:61616)?randomize=false"
user = "admin"
password = "secret"

[pool]
enabled = true
max_connections = 4
block_if_full = false
"#
    )?;

    let properties = ConnectionProperties::from_file(file.path())?;
    let handle = provisioner().provision(&properties, &[])?;
    assert_eq!(handle.kind(), ConnectionFactoryKind::Pooled);

    let factory = handle.broker_factory();
    assert_eq!(factory.broker_url().members().len(), 2);
    assert_eq!(factory.user().map(|u| u.as_str()), Some("admin"));

    let pooled = handle.as_pooled().unwrap();
    assert_eq!(pooled.settings().max_connections, 4);
    assert!(!pooled.settings().block_if_full);
    handle.shutdown();
    Ok(())
}
