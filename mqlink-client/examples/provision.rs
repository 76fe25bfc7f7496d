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

use std::sync::Arc;

use mqlink_client::factory::BrokerConnectionFactory;
use mqlink_client::AcknowledgeMode;
use mqlink_client::ArcConnectionFactoryCustomizer;
use mqlink_client::ConnectionFactory;
use mqlink_client::ConnectionFactoryProvisioner;
use mqlink_client::ConnectionProperties;
use mqlink_client::Destination;
use tracing::info;

pub const DEFAULT_BROKER_URL: &str = "tcp://127.0.0.1:61616";
pub const CLIENT_ID: &str = "mqlink-provision-example";
pub const QUEUE: &str = "example.orders";

// Usage: cargo run -p mqlink-client --example provision [properties-file]
fn main() -> anyhow::Result<()> {
    //init logger
    mqlink_client::log::init_logger();

    let properties = match std::env::args().nth(1) {
        Some(path) => ConnectionProperties::from_file(path)?,
        None => ConnectionProperties::builder()
            .broker_url(DEFAULT_BROKER_URL)
            .session_cache_size(5)
            .build()?,
    };

    let customizers: Vec<ArcConnectionFactoryCustomizer> = vec![Arc::new(|factory: &mut BrokerConnectionFactory| {
        factory.set_client_id(CLIENT_ID)
    })];
    let factory = ConnectionFactoryProvisioner::new().provision(&properties, &customizers)?;
    info!("using {} connection factory: {:?}", factory.kind(), factory);

    let connection = factory.create_connection()?;
    connection.start()?;
    let session = connection.create_session(AcknowledgeMode::Auto)?;
    let producer = session.create_producer(Destination::queue(QUEUE))?;
    info!(
        "connection {} opened session {} with producer {}",
        connection.id(),
        session.id(),
        producer.id()
    );
    session.close();
    connection.close();

    factory.shutdown();
    Ok(())
}
