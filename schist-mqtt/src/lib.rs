/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
A transport-agnostic MQTT client supporting MQTT 3.1, 3.1.1 and 5.0.

The crate has two layers:

* A packet codec.  [`encode::encode_packet`] and [`decode::Decoder`] convert between
[`mqtt::MqttPacket`] values and their wire encodings, with the codec selected by
[`mqtt::ProtocolVersion`].  [`decode::try_frame_length`] delimits packets in a byte stream.
* A sans-IO client.  [`client::Client`] runs the connect handshake, keep alive, QoS 1 and 2
acknowledgements, and resubscription after reconnect.  It owns a [`client::Transport`] and a
[`client::TimerService`] supplied by the embedding event loop, which forwards transport callbacks
and timer firings back into the client.

# Example

```no_run
use schist_mqtt::client::*;
use schist_mqtt::config::ClientConfigBuilder;
use schist_mqtt::mqtt::*;
use std::time::Duration;

struct LoopTransport {}

impl Transport for LoopTransport {
    fn connect(&mut self) { /* open a socket */ }
    fn reconnect(&mut self, _after: Duration) { /* reopen the socket later */ }
    fn send(&mut self, _bytes: Vec<u8>) { /* queue a write */ }
    fn destroy(&mut self) { /* close the socket */ }
}

struct LoopTimers { next: u64 }

impl TimerService for LoopTimers {
    fn add(&mut self, _delay: Duration, _repeating: bool) -> TimerHandle {
        self.next += 1;
        TimerHandle(self.next)
    }

    fn cancel(&mut self, _handle: TimerHandle) {}
}

let config = ClientConfigBuilder::new()
    .with_client_id("sensor-17")
    .with_keep_alive_interval_seconds(30)
    .build()
    .unwrap();

let mut client = Client::new(config, Box::new(LoopTransport {}), Box::new(LoopTimers { next: 0 }));

client.set_on_connect(|client| {
    client.subscribe(vec![Subscription::new("commands/#", QualityOfService::AtLeastOnce)], Properties::new(), None);
});

client.set_on_message(|_, topic, payload, _| {
    println!("{}: {} bytes", topic, payload.len());
});

client.connect();

// the event loop then calls client.handle_network_event(..) and client.handle_timer_event(..)
```
 */

pub mod client;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
mod logging;
pub mod mqtt;
mod protocol;
mod validate;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{MqttError, MqttResult};
